use rand::Rng;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

pub const COLOR_SPACE: u32 = 0xFF_FF_FF;

// Get current timestamp in milliseconds
pub fn get_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::from_secs(0))
        .as_millis() as u64
}

// Generate a random `#rrggbb` color, uniform over the RGB space
pub fn generate_color<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!("#{:06x}", rng.gen_range(0..=COLOR_SPACE))
}
