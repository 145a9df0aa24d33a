//! The shared tower
//!
//! Blocks are kept in placement order, which is also the order a new client
//! replays them in. Coordinates arrive as floats and are stored rounded to
//! the nearest integer.

use log::info;
use shared::{Block, BlockRequest, ClientId, TowerSnapshot};

use crate::utils::get_timestamp;

/// The shared tower: placed blocks in placement order plus the running
/// maximum height.
///
/// `max_height` is the larger of zero and every block's `y`, kept in step on
/// each `place` and `reset`. Both mutations take `&mut self`, so the pair can
/// never be observed half-updated.
///
/// ```
/// use server::tower::Tower;
/// use shared::{BlockRequest, ClientId};
///
/// let mut tower = Tower::new();
/// tower.place_at(BlockRequest::new(0.0, 2.6, 0.0, "#ff0000"), ClientId::new(), 0);
/// assert_eq!(tower.max_height(), 3);
///
/// tower.reset();
/// assert!(tower.snapshot().blocks.is_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Tower {
    blocks: Vec<Block>,
    max_height: i64,
}

impl Tower {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stamps and appends a block, returning the stamped copy.
    pub fn place(&mut self, request: BlockRequest, placer: ClientId) -> Block {
        self.place_at(request, placer, get_timestamp())
    }

    /// Same as [`Tower::place`] with a caller-supplied timestamp
    ///
    /// Rounds each coordinate, keeps the requested color, and raises
    /// `max_height` if the block sits above it.
    pub fn place_at(&mut self, request: BlockRequest, placer: ClientId, timestamp: u64) -> Block {
        let block = Block {
            x: round_coord(request.x),
            y: round_coord(request.y),
            z: round_coord(request.z),
            color: request.color,
            player_id: placer,
            timestamp,
        };

        self.max_height = self.max_height.max(block.y);
        self.blocks.push(block.clone());

        info!(
            "Block placed at ({}, {}, {}) by {}",
            block.x, block.y, block.z, placer
        );
        block
    }

    /// Removes every block and drops the maximum height back to zero
    pub fn reset(&mut self) {
        let cleared = self.blocks.len();
        self.blocks.clear();
        self.max_height = 0;
        info!("Tower reset, {} blocks cleared", cleared);
    }

    /// Owned copy of the blocks and height, unaffected by later mutations
    pub fn snapshot(&self) -> TowerSnapshot {
        TowerSnapshot {
            blocks: self.blocks.clone(),
            max_height: self.max_height,
        }
    }

    /// Blocks in placement order
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn max_height(&self) -> i64 {
        self.max_height
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

// Nearest integer, halves away from zero. Out-of-range values saturate.
fn round_coord(value: f64) -> i64 {
    value.round() as i64
}
