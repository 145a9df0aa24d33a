use clap::Parser;
use client::network::{BuildPlan, Client};
use env_logger::Env;
use log::info;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// WebSocket URL of the tower server
    #[arg(short = 's', long, env = "TOWER_SERVER", default_value = "ws://127.0.0.1:3000/ws")]
    server: String,

    /// Display name to use after joining
    #[arg(short = 'n', long)]
    name: Option<String>,

    /// Number of blocks to stack; 0 only watches
    #[arg(short = 'b', long, default_value = "10")]
    blocks: u32,

    /// Milliseconds between placements
    #[arg(short = 'i', long, default_value = "500")]
    interval_ms: u64,

    /// Block color as #rrggbb, defaults to the assigned player color
    #[arg(short = 'c', long)]
    color: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=debug for per-event logging");
    }
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let plan = BuildPlan {
        name: args.name,
        blocks: args.blocks,
        interval: Duration::from_millis(args.interval_ms.max(1)),
        color: args.color,
    };

    let mut client = Client::connect(&args.server).await?;

    tokio::select! {
        result = client.run(&plan) => result?,
        _ = tokio::signal::ctrl_c() => info!("Interrupted"),
    }

    client.close().await?;
    info!("Disconnected");
    Ok(())
}
