use clap::Parser;
use env_logger::Env;
use log::info;
use server::config::ServerConfig;
use server::error::ServerError;
use server::network::Server;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=debug for per-event logging");
    }
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = ServerConfig::parse();

    let server = Server::bind(&config.address()).await?;
    let handle = server.handle();
    info!("Tower Builder server running on {}", server.local_addr()?);

    let mut server_task = tokio::spawn(server.run());

    tokio::select! {
        result = &mut server_task => {
            result.map_err(|e| ServerError::Task(e.to_string()))??;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down gracefully...");
            handle.shutdown();
            server_task
                .await
                .map_err(|e| ServerError::Task(e.to_string()))??;
        }
    }

    Ok(())
}
