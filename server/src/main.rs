use clap::Parser;
use log::info;
use server::config::ServerConfig;
use server::network::Server;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server IP address to bind to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Server port to listen on
    #[arg(short, long, default_value = "8080")]
    port: u16,

    /// Physics updates per second
    #[arg(long, default_value = "60")]
    physics_rate: u32,

    /// Snapshot broadcasts per second
    #[arg(long, default_value = "20")]
    network_rate: u32,

    /// Maximum number of connected clients; bounded so a full snapshot fits one datagram
    #[arg(short, long, default_value = "16")]
    max_clients: usize,

    /// Seconds of silence before a client is dropped
    #[arg(long, default_value = "5")]
    timeout_secs: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    let config = ServerConfig {
        bind_addr: format!("{}:{}", args.host, args.port),
        physics_rate: args.physics_rate,
        network_rate: args.network_rate,
        max_clients: args.max_clients,
        client_timeout: Duration::from_secs(args.timeout_secs),
    };
    config.validate()?;

    info!("Starting server on {}", config.bind_addr);
    info!(
        "Physics {}Hz, network {}Hz, max clients {}",
        config.physics_rate, config.network_rate, config.max_clients
    );

    let mut server = Server::new(config).await?;

    tokio::select! {
        result = server.run() => result?,
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down...");
        }
    }

    Ok(())
}
