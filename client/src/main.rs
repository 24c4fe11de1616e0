use clap::Parser;
use client::config::{BotPattern, ClientConfig};
use client::network::Client;
use log::info;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short = 's', long, default_value = "127.0.0.1:8080")]
    server: String,

    /// Simulate network latency in milliseconds
    #[arg(short = 'l', long, default_value = "0")]
    fake_ping: u64,

    /// Probability (0.0 - 1.0) of dropping each outgoing command
    #[arg(short = 'p', long, default_value = "0.0")]
    packet_loss: f64,

    /// Input pattern for the headless player
    #[arg(short = 'b', long, value_enum, default_value = "circle")]
    bot: BotPattern,

    /// Seed for random input and simulated packet loss
    #[arg(long, default_value = "0")]
    seed: u64,

    /// Stop after this many seconds (runs until Ctrl+C when omitted)
    #[arg(short = 'd', long)]
    duration_secs: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();
    if !(0.0..=1.0).contains(&args.packet_loss) {
        return Err("packet loss must be between 0.0 and 1.0".into());
    }

    info!("Starting client...");
    info!("Connecting to: {}", args.server);
    if args.fake_ping > 0 {
        info!("Simulating {}ms latency", args.fake_ping);
    }
    if args.packet_loss > 0.0 {
        info!("Dropping {:.0}% of outgoing commands", args.packet_loss * 100.0);
    }
    info!("Bot pattern: {:?}", args.bot);

    let config = ClientConfig {
        server_addr: args.server,
        fake_ping_ms: args.fake_ping,
        packet_loss: args.packet_loss,
        bot: args.bot,
        seed: args.seed,
        duration: args.duration_secs.map(Duration::from_secs),
    };

    let mut client = Client::new(config).await?;
    client.run().await?;

    Ok(())
}
