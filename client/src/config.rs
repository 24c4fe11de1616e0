use clap::ValueEnum;
use std::time::Duration;

/// Scripted input the headless client drives its player with
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BotPattern {
    Circle,
    Zigzag,
    Random,
    Idle,
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub server_addr: String,
    /// Simulated one-way latency is half of this
    pub fake_ping_ms: u64,
    /// Probability of dropping each outgoing command
    pub packet_loss: f64,
    pub bot: BotPattern,
    pub seed: u64,
    /// Stop after this long; run until Ctrl+C if None
    pub duration: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_addr: "127.0.0.1:8080".to_string(),
            fake_ping_ms: 0,
            packet_loss: 0.0,
            bot: BotPattern::Circle,
            seed: 0,
            duration: None,
        }
    }
}
