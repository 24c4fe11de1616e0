//! # Game Client Library
//!
//! Client side of the netcode: the player this client owns is predicted
//! locally with zero added latency, every unacknowledged input is resent to
//! the server each physics tick, and authoritative snapshots are reconciled
//! against the prediction.
//!
//! ## Architecture Overview
//!
//! ### Client-Side Prediction
//! Each physics tick the sampled keys are stamped, applied immediately through
//! the shared motion model and appended to the unacknowledged-input buffer.
//! The whole buffer goes out as one `UserCommand`, so the server only needs
//! one surviving datagram to learn about any given input.
//!
//! ### Server Reconciliation
//! A snapshot tells the client the last stamp the server applied for it and
//! where that left the player. Inputs up to that stamp are dropped from the
//! buffer, the rest are replayed on top of the server's state, and if the
//! replay ends more than `RECONCILE_TOLERANCE` away from the displayed
//! position the player snaps to it. Smaller differences are ignored.
//!
//! ### Remote Entities
//! Other players are shown exactly as the newest snapshot reports them.
//! Snapshots are self-contained, so an older snapshot arriving late is
//! simply dropped.
//!
//! ## Module Organization
//!
//! - `input_buffer`: unacknowledged inputs, oldest first
//! - `prediction`: `LocalPlayer`, the prediction and reconciliation engine
//! - `game`: world view combining the local player and remote entities
//! - `input`: input sources and the tick-counting `InputManager`
//! - `network`: UDP connection handling and the client tick loop
//! - `config`: client settings
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use client::config::{BotPattern, ClientConfig};
//! use client::network::Client;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig {
//!         server_addr: "127.0.0.1:8080".to_string(),
//!         bot: BotPattern::Zigzag,
//!         ..ClientConfig::default()
//!     };
//!
//!     let mut client = Client::new(config).await?;
//!     client.run().await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod game;
pub mod input;
pub mod input_buffer;
pub mod network;
pub mod prediction;
