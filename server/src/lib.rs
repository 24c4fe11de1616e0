//! # Game Server Library
//!
//! Authoritative side of the netcode. The server owns one entity per
//! connected peer, applies the command batches those peers send through the
//! same motion model the clients predict with, and broadcasts the resulting
//! world to everyone at a fixed network rate.
//!
//! ## Core Responsibilities
//!
//! ### Authoritative Simulation
//! Every entity keeps the highest input stamp it has consumed. A batch is
//! applied in stamp order and anything at or below that stamp is skipped,
//! so the redundant resends clients use to survive packet loss never move an
//! entity twice.
//!
//! ### Client Management
//! Peers are identified by their UDP address. The server hands out peer ids
//! on connect, enforces a capacity limit, replaces a peer that reconnects
//! from the same address and tears down peers that go silent.
//!
//! ### State Broadcasting
//! A `ServerClock` fires at the network rate, independent of the physics
//! rate. Each firing captures every entity's state with its last consumed
//! stamp into one `GameSnapshot`. Nothing is sent while the world is empty.
//!
//! ## Architecture Design
//!
//! The simulation runs on a single event loop. Background tasks receive
//! datagrams, send queued packets and check timeouts; they talk to the loop
//! through channels. Inbound messages wait in a queue and are handled at the
//! start of the next physics tick, in arrival order.
//!
//! ## Module Organization
//!
//! - `client_manager`: address-keyed peer registry with timeouts
//! - `entity`: `ServerEntity` and its idempotent command queue
//! - `game`: entity registry and snapshot capture
//! - `clock`: network tick timer
//! - `network`: UDP tasks and the main loop
//! - `config`: server settings
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::config::ServerConfig;
//! use server::network::Server;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServerConfig {
//!         bind_addr: "0.0.0.0:8080".to_string(),
//!         max_clients: 32,
//!         ..ServerConfig::default()
//!     };
//!
//!     let mut server = Server::new(config).await?;
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

pub mod client_manager;
pub mod clock;
pub mod config;
pub mod entity;
pub mod game;
pub mod network;
