//! Client network loop: connection handshake, per-tick command transmission
//! and snapshot handling over UDP

use crate::config::ClientConfig;
use crate::game::ClientGameState;
use crate::input::InputManager;
use crate::prediction::ReconcileOutcome;
use log::{debug, error, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shared::{
    decode_message, encode_message, Message, FRAME_DELTA, MAX_DATAGRAM_SIZE, PROTOCOL_VERSION,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tokio::time::{interval, sleep, MissedTickBehavior};

const CONNECT_RETRY: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ClientStats {
    pub commands_sent: u64,
    pub commands_dropped: u64,
    pub snapshots_received: u64,
    pub malformed_datagrams: u64,
}

pub struct Client {
    socket: Arc<UdpSocket>,
    server_addr: SocketAddr,
    config: ClientConfig,
    connected: bool,

    game_state: ClientGameState,
    input_manager: InputManager,
    loss_rng: StdRng,
    stats: ClientStats,

    inbound_tx: mpsc::UnboundedSender<Message>,
    inbound_rx: mpsc::UnboundedReceiver<Message>,
}

impl Client {
    pub async fn new(config: ClientConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let socket = Arc::new(UdpSocket::bind("0.0.0.0:0").await?);
        let server_addr = config.server_addr.parse()?;
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();

        Ok(Client {
            socket,
            server_addr,
            input_manager: InputManager::from_pattern(config.bot, config.seed),
            loss_rng: StdRng::seed_from_u64(config.seed.wrapping_add(1)),
            config,
            connected: false,
            game_state: ClientGameState::new(),
            stats: ClientStats::default(),
            inbound_tx,
            inbound_rx,
        })
    }

    /// Spawns task that receives datagrams and forwards decoded messages,
    /// delayed by half the simulated ping
    fn spawn_network_receiver(&self) {
        let socket = Arc::clone(&self.socket);
        let inbound_tx = self.inbound_tx.clone();
        let server_addr = self.server_addr;
        let delay = Duration::from_millis(self.config.fake_ping_ms / 2);

        tokio::spawn(async move {
            let mut buffer = [0u8; MAX_DATAGRAM_SIZE];

            loop {
                match socket.recv_from(&mut buffer).await {
                    Ok((len, addr)) => {
                        if addr != server_addr {
                            debug!("Ignoring datagram from unknown sender {}", addr);
                            continue;
                        }

                        let message = match decode_message(&buffer[..len]) {
                            Ok(message) => message,
                            Err(e) => {
                                warn!("Discarding malformed datagram from server: {}", e);
                                continue;
                            }
                        };

                        if delay.is_zero() {
                            if inbound_tx.send(message).is_err() {
                                break;
                            }
                        } else {
                            let inbound_tx = inbound_tx.clone();
                            tokio::spawn(async move {
                                sleep(delay).await;
                                let _ = inbound_tx.send(message);
                            });
                        }
                    }
                    Err(e) => {
                        error!("Error receiving packet: {}", e);
                        sleep(Duration::from_millis(10)).await;
                    }
                }
            }
        });
    }

    /// Sends a message, applying simulated latency. Fire and forget.
    fn send_message(&self, message: &Message) {
        let data = match encode_message(message) {
            Ok(data) => data,
            Err(e) => {
                error!("Failed to encode {}: {}", message.kind(), e);
                return;
            }
        };

        let socket = Arc::clone(&self.socket);
        let server_addr = self.server_addr;
        let delay = Duration::from_millis(self.config.fake_ping_ms / 2);

        tokio::spawn(async move {
            if !delay.is_zero() {
                sleep(delay).await;
            }
            if let Err(e) = socket.send_to(&data, server_addr).await {
                error!("Failed to send packet to {}: {}", server_addr, e);
            }
        });
    }

    /// Sends a command batch, or drops it to simulate packet loss
    fn send_command(&mut self, command: &Message) {
        if self.config.packet_loss > 0.0 && self.loss_rng.gen::<f64>() < self.config.packet_loss {
            self.stats.commands_dropped += 1;
            return;
        }
        self.stats.commands_sent += 1;
        self.send_message(command);
    }

    fn connect(&self) {
        info!("Connecting to {}...", self.server_addr);
        self.send_message(&Message::Connect {
            client_version: PROTOCOL_VERSION,
        });
    }

    fn handle_message(&mut self, message: Message) {
        match message {
            Message::Connected { peer_id } => {
                info!("Connected! Peer ID: {}", peer_id);
                self.connected = true;
                self.game_state.set_peer_id(peer_id);
            }

            Message::GameSnapshot {
                server_tick,
                states,
            } => {
                self.stats.snapshots_received += 1;
                if let Some(ReconcileOutcome::Corrected { deviation }) =
                    self.game_state.apply_snapshot(server_tick, &states)
                {
                    debug!("Snapshot {} corrected prediction by {:.4}", server_tick, deviation);
                }
            }

            Message::Disconnected { reason } => {
                warn!("Disconnected: {}", reason);
                self.connected = false;
                self.game_state.reset();
            }

            other => {
                warn!("Unexpected {} message from server", other.kind());
            }
        }
    }

    fn physics_tick(&mut self) {
        let keys = self.input_manager.sample();
        if !self.connected {
            return;
        }
        if let Some(command) = self.game_state.tick(keys) {
            self.send_command(&command);
        }
    }

    fn log_stats(&self) {
        let Some(player) = self.game_state.local_player() else {
            return;
        };
        let position = player.state().position;
        let prediction = player.stats();

        debug!(
            "Pos ({:.2}, {:.2}, {:.2}), redundant inputs {}, corrections {}/{}, sent {}, dropped {}, snapshots {}",
            position.x,
            position.y,
            position.z,
            player.pending_inputs().len(),
            prediction.corrections,
            prediction.reconciliations,
            self.stats.commands_sent,
            self.stats.commands_dropped,
            self.stats.snapshots_received,
        );
    }

    pub async fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.spawn_network_receiver();
        self.connect();

        let mut physics_interval = interval(Duration::from_secs_f32(FRAME_DELTA));
        physics_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut stats_interval = interval(Duration::from_secs(1));

        let started = Instant::now();
        let mut last_connect_attempt = Instant::now();

        loop {
            if let Some(duration) = self.config.duration {
                if started.elapsed() >= duration {
                    info!("Run duration elapsed");
                    break;
                }
            }

            tokio::select! {
                message = self.inbound_rx.recv() => {
                    if let Some(message) = message {
                        self.handle_message(message);
                    }
                },

                _ = physics_interval.tick() => {
                    self.physics_tick();

                    if !self.connected && last_connect_attempt.elapsed() >= CONNECT_RETRY {
                        last_connect_attempt = Instant::now();
                        self.connect();
                    }
                },

                _ = stats_interval.tick() => {
                    self.log_stats();
                },

                _ = tokio::signal::ctrl_c() => {
                    info!("Received Ctrl+C, shutting down...");
                    break;
                }
            }
        }

        if self.connected {
            if let Ok(data) = encode_message(&Message::Disconnect) {
                let _ = self.socket.send_to(&data, self.server_addr).await;
            }
        }

        if let Some(player) = self.game_state.local_player() {
            info!(
                "Finished: {} corrections over {} reconciliations, largest {:.4}",
                player.stats().corrections,
                player.stats().reconciliations,
                player.stats().largest_correction
            );
        }

        Ok(())
    }

    pub fn game_state(&self) -> &ClientGameState {
        &self.game_state
    }

    pub fn stats(&self) -> &ClientStats {
        &self.stats
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }
}
