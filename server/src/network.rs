//! Server network layer handling UDP communications and game loop coordination

use crate::client_manager::ClientManager;
use crate::clock::ServerClock;
use crate::config::ServerConfig;
use crate::game::GameState;
use log::{debug, error, info, warn};
use shared::{
    decode_message, encode_message, InputSample, Message, NetcodeError, PeerId,
    MAX_DATAGRAM_SIZE, PROTOCOL_VERSION,
};
use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::sync::{mpsc, RwLock};
use tokio::time::{interval, MissedTickBehavior};

/// Messages sent from network tasks to main server loop
#[derive(Debug)]
pub enum ServerMessage {
    PacketReceived { message: Message, addr: SocketAddr },
    ClientTimeout { peer_id: PeerId },
}

/// Messages sent from game loop to network tasks
#[derive(Debug)]
pub enum GameMessage {
    SendPacket { message: Message, addr: SocketAddr },
    BroadcastPacket { message: Message },
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ServerStats {
    pub physics_ticks: u64,
    pub messages_handled: u64,
    pub inputs_applied: u64,
    pub snapshots_broadcast: u64,
    pub rejected_commands: u64,
}

/// Main server coordinating networking and game simulation
pub struct Server {
    socket: Arc<UdpSocket>,
    clients: Arc<RwLock<ClientManager>>,
    game_state: GameState,
    config: ServerConfig,
    inbound: VecDeque<(Message, SocketAddr)>,
    stats: ServerStats,

    // Communication channels
    server_tx: mpsc::UnboundedSender<ServerMessage>,
    server_rx: mpsc::UnboundedReceiver<ServerMessage>,
    game_tx: mpsc::UnboundedSender<GameMessage>,
    game_rx: mpsc::UnboundedReceiver<GameMessage>,
}

impl Server {
    pub async fn new(config: ServerConfig) -> Result<Self, Box<dyn std::error::Error>> {
        config.validate()?;
        let socket = Arc::new(UdpSocket::bind(&config.bind_addr).await?);
        info!("Server listening on {}", socket.local_addr()?);

        let (server_tx, server_rx) = mpsc::unbounded_channel();
        let (game_tx, game_rx) = mpsc::unbounded_channel();

        Ok(Server {
            socket,
            clients: Arc::new(RwLock::new(ClientManager::new(config.max_clients))),
            game_state: GameState::new(),
            config,
            inbound: VecDeque::new(),
            stats: ServerStats::default(),
            server_tx,
            server_rx,
            game_tx,
            game_rx,
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    pub fn game_state(&self) -> &GameState {
        &self.game_state
    }

    pub fn stats(&self) -> ServerStats {
        self.stats
    }

    /// Spawns task that continuously listens for incoming packets
    fn spawn_network_receiver(&self) {
        let socket = Arc::clone(&self.socket);
        let server_tx = self.server_tx.clone();

        tokio::spawn(async move {
            let mut buffer = [0u8; MAX_DATAGRAM_SIZE];

            loop {
                match socket.recv_from(&mut buffer).await {
                    Ok((len, addr)) => match decode_message(&buffer[..len]) {
                        Ok(message) => {
                            if let Err(e) =
                                server_tx.send(ServerMessage::PacketReceived { message, addr })
                            {
                                error!("Failed to send packet to main loop: {}", e);
                                break;
                            }
                        }
                        Err(e) => {
                            warn!("Discarding malformed datagram from {}: {}", addr, e);
                        }
                    },
                    Err(e) => {
                        error!("Error receiving packet: {}", e);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    }
                }
            }
        });
    }

    /// Spawns task that processes outgoing packet queue
    fn spawn_network_sender(&mut self) {
        let socket = Arc::clone(&self.socket);
        let clients = Arc::clone(&self.clients);
        let mut game_rx = std::mem::replace(&mut self.game_rx, mpsc::unbounded_channel().1);

        tokio::spawn(async move {
            while let Some(outgoing) = game_rx.recv().await {
                match outgoing {
                    GameMessage::SendPacket { message, addr } => {
                        if let Err(e) = Self::send_packet_impl(&socket, &message, addr).await {
                            error!("Failed to send packet to {}: {}", addr, e);
                        }
                    }
                    GameMessage::BroadcastPacket { message } => {
                        let data = match encode_message(&message) {
                            Ok(data) => data,
                            Err(e) => {
                                error!("Failed to encode {}: {}", message.kind(), e);
                                continue;
                            }
                        };

                        let client_addrs = {
                            let clients_guard = clients.read().await;
                            clients_guard.get_client_addrs()
                        };

                        for (peer_id, addr) in client_addrs {
                            if let Err(e) = socket.send_to(&data, addr).await {
                                error!("Failed to send to peer {}: {}", peer_id, e);
                            }
                        }
                    }
                }
            }
        });
    }

    /// Spawns task that monitors peer timeouts
    fn spawn_timeout_checker(&self) {
        let clients = Arc::clone(&self.clients);
        let server_tx = self.server_tx.clone();
        let timeout = self.config.client_timeout;

        tokio::spawn(async move {
            let mut interval = interval(Duration::from_secs(1));

            loop {
                interval.tick().await;

                let timed_out = {
                    let clients_guard = clients.read().await;
                    clients_guard.timed_out_clients(timeout)
                };

                for peer_id in timed_out {
                    if let Err(e) = server_tx.send(ServerMessage::ClientTimeout { peer_id }) {
                        error!("Failed to send timeout message: {}", e);
                        return;
                    }
                }
            }
        });
    }

    async fn send_packet_impl(
        socket: &UdpSocket,
        message: &Message,
        addr: SocketAddr,
    ) -> shared::Result<()> {
        let data = encode_message(message)?;
        socket.send_to(&data, addr).await?;
        Ok(())
    }

    fn send_packet(&self, message: Message, addr: SocketAddr) {
        if let Err(e) = self.game_tx.send(GameMessage::SendPacket { message, addr }) {
            error!("Failed to queue packet for sending: {}", e);
        }
    }

    fn broadcast_packet(&self, message: Message) {
        if let Err(e) = self.game_tx.send(GameMessage::BroadcastPacket { message }) {
            error!("Failed to queue broadcast packet: {}", e);
        }
    }

    /// Holds an inbound message until the next physics tick
    pub fn enqueue(&mut self, message: Message, addr: SocketAddr) {
        self.inbound.push_back((message, addr));
    }

    pub fn pending_messages(&self) -> usize {
        self.inbound.len()
    }

    async fn handle_message(&mut self, message: Message, addr: SocketAddr) {
        self.stats.messages_handled += 1;

        match message {
            Message::Connect { client_version } => self.handle_connect(client_version, addr).await,

            Message::UserCommand { peer_id, inputs } => {
                self.handle_user_command(peer_id, &inputs, addr).await;
            }

            Message::Disconnect => {
                let peer_id = {
                    let clients = self.clients.read().await;
                    clients.find_client_by_addr(addr)
                };

                if let Some(peer_id) = peer_id {
                    let mut clients = self.clients.write().await;
                    clients.remove_client(&peer_id);
                    self.game_state.remove_entity(&peer_id);
                }
            }

            other => {
                warn!("Unexpected {} message from {}", other.kind(), addr);
            }
        }
    }

    async fn handle_connect(&mut self, client_version: u32, addr: SocketAddr) {
        info!(
            "Client connecting from {} (version: {})",
            addr, client_version
        );

        if client_version != PROTOCOL_VERSION {
            warn!(
                "Rejecting {}: protocol version {} (expected {})",
                addr, client_version, PROTOCOL_VERSION
            );
            self.send_packet(
                Message::Disconnected {
                    reason: "Protocol version mismatch".to_string(),
                },
                addr,
            );
            return;
        }

        // Remove existing connection if present
        let existing_peer = {
            let clients = self.clients.read().await;
            clients.find_client_by_addr(addr)
        };

        if let Some(existing_id) = existing_peer {
            info!("Replacing existing peer {} from {}", existing_id, addr);
            let mut clients = self.clients.write().await;
            clients.remove_client(&existing_id);
            self.game_state.remove_entity(&existing_id);
        }

        let peer_id = {
            let mut clients = self.clients.write().await;
            clients.add_client(addr)
        };

        match peer_id {
            Some(peer_id) => {
                self.game_state.add_entity(peer_id);
                self.send_packet(Message::Connected { peer_id }, addr);
            }
            None => {
                info!("Rejecting {}: {}", addr, NetcodeError::ServerFull);
                self.send_packet(
                    Message::Disconnected {
                        reason: "Server full".to_string(),
                    },
                    addr,
                );
            }
        }
    }

    async fn handle_user_command(
        &mut self,
        claimed: PeerId,
        inputs: &[InputSample],
        addr: SocketAddr,
    ) {
        let registered = {
            let clients = self.clients.read().await;
            clients.find_client_by_addr(addr)
        };

        let actual = match registered {
            Some(peer_id) => peer_id,
            None => {
                info!("Dropping command batch from unregistered address {}", addr);
                self.stats.rejected_commands += 1;
                // Lets a client we timed out notice and reconnect
                self.send_packet(
                    Message::Disconnected {
                        reason: "Not connected".to_string(),
                    },
                    addr,
                );
                return;
            }
        };

        if actual != claimed {
            warn!("{}", NetcodeError::PeerMismatch { claimed, actual });
            self.stats.rejected_commands += 1;
            return;
        }

        {
            let mut clients = self.clients.write().await;
            clients.touch(actual);
        }

        match self.game_state.handle_user_command(actual, inputs) {
            Ok(applied) => self.stats.inputs_applied += applied as u64,
            Err(e) => {
                info!("Dropping command batch: {}", e);
                self.stats.rejected_commands += 1;
            }
        }
    }

    /// Tears down a peer reported silent by the timeout checker, unless it
    /// spoke again since. Connection and entity are removed together.
    pub async fn handle_timeout(&mut self, peer_id: PeerId) -> bool {
        let addr = {
            let mut clients = self.clients.write().await;
            if !clients.is_timed_out(&peer_id, self.config.client_timeout) {
                return false;
            }
            let addr = clients.client_addr(&peer_id);
            clients.remove_client(&peer_id);
            addr
        };

        info!("Peer {} timed out", peer_id);
        self.game_state.remove_entity(&peer_id);
        if let Some(addr) = addr {
            self.send_packet(
                Message::Disconnected {
                    reason: "Timed out".to_string(),
                },
                addr,
            );
        }
        true
    }

    /// Drains every queued inbound message, in arrival order
    pub async fn physics_tick(&mut self) {
        self.stats.physics_ticks += 1;

        while let Some((message, addr)) = self.inbound.pop_front() {
            self.handle_message(message, addr).await;
        }
    }

    /// Sends the current world to every peer. Skipped while the world is
    /// empty. Returns whether a snapshot was queued.
    pub fn broadcast_snapshot(&mut self, server_tick: u32) -> bool {
        match self.game_state.capture_snapshot(server_tick) {
            Some(snapshot) => {
                self.broadcast_packet(snapshot);
                self.stats.snapshots_broadcast += 1;
                true
            }
            None => false,
        }
    }

    fn log_stats(&self, clock: &ServerClock) {
        if self.game_state.is_empty() {
            return;
        }

        debug!(
            "Tick {}: {} entities, physics {}Hz, network {:.1}Hz ({}ms), {} inputs applied, {} snapshots sent",
            clock.current_tick(),
            self.game_state.len(),
            self.config.physics_rate,
            clock.tick_rate(),
            clock.period().as_millis(),
            self.stats.inputs_applied,
            self.stats.snapshots_broadcast
        );
    }

    /// Main server loop coordinating all operations
    pub async fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        // Initialize concurrent tasks
        self.spawn_network_receiver();
        self.spawn_network_sender();
        self.spawn_timeout_checker();

        let mut physics_interval = interval(self.config.physics_period());
        physics_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut clock = ServerClock::new(self.config.network_period());
        let stats_every = u64::from(self.config.physics_rate.max(1));

        info!(
            "Server started: physics {}Hz, network {}Hz, max {} clients",
            self.config.physics_rate, self.config.network_rate, self.config.max_clients
        );

        loop {
            tokio::select! {
                message = self.server_rx.recv() => {
                    match message {
                        Some(ServerMessage::PacketReceived { message, addr }) => {
                            self.enqueue(message, addr);
                        },
                        Some(ServerMessage::ClientTimeout { peer_id }) => {
                            self.handle_timeout(peer_id).await;
                        },
                        None => {
                            info!("Server shutting down");
                            break;
                        }
                    }
                },

                _ = physics_interval.tick() => {
                    self.physics_tick().await;

                    if self.stats.physics_ticks % stats_every == 0 {
                        self.log_stats(&clock);
                    }
                },

                server_tick = clock.tick() => {
                    self.broadcast_snapshot(server_tick);
                },
            }
        }

        Ok(())
    }
}
