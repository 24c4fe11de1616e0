//! Error types for the netcode core
//!
//! None of these are fatal: callers log them and keep ticking.

use crate::protocol::PeerId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NetcodeError {
    /// Datagram could not be encoded or decoded
    #[error("codec error: {0}")]
    Codec(#[from] bincode::Error),

    /// Command batch for a peer with no registered entity
    #[error("no entity registered for peer {0}")]
    UnknownPeer(PeerId),

    /// Command batch claims a peer id other than the sender's
    #[error("peer {actual} sent a command claiming to be peer {claimed}")]
    PeerMismatch { claimed: PeerId, actual: PeerId },

    #[error("server full")]
    ServerFull,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, NetcodeError>;
