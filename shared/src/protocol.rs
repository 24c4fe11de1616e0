//! Wire protocol shared by client and server
//!
//! Every datagram carries exactly one [`Message`]. Messages are self-contained:
//! a command batch holds the sender's whole unacknowledged buffer and a
//! snapshot holds the full state of every entity, so any single datagram can
//! be lost, duplicated or reordered without breaking either side.

use crate::error::Result;
use crate::input::InputSample;
use crate::math::Vec3;
use serde::{Deserialize, Serialize};

/// Identifier the server assigns to a connected peer
pub type PeerId = u32;

/// Bumped whenever the wire format changes.
pub const PROTOCOL_VERSION: u32 = 1;

/// Encoded size of a `GameSnapshot` with no states: variant tag, server
/// tick and vector length.
pub const SNAPSHOT_HEADER_SIZE: usize = 4 + 4 + 8;
/// Encoded size of one `AuthoritativeState`.
pub const ENCODED_STATE_SIZE: usize = 4 + 4 + 12 + 12;

/// Server-side state of one entity when a snapshot was captured
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AuthoritativeState {
    pub entity_id: PeerId,
    /// Last input stamp the server had applied for this entity
    pub stamp: u32,
    pub position: Vec3,
    pub velocity: Vec3,
}

/// Who decides the state of an entity on this side of the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityRole {
    /// Controlled by this client; predicted locally and reconciled.
    LocallyOwned,
    /// Another peer's entity; shown as last reported by the server.
    RemoteObserved,
    /// Simulated by the server from received commands.
    ServerAuthoritative,
}

impl EntityRole {
    /// Only the owning client samples input and sends commands.
    pub fn sends_input(&self) -> bool {
        matches!(self, EntityRole::LocallyOwned)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Message {
    Connect {
        client_version: u32,
    },
    /// Client's unacknowledged inputs, oldest first
    UserCommand {
        peer_id: PeerId,
        inputs: Vec<InputSample>,
    },
    Disconnect,

    Connected {
        peer_id: PeerId,
    },
    /// State of every live entity at one network tick
    GameSnapshot {
        server_tick: u32,
        states: Vec<AuthoritativeState>,
    },
    Disconnected {
        reason: String,
    },
}

impl Message {
    /// Short name used in log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            Message::Connect { .. } => "Connect",
            Message::UserCommand { .. } => "UserCommand",
            Message::Disconnect => "Disconnect",
            Message::Connected { .. } => "Connected",
            Message::GameSnapshot { .. } => "GameSnapshot",
            Message::Disconnected { .. } => "Disconnected",
        }
    }
}

pub fn encode_message(message: &Message) -> Result<Vec<u8>> {
    Ok(bincode::serialize(message)?)
}

pub fn decode_message(data: &[u8]) -> Result<Message> {
    Ok(bincode::deserialize(data)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::Keys;
    use crate::NetcodeError;

    #[test]
    fn test_user_command_serialization() {
        let message = Message::UserCommand {
            peer_id: 3,
            inputs: vec![
                InputSample::new(10, Keys::FORWARD),
                InputSample::new(11, Keys::FORWARD | Keys::SHIFT),
            ],
        };

        let data = encode_message(&message).unwrap();
        let decoded = decode_message(&data).unwrap();

        match decoded {
            Message::UserCommand { peer_id, inputs } => {
                assert_eq!(peer_id, 3);
                assert_eq!(inputs.len(), 2);
                assert_eq!(inputs[0].stamp, 10);
                assert_eq!(inputs[1].keys, Keys::FORWARD | Keys::SHIFT);
            }
            _ => panic!("Wrong message type after deserialization"),
        }
    }

    #[test]
    fn test_game_snapshot_serialization() {
        let states = vec![
            AuthoritativeState {
                entity_id: 1,
                stamp: 42,
                position: Vec3::new(1.0, 0.0, -2.5),
                velocity: Vec3::new(0.0, 0.0, -5.0),
            },
            AuthoritativeState {
                entity_id: 2,
                stamp: 7,
                position: Vec3::new(-3.0, 0.5, 0.0),
                velocity: Vec3::new(0.0, 2.0, 0.0),
            },
        ];

        let message = Message::GameSnapshot {
            server_tick: 99,
            states: states.clone(),
        };

        let decoded = decode_message(&encode_message(&message).unwrap()).unwrap();
        match decoded {
            Message::GameSnapshot {
                server_tick,
                states: decoded_states,
            } => {
                assert_eq!(server_tick, 99);
                assert_eq!(decoded_states, states);
            }
            _ => panic!("Wrong message type after deserialization"),
        }
    }

    #[test]
    fn test_variants_are_tagged() {
        let connect = encode_message(&Message::Connect { client_version: 1 }).unwrap();
        let disconnect = encode_message(&Message::Disconnect).unwrap();

        // bincode writes the variant index first
        assert_ne!(connect[..4], disconnect[..4]);
    }

    #[test]
    fn test_malformed_datagram_is_codec_error() {
        let data = encode_message(&Message::Connected { peer_id: 5 }).unwrap();

        let truncated = decode_message(&data[..data.len() / 2]);
        assert!(matches!(truncated, Err(NetcodeError::Codec(_))));

        let mut corrupted = data.clone();
        corrupted[0] = 0xFF;
        assert!(decode_message(&corrupted).is_err());

        assert!(decode_message(&[]).is_err());
    }

    fn snapshot_with(entities: usize) -> Message {
        Message::GameSnapshot {
            server_tick: u32::MAX,
            states: (1..=entities as u32)
                .map(|id| AuthoritativeState {
                    entity_id: id,
                    stamp: u32::MAX,
                    position: Vec3::new(-50.0, 3.5, 50.0),
                    velocity: Vec3::new(9.0, -9.8, -9.0),
                })
                .collect(),
        }
    }

    #[test]
    fn test_snapshot_encoded_size() {
        assert_eq!(encode_message(&snapshot_with(0)).unwrap().len(), SNAPSHOT_HEADER_SIZE);
        assert_eq!(
            encode_message(&snapshot_with(3)).unwrap().len(),
            SNAPSHOT_HEADER_SIZE + 3 * ENCODED_STATE_SIZE
        );
    }

    #[test]
    fn test_largest_snapshot_fits_one_datagram() {
        let full = encode_message(&snapshot_with(crate::MAX_SNAPSHOT_ENTITIES)).unwrap();
        assert!(full.len() <= crate::MAX_DATAGRAM_SIZE);
        assert_eq!(decode_message(&full).unwrap(), snapshot_with(crate::MAX_SNAPSHOT_ENTITIES));

        let over = encode_message(&snapshot_with(crate::MAX_SNAPSHOT_ENTITIES + 1)).unwrap();
        assert!(over.len() > crate::MAX_DATAGRAM_SIZE);
    }

    #[test]
    fn test_message_kind() {
        assert_eq!(Message::Disconnect.kind(), "Disconnect");
        assert_eq!(
            Message::GameSnapshot {
                server_tick: 0,
                states: vec![]
            }
            .kind(),
            "GameSnapshot"
        );
    }

    #[test]
    fn test_only_locally_owned_sends_input() {
        assert!(EntityRole::LocallyOwned.sends_input());
        assert!(!EntityRole::RemoteObserved.sends_input());
        assert!(!EntityRole::ServerAuthoritative.sends_input());
    }
}
