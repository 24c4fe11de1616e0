use crate::entity::ServerEntity;
use log::info;
use shared::{InputSample, Message, NetcodeError, PeerId, Vec3};
use std::collections::BTreeMap;

/// Authoritative world: one entity per connected peer
#[derive(Debug, Default)]
pub struct GameState {
    /// Entity registry keyed by owning peer; ordered so snapshots list
    /// entities by ascending id
    entities: BTreeMap<PeerId, ServerEntity>,
}

impl GameState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spreads spawn points along the X axis so new players don't overlap.
    pub fn spawn_position(peer_id: PeerId) -> Vec3 {
        let slot = (peer_id.saturating_sub(1) % 8) as f32;
        Vec3::new(slot * 2.0 - 7.0, 0.0, 0.0)
    }

    /// Creates the entity for a newly connected peer, replacing any stale
    /// entity left under the same id.
    pub fn add_entity(&mut self, peer_id: PeerId) {
        let position = Self::spawn_position(peer_id);
        let entity = ServerEntity::new(peer_id, position);
        info!(
            "Added {:?} entity {} at ({:.2}, {:.2}, {:.2})",
            entity.role(),
            peer_id,
            position.x,
            position.y,
            position.z
        );
        self.entities.insert(peer_id, entity);
    }

    pub fn remove_entity(&mut self, peer_id: &PeerId) -> bool {
        if self.entities.remove(peer_id).is_some() {
            info!("Removed entity {}", peer_id);
            true
        } else {
            false
        }
    }

    /// Feeds a command batch to the peer's entity. Returns how many inputs
    /// were new.
    pub fn handle_user_command(
        &mut self,
        peer_id: PeerId,
        inputs: &[InputSample],
    ) -> shared::Result<usize> {
        let entity = self
            .entities
            .get_mut(&peer_id)
            .ok_or(NetcodeError::UnknownPeer(peer_id))?;
        Ok(entity.push_command(inputs))
    }

    /// Captures every entity's state, or None when nobody is connected.
    pub fn capture_snapshot(&self, server_tick: u32) -> Option<Message> {
        if self.entities.is_empty() {
            return None;
        }

        Some(Message::GameSnapshot {
            server_tick,
            states: self
                .entities
                .values()
                .map(|entity| entity.capture_state())
                .collect(),
        })
    }

    pub fn entity(&self, peer_id: &PeerId) -> Option<&ServerEntity> {
        self.entities.get(peer_id)
    }

    pub fn contains(&self, peer_id: &PeerId) -> bool {
        self.entities.contains_key(peer_id)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}
