use crate::prediction::{LocalPlayer, ReconcileOutcome};
use log::{debug, info};
use shared::{AuthoritativeState, EntityRole, Keys, Message, PeerId};
use std::collections::BTreeMap;

/// Everything the client knows about the world
#[derive(Debug, Default)]
pub struct ClientGameState {
    peer_id: Option<PeerId>,
    local_player: Option<LocalPlayer>,
    /// Other peers' entities as of the newest snapshot
    remote_entities: BTreeMap<PeerId, AuthoritativeState>,
    /// Role of every entity in the newest snapshot
    roles: BTreeMap<PeerId, EntityRole>,
    last_server_tick: Option<u32>,
}

impl ClientGameState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the id the server assigned us. Any previous session's state
    /// is dropped.
    pub fn set_peer_id(&mut self, peer_id: PeerId) {
        *self = Self {
            peer_id: Some(peer_id),
            ..Self::default()
        };
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Applies a snapshot. Returns the reconciliation outcome for our own
    /// entity if the snapshot contained it.
    pub fn apply_snapshot(
        &mut self,
        server_tick: u32,
        states: &[AuthoritativeState],
    ) -> Option<ReconcileOutcome> {
        if let Some(last) = self.last_server_tick {
            if server_tick <= last {
                debug!(
                    "Dropping out-of-order snapshot {} (already at {})",
                    server_tick, last
                );
                return None;
            }
        }
        self.last_server_tick = Some(server_tick);

        let peer_id = self.peer_id?;

        self.roles = states
            .iter()
            .map(|state| {
                let role = if state.entity_id == peer_id {
                    EntityRole::LocallyOwned
                } else {
                    EntityRole::RemoteObserved
                };
                (state.entity_id, role)
            })
            .collect();

        self.remote_entities = states
            .iter()
            .filter(|state| self.roles.get(&state.entity_id) == Some(&EntityRole::RemoteObserved))
            .map(|state| (state.entity_id, *state))
            .collect();

        let own = states.iter().find(|state| state.entity_id == peer_id)?;
        match self.local_player.as_mut() {
            Some(player) => Some(player.reconcile(own)),
            None => {
                info!(
                    "Spawned local player {} at ({:.2}, {:.2}, {:.2})",
                    peer_id, own.position.x, own.position.y, own.position.z
                );
                self.local_player = Some(LocalPlayer::from_authoritative(own));
                None
            }
        }
    }

    /// Runs one physics tick for the local player. Returns the command to
    /// send, or None while no entity we may send input for exists.
    pub fn tick(&mut self, keys: Keys) -> Option<Message> {
        let peer_id = self.peer_id?;
        let sends_input = self
            .entity_role(peer_id)
            .map_or(false, |role| role.sends_input());
        if !sends_input {
            return None;
        }

        self.local_player.as_mut().map(|player| player.tick(keys))
    }

    pub fn entity_role(&self, entity_id: PeerId) -> Option<EntityRole> {
        self.roles.get(&entity_id).copied()
    }

    pub fn peer_id(&self) -> Option<PeerId> {
        self.peer_id
    }

    pub fn local_player(&self) -> Option<&LocalPlayer> {
        self.local_player.as_ref()
    }

    pub fn remote_entities(&self) -> impl Iterator<Item = &AuthoritativeState> {
        self.remote_entities.values()
    }

    pub fn last_server_tick(&self) -> Option<u32> {
        self.last_server_tick
    }
}
