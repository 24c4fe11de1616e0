//! Client-side prediction and reconciliation for the locally owned player
//!
//! Every physics tick the local player samples input, applies it immediately
//! through the shared motion model and queues it for (re)transmission. When
//! the server reports the state it reached after applying stamp S, inputs up
//! to S are dropped and the rest are replayed on top of the server's state.
//! If the replay lands somewhere other than where the player is displayed,
//! the displayed state snaps to the replayed one.

use crate::input_buffer::InputBuffer;
use log::{debug, warn};
use shared::{
    AuthoritativeState, CollisionBody, FlatGround, InputSample, Keys, Message, MotionState,
    PeerId, RECONCILE_TOLERANCE,
};

/// Result of applying one authoritative state
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReconcileOutcome {
    /// Stamp older than one already acknowledged; nothing changed.
    Stale,
    /// Prediction agreed with the server within tolerance.
    Confirmed { deviation: f32 },
    /// Prediction diverged; displayed state replaced by the replay.
    Corrected { deviation: f32 },
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PredictionStats {
    pub predicted_ticks: u64,
    pub reconciliations: u64,
    pub corrections: u64,
    pub largest_correction: f32,
}

/// Prediction and reconciliation state for the player this client controls
#[derive(Debug, Clone)]
pub struct LocalPlayer<B: CollisionBody = FlatGround> {
    peer_id: PeerId,
    body: B,
    /// Displayed state, including unacknowledged predictions
    state: MotionState,
    buffer: InputBuffer,
    next_stamp: u32,
    stats: PredictionStats,
}

impl LocalPlayer<FlatGround> {
    /// Spawns the local player at the first authoritative state seen for it.
    pub fn from_authoritative(state: &AuthoritativeState) -> Self {
        Self::with_body(state, FlatGround::default())
    }
}

impl<B: CollisionBody> LocalPlayer<B> {
    pub fn with_body(state: &AuthoritativeState, body: B) -> Self {
        Self {
            peer_id: state.entity_id,
            body,
            state: MotionState::new(state.position, state.velocity),
            buffer: InputBuffer::acknowledged_through(state.stamp),
            next_stamp: state.stamp + 1,
            stats: PredictionStats::default(),
        }
    }

    /// Runs one physics tick: stamps and buffers the input, predicts the
    /// move locally, and returns the command batch to transmit.
    pub fn tick(&mut self, keys: Keys) -> Message {
        let input = InputSample::new(self.next_stamp, keys);
        self.predict(input);

        let command = self.command();
        self.next_stamp += 1;
        command
    }

    fn predict(&mut self, input: InputSample) {
        if self.buffer.push(input) {
            self.state.step(&self.body, input.keys);
            self.stats.predicted_ticks += 1;
        }
    }

    /// Command carrying every unacknowledged input, oldest first.
    pub fn command(&self) -> Message {
        Message::UserCommand {
            peer_id: self.peer_id,
            inputs: self.buffer.batch(),
        }
    }

    /// Applies the server's state for this player.
    pub fn reconcile(&mut self, authoritative: &AuthoritativeState) -> ReconcileOutcome {
        if authoritative.stamp < self.buffer.last_acknowledged() {
            debug!(
                "Ignoring stale state for stamp {} (acknowledged {})",
                authoritative.stamp,
                self.buffer.last_acknowledged()
            );
            return ReconcileOutcome::Stale;
        }

        self.buffer.acknowledge(authoritative.stamp);
        self.stats.reconciliations += 1;

        let mut replayed = MotionState::new(authoritative.position, authoritative.velocity);
        for input in self.buffer.iter() {
            replayed.step(&self.body, input.keys);
        }

        let deviation = replayed.position.distance(&self.state.position);
        if deviation > RECONCILE_TOLERANCE {
            warn!(
                "Client {} prediction mismatch at stamp {}: deviation {:.4}, replayed {} inputs",
                self.peer_id,
                authoritative.stamp,
                deviation,
                self.buffer.len()
            );

            self.state = replayed;
            self.stats.corrections += 1;
            self.stats.largest_correction = self.stats.largest_correction.max(deviation);
            ReconcileOutcome::Corrected { deviation }
        } else {
            ReconcileOutcome::Confirmed { deviation }
        }
    }

    pub fn peer_id(&self) -> PeerId {
        self.peer_id
    }

    pub fn state(&self) -> &MotionState {
        &self.state
    }

    pub fn pending_inputs(&self) -> &InputBuffer {
        &self.buffer
    }

    /// Stamp the next tick's input will carry.
    pub fn next_stamp(&self) -> u32 {
        self.next_stamp
    }

    pub fn stats(&self) -> &PredictionStats {
        &self.stats
    }
}
