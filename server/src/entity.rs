//! Server-side player entity and its command queue
//!
//! Command batches arrive redundantly and in any order. The entity applies
//! each input at most once, in stamp order, through the same motion model
//! the owning client predicts with.

use shared::{
    AuthoritativeState, CollisionBody, EntityRole, FlatGround, InputSample, MotionState, PeerId,
    Vec3,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EntityStats {
    pub applied_inputs: u64,
    pub duplicate_inputs: u64,
}

/// Authoritative entity owned by one connected peer
#[derive(Debug, Clone)]
pub struct ServerEntity<B: CollisionBody = FlatGround> {
    peer_id: PeerId,
    body: B,
    state: MotionState,
    /// Highest stamp applied so far; 0 before any input
    last_consumed: u32,
    stats: EntityStats,
}

impl ServerEntity<FlatGround> {
    pub fn new(peer_id: PeerId, position: Vec3) -> Self {
        Self::with_body(peer_id, position, FlatGround::default())
    }
}

impl<B: CollisionBody> ServerEntity<B> {
    pub fn with_body(peer_id: PeerId, position: Vec3, body: B) -> Self {
        Self {
            peer_id,
            body,
            state: MotionState::new(position, Vec3::ZERO),
            last_consumed: 0,
            stats: EntityStats::default(),
        }
    }

    /// Applies every new input of a batch in ascending stamp order.
    /// Returns how many inputs actually moved the entity.
    pub fn push_command(&mut self, inputs: &[InputSample]) -> usize {
        let mut ordered: Vec<&InputSample> = inputs.iter().collect();
        ordered.sort_by_key(|input| input.stamp);

        ordered
            .into_iter()
            .filter(|input| self.apply_input(input))
            .count()
    }

    /// Applies one input unless its stamp was already consumed.
    pub fn apply_input(&mut self, input: &InputSample) -> bool {
        if input.stamp <= self.last_consumed {
            self.stats.duplicate_inputs += 1;
            return false;
        }

        self.state.step(&self.body, input.keys);
        self.last_consumed = input.stamp;
        self.stats.applied_inputs += 1;
        true
    }

    pub fn capture_state(&self) -> AuthoritativeState {
        AuthoritativeState {
            entity_id: self.peer_id,
            stamp: self.last_consumed,
            position: self.state.position,
            velocity: self.state.velocity,
        }
    }

    pub fn role(&self) -> EntityRole {
        EntityRole::ServerAuthoritative
    }

    pub fn peer_id(&self) -> PeerId {
        self.peer_id
    }

    pub fn state(&self) -> &MotionState {
        &self.state
    }

    pub fn last_consumed(&self) -> u32 {
        self.last_consumed
    }

    pub fn stats(&self) -> &EntityStats {
        &self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;
    use rand::{Rng, SeedableRng};
    use shared::Keys;

    fn inputs(keys: &[Keys]) -> Vec<InputSample> {
        keys.iter()
            .enumerate()
            .map(|(i, keys)| InputSample::new(i as u32 + 1, *keys))
            .collect()
    }

    fn baseline(samples: &[InputSample]) -> ServerEntity {
        let mut entity = ServerEntity::new(1, Vec3::ZERO);
        for sample in samples {
            assert!(entity.apply_input(sample));
        }
        entity
    }

    #[test]
    fn test_new_entity_is_server_authoritative() {
        let entity = ServerEntity::new(9, Vec3::new(1.0, 0.0, 2.0));
        assert_eq!(entity.role(), EntityRole::ServerAuthoritative);

        let captured = entity.capture_state();
        assert_eq!(captured.entity_id, 9);
        assert_eq!(captured.stamp, 0);
        assert_eq!(captured.position, Vec3::new(1.0, 0.0, 2.0));
        assert_eq!(captured.velocity, Vec3::ZERO);
    }

    #[test]
    fn test_reapplying_input_is_a_no_op() {
        let mut entity = ServerEntity::new(1, Vec3::ZERO);
        let input = InputSample::new(1, Keys::FORWARD | Keys::SPACE);

        assert!(entity.apply_input(&input));
        let after_first = *entity.state();

        assert!(!entity.apply_input(&input));
        assert_eq!(entity.state(), &after_first);
        assert_eq!(entity.last_consumed(), 1);
        assert_eq!(entity.stats().duplicate_inputs, 1);
    }

    #[test]
    fn test_batch_is_applied_in_stamp_order() {
        let samples = inputs(&[Keys::FORWARD, Keys::RIGHT, Keys::SPACE, Keys::LEFT]);
        let expected = baseline(&samples);

        let mut reversed = samples.clone();
        reversed.reverse();

        let mut entity = ServerEntity::new(1, Vec3::ZERO);
        assert_eq!(entity.push_command(&reversed), 4);
        assert_eq!(entity.state(), expected.state());
        assert_eq!(entity.last_consumed(), 4);
    }

    #[test]
    fn test_overlapping_batches_apply_each_stamp_once() {
        let samples = inputs(&[Keys::FORWARD; 6]);
        let expected = baseline(&samples);

        let mut entity = ServerEntity::new(1, Vec3::ZERO);
        assert_eq!(entity.push_command(&samples[..2]), 2);
        assert_eq!(entity.push_command(&samples[..4]), 2);
        assert_eq!(entity.push_command(&samples[..4]), 0);
        assert_eq!(entity.push_command(&samples[2..]), 2);

        assert_eq!(entity.state(), expected.state());
        assert_eq!(entity.stats().applied_inputs, 6);
        assert_eq!(entity.stats().duplicate_inputs, 8);
    }

    #[test]
    fn test_redundant_batches_converge_despite_loss_and_reordering() {
        let pattern = [
            Keys::FORWARD,
            Keys::FORWARD | Keys::SHIFT,
            Keys::RIGHT | Keys::SPACE,
            Keys::BACKWARD,
            Keys::empty(),
            Keys::LEFT | Keys::FORWARD,
        ];
        let samples: Vec<InputSample> = (0..60)
            .map(|i| InputSample::new(i as u32 + 1, pattern[(i / 7) % pattern.len()]))
            .collect();
        let expected = baseline(&samples);

        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut entity = ServerEntity::new(1, Vec3::ZERO);
            let mut client_ack = 0u32;
            let mut in_flight: Vec<Vec<InputSample>> = Vec::new();

            for newest in 0..samples.len() {
                // Client resends everything after the newest stamp it saw acknowledged
                in_flight.push(samples[client_ack as usize..=newest].to_vec());

                // Deliver a random subset in random order, losing some on the way
                in_flight.shuffle(&mut rng);
                let delivered = rng.gen_range(0..=in_flight.len());
                for batch in in_flight.drain(..delivered) {
                    if rng.gen_bool(0.3) {
                        continue;
                    }
                    entity.push_command(&batch);
                }

                if rng.gen_bool(0.4) {
                    client_ack = entity.last_consumed();
                }
            }

            // Whatever is still in flight is lost; one final batch gets through
            entity.push_command(&samples[client_ack as usize..]);

            assert_eq!(entity.last_consumed(), 60, "seed {}", seed);
            assert_eq!(entity.state(), expected.state(), "seed {}", seed);
        }
    }

    #[test]
    fn test_empty_batch_changes_nothing() {
        let mut entity = ServerEntity::new(1, Vec3::ZERO);
        assert_eq!(entity.push_command(&[]), 0);
        assert_eq!(entity.last_consumed(), 0);
    }
}
