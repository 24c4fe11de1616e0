//! # Shared Netcode Library
//!
//! Code used identically by the client and the server. Anything that affects
//! the simulated trajectory of a player lives here, so both sides compile the
//! exact same arithmetic and prediction can match the authoritative result
//! bit for bit.
//!
//! ## Modules
//!
//! - `math`: 3D vectors and transforms
//! - `input`: movement key flags and stamped input samples
//! - `motion`: the deterministic motion model and its collision collaborator
//! - `protocol`: wire messages exchanged over the unreliable channel
//! - `error`: error type shared by both roles
//!
//! ## Determinism
//!
//! The motion model never reads the wall clock and always integrates with
//! the fixed `FRAME_DELTA`. Given the same transform, velocity and intent it
//! produces the same velocity on every machine running the same build.

pub mod error;
pub mod input;
pub mod math;
pub mod motion;
pub mod protocol;

pub use error::{NetcodeError, Result};
pub use input::{InputSample, Keys};
pub use math::{Transform, Vec3};
pub use motion::{
    compute_motion, intent_from_keys, CollisionBody, FlatGround, MotionState, MovementIntent,
    ACCELERATION, ARENA_HALF_EXTENT, FRAME_DELTA, FRICTION, GRAVITY, JUMP_VELOCITY,
    SPRINT_MULTIPLIER, WALK_SPEED,
};
pub use protocol::{
    decode_message, encode_message, AuthoritativeState, EntityRole, Message, PeerId,
    PROTOCOL_VERSION,
};

/// Maximum distance between predicted and replayed positions that is
/// absorbed without correcting the displayed state.
pub const RECONCILE_TOLERANCE: f32 = 0.01;

/// Receive buffer size for datagrams on both sides.
pub const MAX_DATAGRAM_SIZE: usize = 2048;

/// Most entities a `GameSnapshot` can hold and still fit one datagram.
/// The server never admits more peers than this.
pub const MAX_SNAPSHOT_ENTITIES: usize =
    (MAX_DATAGRAM_SIZE - protocol::SNAPSHOT_HEADER_SIZE) / protocol::ENCODED_STATE_SIZE;
