//! Deterministic motion model shared by client prediction and server authority
//!
//! Both roles advance a player exclusively through [`MotionState::step`], which
//! calls [`compute_motion`] and then integrates the position with the fixed
//! [`FRAME_DELTA`]. Nothing here reads the clock or draws random numbers, so
//! the client can replay unacknowledged inputs and land on exactly the
//! position the server will compute for them.

use crate::input::Keys;
use crate::math::{Transform, Vec3};
use serde::{Deserialize, Serialize};

/// Fixed integration step in seconds (60Hz physics).
pub const FRAME_DELTA: f32 = 1.0 / 60.0;
/// Top horizontal ground speed in units per second.
pub const WALK_SPEED: f32 = 5.0;
pub const SPRINT_MULTIPLIER: f32 = 1.8;
/// Horizontal acceleration applied per second while a direction is held.
pub const ACCELERATION: f32 = 40.0;
/// Horizontal deceleration per second when no direction is held.
pub const FRICTION: f32 = 30.0;
pub const GRAVITY: f32 = 9.8;
pub const JUMP_VELOCITY: f32 = 4.5;
/// Half the side length of the square arena enclosing the floor.
pub const ARENA_HALF_EXTENT: f32 = 50.0;

const FLOOR_EPSILON: f32 = 1e-4;

/// Movement intent derived from a tick's key flags
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MovementIntent {
    /// Horizontal unit vector, or zero when no direction is held.
    pub direction: Vec3,
    pub jump: bool,
    pub sprint: bool,
}

/// Maps key flags to a movement intent.
///
/// Forward is -Z and Right is +X. Opposing keys cancel and diagonals are
/// normalized so moving forward+right is no faster than moving forward.
pub fn intent_from_keys(keys: Keys) -> MovementIntent {
    let axis = |positive: Keys, negative: Keys| -> f32 {
        let mut value = 0.0;
        if keys.contains(positive) {
            value += 1.0;
        }
        if keys.contains(negative) {
            value -= 1.0;
        }
        value
    };

    let x = axis(Keys::RIGHT, Keys::LEFT);
    let z = axis(Keys::BACKWARD, Keys::FORWARD);

    MovementIntent {
        direction: Vec3::new(x, 0.0, z).normalize(),
        jump: keys.contains(Keys::SPACE),
        sprint: keys.contains(Keys::SHIFT),
    }
}

/// Collision queries the motion model depends on.
///
/// Implementations must answer identically for identical inputs on client and
/// server; the physics engine behind them is treated as a black box.
pub trait CollisionBody {
    /// Returns true if a body at `transform` is standing on walkable ground.
    fn is_on_floor(&self, transform: &Transform) -> bool;

    /// Adjusts `velocity` so that one `FRAME_DELTA` step from `transform`
    /// does not penetrate any obstacle.
    fn clip_velocity(&self, transform: &Transform, velocity: Vec3) -> Vec3;
}

/// Infinite flat floor at `floor_y` inside a square arena.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlatGround {
    pub floor_y: f32,
    pub half_extent: f32,
}

impl Default for FlatGround {
    fn default() -> Self {
        Self {
            floor_y: 0.0,
            half_extent: ARENA_HALF_EXTENT,
        }
    }
}

impl FlatGround {
    fn clip_axis(position: f32, velocity: f32, min: f32, max: f32) -> f32 {
        let next = position + velocity * FRAME_DELTA;
        if next < min {
            (min - position) / FRAME_DELTA
        } else if next > max {
            (max - position) / FRAME_DELTA
        } else {
            velocity
        }
    }
}

impl CollisionBody for FlatGround {
    fn is_on_floor(&self, transform: &Transform) -> bool {
        transform.origin.y <= self.floor_y + FLOOR_EPSILON
    }

    fn clip_velocity(&self, transform: &Transform, velocity: Vec3) -> Vec3 {
        let origin = transform.origin;
        let bound = self.half_extent;

        // Landing snaps onto the floor; resting within FLOOR_EPSILON below it is left alone
        let vertical = if origin.y + velocity.y * FRAME_DELTA < self.floor_y - FLOOR_EPSILON {
            (self.floor_y - origin.y) / FRAME_DELTA
        } else {
            velocity.y
        };

        Vec3::new(
            Self::clip_axis(origin.x, velocity.x, -bound, bound),
            vertical,
            Self::clip_axis(origin.z, velocity.z, -bound, bound),
        )
    }
}

/// Computes the velocity a body leaves this tick with.
///
/// Never mutates position; the caller advances by `velocity * FRAME_DELTA`.
pub fn compute_motion<B: CollisionBody + ?Sized>(
    body: &B,
    transform: &Transform,
    velocity: Vec3,
    intent: &MovementIntent,
) -> Vec3 {
    let grounded = body.is_on_floor(transform);

    let mut horizontal = velocity.horizontal();
    if intent.direction == Vec3::ZERO {
        let speed = horizontal.length();
        if speed > 0.0 {
            let reduced = (speed - FRICTION * FRAME_DELTA).max(0.0);
            horizontal = horizontal * (reduced / speed);
        }
    } else {
        let max_speed = if intent.sprint {
            WALK_SPEED * SPRINT_MULTIPLIER
        } else {
            WALK_SPEED
        };

        horizontal += intent.direction * (ACCELERATION * FRAME_DELTA);
        let speed = horizontal.length();
        if speed > max_speed {
            horizontal = horizontal * (max_speed / speed);
        }
    }

    let vertical = if !grounded {
        velocity.y - GRAVITY * FRAME_DELTA
    } else if intent.jump {
        JUMP_VELOCITY
    } else {
        0.0
    };

    body.clip_velocity(transform, Vec3::new(horizontal.x, vertical, horizontal.z))
}

/// Position and velocity of one simulated player
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MotionState {
    pub position: Vec3,
    pub velocity: Vec3,
}

impl MotionState {
    pub fn new(position: Vec3, velocity: Vec3) -> Self {
        Self { position, velocity }
    }

    pub fn transform(&self) -> Transform {
        Transform::from_origin(self.position)
    }

    /// Advances one physics tick with the given keys held.
    pub fn step<B: CollisionBody + ?Sized>(&mut self, body: &B, keys: Keys) {
        let intent = intent_from_keys(keys);
        self.velocity = compute_motion(body, &self.transform(), self.velocity, &intent);
        self.position += self.velocity * FRAME_DELTA;
    }
}
