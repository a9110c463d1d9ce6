use glam::Vec3;

use crate::config::{FlightConfig, GameConfig, GroundedConfig, LocomotionMode};
use crate::model::Camera;
use super::input::InputState;

/// Movement flags read by the integrators for one frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MoveIntent {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
    pub running: bool,
}

impl From<&InputState> for MoveIntent {
    fn from(input: &InputState) -> Self {
        Self {
            forward: input.forward,
            backward: input.backward,
            left: input.left,
            right: input.right,
            up: input.up,
            down: input.down,
            running: input.running,
        }
    }
}

/// Discrete exponential drag: `v *= max(0, 1 - rate * dt)`.
pub fn damping_factor(rate: f32, dt: f32) -> f32 {
    (1.0 - rate * dt).max(0.0)
}

/// One way of moving the camera rig through the world.
pub trait Locomotion {
    fn mode(&self) -> LocomotionMode;

    /// Integrate one frame. `boost` multiplies acceleration on top of the
    /// mode's own run factor.
    fn integrate(&mut self, camera: &mut Camera, intent: &MoveIntent, boost: f32, dt: f32);

    /// One-shot jump. Returns whether it took effect.
    fn jump(&mut self) -> bool {
        false
    }

    fn velocity(&self) -> Vec3;

    fn reset(&mut self);
}

pub fn locomotion_for(config: &GameConfig) -> Box<dyn Locomotion> {
    match config.locomotion {
        LocomotionMode::FreeFlight => Box::new(FreeFlight::new(config.flight)),
        LocomotionMode::Grounded => Box::new(Grounded::new(config.grounded)),
    }
}

/// Damped-acceleration flight along the camera's own axes.
pub struct FreeFlight {
    config: FlightConfig,
    velocity: Vec3,
}

impl FreeFlight {
    pub fn new(config: FlightConfig) -> Self {
        Self { config, velocity: Vec3::ZERO }
    }
}

impl Locomotion for FreeFlight {
    fn mode(&self) -> LocomotionMode {
        LocomotionMode::FreeFlight
    }

    fn integrate(&mut self, camera: &mut Camera, intent: &MoveIntent, boost: f32, dt: f32) {
        let run = if intent.running { self.config.run_factor } else { 1.0 };
        let acceleration = self.config.base_acceleration * run * boost;

        let forward = camera.forward();
        let right = camera.right();

        let mut direction = Vec3::ZERO;
        if intent.forward {
            direction += forward;
        }
        if intent.backward {
            direction -= forward;
        }
        if intent.right {
            direction += right;
        }
        if intent.left {
            direction -= right;
        }
        if intent.up {
            direction += camera.up;
        }
        if intent.down {
            direction -= camera.up;
        }

        // Normalized so diagonals are no faster than a single axis.
        if direction.length_squared() > 0.0 {
            self.velocity += direction.normalize() * acceleration * dt;
        }

        camera.eye += self.velocity * dt;
        self.velocity *= damping_factor(self.config.friction_rate, dt);
    }

    fn velocity(&self) -> Vec3 {
        self.velocity
    }

    fn reset(&mut self) {
        self.velocity = Vec3::ZERO;
    }
}

/// Walking with gravity, a floor and a single jump.
///
/// Velocity is kept in player space: `x` strafes right, `z` walks forward,
/// `y` is world up.
pub struct Grounded {
    config: GroundedConfig,
    velocity: Vec3,
    can_jump: bool,
}

impl Grounded {
    pub fn new(config: GroundedConfig) -> Self {
        Self { config, velocity: Vec3::ZERO, can_jump: true }
    }

    pub fn can_jump(&self) -> bool {
        self.can_jump
    }
}

impl Locomotion for Grounded {
    fn mode(&self) -> LocomotionMode {
        LocomotionMode::Grounded
    }

    fn integrate(&mut self, camera: &mut Camera, intent: &MoveIntent, boost: f32, dt: f32) {
        let decay = damping_factor(self.config.damping_rate, dt);
        self.velocity.x *= decay;
        self.velocity.z *= decay;

        let axis = |pos: bool, neg: bool| pos as i32 as f32 - neg as i32 as f32;
        let direction = Vec3::new(
            axis(intent.right, intent.left),
            0.0,
            axis(intent.forward, intent.backward),
        )
        .normalize_or_zero();

        let run = if intent.running { self.config.run_factor } else { 1.0 };
        let speed = self.config.move_speed * run * boost;
        if intent.forward || intent.backward {
            self.velocity.z += direction.z * speed * dt;
        }
        if intent.left || intent.right {
            self.velocity.x += direction.x * speed * dt;
        }

        camera.move_forward(self.velocity.z * dt);
        camera.move_right(self.velocity.x * dt);

        self.velocity.y -= self.config.gravity * dt;
        camera.eye.y += self.velocity.y * dt;

        if camera.eye.y < self.config.floor_height {
            self.velocity.y = 0.0;
            camera.eye.y = self.config.floor_height;
            self.can_jump = true;
        }
    }

    fn jump(&mut self) -> bool {
        if !self.can_jump {
            return false;
        }
        self.velocity.y += self.config.jump_strength;
        self.can_jump = false;
        true
    }

    fn velocity(&self) -> Vec3 {
        self.velocity
    }

    fn reset(&mut self) {
        self.velocity = Vec3::ZERO;
        self.can_jump = true;
    }
}
