use glam::Vec3;
use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::config::{PickupConfig, WorldConfig};
use super::body::{Appearance, DecorativeBody, Finish, KinematicBody, Shape};

pub const NEON_GREEN: [f32; 4] = [0.0, 1.0, 0.0, 1.0];
pub const NEON_CYAN: [f32; 4] = [0.0, 1.0, 1.0, 1.0];
pub const NEON_MAGENTA: [f32; 4] = [1.0, 0.0, 1.0, 1.0];
pub const COLLECTIBLE_GOLD: [f32; 4] = [1.0, 0.85, 0.1, 1.0];

const PALETTE: [[f32; 4]; 3] = [NEON_GREEN, NEON_CYAN, NEON_MAGENTA];

/// Ambient fill plus one coloured point light.
#[derive(Clone, Copy, Debug)]
pub struct Lighting {
    pub ambient: [f32; 3],
    pub point_position: Vec3,
    pub point_color: [f32; 3],
    pub point_intensity: f32,
    pub point_range: f32,
}

impl Default for Lighting {
    fn default() -> Self {
        Self {
            ambient: [0.25, 0.25, 0.25], // 0x404040
            point_position: Vec3::new(10.0, 10.0, 10.0),
            point_color: [0.0, 1.0, 0.0],
            point_intensity: 1.0,
            point_range: 100.0,
        }
    }
}

/// The static layout plus every decorative body. Built once per session.
pub struct World {
    pub bodies: Vec<DecorativeBody>,
    pub lighting: Lighting,
    pub grid_size: f32,
    pub grid_divisions: u32,
}

impl World {
    pub fn build(config: &WorldConfig, rng: &mut ChaCha8Rng) -> Self {
        Self {
            bodies: scatter_decorations(config, rng),
            lighting: Lighting::default(),
            grid_size: config.grid_size,
            grid_divisions: config.grid_divisions,
        }
    }

    /// Advance every body; returns how many velocity components flipped.
    pub fn advance(&mut self, dt: f32) -> usize {
        self.bodies
            .iter_mut()
            .map(|b| {
                let flipped = b.advance(dt);
                flipped.x as usize + flipped.y as usize + flipped.z as usize
            })
            .sum()
    }
}

fn random_in(rng: &mut ChaCha8Rng, min: f32, max: f32) -> f32 {
    min + rng.random::<f32>() * (max - min)
}

/// Giants first, then surface objects resting on the grid, then floaters.
/// Only floaters drift; giants and surface objects just spin.
pub fn scatter_decorations(config: &WorldConfig, rng: &mut ChaCha8Rng) -> Vec<DecorativeBody> {
    let half = config.scatter_range / 2.0;
    let mut bodies = Vec::with_capacity(config.object_count);

    for i in 0..config.object_count {
        let shape = Shape::ALL[rng.random_range(0..Shape::ALL.len())];
        // Six materials: three wireframe, three flat shaded.
        let material = rng.random_range(0..PALETTE.len() * 2);
        let finish = if material < PALETTE.len() { Finish::Wireframe } else { Finish::Flat };
        let color = PALETTE[material % PALETTE.len()];

        let x = random_in(rng, -half, half);
        let z = random_in(rng, -half, half);
        let (scale, y, drifts) = if i < config.giant_count {
            (random_in(rng, 10.0, 20.0), random_in(rng, 30.0, 130.0), false)
        } else if i < config.giant_count + config.surface_count {
            let desired_height = 2.0;
            let scale = desired_height / shape.base_height() * random_in(rng, 0.9, 1.1);
            (scale, shape.base_height() / 2.0 * scale, false)
        } else {
            (1.0, random_in(rng, 10.0, 60.0), true)
        };

        let pi = std::f32::consts::PI;
        let orientation = Vec3::new(
            random_in(rng, 0.0, pi),
            random_in(rng, 0.0, pi),
            random_in(rng, 0.0, pi),
        );
        let spin = config.max_spin;
        let angular = Vec3::new(
            random_in(rng, -spin, spin),
            random_in(rng, -spin, spin),
            random_in(rng, -spin, spin),
        );
        let velocity = if drifts {
            let s = config.max_drift_speed;
            Vec3::new(random_in(rng, -s, s), random_in(rng, -s, s) * 0.25, random_in(rng, -s, s))
        } else {
            Vec3::ZERO
        };

        bodies.push(DecorativeBody {
            body: KinematicBody { position: Vec3::new(x, y, z), velocity, orientation },
            angular,
            boundary: config.boundary,
            appearance: Appearance { shape, finish, color, scale },
        });
    }
    bodies
}

/// Positions for one stage's collectibles, none closer than the configured
/// clearance to `spawn`.
pub fn scatter_collectibles(config: &PickupConfig, spawn: Vec3, rng: &mut ChaCha8Rng) -> Vec<Vec3> {
    let mut positions = Vec::with_capacity(config.count);
    while positions.len() < config.count {
        let candidate = Vec3::new(
            random_in(rng, -config.spread, config.spread),
            random_in(rng, config.min_height, config.max_height),
            random_in(rng, -config.spread, config.spread),
        );
        if candidate.distance(spawn) >= config.spawn_clearance {
            positions.push(candidate);
        }
    }
    positions
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn decorations_follow_the_layout() {
        let config = WorldConfig::default();
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let bodies = scatter_decorations(&config, &mut rng);
        assert_eq!(bodies.len(), 30);

        for b in &bodies[..4] {
            assert!((10.0..=20.0).contains(&b.appearance.scale));
            assert!((30.0..=130.0).contains(&b.body.position.y));
            assert_eq!(b.body.velocity, Vec3::ZERO);
        }
        for b in &bodies[4..9] {
            // Base sits on the grid.
            let bottom = b.body.position.y - b.appearance.scale * 0.5;
            assert!(bottom.abs() < 1e-4);
            assert!((1.8..=2.2).contains(&b.appearance.scale));
        }
        for b in &bodies[9..] {
            assert!((10.0..=60.0).contains(&b.body.position.y));
        }
        for b in &bodies {
            assert!(b.body.position.x.abs() <= 250.0 && b.body.position.z.abs() <= 250.0);
            assert!(b.angular.abs().max_element() <= config.max_spin);
        }
    }

    #[test]
    fn same_seed_same_world() {
        let config = WorldConfig::default();
        let a = scatter_decorations(&config, &mut ChaCha8Rng::seed_from_u64(99));
        let b = scatter_decorations(&config, &mut ChaCha8Rng::seed_from_u64(99));
        let pa: Vec<Vec3> = a.iter().map(|d| d.body.position).collect();
        let pb: Vec<Vec3> = b.iter().map(|d| d.body.position).collect();
        assert_eq!(pa, pb);
    }

    #[test]
    fn collectibles_keep_clear_of_spawn() {
        let config = PickupConfig::default();
        let spawn = Vec3::new(0.0, 2.0, 0.0);
        let positions = scatter_collectibles(&config, spawn, &mut ChaCha8Rng::seed_from_u64(3));
        assert_eq!(positions.len(), config.count);
        for p in positions {
            assert!(p.distance(spawn) >= config.spawn_clearance);
            assert!((config.min_height..=config.max_height).contains(&p.y));
        }
    }
}
