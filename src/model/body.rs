use glam::{BVec3, EulerRot, Mat4, Quat, Vec3};

/// Position, velocity and Euler orientation of anything that moves.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct KinematicBody {
    pub position: Vec3,
    pub velocity: Vec3,
    pub orientation: Vec3,
}

impl KinematicBody {
    pub fn integrate(&mut self, dt: f32) {
        self.position += self.velocity * dt;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Shape {
    Cube,
    Sphere,
    Cone,
}

impl Shape {
    pub const ALL: [Shape; 3] = [Shape::Cube, Shape::Sphere, Shape::Cone];

    /// Height of the unit mesh (cube edge 1, sphere radius 0.5, cone height 1).
    pub fn base_height(&self) -> f32 {
        1.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Finish {
    Wireframe,
    Flat,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Appearance {
    pub shape: Shape,
    pub finish: Finish,
    pub color: [f32; 4],
    pub scale: f32,
}

/// A floating world ornament: spins at a constant rate and drifts inside an
/// axis-aligned box, bouncing elastically off its faces.
#[derive(Clone, Debug)]
pub struct DecorativeBody {
    pub body: KinematicBody,
    /// Angular velocity per Euler axis, rad/s.
    pub angular: Vec3,
    pub boundary: f32,
    pub appearance: Appearance,
}

impl DecorativeBody {
    /// Rotate, translate, then reflect. Returns the axes whose velocity flipped.
    pub fn advance(&mut self, dt: f32) -> BVec3 {
        self.body.orientation += self.angular * dt;
        self.body.integrate(dt);

        let p = self.body.position;
        let v = &mut self.body.velocity;
        let (vx, fx) = reflect_axis(p.x, v.x, self.boundary);
        let (vy, fy) = reflect_axis(p.y, v.y, self.boundary);
        let (vz, fz) = reflect_axis(p.z, v.z, self.boundary);
        *v = Vec3::new(vx, vy, vz);
        BVec3::new(fx, fy, fz)
    }

    pub fn model_matrix(&self) -> Mat4 {
        let o = self.body.orientation;
        Mat4::from_scale_rotation_translation(
            Vec3::splat(self.appearance.scale),
            Quat::from_euler(EulerRot::XYZ, o.x, o.y, o.z),
            self.body.position,
        )
    }
}

/// Invert `velocity` when `position` has left `[-boundary, boundary]` and is
/// still heading outward. A body already turned back is left alone, so each
/// crossing flips exactly once.
pub fn reflect_axis(position: f32, velocity: f32, boundary: f32) -> (f32, bool) {
    if position.abs() > boundary && position * velocity > 0.0 {
        (-velocity, true)
    } else {
        (velocity, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drifting(position: Vec3, velocity: Vec3) -> DecorativeBody {
        DecorativeBody {
            body: KinematicBody { position, velocity, orientation: Vec3::ZERO },
            angular: Vec3::new(0.5, -0.25, 0.0),
            boundary: 1000.0,
            appearance: Appearance {
                shape: Shape::Cube,
                finish: Finish::Wireframe,
                color: [0.0, 1.0, 0.0, 1.0],
                scale: 1.0,
            },
        }
    }

    #[test]
    fn flips_only_on_the_crossing_frame() {
        let mut body = drifting(Vec3::new(990.0, 0.0, 0.0), Vec3::new(100.0, 0.0, 0.0));
        let mut flips = 0;
        for _ in 0..500 {
            let before = body.body.velocity.x;
            let flipped = body.advance(0.05);
            let crossed = body.body.position.x.abs() > 1000.0 && body.body.position.x * before > 0.0;
            assert_eq!(flipped.x, crossed);
            if flipped.x {
                flips += 1;
                assert_eq!(body.body.velocity.x, -before);
            }
        }
        // 100 u/s for 25 s: out past +1000, back past -1000, then inward again.
        assert_eq!(flips, 2);
    }

    #[test]
    fn never_flips_inside_the_box() {
        let mut body = drifting(Vec3::new(0.0, 10.0, 0.0), Vec3::new(3.0, -2.0, 1.0));
        for _ in 0..1000 {
            assert!(!body.advance(0.016).any());
        }
        assert_eq!(body.body.velocity, Vec3::new(3.0, -2.0, 1.0));
    }

    #[test]
    fn axes_reflect_independently_on_the_same_frame() {
        let mut body = drifting(Vec3::new(999.0, -999.0, 5.0), Vec3::new(50.0, -50.0, 7.0));
        let flipped = body.advance(0.1);
        assert_eq!(flipped, BVec3::new(true, true, false));
        assert_eq!(body.body.velocity, Vec3::new(-50.0, 50.0, 7.0));
    }

    #[test]
    fn reflection_preserves_speed() {
        let (v, flipped) = reflect_axis(-1000.5, -8.0, 1000.0);
        assert!(flipped);
        assert_eq!(v, 8.0);
        assert_eq!(reflect_axis(1000.0, 8.0, 1000.0), (8.0, false));
    }

    #[test]
    fn orientation_advances_at_constant_rate() {
        let mut body = drifting(Vec3::ZERO, Vec3::ZERO);
        for _ in 0..10 {
            body.advance(0.1);
        }
        assert!((body.body.orientation.x - 0.5).abs() < 1e-5);
        assert!((body.body.orientation.y + 0.25).abs() < 1e-5);
    }
}
