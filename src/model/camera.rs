use glam::{Mat4, Vec3};

/// First-person camera rig: eye position, yaw/pitch orientation and a
/// perspective projection whose FOV is animated by the zoom control.
pub struct Camera {
    pub eye: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub up: Vec3,
    pub fov_y: f32,
    pub aspect: f32,
    pub z_near: f32,
    pub z_far: f32,
}

impl Camera {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            eye: Vec3::new(0.0, 2.0, 0.0),
            // Looking down -Z, like a freshly created scene camera.
            yaw: -std::f32::consts::FRAC_PI_2,
            pitch: 0.0,
            up: Vec3::Y,
            fov_y: 75f32.to_radians(),
            aspect: width as f32 / height.max(1) as f32,
            z_near: 0.1,
            z_far: 2000.0,
        }
    }

    pub fn forward(&self) -> Vec3 {
        let cy = self.yaw;
        let cp = self.pitch.clamp(-1.5533, 1.5533); // Slightly less than π/2 to avoid gimbal lock
        Vec3::new(cy.cos() * cp.cos(), cp.sin(), cy.sin() * cp.cos()).normalize()
    }

    pub fn right(&self) -> Vec3 {
        self.forward().cross(self.up).normalize_or_zero()
    }

    /// Forward projected onto the ground plane.
    pub fn forward_flat(&self) -> Vec3 {
        Vec3::new(self.yaw.cos(), 0.0, self.yaw.sin())
    }

    pub fn right_flat(&self) -> Vec3 {
        self.forward_flat().cross(Vec3::Y)
    }

    /// Walk along the ground plane, ignoring pitch.
    pub fn move_forward(&mut self, distance: f32) {
        self.eye += self.forward_flat() * distance;
    }

    pub fn move_right(&mut self, distance: f32) {
        self.eye += self.right_flat() * distance;
    }

    pub fn target(&self) -> Vec3 {
        self.eye + self.forward()
    }

    pub fn set_aspect(&mut self, width: u32, height: u32) {
        self.aspect = width as f32 / height.max(1) as f32;
    }

    pub fn fov_degrees(&self) -> f32 {
        self.fov_y.to_degrees()
    }

    pub fn set_fov_degrees(&mut self, degrees: f32) {
        self.fov_y = degrees.to_radians();
    }

    pub fn view_proj(&self) -> Mat4 {
        let view = Mat4::look_at_rh(self.eye, self.target(), self.up);
        let proj = Mat4::perspective_rh(self.fov_y, self.aspect, self.z_near, self.z_far);
        proj * view
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_camera_looks_down_negative_z() {
        let cam = Camera::new(800, 600);
        let f = cam.forward();
        assert!((f - Vec3::NEG_Z).length() < 1e-5, "forward was {f:?}");
        assert!((cam.right() - Vec3::X).length() < 1e-5);
    }

    #[test]
    fn flat_movement_ignores_pitch() {
        let mut cam = Camera::new(800, 600);
        cam.pitch = 1.0;
        cam.move_forward(10.0);
        assert!((cam.eye.y - 2.0).abs() < 1e-5);
        assert!((cam.eye.z + 10.0).abs() < 1e-4);
        cam.move_right(5.0);
        assert!((cam.eye.x - 5.0).abs() < 1e-4);
    }

    #[test]
    fn fov_round_trips_through_degrees() {
        let mut cam = Camera::new(800, 600);
        cam.set_fov_degrees(35.0);
        assert!((cam.fov_degrees() - 35.0).abs() < 1e-4);
    }
}
