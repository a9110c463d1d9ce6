use crate::config::ZoomConfig;
use crate::model::Camera;

/// Handles camera orientation and the zoom field of view
pub struct CameraController {
    pub mouse_sensitivity: f32,
}

impl CameraController {
    pub fn new(mouse_sensitivity: f32) -> Self {
        Self { mouse_sensitivity }
    }

    /// Apply mouse look delta to camera
    pub fn apply_look(&self, camera: &mut Camera, dx: f32, dy: f32) {
        camera.yaw += dx * self.mouse_sensitivity;
        let pi_half = std::f32::consts::PI / 2.0;
        camera.pitch = (camera.pitch - dy * self.mouse_sensitivity).clamp(-pi_half, pi_half);
    }

    /// Ease the FOV toward the zoom or default target. The step is a plain
    /// `rate * dt` lerp, so the easing speed depends on the frame rate.
    pub fn update_zoom(&self, camera: &mut Camera, zooming: bool, zoom: &ZoomConfig, dt: f32) {
        let target = if zooming { zoom.zoom_fov_deg } else { zoom.default_fov_deg };
        let fov = camera.fov_degrees();
        camera.set_fov_degrees(fov + (target - fov) * zoom.rate * dt);
    }
}

impl Default for CameraController {
    fn default() -> Self {
        Self::new(0.002)
    }
}
