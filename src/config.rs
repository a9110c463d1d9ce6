use glam::Vec3;

use crate::i18n::Locale;

/// Which movement model drives the camera rig. Chosen once when the
/// session is built and never switched at runtime.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LocomotionMode {
    /// Damped-acceleration six degrees of freedom flight.
    FreeFlight,
    /// Walking on the grid with gravity and a single jump.
    Grounded,
}

impl LocomotionMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "flight" | "fly" | "free" | "6dof" => Some(LocomotionMode::FreeFlight),
            "grounded" | "ground" | "walk" => Some(LocomotionMode::Grounded),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            LocomotionMode::FreeFlight => "flight",
            LocomotionMode::Grounded => "grounded",
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct FlightConfig {
    pub base_acceleration: f32,
    pub run_factor: f32,
    /// Exponential drag rate in 1/s.
    pub friction_rate: f32,
}

impl Default for FlightConfig {
    fn default() -> Self {
        Self {
            base_acceleration: 200.0,
            run_factor: 3.0,
            friction_rate: 3.0,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct GroundedConfig {
    pub move_speed: f32,
    pub run_factor: f32,
    /// Horizontal damping rate in 1/s.
    pub damping_rate: f32,
    pub gravity: f32,
    pub jump_strength: f32,
    pub floor_height: f32,
}

impl Default for GroundedConfig {
    fn default() -> Self {
        Self {
            move_speed: 200.0,
            run_factor: 3.0,
            damping_rate: 10.0,
            gravity: 9.8 * 10.0,
            jump_strength: 150.0,
            floor_height: 2.0,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct ZoomConfig {
    pub default_fov_deg: f32,
    pub zoom_fov_deg: f32,
    /// Lerp factor per second, applied as `rate * dt` each frame.
    pub rate: f32,
}

impl Default for ZoomConfig {
    fn default() -> Self {
        Self {
            default_fov_deg: 75.0,
            zoom_fov_deg: 35.0,
            rate: 5.0,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct TurboConfig {
    /// Max gap between two run-modifier presses, seconds.
    pub double_tap_window: f64,
    pub active_duration: f64,
    pub cooldown_duration: f64,
    pub factor: f32,
}

impl Default for TurboConfig {
    fn default() -> Self {
        Self {
            double_tap_window: 0.3,
            active_duration: 3.0,
            cooldown_duration: 5.0,
            factor: 6.0,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct PickupConfig {
    pub count: usize,
    pub radius: f32,
    /// Spin of uncollected items, rad/s.
    pub spin_rate: f32,
    pub notice_duration: f64,
    pub completion_delay: f64,
    /// Half extent of the x/z area collectibles are scattered over.
    pub spread: f32,
    pub min_height: f32,
    pub max_height: f32,
    /// Minimum distance between a collectible and the spawn point.
    pub spawn_clearance: f32,
}

impl Default for PickupConfig {
    fn default() -> Self {
        Self {
            count: 10,
            radius: 18.0,
            spin_rate: 1.5,
            notice_duration: 1.4,
            completion_delay: 0.8,
            spread: 400.0,
            min_height: 8.0,
            max_height: 60.0,
            spawn_clearance: 60.0,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct WorldConfig {
    pub object_count: usize,
    pub giant_count: usize,
    pub surface_count: usize,
    /// Width of the x/z square decorations are scattered over.
    pub scatter_range: f32,
    /// Reflection boundary for drifting bodies, per axis.
    pub boundary: f32,
    pub max_drift_speed: f32,
    /// Per-axis angular rate bound, rad/s.
    pub max_spin: f32,
    pub grid_size: f32,
    pub grid_divisions: u32,
    pub spawn: Vec3,
    pub z_near: f32,
    pub z_far: f32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            object_count: 30,
            giant_count: 4,
            surface_count: 5,
            scatter_range: 500.0,
            boundary: 1000.0,
            max_drift_speed: 12.0,
            max_spin: 0.6,
            grid_size: 1000.0,
            grid_divisions: 200,
            spawn: Vec3::new(0.0, 2.0, 0.0),
            z_near: 0.1,
            z_far: 2000.0,
        }
    }
}

/// Every tunable of a play session.
///
/// Usage:
///   let mut config = GameConfig::default();
///   config.locomotion = LocomotionMode::Grounded;
///   config.apply_override("seed", "42");
#[derive(Clone, Copy, Debug)]
pub struct GameConfig {
    pub locomotion: LocomotionMode,
    pub locale: Locale,
    pub seed: u64,
    /// Upper bound for the physics step. `None` integrates raw frame deltas.
    pub max_frame_delta: Option<f32>,
    pub mouse_sensitivity: f32,
    pub flight: FlightConfig,
    pub grounded: GroundedConfig,
    pub zoom: ZoomConfig,
    pub turbo: TurboConfig,
    pub pickup: PickupConfig,
    pub world: WorldConfig,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            locomotion: LocomotionMode::FreeFlight,
            locale: Locale::Es,
            seed: 0x5eed_d1e5,
            max_frame_delta: Some(1.0 / 15.0),
            mouse_sensitivity: 0.002,
            flight: FlightConfig::default(),
            grounded: GroundedConfig::default(),
            zoom: ZoomConfig::default(),
            turbo: TurboConfig::default(),
            pickup: PickupConfig::default(),
            world: WorldConfig::default(),
        }
    }
}

impl GameConfig {
    /// Apply one `key=value` startup override. Returns false when the key is
    /// unknown or the value does not parse; the config is left untouched then.
    pub fn apply_override(&mut self, key: &str, value: &str) -> bool {
        match key.trim() {
            "mode" | "locomotion" => match LocomotionMode::parse(value) {
                Some(mode) => {
                    self.locomotion = mode;
                    true
                }
                None => false,
            },
            "lang" | "locale" => match Locale::from_code(value) {
                Some(locale) => {
                    self.locale = locale;
                    true
                }
                None => false,
            },
            "seed" => match value.trim().parse::<u64>() {
                Ok(seed) => {
                    self.seed = seed;
                    true
                }
                Err(_) => false,
            },
            "unclamped" => {
                self.max_frame_delta = None;
                true
            }
            _ => false,
        }
    }

    /// Parse a `a=1&b=2` query string (leading `?` allowed) into overrides.
    pub fn apply_query(&mut self, query: &str) {
        let query = query.trim_start_matches('?');
        for pair in query.split('&').filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            if !self.apply_override(key, value) {
                tracing::warn!("ignoring startup option {key}={value}");
            }
        }
    }

    /// Read `DIMENSION_MODE`, `DIMENSION_LANG` and `DIMENSION_SEED`.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn from_env() -> Self {
        let mut config = Self::default();
        for (var, key) in [
            ("DIMENSION_MODE", "mode"),
            ("DIMENSION_LANG", "lang"),
            ("DIMENSION_SEED", "seed"),
        ] {
            if let Ok(value) = std::env::var(var) {
                if !config.apply_override(key, &value) {
                    tracing::warn!("ignoring {var}={value}");
                }
            }
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_string_selects_mode_locale_and_seed() {
        let mut config = GameConfig::default();
        config.apply_query("?mode=grounded&lang=en&seed=42");
        assert_eq!(config.locomotion, LocomotionMode::Grounded);
        assert_eq!(config.locale, Locale::En);
        assert_eq!(config.seed, 42);
    }

    #[test]
    fn bad_values_leave_config_untouched() {
        let mut config = GameConfig::default();
        assert!(!config.apply_override("mode", "swim"));
        assert!(!config.apply_override("seed", "-3"));
        assert!(!config.apply_override("volume", "11"));
        assert_eq!(config.locomotion, LocomotionMode::FreeFlight);
        assert_eq!(config.seed, GameConfig::default().seed);
    }

    #[test]
    fn unclamped_disables_delta_cap() {
        let mut config = GameConfig::default();
        assert!(config.max_frame_delta.is_some());
        config.apply_query("unclamped");
        assert!(config.max_frame_delta.is_none());
    }
}
