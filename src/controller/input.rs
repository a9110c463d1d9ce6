//! Platform-agnostic input handling system

/// Platform-independent input events. Keys are physical key codes
/// (`KeyW`, `ShiftLeft`, `Space`), the same on web and native.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    // Keyboard events
    KeyDown { code: String, repeat: bool },
    KeyUp(String),

    // Mouse events
    MouseMove { dx: f32, dy: f32 },
    MouseButton { button: MouseButton, is_down: bool },

    // Window events
    FocusLost,
    VisibilityChanged { visible: bool },
    PointerLockChanged { locked: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

impl MouseButton {
    pub fn from_web_button(button: i16) -> Self {
        match button {
            0 => MouseButton::Left,
            1 => MouseButton::Middle,
            2 => MouseButton::Right,
            _ => MouseButton::Left,
        }
    }
}

/// What a key does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Forward,
    Backward,
    Left,
    Right,
    Up,
    Down,
    Run,
    Restart,
    CycleLanguage,
    Release,
}

/// Held movement flags plus the double-tap bookkeeping for the run modifier.
#[derive(Debug, Clone, Default)]
pub struct InputState {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
    pub running: bool,
    pub zooming: bool,
    /// Time (seconds) of the last counted run-modifier press.
    pub last_modifier_press: Option<f64>,
    pub look_delta: (f32, f32),
    pub pointer_locked: bool,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the held flag behind a movement action. Non-movement actions are
    /// ignored here.
    pub fn set_held(&mut self, action: Action, pressed: bool) {
        match action {
            Action::Forward => self.forward = pressed,
            Action::Backward => self.backward = pressed,
            Action::Left => self.left = pressed,
            Action::Right => self.right = pressed,
            Action::Up => self.up = pressed,
            Action::Down => self.down = pressed,
            Action::Run => self.running = pressed,
            Action::Restart | Action::CycleLanguage | Action::Release => {}
        }
    }

    /// Record a run-modifier press at `now`. Returns true when it completes a
    /// double tap (second press within `window` seconds). A completed double
    /// tap is consumed, so a third press starts a new pair.
    pub fn register_modifier_press(&mut self, now: f64, window: f64) -> bool {
        let double = matches!(self.last_modifier_press, Some(prev) if now - prev <= window);
        self.last_modifier_press = if double { None } else { Some(now) };
        double
    }

    pub fn clear_keys(&mut self) {
        let last = self.last_modifier_press;
        let locked = self.pointer_locked;
        *self = Self::default();
        self.last_modifier_press = last;
        self.pointer_locked = locked;
    }

    pub fn consume_look(&mut self) -> (f32, f32) {
        let result = self.look_delta;
        self.look_delta = (0.0, 0.0);
        result
    }
}

/// Key mapping configuration
#[derive(Clone)]
pub struct KeyBindings {
    pub forward: Vec<String>,
    pub backward: Vec<String>,
    pub left: Vec<String>,
    pub right: Vec<String>,
    pub up: Vec<String>,
    pub down: Vec<String>,
    pub run: Vec<String>,
    pub restart: Vec<String>,
    pub cycle_language: Vec<String>,
    pub release: Vec<String>,
}

fn codes(list: &[&str]) -> Vec<String> {
    list.iter().map(|c| c.to_string()).collect()
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            forward: codes(&["KeyW", "ArrowUp"]),
            backward: codes(&["KeyS", "ArrowDown"]),
            left: codes(&["KeyA", "ArrowLeft"]),
            right: codes(&["KeyD", "ArrowRight"]),
            up: codes(&["Space", "KeyE"]),
            down: codes(&["KeyQ", "ControlLeft", "ControlRight"]),
            run: codes(&["ShiftLeft", "ShiftRight"]),
            restart: codes(&["KeyR"]),
            cycle_language: codes(&["KeyL"]),
            release: codes(&["Escape"]),
        }
    }
}

/// High-level input processor
#[derive(Clone)]
pub struct InputProcessor {
    bindings: KeyBindings,
}

impl InputProcessor {
    pub fn new(bindings: KeyBindings) -> Self {
        Self { bindings }
    }

    pub fn action_for(&self, code: &str) -> Option<Action> {
        let b = &self.bindings;
        let table: [(&Vec<String>, Action); 10] = [
            (&b.forward, Action::Forward),
            (&b.backward, Action::Backward),
            (&b.left, Action::Left),
            (&b.right, Action::Right),
            (&b.up, Action::Up),
            (&b.down, Action::Down),
            (&b.run, Action::Run),
            (&b.restart, Action::Restart),
            (&b.cycle_language, Action::CycleLanguage),
            (&b.release, Action::Release),
        ];
        table
            .iter()
            .find(|(keys, _)| keys.iter().any(|k| k == code))
            .map(|(_, action)| *action)
    }

    /// Keys whose browser default (scrolling, find-as-you-type) must be suppressed.
    pub fn captures(&self, code: &str) -> bool {
        matches!(
            self.action_for(code),
            Some(Action::Forward | Action::Backward | Action::Left | Action::Right | Action::Up | Action::Down)
        )
    }
}

impl Default for InputProcessor {
    fn default() -> Self {
        Self::new(KeyBindings::default())
    }
}

#[cfg(target_arch = "wasm32")]
pub mod wasm {
    use super::*;
    use web_sys::{KeyboardEvent, MouseEvent};

    pub fn keyboard_event_to_input(e: &KeyboardEvent, is_down: bool) -> InputEvent {
        let code = e.code();
        if is_down {
            InputEvent::KeyDown { code, repeat: e.repeat() }
        } else {
            InputEvent::KeyUp(code)
        }
    }

    pub fn mouse_move_to_input(e: &MouseEvent) -> InputEvent {
        InputEvent::MouseMove { dx: e.movement_x() as f32, dy: e.movement_y() as f32 }
    }

    pub fn mouse_click_to_input(e: &MouseEvent, is_down: bool) -> InputEvent {
        InputEvent::MouseButton {
            button: MouseButton::from_web_button(e.button()),
            is_down,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_bindings_resolve_physical_codes() {
        let p = InputProcessor::default();
        assert_eq!(p.action_for("KeyW"), Some(Action::Forward));
        assert_eq!(p.action_for("ArrowLeft"), Some(Action::Left));
        assert_eq!(p.action_for("ShiftRight"), Some(Action::Run));
        assert_eq!(p.action_for("Space"), Some(Action::Up));
        assert_eq!(p.action_for("KeyZ"), None);
        assert!(p.captures("Space"));
        assert!(!p.captures("KeyR"));
    }

    #[test]
    fn double_tap_pairs_are_consumed() {
        let mut input = InputState::new();
        assert!(!input.register_modifier_press(1.0, 0.3));
        assert!(input.register_modifier_press(1.25, 0.3));
        // Third press starts a new pair.
        assert!(!input.register_modifier_press(1.4, 0.3));
        assert!(!input.register_modifier_press(1.8, 0.3));
        assert!(input.register_modifier_press(2.05, 0.3));
        assert!(!input.register_modifier_press(3.0, 0.3));
        assert!(input.register_modifier_press(3.25, 0.3));
    }

    #[test]
    fn clear_keys_keeps_lock_and_tap_history() {
        let mut input = InputState::new();
        input.set_held(Action::Forward, true);
        input.zooming = true;
        input.pointer_locked = true;
        input.register_modifier_press(3.0, 0.3);
        input.clear_keys();
        assert!(!input.forward && !input.zooming);
        assert!(input.pointer_locked);
        assert_eq!(input.last_modifier_press, Some(3.0));
    }
}
