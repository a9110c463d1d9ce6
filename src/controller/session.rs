use glam::Vec3;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::config::{GameConfig, LocomotionMode};
use crate::i18n::Locale;
use crate::model::{Camera, CollectibleSet, World};
use crate::model::world::scatter_collectibles;
use crate::storage::BestTimeStore;

use super::camera_controller::CameraController;
use super::input::{Action, InputEvent, InputProcessor, InputState, MouseButton};
use super::physics::{locomotion_for, Locomotion, MoveIntent};
use super::run_timer::{RunResult, RunTimer};
use super::scheduler::{FrameClock, Scheduler, TimerHandle};
use super::turbo::{Turbo, TurboPhase, TurboTimer};

/// Deferred work the session schedules for itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionTimer {
    Turbo(TurboTimer),
    HidePickupNotice,
    ShowCompletion,
}

impl From<TurboTimer> for SessionTimer {
    fn from(timer: TurboTimer) -> Self {
        SessionTimer::Turbo(timer)
    }
}

/// The transient "picked up" message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PickupNotice {
    pub collected: usize,
    pub total: usize,
}

/// Read-only snapshot for the HUD, taken once per frame.
#[derive(Clone, Copy, Debug)]
pub struct HudState {
    pub capturing: bool,
    pub mode: LocomotionMode,
    pub locale: Locale,
    pub elapsed: Option<f64>,
    pub best: Option<f64>,
    pub collected: usize,
    pub total: usize,
    pub turbo: TurboPhase,
    pub notice: Option<PickupNotice>,
    pub completion: Option<RunResult>,
}

/// One play session: camera rig, world, pickups, turbo and run timer,
/// advanced by wall-clock reads from the frame loop.
///
/// Everything deferred goes through a virtual-time [`Scheduler`], so the
/// whole session can be driven from tests without a browser.
pub struct GameSession {
    config: GameConfig,
    camera: Camera,
    input: InputState,
    processor: InputProcessor,
    look: CameraController,
    locomotion: Box<dyn Locomotion>,
    turbo: Turbo,
    world: World,
    collectibles: CollectibleSet,
    run: RunTimer,
    timers: Scheduler<SessionTimer>,
    store: Box<dyn BestTimeStore>,
    rng: ChaCha8Rng,
    clock: FrameClock,
    now: f64,
    capturing: bool,
    /// Run time shown while released; the run itself keeps counting.
    released_elapsed: Option<f64>,
    stage: u32,
    locale: Locale,
    notice: Option<PickupNotice>,
    notice_timer: Option<TimerHandle>,
    finished: Option<RunResult>,
    completion: Option<RunResult>,
    completion_timer: Option<TimerHandle>,
    music_requested: bool,
    music_cue: bool,
}

impl GameSession {
    pub fn new(config: GameConfig, store: Box<dyn BestTimeStore>, now: f64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        let world = World::build(&config.world, &mut rng);
        let collectibles = CollectibleSet::new(scatter_collectibles(&config.pickup, config.world.spawn, &mut rng));
        let best = store.load();

        let mut camera = Camera::new(1, 1);
        camera.eye = config.world.spawn;
        camera.z_near = config.world.z_near;
        camera.z_far = config.world.z_far;
        camera.set_fov_degrees(config.zoom.default_fov_deg);

        tracing::info!(
            mode = config.locomotion.name(),
            seed = config.seed,
            bodies = world.bodies.len(),
            collectibles = collectibles.total(),
            best = ?best,
            "session created"
        );

        Self {
            camera,
            input: InputState::new(),
            processor: InputProcessor::default(),
            look: CameraController::new(config.mouse_sensitivity),
            locomotion: locomotion_for(&config),
            turbo: Turbo::new(config.turbo),
            world,
            collectibles,
            run: RunTimer::new(best),
            timers: Scheduler::new(),
            store,
            rng,
            clock: FrameClock::new(now, config.max_frame_delta),
            now,
            capturing: false,
            released_elapsed: None,
            stage: 1,
            locale: config.locale,
            notice: None,
            notice_timer: None,
            finished: None,
            completion: None,
            completion_timer: None,
            music_requested: false,
            music_cue: false,
            config,
        }
    }

    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.camera.set_aspect(width, height);
    }

    /// Feed one discrete input event observed at `now`.
    pub fn handle_input(&mut self, event: &InputEvent, now: f64) {
        self.fire_timers(now);

        match event {
            InputEvent::KeyDown { code, repeat } => {
                if let Some(action) = self.processor.action_for(code) {
                    self.on_key_down(action, *repeat, now);
                }
            }
            InputEvent::KeyUp(code) => {
                if let Some(action) = self.processor.action_for(code) {
                    self.input.set_held(action, false);
                }
            }
            InputEvent::MouseMove { dx, dy } => {
                if self.capturing {
                    self.input.look_delta.0 += dx;
                    self.input.look_delta.1 += dy;
                }
            }
            InputEvent::MouseButton { button: MouseButton::Right, is_down } => {
                self.input.zooming = *is_down;
            }
            InputEvent::MouseButton { .. } => {}
            InputEvent::FocusLost | InputEvent::VisibilityChanged { visible: false } => {
                self.input.clear_keys();
            }
            InputEvent::VisibilityChanged { visible: true } => {}
            InputEvent::PointerLockChanged { locked } => self.set_capture(*locked, now),
        }
    }

    fn on_key_down(&mut self, action: Action, repeat: bool, now: f64) {
        match action {
            Action::Run => {
                self.input.set_held(Action::Run, true);
                if repeat || !self.capturing {
                    return;
                }
                if self.input.register_modifier_press(now, self.config.turbo.double_tap_window)
                    && self.turbo.try_activate(now, &mut self.timers)
                {
                    tracing::info!(at = now, "turbo active");
                }
            }
            Action::Up if self.locomotion.mode() == LocomotionMode::Grounded => {
                if !repeat && self.capturing && self.locomotion.jump() {
                    tracing::debug!("jump");
                }
            }
            Action::Restart => {
                if !repeat && self.collectibles.is_complete() {
                    self.reset_stage(now);
                }
            }
            Action::CycleLanguage => {
                if !repeat {
                    self.cycle_locale();
                }
            }
            // The platform layer owns releasing the pointer.
            Action::Release => {}
            movement => self.input.set_held(movement, true),
        }
    }

    /// Enter or leave input capture. The first capture starts the run timer
    /// and cues the music.
    pub fn set_capture(&mut self, locked: bool, now: f64) {
        if locked == self.capturing {
            return;
        }
        self.capturing = locked;
        self.input.pointer_locked = locked;

        if locked {
            tracing::info!("pointer locked");
            if self.run.start(now) {
                tracing::info!(stage = self.stage, "run started");
            }
            if !self.music_requested {
                self.music_requested = true;
                self.music_cue = true;
            }
        } else {
            tracing::info!("pointer released");
            self.released_elapsed = self.run.elapsed(now);
            self.input.clear_keys();
        }
    }

    /// One frame: read the clock, fire due timers, integrate.
    pub fn tick(&mut self, now: f64) {
        let dt = self.clock.delta(now);
        self.fire_timers(now);
        self.step(dt);
    }

    /// Integrate `dt` seconds at the current time.
    pub fn step(&mut self, dt: f32) {
        if self.capturing {
            let (dx, dy) = self.input.consume_look();
            self.look.apply_look(&mut self.camera, dx, dy);

            let intent = MoveIntent::from(&self.input);
            let boost = self.turbo.multiplier();
            self.locomotion.integrate(&mut self.camera, &intent, boost, dt);
            self.look.update_zoom(&mut self.camera, self.input.zooming, &self.config.zoom, dt);
        }

        let flips = self.world.advance(dt);
        if flips > 0 {
            tracing::trace!(flips, "bodies bounced off the boundary");
        }

        self.collectibles.spin(self.config.pickup.spin_rate, dt);
        if self.capturing {
            self.check_pickups();
        }
    }

    fn check_pickups(&mut self) {
        let picked = self.collectibles.collect_near(self.camera.eye, self.config.pickup.radius);
        if picked.is_empty() {
            return;
        }

        let notice = PickupNotice {
            collected: self.collectibles.collected_count(),
            total: self.collectibles.total(),
        };
        tracing::info!(collected = notice.collected, total = notice.total, "collectible picked up");

        // A newer pickup replaces the notice and restarts its hide timer.
        self.notice = Some(notice);
        if let Some(handle) = self.notice_timer.take() {
            self.timers.cancel(handle);
        }
        self.notice_timer = Some(
            self.timers
                .schedule(self.now + self.config.pickup.notice_duration, SessionTimer::HidePickupNotice),
        );

        if self.collectibles.is_complete() {
            self.complete_stage();
        }
    }

    fn complete_stage(&mut self) {
        let Some(result) = self.run.finish(self.now) else {
            return;
        };
        tracing::info!(time = result.time, best = result.best, "stage complete");
        if result.new_record {
            tracing::info!(time = result.time, "new best time");
            self.store.save(result.time);
        }
        self.finished = Some(result);
        self.completion_timer = Some(
            self.timers
                .schedule(self.now + self.config.pickup.completion_delay, SessionTimer::ShowCompletion),
        );
    }

    fn fire_timers(&mut self, now: f64) {
        self.now = self.now.max(now);
        while let Some((at, timer)) = self.timers.pop_due(self.now) {
            match timer {
                SessionTimer::Turbo(timer) => {
                    if let Some(phase) = self.turbo.on_timer(timer, at, &mut self.timers) {
                        tracing::info!(?phase, at, "turbo transition");
                    }
                }
                SessionTimer::HidePickupNotice => {
                    self.notice = None;
                    self.notice_timer = None;
                }
                SessionTimer::ShowCompletion => {
                    self.completion = self.finished;
                    self.completion_timer = None;
                }
            }
        }
    }

    /// Fresh collectibles and a fresh run. Decorative bodies keep moving.
    pub fn reset_stage(&mut self, now: f64) {
        self.fire_timers(now);
        for handle in [self.notice_timer.take(), self.completion_timer.take()].into_iter().flatten() {
            self.timers.cancel(handle);
        }
        self.turbo.reset(&mut self.timers);

        self.collectibles = CollectibleSet::new(scatter_collectibles(
            &self.config.pickup,
            self.config.world.spawn,
            &mut self.rng,
        ));
        self.notice = None;
        self.finished = None;
        self.completion = None;

        self.camera.eye = self.config.world.spawn;
        self.locomotion.reset();

        self.run.reset();
        self.stage += 1;
        tracing::info!(stage = self.stage, "stage reset");
        if self.capturing {
            self.run.start(self.now);
        }
        self.released_elapsed = self.run.elapsed(self.now);
    }

    pub fn set_locale(&mut self, locale: Locale) {
        if locale != self.locale {
            tracing::info!(locale = locale.code(), "language changed");
            self.locale = locale;
        }
    }

    pub fn cycle_locale(&mut self) {
        self.set_locale(self.locale.next());
    }

    /// True once, right after the first capture.
    pub fn take_music_cue(&mut self) -> bool {
        std::mem::take(&mut self.music_cue)
    }

    /// Keys whose browser default should be suppressed.
    pub fn captures_key(&self, code: &str) -> bool {
        self.processor.captures(code)
    }

    pub fn hud(&self) -> HudState {
        HudState {
            capturing: self.capturing,
            mode: self.locomotion.mode(),
            locale: self.locale,
            elapsed: if self.capturing {
                self.run.elapsed(self.now)
            } else {
                self.released_elapsed
            },
            best: self.run.best(),
            collected: self.collectibles.collected_count(),
            total: self.collectibles.total(),
            turbo: self.turbo.phase(),
            notice: self.notice,
            completion: self.completion,
        }
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn collectibles(&self) -> &CollectibleSet {
        &self.collectibles
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn input(&self) -> &InputState {
        &self.input
    }

    pub fn turbo_phase(&self) -> TurboPhase {
        self.turbo.phase()
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    pub fn is_capturing(&self) -> bool {
        self.capturing
    }

    pub fn stage(&self) -> u32 {
        self.stage
    }

    pub fn now(&self) -> f64 {
        self.now
    }

    pub fn player_velocity(&self) -> Vec3 {
        self.locomotion.velocity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Store whose contents stay observable after the session takes it.
    #[derive(Clone, Default)]
    struct SharedStore(Rc<RefCell<MemoryStore>>);

    impl BestTimeStore for SharedStore {
        fn load(&self) -> Option<f64> {
            self.0.borrow().load()
        }

        fn save(&mut self, seconds: f64) {
            self.0.borrow_mut().save(seconds);
        }
    }

    fn session_with(config: GameConfig, best: Option<f64>) -> (GameSession, SharedStore) {
        let store = SharedStore(Rc::new(RefCell::new(MemoryStore::new(best))));
        let session = GameSession::new(config, Box::new(store.clone()), 0.0);
        (session, store)
    }

    fn session() -> GameSession {
        session_with(GameConfig::default(), None).0
    }

    fn key(session: &mut GameSession, code: &str, now: f64) {
        session.handle_input(&InputEvent::KeyDown { code: code.into(), repeat: false }, now);
        session.handle_input(&InputEvent::KeyUp(code.into()), now);
    }

    fn lock(session: &mut GameSession, now: f64) {
        session.handle_input(&InputEvent::PointerLockChanged { locked: true }, now);
    }

    fn positions(session: &GameSession) -> Vec<Vec3> {
        session.collectibles().all().iter().map(|c| c.position).collect()
    }

    /// Teleport onto a collectible and run one frame.
    fn grab(session: &mut GameSession, at: Vec3, now: f64) {
        session.camera_mut().eye = at;
        session.tick(now);
    }

    fn next_uncollected(session: &GameSession) -> Vec3 {
        session.collectibles().remaining().next().expect("items left").position
    }

    /// Grab items one per `step` seconds until the stage completes. Returns
    /// the completion time.
    fn collect_all(session: &mut GameSession, mut t: f64, step: f64) -> f64 {
        while !session.collectibles().is_complete() {
            t += step;
            let at = next_uncollected(session);
            grab(session, at, t);
        }
        t
    }

    #[test]
    fn turbo_timeline_from_a_double_tap() {
        let mut s = session();
        lock(&mut s, 0.0);

        key(&mut s, "ShiftLeft", 0.8);
        assert_eq!(s.turbo_phase(), TurboPhase::Idle);
        key(&mut s, "ShiftRight", 1.0);
        assert_eq!(s.turbo_phase(), TurboPhase::Active);

        s.tick(3.999);
        assert_eq!(s.turbo_phase(), TurboPhase::Active);
        s.tick(4.0);
        assert_eq!(s.turbo_phase(), TurboPhase::Cooldown);

        // Double tap during cooldown is swallowed.
        key(&mut s, "ShiftLeft", 6.0);
        key(&mut s, "ShiftLeft", 6.1);
        assert_eq!(s.turbo_phase(), TurboPhase::Cooldown);

        s.tick(8.999);
        assert_eq!(s.turbo_phase(), TurboPhase::Cooldown);
        s.tick(9.0);
        assert_eq!(s.turbo_phase(), TurboPhase::Idle);

        key(&mut s, "ShiftLeft", 9.0);
        key(&mut s, "ShiftLeft", 9.2);
        assert_eq!(s.turbo_phase(), TurboPhase::Active);
    }

    #[test]
    fn auto_repeat_and_slow_taps_do_not_trigger_turbo() {
        let mut s = session();
        lock(&mut s, 0.0);
        s.handle_input(&InputEvent::KeyDown { code: "ShiftLeft".into(), repeat: false }, 1.0);
        s.handle_input(&InputEvent::KeyDown { code: "ShiftLeft".into(), repeat: true }, 1.1);
        assert_eq!(s.turbo_phase(), TurboPhase::Idle);
        s.handle_input(&InputEvent::KeyUp("ShiftLeft".into()), 1.2);

        key(&mut s, "ShiftLeft", 2.0);
        assert_eq!(s.turbo_phase(), TurboPhase::Idle);
    }

    #[test]
    fn no_movement_without_capture() {
        let mut s = session();
        s.handle_input(&InputEvent::KeyDown { code: "KeyW".into(), repeat: false }, 0.0);
        s.tick(0.016);
        s.tick(0.032);
        assert_eq!(s.camera().eye, GameConfig::default().world.spawn);

        lock(&mut s, 0.032);
        s.tick(0.048);
        assert!(s.camera().eye.z < 0.0);
    }

    #[test]
    fn flight_moves_forward_and_coasts_to_rest() {
        let mut s = session();
        lock(&mut s, 0.0);
        s.handle_input(&InputEvent::KeyDown { code: "KeyW".into(), repeat: false }, 0.0);
        let mut t = 0.0;
        for _ in 0..30 {
            t += 1.0 / 60.0;
            s.tick(t);
        }
        assert!(s.camera().eye.z < -1.0);
        s.handle_input(&InputEvent::KeyUp("KeyW".into()), t);
        for _ in 0..600 {
            t += 1.0 / 60.0;
            s.tick(t);
        }
        assert!(s.player_velocity().length() < 1e-3);
    }

    #[test]
    fn pickup_notice_is_replaced_not_queued() {
        let mut s = session();
        lock(&mut s, 0.0);

        let at = next_uncollected(&s);
        grab(&mut s, at, 1.0);
        let first = s.collectibles().collected_count();
        assert!(first >= 1);
        assert_eq!(s.hud().notice, Some(PickupNotice { collected: first, total: 10 }));

        let at = next_uncollected(&s);
        grab(&mut s, at, 2.0);
        let second = s.collectibles().collected_count();
        assert!(second > first);
        assert_eq!(s.hud().notice, Some(PickupNotice { collected: second, total: 10 }));

        // The first hide deadline (2.4) was cancelled.
        s.tick(2.5);
        assert!(s.hud().notice.is_some());
        s.tick(3.4);
        assert!(s.hud().notice.is_none());
    }

    #[test]
    fn completion_freezes_timer_and_shows_overlay_after_delay() {
        let (mut s, store) = session_with(GameConfig::default(), None);
        lock(&mut s, 1.0);

        let finish = collect_all(&mut s, 1.0, 0.5);
        assert_eq!(s.hud().elapsed, Some(finish - 1.0));
        assert!(s.hud().completion.is_none());

        s.tick(finish + 0.79);
        assert!(s.hud().completion.is_none());
        s.tick(finish + 0.8);
        let shown = s.hud().completion.expect("overlay after delay");
        assert!(shown.new_record);
        assert_eq!(shown.time, finish - 1.0);

        // Frozen and one-shot.
        s.tick(finish + 20.0);
        assert_eq!(s.hud().elapsed, Some(finish - 1.0));
        assert_eq!(store.0.borrow().writes, 1);
        assert_eq!(store.0.borrow().load(), Some(finish - 1.0));
    }

    #[test]
    fn slower_run_keeps_previous_best() {
        let (mut s, store) = session_with(GameConfig::default(), Some(1.0));
        lock(&mut s, 0.0);
        collect_all(&mut s, 0.0, 1.0);
        assert!(!s.hud().completion.map_or(false, |c| c.new_record));
        assert_eq!(s.hud().best, Some(1.0));
        assert_eq!(store.0.borrow().writes, 0);
    }

    #[test]
    fn restart_only_after_completion() {
        let mut s = session();
        lock(&mut s, 0.0);
        let first = positions(&s);
        let at = next_uncollected(&s);
        grab(&mut s, at, 0.5);

        key(&mut s, "KeyR", 1.0);
        assert_eq!(s.stage(), 1);
        assert!(s.collectibles().collected_count() >= 1);

        let t = collect_all(&mut s, 1.0, 0.1);

        key(&mut s, "KeyR", t + 5.0);
        assert_eq!(s.stage(), 2);
        assert_eq!(s.collectibles().collected_count(), 0);
        assert!(s.hud().completion.is_none());
        assert_eq!(s.hud().elapsed, Some(0.0));
        assert_ne!(positions(&s), first);
        assert_eq!(s.camera().eye, GameConfig::default().world.spawn);
    }

    #[test]
    fn run_timer_starts_on_first_capture() {
        let mut s = session();
        s.tick(5.0);
        assert_eq!(s.hud().elapsed, None);
        lock(&mut s, 5.0);
        s.tick(7.5);
        assert_eq!(s.hud().elapsed, Some(2.5));

        // Releasing and relocking does not restart it.
        s.handle_input(&InputEvent::PointerLockChanged { locked: false }, 8.0);
        lock(&mut s, 9.0);
        s.tick(10.0);
        assert_eq!(s.hud().elapsed, Some(5.0));
    }

    #[test]
    fn released_pointer_holds_displayed_time() {
        let mut s = session();
        lock(&mut s, 0.0);
        s.tick(5.0);
        s.handle_input(&InputEvent::PointerLockChanged { locked: false }, 5.0);
        s.tick(9.0);
        assert_eq!(s.hud().elapsed, Some(5.0));

        // The run kept counting underneath.
        lock(&mut s, 9.0);
        s.tick(10.0);
        assert_eq!(s.hud().elapsed, Some(10.0));
    }

    #[test]
    fn music_cue_fires_once() {
        let mut s = session();
        assert!(!s.take_music_cue());
        lock(&mut s, 0.0);
        assert!(s.take_music_cue());
        assert!(!s.take_music_cue());
        s.handle_input(&InputEvent::PointerLockChanged { locked: false }, 1.0);
        lock(&mut s, 2.0);
        assert!(!s.take_music_cue());
    }

    #[test]
    fn focus_loss_clears_held_keys() {
        let mut s = session();
        lock(&mut s, 0.0);
        s.handle_input(&InputEvent::KeyDown { code: "KeyD".into(), repeat: false }, 0.0);
        s.handle_input(&InputEvent::MouseButton { button: MouseButton::Right, is_down: true }, 0.0);
        assert!(s.input().right && s.input().zooming);
        s.handle_input(&InputEvent::FocusLost, 0.1);
        assert!(!s.input().right && !s.input().zooming);
        assert!(s.is_capturing());
    }

    #[test]
    fn grounded_mode_jumps_on_space() {
        let mut config = GameConfig::default();
        config.locomotion = LocomotionMode::Grounded;
        let (mut s, _) = session_with(config, None);
        lock(&mut s, 0.0);
        s.tick(0.016);
        key(&mut s, "Space", 0.016);
        s.tick(0.032);
        assert!(s.camera().eye.y > 2.0);
        assert!(!s.input().up);
    }

    #[test]
    fn language_key_cycles_locale() {
        let mut s = session();
        assert_eq!(s.locale(), Locale::Es);
        key(&mut s, "KeyL", 0.0);
        assert_eq!(s.locale(), Locale::En);
        key(&mut s, "KeyL", 0.1);
        assert_eq!(s.locale(), Locale::Es);
    }

    #[test]
    fn long_stalls_are_clamped_for_physics_only() {
        let mut s = session();
        lock(&mut s, 0.0);
        s.handle_input(&InputEvent::KeyDown { code: "KeyW".into(), repeat: false }, 0.0);
        s.tick(10.0);
        // One clamped step: v = 200 / 15, moved v / 15.
        let moved = -s.camera().eye.z;
        assert!((moved - 200.0 / 225.0).abs() < 1e-3, "moved {moved}");
        assert_eq!(s.hud().elapsed, Some(10.0));
    }
}
