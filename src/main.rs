use winit::{
    event::*,
    event_loop::EventLoop,
    keyboard::{KeyCode, PhysicalKey},
    window::{CursorGrabMode, Window},
};
use std::sync::Arc;
use std::time::Instant;

// Import from the library crate
use dimension_n1::{
    audio::BackgroundMusic,
    config::GameConfig,
    controller::{self, GameSession, InputEvent},
    logging,
    storage::FileStore,
    ui,
    view::{build_batches, GpuContext, GpuInitError, RenderState},
};

struct App {
    window: Arc<Window>,
    gpu: GpuContext,
    render_state: RenderState,

    // egui
    egui_state: egui_winit::State,
    egui_ctx: egui::Context,

    session: GameSession,
    music: BackgroundMusic,

    // Input handling
    mouse_locked: bool,
    pointer_on_widget: bool,

    // Frame timing
    started: Instant,
}

impl App {
    async fn new(window: Arc<Window>) -> Result<Self, GpuInitError> {
        let gpu = GpuContext::new_native(window.clone()).await?;

        let config = GameConfig::from_env();
        tracing::info!(mode = config.locomotion.name(), locale = config.locale.code(), "starting");
        let mut session = GameSession::new(config, Box::new(FileStore::from_env()), 0.0);
        session.set_viewport(gpu.config.width, gpu.config.height);

        let render_state = RenderState::new(
            gpu.device.as_ref(),
            &gpu.config,
            session.world().grid_size,
            session.world().grid_divisions,
        );

        // Initialize egui
        let egui_ctx = egui::Context::default();
        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            None,
            None,
            None,
        );

        Ok(Self {
            window,
            gpu,
            render_state,
            egui_state,
            egui_ctx,
            session,
            music: BackgroundMusic::new(),
            mouse_locked: false,
            pointer_on_widget: false,
            started: Instant::now(),
        })
    }

    fn now(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }

    fn send(&mut self, event: InputEvent) {
        let now = self.now();
        self.session.handle_input(&event, now);
    }

    fn grab_cursor(&mut self) {
        let grabbed = self
            .window
            .set_cursor_grab(CursorGrabMode::Locked)
            .or_else(|_| self.window.set_cursor_grab(CursorGrabMode::Confined));
        if let Err(e) = grabbed {
            tracing::warn!("cursor grab unavailable: {e}");
            return;
        }
        self.window.set_cursor_visible(false);
        self.mouse_locked = true;
        self.send(InputEvent::PointerLockChanged { locked: true });
    }

    fn release_cursor(&mut self) {
        if !self.mouse_locked {
            return;
        }
        let _ = self.window.set_cursor_grab(CursorGrabMode::None);
        self.window.set_cursor_visible(true);
        self.mouse_locked = false;
        self.send(InputEvent::PointerLockChanged { locked: false });
    }

    fn input(&mut self, event: &WindowEvent) -> bool {
        // egui only sees input while the cursor is free
        if !self.mouse_locked {
            let _ = self.egui_state.on_window_event(self.window.as_ref(), event);
        }

        match event {
            WindowEvent::KeyboardInput { event: KeyEvent { state, physical_key, repeat, .. }, .. } => {
                if let PhysicalKey::Code(code) = physical_key {
                    // winit names match DOM `KeyboardEvent.code`
                    let name = format!("{code:?}");
                    match state {
                        ElementState::Pressed => {
                            if *code == KeyCode::Escape {
                                self.release_cursor();
                            } else {
                                self.send(InputEvent::KeyDown { code: name, repeat: *repeat });
                            }
                        }
                        ElementState::Released => self.send(InputEvent::KeyUp(name)),
                    }
                }
                true
            }
            WindowEvent::MouseInput { state, button, .. } => {
                let is_down = *state == ElementState::Pressed;
                let button = match button {
                    MouseButton::Left => controller::input::MouseButton::Left,
                    MouseButton::Right => controller::input::MouseButton::Right,
                    MouseButton::Middle => controller::input::MouseButton::Middle,
                    _ => return true,
                };
                if is_down
                    && button == controller::input::MouseButton::Left
                    && !self.mouse_locked
                    && !self.pointer_on_widget
                {
                    self.grab_cursor();
                }
                self.send(InputEvent::MouseButton { button, is_down });
                true
            }
            WindowEvent::Focused(false) => {
                self.release_cursor();
                self.send(InputEvent::FocusLost);
                true
            }
            WindowEvent::Occluded(occluded) => {
                self.send(InputEvent::VisibilityChanged { visible: !occluded });
                true
            }
            _ => false,
        }
    }

    fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.render_state
                .resize(self.gpu.device.as_ref(), &self.gpu.surface, new_size.width, new_size.height);
            self.session.set_viewport(new_size.width, new_size.height);
        }
    }

    fn handle_mouse_motion(&mut self, dx: f64, dy: f64) {
        if self.mouse_locked {
            self.send(InputEvent::MouseMove { dx: dx as f32, dy: dy as f32 });
        }
    }

    fn redraw(&mut self) {
        let now = self.now();
        self.session.tick(now);

        if self.session.take_music_cue() {
            self.music.start();
        }

        let queue = self.gpu.queue.as_ref();
        self.render_state
            .write_uniforms(queue, self.session.camera(), &self.session.world().lighting);

        // UI
        let raw_input = self.egui_state.take_egui_input(&self.window);
        let mut frame = ui::build_ui(&self.egui_ctx, raw_input, &self.session.hud());
        if let Some(locale) = frame.picked_locale {
            self.session.set_locale(locale);
        }
        self.pointer_on_widget = frame.pointer_on_widget;
        let platform_output = std::mem::take(&mut frame.output.platform_output);
        self.egui_state.handle_platform_output(&self.window, platform_output);
        self.render_state
            .set_ui(&self.egui_ctx, frame.output, self.window.scale_factor() as f32);

        let batches = build_batches(self.session.world(), self.session.collectibles());
        self.render_state
            .draw_frame(self.gpu.device.as_ref(), queue, &self.gpu.surface, &batches);
    }
}

#[allow(deprecated)]
fn run() -> Result<(), Box<dyn std::error::Error>> {
    let event_loop = EventLoop::new()?;
    let window_attributes = Window::default_attributes()
        .with_title("Dimensión N+1")
        .with_inner_size(winit::dpi::LogicalSize::new(1280, 720));
    let window = Arc::new(event_loop.create_window(window_attributes)?);

    let mut app = pollster::block_on(App::new(window))?;

    event_loop.run(move |event, elwt| {
        match event {
            Event::WindowEvent {
                ref event,
                window_id,
            } if window_id == app.window.id() => {
                if !app.input(event) {
                    match event {
                        WindowEvent::CloseRequested => elwt.exit(),
                        WindowEvent::Resized(physical_size) => {
                            app.resize(*physical_size);
                        }
                        WindowEvent::RedrawRequested => app.redraw(),
                        _ => {}
                    }
                }
            }
            Event::DeviceEvent { event: DeviceEvent::MouseMotion { delta }, .. } => {
                app.handle_mouse_motion(delta.0, delta.1);
            }
            Event::AboutToWait => {
                app.window.request_redraw();
            }
            _ => {}
        }
    })?;
    Ok(())
}

fn main() {
    logging::init();

    if let Err(e) = run() {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}
