use std::cell::{Cell, RefCell};
use std::rc::Rc;

use web_sys::{HtmlCanvasElement, Window};
use wgpu::{Device, Queue, Surface};

use crate::audio::BackgroundMusic;
use crate::ui;
use crate::view::{build_batches, RenderState, SceneBatches};
use super::GameSession;

/// Main game loop state and update logic
pub struct FrameLoopContext {
    pub session: Rc<RefCell<GameSession>>,
    pub canvas: HtmlCanvasElement,
    pub music: BackgroundMusic,
    pub egui_ctx: egui::Context,
    pub egui_events: Rc<RefCell<Vec<egui::Event>>>,
    /// Set when the pointer rests on a UI widget; the click listener reads it.
    pub pointer_on_widget: Rc<Cell<bool>>,
}

impl FrameLoopContext {
    /// Advance the session to the current time, refresh uniforms and the UI,
    /// and return this frame's draw lists.
    pub fn update(
        &mut self,
        device: &Device,
        queue: &Queue,
        window: &Window,
        surface: &Surface,
        render_state: &mut RenderState,
    ) -> SceneBatches {
        let now_ms = window.performance().map(|p| p.now()).unwrap_or(0.0);
        let now = now_ms / 1000.0;
        let dpr = window.device_pixel_ratio() as f32;

        // Resize handling
        self.handle_resize(window, device, surface, render_state, dpr);

        let mut session = self.session.borrow_mut();
        session.tick(now);

        if session.take_music_cue() {
            self.music.start();
        }

        render_state.write_uniforms(queue, session.camera(), &session.world().lighting);

        // Build egui input from queued events
        let mut raw_input = egui::RawInput::default();
        raw_input.time = Some(now);
        raw_input.screen_rect = Some(egui::Rect::from_min_size(
            egui::Pos2::new(0.0, 0.0),
            egui::vec2(
                render_state.width as f32 / dpr,
                render_state.height as f32 / dpr,
            ),
        ));
        raw_input.events.extend(self.egui_events.borrow_mut().drain(..));

        // Set DPI scale for egui
        self.egui_ctx.set_pixels_per_point(dpr);

        let frame = ui::build_ui(&self.egui_ctx, raw_input, &session.hud());
        if let Some(locale) = frame.picked_locale {
            session.set_locale(locale);
        }
        self.pointer_on_widget.set(frame.pointer_on_widget);
        render_state.set_ui(&self.egui_ctx, frame.output, dpr);

        build_batches(session.world(), session.collectibles())
    }

    fn handle_resize(
        &self,
        window: &Window,
        device: &Device,
        surface: &Surface,
        render_state: &mut RenderState,
        dpr: f32,
    ) {
        if let (Ok(w), Ok(h)) = (window.inner_width(), window.inner_height()) {
            let nw = (w.as_f64().unwrap_or(800.0) as f32 * dpr) as u32;
            let nh = (h.as_f64().unwrap_or(600.0) as f32 * dpr) as u32;
            if nw != render_state.width || nh != render_state.height {
                self.canvas.set_width(nw);
                self.canvas.set_height(nh);
                render_state.resize(device, surface, nw, nh);
                self.session.borrow_mut().set_viewport(nw, nh);
                tracing::debug!(width = nw, height = nh, "canvas resized");
            }
        }
    }
}
