// Re-export all public modules so they can be used from main.rs
pub mod logging;
pub mod utils;
pub mod ui;
pub mod config;
pub mod i18n;
pub mod storage;
pub mod audio;

// MVC Architecture
pub mod model;
pub mod view;
pub mod controller;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::closure::Closure;
#[cfg(target_arch = "wasm32")]
use wasm_bindgen::{JsCast, JsValue, prelude::wasm_bindgen};
#[cfg(target_arch = "wasm32")]
use web_sys::{Window, Document, HtmlCanvasElement, KeyboardEvent, MouseEvent, Event};
#[cfg(target_arch = "wasm32")]
use std::rc::Rc;
#[cfg(target_arch = "wasm32")]
use std::cell::{Cell, RefCell};

#[cfg(target_arch = "wasm32")]
use controller::{FrameLoopContext, GameSession, InputEvent};
#[cfg(target_arch = "wasm32")]
use controller::input::wasm as web_input;
#[cfg(target_arch = "wasm32")]
use view::{GpuContext, RenderState};


#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn start() -> Result<(), JsValue> {
    logging::init();
    let (window, document, canvas) = init_canvas()?;
    setup_app(&window, &document, &canvas).await
}

/// Main application setup for WASM
#[cfg(target_arch = "wasm32")]
async fn setup_app(
    window: &Window,
    document: &Document,
    canvas: &HtmlCanvasElement,
) -> Result<(), JsValue> {
    let width = canvas.width();
    let height = canvas.height();

    // Startup options come from the page query string
    let mut config = config::GameConfig::default();
    if let Ok(search) = window.location().search() {
        config.apply_query(&search);
    }
    tracing::info!(mode = config.locomotion.name(), locale = config.locale.code(), "starting");

    // Initialize GPU
    let gpu = GpuContext::new(canvas, width, height)
        .await
        .map_err(|e| js_error(format!("GPU init failed: {e}")))?;

    let store = storage::LocalStorageStore::new(window);
    let mut session = GameSession::new(config, Box::new(store), now_secs(window));
    session.set_viewport(gpu.config.width, gpu.config.height);
    let (grid_size, grid_divisions) = (session.world().grid_size, session.world().grid_divisions);
    let session = Rc::new(RefCell::new(session));

    let egui_events: Rc<RefCell<Vec<egui::Event>>> = Rc::new(RefCell::new(Vec::new()));
    let pointer_on_widget = Rc::new(Cell::new(false));

    // Setup input listeners
    setup_input_listeners(
        document,
        window,
        canvas,
        session.clone(),
        egui_events.clone(),
        pointer_on_widget.clone(),
    )?;

    let mut render_state = RenderState::new(gpu.device.as_ref(), &gpu.config, grid_size, grid_divisions);

    // Setup frame loop
    let mut frame_ctx = FrameLoopContext {
        session,
        canvas: canvas.clone(),
        music: audio::BackgroundMusic::new(),
        egui_ctx: egui::Context::default(),
        egui_events,
        pointer_on_widget,
    };

    // Continuous redraw using requestAnimationFrame
    let f = RcCellCallback::new(window.clone(), {
        let window_for_loop = window.clone();

        move || {
            let batches = frame_ctx.update(gpu.device.as_ref(), gpu.queue.as_ref(), &window_for_loop, &gpu.surface, &mut render_state);
            render_state.draw_frame(gpu.device.as_ref(), gpu.queue.as_ref(), &gpu.surface, &batches);
        }
    });
    f.start();

    Ok(())
}

#[cfg(target_arch = "wasm32")]
fn now_secs(window: &Window) -> f64 {
    window.performance().map(|p| p.now()).unwrap_or(0.0) / 1000.0
}

#[cfg(target_arch = "wasm32")]
fn egui_pos(e: &MouseEvent) -> egui::Pos2 {
    egui::pos2(e.client_x() as f32, e.client_y() as f32)
}

/// Setup all input event listeners. Everything the game reacts to is turned
/// into an [`InputEvent`] and handed to the session with a timestamp.
#[cfg(target_arch = "wasm32")]
fn setup_input_listeners(
    document: &web_sys::Document,
    window: &web_sys::Window,
    canvas: &web_sys::HtmlCanvasElement,
    session: Rc<RefCell<GameSession>>,
    egui_events: Rc<RefCell<Vec<egui::Event>>>,
    pointer_on_widget: Rc<Cell<bool>>,
) -> Result<(), JsValue> {
    // Keyboard down
    {
        let session = session.clone();
        let window = window.clone();
        let keydown = Closure::wrap(Box::new(move |e: KeyboardEvent| {
            let mut session = session.borrow_mut();
            if session.captures_key(&e.code()) {
                e.prevent_default();
            }
            session.handle_input(&web_input::keyboard_event_to_input(&e, true), now_secs(&window));
        }) as Box<dyn FnMut(KeyboardEvent)>);
        document.add_event_listener_with_callback("keydown", keydown.as_ref().unchecked_ref())?;
        keydown.forget();
    }

    // Keyboard up
    {
        let session = session.clone();
        let window = window.clone();
        let keyup = Closure::wrap(Box::new(move |e: KeyboardEvent| {
            session
                .borrow_mut()
                .handle_input(&web_input::keyboard_event_to_input(&e, false), now_secs(&window));
        }) as Box<dyn FnMut(KeyboardEvent)>);
        document.add_event_listener_with_callback("keyup", keyup.as_ref().unchecked_ref())?;
        keyup.forget();
    }

    // Focus loss - clear all keys
    {
        let session = session.clone();
        let window_now = window.clone();
        let blur = Closure::wrap(Box::new(move |_e: Event| {
            session.borrow_mut().handle_input(&InputEvent::FocusLost, now_secs(&window_now));
        }) as Box<dyn FnMut(Event)>);
        window.add_event_listener_with_callback("blur", blur.as_ref().unchecked_ref())?;
        blur.forget();
    }

    // Visibility change - clear all keys when hidden
    {
        let session = session.clone();
        let window = window.clone();
        let doc_vis = document.clone();
        let visibility = Closure::wrap(Box::new(move |_e: Event| {
            let event = InputEvent::VisibilityChanged { visible: !doc_vis.hidden() };
            session.borrow_mut().handle_input(&event, now_secs(&window));
        }) as Box<dyn FnMut(Event)>);
        document.add_event_listener_with_callback("visibilitychange", visibility.as_ref().unchecked_ref())?;
        visibility.forget();
    }

    // Pointer lock change
    {
        let session = session.clone();
        let window = window.clone();
        let doc_pl = document.clone();
        let plc = Closure::wrap(Box::new(move |_e: Event| {
            let locked = doc_pl.pointer_lock_element().is_some();
            tracing::debug!(locked, "pointer lock changed");
            session
                .borrow_mut()
                .handle_input(&InputEvent::PointerLockChanged { locked }, now_secs(&window));
        }) as Box<dyn FnMut(Event)>);
        document.add_event_listener_with_callback("pointerlockchange", plc.as_ref().unchecked_ref())?;
        plc.forget();
    }

    // Canvas click to enter pointer lock
    {
        let session = session.clone();
        let canvas_click = canvas.clone();
        let click = Closure::wrap(Box::new(move |_e: MouseEvent| {
            if pointer_on_widget.get() || session.borrow().is_capturing() {
                return;
            }
            canvas_click.request_pointer_lock();
        }) as Box<dyn FnMut(MouseEvent)>);
        canvas.add_event_listener_with_callback("click", click.as_ref().unchecked_ref())?;
        click.forget();
    }

    // Mouse move
    {
        let session = session.clone();
        let window = window.clone();
        let egui_events_q = egui_events.clone();
        let mm = Closure::wrap(Box::new(move |e: MouseEvent| {
            let mut session = session.borrow_mut();
            if session.is_capturing() {
                session.handle_input(&web_input::mouse_move_to_input(&e), now_secs(&window));
            } else {
                egui_events_q.borrow_mut().push(egui::Event::PointerMoved(egui_pos(&e)));
            }
        }) as Box<dyn FnMut(MouseEvent)>);
        document.add_event_listener_with_callback("mousemove", mm.as_ref().unchecked_ref())?;
        mm.forget();
    }

    // Mouse buttons - zoom while captured, UI clicks otherwise
    for (name, is_down) in [("mousedown", true), ("mouseup", false)] {
        let session = session.clone();
        let window = window.clone();
        let egui_events_q = egui_events.clone();
        let handler = Closure::wrap(Box::new(move |e: MouseEvent| {
            let mut session = session.borrow_mut();
            if !session.is_capturing() {
                let button = match e.button() {
                    2 => egui::PointerButton::Secondary,
                    1 => egui::PointerButton::Middle,
                    _ => egui::PointerButton::Primary,
                };
                egui_events_q.borrow_mut().push(egui::Event::PointerButton {
                    pos: egui_pos(&e),
                    button,
                    pressed: is_down,
                    modifiers: egui::Modifiers::default(),
                });
            }
            session.handle_input(&web_input::mouse_click_to_input(&e, is_down), now_secs(&window));
        }) as Box<dyn FnMut(MouseEvent)>);
        document.add_event_listener_with_callback(name, handler.as_ref().unchecked_ref())?;
        handler.forget();
    }

    // Context menu prevention
    {
        let contextmenu = Closure::wrap(Box::new(move |e: MouseEvent| {
            e.prevent_default();
        }) as Box<dyn FnMut(MouseEvent)>);
        document.add_event_listener_with_callback("contextmenu", contextmenu.as_ref().unchecked_ref())?;
        contextmenu.forget();
    }

    Ok(())
}

/// Full-window canvas sized in device pixels.
#[cfg(target_arch = "wasm32")]
fn init_canvas() -> Result<(Window, Document, HtmlCanvasElement), JsValue> {
    let window = web_sys::window().ok_or(js_error("no global `window`"))?;
    let document = window.document().ok_or(js_error("no document on window"))?;
    let body = document.body().ok_or(js_error("no body on document"))?;
    let canvas_el = document
        .create_element("canvas")?
        .dyn_into::<HtmlCanvasElement>()
        .map_err(|_| js_error("failed to create canvas"))?;

    let dpr = window.device_pixel_ratio();
    let css_w = window.inner_width()?.as_f64().unwrap_or(800.0);
    let css_h = window.inner_height()?.as_f64().unwrap_or(600.0);
    canvas_el.set_width((css_w * dpr) as u32);
    canvas_el.set_height((css_h * dpr) as u32);
    canvas_el.set_attribute("style", "display:block;width:100vw;height:100vh;cursor:crosshair")?;
    body.set_attribute("style", "margin:0;overflow:hidden;background:#000")?;
    body.append_child(&canvas_el)?;
    Ok((window, document, canvas_el))
}

#[cfg(target_arch = "wasm32")]
fn js_error<E: Into<String>>(msg: E) -> JsValue {
    JsValue::from_str(&msg.into())
}

#[cfg(target_arch = "wasm32")]
struct RcCellCallback {
    inner: Rc<RefCell<Box<dyn FnMut()>>>,
    window: Window,
}

#[cfg(target_arch = "wasm32")]
impl RcCellCallback {
    fn new(window: Window, f: impl FnMut() + 'static) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Box::new(f))),
            window,
        }
    }

    fn start(self) {
        let inner = self.inner.clone();
        let window = self.window.clone();

        let callback = Rc::new(RefCell::new(None::<Closure<dyn FnMut()>>));
        let callback_clone = callback.clone();

        *callback.borrow_mut() = Some(Closure::wrap(Box::new(move || {
            inner.borrow_mut().as_mut()();

            // Recursively schedule next frame
            if let Some(cb) = callback_clone.borrow().as_ref() {
                if let Err(e) = window.request_animation_frame(cb.as_ref().unchecked_ref()) {
                    tracing::error!("requestAnimationFrame failed: {e:?}");
                }
            }
        }) as Box<dyn FnMut()>));

        if let Some(cb) = callback.borrow().as_ref() {
            if let Err(e) = self.window.request_animation_frame(cb.as_ref().unchecked_ref()) {
                tracing::error!("could not start frame loop: {e:?}");
            }
        }

        // Leak the closure to keep it alive
        std::mem::forget(callback);
    }
}
