// CONTROLLER: Input, game logic, and update loop
pub mod input;
pub mod physics;
pub mod camera_controller;
pub mod scheduler;
pub mod turbo;
pub mod run_timer;
pub mod session;
#[cfg(target_arch = "wasm32")]
pub mod frame_loop;

pub use input::{InputEvent, InputState, InputProcessor};
pub use physics::{Locomotion, MoveIntent};
pub use camera_controller::CameraController;
pub use scheduler::{FrameClock, Scheduler, TimerHandle};
pub use turbo::{Turbo, TurboPhase};
pub use run_timer::{RunResult, RunTimer};
pub use session::{GameSession, HudState, PickupNotice};
#[cfg(target_arch = "wasm32")]
pub use frame_loop::FrameLoopContext;
