// VIEW: Rendering and graphics
pub mod batch;
pub mod render;
pub mod gpu_init;

pub use batch::{build_batches, Batch, InstanceRaw, MeshKind, SceneBatches};
pub use render::{CameraResources, PipelineResources, RenderState};
pub use gpu_init::{GpuContext, GpuInitError};
