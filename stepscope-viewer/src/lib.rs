//! Per-step 3D mesh viewers
//!
//! Each transformation step with mesh output renders in its own viewer
//! with its own GPU device and render thread. The crate's contract is
//! leak-free lifecycle: disposing a viewer stops its render task, removes
//! its resize subscription, and releases its GPU resources, and the
//! instrumented counts ([`active_tasks`], [`ResizeBus::subscriber_count`])
//! return to their baseline.

pub mod camera;
pub mod factory;
pub mod gpu;
pub mod resize;
pub mod scene;
pub mod shaders;
pub mod task;
pub mod viewer;

pub use camera::OrthoCamera;
pub use factory::{MountProvider, StepViewerFactory};
pub use gpu::GpuContext;
pub use resize::{ResizeBus, ResizeSubscription};
pub use scene::{build_geometry, DisplayMode, SceneGeometry};
pub use task::{active_tasks, RenderTask};
pub use viewer::{MeshViewer, Mount, ViewerConfig, ViewerHandle};
