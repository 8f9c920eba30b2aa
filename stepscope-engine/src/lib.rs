//! Transformation-step visualization engine
//!
//! This crate turns a backend's unordered step-result bag into an ordered,
//! displayable pipeline view:
//! - the sequencer imposes the modality's canonical step order and appends
//!   the final output as a terminal pseudo-step;
//! - the reconciler resolves positional edit records against each text
//!   step, handling the index drift between edit application and display;
//! - the generic pipeline view composes both with a per-modality presenter
//!   and owns the lifecycle of every 3D viewer it spawns.

pub mod sequencer;
pub mod reconciler;
pub mod view;

pub use sequencer::sequence;
pub use reconciler::reconcile;
pub use view::{
    MeshPresenter, OpaquePresenter, PipelineView, PresentedStep, StepPresenter, TextPresenter,
    ViewerFactory,
};
