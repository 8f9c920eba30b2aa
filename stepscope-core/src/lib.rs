//! Core data structures for stepscope
//!
//! This crate provides the shared vocabulary of the visualization engine:
//! pipeline modalities and their canonical step orderings, positional edit
//! records, rendered steps, decoded surface meshes, and the disposal trait
//! that viewer handles implement.

pub mod modality;
pub mod edit;
pub mod step;
pub mod mesh;
pub mod handle;
pub mod error;

pub use modality::*;
pub use edit::*;
pub use step::*;
pub use mesh::*;
pub use handle::*;
pub use error::*;

/// Re-export commonly used types from nalgebra
pub use nalgebra::{Matrix4, Point3, Vector3};
