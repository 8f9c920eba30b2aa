//! I/O for stepscope
//!
//! This crate owns the two boundaries of the engine: decoding the OFF-style
//! mesh text format into renderable flat buffers, and the JSON wire shapes
//! of the external backend processing service (requests, preprocessing and
//! augmentation responses, and their conversion into engine types).

pub mod off;
pub mod backend;

pub use off::OffDecoder;
pub use backend::{
    parse_augmentation, parse_preprocessing, parse_text_augmentation, request_body, PipelineRun,
    TextAugmentationRun, TokenListing, PAD_TOKEN,
};
