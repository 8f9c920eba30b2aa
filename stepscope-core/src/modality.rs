//! Pipeline modalities and their canonical step orderings
//!
//! The backend returns step results in a mapping with no guaranteed order.
//! Display order comes from these compile-time constants, never from the
//! enumeration order of the response.

use serde::{Deserialize, Serialize};

/// Canonical order of text preprocessing steps
pub const TEXT_PREPROCESSING_ORDER: &[&str] = &[
    "Case Normalization",
    "Punctuation Removal",
    "Stop Word Removal",
    "Padding",
];

/// Canonical order of text augmentation steps
pub const TEXT_AUGMENTATION_ORDER: &[&str] = &[
    "Synonym Replacement",
    "Word Replacement",
    "Random Insertion",
    "Random Deletion",
];

/// Canonical order of image preprocessing steps
pub const IMAGE_PREPROCESSING_ORDER: &[&str] = &["Resize", "Normalize", "Grayscale", "Blur"];

/// Canonical order of image augmentation steps
pub const IMAGE_AUGMENTATION_ORDER: &[&str] = &["Rotation", "Flip", "Brightness", "Noise"];

/// Canonical order of audio preprocessing steps
pub const AUDIO_PREPROCESSING_ORDER: &[&str] = &["Resample", "Normalize", "Noise Reduction", "MFCC"];

/// Canonical order of audio augmentation steps
pub const AUDIO_AUGMENTATION_ORDER: &[&str] = &[
    "Time Stretch",
    "Pitch Shift",
    "Noise",
    "Time Mask",
    "Frequency Mask",
];

/// Canonical order of 3D preprocessing steps
pub const THREED_PREPROCESSING_ORDER: &[&str] = &["Normalize", "Center", "Simplify", "Smooth"];

/// Canonical order of 3D augmentation steps
pub const THREED_AUGMENTATION_ORDER: &[&str] = &["Rotation", "Scale", "Noise", "Deform"];

/// The kind of artifact flowing through a pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Modality {
    Text,
    Image,
    Audio,
    ThreeD,
}

/// Which half of the pipeline a run belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Preprocessing,
    Augmentation,
}

impl Modality {
    /// Canonical step ordering for the given stage
    pub fn step_order(&self, stage: Stage) -> &'static [&'static str] {
        match (self, stage) {
            (Modality::Text, Stage::Preprocessing) => TEXT_PREPROCESSING_ORDER,
            (Modality::Text, Stage::Augmentation) => TEXT_AUGMENTATION_ORDER,
            (Modality::Image, Stage::Preprocessing) => IMAGE_PREPROCESSING_ORDER,
            (Modality::Image, Stage::Augmentation) => IMAGE_AUGMENTATION_ORDER,
            (Modality::Audio, Stage::Preprocessing) => AUDIO_PREPROCESSING_ORDER,
            (Modality::Audio, Stage::Augmentation) => AUDIO_AUGMENTATION_ORDER,
            (Modality::ThreeD, Stage::Preprocessing) => THREED_PREPROCESSING_ORDER,
            (Modality::ThreeD, Stage::Augmentation) => THREED_AUGMENTATION_ORDER,
        }
    }

    /// JSON key carrying the artifact in a pipeline request body
    pub fn payload_key(&self) -> &'static str {
        match self {
            Modality::Text => "data",
            Modality::Image => "image",
            Modality::Audio => "audio",
            Modality::ThreeD => "model",
        }
    }

    /// JSON key carrying the final preprocessing output
    pub fn processed_key(&self) -> &'static str {
        match self {
            Modality::Text => "processed_text",
            Modality::Image => "processed_image",
            Modality::Audio => "processed_audio",
            Modality::ThreeD => "processed_model",
        }
    }

    /// JSON key carrying the final augmentation output
    pub fn augmented_key(&self) -> &'static str {
        match self {
            Modality::Text => "augmented_text",
            Modality::Image => "augmented_image",
            Modality::Audio => "augmented_audio",
            Modality::ThreeD => "augmented_model",
        }
    }
}
