//! Rendered pipeline steps

use crate::edit::MarkedWord;
use serde::{Deserialize, Serialize};

/// Name of the terminal pseudo-step appended to every sequenced run
pub const FINAL_STEP_NAME: &str = "Final Result";

/// One named, ordered step ready for display
///
/// Immutable once built; discarded when the enclosing view is replaced.
/// `markup` is populated for reconciled text steps only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderedStep<P> {
    pub name: String,
    pub payload: P,
    pub markup: Option<Vec<MarkedWord>>,
}

impl<P> RenderedStep<P> {
    /// Create a step without markup
    pub fn new(name: impl Into<String>, payload: P) -> Self {
        Self {
            name: name.into(),
            payload,
            markup: None,
        }
    }

    /// Attach reconciled word markup
    pub fn with_markup(mut self, markup: Vec<MarkedWord>) -> Self {
        self.markup = Some(markup);
        self
    }

    /// Whether this is the terminal pseudo-step
    pub fn is_final(&self) -> bool {
        self.name == FINAL_STEP_NAME
    }
}
