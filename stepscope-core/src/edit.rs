//! Positional edit records produced by text augmentation steps
//!
//! Each record describes one word-level change. Positions are word indices
//! into the step's *input* text, not the original sentence; the reconciler
//! in `stepscope-engine` is responsible for resolving index drift.

use serde::{Deserialize, Serialize};

/// A single positional change made by one augmentation step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EditRecord {
    /// A word was swapped in place; word count is unchanged.
    Replace {
        position: usize,
        old_word: String,
        new_word: String,
    },
    /// A word was inserted; `position` indexes the text after all
    /// insertions for the step are applied.
    Insert { position: usize, word: String },
    /// A word was removed; `position` is its index in the pre-deletion text.
    Delete { position: usize, word: String },
}

impl EditRecord {
    /// Word index this edit refers to
    pub fn position(&self) -> usize {
        match self {
            EditRecord::Replace { position, .. } => *position,
            EditRecord::Insert { position, .. } => *position,
            EditRecord::Delete { position, .. } => *position,
        }
    }
}

/// How a displayed word was affected by the step's edits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EditMark {
    /// Replaced in place; carries the prior word for tooltip display.
    Replaced { previous: String },
    Inserted,
    /// Reinserted into its original slot, rendered struck through.
    Deleted,
}

/// One word of reconciled step text with its optional edit marking
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkedWord {
    pub word: String,
    pub mark: Option<EditMark>,
}

impl MarkedWord {
    /// An unmarked word
    pub fn plain(word: impl Into<String>) -> Self {
        Self {
            word: word.into(),
            mark: None,
        }
    }

    /// A word carrying an edit mark
    pub fn marked(word: impl Into<String>, mark: EditMark) -> Self {
        Self {
            word: word.into(),
            mark: Some(mark),
        }
    }
}

/// One text augmentation step: its output text plus the edits that produced it
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TextStep {
    pub text: String,
    pub edits: Vec<EditRecord>,
}

impl TextStep {
    /// A step carrying text with no recorded edits
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            edits: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edit_position() {
        let replace = EditRecord::Replace {
            position: 3,
            old_word: "cat".to_string(),
            new_word: "dog".to_string(),
        };
        let insert = EditRecord::Insert {
            position: 0,
            word: "the".to_string(),
        };
        assert_eq!(replace.position(), 3);
        assert_eq!(insert.position(), 0);
    }

    #[test]
    fn test_marked_word_constructors() {
        assert_eq!(MarkedWord::plain("sat").mark, None);
        let marked = MarkedWord::marked("dog", EditMark::Inserted);
        assert_eq!(marked.mark, Some(EditMark::Inserted));
    }
}
