//! Edit reconciliation for text steps
//!
//! The backend reports each augmentation step as its output text plus a set
//! of positional edit records. Rendering has to mark every edited word in
//! the right place even though earlier edits shift the indices of later
//! ones. The index-space rules differ per kind:
//!
//! - replace: positions are stable (word count unchanged); the recorded
//!   new word is written into its slot unconditionally, in descending
//!   position order so one replacement cannot shift another's target;
//! - insert: positions index the text after all insertions are applied, so
//!   the recorded word is verified at its claimed slot before marking;
//! - delete: deleted words are absent from the output text and must be
//!   reinserted at their original positions in ascending order, since each
//!   reinsertion shifts the natural indices that follow it.
//!
//! An insert record whose word does not match the text at its claimed
//! position, or any record whose position is out of range, is logged and
//! skipped; a corrupt index must never panic or garble the rendered
//! sentence.

use stepscope_core::{EditMark, EditRecord, MarkedWord};

/// Tokenize on single spaces; this is the highlighting unit, independent of
/// any linguistic tokenizer used server-side.
fn split_words(text: &str) -> Vec<MarkedWord> {
    if text.is_empty() {
        return Vec::new();
    }
    text.split(' ').map(MarkedWord::plain).collect()
}

/// Reconcile one step's edits against its text, producing marked words
pub fn reconcile(step_text: &str, edits: &[EditRecord]) -> Vec<MarkedWord> {
    let mut words = split_words(step_text);

    apply_replacements(&mut words, edits);
    mark_insertions(&mut words, edits);
    reinsert_deletions(&mut words, edits);

    words
}

fn apply_replacements(words: &mut [MarkedWord], edits: &[EditRecord]) {
    let mut replacements: Vec<(usize, &str, &str)> = edits
        .iter()
        .filter_map(|edit| match edit {
            EditRecord::Replace {
                position,
                old_word,
                new_word,
            } => Some((*position, old_word.as_str(), new_word.as_str())),
            _ => None,
        })
        .collect();
    // Descending, so one in-place replacement cannot shift another's target.
    replacements.sort_by(|a, b| b.0.cmp(&a.0));

    for (position, old_word, new_word) in replacements {
        match words.get_mut(position) {
            Some(slot) => {
                *slot = MarkedWord::marked(
                    new_word,
                    EditMark::Replaced {
                        previous: old_word.to_string(),
                    },
                );
            }
            None => {
                log::warn!("replace position {} out of range; skipping", position);
            }
        }
    }
}

fn mark_insertions(words: &mut [MarkedWord], edits: &[EditRecord]) {
    for edit in edits {
        let (position, word) = match edit {
            EditRecord::Insert { position, word } => (*position, word.as_str()),
            _ => continue,
        };
        match words.get_mut(position) {
            Some(slot) if slot.word == word => {
                slot.mark = Some(EditMark::Inserted);
            }
            Some(slot) => {
                log::warn!(
                    "insert mismatch at {}: expected {:?}, found {:?}; skipping",
                    position,
                    word,
                    slot.word
                );
            }
            None => {
                log::warn!("insert position {} out of range; skipping", position);
            }
        }
    }
}

fn reinsert_deletions(words: &mut Vec<MarkedWord>, edits: &[EditRecord]) {
    let mut deletions: Vec<(usize, &str)> = edits
        .iter()
        .filter_map(|edit| match edit {
            EditRecord::Delete { position, word } => Some((*position, word.as_str())),
            _ => None,
        })
        .collect();
    // Ascending: each reinsertion shifts the natural indices after it, so
    // later positions land correctly only if earlier ones went in first.
    deletions.sort_by_key(|&(position, _)| position);

    for (position, word) in deletions {
        if position <= words.len() {
            words.insert(position, MarkedWord::marked(word, EditMark::Deleted));
        } else {
            log::warn!("delete position {} out of range; skipping", position);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init_logging() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn replace(position: usize, old_word: &str, new_word: &str) -> EditRecord {
        EditRecord::Replace {
            position,
            old_word: old_word.to_string(),
            new_word: new_word.to_string(),
        }
    }

    fn insert(position: usize, word: &str) -> EditRecord {
        EditRecord::Insert {
            position,
            word: word.to_string(),
        }
    }

    fn delete(position: usize, word: &str) -> EditRecord {
        EditRecord::Delete {
            position,
            word: word.to_string(),
        }
    }

    fn words(marked: &[MarkedWord]) -> Vec<&str> {
        marked.iter().map(|w| w.word.as_str()).collect()
    }

    #[test]
    fn test_single_replace() {
        // The slot still carries the pre-edit word; the recorded new word
        // overwrites it, marked with the previous word for display.
        let marked = reconcile("the cat sat", &[replace(1, "cat", "dog")]);
        assert_eq!(words(&marked), vec!["the", "dog", "sat"]);
        assert_eq!(
            marked[1].mark,
            Some(EditMark::Replaced {
                previous: "cat".to_string()
            })
        );
        assert_eq!(marked[0].mark, None);
        assert_eq!(marked[2].mark, None);
    }

    #[test]
    fn test_replace_applies_when_text_already_updated() {
        // Step text that already reflects the replacement keeps the same
        // word and just gains the mark.
        let marked = reconcile("the dog sat", &[replace(1, "cat", "dog")]);
        assert_eq!(words(&marked), vec!["the", "dog", "sat"]);
        assert_eq!(
            marked[1].mark,
            Some(EditMark::Replaced {
                previous: "cat".to_string()
            })
        );
    }

    #[test]
    fn test_multiple_replaces_any_record_order() {
        // Descending application makes record order irrelevant.
        for edits in [
            vec![replace(0, "a", "x"), replace(2, "c", "z")],
            vec![replace(2, "c", "z"), replace(0, "a", "x")],
        ] {
            let marked = reconcile("a b c", &edits);
            assert_eq!(words(&marked), vec!["x", "b", "z"]);
            assert!(marked[0].mark.is_some());
            assert!(marked[1].mark.is_none());
            assert!(marked[2].mark.is_some());
        }
    }

    #[test]
    fn test_replace_out_of_range_skipped() {
        init_logging();
        let marked = reconcile("the cat", &[replace(9, "cat", "dog")]);
        assert_eq!(words(&marked), vec!["the", "cat"]);
    }

    #[test]
    fn test_insert_marked_in_place() {
        let marked = reconcile("the very cat", &[insert(1, "very")]);
        assert_eq!(words(&marked), vec!["the", "very", "cat"]);
        assert_eq!(marked[1].mark, Some(EditMark::Inserted));
    }

    #[test]
    fn test_insert_drift_guard() {
        let marked = reconcile("the cat", &[insert(1, "very")]);
        assert!(marked.iter().all(|w| w.mark.is_none()));
    }

    #[test]
    fn test_single_delete_reinserted() {
        let marked = reconcile("the sat", &[delete(1, "cat")]);
        assert_eq!(words(&marked), vec!["the", "cat", "sat"]);
        assert_eq!(marked[1].mark, Some(EditMark::Deleted));
    }

    #[test]
    fn test_multiple_deletes_ascending_reinsertion() {
        // Original "a b c d e" with b (1) and d (3) deleted leaves "a c e";
        // ascending reinsertion restores both to their original slots.
        for edits in [
            vec![delete(1, "b"), delete(3, "d")],
            vec![delete(3, "d"), delete(1, "b")],
        ] {
            let marked = reconcile("a c e", &edits);
            assert_eq!(words(&marked), vec!["a", "b", "c", "d", "e"]);
            assert_eq!(marked[1].mark, Some(EditMark::Deleted));
            assert_eq!(marked[3].mark, Some(EditMark::Deleted));
        }
    }

    #[test]
    fn test_delete_at_end_is_append() {
        let marked = reconcile("the cat", &[delete(2, "sat")]);
        assert_eq!(words(&marked), vec!["the", "cat", "sat"]);
        assert_eq!(marked[2].mark, Some(EditMark::Deleted));
    }

    #[test]
    fn test_delete_out_of_range_skipped() {
        let marked = reconcile("the cat", &[delete(9, "sat")]);
        assert_eq!(words(&marked), vec!["the", "cat"]);
    }

    #[test]
    fn test_no_edits_passthrough() {
        let marked = reconcile("just some words", &[]);
        assert_eq!(words(&marked), vec!["just", "some", "words"]);
        assert!(marked.iter().all(|w| w.mark.is_none()));
    }

    #[test]
    fn test_empty_text() {
        assert!(reconcile("", &[]).is_empty());
        // A deletion against empty text reinserts at position 0.
        let marked = reconcile("", &[delete(0, "gone")]);
        assert_eq!(words(&marked), vec!["gone"]);
    }
}
