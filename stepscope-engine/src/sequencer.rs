//! Step sequencing
//!
//! The backend's step-result mapping has no guaranteed order. Sequencing
//! imposes the modality's canonical order on it: iterate the canonical
//! names, emit the present ones, skip the absent ones (the backend may have
//! disabled that stage), and append the final output as a terminal
//! pseudo-step.

use std::collections::HashMap;
use stepscope_core::{RenderedStep, FINAL_STEP_NAME};

/// Order an unordered step-result mapping for display
///
/// Deterministic: the output order equals the filtered canonical order,
/// never the mapping's enumeration order. The terminal step is appended
/// regardless of whether any intermediate step fired.
pub fn sequence<P: Clone>(
    results: &HashMap<String, P>,
    order: &[&str],
    final_payload: P,
) -> Vec<RenderedStep<P>> {
    let mut steps: Vec<RenderedStep<P>> = order
        .iter()
        .filter_map(|&name| {
            results
                .get(name)
                .map(|payload| RenderedStep::new(name, payload.clone()))
        })
        .collect();
    steps.push(RenderedStep::new(FINAL_STEP_NAME, final_payload));
    steps
}

#[cfg(test)]
mod tests {
    use super::*;

    fn results(names: &[&str]) -> HashMap<String, String> {
        names
            .iter()
            .map(|&name| (name.to_string(), format!("payload of {}", name)))
            .collect()
    }

    #[test]
    fn test_filtered_canonical_order() {
        // Present subset {C, A} of order [A, B, C] must come out [A, C, Final].
        let steps = sequence(&results(&["C", "A"]), &["A", "B", "C"], "done".to_string());
        let names: Vec<&str> = steps.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["A", "C", FINAL_STEP_NAME]);
        assert_eq!(steps[0].payload, "payload of A");
        assert_eq!(steps[2].payload, "done");
    }

    #[test]
    fn test_map_order_is_irrelevant() {
        let order = &["First", "Second", "Third", "Fourth"];
        let a = sequence(&results(&["Fourth", "First", "Third"]), order, String::new());
        let b = sequence(&results(&["First", "Third", "Fourth"]), order, String::new());
        let names = |steps: &[RenderedStep<String>]| -> Vec<String> {
            steps.iter().map(|s| s.name.clone()).collect()
        };
        assert_eq!(names(&a), names(&b));
        assert_eq!(names(&a), vec!["First", "Third", "Fourth", FINAL_STEP_NAME]);
    }

    #[test]
    fn test_final_step_always_present() {
        let steps = sequence(&HashMap::new(), &["A", "B"], 42);
        assert_eq!(steps.len(), 1);
        assert!(steps[0].is_final());
        assert_eq!(steps[0].payload, 42);
    }

    #[test]
    fn test_unknown_names_in_results_are_ignored() {
        let steps = sequence(&results(&["A", "Rogue"]), &["A"], String::new());
        let names: Vec<&str> = steps.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["A", FINAL_STEP_NAME]);
    }
}
