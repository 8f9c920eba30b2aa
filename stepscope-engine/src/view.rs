//! Step-sequenced modality views
//!
//! One generic view type composes the sequencer with a per-modality
//! presenter strategy instead of four parallel renderer implementations.
//! The view owns every viewer handle its presenter creates and guarantees
//! the lifecycle invariant: re-rendering disposes all handles from the
//! prior invocation exactly once before any new scene exists, and a
//! dropped view leaves nothing behind.

use crate::sequencer::sequence;
use crate::reconciler::reconcile;
use std::collections::HashMap;
use stepscope_core::{Dispose, Error, Modality, RenderedStep, Result, Stage, TextStep};
use stepscope_io::{PipelineRun, TextAugmentationRun};

/// Per-modality strategy for painting one ordered step
pub trait StepPresenter {
    /// Step payload type this presenter understands
    type Payload: Clone;

    /// Present one step, optionally creating a viewer whose handle the
    /// enclosing view will own
    fn present(&mut self, step: RenderedStep<Self::Payload>) -> Result<PresentedStep<Self::Payload>>;
}

/// The outcome of presenting one step
pub struct PresentedStep<P> {
    pub step: RenderedStep<P>,
    pub handle: Option<Box<dyn Dispose>>,
}

impl<P> PresentedStep<P> {
    /// A step with no owned resources
    pub fn plain(step: RenderedStep<P>) -> Self {
        Self { step, handle: None }
    }

    /// A step owning one viewer handle
    pub fn with_handle(step: RenderedStep<P>, handle: Box<dyn Dispose>) -> Self {
        Self {
            step,
            handle: Some(handle),
        }
    }
}

/// Creates one 3D viewer per step; implemented by the viewer crate against
/// a concrete mount supply
pub trait ViewerFactory {
    fn create_viewer(&mut self, step_name: &str, mesh_source: &str) -> Result<Box<dyn Dispose>>;
}

/// An "original → steps → final" view for one modality
pub struct PipelineView<S: StepPresenter> {
    presenter: S,
    steps: Vec<RenderedStep<S::Payload>>,
    handles: Vec<Box<dyn Dispose>>,
    pending: bool,
}

impl<S: StepPresenter> PipelineView<S> {
    pub fn new(presenter: S) -> Self {
        Self {
            presenter,
            steps: Vec::new(),
            handles: Vec::new(),
            pending: false,
        }
    }

    /// Sequence and present one pipeline run, replacing any prior view
    ///
    /// All handles from the previous invocation are disposed before the
    /// first new step is presented. On failure nothing is left partially
    /// rendered: steps are cleared and any handles created so far are
    /// disposed.
    pub fn render(
        &mut self,
        results: &HashMap<String, S::Payload>,
        order: &[&str],
        final_payload: S::Payload,
    ) -> Result<&[RenderedStep<S::Payload>]> {
        if self.pending {
            return Err(Error::Busy("a render of this view is still pending"));
        }
        self.pending = true;
        self.dispose_handles();
        self.steps.clear();

        let outcome = self.present_all(results, order, final_payload);
        self.pending = false;
        if let Err(e) = outcome {
            self.dispose_handles();
            self.steps.clear();
            return Err(e);
        }
        Ok(&self.steps)
    }

    fn present_all(
        &mut self,
        results: &HashMap<String, S::Payload>,
        order: &[&str],
        final_payload: S::Payload,
    ) -> Result<()> {
        for step in sequence(results, order, final_payload) {
            let presented = self.presenter.present(step)?;
            if let Some(handle) = presented.handle {
                self.handles.push(handle);
            }
            self.steps.push(presented.step);
        }
        Ok(())
    }

    /// The currently displayed steps, canonical order
    pub fn steps(&self) -> &[RenderedStep<S::Payload>] {
        &self.steps
    }

    /// Number of live viewer handles owned by this view
    pub fn viewer_count(&self) -> usize {
        self.handles.len()
    }

    fn dispose_handles(&mut self) {
        for mut handle in self.handles.drain(..) {
            handle.dispose();
        }
    }
}

impl<S: StepPresenter> Dispose for PipelineView<S> {
    fn dispose(&mut self) {
        self.dispose_handles();
        self.steps.clear();
    }
}

impl<S: StepPresenter> Drop for PipelineView<S> {
    fn drop(&mut self) {
        self.dispose_handles();
    }
}

/// Presenter for reconciled text steps
pub struct TextPresenter;

impl StepPresenter for TextPresenter {
    type Payload = TextStep;

    fn present(&mut self, step: RenderedStep<TextStep>) -> Result<PresentedStep<TextStep>> {
        let markup = reconcile(&step.payload.text, &step.payload.edits);
        Ok(PresentedStep::plain(step.with_markup(markup)))
    }
}

/// Presenter for opaque payloads (plain text chains, data-URL images and
/// audio clips)
pub struct OpaquePresenter;

impl StepPresenter for OpaquePresenter {
    type Payload = String;

    fn present(&mut self, step: RenderedStep<String>) -> Result<PresentedStep<String>> {
        Ok(PresentedStep::plain(step))
    }
}

/// Presenter that spawns one 3D viewer per step
pub struct MeshPresenter<F: ViewerFactory> {
    factory: F,
}

impl<F: ViewerFactory> MeshPresenter<F> {
    pub fn new(factory: F) -> Self {
        Self { factory }
    }
}

impl<F: ViewerFactory> StepPresenter for MeshPresenter<F> {
    type Payload = String;

    fn present(&mut self, step: RenderedStep<String>) -> Result<PresentedStep<String>> {
        let handle = self.factory.create_viewer(&step.name, &step.payload)?;
        Ok(PresentedStep::with_handle(step, handle))
    }
}

impl PipelineView<TextPresenter> {
    /// Render a parsed text augmentation run
    pub fn render_text_augmentation(
        &mut self,
        run: &TextAugmentationRun,
    ) -> Result<&[RenderedStep<TextStep>]> {
        let order = Modality::Text.step_order(Stage::Augmentation);
        let final_payload = TextStep::plain(run.final_text.clone());
        self.render(&run.steps, order, final_payload)
    }
}

impl PipelineView<OpaquePresenter> {
    /// Render a parsed preprocessing run for any opaque-payload modality
    pub fn render_preprocessing(
        &mut self,
        modality: Modality,
        run: &PipelineRun,
    ) -> Result<&[RenderedStep<String>]> {
        let order = modality.step_order(Stage::Preprocessing);
        self.render(&run.steps, order, run.final_payload.clone())
    }

    /// Render a parsed augmentation run with opaque payloads (image, audio)
    pub fn render_augmentation(
        &mut self,
        modality: Modality,
        run: &PipelineRun,
    ) -> Result<&[RenderedStep<String>]> {
        let order = modality.step_order(Stage::Augmentation);
        self.render(&run.steps, order, run.final_payload.clone())
    }
}

impl<F: ViewerFactory> PipelineView<MeshPresenter<F>> {
    /// Render a parsed 3D run, spawning one viewer per step
    pub fn render_mesh_run(
        &mut self,
        stage: Stage,
        run: &PipelineRun,
    ) -> Result<&[RenderedStep<String>]> {
        let order = Modality::ThreeD.step_order(stage);
        self.render(&run.steps, order, run.final_payload.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use stepscope_core::EditMark;

    /// Handle that counts total disposals and panics on double-dispose
    struct CountingHandle {
        disposals: Arc<AtomicUsize>,
        disposed: bool,
    }

    impl Dispose for CountingHandle {
        fn dispose(&mut self) {
            assert!(!self.disposed, "handle disposed twice");
            self.disposed = true;
            self.disposals.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct CountingFactory {
        created: Arc<AtomicUsize>,
        disposals: Arc<AtomicUsize>,
        fail_after: Option<usize>,
    }

    impl ViewerFactory for CountingFactory {
        fn create_viewer(&mut self, _name: &str, _source: &str) -> Result<Box<dyn Dispose>> {
            if let Some(limit) = self.fail_after {
                if self.created.load(Ordering::SeqCst) >= limit {
                    return Err(Error::Format("bad mesh".to_string()));
                }
            }
            self.created.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(CountingHandle {
                disposals: self.disposals.clone(),
                disposed: false,
            }))
        }
    }

    fn mesh_results(names: &[&str]) -> HashMap<String, String> {
        names
            .iter()
            .map(|&n| (n.to_string(), format!("OFF for {}", n)))
            .collect()
    }

    fn counting_view(
        fail_after: Option<usize>,
    ) -> (
        PipelineView<MeshPresenter<CountingFactory>>,
        Arc<AtomicUsize>,
        Arc<AtomicUsize>,
    ) {
        let created = Arc::new(AtomicUsize::new(0));
        let disposals = Arc::new(AtomicUsize::new(0));
        let factory = CountingFactory {
            created: created.clone(),
            disposals: disposals.clone(),
            fail_after,
        };
        (
            PipelineView::new(MeshPresenter::new(factory)),
            created,
            disposals,
        )
    }

    #[test]
    fn test_mesh_view_spawns_one_viewer_per_step() {
        let (mut view, created, disposals) = counting_view(None);
        let order = &["Rotation", "Scale", "Noise", "Deform"];
        view.render(
            &mesh_results(&["Rotation", "Noise"]),
            order,
            "OFF final".to_string(),
        )
        .unwrap();

        // Two present steps plus the terminal step.
        assert_eq!(view.steps().len(), 3);
        assert_eq!(created.load(Ordering::SeqCst), 3);
        assert_eq!(view.viewer_count(), 3);
        assert_eq!(disposals.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_rerender_disposes_previous_handles_exactly_once() {
        let (mut view, created, disposals) = counting_view(None);
        let order = &["Rotation", "Scale"];

        view.render(&mesh_results(&["Rotation", "Scale"]), order, "f".to_string())
            .unwrap();
        let first_batch = created.load(Ordering::SeqCst);
        assert_eq!(first_batch, 3);

        view.render(&mesh_results(&["Scale"]), order, "f".to_string())
            .unwrap();
        // Every handle from the first invocation disposed, none of the new.
        assert_eq!(disposals.load(Ordering::SeqCst), first_batch);
        assert_eq!(view.viewer_count(), 2);
    }

    #[test]
    fn test_drop_disposes_everything() {
        let (mut view, created, disposals) = counting_view(None);
        view.render(&mesh_results(&["Rotation"]), &["Rotation"], "f".to_string())
            .unwrap();
        let total = created.load(Ordering::SeqCst);
        drop(view);
        assert_eq!(disposals.load(Ordering::SeqCst), total);
    }

    #[test]
    fn test_explicit_dispose_then_drop_no_double() {
        let (mut view, created, disposals) = counting_view(None);
        view.render(&mesh_results(&["Scale"]), &["Scale"], "f".to_string())
            .unwrap();
        view.dispose();
        assert_eq!(view.viewer_count(), 0);
        drop(view);
        // CountingHandle panics on double-dispose, so reaching here with
        // matching counts proves exactly-once.
        assert_eq!(disposals.load(Ordering::SeqCst), created.load(Ordering::SeqCst));
    }

    #[test]
    fn test_failed_render_leaves_nothing_partial() {
        let (mut view, created, disposals) = counting_view(Some(1));
        let result = view.render(
            &mesh_results(&["Rotation", "Scale"]),
            &["Rotation", "Scale"],
            "f".to_string(),
        );
        assert!(matches!(result, Err(Error::Format(_))));
        assert!(view.steps().is_empty());
        assert_eq!(view.viewer_count(), 0);
        assert_eq!(disposals.load(Ordering::SeqCst), created.load(Ordering::SeqCst));

        // The pending guard must reset so the user can re-trigger.
        let (mut ok_view, _, _) = counting_view(None);
        ok_view
            .render(&mesh_results(&["Rotation"]), &["Rotation"], "f".to_string())
            .unwrap();
    }

    #[test]
    fn test_text_presenter_attaches_markup() {
        let mut view = PipelineView::new(TextPresenter);
        let mut results = HashMap::new();
        results.insert(
            "Random Deletion".to_string(),
            TextStep {
                text: "the sat".to_string(),
                edits: vec![stepscope_core::EditRecord::Delete {
                    position: 1,
                    word: "cat".to_string(),
                }],
            },
        );
        let steps = view
            .render(
                &results,
                Modality::Text.step_order(Stage::Augmentation),
                TextStep::plain("the sat"),
            )
            .unwrap();

        assert_eq!(steps.len(), 2);
        let markup = steps[0].markup.as_ref().unwrap();
        let words: Vec<&str> = markup.iter().map(|w| w.word.as_str()).collect();
        assert_eq!(words, vec!["the", "cat", "sat"]);
        assert_eq!(markup[1].mark, Some(EditMark::Deleted));
        assert!(steps[1].is_final());
    }

    #[test]
    fn test_opaque_presenter_passthrough() {
        let mut view = PipelineView::new(OpaquePresenter);
        let mut results = HashMap::new();
        results.insert("Grayscale".to_string(), "data:image/png;base64,AA".to_string());
        let steps = view
            .render(
                &results,
                Modality::Image.step_order(Stage::Preprocessing),
                "data:image/png;base64,BB".to_string(),
            )
            .unwrap();
        assert_eq!(steps[0].name, "Grayscale");
        assert!(steps[0].markup.is_none());
        assert_eq!(steps[1].payload, "data:image/png;base64,BB");
    }
}
