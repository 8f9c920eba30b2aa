//! Disposal of owned rendering resources
//!
//! A viewer handle owns exactly one render-loop task, one GPU context and
//! one resize subscription. Whoever created the handle must dispose it
//! before its mount point is reused; disposing twice must be a no-op.

/// An owned bundle of rendering resources with a single disposal operation
pub trait Dispose {
    /// Release every owned resource. Idempotent: repeated calls do nothing.
    fn dispose(&mut self);
}

impl Dispose for Box<dyn Dispose> {
    fn dispose(&mut self) {
        (**self).dispose();
    }
}
