//! Viewer factory wiring for pipeline views

use stepscope_core::{Dispose, Result};
use stepscope_engine::ViewerFactory;
use stepscope_io::OffDecoder;

use crate::viewer::{MeshViewer, Mount, ViewerConfig};

/// Supplies a render mount for each step viewer about to be created
pub trait MountProvider {
    fn mount_for(&mut self, step_name: &str) -> Result<Mount>;
}

impl<F> MountProvider for F
where
    F: FnMut(&str) -> Result<Mount>,
{
    fn mount_for(&mut self, step_name: &str) -> Result<Mount> {
        self(step_name)
    }
}

/// A [`ViewerFactory`] that decodes each step's mesh text and spawns a
/// [`MeshViewer`] on a mount from the provider
pub struct StepViewerFactory<M: MountProvider> {
    provider: M,
    config: ViewerConfig,
}

impl<M: MountProvider> StepViewerFactory<M> {
    pub fn new(provider: M) -> Self {
        Self {
            provider,
            config: ViewerConfig::default(),
        }
    }

    pub fn with_config(provider: M, config: ViewerConfig) -> Self {
        Self { provider, config }
    }
}

impl<M: MountProvider> ViewerFactory for StepViewerFactory<M> {
    fn create_viewer(&mut self, step_name: &str, mesh_source: &str) -> Result<Box<dyn Dispose>> {
        let mesh = OffDecoder::decode(mesh_source)?;
        let mount = self.provider.mount_for(step_name)?;
        let handle = MeshViewer::create(&mount, &mesh, self.config.clone())?;
        Ok(Box::new(handle))
    }
}
