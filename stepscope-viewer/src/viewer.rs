//! Per-step mesh viewer lifecycle
//!
//! Every pipeline step with mesh output gets its own viewer: its own GPU
//! device, render task thread, and resize subscription, with no global
//! registry tying viewers together. Disposal is idempotent and synchronous;
//! once `dispose` returns, the render thread has exited and every resource
//! the viewer acquired has been released or detached.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use nalgebra::{Matrix4, Vector3};
use stepscope_core::{Dispose, Result, SurfaceMesh};

use crate::camera::OrthoCamera;
use crate::gpu::GpuContext;
use crate::resize::{ResizeBus, ResizeSubscription};
use crate::scene::{build_geometry, DisplayMode, SceneGeometry, SceneUniform, SceneVertex};
use crate::shaders::SCENE_SHADER;
use crate::task::RenderTask;

/// A surface a viewer renders into: its pixel dimensions plus the bus that
/// announces changes to them
#[derive(Clone)]
pub struct Mount {
    pub width: u32,
    pub height: u32,
    pub resize: ResizeBus,
}

/// Appearance and pacing settings for a step viewer
#[derive(Debug, Clone)]
pub struct ViewerConfig {
    pub background: [f64; 4],
    pub surface_color: [f32; 3],
    pub frame_interval: Duration,
    pub initial_mode: DisplayMode,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            background: [1.0, 1.0, 1.0, 1.0],
            // Sky blue, matching the surface tint used across step views.
            surface_color: [0.53, 0.81, 0.92],
            frame_interval: Duration::from_millis(16),
            initial_mode: DisplayMode::SolidWithEdges,
        }
    }
}

struct ViewerState {
    width: u32,
    height: u32,
    mode: DisplayMode,
    resized: bool,
}

fn lock(state: &Arc<Mutex<ViewerState>>) -> MutexGuard<'_, ViewerState> {
    state.lock().unwrap_or_else(|e| e.into_inner())
}

/// Factory entry point for step viewers
pub struct MeshViewer;

impl MeshViewer {
    /// Build the scene, acquire a GPU device, and start rendering
    pub fn create(mount: &Mount, mesh: &SurfaceMesh, config: ViewerConfig) -> Result<ViewerHandle> {
        let geometry = build_geometry(mesh, config.surface_color)?;
        let gpu = pollster::block_on(GpuContext::new())?;

        let width = mount.width.max(1);
        let height = mount.height.max(1);
        let shared = Arc::new(Mutex::new(ViewerState {
            width,
            height,
            mode: config.initial_mode,
            resized: false,
        }));

        let mut renderer = FrameRenderer::new(gpu, geometry, &config, width, height);
        let frame_state = Arc::clone(&shared);
        let task = RenderTask::spawn("mesh", config.frame_interval, move || {
            let snapshot = {
                let mut state = lock(&frame_state);
                let snapshot = ViewSnapshot {
                    width: state.width,
                    height: state.height,
                    mode: state.mode,
                    resized: state.resized,
                };
                state.resized = false;
                snapshot
            };
            if let Err(e) = renderer.render(&snapshot) {
                log::warn!("frame render failed: {}", e);
            }
        })?;

        let resize_state = Arc::clone(&shared);
        let subscription = mount.resize.subscribe(move |w, h| {
            let mut state = lock(&resize_state);
            state.width = w.max(1);
            state.height = h.max(1);
            state.resized = true;
        });

        log::debug!("viewer created at {}x{}", width, height);
        Ok(ViewerHandle {
            task: Some(task),
            subscription: Some(subscription),
            shared,
        })
    }
}

/// Owner of one viewer's render task and resize subscription
pub struct ViewerHandle {
    task: Option<RenderTask>,
    subscription: Option<ResizeSubscription>,
    shared: Arc<Mutex<ViewerState>>,
}

impl ViewerHandle {
    fn teardown(&mut self) {
        if let Some(mut subscription) = self.subscription.take() {
            subscription.unsubscribe();
        }
        if let Some(mut task) = self.task.take() {
            // Joining the thread drops the frame closure, and with it every
            // GPU resource the renderer held.
            task.cancel();
            log::debug!("viewer disposed");
        }
    }

    /// Whether `dispose` has already run
    pub fn is_disposed(&self) -> bool {
        self.task.is_none()
    }

    /// Switch between solid, wireframe, and combined display
    ///
    /// Only flips which draw calls the next frame issues; no geometry is
    /// rebuilt or re-uploaded.
    pub fn set_display_mode(&self, mode: DisplayMode) {
        lock(&self.shared).mode = mode;
    }

    pub fn display_mode(&self) -> DisplayMode {
        lock(&self.shared).mode
    }
}

impl Dispose for ViewerHandle {
    fn dispose(&mut self) {
        self.teardown();
    }
}

impl Drop for ViewerHandle {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[derive(Debug, Clone, Copy)]
struct ViewSnapshot {
    width: u32,
    height: u32,
    mode: DisplayMode,
    resized: bool,
}

/// Offscreen renderer owned by the render task closure
struct FrameRenderer {
    gpu: GpuContext,
    camera: OrthoCamera,
    model: Matrix4<f32>,
    background: wgpu::Color,
    surface_pipeline: wgpu::RenderPipeline,
    line_pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    surface_vertices: wgpu::Buffer,
    surface_indices: wgpu::Buffer,
    surface_index_count: u32,
    edge_indices: wgpu::Buffer,
    edge_index_count: u32,
    axis_vertices: wgpu::Buffer,
    axis_vertex_count: u32,
    color_view: wgpu::TextureView,
    depth_view: wgpu::TextureView,
}

const COLOR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;
const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

impl FrameRenderer {
    fn new(
        gpu: GpuContext,
        geometry: SceneGeometry,
        config: &ViewerConfig,
        width: u32,
        height: u32,
    ) -> Self {
        let aspect = width as f32 / height as f32;
        let camera = OrthoCamera::framed(geometry.half_extent * 2.0, aspect);

        let shader = gpu.create_shader_module("scene shader", SCENE_SHADER);

        let bind_group_layout =
            gpu.device
                .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some("scene bind group layout"),
                    entries: &[wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: false,
                            min_binding_size: None,
                        },
                        count: None,
                    }],
                });

        let pipeline_layout = gpu
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("scene pipeline layout"),
                bind_group_layouts: &[&bind_group_layout],
                push_constant_ranges: &[],
            });

        let surface_pipeline = create_pipeline(
            &gpu.device,
            &pipeline_layout,
            &shader,
            "fs_lit",
            wgpu::PrimitiveTopology::TriangleList,
            "surface pipeline",
        );
        let line_pipeline = create_pipeline(
            &gpu.device,
            &pipeline_layout,
            &shader,
            "fs_flat",
            wgpu::PrimitiveTopology::LineList,
            "line pipeline",
        );

        let uniform = scene_uniform(&camera, &geometry.model);
        let uniform_buffer = gpu.create_buffer_init(
            "scene uniform",
            bytemuck::bytes_of(&uniform),
            wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        );
        let bind_group = gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("scene bind group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let surface_vertices = gpu.create_buffer_init(
            "surface vertices",
            bytemuck::cast_slice(&geometry.surface_vertices),
            wgpu::BufferUsages::VERTEX,
        );
        let surface_indices = gpu.create_buffer_init(
            "surface indices",
            bytemuck::cast_slice(&geometry.surface_indices),
            wgpu::BufferUsages::INDEX,
        );
        let edge_indices = gpu.create_buffer_init(
            "edge indices",
            bytemuck::cast_slice(&geometry.edge_indices),
            wgpu::BufferUsages::INDEX,
        );
        let axis_vertices = gpu.create_buffer_init(
            "axis vertices",
            bytemuck::cast_slice(&geometry.axis_vertices),
            wgpu::BufferUsages::VERTEX,
        );

        let (color_view, depth_view) = create_targets(&gpu.device, width, height);

        Self {
            gpu,
            camera,
            model: geometry.model,
            background: wgpu::Color {
                r: config.background[0],
                g: config.background[1],
                b: config.background[2],
                a: config.background[3],
            },
            surface_pipeline,
            line_pipeline,
            uniform_buffer,
            bind_group,
            surface_vertices,
            surface_indices,
            surface_index_count: geometry.surface_indices.len() as u32,
            edge_indices,
            edge_index_count: geometry.edge_indices.len() as u32,
            axis_vertices,
            axis_vertex_count: geometry.axis_vertices.len() as u32,
            color_view,
            depth_view,
        }
    }

    fn render(&mut self, snapshot: &ViewSnapshot) -> Result<()> {
        if snapshot.resized {
            self.camera
                .set_aspect(snapshot.width as f32 / snapshot.height as f32);
            let (color_view, depth_view) =
                create_targets(&self.gpu.device, snapshot.width, snapshot.height);
            self.color_view = color_view;
            self.depth_view = depth_view;
        }

        let uniform = scene_uniform(&self.camera, &self.model);
        self.gpu
            .queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniform));

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame encoder"),
            });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("frame pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.color_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.background),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            pass.set_bind_group(0, &self.bind_group, &[]);

            if snapshot.mode.draws_surface() {
                pass.set_pipeline(&self.surface_pipeline);
                pass.set_vertex_buffer(0, self.surface_vertices.slice(..));
                pass.set_index_buffer(self.surface_indices.slice(..), wgpu::IndexFormat::Uint32);
                pass.draw_indexed(0..self.surface_index_count, 0, 0..1);
            }

            if snapshot.mode.draws_edges() {
                pass.set_pipeline(&self.line_pipeline);
                pass.set_vertex_buffer(0, self.surface_vertices.slice(..));
                pass.set_index_buffer(self.edge_indices.slice(..), wgpu::IndexFormat::Uint32);
                pass.draw_indexed(0..self.edge_index_count, 0, 0..1);
            }

            pass.set_pipeline(&self.line_pipeline);
            pass.set_vertex_buffer(0, self.axis_vertices.slice(..));
            pass.draw(0..self.axis_vertex_count, 0..1);
        }

        self.gpu.queue.submit(std::iter::once(encoder.finish()));
        Ok(())
    }
}

fn scene_uniform(camera: &OrthoCamera, model: &Matrix4<f32>) -> SceneUniform {
    let light: Vector3<f32> = Vector3::new(1.0, 1.0, 1.0).normalize();
    SceneUniform {
        view_proj: camera.view_proj().into(),
        model: (*model).into(),
        light_dir: [light.x, light.y, light.z],
        ambient: 0.25,
    }
}

fn create_targets(
    device: &wgpu::Device,
    width: u32,
    height: u32,
) -> (wgpu::TextureView, wgpu::TextureView) {
    let size = wgpu::Extent3d {
        width,
        height,
        depth_or_array_layers: 1,
    };
    let color = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("color target"),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: COLOR_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
        view_formats: &[],
    });
    let depth = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("depth target"),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    (
        color.create_view(&wgpu::TextureViewDescriptor::default()),
        depth.create_view(&wgpu::TextureViewDescriptor::default()),
    )
}

fn create_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    fragment_entry: &str,
    topology: wgpu::PrimitiveTopology,
    label: &str,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: "vs_main",
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            buffers: &[SceneVertex::desc()],
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: fragment_entry,
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format: COLOR_FORMAT,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState {
            topology,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
    })
}
