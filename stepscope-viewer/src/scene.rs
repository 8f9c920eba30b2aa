//! Scene geometry preparation
//!
//! Converts a decoded surface mesh into the GPU-ready buffers a step viewer
//! draws: lit surface triangles, a deduplicated wireframe edge set, and the
//! fixed axis helper lines. The model transform normalizes every mesh to a
//! unit-scale, origin-centered frame so the shared camera framing works for
//! any input.

use std::collections::HashSet;

use bytemuck::{Pod, Zeroable};
use nalgebra::{Matrix4, Vector3};
use stepscope_core::{Error, Result, SurfaceMesh};

/// Vertex layout shared by surface, edge, and axis draws
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct SceneVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub color: [f32; 3],
}

impl SceneVertex {
    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<SceneVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 6]>() as wgpu::BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

/// Uniform block consumed by both the lit and flat shader entry points
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct SceneUniform {
    pub view_proj: [[f32; 4]; 4],
    pub model: [[f32; 4]; 4],
    pub light_dir: [f32; 3],
    pub ambient: f32,
}

/// How a step viewer draws its mesh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayMode {
    Solid,
    Wireframe,
    SolidWithEdges,
}

impl DisplayMode {
    pub fn draws_surface(&self) -> bool {
        matches!(self, DisplayMode::Solid | DisplayMode::SolidWithEdges)
    }

    pub fn draws_edges(&self) -> bool {
        matches!(self, DisplayMode::Wireframe | DisplayMode::SolidWithEdges)
    }
}

/// CPU-side geometry for one viewer, ready for buffer upload
pub struct SceneGeometry {
    pub surface_vertices: Vec<SceneVertex>,
    pub surface_indices: Vec<u32>,
    pub edge_indices: Vec<u32>,
    pub axis_vertices: Vec<SceneVertex>,
    pub model: Matrix4<f32>,
    pub half_extent: f32,
}

/// Build renderable geometry from a decoded mesh
///
/// Fails on an empty mesh or one whose bounding box has no extent; such
/// input cannot be framed and would render as nothing.
pub fn build_geometry(mesh: &SurfaceMesh, surface_color: [f32; 3]) -> Result<SceneGeometry> {
    if mesh.is_empty() {
        return Err(Error::Format("mesh has no geometry to display".to_string()));
    }
    let bounds = mesh.bounds();
    let largest = bounds.largest_dimension();
    if largest <= 0.0 {
        return Err(Error::Format(
            "mesh bounding box is degenerate".to_string(),
        ));
    }

    let center = bounds.center();
    let scale = 1.0 / largest;
    let model = Matrix4::new_scaling(scale)
        * Matrix4::new_translation(&Vector3::new(-center.x, -center.y, -center.z));

    let normals = vertex_normals(mesh);
    let surface_vertices = (0..mesh.vertex_count())
        .map(|i| {
            let p = mesh.position(i);
            SceneVertex {
                position: [p.x, p.y, p.z],
                normal: normals[i],
                color: surface_color,
            }
        })
        .collect();

    // The axis aids share the mesh's vertex stage, which applies the model
    // transform. Author them through the inverse so they come out anchored
    // at the world origin at unit length, not displaced by the centering.
    let inverse_model = Matrix4::new_translation(&Vector3::new(center.x, center.y, center.z))
        * Matrix4::new_scaling(largest);

    Ok(SceneGeometry {
        surface_vertices,
        surface_indices: mesh.triangles.clone(),
        edge_indices: unique_edges(&mesh.triangles),
        axis_vertices: axis_lines(&inverse_model),
        model,
        half_extent: 0.5,
    })
}

/// Area-weighted vertex normals from face normal accumulation
fn vertex_normals(mesh: &SurfaceMesh) -> Vec<[f32; 3]> {
    let mut accumulated = vec![Vector3::zeros(); mesh.vertex_count()];

    for face in mesh.triangles.chunks_exact(3) {
        let (a, b, c) = (face[0] as usize, face[1] as usize, face[2] as usize);
        let pa = mesh.position(a);
        let pb = mesh.position(b);
        let pc = mesh.position(c);
        let face_normal = (pb - pa).cross(&(pc - pa));
        accumulated[a] += face_normal;
        accumulated[b] += face_normal;
        accumulated[c] += face_normal;
    }

    accumulated
        .into_iter()
        .map(|n| {
            let length = n.norm();
            if length > 1e-12 {
                let unit = n / length;
                [unit.x, unit.y, unit.z]
            } else {
                [0.0, 0.0, 1.0]
            }
        })
        .collect()
}

/// Deduplicated edge index list for wireframe drawing
fn unique_edges(triangles: &[u32]) -> Vec<u32> {
    let mut seen = HashSet::new();
    let mut edges = Vec::new();
    for face in triangles.chunks_exact(3) {
        for (a, b) in [(face[0], face[1]), (face[1], face[2]), (face[2], face[0])] {
            let key = (a.min(b), a.max(b));
            if seen.insert(key) {
                edges.push(a);
                edges.push(b);
            }
        }
    }
    edges
}

/// Axis helper lines (X red, Y green, Z blue), unit length from the world
/// origin once the model transform is applied
fn axis_lines(inverse_model: &Matrix4<f32>) -> Vec<SceneVertex> {
    const AXES: [([f32; 3], [f32; 3]); 3] = [
        ([1.0, 0.0, 0.0], [1.0, 0.0, 0.0]),
        ([0.0, 1.0, 0.0], [0.0, 1.0, 0.0]),
        ([0.0, 0.0, 1.0], [0.0, 0.0, 1.0]),
    ];
    let place = |world: [f32; 3]| {
        let p = inverse_model.transform_point(&nalgebra::Point3::new(world[0], world[1], world[2]));
        [p.x, p.y, p.z]
    };
    AXES.iter()
        .flat_map(|&(direction, color)| {
            [
                SceneVertex {
                    position: place([0.0, 0.0, 0.0]),
                    normal: [0.0, 0.0, 1.0],
                    color,
                },
                SceneVertex {
                    position: place(direction),
                    normal: [0.0, 0.0, 1.0],
                    color,
                },
            ]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Point3;

    const COLOR: [f32; 3] = [0.5, 0.5, 0.5];

    fn triangle() -> SurfaceMesh {
        SurfaceMesh {
            vertices: vec![0.0, 0.0, 0.0, 2.0, 0.0, 0.0, 0.0, 2.0, 0.0],
            triangles: vec![0, 1, 2],
        }
    }

    fn cube() -> SurfaceMesh {
        let vertices = vec![
            0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 0.0, //
            0.0, 0.0, 1.0, 1.0, 0.0, 1.0, 1.0, 1.0, 1.0, 0.0, 1.0, 1.0,
        ];
        let triangles = vec![
            0, 2, 1, 0, 3, 2, // back
            4, 5, 6, 4, 6, 7, // front
            0, 1, 5, 0, 5, 4, // bottom
            2, 3, 7, 2, 7, 6, // top
            0, 4, 7, 0, 7, 3, // left
            1, 2, 6, 1, 6, 5, // right
        ];
        SurfaceMesh {
            vertices,
            triangles,
        }
    }

    #[test]
    fn test_empty_mesh_rejected() {
        let empty = SurfaceMesh {
            vertices: vec![],
            triangles: vec![],
        };
        assert!(matches!(
            build_geometry(&empty, COLOR),
            Err(Error::Format(_))
        ));
    }

    #[test]
    fn test_degenerate_bounds_rejected() {
        let point = SurfaceMesh {
            vertices: vec![1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0],
            triangles: vec![0, 1, 2],
        };
        assert!(matches!(
            build_geometry(&point, COLOR),
            Err(Error::Format(_))
        ));
    }

    #[test]
    fn test_triangle_has_three_edges() {
        let geometry = build_geometry(&triangle(), COLOR).unwrap();
        assert_eq!(geometry.edge_indices.len(), 6);
        assert_eq!(geometry.surface_indices, vec![0, 1, 2]);
    }

    #[test]
    fn test_cube_edges_deduplicated() {
        // 12 triangles contribute 36 half-edges but a triangulated cube has
        // only 18 distinct edges.
        let geometry = build_geometry(&cube(), COLOR).unwrap();
        assert_eq!(geometry.edge_indices.len(), 36);
        let mut keys: Vec<(u32, u32)> = geometry
            .edge_indices
            .chunks_exact(2)
            .map(|e| (e[0].min(e[1]), e[0].max(e[1])))
            .collect();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), 18);
    }

    #[test]
    fn test_model_transform_normalizes() {
        let geometry = build_geometry(&triangle(), COLOR).unwrap();
        // Bounding box center (1, 1, 0) maps to the origin.
        let centered = geometry.model.transform_point(&Point3::new(1.0, 1.0, 0.0));
        assert_relative_eq!(centered.x, 0.0, epsilon = 1e-6);
        assert_relative_eq!(centered.y, 0.0, epsilon = 1e-6);
        // The 2-unit extent scales to unit size.
        let corner = geometry.model.transform_point(&Point3::new(2.0, 0.0, 0.0));
        assert_relative_eq!(corner.x, 0.5, epsilon = 1e-6);
    }

    #[test]
    fn test_flat_triangle_normals_point_up() {
        let flat = SurfaceMesh {
            vertices: vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0],
            triangles: vec![0, 2, 1],
        };
        let geometry = build_geometry(&flat, COLOR).unwrap();
        for vertex in &geometry.surface_vertices {
            assert_relative_eq!(vertex.normal[1], 1.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_axis_lines_present() {
        let geometry = build_geometry(&triangle(), COLOR).unwrap();
        assert_eq!(geometry.axis_vertices.len(), 6);
        assert_eq!(geometry.axis_vertices[1].color, [1.0, 0.0, 0.0]);
        assert_eq!(geometry.axis_vertices[3].color, [0.0, 1.0, 0.0]);
        assert_eq!(geometry.axis_vertices[5].color, [0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_axes_anchor_at_world_origin() {
        // The triangle's bounding box is centered at (1, 1, 0), so its
        // model transform displaces raw coordinates. The axis vertices must
        // still land on the origin and the unit axis tips after it.
        let geometry = build_geometry(&triangle(), COLOR).unwrap();
        let world = |v: &SceneVertex| {
            geometry
                .model
                .transform_point(&Point3::new(v.position[0], v.position[1], v.position[2]))
        };

        for base in [0, 2, 4] {
            let origin = world(&geometry.axis_vertices[base]);
            assert_relative_eq!(origin.x, 0.0, epsilon = 1e-5);
            assert_relative_eq!(origin.y, 0.0, epsilon = 1e-5);
            assert_relative_eq!(origin.z, 0.0, epsilon = 1e-5);
        }
        let x_tip = world(&geometry.axis_vertices[1]);
        assert_relative_eq!(x_tip.x, 1.0, epsilon = 1e-5);
        assert_relative_eq!(x_tip.y, 0.0, epsilon = 1e-5);
        let y_tip = world(&geometry.axis_vertices[3]);
        assert_relative_eq!(y_tip.y, 1.0, epsilon = 1e-5);
        let z_tip = world(&geometry.axis_vertices[5]);
        assert_relative_eq!(z_tip.z, 1.0, epsilon = 1e-5);
    }
}
