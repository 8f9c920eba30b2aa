//! Decoded surface meshes
//!
//! Meshes arrive as flat buffers straight out of the decoder: vertex
//! coordinates as consecutive float triples and triangles as consecutive
//! index triples. Normal computation is deliberately absent here; the
//! viewer derives normals when it builds a scene.

use nalgebra::Point3;
use serde::{Deserialize, Serialize};

/// A triangulated surface with flat vertex and index buffers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfaceMesh {
    /// Vertex coordinates, three floats per vertex
    pub vertices: Vec<f32>,
    /// Triangle indices, three per triangle
    pub triangles: Vec<u32>,
}

impl SurfaceMesh {
    /// Create a mesh from flat buffers
    pub fn new(vertices: Vec<f32>, triangles: Vec<u32>) -> Self {
        Self { vertices, triangles }
    }

    /// Number of vertices
    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / 3
    }

    /// Number of triangles
    pub fn triangle_count(&self) -> usize {
        self.triangles.len() / 3
    }

    /// Check if the mesh has no renderable surface
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() || self.triangles.is_empty()
    }

    /// Position of one vertex
    pub fn position(&self, index: usize) -> Point3<f32> {
        let i = index * 3;
        Point3::new(self.vertices[i], self.vertices[i + 1], self.vertices[i + 2])
    }

    /// Axis-aligned bounding box over all vertices
    pub fn bounds(&self) -> Aabb {
        let mut bounds = Aabb::empty();
        for i in 0..self.vertex_count() {
            bounds.extend(&self.position(i));
        }
        bounds
    }
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Point3<f32>,
    pub max: Point3<f32>,
}

impl Aabb {
    /// An inverted box that any extend() call will overwrite
    pub fn empty() -> Self {
        Self {
            min: Point3::new(f32::INFINITY, f32::INFINITY, f32::INFINITY),
            max: Point3::new(f32::NEG_INFINITY, f32::NEG_INFINITY, f32::NEG_INFINITY),
        }
    }

    /// Grow the box to contain a point
    pub fn extend(&mut self, p: &Point3<f32>) {
        self.min = Point3::new(self.min.x.min(p.x), self.min.y.min(p.y), self.min.z.min(p.z));
        self.max = Point3::new(self.max.x.max(p.x), self.max.y.max(p.y), self.max.z.max(p.z));
    }

    /// Extent along each axis
    pub fn size(&self) -> [f32; 3] {
        [
            self.max.x - self.min.x,
            self.max.y - self.min.y,
            self.max.z - self.min.z,
        ]
    }

    /// Largest of the three extents
    pub fn largest_dimension(&self) -> f32 {
        let [x, y, z] = self.size();
        x.max(y).max(z)
    }

    /// Geometric center
    pub fn center(&self) -> Point3<f32> {
        Point3::new(
            (self.min.x + self.max.x) * 0.5,
            (self.min.y + self.max.y) * 0.5,
            (self.min.z + self.max.z) * 0.5,
        )
    }
}
