//! Camera utilities for step viewers

use nalgebra::{Matrix4, Orthographic3, Point3, Vector3};

/// Padding applied around the framed model, as a fraction of its size
pub const FRAME_PADDING: f32 = 1.2;

/// An orthographic camera framed to a model's bounding extent
///
/// The camera sits on the isometric-style diagonal (d, d, d) looking at the
/// origin, where `d` is the largest bounding-box dimension plus padding.
/// Every step viewer gets the same framing so models of different native
/// units render at comparable visual size.
#[derive(Debug, Clone)]
pub struct OrthoCamera {
    pub half_extent: f32,
    pub aspect: f32,
    pub eye: Point3<f32>,
    pub target: Point3<f32>,
    pub up: Vector3<f32>,
    pub near: f32,
    pub far: f32,
}

impl OrthoCamera {
    /// Frame a camera around a centered model of the given largest dimension
    pub fn framed(largest_dimension: f32, aspect: f32) -> Self {
        let d = largest_dimension * FRAME_PADDING;
        Self {
            half_extent: d,
            aspect,
            eye: Point3::new(d, d, d),
            target: Point3::new(0.0, 0.0, 0.0),
            up: Vector3::new(0.0, 1.0, 0.0),
            near: 0.1,
            far: 1000.0,
        }
    }

    /// Get the view matrix
    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(&self.eye, &self.target, &self.up)
    }

    /// Get the projection matrix
    pub fn projection_matrix(&self) -> Matrix4<f32> {
        let d = self.half_extent;
        Orthographic3::new(-d * self.aspect, d * self.aspect, -d, d, self.near, self.far)
            .into_inner()
    }

    /// Combined view-projection matrix
    pub fn view_proj(&self) -> Matrix4<f32> {
        self.projection_matrix() * self.view_matrix()
    }

    /// Update the aspect ratio after a mount resize
    pub fn set_aspect(&mut self, aspect: f32) {
        self.aspect = aspect;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Point3;

    #[test]
    fn test_framing_adds_padding() {
        let camera = OrthoCamera::framed(2.0, 1.0);
        assert_relative_eq!(camera.half_extent, 2.4);
        assert_relative_eq!(camera.eye.x, 2.4);
        assert_relative_eq!(camera.eye.y, 2.4);
        assert_relative_eq!(camera.eye.z, 2.4);
    }

    #[test]
    fn test_target_projects_to_center() {
        let camera = OrthoCamera::framed(1.0, 16.0 / 9.0);
        let clip = camera.view_proj() * Point3::new(0.0, 0.0, 0.0).to_homogeneous();
        assert_relative_eq!(clip.x, 0.0, epsilon = 1e-5);
        assert_relative_eq!(clip.y, 0.0, epsilon = 1e-5);
    }

    #[test]
    fn test_aspect_widens_horizontal_bounds_only() {
        let mut camera = OrthoCamera::framed(1.0, 1.0);
        let view = camera.view_matrix();
        // A point at the right edge of the square frustum, in view space.
        let edge = view.try_inverse().unwrap() * Point3::new(1.2, 0.0, -2.0).to_homogeneous();
        let at_edge = camera.view_proj() * edge;
        assert_relative_eq!(at_edge.x, 1.0, epsilon = 1e-4);

        camera.set_aspect(2.0);
        let widened = camera.view_proj() * edge;
        assert_relative_eq!(widened.x, 0.5, epsilon = 1e-4);
    }
}
