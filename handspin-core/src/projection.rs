//! Camera and projection utilities
use nalgebra::{Matrix4, Point3, Vector3};

use crate::normalize::TARGET_SIZE;

/// Projection mode for rendering
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProjectionMode {
    Orthographic,
    Perspective,
}

/// A screen-space sample produced by [`Camera::project_to_screen`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenPoint {
    pub x: f32,
    pub y: f32,
    /// NDC depth, smaller is nearer
    pub depth: f32,
}

/// Camera looking down -Z at the pivot of the displayed object
#[derive(Debug, Clone)]
pub struct Camera {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    pub up: Vector3<f32>,
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub mode: ProjectionMode,
}

impl Camera {
    pub fn new(width: u32, height: u32) -> Self {
        Self::framing(width as f32 / height.max(1) as f32, TARGET_SIZE)
    }

    /// Far enough back that a `size`-wide object, rotating freely, stays in view.
    pub fn framing(aspect: f32, size: f32) -> Self {
        let fov = std::f32::consts::PI / 4.0; // 45 degrees
        // bounding sphere of a size^3 cube, with margin for the idle bob
        let radius = size * 0.5 * 3f32.sqrt() + 0.2;
        let fit_vertical = radius / (fov / 2.0).tan();
        let fit_horizontal = fit_vertical / aspect.min(1.0);
        let distance = fit_vertical.max(fit_horizontal);

        Self {
            position: Point3::new(0.0, 0.0, distance),
            target: Point3::origin(),
            up: Vector3::y(),
            fov,
            aspect,
            near: 0.1,
            far: distance * 4.0,
            mode: ProjectionMode::Perspective,
        }
    }

    /// Terminal cells are roughly twice as tall as they are wide.
    pub fn for_terminal(columns: u16, rows: u16) -> Self {
        let aspect = columns as f32 / (rows.max(1) as f32 * 2.0);
        Self::framing(aspect, TARGET_SIZE)
    }

    /// Create the view matrix (camera transformation)
    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(&self.position, &self.target, &self.up)
    }

    /// Create the projection matrix
    pub fn projection_matrix(&self) -> Matrix4<f32> {
        match self.mode {
            ProjectionMode::Perspective => {
                Matrix4::new_perspective(self.aspect, self.fov, self.near, self.far)
            }
            ProjectionMode::Orthographic => {
                let height = (self.position - self.target).norm() * (self.fov / 2.0).tan() * 2.0;
                let width = height * self.aspect;
                Matrix4::new_orthographic(
                    -width / 2.0,
                    width / 2.0,
                    -height / 2.0,
                    height / 2.0,
                    self.near,
                    self.far,
                )
            }
        }
    }

    pub fn view_projection(&self) -> Matrix4<f32> {
        self.projection_matrix() * self.view_matrix()
    }

    /// Project a point through `model` into a `width` x `height` viewport.
    /// `None` when the point lies outside the view volume.
    pub fn project_to_screen(
        &self,
        point: &Point3<f32>,
        model_matrix: &Matrix4<f32>,
        width: u32,
        height: u32,
    ) -> Option<ScreenPoint> {
        let clip = self.view_projection() * model_matrix * point.to_homogeneous();

        // at or behind the eye
        if clip.w < 1e-6 {
            return None;
        }
        let ndc = clip.xyz() / clip.w;

        if ndc.x.abs() > 1.0 || ndc.y.abs() > 1.0 || ndc.z.abs() > 1.0 {
            return None;
        }

        Some(ScreenPoint {
            x: (ndc.x + 1.0) * 0.5 * width as f32,
            y: (1.0 - ndc.y) * 0.5 * height as f32,
            depth: ndc.z,
        })
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(800, 600)
    }
}
