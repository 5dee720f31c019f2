/// ASCII rasterizer for terminal rendering
use crossterm::{
    style::{Color, Print, ResetColor, SetForegroundColor},
    QueueableCommand,
};
use handspin_core::{Camera, Material, SceneGraph, ScreenPoint, Side, Triangle};
use nalgebra::{Matrix4, Vector3};
use std::io::Write;

/// Character luminosity ramp for depth/shading (darkest to lightest)
const LUMINOSITY_RAMP: &[char] = &[' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'];

/// Floor so faces turned away from the light are still visible
const AMBIENT: f32 = 0.12;

/// ASCII renderer that converts a normalized scene to terminal characters
pub struct AsciiRenderer {
    width: usize,
    height: usize,
    depth_buffer: Vec<f32>,
    char_buffer: Vec<char>,
    light_dir: Vector3<f32>,
}

impl AsciiRenderer {
    pub fn new(width: usize, height: usize) -> Self {
        let size = width * height;
        Self {
            width,
            height,
            depth_buffer: vec![f32::INFINITY; size],
            char_buffer: vec![' '; size],
            light_dir: Vector3::new(0.3, 0.5, 1.0).normalize(),
        }
    }

    pub fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn clear(&mut self) {
        self.depth_buffer.fill(f32::INFINITY);
        self.char_buffer.fill(' ');
    }

    /// Draw every surface of `scene`, placed by `pose_matrix` on top of the
    /// scene's own world transforms.
    pub fn render_scene(&mut self, scene: &SceneGraph, pose_matrix: &Matrix4<f32>, camera: &Camera) {
        scene.visit(|node| {
            let Some(surface) = node.as_surface() else {
                return;
            };
            let model = pose_matrix * node.world_matrix();
            let default_material = Material::default();
            let material = surface.primary_material().unwrap_or(&default_material);
            for triangle in &surface.geometry.triangles {
                self.render_triangle(triangle, &model, camera, material);
            }
        });
    }

    fn render_triangle(
        &mut self,
        triangle: &Triangle,
        model_matrix: &Matrix4<f32>,
        camera: &Camera,
        material: &Material,
    ) {
        // Project vertices to screen space
        let mut screen = [ScreenPoint { x: 0.0, y: 0.0, depth: 0.0 }; 3];
        for (slot, vertex) in screen.iter_mut().zip(&triangle.vertices) {
            match camera.project_to_screen(
                &vertex.position,
                model_matrix,
                self.width as u32,
                self.height as u32,
            ) {
                Some(point) => *slot = point,
                None => return, // Triangle is clipped
            }
        }

        let normal = model_matrix
            .transform_vector(&triangle.calculate_normal())
            .try_normalize(f32::EPSILON)
            .unwrap_or_else(Vector3::z);
        let facing = normal.dot(&self.light_dir);
        let lit = match material.side {
            Side::Double => facing.abs(),
            Side::Front => facing.max(0.0),
            Side::Back => (-facing).max(0.0),
        };
        let brightness = (AMBIENT + (1.0 - AMBIENT) * lit) * material.luminance().clamp(0.35, 1.0);

        // Map brightness to character
        let char_index = (brightness * (LUMINOSITY_RAMP.len() - 1) as f32).round() as usize;
        let character = LUMINOSITY_RAMP[char_index.clamp(1, LUMINOSITY_RAMP.len() - 1)];

        self.rasterize_triangle(&screen, character);
    }

    fn rasterize_triangle(&mut self, coords: &[ScreenPoint; 3], character: char) {
        let [v0, v1, v2] = *coords;

        // Bounding box
        let min_x = v0.x.min(v1.x).min(v2.x).floor() as i32;
        let max_x = v0.x.max(v1.x).max(v2.x).ceil() as i32;
        let min_y = v0.y.min(v1.y).min(v2.y).floor() as i32;
        let max_y = v0.y.max(v1.y).max(v2.y).ceil() as i32;

        // Clip to screen bounds
        let min_x = min_x.max(0);
        let max_x = max_x.min(self.width as i32 - 1);
        let min_y = min_y.max(0);
        let max_y = max_y.min(self.height as i32 - 1);

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let p = (x as f32 + 0.5, y as f32 + 0.5);

                let Some((w0, w1, w2)) =
                    barycentric((v0.x, v0.y), (v1.x, v1.y), (v2.x, v2.y), p)
                else {
                    continue;
                };
                if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                    continue;
                }

                let depth = w0 * v0.depth + w1 * v1.depth + w2 * v2.depth;
                let idx = y as usize * self.width + x as usize;
                if depth < self.depth_buffer[idx] {
                    self.depth_buffer[idx] = depth;
                    self.char_buffer[idx] = character;
                }
            }
        }
    }

    /// Number of cells covered by geometry since the last clear.
    pub fn covered_cells(&self) -> usize {
        self.depth_buffer.iter().filter(|d| d.is_finite()).count()
    }

    pub fn draw<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        for row in self.char_buffer.chunks(self.width.max(1)) {
            for &c in row {
                // Color based on character intensity
                let color = match c {
                    ' ' | '.' | ':' => Color::DarkGrey,
                    '-' | '=' => Color::Grey,
                    '+' | '*' => Color::White,
                    '#' | '%' | '@' => Color::Cyan,
                    _ => Color::White,
                };

                writer.queue(SetForegroundColor(color))?;
                writer.queue(Print(c))?;
            }
            writer.queue(Print("\r\n"))?;
        }
        writer.queue(ResetColor)?;
        Ok(())
    }
}

/// Calculate barycentric coordinates for a point in a triangle
fn barycentric(
    v0: (f32, f32),
    v1: (f32, f32),
    v2: (f32, f32),
    p: (f32, f32),
) -> Option<(f32, f32, f32)> {
    let denom = (v1.1 - v2.1) * (v0.0 - v2.0) + (v2.0 - v1.0) * (v0.1 - v2.1);

    if denom.abs() < 1e-6 {
        return None;
    }

    let w0 = ((v1.1 - v2.1) * (p.0 - v2.0) + (v2.0 - v1.0) * (p.1 - v2.1)) / denom;
    let w1 = ((v2.1 - v0.1) * (p.0 - v2.0) + (v0.0 - v2.0) * (p.1 - v2.1)) / denom;
    let w2 = 1.0 - w0 - w1;

    Some((w0, w1, w2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use handspin_core::{normalize_scene, DisplayPose, Mesh, NormalizeOptions, RotationState};

    fn cube_model() -> handspin_core::NormalizedModel {
        let scene = SceneGraph::from_mesh("cube", Mesh::cube(10.0), Material::default());
        normalize_scene(&scene, "cube.stl", &NormalizeOptions::default())
    }

    #[test]
    fn normalized_cube_fills_part_of_the_screen() {
        let model = cube_model();
        let camera = Camera::for_terminal(80, 24);
        let mut renderer = AsciiRenderer::new(80, 24);

        let pose = DisplayPose {
            rotation: RotationState::new(0.4, 0.6, 0.0),
            bob_offset: 0.0,
        };
        renderer.render_scene(&model.scene, &pose.model_matrix(model.display_scale), &camera);

        let covered = renderer.covered_cells();
        assert!(covered > 80, "only {covered} cells drawn");
        assert!(covered < 80 * 24);
    }

    #[test]
    fn clear_resets_buffers() {
        let model = cube_model();
        let camera = Camera::for_terminal(40, 12);
        let mut renderer = AsciiRenderer::new(40, 12);
        renderer.render_scene(&model.scene, &DisplayPose::default().model_matrix(model.display_scale), &camera);
        renderer.clear();
        assert_eq!(renderer.covered_cells(), 0);
    }

    #[test]
    fn draw_emits_one_line_per_row() {
        let renderer = AsciiRenderer::new(4, 3);
        let mut out = Vec::new();
        renderer.draw(&mut out).unwrap();
        let text = String::from_utf8_lossy(&out);
        assert_eq!(text.matches("\r\n").count(), 3);
    }

    #[test]
    fn barycentric_inside_and_degenerate() {
        let w = barycentric((0.0, 0.0), (4.0, 0.0), (0.0, 4.0), (1.0, 1.0)).unwrap();
        assert!(w.0 > 0.0 && w.1 > 0.0 && w.2 > 0.0);
        assert!(barycentric((0.0, 0.0), (1.0, 1.0), (2.0, 2.0), (0.5, 0.5)).is_none());
    }
}
