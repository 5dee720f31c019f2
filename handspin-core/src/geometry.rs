//! Triangle geometry shared by every renderable surface.
use nalgebra::{Point3, Vector3};

use crate::bounds::Aabb;

/// A 3D vertex with position and normal
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub position: Point3<f32>,
    pub normal: Vector3<f32>,
}

impl Vertex {
    pub fn new(x: f32, y: f32, z: f32, nx: f32, ny: f32, nz: f32) -> Self {
        Self {
            position: Point3::new(x, y, z),
            normal: Vector3::new(nx, ny, nz),
        }
    }

    pub fn from_parts(position: Point3<f32>, normal: Vector3<f32>) -> Self {
        Self { position, normal }
    }
}

/// A triangle face defined by three vertices
#[derive(Debug, Clone, PartialEq)]
pub struct Triangle {
    pub vertices: [Vertex; 3],
}

impl Triangle {
    pub fn new(v0: Vertex, v1: Vertex, v2: Vertex) -> Self {
        Self {
            vertices: [v0, v1, v2],
        }
    }

    /// Face normal from winding order. Degenerate faces report +Z.
    pub fn calculate_normal(&self) -> Vector3<f32> {
        let [a, b, c] = self.positions();
        face_normal(&a, &b, &c)
    }

    pub fn positions(&self) -> [Point3<f32>; 3] {
        [
            self.vertices[0].position,
            self.vertices[1].position,
            self.vertices[2].position,
        ]
    }
}

fn face_normal(a: &Point3<f32>, b: &Point3<f32>, c: &Point3<f32>) -> Vector3<f32> {
    (b - a)
        .cross(&(c - a))
        .try_normalize(f32::EPSILON)
        .unwrap_or_else(Vector3::z)
}

/// A 3D mesh composed of triangles
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    pub triangles: Vec<Triangle>,
}

impl Mesh {
    pub fn new() -> Self {
        Self {
            triangles: Vec::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            triangles: Vec::with_capacity(capacity),
        }
    }

    pub fn add_triangle(&mut self, triangle: Triangle) {
        self.triangles.push(triangle);
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Build a flat-shaded triangle list from indexed positions.
    ///
    /// Index triples that reference a missing position are skipped, as is a
    /// trailing partial triple.
    pub fn from_indexed(positions: &[[f32; 3]], indices: &[u32]) -> Self {
        let mut mesh = Self::with_capacity(indices.len() / 3);
        for tri in indices.chunks_exact(3) {
            let corners: Option<Vec<Point3<f32>>> = tri
                .iter()
                .map(|&i| positions.get(i as usize).map(|p| Point3::from(*p)))
                .collect();
            let Some(corners) = corners else {
                continue;
            };
            let normal = face_normal(&corners[0], &corners[1], &corners[2]);
            mesh.add_triangle(Triangle::new(
                Vertex::from_parts(corners[0], normal),
                Vertex::from_parts(corners[1], normal),
                Vertex::from_parts(corners[2], normal),
            ));
        }
        mesh
    }

    /// Local-space bounds of every vertex.
    pub fn bounds(&self) -> Aabb {
        Aabb::from_points(
            self.triangles
                .iter()
                .flat_map(|t| t.vertices.iter().map(|v| v.position)),
        )
    }

    /// Create a cube mesh centered on the local origin
    pub fn cube(size: f32) -> Self {
        let half = size / 2.0;
        let mut mesh = Self::with_capacity(12);

        // (normal, four corners counter-clockwise seen from outside)
        let faces: [([f32; 3], [[f32; 3]; 4]); 6] = [
            (
                [0.0, 0.0, 1.0],
                [[-half, -half, half], [half, -half, half], [half, half, half], [-half, half, half]],
            ),
            (
                [0.0, 0.0, -1.0],
                [[half, -half, -half], [-half, -half, -half], [-half, half, -half], [half, half, -half]],
            ),
            (
                [0.0, 1.0, 0.0],
                [[-half, half, half], [half, half, half], [half, half, -half], [-half, half, -half]],
            ),
            (
                [0.0, -1.0, 0.0],
                [[-half, -half, -half], [half, -half, -half], [half, -half, half], [-half, -half, half]],
            ),
            (
                [1.0, 0.0, 0.0],
                [[half, -half, half], [half, -half, -half], [half, half, -half], [half, half, half]],
            ),
            (
                [-1.0, 0.0, 0.0],
                [[-half, -half, -half], [-half, -half, half], [-half, half, half], [-half, half, -half]],
            ),
        ];

        for ([nx, ny, nz], quad) in faces {
            let v = |p: [f32; 3]| Vertex::new(p[0], p[1], p[2], nx, ny, nz);
            mesh.add_triangle(Triangle::new(v(quad[0]), v(quad[1]), v(quad[2])));
            mesh.add_triangle(Triangle::new(v(quad[0]), v(quad[2]), v(quad[3])));
        }

        mesh
    }
}

impl Default for Mesh {
    fn default() -> Self {
        Self::new()
    }
}
