//! Axis-aligned bounding boxes.
use nalgebra::{Point3, Vector3};

/// Min/max corner pair. An empty box has `min > max` on every axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Point3<f32>,
    pub max: Point3<f32>,
}

impl Aabb {
    pub fn new(min: Point3<f32>, max: Point3<f32>) -> Self {
        Self { min, max }
    }

    pub fn empty() -> Self {
        Self {
            min: Point3::new(f32::INFINITY, f32::INFINITY, f32::INFINITY),
            max: Point3::new(f32::NEG_INFINITY, f32::NEG_INFINITY, f32::NEG_INFINITY),
        }
    }

    pub fn from_points<I>(points: I) -> Self
    where
        I: IntoIterator<Item = Point3<f32>>,
    {
        let mut aabb = Self::empty();
        for point in points {
            aabb.expand_to(&point);
        }
        aabb
    }

    pub fn is_empty(&self) -> bool {
        self.max.x < self.min.x || self.max.y < self.min.y || self.max.z < self.min.z
    }

    pub fn expand_to(&mut self, point: &Point3<f32>) {
        self.min = self.min.inf(point);
        self.max = self.max.sup(point);
    }

    pub fn union(&mut self, other: &Aabb) {
        if other.is_empty() {
            return;
        }
        self.expand_to(&other.min);
        self.expand_to(&other.max);
    }

    /// Midpoint of the box; the origin when empty.
    pub fn center(&self) -> Point3<f32> {
        if self.is_empty() {
            return Point3::origin();
        }
        nalgebra::center(&self.min, &self.max)
    }

    /// Extent along each axis; zero when empty.
    pub fn size(&self) -> Vector3<f32> {
        if self.is_empty() {
            return Vector3::zeros();
        }
        self.max - self.min
    }

    pub fn max_dimension(&self) -> f32 {
        let size = self.size();
        size.x.max(size.y).max(size.z)
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self::empty()
    }
}
