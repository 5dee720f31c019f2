//! Scene graph: groups and renderable surfaces with cached world matrices.
//!
//! Cloning a [`SceneGraph`] is a deep copy of the node tree. Geometry and
//! materials stay behind `Arc`s, so a copy only diverges from its source where
//! it replaces them.
use std::sync::Arc;

use nalgebra::{Matrix4, Point3};

use crate::bounds::Aabb;
use crate::geometry::Mesh;
use crate::material::Material;
use crate::transform::NodeTransform;

/// Drawable geometry with its materials.
#[derive(Debug, Clone)]
pub struct Surface {
    pub geometry: Arc<Mesh>,
    /// At least one entry for a drawable surface.
    pub materials: Vec<Arc<Material>>,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
}

impl Surface {
    pub fn new(geometry: Arc<Mesh>, material: Arc<Material>) -> Self {
        Self {
            geometry,
            materials: vec![material],
            cast_shadow: false,
            receive_shadow: false,
        }
    }

    pub fn primary_material(&self) -> Option<&Material> {
        self.materials.first().map(|m| m.as_ref())
    }
}

#[derive(Debug, Clone)]
pub enum NodeKind {
    Group,
    Surface(Surface),
}

#[derive(Debug, Clone)]
pub struct SceneNode {
    pub name: String,
    pub transform: NodeTransform,
    pub kind: NodeKind,
    pub children: Vec<SceneNode>,
    world: Matrix4<f32>,
}

impl SceneNode {
    pub fn group(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transform: NodeTransform::identity(),
            kind: NodeKind::Group,
            children: Vec::new(),
            world: Matrix4::identity(),
        }
    }

    pub fn surface(name: impl Into<String>, surface: Surface) -> Self {
        Self {
            kind: NodeKind::Surface(surface),
            ..Self::group(name)
        }
    }

    pub fn with_transform(mut self, transform: NodeTransform) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_child(mut self, child: SceneNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn as_surface(&self) -> Option<&Surface> {
        match &self.kind {
            NodeKind::Surface(surface) => Some(surface),
            NodeKind::Group => None,
        }
    }

    /// World matrix as of the last [`SceneGraph::update_world_matrices`].
    pub fn world_matrix(&self) -> &Matrix4<f32> {
        &self.world
    }

    fn update_world(&mut self, parent: &Matrix4<f32>) {
        let world = parent * self.transform.matrix();
        self.world = world;
        for child in &mut self.children {
            child.update_world(&world);
        }
    }

    fn visit<F: FnMut(&SceneNode)>(&self, f: &mut F) {
        f(self);
        for child in &self.children {
            child.visit(f);
        }
    }

    fn visit_mut<F: FnMut(&mut SceneNode)>(&mut self, f: &mut F) {
        f(self);
        for child in &mut self.children {
            child.visit_mut(f);
        }
    }
}

#[derive(Debug, Clone)]
pub struct SceneGraph {
    pub root: SceneNode,
}

impl SceneGraph {
    pub fn new(root: SceneNode) -> Self {
        let mut graph = Self { root };
        graph.update_world_matrices();
        graph
    }

    /// A root group holding one surface.
    pub fn from_mesh(name: &str, mesh: Mesh, material: Material) -> Self {
        let surface = Surface::new(Arc::new(mesh), Arc::new(material));
        Self::new(SceneNode::group(name).with_child(SceneNode::surface(name, surface)))
    }

    /// Pre-order traversal.
    pub fn visit<F: FnMut(&SceneNode)>(&self, mut f: F) {
        self.root.visit(&mut f);
    }

    /// Pre-order traversal. World matrices are not refreshed afterwards.
    pub fn visit_mut<F: FnMut(&mut SceneNode)>(&mut self, mut f: F) {
        self.root.visit_mut(&mut f);
    }

    pub fn update_world_matrices(&mut self) {
        self.root.update_world(&Matrix4::identity());
    }

    pub fn node_count(&self) -> usize {
        let mut count = 0;
        self.visit(|_| count += 1);
        count
    }

    pub fn surface_count(&self) -> usize {
        let mut count = 0;
        self.visit(|node| {
            if node.as_surface().is_some() {
                count += 1;
            }
        });
        count
    }

    /// World-space box over every vertex of every renderable surface.
    ///
    /// Groups contribute nothing, so helper nodes cannot distort the result.
    pub fn surface_bounds(&self) -> Aabb {
        let mut aabb = Aabb::empty();
        self.visit(|node| {
            if let Some(surface) = node.as_surface() {
                for triangle in &surface.geometry.triangles {
                    for vertex in &triangle.vertices {
                        aabb.expand_to(&node.world.transform_point(&vertex.position));
                    }
                }
            }
        });
        aabb
    }

    /// World-space box over every node origin, surfaces or not.
    pub fn node_bounds(&self) -> Aabb {
        let mut aabb = Aabb::empty();
        self.visit(|node| aabb.expand_to(&node.world.transform_point(&Point3::origin())));
        aabb
    }

    /// Every material slot in traversal order (shared instances repeat).
    pub fn materials(&self) -> Vec<Arc<Material>> {
        let mut out = Vec::new();
        self.visit(|node| {
            if let Some(surface) = node.as_surface() {
                out.extend(surface.materials.iter().cloned());
            }
        });
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;

    fn two_cubes() -> SceneGraph {
        let material = Arc::new(Material::default());
        let cube = Arc::new(Mesh::cube(2.0));
        let left = SceneNode::surface("left", Surface::new(cube.clone(), material.clone()))
            .with_transform(NodeTransform::from_translation(-3.0, 0.0, 0.0));
        let right = SceneNode::surface("right", Surface::new(cube, material))
            .with_transform(NodeTransform::from_translation(3.0, 0.0, 0.0));
        SceneGraph::new(
            SceneNode::group("root")
                .with_transform(NodeTransform::from_translation(0.0, 10.0, 0.0))
                .with_child(SceneNode::group("pair").with_child(left).with_child(right)),
        )
    }

    #[test]
    fn counts() {
        let scene = two_cubes();
        assert_eq!(scene.node_count(), 4);
        assert_eq!(scene.surface_count(), 2);
        assert_eq!(scene.materials().len(), 2);
    }

    #[test]
    fn surface_bounds_follow_world_transforms() {
        let bounds = two_cubes().surface_bounds();
        assert!((bounds.min - Point3::new(-4.0, 9.0, -1.0)).norm() < 1e-5);
        assert!((bounds.max - Point3::new(4.0, 11.0, 1.0)).norm() < 1e-5);
    }

    #[test]
    fn node_bounds_cover_origins() {
        let bounds = two_cubes().node_bounds();
        assert!((bounds.min - Point3::new(-3.0, 10.0, 0.0)).norm() < 1e-5);
        assert!((bounds.max - Point3::new(3.0, 10.0, 0.0)).norm() < 1e-5);
    }

    #[test]
    fn world_matrices_refresh_after_edit() {
        let mut scene = two_cubes();
        scene.root.transform = NodeTransform::identity();
        scene.update_world_matrices();
        let bounds = scene.surface_bounds();
        assert!((bounds.center() - Point3::origin()).norm() < 1e-5);
    }

    #[test]
    fn clone_owns_its_tree() {
        let source = two_cubes();
        let mut copy = source.clone();
        copy.root.transform.translation = Vector3::zeros();
        copy.root.children.clear();
        assert_eq!(source.surface_count(), 2);
        assert_eq!(source.root.transform.translation.y, 10.0);
    }

    #[test]
    fn from_mesh_wraps_single_surface() {
        let scene = SceneGraph::from_mesh("cube", Mesh::cube(1.0), Material::default());
        assert_eq!(scene.surface_count(), 1);
        assert!(scene.root.as_surface().is_none());
    }
}
