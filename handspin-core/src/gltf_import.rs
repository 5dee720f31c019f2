//! glTF / GLB import into the scene graph.
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use gltf::buffer::Data;
use gltf::material::AlphaMode;
use nalgebra::{Quaternion, UnitQuaternion, Vector3};

use crate::geometry::Mesh;
use crate::loader::AssetError;
use crate::material::{Material, Side};
use crate::scene::{SceneGraph, SceneNode, Surface};
use crate::transform::NodeTransform;

/// Import a `.gltf` (with external buffers resolved next to it) or `.glb`.
pub fn import_path(path: impl AsRef<Path>) -> Result<SceneGraph, AssetError> {
    let (document, buffers, _images) = gltf::import(path)?;
    build_scene(&document, &buffers)
}

/// Import a self-contained GLB or glTF with embedded buffers.
pub fn import_slice(bytes: &[u8]) -> Result<SceneGraph, AssetError> {
    let (document, buffers, _images) = gltf::import_slice(bytes)?;
    build_scene(&document, &buffers)
}

/// Materials keyed by glTF index so nodes share instances the way the file
/// does. `None` is the glTF default material.
type MaterialTable = HashMap<Option<usize>, Arc<Material>>;

fn build_scene(document: &gltf::Document, buffers: &[Data]) -> Result<SceneGraph, AssetError> {
    let mut materials = MaterialTable::new();
    let scene = document
        .default_scene()
        .or_else(|| document.scenes().next());

    let mut root = SceneNode::group(
        scene
            .as_ref()
            .and_then(|s| s.name())
            .unwrap_or("scene"),
    );
    if let Some(scene) = scene {
        for node in scene.nodes() {
            root.children.push(convert_node(&node, buffers, &mut materials)?);
        }
    } else {
        tracing::warn!("glTF document has no scenes");
    }

    Ok(SceneGraph::new(root))
}

fn convert_node(
    node: &gltf::Node,
    buffers: &[Data],
    materials: &mut MaterialTable,
) -> Result<SceneNode, AssetError> {
    let name = node
        .name()
        .map(str::to_string)
        .unwrap_or_else(|| format!("node_{}", node.index()));
    let (t, r, s) = node.transform().decomposed();
    let transform = NodeTransform {
        translation: Vector3::from(t),
        rotation: UnitQuaternion::from_quaternion(Quaternion::new(r[3], r[0], r[1], r[2])),
        scale: Vector3::from(s),
    };

    let mut surfaces = Vec::new();
    if let Some(mesh) = node.mesh() {
        for primitive in mesh.primitives() {
            if let Some(surface) = convert_primitive(&primitive, buffers, materials)? {
                surfaces.push(surface);
            }
        }
    }

    // One primitive maps onto the node itself; several become child surfaces.
    let mut out = if surfaces.len() == 1 {
        let surface = surfaces.remove(0);
        SceneNode::surface(name, surface)
    } else {
        let mut group = SceneNode::group(name.clone());
        for (i, surface) in surfaces.into_iter().enumerate() {
            group
                .children
                .push(SceneNode::surface(format!("{name}_primitive_{i}"), surface));
        }
        group
    };
    out.transform = transform;

    for child in node.children() {
        out.children.push(convert_node(&child, buffers, materials)?);
    }
    Ok(out)
}

fn convert_primitive(
    primitive: &gltf::Primitive,
    buffers: &[Data],
    materials: &mut MaterialTable,
) -> Result<Option<Surface>, AssetError> {
    if primitive.mode() != gltf::mesh::Mode::Triangles {
        tracing::debug!(mode = ?primitive.mode(), "skipping non-triangle primitive");
        return Ok(None);
    }

    let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|data| &data.0[..]));
    let positions: Vec<[f32; 3]> = match reader.read_positions() {
        Some(iter) => iter.collect(),
        None => return Err(AssetError::Parse("primitive without POSITION".into())),
    };
    let indices: Vec<u32> = match reader.read_indices() {
        Some(indices) => indices.into_u32().collect(),
        None => (0..positions.len() as u32).collect(),
    };

    let material = convert_material(&primitive.material(), materials);
    Ok(Some(Surface::new(
        Arc::new(Mesh::from_indexed(&positions, &indices)),
        material,
    )))
}

fn convert_material(material: &gltf::Material, table: &mut MaterialTable) -> Arc<Material> {
    let key = material.index();
    if let Some(existing) = table.get(&key) {
        return Arc::clone(existing);
    }

    let base_color = material.pbr_metallic_roughness().base_color_factor();
    let transparent = matches!(material.alpha_mode(), AlphaMode::Blend);
    let converted = Arc::new(Material {
        name: material.name().unwrap_or("default").to_string(),
        base_color,
        opacity: if transparent { base_color[3] } else { 1.0 },
        transparent,
        side: if material.double_sided() {
            Side::Double
        } else {
            Side::Front
        },
        ..Material::default()
    });
    table.insert(key, Arc::clone(&converted));
    converted
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;

    /// A glTF with one triangle buffer used by two nodes and two materials.
    fn sample_gltf() -> String {
        // 3 vertices * 3 f32 little endian: (0,0,0) (1,0,0) (0,1,0)
        let uri = "data:application/octet-stream;base64,AAAAAAAAAAAAAAAAAACAPwAAAAAAAAAAAAAAAAAAgD8AAAAA";
        format!(
            r#"{{
  "asset": {{ "version": "2.0" }},
  "scene": 0,
  "scenes": [{{ "name": "demo", "nodes": [0] }}],
  "nodes": [
    {{ "name": "holder", "translation": [5.0, 0.0, 0.0], "children": [1, 2] }},
    {{ "name": "a", "mesh": 0 }},
    {{ "name": "b", "mesh": 1, "scale": [2.0, 2.0, 2.0] }}
  ],
  "meshes": [
    {{ "primitives": [{{ "attributes": {{ "POSITION": 0 }}, "material": 0 }}] }},
    {{ "primitives": [{{ "attributes": {{ "POSITION": 0 }}, "material": 1 }}] }}
  ],
  "materials": [
    {{ "name": "ghost", "alphaMode": "BLEND", "pbrMetallicRoughness": {{ "baseColorFactor": [1.0, 1.0, 1.0, 0.25] }} }},
    {{ "name": "solid", "doubleSided": true }}
  ],
  "accessors": [{{
    "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
    "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0]
  }}],
  "bufferViews": [{{ "buffer": 0, "byteLength": 36 }}],
  "buffers": [{{ "byteLength": 36, "uri": "{uri}" }}]
}}"#
        )
    }

    #[test]
    fn imports_hierarchy_and_transforms() {
        let scene = import_slice(sample_gltf().as_bytes()).unwrap();
        assert_eq!(scene.root.name, "demo");
        assert_eq!(scene.surface_count(), 2);

        let holder = &scene.root.children[0];
        assert_eq!(holder.name, "holder");
        assert_eq!(holder.transform.translation.x, 5.0);
        assert_eq!(holder.children.len(), 2);

        let bounds = scene.surface_bounds();
        assert!((bounds.min - Point3::new(5.0, 0.0, 0.0)).norm() < 1e-5);
        assert!((bounds.max - Point3::new(7.0, 2.0, 0.0)).norm() < 1e-5);
    }

    #[test]
    fn imports_material_flags() {
        let scene = import_slice(sample_gltf().as_bytes()).unwrap();
        let materials = scene.materials();
        assert_eq!(materials.len(), 2);

        let ghost = &materials[0];
        assert_eq!(ghost.name, "ghost");
        assert!(ghost.transparent);
        assert!((ghost.opacity - 0.25).abs() < 1e-6);
        assert_eq!(ghost.side, Side::Front);

        let solid = &materials[1];
        assert!(!solid.transparent);
        assert_eq!(solid.side, Side::Double);
    }

    #[test]
    fn garbage_is_an_error() {
        assert!(import_slice(b"not a model").is_err());
    }
}
