//! Asset loading: format dispatch and a URL-keyed cache.
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use crate::gltf_import;
use crate::material::Material;
use crate::scene::SceneGraph;
use crate::stl;

/// Errors from loading a model asset.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("glTF import error: {0}")]
    Gltf(#[from] gltf::Error),
    #[error("unsupported model format: {0}")]
    UnsupportedFormat(String),
}

/// Supplies loaded scenes by URL. Implementations may cache; callers must
/// treat the returned scene as shared and never mutate it.
pub trait AssetSource {
    fn load(&mut self, url: &str) -> Result<Arc<SceneGraph>, AssetError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelFormat {
    Stl,
    Gltf,
}

impl ModelFormat {
    pub fn from_url(url: &str) -> Result<Self, AssetError> {
        let path = url.split(['?', '#']).next().unwrap_or(url);
        let ext = Path::new(path)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("stl") => Ok(Self::Stl),
            Some("gltf") | Some("glb") => Ok(Self::Gltf),
            _ => Err(AssetError::UnsupportedFormat(url.to_string())),
        }
    }
}

/// Decode an in-memory asset, picking the format from the URL extension.
pub fn load_scene_bytes(url: &str, bytes: &[u8]) -> Result<SceneGraph, AssetError> {
    let scene = match ModelFormat::from_url(url)? {
        ModelFormat::Stl => {
            let mesh = stl::parse_stl(bytes)?;
            let name = Path::new(url)
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("stl");
            SceneGraph::from_mesh(name, mesh, Material::new("stl"))
        }
        ModelFormat::Gltf => gltf_import::import_slice(bytes)?,
    };
    tracing::debug!(
        url,
        nodes = scene.node_count(),
        surfaces = scene.surface_count(),
        "decoded model asset"
    );
    Ok(scene)
}

/// Loads assets from the filesystem and caches them by URL.
#[derive(Debug, Default)]
pub struct FileAssetSource {
    cache: HashMap<String, Arc<SceneGraph>>,
}

impl FileAssetSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cached(&self) -> usize {
        self.cache.len()
    }
}

impl AssetSource for FileAssetSource {
    fn load(&mut self, url: &str) -> Result<Arc<SceneGraph>, AssetError> {
        if let Some(scene) = self.cache.get(url) {
            tracing::trace!(url, "asset cache hit");
            return Ok(Arc::clone(scene));
        }

        let scene = match ModelFormat::from_url(url)? {
            // .gltf may reference sibling .bin / image files
            ModelFormat::Gltf => gltf_import::import_path(url)?,
            ModelFormat::Stl => load_scene_bytes(url, &std::fs::read(url)?)?,
        };
        let scene = Arc::new(scene);
        self.cache.insert(url.to_string(), Arc::clone(&scene));
        tracing::info!(url, surfaces = scene.surface_count(), "loaded model");
        Ok(scene)
    }
}
