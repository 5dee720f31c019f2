//! Mesh normalization: a centered, display-safe copy plus its display scale.
//!
//! The source scene is never touched. Asset sources cache and hand the same
//! scene to every caller, so mutating it would accumulate drift across reloads.
use std::sync::Arc;

use nalgebra::{Point3, Vector3};

use crate::bounds::Aabb;
use crate::loader::{AssetError, AssetSource};
use crate::scene::{NodeKind, SceneGraph};
use crate::transform::NodeTransform;

/// Edge length of the largest dimension after display scaling.
pub const TARGET_SIZE: f32 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizeOptions {
    pub target_size: f32,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            target_size: TARGET_SIZE,
        }
    }
}

/// A display-ready copy of a source scene.
#[derive(Debug, Clone)]
pub struct NormalizedModel {
    /// Root translation places the geometric center at the origin; unscaled.
    pub scene: SceneGraph,
    /// Applied by the render target around the pivot, not baked into `scene`.
    pub display_scale: f32,
    /// Center of the measured box before centering.
    pub center: Point3<f32>,
    /// Box the center and scale were derived from, before centering.
    pub bounds: Aabb,
    pub source_url: String,
}

/// Scale that maps the largest extent onto `target_size`; 1.0 for a flat or
/// empty box.
pub fn display_scale(bounds: &Aabb, target_size: f32) -> f32 {
    let target_size = if target_size.is_finite() && target_size > 0.0 {
        target_size
    } else {
        TARGET_SIZE
    };
    let max_dim = bounds.max_dimension();
    if max_dim > 0.0 {
        target_size / max_dim
    } else {
        1.0
    }
}

pub fn normalize_scene(
    source: &SceneGraph,
    url: &str,
    options: &NormalizeOptions,
) -> NormalizedModel {
    let mut scene = source.clone();

    scene.visit_mut(|node| {
        if let NodeKind::Surface(surface) = &mut node.kind {
            surface.cast_shadow = true;
            surface.receive_shadow = true;
            for material in &mut surface.materials {
                *material = Arc::new(material.sanitized());
            }
        }
    });

    scene.root.transform = NodeTransform::identity();
    scene.update_world_matrices();

    let surface_bounds = scene.surface_bounds();
    let bounds = if surface_bounds.is_empty() {
        tracing::debug!(url, "no renderable surfaces, measuring full graph");
        scene.node_bounds()
    } else {
        surface_bounds
    };

    let center = bounds.center();
    scene.root.transform.translation -= Vector3::new(center.x, center.y, center.z);
    scene.update_world_matrices();

    let display_scale = display_scale(&bounds, options.target_size);
    tracing::debug!(
        url,
        surfaces = scene.surface_count(),
        center = ?center,
        size = ?bounds.size(),
        display_scale,
        "normalized model"
    );

    NormalizedModel {
        scene,
        display_scale,
        center,
        bounds,
        source_url: url.to_string(),
    }
}

/// Holds the normalized model for the current asset URL.
///
/// Normalization runs again only when the URL changes, never per frame.
#[derive(Debug, Default)]
pub struct ModelSlot {
    options: NormalizeOptions,
    current: Option<NormalizedModel>,
}

impl ModelSlot {
    pub fn new(options: NormalizeOptions) -> Self {
        Self {
            options,
            current: None,
        }
    }

    pub fn load<S: AssetSource>(
        &mut self,
        url: &str,
        source: &mut S,
    ) -> Result<&NormalizedModel, AssetError> {
        let model = match self.current.take() {
            Some(model) if model.source_url == url => model,
            _ => {
                let asset = source.load(url)?;
                normalize_scene(&asset, url, &self.options)
            }
        };
        Ok(&*self.current.insert(model))
    }

    /// `None` until a load succeeds; stays `None` after a failed load.
    pub fn model(&self) -> Option<&NormalizedModel> {
        self.current.as_ref()
    }

    pub fn clear(&mut self) {
        self.current = None;
    }
}
