//! Handspin core: normalizes an imported 3D scene for display and turns a
//! tracked hand position into a smoothed rotation of that scene.
//!
//! Two independent stages meet only at the display pose:
//! - [`normalize`] turns a loaded scene into a centered, display-safe copy and
//!   a display scale, once per asset URL;
//! - [`estimator`], [`tracking`] and [`controller`] turn per-frame hand
//!   landmarks into a target rotation and smooth the displayed rotation
//!   toward it every render tick.

pub mod bounds;
pub mod controller;
pub mod estimator;
pub mod geometry;
pub mod gltf_import;
pub mod landmarks;
pub mod loader;
pub mod material;
pub mod normalize;
pub mod pose;
pub mod projection;
pub mod scene;
pub mod stl;
pub mod tracking;
pub mod transform;

// Re-export commonly used types
pub use bounds::Aabb;
pub use controller::{HandSpinController, TrackingConfig, TrackingStatus};
pub use estimator::{target_rotation, FrameGate, RotationEstimator};
pub use geometry::{Mesh, Triangle, Vertex};
pub use landmarks::{HandLandmark, HandLandmarks};
pub use loader::{load_scene_bytes, AssetError, AssetSource, FileAssetSource};
pub use material::{Blending, Material, Side};
pub use normalize::{normalize_scene, ModelSlot, NormalizeOptions, NormalizedModel};
pub use pose::{DisplayPose, PoseDriver};
pub use projection::{Camera, ProjectionMode, ScreenPoint};
pub use scene::{NodeKind, SceneGraph, SceneNode, Surface};
pub use tracking::{
    CameraConstraints, DetectionSession, Facing, FrameOutcome, FrameSource, HandDetector,
    TrackerBackend, TrackingError,
};
pub use transform::{NodeTransform, RotationState, Transform};
