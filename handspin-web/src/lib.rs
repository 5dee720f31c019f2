/// Handspin Web - WASM bridge for a browser render target
///
/// The page owns the camera, the hand detector and the WebGL scene. This side
/// normalizes the model once, takes landmark frames from the detector and
/// hands back a smoothed pose each animation frame.
use handspin_core::{
    load_scene_bytes, normalize_scene, FrameGate, HandLandmarks, NormalizeOptions,
    NormalizedModel, PoseDriver, SceneGraph,
};
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
pub struct HandSpinViewer {
    model: NormalizedModel,
    pose: PoseDriver,
    gate: FrameGate,
    tracking_ready: bool,
}

#[wasm_bindgen]
impl HandSpinViewer {
    /// Decode and normalize a fetched model. `url` selects the format.
    #[wasm_bindgen(constructor)]
    pub fn new(url: &str, bytes: &[u8]) -> Result<HandSpinViewer, JsValue> {
        let scene = load_scene_bytes(url, bytes).map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(Self::from_scene(&scene, url))
    }

    pub fn display_scale(&self) -> f32 {
        self.model.display_scale
    }

    /// Center of the source model before centering, as `[x, y, z]`.
    pub fn center(&self) -> Vec<f32> {
        let c = self.model.center;
        vec![c.x, c.y, c.z]
    }

    /// Centered triangle soup, nine floats per triangle, unscaled.
    pub fn positions(&self) -> Vec<f32> {
        let mut out = Vec::new();
        self.model.scene.visit(|node| {
            let Some(surface) = node.as_surface() else {
                return;
            };
            let world = node.world_matrix();
            for triangle in &surface.geometry.triangles {
                for p in triangle.positions() {
                    let p = world.transform_point(&p);
                    out.extend_from_slice(&[p.x, p.y, p.z]);
                }
            }
        });
        out
    }

    /// Called once the page's detector and camera are both up.
    pub fn mark_ready(&mut self) {
        self.tracking_ready = true;
    }

    pub fn is_ready(&self) -> bool {
        self.tracking_ready
    }

    /// The page could not start tracking; the model keeps rendering.
    pub fn report_tracking_failure(&mut self, message: &str) {
        self.tracking_ready = false;
        log_error(message);
    }

    /// Feed one detector result: 21 landmarks as flat `x, y, z` triples for
    /// the first hand, or an empty slice when no hand is visible. Returns
    /// whether the target rotation changed.
    pub fn on_video_frame(&mut self, video_time: f64, landmarks: &[f32]) -> bool {
        if !self.tracking_ready || !self.gate.admit(video_time) {
            return false;
        }
        let hands: Vec<HandLandmarks> = HandLandmarks::from_flat(landmarks).into_iter().collect();
        self.pose.observe(&hands).is_some()
    }

    /// Advance smoothing by `dt` seconds: `[rot_x, rot_y, rot_z, bob_offset]`.
    pub fn render_tick(&mut self, dt: f32) -> Vec<f32> {
        let pose = self.pose.tick(dt);
        vec![
            pose.rotation.x,
            pose.rotation.y,
            pose.rotation.z,
            pose.bob_offset,
        ]
    }
}

impl HandSpinViewer {
    fn from_scene(scene: &SceneGraph, url: &str) -> Self {
        Self {
            model: normalize_scene(scene, url, &NormalizeOptions::default()),
            pose: PoseDriver::default(),
            gate: FrameGate::new(),
            tracking_ready: false,
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn log_error(message: &str) {
    web_sys::console::error_1(&JsValue::from_str(message));
}

#[cfg(not(target_arch = "wasm32"))]
fn log_error(message: &str) {
    eprintln!("{message}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use handspin_core::{Material, Mesh};

    fn viewer() -> HandSpinViewer {
        let scene = SceneGraph::from_mesh("cube", Mesh::cube(2.0), Material::default());
        HandSpinViewer::from_scene(&scene, "cube.stl")
    }

    fn hand_at(x: f32, y: f32) -> Vec<f32> {
        HandLandmarks::around_anchor(x, y)
            .points()
            .iter()
            .flat_map(|p| [p.x, p.y, p.z])
            .collect()
    }

    #[test]
    fn cube_is_scaled_to_target() {
        let v = viewer();
        assert!((v.display_scale() - 2.0).abs() < 1e-5);
        assert_eq!(v.positions().len(), 12 * 9);
    }

    #[test]
    fn frames_ignored_until_ready() {
        let mut v = viewer();
        assert!(!v.on_video_frame(0.1, &hand_at(0.9, 0.5)));
        v.mark_ready();
        assert!(v.on_video_frame(0.1, &hand_at(0.9, 0.5)));
    }

    #[test]
    fn repeated_video_time_is_skipped() {
        let mut v = viewer();
        v.mark_ready();
        assert!(v.on_video_frame(0.5, &hand_at(0.9, 0.5)));
        assert!(!v.on_video_frame(0.5, &hand_at(0.1, 0.5)));
    }

    #[test]
    fn empty_frame_keeps_target() {
        let mut v = viewer();
        v.mark_ready();
        v.on_video_frame(0.1, &hand_at(1.0, 0.5));
        assert!(!v.on_video_frame(0.2, &[]));
        let pose = v.render_tick(1.0);
        assert!((pose[1] - std::f32::consts::PI * 2.0).abs() < 1e-4);
        assert_eq!(pose[2], 0.0);
    }
}
