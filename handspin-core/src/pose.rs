//! Per-tick display pose: smoothed rotation plus a cosmetic idle bob.
use nalgebra::Matrix4;

use crate::estimator::RotationEstimator;
use crate::landmarks::HandLandmarks;
use crate::transform::{RotationState, Transform};

pub const BOB_AMPLITUDE: f32 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DisplayPose {
    pub rotation: RotationState,
    /// Vertical offset of the pivot, independent of rotation.
    pub bob_offset: f32,
}

impl DisplayPose {
    /// `T(0, bob, 0) * R(rotation) * S(display_scale)`, applied on top of the
    /// normalized scene's own (centering) transforms. The bob is in display
    /// units and does not grow with the asset's scale.
    pub fn model_matrix(&self, display_scale: f32) -> Matrix4<f32> {
        Transform::translation_matrix(0.0, self.bob_offset, 0.0)
            * Transform::rotation_matrix(&self.rotation)
            * Transform::uniform_scale_matrix(display_scale)
    }
}

/// Owns the rotation state shared by the detection and render paths.
///
/// `observe` is the detection-side writer, `tick` the render-side reader.
/// Both take `&mut self`, so a frame's target update always completes before
/// the render tick that reads it.
#[derive(Debug, Clone)]
pub struct PoseDriver {
    estimator: RotationEstimator,
    bob_amplitude: f32,
    clock: f32,
}

impl PoseDriver {
    pub fn new(smoothing_rate: f32, bob_amplitude: f32) -> Self {
        Self {
            estimator: RotationEstimator::new(smoothing_rate),
            bob_amplitude,
            clock: 0.0,
        }
    }

    pub fn observe(&mut self, hands: &[HandLandmarks]) -> Option<RotationState> {
        self.estimator.observe(hands)
    }

    pub fn estimator(&self) -> &RotationEstimator {
        &self.estimator
    }

    pub fn estimator_mut(&mut self) -> &mut RotationEstimator {
        &mut self.estimator
    }

    /// Seconds of render time accumulated so far.
    pub fn elapsed(&self) -> f32 {
        self.clock
    }

    pub fn tick(&mut self, dt: f32) -> DisplayPose {
        if dt > 0.0 {
            self.clock += dt;
        }
        DisplayPose {
            rotation: self.estimator.advance(dt),
            bob_offset: self.clock.sin() * self.bob_amplitude,
        }
    }
}

impl Default for PoseDriver {
    fn default() -> Self {
        Self::new(crate::estimator::SMOOTHING_RATE, BOB_AMPLITUDE)
    }
}
