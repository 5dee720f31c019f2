//! Rotation estimation: hand position to target angles, exponential smoothing
//! toward the target, and duplicate video-frame suppression.
use std::f32::consts::PI;

use crate::landmarks::{HandLandmark, HandLandmarks};
use crate::transform::RotationState;

/// Per-second approach rate of the displayed rotation toward the target.
pub const SMOOTHING_RATE: f32 = 5.0;

/// Full image width spans two turns about Y, full height one turn about X.
pub fn target_rotation(anchor: &HandLandmark) -> RotationState {
    RotationState::new(
        (anchor.y - 0.5) * PI * 2.0,
        (anchor.x - 0.5) * PI * 4.0,
        0.0,
    )
}

/// Target and displayed rotation for one tracked object.
#[derive(Debug, Clone)]
pub struct RotationEstimator {
    target: RotationState,
    current: RotationState,
    rate: f32,
}

impl RotationEstimator {
    /// A rate that is not finite and positive would stall or diverge; it is
    /// replaced by [`SMOOTHING_RATE`].
    pub fn new(rate: f32) -> Self {
        let rate = if rate.is_finite() && rate > 0.0 {
            rate
        } else {
            tracing::warn!(rate, fallback = SMOOTHING_RATE, "invalid smoothing rate");
            SMOOTHING_RATE
        };
        Self {
            target: RotationState::zero(),
            current: RotationState::zero(),
            rate,
        }
    }

    pub fn target(&self) -> RotationState {
        self.target
    }

    pub fn current(&self) -> RotationState {
        self.current
    }

    pub fn rate(&self) -> f32 {
        self.rate
    }

    /// Update the target from a frame's detections. Only the first hand is
    /// used. Without a hand the previous target is kept and `None` returned.
    pub fn observe(&mut self, hands: &[HandLandmarks]) -> Option<RotationState> {
        let hand = hands.first()?;
        self.target = target_rotation(hand.anchor());
        tracing::trace!(x = self.target.x, y = self.target.y, "target rotation");
        Some(self.target)
    }

    /// Advance the displayed rotation by `dt` seconds.
    ///
    /// The step factor `rate * dt` is clamped to 1 so one long frame lands on
    /// the target instead of passing it. Non-positive `dt` is a no-op.
    pub fn advance(&mut self, dt: f32) -> RotationState {
        if dt > 0.0 {
            let factor = (self.rate * dt).min(1.0);
            self.current.approach(&self.target, factor);
        }
        self.current
    }
}

impl Default for RotationEstimator {
    fn default() -> Self {
        Self::new(SMOOTHING_RATE)
    }
}

/// Admits a video frame only when its timestamp differs from the last one
/// admitted, so a fast polling loop does not re-detect the same frame.
/// Non-finite timestamps are never admitted.
#[derive(Debug, Clone, Default)]
pub struct FrameGate {
    last: Option<f64>,
}

impl FrameGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn admit(&mut self, timestamp: f64) -> bool {
        if !timestamp.is_finite() || self.last == Some(timestamp) {
            return false;
        }
        self.last = Some(timestamp);
        true
    }

    pub fn last(&self) -> Option<f64> {
        self.last
    }
}
