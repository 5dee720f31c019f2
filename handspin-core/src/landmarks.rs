//! Hand landmarks in normalized image space (21-point hand topology).

pub const WRIST: usize = 0;
pub const THUMB_CMC: usize = 1;
pub const THUMB_MCP: usize = 2;
pub const THUMB_IP: usize = 3;
pub const THUMB_TIP: usize = 4;
pub const INDEX_MCP: usize = 5;
pub const INDEX_PIP: usize = 6;
pub const INDEX_DIP: usize = 7;
pub const INDEX_TIP: usize = 8;
pub const MIDDLE_MCP: usize = 9;
pub const MIDDLE_PIP: usize = 10;
pub const MIDDLE_DIP: usize = 11;
pub const MIDDLE_TIP: usize = 12;
pub const RING_MCP: usize = 13;
pub const RING_PIP: usize = 14;
pub const RING_DIP: usize = 15;
pub const RING_TIP: usize = 16;
pub const PINKY_MCP: usize = 17;
pub const PINKY_PIP: usize = 18;
pub const PINKY_DIP: usize = 19;
pub const PINKY_TIP: usize = 20;

pub const LANDMARK_COUNT: usize = 21;

/// The point that drives rotation. The middle-finger base joint moves less
/// than the fingertips and less erratically than the wrist as the hand turns.
pub const ANCHOR: usize = MIDDLE_MCP;

/// Open right hand, palm to camera, offsets from the middle MCP in image units.
const OPEN_HAND_OFFSETS: [(f32, f32); LANDMARK_COUNT] = [
    (0.00, 0.16),   // wrist
    (-0.05, 0.13),  // thumb
    (-0.09, 0.09),
    (-0.12, 0.05),
    (-0.14, 0.02),
    (-0.04, 0.00),  // index
    (-0.05, -0.05),
    (-0.055, -0.08),
    (-0.06, -0.11),
    (0.00, 0.00),   // middle
    (0.00, -0.06),
    (0.00, -0.09),
    (0.00, -0.12),
    (0.035, 0.005), // ring
    (0.045, -0.045),
    (0.05, -0.075),
    (0.055, -0.10),
    (0.065, 0.02),  // pinky
    (0.08, -0.015),
    (0.09, -0.04),
    (0.095, -0.06),
];

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HandLandmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl HandLandmark {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// One detected hand.
#[derive(Debug, Clone, PartialEq)]
pub struct HandLandmarks {
    points: [HandLandmark; LANDMARK_COUNT],
}

impl HandLandmarks {
    pub fn new(points: [HandLandmark; LANDMARK_COUNT]) -> Self {
        Self { points }
    }

    /// From `x, y, z` triples in landmark order. `None` unless the slice holds
    /// at least a full hand; extra values are ignored.
    pub fn from_flat(values: &[f32]) -> Option<Self> {
        if values.len() < LANDMARK_COUNT * 3 {
            return None;
        }
        let mut points = [HandLandmark::default(); LANDMARK_COUNT];
        for (point, xyz) in points.iter_mut().zip(values.chunks_exact(3)) {
            *point = HandLandmark::new(xyz[0], xyz[1], xyz[2]);
        }
        Some(Self { points })
    }

    /// An open hand whose anchor sits at `(x, y)`.
    pub fn around_anchor(x: f32, y: f32) -> Self {
        let mut points = [HandLandmark::default(); LANDMARK_COUNT];
        for (point, (dx, dy)) in points.iter_mut().zip(OPEN_HAND_OFFSETS) {
            *point = HandLandmark::new(x + dx, y + dy, 0.0);
        }
        Self { points }
    }

    pub fn point(&self, index: usize) -> Option<&HandLandmark> {
        self.points.get(index)
    }

    pub fn points(&self) -> &[HandLandmark; LANDMARK_COUNT] {
        &self.points
    }

    pub fn anchor(&self) -> &HandLandmark {
        &self.points[ANCHOR]
    }
}
