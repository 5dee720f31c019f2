/// Terminal mouse as a stand-in hand tracker
///
/// The pointer position is the hand: every move is a new video frame whose
/// single hand is anchored under the cursor. Hiding the hand simulates it
/// leaving the camera's view.
use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

use handspin_core::{
    CameraConstraints, FrameSource, HandDetector, HandLandmarks, TrackerBackend, TrackingError,
};

/// Latest pointer state, shared between the input handler and the feed.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointerFrame {
    /// Normalized [0, 1] position across the terminal
    pub x: f32,
    pub y: f32,
    pub hand_visible: bool,
    /// Seconds since the pad was created; advances on every change
    pub time: f64,
}

/// Input side: records pointer moves as new frames.
#[derive(Debug, Clone)]
pub struct PointerPad {
    shared: Rc<Cell<PointerFrame>>,
    epoch: Instant,
}

impl PointerPad {
    pub fn new() -> Self {
        Self {
            shared: Rc::new(Cell::new(PointerFrame::default())),
            epoch: Instant::now(),
        }
    }

    pub fn frame(&self) -> PointerFrame {
        self.shared.get()
    }

    /// Cursor moved to cell (`column`, `row`) of a `columns` x `rows` screen.
    pub fn move_to(&self, column: u16, row: u16, columns: u16, rows: u16) {
        let x = (column as f32 + 0.5) / columns.max(1) as f32;
        let y = (row as f32 + 0.5) / rows.max(1) as f32;
        self.publish(|frame| {
            frame.x = x.clamp(0.0, 1.0);
            frame.y = y.clamp(0.0, 1.0);
            frame.hand_visible = true;
        });
    }

    pub fn toggle_hand(&self) {
        self.publish(|frame| frame.hand_visible = !frame.hand_visible);
    }

    fn publish(&self, edit: impl FnOnce(&mut PointerFrame)) {
        let mut frame = self.shared.get();
        edit(&mut frame);
        let now = self.epoch.elapsed().as_secs_f64();
        // strictly increasing so every edit is a distinct frame
        frame.time = if now > frame.time { now } else { frame.time + 1e-6 };
        self.shared.set(frame);
    }

    pub fn backend(&self) -> PointerBackend {
        PointerBackend {
            shared: Rc::clone(&self.shared),
        }
    }
}

impl Default for PointerPad {
    fn default() -> Self {
        Self::new()
    }
}

pub struct PointerBackend {
    shared: Rc<Cell<PointerFrame>>,
}

pub struct PointerFeed {
    shared: Rc<Cell<PointerFrame>>,
}

impl FrameSource for PointerFeed {
    type Frame = PointerFrame;

    fn current_time(&self) -> f64 {
        self.shared.get().time
    }

    fn current_frame(&self) -> PointerFrame {
        self.shared.get()
    }

    fn release(&mut self) {
        tracing::debug!("pointer feed released");
    }
}

/// Produces one synthetic open hand under the pointer.
pub struct PointerHandDetector;

impl HandDetector<PointerFrame> for PointerHandDetector {
    fn detect(&mut self, frame: &PointerFrame, _timestamp: f64) -> Vec<HandLandmarks> {
        if !frame.hand_visible {
            return Vec::new();
        }
        vec![HandLandmarks::around_anchor(frame.x, frame.y)]
    }
}

impl TrackerBackend for PointerBackend {
    type Camera = PointerFeed;
    type Detector = PointerHandDetector;

    async fn create_detector(&mut self) -> Result<PointerHandDetector, TrackingError> {
        Ok(PointerHandDetector)
    }

    async fn open_camera(
        &mut self,
        constraints: &CameraConstraints,
    ) -> Result<PointerFeed, TrackingError> {
        tracing::debug!(?constraints, "pointer feed ignores capture constraints");
        Ok(PointerFeed {
            shared: Rc::clone(&self.shared),
        })
    }
}
