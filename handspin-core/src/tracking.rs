//! Camera and hand-detector collaborators, and the detection session that
//! drives them once per polled frame.
use crate::estimator::{FrameGate, RotationEstimator};
use crate::landmarks::HandLandmarks;
use crate::transform::RotationState;

#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum TrackingError {
    #[error("camera unavailable: {0}")]
    CameraUnavailable(String),
    #[error("hand detector failed to initialise: {0}")]
    DetectorInit(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Facing {
    #[default]
    User,
    Environment,
}

/// Requested capture resolution and camera facing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CameraConstraints {
    pub width: u32,
    pub height: u32,
    pub facing: Facing,
}

impl Default for CameraConstraints {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            facing: Facing::User,
        }
    }
}

/// A live video source.
pub trait FrameSource {
    type Frame;

    /// Playback position of the current frame in seconds.
    fn current_time(&self) -> f64;

    fn current_frame(&self) -> Self::Frame;

    /// Stop the underlying hardware stream. Called at most once.
    fn release(&mut self);
}

/// Synchronous landmark detection on one frame.
pub trait HandDetector<F> {
    /// Zero or more hands, each with the full landmark set.
    fn detect(&mut self, frame: &F, timestamp: f64) -> Vec<HandLandmarks>;
}

/// Creates the collaborators. Both steps are asynchronous and may fail.
#[allow(async_fn_in_trait)]
pub trait TrackerBackend {
    type Camera: FrameSource;
    type Detector: HandDetector<<Self::Camera as FrameSource>::Frame>;

    async fn create_detector(&mut self) -> Result<Self::Detector, TrackingError>;

    async fn open_camera(
        &mut self,
        constraints: &CameraConstraints,
    ) -> Result<Self::Camera, TrackingError>;
}

/// What one poll of the detection loop did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrameOutcome {
    /// Session stopped or never started.
    Stopped,
    /// Same video frame as the last poll; nothing detected.
    Duplicate,
    /// New frame without a hand; target unchanged.
    NoHand,
    /// New frame with a hand; the new target.
    Tracked(RotationState),
}

/// A running camera + detector pair.
pub struct DetectionSession<C, D>
where
    C: FrameSource,
    D: HandDetector<C::Frame>,
{
    camera: C,
    detector: D,
    gate: FrameGate,
    running: bool,
}

impl<C, D> DetectionSession<C, D>
where
    C: FrameSource,
    D: HandDetector<C::Frame>,
{
    pub fn new(camera: C, detector: D) -> Self {
        Self {
            camera,
            detector,
            gate: FrameGate::new(),
            running: true,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn camera(&self) -> &C {
        &self.camera
    }

    /// Run detection on the current frame if it is new and feed the result to
    /// `estimator`.
    pub fn poll(&mut self, estimator: &mut RotationEstimator) -> FrameOutcome {
        if !self.running {
            return FrameOutcome::Stopped;
        }
        let timestamp = self.camera.current_time();
        if !self.gate.admit(timestamp) {
            return FrameOutcome::Duplicate;
        }
        let frame = self.camera.current_frame();
        let hands = self.detector.detect(&frame, timestamp);
        match estimator.observe(&hands) {
            Some(target) => FrameOutcome::Tracked(target),
            None => FrameOutcome::NoHand,
        }
    }

    /// Cancel further polling and release the camera.
    pub fn stop(&mut self) {
        if !self.running {
            return;
        }
        self.running = false;
        self.camera.release();
        tracing::info!("detection stopped, camera released");
    }
}

impl<C, D> Drop for DetectionSession<C, D>
where
    C: FrameSource,
    D: HandDetector<C::Frame>,
{
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    /// Scripted camera: the test moves the shared clock and anchor.
    #[derive(Clone, Default)]
    pub(crate) struct Stage {
        pub time: Rc<Cell<f64>>,
        pub anchor: Rc<Cell<Option<(f32, f32)>>>,
        pub releases: Rc<Cell<u32>>,
        pub detections: Rc<RefCell<Vec<f64>>>,
    }

    impl Stage {
        pub fn show_hand(&self, time: f64, x: f32, y: f32) {
            self.time.set(time);
            self.anchor.set(Some((x, y)));
        }

        pub fn hide_hand(&self, time: f64) {
            self.time.set(time);
            self.anchor.set(None);
        }
    }

    pub(crate) struct StageCamera(pub Stage);

    impl FrameSource for StageCamera {
        type Frame = Option<(f32, f32)>;

        fn current_time(&self) -> f64 {
            self.0.time.get()
        }

        fn current_frame(&self) -> Self::Frame {
            self.0.anchor.get()
        }

        fn release(&mut self) {
            self.0.releases.set(self.0.releases.get() + 1);
        }
    }

    pub(crate) struct StageDetector(pub Stage);

    impl HandDetector<Option<(f32, f32)>> for StageDetector {
        fn detect(&mut self, frame: &Option<(f32, f32)>, timestamp: f64) -> Vec<HandLandmarks> {
            self.0.detections.borrow_mut().push(timestamp);
            frame
                .map(|(x, y)| HandLandmarks::around_anchor(x, y))
                .into_iter()
                .collect()
        }
    }

    fn session(stage: &Stage) -> DetectionSession<StageCamera, StageDetector> {
        DetectionSession::new(StageCamera(stage.clone()), StageDetector(stage.clone()))
    }

    #[test]
    fn new_frame_with_hand_updates_target() {
        let stage = Stage::default();
        let mut session = session(&stage);
        let mut estimator = RotationEstimator::default();

        stage.show_hand(0.1, 1.0, 0.5);
        let outcome = session.poll(&mut estimator);
        assert!(matches!(outcome, FrameOutcome::Tracked(t) if t.y > 6.0));
    }

    #[test]
    fn unchanged_timestamp_is_not_redetected() {
        let stage = Stage::default();
        let mut session = session(&stage);
        let mut estimator = RotationEstimator::default();

        stage.show_hand(0.1, 0.7, 0.5);
        session.poll(&mut estimator);
        let target = estimator.target();

        // anchor moves but the video frame did not advance
        stage.anchor.set(Some((0.1, 0.1)));
        assert_eq!(session.poll(&mut estimator), FrameOutcome::Duplicate);
        assert_eq!(estimator.target(), target);
        assert_eq!(stage.detections.borrow().len(), 1);
    }

    #[test]
    fn lost_hand_holds_target() {
        let stage = Stage::default();
        let mut session = session(&stage);
        let mut estimator = RotationEstimator::default();

        stage.show_hand(0.1, 0.2, 0.8);
        session.poll(&mut estimator);
        let target = estimator.target();

        for i in 0..10 {
            stage.hide_hand(0.2 + i as f64 * 0.1);
            assert_eq!(session.poll(&mut estimator), FrameOutcome::NoHand);
        }
        assert_eq!(estimator.target(), target);
    }

    #[test]
    fn stop_releases_once_and_halts_polling() {
        let stage = Stage::default();
        let mut session = session(&stage);
        let mut estimator = RotationEstimator::default();

        session.stop();
        session.stop();
        assert_eq!(stage.releases.get(), 1);

        stage.show_hand(1.0, 0.9, 0.9);
        assert_eq!(session.poll(&mut estimator), FrameOutcome::Stopped);
        assert!(stage.detections.borrow().is_empty());

        drop(session);
        assert_eq!(stage.releases.get(), 1);
    }

    #[test]
    fn drop_releases_camera() {
        let stage = Stage::default();
        {
            let _session = session(&stage);
        }
        assert_eq!(stage.releases.get(), 1);
    }
}
