//! Top-level controller: brings tracking up, then runs the detection and
//! render callbacks against one owned pose.
use crate::estimator::SMOOTHING_RATE;
use crate::pose::{DisplayPose, PoseDriver, BOB_AMPLITUDE};
use crate::tracking::{
    CameraConstraints, DetectionSession, FrameOutcome, TrackerBackend, TrackingError,
};
use crate::transform::RotationState;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackingConfig {
    pub smoothing_rate: f32,
    pub bob_amplitude: f32,
    pub camera: CameraConstraints,
    /// Initialization attempts before giving up; values below 1 count as 1.
    pub init_attempts: u32,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            smoothing_rate: SMOOTHING_RATE,
            bob_amplitude: BOB_AMPLITUDE,
            camera: CameraConstraints::default(),
            init_attempts: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TrackingStatus {
    NotReady,
    Ready,
    /// Initialization failed; stays here until `start` succeeds.
    Failed(TrackingError),
}

pub struct HandSpinController<B: TrackerBackend> {
    config: TrackingConfig,
    status: TrackingStatus,
    pose: PoseDriver,
    session: Option<DetectionSession<B::Camera, B::Detector>>,
}

impl<B: TrackerBackend> HandSpinController<B> {
    pub fn new(config: TrackingConfig) -> Self {
        Self {
            config,
            status: TrackingStatus::NotReady,
            pose: PoseDriver::new(config.smoothing_rate, config.bob_amplitude),
            session: None,
        }
    }

    pub fn status(&self) -> &TrackingStatus {
        &self.status
    }

    pub fn is_ready(&self) -> bool {
        self.status == TrackingStatus::Ready
    }

    pub fn config(&self) -> &TrackingConfig {
        &self.config
    }

    pub fn target(&self) -> RotationState {
        self.pose.estimator().target()
    }

    pub fn current(&self) -> RotationState {
        self.pose.estimator().current()
    }

    /// Create the detector, then open the camera. Failures are logged and
    /// leave the controller not ready; there is no background retry.
    pub async fn start(&mut self, backend: &mut B) -> Result<(), TrackingError> {
        if let Some(mut old) = self.session.take() {
            old.stop();
        }
        let attempts = self.config.init_attempts.max(1);
        let constraints = self.config.camera;
        let mut attempt = 1;
        loop {
            let opened = Self::open(backend, &constraints).await;
            match opened {
                Ok(session) => {
                    self.session = Some(session);
                    self.status = TrackingStatus::Ready;
                    tracing::info!(attempt, "hand tracking ready");
                    return Ok(());
                }
                Err(err) if attempt < attempts => {
                    tracing::warn!(attempt, error = %err, "hand tracking initialisation failed, retrying");
                    attempt += 1;
                }
                Err(err) => {
                    tracing::error!(attempt, error = %err, "hand tracking unavailable");
                    self.status = TrackingStatus::Failed(err.clone());
                    return Err(err);
                }
            }
        }
    }

    async fn open(
        backend: &mut B,
        constraints: &CameraConstraints,
    ) -> Result<DetectionSession<B::Camera, B::Detector>, TrackingError> {
        let detector = backend.create_detector().await?;
        let camera = backend.open_camera(constraints).await?;
        Ok(DetectionSession::new(camera, detector))
    }

    /// Detection callback: writes the target rotation.
    pub fn on_detection_frame(&mut self) -> FrameOutcome {
        match self.session.as_mut() {
            Some(session) => session.poll(self.pose.estimator_mut()),
            None => FrameOutcome::Stopped,
        }
    }

    /// Render callback: reads the target and returns the pose to draw.
    pub fn on_render_tick(&mut self, dt: f32) -> DisplayPose {
        self.pose.tick(dt)
    }

    /// Stop detection and release the camera.
    pub fn shutdown(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.stop();
        }
        if self.status == TrackingStatus::Ready {
            self.status = TrackingStatus::NotReady;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracking::tests::{Stage, StageCamera, StageDetector};
    use std::cell::Cell;
    use std::rc::Rc;

    struct StageBackend {
        stage: Stage,
        camera_failures: Rc<Cell<u32>>,
        detector_broken: bool,
    }

    impl StageBackend {
        fn working(stage: &Stage) -> Self {
            Self {
                stage: stage.clone(),
                camera_failures: Rc::new(Cell::new(0)),
                detector_broken: false,
            }
        }
    }

    impl TrackerBackend for StageBackend {
        type Camera = StageCamera;
        type Detector = StageDetector;

        async fn create_detector(&mut self) -> Result<StageDetector, TrackingError> {
            if self.detector_broken {
                return Err(TrackingError::DetectorInit("model missing".into()));
            }
            Ok(StageDetector(self.stage.clone()))
        }

        async fn open_camera(
            &mut self,
            _constraints: &CameraConstraints,
        ) -> Result<StageCamera, TrackingError> {
            let remaining = self.camera_failures.get();
            if remaining > 0 {
                self.camera_failures.set(remaining - 1);
                return Err(TrackingError::CameraUnavailable("permission denied".into()));
            }
            Ok(StageCamera(self.stage.clone()))
        }
    }

    #[test]
    fn starts_ready_and_tracks() {
        let stage = Stage::default();
        let mut backend = StageBackend::working(&stage);
        let mut controller = HandSpinController::new(TrackingConfig::default());
        assert_eq!(controller.status(), &TrackingStatus::NotReady);

        pollster::block_on(controller.start(&mut backend)).unwrap();
        assert!(controller.is_ready());

        stage.show_hand(0.1, 1.0, 0.5);
        assert!(matches!(controller.on_detection_frame(), FrameOutcome::Tracked(_)));
        let pose = controller.on_render_tick(1.0 / 60.0);
        assert!(pose.rotation.y > 0.0);
        assert!(pose.rotation.y < controller.target().y);
    }

    #[test]
    fn detector_failure_leaves_not_ready() {
        let stage = Stage::default();
        let mut backend = StageBackend {
            detector_broken: true,
            ..StageBackend::working(&stage)
        };
        let mut controller = HandSpinController::new(TrackingConfig::default());

        let err = pollster::block_on(controller.start(&mut backend)).unwrap_err();
        assert!(matches!(err, TrackingError::DetectorInit(_)));
        assert_eq!(controller.status(), &TrackingStatus::Failed(err));
        assert_eq!(controller.on_detection_frame(), FrameOutcome::Stopped);

        // rendering keeps running toward the last target
        let pose = controller.on_render_tick(0.1);
        assert_eq!(pose.rotation, RotationState::zero());
    }

    #[test]
    fn single_attempt_by_default() {
        let stage = Stage::default();
        let mut backend = StageBackend::working(&stage);
        backend.camera_failures.set(1);
        let mut controller = HandSpinController::new(TrackingConfig::default());

        assert!(pollster::block_on(controller.start(&mut backend)).is_err());
        assert!(matches!(controller.status(), TrackingStatus::Failed(TrackingError::CameraUnavailable(_))));
    }

    #[test]
    fn configured_attempts_retry() {
        let stage = Stage::default();
        let mut backend = StageBackend::working(&stage);
        backend.camera_failures.set(2);
        let config = TrackingConfig {
            init_attempts: 3,
            ..TrackingConfig::default()
        };
        let mut controller = HandSpinController::new(config);

        pollster::block_on(controller.start(&mut backend)).unwrap();
        assert!(controller.is_ready());
    }

    #[test]
    fn detection_update_lands_before_render_tick() {
        let stage = Stage::default();
        let mut backend = StageBackend::working(&stage);
        let mut controller = HandSpinController::new(TrackingConfig::default());
        pollster::block_on(controller.start(&mut backend)).unwrap();

        stage.show_hand(0.5, 0.0, 0.5);
        controller.on_detection_frame();
        // dt long enough to land exactly on the freshly written target
        let pose = controller.on_render_tick(1.0);
        assert_eq!(pose.rotation.y, controller.target().y);
    }

    #[test]
    fn shutdown_releases_camera() {
        let stage = Stage::default();
        let mut backend = StageBackend::working(&stage);
        let mut controller = HandSpinController::new(TrackingConfig::default());
        pollster::block_on(controller.start(&mut backend)).unwrap();

        controller.shutdown();
        assert_eq!(stage.releases.get(), 1);
        assert_eq!(controller.status(), &TrackingStatus::NotReady);
        assert_eq!(controller.on_detection_frame(), FrameOutcome::Stopped);

        drop(controller);
        assert_eq!(stage.releases.get(), 1);
    }

    #[test]
    fn dropping_controller_releases_camera() {
        let stage = Stage::default();
        let mut backend = StageBackend::working(&stage);
        {
            let mut controller = HandSpinController::new(TrackingConfig::default());
            pollster::block_on(controller.start(&mut backend)).unwrap();
        }
        assert_eq!(stage.releases.get(), 1);
    }
}
