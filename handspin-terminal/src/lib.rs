/// Terminal front end: an ASCII view of a normalized model that turns to
/// follow a tracked hand
use crossterm::{
    cursor,
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        MouseEvent, MouseEventKind,
    },
    execute, queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{self},
};
use handspin_core::{
    Camera, DisplayPose, HandSpinController, NormalizedModel, TrackingConfig, TrackingStatus,
};
use std::io::{self, stdout, Write};
use std::time::{Duration, Instant};

pub mod pointer;
pub mod renderer;

pub use pointer::{PointerBackend, PointerPad};
pub use renderer::AsciiRenderer;

/// Main application struct for terminal hand-spin rendering
pub struct TerminalApp {
    model: NormalizedModel,
    controller: HandSpinController<PointerBackend>,
    pad: PointerPad,
    camera: Camera,
    renderer: AsciiRenderer,
    pose: DisplayPose,
    running: bool,
    last_tick: Instant,
    last_fps_sample: Instant,
    frame_count: u32,
    fps: f32,
}

impl TerminalApp {
    /// Bring up the pointer tracker. A tracker that fails to start is logged
    /// and the model is still shown, holding its last pose.
    pub fn new(model: NormalizedModel, config: TrackingConfig) -> io::Result<Self> {
        let (width, height) = terminal::size()?;

        let pad = PointerPad::new();
        let mut backend = pad.backend();
        let mut controller = HandSpinController::new(config);
        if let Err(err) = pollster::block_on(controller.start(&mut backend)) {
            tracing::error!(error = %err, "continuing without hand tracking");
        }

        let now = Instant::now();
        Ok(Self {
            model,
            controller,
            pad,
            camera: Camera::for_terminal(width, height),
            renderer: AsciiRenderer::new(width as usize, height as usize),
            pose: DisplayPose::default(),
            running: true,
            last_tick: now,
            last_fps_sample: now,
            frame_count: 0,
            fps: 0.0,
        })
    }

    pub fn run(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            stdout(),
            terminal::EnterAlternateScreen,
            EnableMouseCapture,
            cursor::Hide
        )?;

        let result = self.main_loop();

        // Cleanup
        self.controller.shutdown();
        terminal::disable_raw_mode()?;
        execute!(
            stdout(),
            DisableMouseCapture,
            terminal::LeaveAlternateScreen,
            cursor::Show
        )?;

        result
    }

    fn main_loop(&mut self) -> io::Result<()> {
        let target_frame_time = Duration::from_millis(1000 / 30); // 30 FPS target

        while self.running {
            let frame_start = Instant::now();

            // Drain input so pointer moves land before this frame's detection
            while event::poll(Duration::from_millis(0))? {
                self.handle_event(event::read()?)?;
            }

            self.update(frame_start);
            self.render()?;

            // Frame timing
            self.frame_count += 1;
            let elapsed = frame_start.elapsed();
            if elapsed < target_frame_time {
                std::thread::sleep(target_frame_time - elapsed);
            }

            // Update FPS counter
            let now = Instant::now();
            if (now - self.last_fps_sample).as_secs() >= 1 {
                self.fps = self.frame_count as f32 / (now - self.last_fps_sample).as_secs_f32();
                self.frame_count = 0;
                self.last_fps_sample = now;
            }
        }

        Ok(())
    }

    fn handle_event(&mut self, event: Event) -> io::Result<()> {
        match event {
            Event::Key(KeyEvent {
                code,
                kind: KeyEventKind::Press,
                ..
            }) => match code {
                KeyCode::Char('q') | KeyCode::Esc => {
                    self.running = false;
                }
                KeyCode::Char('h') => {
                    self.pad.toggle_hand();
                }
                _ => {}
            },
            Event::Mouse(MouseEvent {
                kind: MouseEventKind::Moved | MouseEventKind::Drag(_),
                column,
                row,
                ..
            }) => {
                let (width, height) = self.renderer.size();
                self.pad.move_to(column, row, width as u16, height as u16);
            }
            Event::Resize(width, height) => {
                tracing::debug!(width, height, "terminal resized");
                self.camera = Camera::for_terminal(width, height);
                self.renderer = AsciiRenderer::new(width as usize, height as usize);
                execute!(stdout(), terminal::Clear(terminal::ClearType::All))?;
            }
            _ => {}
        }
        Ok(())
    }

    /// Detection first, then the render tick, so a fresh target is smoothed
    /// toward in the same frame.
    fn update(&mut self, now: Instant) {
        let dt = (now - self.last_tick).as_secs_f32();
        self.last_tick = now;

        let outcome = self.controller.on_detection_frame();
        tracing::trace!(?outcome, "detection frame");
        self.pose = self.controller.on_render_tick(dt);
    }

    fn render(&mut self) -> io::Result<()> {
        let pose_matrix = self.pose.model_matrix(self.model.display_scale);

        self.renderer.clear();
        self.renderer
            .render_scene(&self.model.scene, &pose_matrix, &self.camera);

        let mut stdout = stdout();
        queue!(stdout, cursor::MoveTo(0, 0))?;

        self.renderer.draw(&mut stdout)?;

        // Draw UI overlay
        let status = match self.controller.status() {
            TrackingStatus::Ready if self.pad.frame().hand_visible => "tracking".to_string(),
            TrackingStatus::Ready => "no hand".to_string(),
            TrackingStatus::NotReady => "starting".to_string(),
            TrackingStatus::Failed(err) => format!("unavailable: {err}"),
        };
        let rotation = self.pose.rotation;
        queue!(
            stdout,
            cursor::MoveTo(0, 0),
            SetForegroundColor(Color::Yellow),
            Print(format!(
                "Handspin | FPS: {:.1} | {} | rot x {:+.2} y {:+.2} | Mouse=Hand H=Show/Hide Q=Quit",
                self.fps, status, rotation.x, rotation.y
            )),
            ResetColor
        )?;

        stdout.flush()?;
        Ok(())
    }
}
