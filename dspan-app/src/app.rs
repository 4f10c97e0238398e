use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow};
use dspan_core::{Condition, Stage};
use dspan_experiment::{
    EngineEvent, FixedSequences, RandomSequences, SequenceProvider, Session, SessionStore,
    SpanConfig, TrialEngine,
};
use dspan_render::{FontVec, SkiaRenderer, load_font, summary_line};
use dspan_timing::{HighPrecisionTimer, Timer};
use pixels::{Pixels, SurfaceTexture};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, error, info, trace, warn};
use winit::{
    application::ApplicationHandler,
    dpi::{LogicalSize, PhysicalSize},
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Fullscreen, Window, WindowId},
};

use crate::Args;
use crate::scene::{Command, build_scene, map_key};

/// Within this distance of a digit deadline the loop sleeps precisely
/// instead of handing control back to the event loop.
const SPIN_WINDOW: Duration = Duration::from_millis(2);

const FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/Library/Fonts/DejaVuSans.ttf",
    "C:\\Windows\\Fonts\\DejaVuSans.ttf",
];

type AppSession = Session<Box<dyn SequenceProvider>, HighPrecisionTimer>;

pub struct App {
    args: Args,
    window: Option<Arc<Window>>,
    pixels: Option<Pixels<'static>>,
    session: AppSession,
    renderer: Option<SkiaRenderer>,
    frame_timer: HighPrecisionTimer,
    refresh_rate: Option<f64>,

    should_exit: bool,
}

impl App {
    pub fn new(args: Args) -> Result<Self> {
        let config = SpanConfig::default();
        let provider: Box<dyn SequenceProvider> = if args.random_sequences {
            let mut rng = match args.seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_os_rng(),
            };
            info!(seed = ?args.seed, "using generated sequences");
            Box::new(RandomSequences::generate(&config, &mut rng))
        } else {
            Box::new(FixedSequences)
        };

        let engine = TrialEngine::new("", config, provider, HighPrecisionTimer::new())?;
        let store = SessionStore::new(&args.data_dir);
        Self::report_cached(&store);

        let prefill = match &args.participant {
            Some(id) => Some(id.clone()),
            None => store.load_participant().unwrap_or_else(|e| {
                warn!(error = %e, "could not read cached participant id");
                None
            }),
        };

        let mut session = Session::new(engine, Some(store));
        if let Some(id) = prefill {
            session.prefill_participant(&id);
        }

        Ok(Self {
            args,
            window: None,
            pixels: None,
            session,
            renderer: None,
            frame_timer: HighPrecisionTimer::new(),
            refresh_rate: None,
            should_exit: false,
        })
    }

    pub fn run(mut self) -> Result<()> {
        let event_loop = EventLoop::new()?;
        info!(
            platform = std::env::consts::OS,
            arch = std::env::consts::ARCH,
            "digit span test starting; Enter to continue, Esc to exit"
        );

        event_loop.run_app(&mut self)?;
        Ok(())
    }

    /// Logs the last completed run left in the cache, if any.
    fn report_cached(store: &SessionStore) {
        match store.load_results() {
            Ok(Some(results)) => {
                info!(
                    participant = %results.participant_id,
                    completed_at = %results.completed_at,
                    "cached results from a previous run"
                );
                for condition in [Condition::Forward, Condition::Backward] {
                    info!("{}", summary_line(condition, results.summary(condition)));
                }
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "ignoring unreadable cached results"),
        }
    }

    fn find_font(&self) -> Option<FontVec> {
        let candidates: Vec<PathBuf> = match &self.args.font {
            Some(path) => vec![path.clone()],
            None => FONT_CANDIDATES.iter().map(PathBuf::from).collect(),
        };
        for path in &candidates {
            match load_font(path) {
                Ok(font) => {
                    info!(font = %path.display(), "loaded font");
                    return Some(font);
                }
                Err(e) => debug!(error = %e, "font unavailable"),
            }
        }
        warn!("no usable font found; text labels are disabled (use --font)");
        None
    }

    fn create_window_and_surface(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let primary_monitor = event_loop
            .primary_monitor()
            .or_else(|| event_loop.available_monitors().next())
            .ok_or_else(|| anyhow!("no monitor available"))?;

        self.refresh_rate = primary_monitor
            .refresh_rate_millihertz()
            .map(|rate| rate as f64 / 1000.0);

        let mut window_attributes = Window::default_attributes().with_title("Digit Span Test");
        window_attributes = if self.args.windowed {
            window_attributes
                .with_inner_size(LogicalSize::new(1280.0, 800.0))
                .with_resizable(true)
        } else {
            window_attributes
                .with_fullscreen(Some(Fullscreen::Borderless(Some(primary_monitor.clone()))))
                .with_resizable(false)
        };

        let window = Arc::new(event_loop.create_window(window_attributes)?);
        let physical_size = window.inner_size();
        let scale_factor = window.scale_factor();

        info!(
            width = physical_size.width,
            height = physical_size.height,
            scale_factor,
            refresh_hz = ?self.refresh_rate,
            "display configured"
        );

        let surface_texture =
            SurfaceTexture::new(physical_size.width, physical_size.height, window.clone());
        self.pixels = Some(Pixels::new(
            physical_size.width,
            physical_size.height,
            surface_texture,
        )?);

        let font = self.find_font();
        self.renderer = Some(SkiaRenderer::new(
            physical_size.width,
            physical_size.height,
            font,
        )?);

        window.request_redraw();
        self.window = Some(window);

        Ok(())
    }

    fn render(&mut self) -> Result<()> {
        let (Some(pix), Some(renderer)) = (self.pixels.as_mut(), self.renderer.as_mut()) else {
            return Ok(());
        };

        let scene = build_scene(&self.session);
        let stats = renderer.render_frame(&scene, pix.frame_mut(), &mut self.frame_timer)?;

        let now = self.frame_timer.now();
        pix.render()?;
        let present = self.frame_timer.elapsed(now);

        trace!(
            draw_ms = stats.draw.as_secs_f64() * 1e3,
            copy_ms = stats.copy.as_secs_f64() * 1e3,
            present_ms = present.as_secs_f64() * 1e3,
            "frame"
        );
        Ok(())
    }

    fn request_redraw(&self) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn handle_key(&mut self, command: Command, event_loop: &ActiveEventLoop) {
        match command {
            Command::Advance => match self.session.advance() {
                Ok(events) => self.log_events(&events),
                Err(e) => debug!(error = %e, "advance ignored"),
            },
            Command::Type(c) => self.session.type_char(c),
            Command::Backspace => self.session.backspace(),
            Command::Restart => self.session.restart(),
            Command::SaveImage => {
                if let Err(e) = self.save_results_image() {
                    error!(error = %e, "could not export results image");
                }
            }
            Command::Exit => self.cleanup_and_exit(event_loop),
        }
        self.request_redraw();
    }

    fn log_events(&self, events: &[EngineEvent]) {
        for event in events {
            match event {
                EngineEvent::TrialRecorded(trial) => debug!(
                    condition = ?trial.condition,
                    length = trial.length,
                    correct_digits = trial.correct_digits,
                    fully_correct = trial.fully_correct,
                    "trial recorded"
                ),
                EngineEvent::Completed(results) => info!(
                    participant = %results.participant_id,
                    forward_span = results.forward.max_span,
                    backward_span = results.backward.max_span,
                    "test complete"
                ),
                _ => trace!(?event, "engine event"),
            }
        }
    }

    fn save_results_image(&mut self) -> Result<()> {
        let (Some(results), Some(renderer)) = (self.session.results(), self.renderer.as_mut())
        else {
            return Ok(());
        };
        let dir: &Path = &self.args.data_dir;
        std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
        let file = format!(
            "digit-span-{}-{}.png",
            sanitize(&results.participant_id),
            results.completed_at.format("%Y%m%d-%H%M%S")
        );
        let path = dir.join(file);
        renderer.export_results_png(results, self.session.engine().config.max_length, &path)?;
        info!(path = %path.display(), "results image saved");
        Ok(())
    }

    /// Fires due presentation ticks and schedules the next wake-up.
    fn pump_ticks(&mut self, event_loop: &ActiveEventLoop) {
        let events = self.session.tick();
        if !events.is_empty() {
            self.log_events(&events);
            self.request_redraw();
        }

        let Some(deadline) = self.session.engine().next_deadline() else {
            event_loop.set_control_flow(ControlFlow::Wait);
            return;
        };
        let timer = &self.session.engine().timer;
        let remaining = Duration::from_nanos(deadline.saturating_sub(timer.now()));
        if remaining <= SPIN_WINDOW {
            sleep_until(timer, deadline);
            let events = self.session.tick();
            self.log_events(&events);
            self.request_redraw();
            event_loop.set_control_flow(ControlFlow::Poll);
        } else {
            event_loop.set_control_flow(ControlFlow::WaitUntil(
                Instant::now() + (remaining - SPIN_WINDOW),
            ));
        }
    }

    fn handle_resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        if let Some(pixels) = &mut self.pixels {
            if let Err(e) = pixels.resize_surface(new_size.width, new_size.height) {
                error!(error = %e, "failed to resize surface");
            }
            if let Err(e) = pixels.resize_buffer(new_size.width, new_size.height) {
                error!(error = %e, "failed to resize buffer");
            }
        }
        if let Some(renderer) = &mut self.renderer {
            if let Err(e) = renderer.resize(new_size.width, new_size.height) {
                error!(error = %e, "failed to resize canvas");
            }
        }
        debug!(width = new_size.width, height = new_size.height, "display resized");
        self.request_redraw();
    }

    fn cleanup_and_exit(&mut self, event_loop: &ActiveEventLoop) {
        self.session.teardown();

        let stats = self.frame_timer.frame_stats();
        info!(
            frames = self.frame_timer.frame_count(),
            avg_ms = stats.average_frame_time_ns / 1e6,
            jitter_ms = stats.jitter_ns / 1e6,
            max_ms = stats.max_frame_time_ns / 1e6,
            "frame statistics"
        );
        if self.session.stage() == Stage::ThankYou {
            info!("session finished, thank you");
        }

        self.should_exit = true;
        event_loop.exit();
    }
}

/// Sleeps out the rest of `deadline_ns` on the engine's clock.
fn sleep_until<T: Timer>(timer: &T, deadline_ns: u64) {
    timer.sleep(Duration::from_nanos(deadline_ns.saturating_sub(timer.now())));
}

/// Keeps participant ids usable as file name fragments.
fn sanitize(id: &str) -> String {
    id.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(e) = self.create_window_and_surface(event_loop) {
                error!(error = %e, "failed to create window and surface");
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => self.cleanup_and_exit(event_loop),
            WindowEvent::RedrawRequested => {
                if let Err(e) = self.render() {
                    error!(error = %e, "render failed");
                    self.cleanup_and_exit(event_loop);
                }
            }
            WindowEvent::KeyboardInput { event, .. } if event.state.is_pressed() => {
                let commands = map_key(
                    self.session.stage(),
                    &event.logical_key,
                    event.text.as_deref(),
                );
                for command in commands {
                    self.handle_key(command, event_loop);
                }
            }
            WindowEvent::Resized(sz) => self.handle_resize(sz),
            WindowEvent::ScaleFactorChanged { .. } => {
                if let Some(window) = &self.window {
                    self.handle_resize(window.inner_size());
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.should_exit {
            event_loop.exit();
            return;
        }
        self.pump_ticks(event_loop);
    }
}

#[cfg(test)]
mod tests {
    use super::{sanitize, sleep_until};
    use dspan_timing::{ManualTimer, Timer};
    use std::time::Duration;

    #[test]
    fn sleep_until_lands_on_the_deadline() {
        let timer = ManualTimer::new();
        timer.advance(Duration::from_millis(3));
        sleep_until(&timer, 5_000_000);
        assert_eq!(timer.now(), 5_000_000);

        sleep_until(&timer, 4_000_000);
        assert_eq!(timer.now(), 5_000_000, "past deadlines do not sleep");
    }

    #[test]
    fn sanitize_replaces_path_characters() {
        assert_eq!(sanitize("p-01_a"), "p-01_a");
        assert_eq!(sanitize("../x y"), "___x_y");
    }
}
