mod capture;
mod keyboard;
mod render;

use std::path::Path;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use winit::{
    event::*, event_loop::EventLoop, event_loop::EventLoopWindowTarget, keyboard::ModifiersState,
    window::WindowBuilder,
};

use capture::{CaptureError, CaptureFormat, CaptureHandle, Recorder, CAPTURE_FPS};
use keyboard::{action_for_key, Action, HELP};
use render::GpuState;
use tunnel_core::{
    nudge, toggle, FrameOutput, Param, ParamEdit, ParameterSet, TunnelEngine, TweakPanel,
};

const CAPTURE_DIR: &str = "captures";
// Longest tick fed to the engine; covers window drags and debugger stops
const MAX_TICK: Duration = Duration::from_millis(100);

fn initial_seed() -> u64 {
    match std::env::var("TUNNEL_SEED").ok().map(|s| s.parse::<u64>()) {
        Some(Ok(seed)) => seed,
        Some(Err(err)) => {
            log::warn!("TUNNEL_SEED ignored: {err}");
            clock_seed()
        }
        None => clock_seed(),
    }
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}

struct App {
    engine: TunnelEngine,
    frame: FrameOutput,
    panel: TweakPanel,
    recorder: Recorder,
    capture_format: CaptureFormat,
    stop_requested: bool,
    pending: Vec<CaptureHandle>,
    last_tick: Instant,
    modifiers: ModifiersState,
}

impl App {
    fn new(seed: u64) -> Self {
        let engine = TunnelEngine::new(ParameterSet::default(), seed);
        let mut frame = FrameOutput::new();
        frame.update(&engine, 1.0);
        Self {
            engine,
            frame,
            panel: TweakPanel::new(),
            recorder: Recorder::new(CAPTURE_FPS),
            capture_format: CaptureFormat::default(),
            stop_requested: false,
            pending: Vec::new(),
            last_tick: Instant::now(),
            modifiers: ModifiersState::empty(),
        }
    }

    fn title(&self) -> String {
        let mut title = format!("Tunnel | {}", self.panel.describe(self.engine.params()));
        if self.engine.paused() {
            title.push_str(" | paused");
        }
        if self.recorder.is_recording() {
            title.push_str(&format!(" | REC {}", self.capture_format.name()));
        }
        title
    }

    fn apply_edit(&mut self, edit: ParamEdit) {
        match edit.apply(self.engine.params()) {
            Ok(next) => {
                let scope = self.engine.apply_params(next);
                log::info!(
                    "[keys] {:?} -> {} (rebuild rings={} shapes={})",
                    edit.param,
                    edit.value,
                    scope.rings,
                    scope.shapes
                );
            }
            Err(err) => log::warn!("[keys] {err}"),
        }
    }

    fn toggle_capture(&mut self, gpu: &GpuState) {
        if self.recorder.is_recording() {
            // stopped on the next frame so an empty capture can still grab one
            self.stop_requested = true;
            return;
        }
        if !gpu.readback_supported() {
            log::error!("[capture] {}", CaptureError::ReadbackUnsupported);
            return;
        }
        let started = self
            .capture_format
            .open_sink(Path::new(CAPTURE_DIR), CAPTURE_FPS)
            .and_then(|sink| self.recorder.start(sink));
        if let Err(err) = started {
            log::error!("[capture] could not start: {err}");
        }
    }

    fn handle(&mut self, action: Action, gpu: &mut GpuState, elwt: &EventLoopWindowTarget<()>) {
        let params = self.engine.params().clone();
        match action {
            Action::SelectNext => {
                self.panel.select_next();
            }
            Action::SelectPrev => {
                self.panel.select_prev();
            }
            Action::Adjust(steps) => {
                let edit = self.panel.nudge(&params, steps);
                self.apply_edit(edit);
            }
            Action::TogglePause => {
                let paused = self.engine.toggle_paused();
                log::info!("[keys] paused={paused}");
            }
            Action::Reseed => {
                let seed = self.engine.reseed(None);
                log::info!("[keys] reseeded with {seed}");
            }
            Action::ToggleCapture => self.toggle_capture(gpu),
            Action::CycleCaptureFormat => {
                self.capture_format = self.capture_format.next();
                log::info!("[capture] format: {}", self.capture_format.name());
            }
            Action::ToggleGlow => {
                if let Some(edit) = toggle(Param::GlowEnabled, &params) {
                    self.apply_edit(edit);
                }
            }
            Action::ToggleWireframe => {
                if let Some(edit) = toggle(Param::Wireframe, &params) {
                    self.apply_edit(edit);
                }
            }
            Action::CycleShape => self.apply_edit(nudge(Param::Shape, &params, 1)),
            Action::Help => {
                for line in HELP {
                    log::info!("[keys] {line}");
                }
            }
            Action::Quit => elwt.exit(),
        }
        gpu.window.set_title(&self.title());
    }

    /// Tick, draw, and feed the recorder.
    fn redraw(&mut self, gpu: &mut GpuState) -> Result<(), wgpu::SurfaceError> {
        let now = Instant::now();
        let dt = now.saturating_duration_since(self.last_tick).min(MAX_TICK);
        self.last_tick = now;

        self.engine.tick(dt);
        self.frame.update(&self.engine, gpu.aspect());
        gpu.set_shape_kind(self.engine.shapes().kind());

        let needs_fallback = self.stop_requested && self.recorder.frames_sent() == 0;
        let wants_frame = self.recorder.wants_frame(now) || needs_fallback;
        if gpu.render(&self.frame, wants_frame)? {
            self.recorder.sampled(now);
        }

        if self.stop_requested {
            self.stop_requested = false;
            // the one blocking wait of a capture: keep the frames in flight
            let mut captured = gpu.poll_readbacks(true);
            let fallback = if self.recorder.frames_sent() == 0 {
                captured.pop()
            } else {
                None
            };
            for frame in captured {
                self.recorder.offer(frame);
            }
            if let Some(handle) = self.recorder.stop(|| fallback) {
                self.pending.push(handle);
            }
            gpu.window.set_title(&self.title());
        } else {
            for frame in gpu.poll_readbacks(false) {
                self.recorder.offer(frame);
            }
        }
        self.collect_finished(false);
        Ok(())
    }

    /// Report captures whose encoder finished; with `wait`, block on all.
    fn collect_finished(&mut self, wait: bool) {
        let (done, running): (Vec<_>, Vec<_>) = std::mem::take(&mut self.pending)
            .into_iter()
            .partition(|h| wait || h.is_finished());
        self.pending = running;
        for handle in done {
            match handle.join() {
                Ok(summary) => log::info!(
                    "[capture] wrote {} ({} frames, {} dropped)",
                    summary.path.display(),
                    summary.frames,
                    summary.dropped
                ),
                Err(err) => log::error!("[capture] failed: {err}"),
            }
        }
    }

    fn shutdown(&mut self) {
        if let Some(handle) = self.recorder.stop(|| None) {
            self.pending.push(handle);
        }
        self.collect_finished(true);
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let seed = initial_seed();
    let mut app = App::new(seed);

    let event_loop = EventLoop::new()?;
    let window = WindowBuilder::new()
        .with_title(app.title())
        .build(&event_loop)?;

    let mut gpu = pollster::block_on(GpuState::new(
        &window,
        &app.frame,
        app.engine.shapes().kind(),
    ))?;
    log::info!("[keys] press H for controls");

    event_loop.run(move |event, elwt| match event {
        Event::WindowEvent { event, .. } => match event {
            WindowEvent::Resized(size) => gpu.resize(size),
            WindowEvent::CloseRequested => elwt.exit(),
            WindowEvent::ModifiersChanged(modifiers) => app.modifiers = modifiers.state(),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        logical_key,
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => {
                if let Some(action) = action_for_key(&logical_key, app.modifiers.shift_key()) {
                    app.handle(action, &mut gpu, elwt);
                }
            }
            _ => {}
        },
        Event::AboutToWait => match app.redraw(&mut gpu) {
            Ok(_) => gpu.window.request_redraw(),
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                gpu.resize(gpu.window.inner_size())
            }
            Err(wgpu::SurfaceError::OutOfMemory) => elwt.exit(),
            Err(err) => log::warn!("[gpu] frame skipped: {err}"),
        },
        Event::LoopExiting => app.shutdown(),
        _ => {}
    })?;
    Ok(())
}
