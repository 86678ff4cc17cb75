use std::env;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use pixels::Error as PixelsError;
use thiserror::Error;
use tracing::{info, warn};
use winit::dpi::LogicalSize;
use winit::error::{EventLoopError, OsError};
use winit::event::{ElementState, Event, MouseButton, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::WindowBuilder;

use crate::config::ConfigError;
use crate::world::Vec2;
use crate::StartupError;

use super::input::ActionStates;
use super::{GameLoop, InputAction, InputSnapshot, LoopStatsSnapshot, Renderer};

pub const SLOW_FRAME_ENV_VAR: &str = "TOPDOWN_SLOW_FRAME_MS";

#[derive(Debug, Clone, PartialEq)]
pub struct LoopConfig {
    pub window_title: String,
    pub window_width: u32,
    pub window_height: u32,
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub max_render_fps: Option<u32>,
    pub simulated_slow_frame_ms: u64,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            window_title: "Top-Down Arena".to_string(),
            window_width: 800,
            window_height: 600,
            canvas_width: 800,
            canvas_height: 600,
            max_render_fps: None,
            simulated_slow_frame_ms: 0,
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to create event loop: {0}")]
    CreateEventLoop(#[source] EventLoopError),
    #[error("failed to create application window: {0}")]
    CreateWindow(#[source] OsError),
    #[error("failed to initialize renderer: {0}")]
    CreateRenderer(#[source] PixelsError),
    #[error("event loop failed: {0}")]
    EventLoopRun(#[source] EventLoopError),
}

/// Hosts `game` in a window: one tick and one present per redraw.
pub fn run_app(config: LoopConfig, mut game: GameLoop) -> Result<(), AppError> {
    let event_loop = EventLoop::new().map_err(AppError::CreateEventLoop)?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(config.window_title.clone())
            .with_inner_size(LogicalSize::new(
                config.window_width as f64,
                config.window_height as f64,
            ))
            .build(&event_loop)
            .map_err(AppError::CreateWindow)?,
    );
    let mut renderer = Renderer::new(
        Arc::clone(&window),
        config.canvas_width.max(1),
        config.canvas_height.max(1),
    )
    .map_err(AppError::CreateRenderer)?;

    event_loop.set_control_flow(ControlFlow::Poll);

    let pacing = FramePacing::from_config(&config, slow_frame_override());
    let mut input_collector = InputCollector::default();

    info!(
        canvas_width = config.canvas_width,
        canvas_height = config.canvas_height,
        slow_frame_ms = pacing.slow_frame.as_millis() as u64,
        min_frame_ms = ?pacing.min_frame.map(|min| min.as_secs_f64() * 1000.0),
        "loop_config"
    );

    game.start();

    let mut last_frame_instant = Instant::now();
    let mut last_present_instant = Instant::now();
    let mut last_applied_title: Option<String> = None;

    event_loop
        .run(move |event, window_target| match event {
            Event::WindowEvent { window_id, event } if window_id == window.id() => match event {
                WindowEvent::CloseRequested => {
                    input_collector.mark_quit_requested();
                    info!(reason = "window_close", "shutdown_requested");
                    window_target.exit();
                }
                WindowEvent::Resized(new_size) => {
                    if let Err(error) = renderer.resize(new_size.width, new_size.height) {
                        warn!(error = %error, "renderer_resize_failed");
                        window_target.exit();
                    }
                }
                WindowEvent::ScaleFactorChanged { .. } => {
                    let size = window.inner_size();
                    if let Err(error) = renderer.resize(size.width, size.height) {
                        warn!(error = %error, "renderer_resize_failed");
                        window_target.exit();
                    }
                }
                WindowEvent::CursorMoved { position, .. } => {
                    input_collector.set_cursor_position(
                        renderer.window_to_canvas(position.x as f32, position.y as f32),
                    );
                }
                WindowEvent::CursorLeft { .. } => {
                    input_collector.set_cursor_position(None);
                }
                WindowEvent::MouseInput { state, button, .. } => {
                    input_collector.handle_mouse_input(button, state);
                }
                WindowEvent::KeyboardInput { event, .. } => {
                    input_collector.handle_keyboard_input(&event);
                    if input_collector.quit_requested {
                        info!(reason = "escape_key", "shutdown_requested");
                        window_target.exit();
                    }
                }
                WindowEvent::RedrawRequested => {
                    if input_collector.debug_toggle.take() {
                        game.toggle_debug_bounds();
                    }

                    // Debug perturbation, separate from the render cap.
                    if !pacing.slow_frame.is_zero() {
                        thread::sleep(pacing.slow_frame);
                    }

                    let now = Instant::now();
                    let raw_frame_dt = now.saturating_duration_since(last_frame_instant);
                    last_frame_instant = now;

                    game.tick(raw_frame_dt, input_collector.snapshot_for_tick());
                    if !game.is_running() {
                        window_target.exit();
                        return;
                    }

                    let cap_sleep = pacing
                        .cap_sleep(Instant::now().saturating_duration_since(last_present_instant));
                    if !cap_sleep.is_zero() {
                        thread::sleep(cap_sleep);
                    }

                    if let Err(error) = renderer.render(&game) {
                        warn!(error = %error, "renderer_draw_failed");
                        window_target.exit();
                    }
                    last_present_instant = Instant::now();

                    let next_title = format_window_title(
                        &config.window_title,
                        &game.stats(),
                        game.debug_title().as_deref(),
                    );
                    if last_applied_title.as_deref() != Some(next_title.as_str()) {
                        window.set_title(&next_title);
                        last_applied_title = Some(next_title);
                    }
                }
                _ => {}
            },
            Event::AboutToWait => {
                window.request_redraw();
            }
            Event::LoopExiting => {
                if game.is_running() {
                    game.stop();
                }
                info!("shutdown");
            }
            _ => {}
        })
        .map_err(AppError::EventLoopRun)
}

/// Per-redraw pacing taken from `LoopConfig`: the render cap as a minimum
/// frame time, and the debug slow-frame delay.
#[derive(Debug, Clone, Copy, PartialEq)]
struct FramePacing {
    min_frame: Option<Duration>,
    slow_frame: Duration,
}

impl FramePacing {
    /// A parseable `override_ms` wins over the configured slow frame.
    fn from_config(config: &LoopConfig, override_ms: Option<String>) -> Self {
        let slow_frame_ms = override_ms
            .and_then(|raw| match raw.trim().parse::<u64>() {
                Ok(ms) => Some(ms),
                Err(_) => {
                    warn!(
                        env_var = SLOW_FRAME_ENV_VAR,
                        value = raw.as_str(),
                        "slow_frame_override_ignored"
                    );
                    None
                }
            })
            .unwrap_or(config.simulated_slow_frame_ms);

        Self {
            min_frame: config
                .max_render_fps
                .filter(|fps| *fps > 0)
                .map(|fps| Duration::from_secs_f64(1.0 / f64::from(fps))),
            slow_frame: Duration::from_millis(slow_frame_ms),
        }
    }

    fn cap_sleep(&self, since_last_present: Duration) -> Duration {
        self.min_frame
            .map_or(Duration::ZERO, |min| min.saturating_sub(since_last_present))
    }
}

fn slow_frame_override() -> Option<String> {
    match env::var(SLOW_FRAME_ENV_VAR) {
        Ok(raw) => Some(raw),
        Err(env::VarError::NotPresent) => None,
        Err(error) => {
            warn!(env_var = SLOW_FRAME_ENV_VAR, error = %error, "slow_frame_override_unreadable");
            None
        }
    }
}

/// Latches a key press until taken. Auto-repeat while held does not latch again.
#[derive(Debug, Default)]
struct KeyLatch {
    held: bool,
    latched: bool,
}

impl KeyLatch {
    fn set_down(&mut self, is_down: bool) {
        if is_down && !self.held {
            self.latched = true;
        }
        self.held = is_down;
    }

    fn take(&mut self) -> bool {
        std::mem::take(&mut self.latched)
    }
}

#[derive(Debug, Default)]
struct InputCollector {
    quit_requested: bool,
    action_states: ActionStates,
    cursor_position: Option<Vec2>,
    left_mouse_is_down: bool,
    right_mouse_is_down: bool,
    space_is_down: bool,
    debug_toggle: KeyLatch,
}

impl InputCollector {
    fn mark_quit_requested(&mut self) {
        self.quit_requested = true;
    }

    fn handle_keyboard_input(&mut self, key_event: &winit::event::KeyEvent) {
        self.apply_key(key_event.physical_key, key_event.state == ElementState::Pressed);
    }

    fn snapshot_for_tick(&self) -> InputSnapshot {
        let mut actions = self.action_states;
        actions.set(InputAction::PrimaryAction, self.left_mouse_is_down);
        actions.set(
            InputAction::SecondaryAction,
            self.right_mouse_is_down || self.space_is_down,
        );
        InputSnapshot::new(self.quit_requested, actions, self.cursor_position)
    }

    fn apply_key(&mut self, key: PhysicalKey, is_pressed: bool) {
        let PhysicalKey::Code(code) = key else {
            return;
        };
        let action = match code {
            KeyCode::KeyW | KeyCode::ArrowUp => InputAction::MoveUp,
            KeyCode::KeyS | KeyCode::ArrowDown => InputAction::MoveDown,
            KeyCode::KeyA | KeyCode::ArrowLeft => InputAction::MoveLeft,
            KeyCode::KeyD | KeyCode::ArrowRight => InputAction::MoveRight,
            KeyCode::Escape => {
                if is_pressed {
                    self.mark_quit_requested();
                }
                InputAction::Quit
            }
            KeyCode::Space => {
                self.space_is_down = is_pressed;
                return;
            }
            KeyCode::F3 => {
                self.debug_toggle.set_down(is_pressed);
                return;
            }
            _ => return,
        };
        self.action_states.set(action, is_pressed);
    }

    fn set_cursor_position(&mut self, position: Option<Vec2>) {
        self.cursor_position = position;
    }

    fn handle_mouse_input(&mut self, button: MouseButton, state: ElementState) {
        let is_down = state == ElementState::Pressed;
        match button {
            MouseButton::Left => self.left_mouse_is_down = is_down,
            MouseButton::Right => self.right_mouse_is_down = is_down,
            _ => {}
        }
    }
}

fn format_window_title(base: &str, stats: &LoopStatsSnapshot, scene_title: Option<&str>) -> String {
    let mut title = format!(
        "{base} | FPS: {:.0} | Enemies: {} | Score: {}",
        stats.fps, stats.enemies, stats.score
    );
    if let Some(scene_title) = scene_title {
        title.push_str(" | ");
        title.push_str(scene_title);
    }
    title
}
