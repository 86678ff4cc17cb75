use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::world::{AnimationRegistry, Player};

use super::metrics::FrameRateWindow;
use super::{
    InputHandle, InputSnapshot, LoopStatsSnapshot, MetricsHandle, RenderSurface, Scene,
    SceneCommand, World,
};

pub const DEFAULT_MAX_FRAME_DELTA: Duration = Duration::from_millis(100);
pub const DEFAULT_STATS_INTERVAL: Duration = Duration::from_secs(1);
pub const ENEMY_TAG: &str = "enemy";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoopSettings {
    /// Upper bound on the simulated step, however long the real frame took.
    pub max_frame_delta: Duration,
    pub stats_interval: Duration,
    pub debug_bounds: bool,
}

impl Default for LoopSettings {
    fn default() -> Self {
        Self {
            max_frame_delta: DEFAULT_MAX_FRAME_DELTA,
            stats_interval: DEFAULT_STATS_INTERVAL,
            debug_bounds: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickReport {
    pub dt_seconds: f32,
    pub pruned: usize,
    pub command: SceneCommand,
}

/// Single-threaded update/render driver. Owns the world, the animation
/// registry for the session, and the scene that supplies gameplay policy.
pub struct GameLoop {
    world: World,
    animations: Arc<AnimationRegistry>,
    scene: Box<dyn Scene>,
    input: InputHandle,
    metrics: MetricsHandle,
    frame_rate: FrameRateWindow,
    settings: LoopSettings,
    fps: f32,
    frame_time_ms: f32,
    running: bool,
    loaded: bool,
}

impl GameLoop {
    pub fn new(
        canvas_width: f32,
        canvas_height: f32,
        animations: Arc<AnimationRegistry>,
        scene: Box<dyn Scene>,
        settings: LoopSettings,
    ) -> Self {
        Self {
            world: World::new(canvas_width, canvas_height),
            animations,
            scene,
            input: InputHandle::default(),
            metrics: MetricsHandle::default(),
            frame_rate: FrameRateWindow::new(settings.stats_interval),
            settings,
            fps: 0.0,
            frame_time_ms: 0.0,
            running: false,
            loaded: false,
        }
    }

    /// Loads the scene on first start. Starting a running loop is ignored.
    pub fn start(&mut self) {
        if self.running {
            warn!("game loop already running; start ignored");
            return;
        }
        if !self.loaded {
            self.scene.load(&mut self.world, &self.input);
            self.loaded = true;
            info!(entity_count = self.world.len(), "scene_loaded");
        }
        self.running = true;
        info!(
            max_frame_delta_ms = self.settings.max_frame_delta.as_millis() as u64,
            stats_interval_ms = self.settings.stats_interval.as_millis() as u64,
            debug_bounds = self.settings.debug_bounds,
            "game_loop_started"
        );
    }

    pub fn stop(&mut self) {
        self.running = false;
        info!("game_loop_stopped");
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Advances one frame. Returns `None` while stopped.
    pub fn tick(&mut self, raw_dt: Duration, input: InputSnapshot) -> Option<TickReport> {
        if !self.running {
            return None;
        }

        let dt = clamp_frame_delta(raw_dt, self.settings.max_frame_delta);
        if dt < raw_dt {
            debug!(
                raw_dt_ms = raw_dt.as_millis() as u64,
                clamped_dt_ms = dt.as_millis() as u64,
                "frame_delta_clamped"
            );
        }
        let dt_seconds = dt.as_secs_f32();

        self.input.publish(input);
        let command = self.scene.update(dt_seconds, &input, &mut self.world);
        self.world.update_active(dt_seconds, &self.animations);
        self.scene.post_update(dt_seconds, &mut self.world);
        let pruned = self.world.prune_inactive();

        self.record_stats(raw_dt, dt_seconds);

        if command == SceneCommand::Quit {
            info!(reason = "scene", "shutdown_requested");
            self.stop();
        }

        Some(TickReport {
            dt_seconds,
            pruned,
            command,
        })
    }

    fn record_stats(&mut self, raw_dt: Duration, dt_seconds: f32) {
        let rolled_over = match self.frame_rate.record_frame(raw_dt) {
            Some(rate) => {
                self.fps = rate.fps;
                self.frame_time_ms = rate.frame_time_ms;
                true
            }
            None => false,
        };

        let snapshot = LoopStatsSnapshot {
            fps: self.fps,
            frame_time_ms: self.frame_time_ms,
            enemies: self.world.count_active_with_tag(ENEMY_TAG),
            score: self.world.player().map_or(0, Player::score),
            entity_count: self.world.len(),
            delta_seconds: dt_seconds,
        };
        self.metrics.publish(snapshot);

        if rolled_over {
            info!(
                fps = snapshot.fps,
                frame_time_ms = snapshot.frame_time_ms,
                entity_count = snapshot.entity_count,
                enemies = snapshot.enemies,
                score = snapshot.score,
                "loop_metrics"
            );
        }
    }

    pub fn render(&self, surface: &mut dyn RenderSurface) {
        self.world.render(surface, self.settings.debug_bounds);
    }

    pub fn toggle_debug_bounds(&mut self) -> bool {
        self.settings.debug_bounds = !self.settings.debug_bounds;
        info!(debug_bounds = self.settings.debug_bounds, "debug_bounds_toggled");
        self.settings.debug_bounds
    }

    pub fn debug_bounds(&self) -> bool {
        self.settings.debug_bounds
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn metrics_handle(&self) -> MetricsHandle {
        self.metrics.clone()
    }

    pub fn stats(&self) -> LoopStatsSnapshot {
        self.metrics.snapshot()
    }

    pub fn debug_title(&self) -> Option<String> {
        self.scene.debug_title(&self.world)
    }
}

pub(crate) fn clamp_frame_delta(frame_dt: Duration, max_frame_delta: Duration) -> Duration {
    frame_dt.min(max_frame_delta)
}
