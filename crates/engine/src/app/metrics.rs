use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use serde::Serialize;
use tracing::warn;

static METRICS_LOCK_POISON_WARNED: AtomicBool = AtomicBool::new(false);

fn warn_metrics_lock_poison_once(operation: &'static str) {
    if METRICS_LOCK_POISON_WARNED
        .compare_exchange(false, true, Ordering::Relaxed, Ordering::Relaxed)
        .is_ok()
    {
        warn!(operation, "metrics lock poisoned; recovered inner value");
    }
}

/// Per-tick statistics exposed to HUD and host code.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct LoopStatsSnapshot {
    /// Frames per second over the last completed stats interval.
    pub fps: f32,
    pub frame_time_ms: f32,
    pub enemies: usize,
    pub score: u64,
    pub entity_count: usize,
    /// Clamped delta used by the latest tick.
    pub delta_seconds: f32,
}

#[derive(Clone, Debug, Default)]
pub struct MetricsHandle {
    snapshot: Arc<RwLock<LoopStatsSnapshot>>,
}

impl MetricsHandle {
    pub fn snapshot(&self) -> LoopStatsSnapshot {
        match self.snapshot.read() {
            Ok(guard) => *guard,
            Err(poisoned) => {
                warn_metrics_lock_poison_once("read");
                *poisoned.into_inner()
            }
        }
    }

    pub(crate) fn publish(&self, snapshot: LoopStatsSnapshot) {
        match self.snapshot.write() {
            Ok(mut guard) => *guard = snapshot,
            Err(poisoned) => {
                warn_metrics_lock_poison_once("write");
                let mut guard = poisoned.into_inner();
                *guard = snapshot;
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct FrameRate {
    pub(crate) fps: f32,
    pub(crate) frame_time_ms: f32,
}

/// Frame-rate window driven by summed raw frame deltas rather than the wall
/// clock, so identical delta sequences always produce identical statistics.
#[derive(Debug)]
pub(crate) struct FrameRateWindow {
    interval: Duration,
    frames: u32,
    elapsed: Duration,
}

impl FrameRateWindow {
    pub(crate) fn new(interval: Duration) -> Self {
        Self {
            interval,
            frames: 0,
            elapsed: Duration::ZERO,
        }
    }

    /// Returns the rolled-over rate once the window has covered `interval`.
    pub(crate) fn record_frame(&mut self, raw_dt: Duration) -> Option<FrameRate> {
        self.frames = self.frames.saturating_add(1);
        self.elapsed = self.elapsed.saturating_add(raw_dt);
        if self.elapsed < self.interval {
            return None;
        }

        let elapsed_seconds = self.elapsed.as_secs_f32().max(f32::EPSILON);
        let rate = FrameRate {
            fps: self.frames as f32 / elapsed_seconds,
            frame_time_ms: (elapsed_seconds / self.frames as f32) * 1000.0,
        };

        self.frames = 0;
        self.elapsed = Duration::ZERO;

        Some(rate)
    }
}
