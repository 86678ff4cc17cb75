mod game_loop;
mod input;
mod loop_runner;
mod metrics;
mod rendering;
mod scene;

pub use game_loop::{
    GameLoop, LoopSettings, TickReport, DEFAULT_MAX_FRAME_DELTA, DEFAULT_STATS_INTERVAL, ENEMY_TAG,
};
pub use input::{InputAction, InputHandle, InputQuery, InputSnapshot};
pub use loop_runner::{run_app, AppError, LoopConfig, SLOW_FRAME_ENV_VAR};
pub use metrics::{LoopStatsSnapshot, MetricsHandle};
pub use rendering::{FrameSurface, RenderSurface, Renderer, Rgba, RgbaRegion, CLEAR_COLOR};
pub use scene::{
    Actor, EntityId, EntityIdAllocator, Scene, SceneCommand, World, WorldEntity, PROP_TAG,
};
