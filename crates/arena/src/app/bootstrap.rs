use std::path::Path;
use std::sync::Arc;

use engine::{
    load_game_config, resolve_app_paths, AppError, ConfigError, GameConfig, GameLoop, LoopConfig,
    SpriteLibrary,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use super::gameplay::{ArenaRules, ArenaScene, ArenaSetup, PlayerSprite};

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) game: GameLoop,
}

pub(crate) fn build_app() -> Result<AppWiring, AppError> {
    info!("=== Top-Down Arena Startup ===");

    let paths = resolve_app_paths()?;
    info!(root = %paths.root.display(), "app_root_resolved");
    let config = load_config_or_default(&paths.config_path)?;
    let game = build_game(&config, &paths.sprites_dir);

    Ok(AppWiring {
        config: config.loop_config(),
        game,
    })
}

pub(crate) fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

fn load_config_or_default(path: &Path) -> Result<GameConfig, ConfigError> {
    if !path.is_file() {
        warn!(path = %path.display(), "config_missing_using_defaults");
        return Ok(GameConfig::default());
    }
    let config = load_game_config(path)?;
    info!(path = %path.display(), "config_loaded");
    Ok(config)
}

fn build_game(config: &GameConfig, sprites_dir: &Path) -> GameLoop {
    let animations = Arc::new(config.animation_registry());

    // A missing sheet is not fatal; the player falls back to the plain box.
    let player_sprite = config.player.sprite.as_ref().and_then(|sprite| {
        let layout = sprite.layout(&config.animations);
        SpriteLibrary::new(sprites_dir.to_path_buf())
            .sheet(&sprite.key, &layout, &animations)
            .map(|sheet| PlayerSprite {
                sheet,
                animations: Arc::clone(&animations),
            })
    });

    let scene = ArenaScene::new(
        ArenaSetup {
            player: config.player_config(),
            player_sprite,
        },
        ArenaRules::default(),
    );
    let (canvas_width, canvas_height) = config.canvas_size();
    GameLoop::new(
        canvas_width,
        canvas_height,
        animations,
        Box::new(scene),
        config.loop_settings(),
    )
}
