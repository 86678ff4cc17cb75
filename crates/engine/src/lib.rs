use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod app;
pub mod assets;
pub mod config;
pub mod world;

pub use app::{
    run_app, Actor, AppError, EntityId, FrameSurface, GameLoop, InputAction, InputHandle,
    InputQuery, InputSnapshot, LoopConfig, LoopSettings, LoopStatsSnapshot, MetricsHandle,
    RenderSurface, Renderer, Rgba, Scene, SceneCommand, TickReport, World, ENEMY_TAG,
    SLOW_FRAME_ENV_VAR,
};
pub use assets::{validate_asset_key, AssetKeyError, SpriteLibrary};
pub use config::{load_game_config, parse_game_config, ConfigError, GameConfig};
pub use world::{
    AnimationDef, AnimationRegistry, AnimationState, Character, CharacterConfig, CharacterInfo,
    Direction, Entity, EntityConfig, Player, PlayerConfig, PlayerStats, Rect, SheetLayout,
    SheetSprite, Sprite, SpriteDimensions, SpriteSheet, Vec2,
};

pub const ROOT_ENV_VAR: &str = "TOPDOWN_ROOT";
pub const CONFIG_ENV_VAR: &str = "TOPDOWN_CONFIG";

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub root: PathBuf,
    pub assets_dir: PathBuf,
    pub sprites_dir: PathBuf,
    pub config_path: PathBuf,
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to read environment variable {var}: {source}")]
    EnvVar {
        var: &'static str,
        #[source]
        source: env::VarError,
    },
    #[error("failed to resolve current executable path: {0}")]
    CurrentExe(#[source] std::io::Error),
    #[error("current executable path has no parent directory: {0}")]
    ExeHasNoParent(PathBuf),
    #[error(
        "TOPDOWN_ROOT is set but does not point to a valid project root: {path}\n\
A valid root must contain Cargo.toml and either crates/ or assets/."
    )]
    InvalidEnvRoot { path: PathBuf },
    #[error(
        "Could not detect project root by walking upward from executable directory: {start_dir}\n\
Expected a directory containing Cargo.toml and either crates/ or assets/.\n\
Set {env_var} explicitly, for example:\n\
Bash/zsh: export {env_var}=\"/path/to/topdown\""
    )]
    RootNotFound {
        start_dir: PathBuf,
        env_var: &'static str,
    },
}

pub fn resolve_app_paths() -> Result<AppPaths, StartupError> {
    let root = resolve_root()?;
    let config_override = read_optional_env(CONFIG_ENV_VAR)?.map(PathBuf::from);
    Ok(app_paths_for_root(root, config_override))
}

fn app_paths_for_root(root: PathBuf, config_override: Option<PathBuf>) -> AppPaths {
    let assets_dir = root.join("assets");
    let sprites_dir = assets_dir.join("sprites");
    let config_path = config_override.unwrap_or_else(|| assets_dir.join("game.json"));
    AppPaths {
        root,
        assets_dir,
        sprites_dir,
        config_path,
    }
}

fn read_optional_env(var: &'static str) -> Result<Option<String>, StartupError> {
    match env::var(var) {
        Ok(value) => Ok(Some(value)),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(source) => Err(StartupError::EnvVar { var, source }),
    }
}

fn resolve_root() -> Result<PathBuf, StartupError> {
    match read_optional_env(ROOT_ENV_VAR)? {
        Some(value) => {
            let normalized = normalize_path(&PathBuf::from(value));
            if is_repo_marker(&normalized) {
                Ok(normalized)
            } else {
                Err(StartupError::InvalidEnvRoot { path: normalized })
            }
        }
        None => {
            let exe = env::current_exe().map_err(StartupError::CurrentExe)?;
            let exe_dir = exe
                .parent()
                .map(Path::to_path_buf)
                .ok_or_else(|| StartupError::ExeHasNoParent(exe.clone()))?;

            for candidate in exe_dir.ancestors() {
                if is_repo_marker(candidate) {
                    return Ok(normalize_path(candidate));
                }
            }

            Err(StartupError::RootNotFound {
                start_dir: normalize_path(&exe_dir),
                env_var: ROOT_ENV_VAR,
            })
        }
    }
}

fn is_repo_marker(path: &Path) -> bool {
    let cargo_toml = path.join("Cargo.toml").is_file();
    let has_crates = path.join("crates").is_dir();
    let has_assets = path.join("assets").is_dir();

    cargo_toml && (has_crates || has_assets)
}

fn normalize_path(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn repo_marker_requires_cargo_toml() {
        let cwd = env::current_dir().expect("cwd");
        assert!(!is_repo_marker(&cwd.join("definitely_not_a_marker")));
    }

    #[test]
    fn repo_marker_accepts_cargo_toml_with_assets() {
        let temp = TempDir::new().expect("temp dir");
        fs::write(temp.path().join("Cargo.toml"), "").expect("write");
        assert!(!is_repo_marker(temp.path()));

        fs::create_dir(temp.path().join("assets")).expect("mkdir");
        assert!(is_repo_marker(temp.path()));
    }

    #[test]
    fn app_paths_default_to_assets_layout() {
        let paths = app_paths_for_root(PathBuf::from("/game"), None);
        assert_eq!(paths.sprites_dir, Path::new("/game/assets/sprites"));
        assert_eq!(paths.config_path, Path::new("/game/assets/game.json"));
    }

    #[test]
    fn app_paths_honour_config_override() {
        let paths = app_paths_for_root(PathBuf::from("/game"), Some(PathBuf::from("/tmp/custom.json")));
        assert_eq!(paths.config_path, Path::new("/tmp/custom.json"));
        assert_eq!(paths.assets_dir, Path::new("/game/assets"));
    }
}
