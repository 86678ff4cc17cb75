use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::app::{LoopConfig, LoopSettings};
use crate::assets::{validate_asset_key, AssetKeyError};
use crate::world::{
    AnimationDef, AnimationRegistry, CharacterConfig, EntityConfig, PlayerConfig, SheetLayout,
    ANIMATION_IDLE, ANIMATION_WALK,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {source}")]
    Parse {
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to parse config at {field}: {source}")]
    ParseField {
        field: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("validation failed at {field}: {message}")]
    Invalid { field: String, message: String },
    #[error("validation failed at {field}: {source}")]
    InvalidAssetKey {
        field: String,
        #[source]
        source: AssetKeyError,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GameConfig {
    pub window: WindowSettings,
    pub canvas: CanvasSettings,
    pub timing: TimingSettings,
    pub debug_bounds: bool,
    pub player: PlayerSettings,
    pub animations: BTreeMap<String, AnimationDef>,
}

impl Default for GameConfig {
    fn default() -> Self {
        let mut animations = BTreeMap::new();
        animations.insert(ANIMATION_IDLE.to_string(), AnimationDef::new(1, 1.0, true));
        animations.insert(ANIMATION_WALK.to_string(), AnimationDef::new(4, 8.0, true));
        Self {
            window: WindowSettings::default(),
            canvas: CanvasSettings::default(),
            timing: TimingSettings::default(),
            debug_bounds: false,
            player: PlayerSettings::default(),
            animations,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WindowSettings {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            title: "Top-Down Arena".to_string(),
            width: 800,
            height: 600,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CanvasSettings {
    pub width: u32,
    pub height: u32,
}

impl Default for CanvasSettings {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TimingSettings {
    pub max_frame_delta_ms: u64,
    pub stats_interval_ms: u64,
    pub max_render_fps: Option<u32>,
    pub simulated_slow_frame_ms: u64,
}

impl Default for TimingSettings {
    fn default() -> Self {
        Self {
            max_frame_delta_ms: 100,
            stats_interval_ms: 1000,
            max_render_fps: None,
            simulated_slow_frame_ms: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlayerSettings {
    pub speed: f32,
    pub health: f32,
    pub width: f32,
    pub height: f32,
    pub sprite: Option<SpriteSettings>,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            speed: 150.0,
            health: 100.0,
            width: 32.0,
            height: 32.0,
            sprite: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SpriteSettings {
    pub key: String,
    pub frame_width: u32,
    pub frame_height: u32,
    #[serde(default)]
    pub directional: bool,
}

impl SpriteSettings {
    /// Rows follow the sorted animation names of the config.
    pub fn layout(&self, animations: &BTreeMap<String, AnimationDef>) -> SheetLayout {
        SheetLayout {
            frame_width: self.frame_width,
            frame_height: self.frame_height,
            animations: animations.keys().cloned().collect(),
            directional: self.directional,
        }
    }
}

impl GameConfig {
    pub fn canvas_size(&self) -> (f32, f32) {
        (self.canvas.width as f32, self.canvas.height as f32)
    }

    pub fn animation_registry(&self) -> AnimationRegistry {
        self.animations
            .iter()
            .fold(AnimationRegistry::new(), |registry, (name, def)| {
                registry.with_animation(name, *def)
            })
    }

    pub fn loop_settings(&self) -> LoopSettings {
        LoopSettings {
            max_frame_delta: Duration::from_millis(self.timing.max_frame_delta_ms),
            stats_interval: Duration::from_millis(self.timing.stats_interval_ms),
            debug_bounds: self.debug_bounds,
        }
    }

    pub fn loop_config(&self) -> LoopConfig {
        LoopConfig {
            window_title: self.window.title.clone(),
            window_width: self.window.width,
            window_height: self.window.height,
            canvas_width: self.canvas.width,
            canvas_height: self.canvas.height,
            max_render_fps: self.timing.max_render_fps,
            simulated_slow_frame_ms: self.timing.simulated_slow_frame_ms,
        }
    }

    pub fn player_config(&self) -> PlayerConfig {
        let (canvas_width, canvas_height) = self.canvas_size();
        let defaults = PlayerConfig::default();
        PlayerConfig {
            character: CharacterConfig {
                entity: EntityConfig {
                    width: self.player.width,
                    height: self.player.height,
                    radius: None,
                    health: self.player.health,
                },
                speed: self.player.speed,
                ..defaults.character
            },
            canvas_width,
            canvas_height,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.canvas.width == 0 || self.canvas.height == 0 {
            return Err(invalid("canvas", "width and height must be non-zero"));
        }
        if self.window.width == 0 || self.window.height == 0 {
            return Err(invalid("window", "width and height must be non-zero"));
        }
        if self.timing.max_frame_delta_ms == 0 {
            return Err(invalid("timing.max_frame_delta_ms", "must be non-zero"));
        }
        if self.timing.stats_interval_ms == 0 {
            return Err(invalid("timing.stats_interval_ms", "must be non-zero"));
        }
        if !self.player.speed.is_finite() || self.player.speed < 0.0 {
            return Err(invalid("player.speed", "must be finite and non-negative"));
        }
        if !self.player.health.is_finite() || self.player.health <= 0.0 {
            return Err(invalid("player.health", "must be finite and positive"));
        }
        if !(self.player.width > 0.0 && self.player.height > 0.0) {
            return Err(invalid("player", "width and height must be positive"));
        }
        if let Some(sprite) = &self.player.sprite {
            validate_asset_key(&sprite.key).map_err(|source| ConfigError::InvalidAssetKey {
                field: "player.sprite.key".to_string(),
                source,
            })?;
            if sprite.frame_width == 0 || sprite.frame_height == 0 {
                return Err(invalid("player.sprite", "frame size must be non-zero"));
            }
        }
        for (name, def) in &self.animations {
            if def.frames == 0 {
                return Err(invalid(
                    &format!("animations.{name}.frames"),
                    "must be at least 1",
                ));
            }
            if !def.fps.is_finite() || def.fps <= 0.0 {
                return Err(invalid(
                    &format!("animations.{name}.fps"),
                    "must be finite and positive",
                ));
            }
        }
        Ok(())
    }
}

fn invalid(field: &str, message: &str) -> ConfigError {
    ConfigError::Invalid {
        field: field.to_string(),
        message: message.to_string(),
    }
}

pub fn load_game_config(path: &Path) -> Result<GameConfig, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_game_config(&raw)
}

pub fn parse_game_config(raw: &str) -> Result<GameConfig, ConfigError> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    let config: GameConfig = serde_path_to_error::deserialize(&mut deserializer).map_err(|error| {
        let field = error.path().to_string();
        let source = error.into_inner();
        if field.is_empty() || field == "." {
            ConfigError::Parse { source }
        } else {
            ConfigError::ParseField { field, source }
        }
    })?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn empty_object_yields_defaults() {
        let config = parse_game_config("{}").expect("parse");
        assert_eq!(config, GameConfig::default());
        assert_eq!(config.canvas_size(), (800.0, 600.0));
        assert_eq!(config.player.speed, 150.0);
        assert_eq!(config.timing.max_frame_delta_ms, 100);
    }

    #[test]
    fn default_registry_has_idle_and_walk() {
        let registry = GameConfig::default().animation_registry();
        assert_eq!(registry.len(), 2);
        assert_eq!(
            registry.get(ANIMATION_WALK),
            Some(&AnimationDef::new(4, 8.0, true))
        );
        assert_eq!(
            registry.get(ANIMATION_IDLE),
            Some(&AnimationDef::new(1, 1.0, true))
        );
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let config = parse_game_config(
            r#"{ "player": { "speed": 200 }, "timing": { "max_render_fps": 60 } }"#,
        )
        .expect("parse");
        assert_eq!(config.player.speed, 200.0);
        assert_eq!(config.player.health, 100.0);
        assert_eq!(config.timing.max_render_fps, Some(60));
        assert_eq!(config.timing.stats_interval_ms, 1000);
    }

    #[test]
    fn derived_settings_follow_config() {
        let config = parse_game_config(
            r#"{
                "canvas": { "width": 640, "height": 480 },
                "debug_bounds": true,
                "timing": { "max_frame_delta_ms": 50 }
            }"#,
        )
        .expect("parse");

        let settings = config.loop_settings();
        assert_eq!(settings.max_frame_delta, Duration::from_millis(50));
        assert!(settings.debug_bounds);

        let loop_config = config.loop_config();
        assert_eq!((loop_config.canvas_width, loop_config.canvas_height), (640, 480));

        let player = config.player_config();
        assert_eq!((player.canvas_width, player.canvas_height), (640.0, 480.0));
        assert_eq!(player.character.kind, "player");
        assert_eq!(player.character.speed, 150.0);
    }

    #[test]
    fn unknown_field_reports_path() {
        let error = parse_game_config(r#"{ "player": { "sped": 1 } }"#).expect_err("error");
        let message = error.to_string();
        assert!(message.contains("player"), "{message}");
        assert!(message.contains("unknown field"), "{message}");
    }

    #[test]
    fn type_mismatch_reports_nested_path() {
        let error = parse_game_config(r#"{ "animations": { "walk": { "fps": "fast" } } }"#)
            .expect_err("error");
        assert!(matches!(
            &error,
            ConfigError::ParseField { field, .. } if field == "animations.walk.fps"
        ));
    }

    #[test]
    fn malformed_json_has_no_field() {
        let error = parse_game_config("{").expect_err("error");
        assert!(matches!(error, ConfigError::Parse { .. }));
    }

    #[test]
    fn validation_rejects_bad_values() {
        let cases = [
            (r#"{ "canvas": { "width": 0 } }"#, "canvas"),
            (r#"{ "player": { "speed": -1 } }"#, "player.speed"),
            (r#"{ "player": { "health": 0 } }"#, "player.health"),
            (
                r#"{ "animations": { "spin": { "frames": 0 } } }"#,
                "animations.spin.frames",
            ),
            (
                r#"{ "animations": { "spin": { "fps": 0 } } }"#,
                "animations.spin.fps",
            ),
            (r#"{ "timing": { "stats_interval_ms": 0 } }"#, "timing.stats_interval_ms"),
        ];
        for (raw, expected_field) in cases {
            let error = parse_game_config(raw).expect_err(raw);
            assert!(
                matches!(&error, ConfigError::Invalid { field, .. } if field == expected_field),
                "{raw}: {error}"
            );
        }
    }

    #[test]
    fn validation_rejects_bad_sprite_key() {
        let error = parse_game_config(
            r#"{ "player": { "sprite": { "key": "Hero.png", "frame_width": 32, "frame_height": 32 } } }"#,
        )
        .expect_err("error");
        assert!(matches!(error, ConfigError::InvalidAssetKey { .. }));
    }

    #[test]
    fn sprite_layout_rows_follow_sorted_animation_names() {
        let config = parse_game_config(
            r#"{ "player": { "sprite": { "key": "hero", "frame_width": 16, "frame_height": 24, "directional": true } } }"#,
        )
        .expect("parse");
        let sprite = config.player.sprite.as_ref().expect("sprite");
        let layout = sprite.layout(&config.animations);
        assert_eq!(layout.animations, vec!["idle", "walk"]);
        assert_eq!((layout.frame_width, layout.frame_height), (16, 24));
        assert!(layout.directional);
    }

    #[test]
    fn load_reads_file_and_reports_missing() {
        let temp = TempDir::new().expect("temp dir");
        let path = temp.path().join("game.json");
        fs::write(&path, r#"{ "window": { "title": "Test" } }"#).expect("write");

        let config = load_game_config(&path).expect("load");
        assert_eq!(config.window.title, "Test");

        let error = load_game_config(&temp.path().join("missing.json")).expect_err("error");
        assert!(matches!(error, ConfigError::Read { .. }));
    }
}
