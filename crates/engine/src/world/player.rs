use std::fmt;

use serde::Serialize;
use tracing::info;

use crate::app::{InputQuery, RenderSurface, Rgba};

use super::{AnimationRegistry, Character, CharacterConfig, CharacterInfo, EntityConfig, Vec2};

const DEFAULT_PLAYER_SPEED: f32 = 150.0;
const DEFAULT_CANVAS_WIDTH: f32 = 800.0;
const DEFAULT_CANVAS_HEIGHT: f32 = 600.0;

const MOVEMENT_RING_COLOR: Rgba = [0, 255, 0, 255];
const MOVEMENT_RING_PADDING: f32 = 5.0;
const DIRECTION_ARROW_COLOR: Rgba = [255, 255, 255, 255];
const DIRECTION_ARROW_LENGTH: f32 = 15.0;
const DIRECTION_ARROW_GAP: f32 = 10.0;
const DIRECTION_ARROW_HEAD_BACK: f32 = 5.0;
const DIRECTION_ARROW_HEAD_SPREAD: f32 = 3.0;

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerConfig {
    pub character: CharacterConfig,
    pub canvas_width: f32,
    pub canvas_height: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            character: CharacterConfig {
                entity: EntityConfig::default(),
                speed: DEFAULT_PLAYER_SPEED,
                kind: "player".to_string(),
                name: "Player".to_string(),
            },
            canvas_width: DEFAULT_CANVAS_WIDTH,
            canvas_height: DEFAULT_CANVAS_HEIGHT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerStats {
    #[serde(flatten)]
    pub info: CharacterInfo,
    pub score: u64,
    pub ammunition: u32,
}

/// The input-driven character. Without a bound input source it stays put.
pub struct Player {
    pub character: Character,
    pub canvas_width: f32,
    pub canvas_height: f32,
    input: Option<Box<dyn InputQuery>>,
    score: u64,
    ammunition: u32,
    weapon: Option<String>,
}

impl fmt::Debug for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Player")
            .field("character", &self.character)
            .field("canvas_width", &self.canvas_width)
            .field("canvas_height", &self.canvas_height)
            .field("input_bound", &self.input.is_some())
            .field("score", &self.score)
            .field("ammunition", &self.ammunition)
            .field("weapon", &self.weapon)
            .finish()
    }
}

impl Player {
    pub fn new(x: f32, y: f32, config: PlayerConfig) -> Self {
        Self {
            character: Character::new(x, y, config.character),
            canvas_width: config.canvas_width,
            canvas_height: config.canvas_height,
            input: None,
            score: 0,
            ammunition: 0,
            weapon: None,
        }
    }

    pub fn bind_input(
        &mut self,
        source: impl InputQuery + 'static,
        canvas_width: f32,
        canvas_height: f32,
    ) {
        self.input = Some(Box::new(source));
        self.canvas_width = canvas_width;
        self.canvas_height = canvas_height;
        info!(
            x = self.character.entity.position.x,
            y = self.character.entity.position.y,
            canvas_width,
            canvas_height,
            "player_input_bound"
        );
    }

    /// Drops the input source and halts, so the player is inert again.
    pub fn unbind_input(&mut self) {
        self.input = None;
        self.character.stop_movement();
    }

    pub fn is_input_bound(&self) -> bool {
        self.input.is_some()
    }

    pub fn update(&mut self, dt_seconds: f32, animations: &AnimationRegistry) {
        if let Some(input) = self.input.as_deref() {
            let intent = movement_intent(input);
            self.character.set_movement(intent.x, intent.y);
        }

        self.character.update(dt_seconds, animations);
        self.character
            .constrain_to_bounds(self.canvas_width, self.canvas_height);
    }

    pub fn render(&self, surface: &mut dyn RenderSurface, debug: bool) {
        self.character.render(surface, debug);
        if self.character.entity.visible {
            self.render_player_ui(surface);
        }
    }

    fn render_player_ui(&self, surface: &mut dyn RenderSurface) {
        let entity = &self.character.entity;
        if self.character.is_moving() {
            surface.stroke_circle(
                entity.position,
                entity.radius + MOVEMENT_RING_PADDING,
                MOVEMENT_RING_COLOR,
            );
        }

        let dir = entity.direction.unit_vector();
        let start = Vec2::new(
            entity.position.x,
            entity.position.y - entity.height / 2.0 - DIRECTION_ARROW_GAP,
        );
        let end = Vec2::new(
            start.x + dir.x * DIRECTION_ARROW_LENGTH,
            start.y + dir.y * DIRECTION_ARROW_LENGTH,
        );
        surface.draw_line(start, end, DIRECTION_ARROW_COLOR);

        let back = Vec2::new(
            end.x - dir.x * DIRECTION_ARROW_HEAD_BACK,
            end.y - dir.y * DIRECTION_ARROW_HEAD_BACK,
        );
        let spread = Vec2::new(
            dir.y * DIRECTION_ARROW_HEAD_SPREAD,
            -dir.x * DIRECTION_ARROW_HEAD_SPREAD,
        );
        surface.draw_line(
            end,
            Vec2::new(back.x + spread.x, back.y + spread.y),
            DIRECTION_ARROW_COLOR,
        );
        surface.draw_line(
            end,
            Vec2::new(back.x - spread.x, back.y - spread.y),
            DIRECTION_ARROW_COLOR,
        );
    }

    pub fn add_score(&mut self, points: u64) {
        self.score = self.score.saturating_add(points);
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn ammunition(&self) -> u32 {
        self.ammunition
    }

    pub fn weapon(&self) -> Option<&str> {
        self.weapon.as_deref()
    }

    /// Respawn state: full health, zeroed counters and velocity, alive and visible.
    pub fn reset(&mut self) {
        let entity = &mut self.character.entity;
        entity.health = entity.max_health;
        entity.velocity = Vec2::ZERO;
        entity.active = true;
        entity.visible = true;
        self.score = 0;
        self.ammunition = 0;
    }

    pub fn spawn(&mut self, x: f32, y: f32) {
        self.character.entity.move_to(x, y);
        self.reset();
        info!(x, y, "player_spawned");
    }

    pub fn stats(&self) -> PlayerStats {
        PlayerStats {
            info: self.character.info(),
            score: self.score,
            ammunition: self.ammunition,
        }
    }
}

fn movement_intent(input: &dyn InputQuery) -> Vec2 {
    let mut intent = Vec2::ZERO;
    if input.is_moving_up() {
        intent.y -= 1.0;
    }
    if input.is_moving_down() {
        intent.y += 1.0;
    }
    if input.is_moving_left() {
        intent.x -= 1.0;
    }
    if input.is_moving_right() {
        intent.x += 1.0;
    }
    intent
}
