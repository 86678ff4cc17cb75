use serde::Serialize;

use crate::app::RenderSurface;

use super::{AnimationRegistry, AnimationState, Direction, Entity, EntityConfig, Sprite, Vec2};

pub const ANIMATION_IDLE: &str = "idle";
pub const ANIMATION_WALK: &str = "walk";

const DEFAULT_CHARACTER_SPEED: f32 = 100.0;

#[derive(Debug, Clone, PartialEq)]
pub struct CharacterConfig {
    pub entity: EntityConfig,
    pub speed: f32,
    pub kind: String,
    pub name: String,
}

impl Default for CharacterConfig {
    fn default() -> Self {
        Self {
            entity: EntityConfig::default(),
            speed: DEFAULT_CHARACTER_SPEED,
            kind: "character".to_string(),
            name: "Character".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CharacterInfo {
    pub name: String,
    pub kind: String,
    pub health: f32,
    pub max_health: f32,
    pub speed: f32,
    pub position: Vec2,
    pub direction: Direction,
    pub is_moving: bool,
}

/// An entity that walks: normalized movement intent, sticky facing, and an
/// idle/walk animation driven by whether it is moving.
#[derive(Debug)]
pub struct Character {
    pub entity: Entity,
    pub speed: f32,
    is_moving: bool,
    animation: AnimationState,
    kind: String,
    name: String,
}

impl Character {
    pub fn new(x: f32, y: f32, config: CharacterConfig) -> Self {
        Self {
            entity: Entity::new(x, y, config.entity),
            speed: config.speed,
            is_moving: false,
            animation: AnimationState::new(ANIMATION_IDLE),
            kind: config.kind,
            name: config.name,
        }
    }

    pub fn update(&mut self, dt_seconds: f32, animations: &AnimationRegistry) {
        self.entity.update(dt_seconds);

        self.is_moving = !self.entity.velocity.is_zero();

        let target = if self.is_moving {
            ANIMATION_WALK
        } else {
            ANIMATION_IDLE
        };
        if animations.set_animation(&mut self.animation, target, false) {
            if let Some(sprite) = self.entity.sprite_mut() {
                sprite.set_animation(target);
            }
        }
        animations.update_animation(&mut self.animation, dt_seconds);

        // Facing only changes while moving.
        if let Some(direction) = Direction::from_velocity(self.entity.velocity) {
            self.entity.direction = direction;
        }
    }

    pub fn render(&self, surface: &mut dyn RenderSurface, debug: bool) {
        self.entity.render(surface, debug);
    }

    /// Sets velocity from a direction intent, normalized so diagonals are no
    /// faster than a single axis. `(0, 0)` stops the character.
    pub fn set_movement(&mut self, dx: f32, dy: f32) {
        let magnitude = (dx * dx + dy * dy).sqrt();
        let (dx, dy) = if magnitude > 0.0 {
            (dx / magnitude, dy / magnitude)
        } else {
            (dx, dy)
        };
        self.entity.velocity = Vec2::new(dx * self.speed, dy * self.speed);
    }

    pub fn stop_movement(&mut self) {
        self.entity.velocity = Vec2::ZERO;
    }

    pub fn is_in_bounds(&self, canvas_width: f32, canvas_height: f32) -> bool {
        let half_width = self.entity.width / 2.0;
        let half_height = self.entity.height / 2.0;
        let position = self.entity.position;
        position.x >= half_width
            && position.x <= canvas_width - half_width
            && position.y >= half_height
            && position.y <= canvas_height - half_height
    }

    pub fn constrain_to_bounds(&mut self, canvas_width: f32, canvas_height: f32) {
        let half_width = self.entity.width / 2.0;
        let half_height = self.entity.height / 2.0;
        let position = &mut self.entity.position;
        position.x = position.x.min(canvas_width - half_width).max(half_width);
        position.y = position.y.min(canvas_height - half_height).max(half_height);
    }

    pub fn set_sprite(&mut self, mut sprite: Box<dyn Sprite>) {
        sprite.set_animation(self.animation.animation());
        self.entity.set_sprite(sprite);
    }

    pub fn is_moving(&self) -> bool {
        self.is_moving
    }

    pub fn animation_state(&self) -> &AnimationState {
        &self.animation
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn info(&self) -> CharacterInfo {
        CharacterInfo {
            name: self.name.clone(),
            kind: self.kind.clone(),
            health: self.entity.health,
            max_health: self.entity.max_health,
            speed: self.speed,
            position: self.entity.position,
            direction: self.entity.direction,
            is_moving: self.is_moving,
        }
    }
}
