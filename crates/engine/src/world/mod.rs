mod animation;
mod character;
mod entity;
mod player;
mod sprite;

use serde::{Deserialize, Serialize};

pub use animation::{AnimationDef, AnimationRegistry, AnimationState};
pub use character::{Character, CharacterConfig, CharacterInfo, ANIMATION_IDLE, ANIMATION_WALK};
pub use entity::{Entity, EntityConfig, DEFAULT_ENTITY_HEALTH, DEFAULT_ENTITY_SIZE};
pub use player::{Player, PlayerConfig, PlayerStats};
pub use sprite::{SheetLayout, SheetSprite, Sprite, SpriteDimensions, SpriteError, SpriteSheet};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn is_zero(self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }
}

/// Axis-aligned box; `x`/`y` is the top-left corner.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn centered(center: Vec2, width: f32, height: f32) -> Self {
        Self {
            x: center.x - width / 2.0,
            y: center.y - height / 2.0,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Strict overlap; boxes that only share an edge do not overlap.
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.right()
            && self.right() > other.x
            && self.y < other.bottom()
            && self.bottom() > other.y
    }
}

/// Screen-space facing. North is toward negative y.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    North,
    East,
    #[default]
    South,
    West,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    /// Dominant-axis facing for a velocity, `None` while stationary.
    ///
    /// Horizontal wins only when strictly larger; equal diagonals resolve to
    /// the vertical direction.
    pub fn from_velocity(velocity: Vec2) -> Option<Direction> {
        if velocity.is_zero() {
            return None;
        }
        let direction = if velocity.x.abs() > velocity.y.abs() {
            if velocity.x > 0.0 {
                Direction::East
            } else {
                Direction::West
            }
        } else if velocity.y > 0.0 {
            Direction::South
        } else {
            Direction::North
        };
        Some(direction)
    }

    pub const fn index(self) -> usize {
        match self {
            Direction::North => 0,
            Direction::East => 1,
            Direction::South => 2,
            Direction::West => 3,
        }
    }

    pub fn unit_vector(self) -> Vec2 {
        match self {
            Direction::North => Vec2::new(0.0, -1.0),
            Direction::East => Vec2::new(1.0, 0.0),
            Direction::South => Vec2::new(0.0, 1.0),
            Direction::West => Vec2::new(-1.0, 0.0),
        }
    }
}
