use crate::app::{RenderSurface, Rgba};

use super::{Direction, Rect, Sprite, Vec2};

pub const DEFAULT_ENTITY_SIZE: f32 = 32.0;
pub const DEFAULT_ENTITY_HEALTH: f32 = 100.0;

const FALLBACK_FILL_COLOR: Rgba = [255, 255, 255, 255];
const DEBUG_BOUNDS_COLOR: Rgba = [255, 0, 0, 255];
const HEALTH_BAR_BACKGROUND_COLOR: Rgba = [51, 51, 51, 255];
const HEALTH_BAR_FILL_COLOR: Rgba = [255, 0, 0, 255];
const HEALTH_BAR_HEIGHT: f32 = 4.0;
const HEALTH_BAR_GAP: f32 = 8.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntityConfig {
    pub width: f32,
    pub height: f32,
    /// Defaults to half the smaller side.
    pub radius: Option<f32>,
    pub health: f32,
}

impl Default for EntityConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_ENTITY_SIZE,
            height: DEFAULT_ENTITY_SIZE,
            radius: None,
            health: DEFAULT_ENTITY_HEALTH,
        }
    }
}

/// Physical body shared by every simulated object: kinematics, bounds,
/// health, lifecycle flags and an optional sprite delegate.
#[derive(Debug)]
pub struct Entity {
    pub position: Vec2,
    pub previous_position: Vec2,
    pub velocity: Vec2,
    pub width: f32,
    pub height: f32,
    pub radius: f32,
    pub direction: Direction,
    pub health: f32,
    pub max_health: f32,
    pub active: bool,
    pub visible: bool,
    pub show_debug: bool,
    sprite: Option<Box<dyn Sprite>>,
}

impl Entity {
    pub fn new(x: f32, y: f32, config: EntityConfig) -> Self {
        let position = Vec2::new(x, y);
        Self {
            position,
            previous_position: position,
            velocity: Vec2::ZERO,
            width: config.width,
            height: config.height,
            radius: config
                .radius
                .unwrap_or_else(|| config.width.min(config.height) / 2.0),
            direction: Direction::default(),
            health: config.health,
            max_health: config.health,
            active: true,
            visible: true,
            show_debug: false,
            sprite: None,
        }
    }

    pub fn update(&mut self, dt_seconds: f32) {
        self.previous_position = self.position;
        self.position.x += self.velocity.x * dt_seconds;
        self.position.y += self.velocity.y * dt_seconds;

        if let Some(sprite) = self.sprite.as_mut() {
            sprite.update(dt_seconds);
        }
    }

    pub fn render(&self, surface: &mut dyn RenderSurface, debug: bool) {
        if !self.visible {
            return;
        }

        let drawn = self.sprite.as_deref().is_some_and(|sprite| {
            sprite.render(surface, self.position.x, self.position.y, self.direction)
        });
        if !drawn {
            surface.fill_rect(self.bounds(), FALLBACK_FILL_COLOR);
        }

        if debug || self.show_debug {
            self.render_debug(surface);
        }
    }

    fn render_debug(&self, surface: &mut dyn RenderSurface) {
        surface.stroke_rect(self.bounds(), DEBUG_BOUNDS_COLOR);
        surface.fill_rect(Rect::centered(self.position, 2.0, 2.0), DEBUG_BOUNDS_COLOR);

        if self.health < self.max_health {
            self.render_health_bar(surface);
        }
    }

    fn render_health_bar(&self, surface: &mut dyn RenderSurface) {
        let background = Rect {
            x: self.position.x - self.width / 2.0,
            y: self.position.y - self.height / 2.0 - HEALTH_BAR_GAP,
            width: self.width,
            height: HEALTH_BAR_HEIGHT,
        };
        surface.fill_rect(background, HEALTH_BAR_BACKGROUND_COLOR);

        let ratio = if self.max_health > 0.0 {
            (self.health / self.max_health).clamp(0.0, 1.0)
        } else {
            0.0
        };
        surface.fill_rect(
            Rect {
                width: self.width * ratio,
                ..background
            },
            HEALTH_BAR_FILL_COLOR,
        );
    }

    /// Replaces the sprite and adopts its reported size.
    pub fn set_sprite(&mut self, sprite: Box<dyn Sprite>) {
        let dimensions = sprite.dimensions();
        self.width = dimensions.width;
        self.height = dimensions.height;
        self.radius = self.width.min(self.height) / 2.0;
        self.sprite = Some(sprite);
    }

    pub fn clear_sprite(&mut self) -> Option<Box<dyn Sprite>> {
        self.sprite.take()
    }

    pub fn sprite(&self) -> Option<&dyn Sprite> {
        self.sprite.as_deref()
    }

    pub fn sprite_mut(&mut self) -> Option<&mut (dyn Sprite + 'static)> {
        self.sprite.as_deref_mut()
    }

    pub fn bounds(&self) -> Rect {
        Rect::centered(self.position, self.width, self.height)
    }

    pub fn collides_with(&self, other: &Entity) -> bool {
        self.bounds().overlaps(&other.bounds())
    }

    pub fn distance_to(&self, other: &Entity) -> f32 {
        let dx = self.position.x - other.position.x;
        let dy = self.position.y - other.position.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Bearing in radians from this entity toward `other`.
    pub fn angle_to(&self, other: &Entity) -> f32 {
        (other.position.y - self.position.y).atan2(other.position.x - self.position.x)
    }

    pub fn move_to(&mut self, x: f32, y: f32) {
        self.position = Vec2::new(x, y);
    }

    pub fn rollback_position(&mut self) {
        self.position = self.previous_position;
    }

    /// Returns true when health is exhausted. Deactivation is the caller's call.
    pub fn take_damage(&mut self, amount: f32) -> bool {
        self.health = (self.health - amount).max(0.0);
        self.health <= 0.0
    }

    pub fn heal(&mut self, amount: f32) {
        self.health = (self.health + amount).min(self.max_health);
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0.0
    }

    pub fn destroy(&mut self) {
        self.active = false;
        self.visible = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::FrameSurface;
    use crate::world::SpriteDimensions;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    struct SpriteLog {
        updates: Vec<f32>,
        renders: Vec<(f32, f32, Direction)>,
    }

    struct RecordingSprite {
        log: Rc<RefCell<SpriteLog>>,
        size: (f32, f32),
        draws: bool,
    }

    impl Sprite for RecordingSprite {
        fn dimensions(&self) -> SpriteDimensions {
            SpriteDimensions {
                width: self.size.0,
                height: self.size.1,
            }
        }

        fn set_animation(&mut self, _name: &str) {}

        fn update(&mut self, dt_seconds: f32) {
            self.log.borrow_mut().updates.push(dt_seconds);
        }

        fn render(
            &self,
            _surface: &mut dyn RenderSurface,
            x: f32,
            y: f32,
            direction: Direction,
        ) -> bool {
            self.log.borrow_mut().renders.push((x, y, direction));
            self.draws
        }
    }

    fn entity_at(x: f32, y: f32) -> Entity {
        Entity::new(x, y, EntityConfig::default())
    }

    #[test]
    fn new_entity_uses_defaults() {
        let entity = entity_at(5.0, 6.0);
        assert_eq!(entity.width, 32.0);
        assert_eq!(entity.radius, 16.0);
        assert_eq!(entity.health, 100.0);
        assert_eq!(entity.max_health, 100.0);
        assert_eq!(entity.direction, Direction::South);
        assert_eq!(entity.previous_position, Vec2::new(5.0, 6.0));
        assert!(entity.active && entity.visible);
    }

    #[test]
    fn update_integrates_velocity_and_records_previous_position() {
        let mut entity = entity_at(10.0, 20.0);
        entity.velocity = Vec2::new(3.0, -4.0);

        entity.update(0.5);
        assert_eq!(entity.previous_position, Vec2::new(10.0, 20.0));
        assert_eq!(entity.position, Vec2::new(11.5, 18.0));

        entity.update(0.25);
        assert_eq!(entity.previous_position, Vec2::new(11.5, 18.0));
        assert_eq!(entity.position, Vec2::new(11.5 + 3.0 * 0.25, 18.0 - 4.0 * 0.25));
    }

    #[test]
    fn update_with_zero_delta_keeps_position() {
        let mut entity = entity_at(1.0, 1.0);
        entity.velocity = Vec2::new(100.0, 100.0);
        entity.update(0.0);
        assert_eq!(entity.position, Vec2::new(1.0, 1.0));
    }

    #[test]
    fn update_forwards_delta_to_sprite() {
        let log = Rc::new(RefCell::new(SpriteLog::default()));
        let mut entity = entity_at(0.0, 0.0);
        entity.set_sprite(Box::new(RecordingSprite {
            log: Rc::clone(&log),
            size: (16.0, 24.0),
            draws: true,
        }));

        entity.update(0.016);

        assert_eq!(log.borrow().updates, vec![0.016]);
    }

    #[test]
    fn set_sprite_adopts_sprite_dimensions() {
        let mut entity = entity_at(0.0, 0.0);
        entity.set_sprite(Box::new(RecordingSprite {
            log: Rc::default(),
            size: (16.0, 24.0),
            draws: true,
        }));

        assert_eq!(entity.width, 16.0);
        assert_eq!(entity.height, 24.0);
        assert_eq!(entity.radius, 8.0);
        assert!(entity.sprite().is_some());
        assert!(entity.clear_sprite().is_some());
        assert!(entity.sprite().is_none());
    }

    #[test]
    fn bounds_is_centered_and_pure() {
        let entity = entity_at(50.0, 40.0);
        let first = entity.bounds();
        let second = entity.bounds();
        assert_eq!(first, second);
        assert_eq!(
            first,
            Rect {
                x: 34.0,
                y: 24.0,
                width: 32.0,
                height: 32.0
            }
        );
    }

    #[test]
    fn collision_is_symmetric_and_strict_on_edges() {
        let a = entity_at(0.0, 0.0);
        let touching = entity_at(32.0, 0.0);
        let corner = entity_at(32.0, 32.0);
        let overlapping = entity_at(31.0, 10.0);

        for other in [&touching, &corner, &overlapping] {
            assert_eq!(a.collides_with(other), other.collides_with(&a));
        }
        assert!(!a.collides_with(&touching));
        assert!(!a.collides_with(&corner));
        assert!(a.collides_with(&overlapping));
    }

    #[test]
    fn distance_and_angle() {
        let a = entity_at(0.0, 0.0);
        let b = entity_at(3.0, 4.0);
        assert!((a.distance_to(&b) - 5.0).abs() < 1e-6);
        assert!((a.angle_to(&b) - 4.0f32.atan2(3.0)).abs() < 1e-6);

        let below = entity_at(0.0, 10.0);
        assert!((a.angle_to(&below) - std::f32::consts::FRAC_PI_2).abs() < 1e-6);
    }

    #[test]
    fn take_damage_floors_at_zero_and_keeps_signalling() {
        let mut entity = entity_at(0.0, 0.0);
        assert!(!entity.take_damage(30.0));
        assert_eq!(entity.health, 70.0);

        assert!(entity.take_damage(entity.max_health));
        assert_eq!(entity.health, 0.0);
        assert!(entity.take_damage(1.0));
        assert_eq!(entity.health, 0.0);
        assert!(entity.active, "damage never deactivates on its own");
        assert!(!entity.is_alive());
    }

    #[test]
    fn heal_caps_at_max_health() {
        let mut entity = entity_at(0.0, 0.0);
        entity.take_damage(50.0);
        entity.heal(10_000.0);
        assert_eq!(entity.health, 100.0);
    }

    #[test]
    fn destroy_is_idempotent() {
        let mut entity = entity_at(0.0, 0.0);
        entity.destroy();
        entity.destroy();
        assert!(!entity.active);
        assert!(!entity.visible);
    }

    #[test]
    fn rollback_restores_previous_position() {
        let mut entity = entity_at(10.0, 10.0);
        entity.velocity = Vec2::new(10.0, 0.0);
        entity.update(1.0);
        entity.rollback_position();
        assert_eq!(entity.position, Vec2::new(10.0, 10.0));
    }

    #[test]
    fn render_falls_back_to_white_box() {
        let mut buffer = vec![0u8; 64 * 64 * 4];
        let mut surface = FrameSurface::new(&mut buffer, 64, 64);
        let entity = entity_at(32.0, 32.0);

        entity.render(&mut surface, false);

        assert_eq!(surface.pixel(32, 32), Some(FALLBACK_FILL_COLOR));
        assert_eq!(surface.pixel(16, 16), Some(FALLBACK_FILL_COLOR));
        assert_eq!(surface.pixel(15, 15), Some([0, 0, 0, 0]));
    }

    #[test]
    fn render_skips_invisible_entities() {
        let mut buffer = vec![0u8; 64 * 64 * 4];
        let mut surface = FrameSurface::new(&mut buffer, 64, 64);
        let mut entity = entity_at(32.0, 32.0);
        entity.visible = false;

        entity.render(&mut surface, true);

        assert!(buffer.iter().all(|byte| *byte == 0));
    }

    #[test]
    fn render_delegates_to_sprite() {
        let log = Rc::new(RefCell::new(SpriteLog::default()));
        let mut entity = entity_at(12.0, 8.0);
        entity.direction = Direction::West;
        entity.set_sprite(Box::new(RecordingSprite {
            log: Rc::clone(&log),
            size: (8.0, 8.0),
            draws: true,
        }));
        let mut buffer = vec![0u8; 32 * 32 * 4];
        let mut surface = FrameSurface::new(&mut buffer, 32, 32);

        entity.render(&mut surface, false);

        assert_eq!(log.borrow().renders, vec![(12.0, 8.0, Direction::West)]);
        assert_eq!(surface.pixel(12, 8), Some([0, 0, 0, 0]));
    }

    #[test]
    fn debug_render_draws_bounds_and_health_bar_when_hurt() {
        let mut buffer = vec![0u8; 64 * 64 * 4];
        let mut surface = FrameSurface::new(&mut buffer, 64, 64);
        let mut entity = entity_at(32.0, 32.0);
        entity.take_damage(50.0);

        entity.render(&mut surface, true);

        assert_eq!(surface.pixel(16, 16), Some(DEBUG_BOUNDS_COLOR));
        // Bar spans y 8..12; left half is red fill, right half background.
        assert_eq!(surface.pixel(20, 9), Some(HEALTH_BAR_FILL_COLOR));
        assert_eq!(surface.pixel(44, 9), Some(HEALTH_BAR_BACKGROUND_COLOR));
    }

    #[test]
    fn render_falls_back_when_sprite_has_nothing_to_draw() {
        let log = Rc::new(RefCell::new(SpriteLog::default()));
        let mut entity = entity_at(12.0, 8.0);
        entity.set_sprite(Box::new(RecordingSprite {
            log: Rc::clone(&log),
            size: (8.0, 8.0),
            draws: false,
        }));
        let mut buffer = vec![0u8; 32 * 32 * 4];
        let mut surface = FrameSurface::new(&mut buffer, 32, 32);

        entity.render(&mut surface, false);

        assert_eq!(log.borrow().renders.len(), 1);
        assert_eq!(surface.pixel(12, 8), Some(FALLBACK_FILL_COLOR));
        assert_eq!(surface.pixel(8, 4), Some(FALLBACK_FILL_COLOR));
    }
}
