use std::sync::Arc;

use engine::world::ANIMATION_IDLE;
use engine::{
    Actor, AnimationRegistry, Character, CharacterConfig, Entity, EntityConfig, EntityId,
    InputHandle, InputQuery, InputSnapshot, Player, PlayerConfig, Rect, Scene, SceneCommand,
    SheetSprite, SpriteSheet, Vec2, World, ENEMY_TAG,
};
use tracing::{debug, info};

const OBSTACLE_SIZE: f32 = 48.0;
const OBSTACLE_HEALTH: f32 = 1.0;
const OBSTACLE_ANCHORS: [(f32, f32); 4] = [(0.25, 0.25), (0.75, 0.25), (0.25, 0.75), (0.75, 0.75)];
const ENEMY_SIZE: f32 = 24.0;
const ENEMY_NAME: &str = "Chaser";
const EDGE_SPAWN_POINT_COUNT: usize = 8;

/// Tunables for the arena loop. Tests shrink them to reach edge cases quickly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct ArenaRules {
    pub(crate) spawn_interval_seconds: f32,
    pub(crate) max_enemies: usize,
    pub(crate) enemy_speed: f32,
    pub(crate) enemy_health: f32,
    pub(crate) contact_damage: f32,
    pub(crate) contact_cooldown_seconds: f32,
    pub(crate) pulse_radius: f32,
    pub(crate) pulse_damage: f32,
    pub(crate) pulse_cooldown_seconds: f32,
    pub(crate) kill_score: u64,
}

impl Default for ArenaRules {
    fn default() -> Self {
        Self {
            spawn_interval_seconds: 2.0,
            max_enemies: 8,
            enemy_speed: 70.0,
            enemy_health: 30.0,
            contact_damage: 10.0,
            contact_cooldown_seconds: 0.5,
            pulse_radius: 80.0,
            pulse_damage: 15.0,
            pulse_cooldown_seconds: 0.4,
            kill_score: 10,
        }
    }
}

pub(crate) struct PlayerSprite {
    pub(crate) sheet: Arc<SpriteSheet>,
    pub(crate) animations: Arc<AnimationRegistry>,
}

pub(crate) struct ArenaSetup {
    pub(crate) player: PlayerConfig,
    pub(crate) player_sprite: Option<PlayerSprite>,
}

pub(crate) struct ArenaScene {
    setup: ArenaSetup,
    rules: ArenaRules,
    spawn_point: Vec2,
    player_id: Option<EntityId>,
    obstacle_ids: Vec<EntityId>,
    spawn_timer: f32,
    next_edge_index: usize,
    contact_cooldown: f32,
    pulse_cooldown: f32,
    kills: u64,
    deaths: u32,
}

impl ArenaScene {
    pub(crate) fn new(setup: ArenaSetup, rules: ArenaRules) -> Self {
        Self {
            setup,
            rules,
            spawn_point: Vec2::ZERO,
            player_id: None,
            obstacle_ids: Vec::new(),
            spawn_timer: 0.0,
            next_edge_index: 0,
            contact_cooldown: 0.0,
            pulse_cooldown: 0.0,
            kills: 0,
            deaths: 0,
        }
    }

    pub(crate) fn spawn_enemy_at(&self, world: &mut World, position: Vec2) -> EntityId {
        let enemy = Character::new(
            position.x,
            position.y,
            CharacterConfig {
                entity: EntityConfig {
                    width: ENEMY_SIZE,
                    height: ENEMY_SIZE,
                    radius: None,
                    health: self.rules.enemy_health,
                },
                speed: self.rules.enemy_speed,
                kind: ENEMY_TAG.to_string(),
                name: ENEMY_NAME.to_string(),
            },
        );
        world.spawn(enemy)
    }

    fn player_position(&self, world: &World) -> Option<Vec2> {
        self.player_id
            .and_then(|id| world.find(id))
            .map(|actor| actor.entity().position)
    }

    fn advance_spawner(&mut self, dt_seconds: f32, world: &mut World) {
        self.spawn_timer += dt_seconds;
        if self.spawn_timer < self.rules.spawn_interval_seconds {
            return;
        }
        self.spawn_timer = 0.0;

        if world.count_active_with_tag(ENEMY_TAG) >= self.rules.max_enemies {
            return;
        }
        let (width, height) = world.canvas_size();
        let position = edge_spawn_point(self.next_edge_index, width, height);
        self.next_edge_index = (self.next_edge_index + 1) % EDGE_SPAWN_POINT_COUNT;
        let id = self.spawn_enemy_at(world, position);
        debug!(entity = id.0, x = position.x, y = position.y, "enemy_spawned");
    }

    fn steer_enemies(&self, world: &mut World) {
        let Some(target) = self.player_position(world) else {
            return;
        };
        for entry in world.entities_mut() {
            if entry.actor.tag() != ENEMY_TAG || !entry.actor.entity().active {
                continue;
            }
            if let Some(enemy) = entry.actor.character_mut() {
                let position = enemy.entity.position;
                enemy.set_movement(target.x - position.x, target.y - position.y);
            }
        }
    }

    fn fire_pulse(&mut self, world: &mut World) {
        let Some(origin) = self.player_position(world) else {
            return;
        };
        self.pulse_cooldown = self.rules.pulse_cooldown_seconds;

        let mut hits = 0u32;
        let mut kills = 0u64;
        for entry in world.entities_mut() {
            if entry.actor.tag() != ENEMY_TAG {
                continue;
            }
            let enemy = entry.actor.entity_mut();
            if !enemy.active || distance(enemy.position, origin) > self.rules.pulse_radius {
                continue;
            }
            hits += 1;
            if enemy.take_damage(self.rules.pulse_damage) {
                enemy.destroy();
                kills += 1;
            }
        }

        if kills > 0 {
            self.kills = self.kills.saturating_add(kills);
            if let Some(player) = self.player_mut(world) {
                player.add_score(kills.saturating_mul(self.rules.kill_score));
            }
        }
        debug!(hits, kills, "pulse_fired");
    }

    fn player_mut<'w>(&self, world: &'w mut World) -> Option<&'w mut Player> {
        self.player_id
            .and_then(|id| world.find_mut(id))
            .and_then(Actor::player_mut)
    }

    fn resolve_obstacle_overlaps(&self, world: &mut World) {
        let obstacles: Vec<Rect> = self
            .obstacle_ids
            .iter()
            .filter_map(|id| world.find(*id))
            .map(|actor| actor.entity().bounds())
            .collect();
        if obstacles.is_empty() {
            return;
        }

        for entry in world.entities_mut() {
            if entry.actor.character().is_none() {
                continue;
            }
            let entity = entry.actor.entity_mut();
            let bounds = entity.bounds();
            if obstacles.iter().any(|obstacle| obstacle.overlaps(&bounds)) {
                entity.rollback_position();
            }
        }
    }

    fn apply_contact_damage(&mut self, world: &mut World) {
        if self.contact_cooldown > 0.0 {
            return;
        }
        let Some(player_bounds) = self
            .player_id
            .and_then(|id| world.find(id))
            .map(|actor| actor.entity().bounds())
        else {
            return;
        };
        let touching = world.entities().iter().any(|entry| {
            entry.actor.tag() == ENEMY_TAG
                && entry.actor.entity().active
                && entry.actor.entity().bounds().overlaps(&player_bounds)
        });
        if !touching {
            return;
        }

        self.contact_cooldown = self.rules.contact_cooldown_seconds;
        let damage = self.rules.contact_damage;
        let Some(player) = self.player_mut(world) else {
            return;
        };
        let died = player.character.entity.take_damage(damage);
        debug!(
            health = player.character.entity.health,
            "player_contact_damage"
        );
        if died {
            self.respawn_player(world);
        }
    }

    fn respawn_player(&mut self, world: &mut World) {
        self.deaths = self.deaths.saturating_add(1);
        let spawn_point = self.spawn_point;
        let final_score = self.player_mut(world).map_or(0, |player| {
            let score = player.score();
            player.spawn(spawn_point.x, spawn_point.y);
            score
        });

        let mut cleared = 0usize;
        for entry in world.entities_mut() {
            if entry.actor.tag() == ENEMY_TAG && entry.actor.entity().active {
                entry.actor.entity_mut().destroy();
                cleared += 1;
            }
        }
        self.spawn_timer = 0.0;
        self.contact_cooldown = 0.0;
        info!(
            final_score,
            deaths = self.deaths,
            cleared_enemies = cleared,
            "player_died"
        );
    }
}

impl Scene for ArenaScene {
    fn load(&mut self, world: &mut World, input: &InputHandle) {
        let (width, height) = world.canvas_size();
        self.spawn_point = Vec2::new(width / 2.0, height / 2.0);

        let mut player = Player::new(
            self.spawn_point.x,
            self.spawn_point.y,
            self.setup.player.clone(),
        );
        player.bind_input(input.clone(), width, height);
        if let Some(sprite) = &self.setup.player_sprite {
            player.character.set_sprite(Box::new(SheetSprite::new(
                Arc::clone(&sprite.sheet),
                Arc::clone(&sprite.animations),
                ANIMATION_IDLE,
            )));
        }
        self.player_id = Some(world.spawn(player));

        self.obstacle_ids = OBSTACLE_ANCHORS
            .iter()
            .map(|(fx, fy)| {
                world.spawn(Entity::new(
                    width * fx,
                    height * fy,
                    EntityConfig {
                        width: OBSTACLE_SIZE,
                        height: OBSTACLE_SIZE,
                        radius: None,
                        health: OBSTACLE_HEALTH,
                    },
                ))
            })
            .collect();

        info!(
            canvas_width = width,
            canvas_height = height,
            obstacles = self.obstacle_ids.len(),
            sprite = self.setup.player_sprite.is_some(),
            "arena_loaded"
        );
    }

    fn update(
        &mut self,
        dt_seconds: f32,
        input: &InputSnapshot,
        world: &mut World,
    ) -> SceneCommand {
        if input.quit_requested() {
            return SceneCommand::Quit;
        }

        self.contact_cooldown = (self.contact_cooldown - dt_seconds).max(0.0);
        self.pulse_cooldown = (self.pulse_cooldown - dt_seconds).max(0.0);

        self.advance_spawner(dt_seconds, world);
        self.steer_enemies(world);
        if input.is_primary_action() && self.pulse_cooldown <= 0.0 {
            self.fire_pulse(world);
        }

        SceneCommand::None
    }

    fn post_update(&mut self, _dt_seconds: f32, world: &mut World) {
        self.resolve_obstacle_overlaps(world);
        self.apply_contact_damage(world);
    }

    fn debug_title(&self, _world: &World) -> Option<String> {
        Some(format!("Kills: {} | Deaths: {}", self.kills, self.deaths))
    }
}

fn distance(a: Vec2, b: Vec2) -> f32 {
    Vec2::new(a.x - b.x, a.y - b.y).length()
}

/// Corners and edge midpoints, clockwise from the top-left, inset so a
/// spawned enemy is fully on the canvas.
fn edge_spawn_point(index: usize, width: f32, height: f32) -> Vec2 {
    let inset = ENEMY_SIZE / 2.0;
    let (left, top, right, bottom) = (inset, inset, width - inset, height - inset);
    let (mid_x, mid_y) = (width / 2.0, height / 2.0);
    match index % EDGE_SPAWN_POINT_COUNT {
        0 => Vec2::new(left, top),
        1 => Vec2::new(mid_x, top),
        2 => Vec2::new(right, top),
        3 => Vec2::new(right, mid_y),
        4 => Vec2::new(right, bottom),
        5 => Vec2::new(mid_x, bottom),
        6 => Vec2::new(left, bottom),
        _ => Vec2::new(left, mid_y),
    }
}
