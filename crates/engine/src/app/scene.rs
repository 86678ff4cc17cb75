use crate::world::{AnimationRegistry, Character, Entity, Player};

use super::{InputHandle, InputSnapshot, RenderSurface};

pub const PROP_TAG: &str = "prop";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneCommand {
    None,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u64);

#[derive(Debug, Default)]
pub struct EntityIdAllocator {
    next: u64,
}

impl EntityIdAllocator {
    pub fn allocate(&mut self) -> EntityId {
        let id = EntityId(self.next);
        self.next = self.next.saturating_add(1);
        id
    }
}

/// Anything the world can simulate. Props are bare entities; characters and
/// the player carry their movement and animation layers.
#[derive(Debug)]
pub enum Actor {
    Prop(Entity),
    Character(Character),
    Player(Player),
}

impl Actor {
    pub fn entity(&self) -> &Entity {
        match self {
            Actor::Prop(entity) => entity,
            Actor::Character(character) => &character.entity,
            Actor::Player(player) => &player.character.entity,
        }
    }

    pub fn entity_mut(&mut self) -> &mut Entity {
        match self {
            Actor::Prop(entity) => entity,
            Actor::Character(character) => &mut character.entity,
            Actor::Player(player) => &mut player.character.entity,
        }
    }

    pub fn character(&self) -> Option<&Character> {
        match self {
            Actor::Prop(_) => None,
            Actor::Character(character) => Some(character),
            Actor::Player(player) => Some(&player.character),
        }
    }

    pub fn character_mut(&mut self) -> Option<&mut Character> {
        match self {
            Actor::Prop(_) => None,
            Actor::Character(character) => Some(character),
            Actor::Player(player) => Some(&mut player.character),
        }
    }

    pub fn player(&self) -> Option<&Player> {
        match self {
            Actor::Player(player) => Some(player),
            _ => None,
        }
    }

    pub fn player_mut(&mut self) -> Option<&mut Player> {
        match self {
            Actor::Player(player) => Some(player),
            _ => None,
        }
    }

    /// Classification tag: the character kind, or `"prop"`.
    pub fn tag(&self) -> &str {
        match self.character() {
            Some(character) => character.kind(),
            None => PROP_TAG,
        }
    }

    pub fn update(&mut self, dt_seconds: f32, animations: &AnimationRegistry) {
        match self {
            Actor::Prop(entity) => entity.update(dt_seconds),
            Actor::Character(character) => character.update(dt_seconds, animations),
            Actor::Player(player) => player.update(dt_seconds, animations),
        }
    }

    pub fn render(&self, surface: &mut dyn RenderSurface, debug: bool) {
        match self {
            Actor::Prop(entity) => entity.render(surface, debug),
            Actor::Character(character) => character.render(surface, debug),
            Actor::Player(player) => player.render(surface, debug),
        }
    }
}

impl From<Entity> for Actor {
    fn from(entity: Entity) -> Self {
        Actor::Prop(entity)
    }
}

impl From<Character> for Actor {
    fn from(character: Character) -> Self {
        Actor::Character(character)
    }
}

impl From<Player> for Actor {
    fn from(player: Player) -> Self {
        Actor::Player(player)
    }
}

#[derive(Debug)]
pub struct WorldEntity {
    pub id: EntityId,
    pub actor: Actor,
}

/// The loop-owned entity collection. Iteration and update order is spawn order.
#[derive(Debug)]
pub struct World {
    canvas_width: f32,
    canvas_height: f32,
    allocator: EntityIdAllocator,
    entities: Vec<WorldEntity>,
}

impl World {
    pub fn new(canvas_width: f32, canvas_height: f32) -> Self {
        Self {
            canvas_width,
            canvas_height,
            allocator: EntityIdAllocator::default(),
            entities: Vec::new(),
        }
    }

    pub fn canvas_size(&self) -> (f32, f32) {
        (self.canvas_width, self.canvas_height)
    }

    pub fn spawn(&mut self, actor: impl Into<Actor>) -> EntityId {
        let id = self.allocator.allocate();
        self.entities.push(WorldEntity {
            id,
            actor: actor.into(),
        });
        id
    }

    pub fn find(&self, id: EntityId) -> Option<&Actor> {
        self.entities
            .iter()
            .find(|entry| entry.id == id)
            .map(|entry| &entry.actor)
    }

    pub fn find_mut(&mut self, id: EntityId) -> Option<&mut Actor> {
        self.entities
            .iter_mut()
            .find(|entry| entry.id == id)
            .map(|entry| &mut entry.actor)
    }

    pub fn entities(&self) -> &[WorldEntity] {
        &self.entities
    }

    pub fn entities_mut(&mut self) -> impl Iterator<Item = &mut WorldEntity> {
        self.entities.iter_mut()
    }

    /// The first player in spawn order.
    pub fn player(&self) -> Option<&Player> {
        self.entities.iter().find_map(|entry| entry.actor.player())
    }

    pub fn player_mut(&mut self) -> Option<&mut Player> {
        self.entities
            .iter_mut()
            .find_map(|entry| entry.actor.player_mut())
    }

    pub fn count_active_with_tag(&self, tag: &str) -> usize {
        self.entities
            .iter()
            .filter(|entry| entry.actor.entity().active && entry.actor.tag() == tag)
            .count()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub(crate) fn update_active(&mut self, dt_seconds: f32, animations: &AnimationRegistry) {
        for entry in &mut self.entities {
            if entry.actor.entity().active {
                entry.actor.update(dt_seconds, animations);
            }
        }
    }

    /// Drops inactive entities, keeping the order of the survivors.
    pub fn prune_inactive(&mut self) -> usize {
        let before = self.entities.len();
        self.entities.retain(|entry| entry.actor.entity().active);
        before - self.entities.len()
    }

    pub fn render(&self, surface: &mut dyn RenderSurface, debug: bool) {
        for entry in &self.entities {
            entry.actor.render(surface, debug);
        }
    }
}

pub trait Scene {
    fn load(&mut self, world: &mut World, input: &InputHandle);
    /// Runs after input is published and before any entity update.
    fn update(
        &mut self,
        dt_seconds: f32,
        input: &InputSnapshot,
        world: &mut World,
    ) -> SceneCommand;
    /// Runs after every entity update and before inactive entities are pruned.
    fn post_update(&mut self, _dt_seconds: f32, _world: &mut World) {}
    fn debug_title(&self, _world: &World) -> Option<String> {
        None
    }
}
