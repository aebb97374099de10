//! Entity storage and the per-tick read-only snapshot.
//!
//! The [`EntityStore`] is the only mutable world state. Systems never read
//! it mid-tick: they read a [`WorldSnapshot`] captured at tick start and
//! produce buffered updates that are committed afterwards.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, UnitKind};
use crate::components::{AttackTarget, EntityId, Health, Team};
use crate::error::{GameError, Result};
use crate::math::{Fixed, Vec3Fixed};

/// One live combatant or structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    /// Unique identifier, assigned on insert.
    pub id: EntityId,
    /// Owning team.
    pub team: Team,
    /// Row in the catalog.
    pub kind: UnitKind,
    /// World position.
    pub position: Vec3Fixed,
    /// Hit points.
    pub health: Health,
    /// Current target and cooldown.
    pub attack: AttackTarget,
    /// The team's must-destroy structure.
    pub is_king: bool,
    /// Crown towers are the structures counted when the clock runs out.
    pub is_crown_tower: bool,
}

impl Entity {
    /// Create an entity at full health with no target.
    ///
    /// The id is a placeholder until the entity is inserted into a store.
    #[must_use]
    pub fn new(team: Team, kind: UnitKind, position: Vec3Fixed, max_hp: Fixed) -> Self {
        Self {
            id: 0,
            team,
            kind,
            position,
            health: Health::new(max_hp),
            attack: AttackTarget::new(),
            is_king: false,
            is_crown_tower: false,
        }
    }

    /// Mark as a crown tower.
    #[must_use]
    pub fn crown_tower(mut self) -> Self {
        self.is_crown_tower = true;
        self
    }

    /// Mark as the king structure (implies crown tower).
    #[must_use]
    pub fn king(mut self) -> Self {
        self.is_king = true;
        self.is_crown_tower = true;
        self
    }
}

/// Storage for all entities in the simulation.
///
/// Uses a `HashMap` for O(1) entity lookup by ID, with deterministic
/// iteration via sorted keys when processing systems.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntityStore {
    /// Map of entity ID to entity data.
    entities: HashMap<EntityId, Entity>,
    /// Next entity ID to assign.
    next_id: EntityId,
}

impl EntityStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entities: HashMap::new(),
            next_id: 1,
        }
    }

    /// Rebuild a store from existing entities, keeping their ids.
    ///
    /// The id counter is seeded above the highest id present so new ids
    /// never collide with restored ones.
    pub fn from_entities(entities: impl IntoIterator<Item = Entity>) -> Result<Self> {
        let mut store = Self::new();
        for entity in entities {
            let id = entity.id;
            if id == 0 {
                return Err(GameError::InvalidState("entity id 0 is reserved".to_string()));
            }
            if store.entities.insert(id, entity).is_some() {
                return Err(GameError::InvalidState(format!("duplicate entity id {id}")));
            }
            store.next_id = store.next_id.max(id + 1);
        }
        Ok(store)
    }

    /// Insert a new entity and return its ID.
    pub fn insert(&mut self, mut entity: Entity) -> EntityId {
        let id = self.next_id;
        self.next_id += 1;
        entity.id = id;
        self.entities.insert(id, entity);
        id
    }

    /// Remove an entity by ID.
    pub fn remove(&mut self, id: EntityId) -> Option<Entity> {
        self.entities.remove(&id)
    }

    /// Get an entity by ID.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    /// Get a mutable reference to an entity by ID.
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    /// Check if an entity exists.
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    /// Number of live entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Check if the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// The id the next insert will receive.
    #[must_use]
    pub fn next_id(&self) -> EntityId {
        self.next_id
    }

    /// Get sorted entity IDs for deterministic iteration.
    #[must_use]
    pub fn sorted_ids(&self) -> Vec<EntityId> {
        let mut ids: Vec<EntityId> = self.entities.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Iterate entities in ascending id order.
    pub fn iter_sorted(&self) -> impl Iterator<Item = &Entity> {
        self.sorted_ids()
            .into_iter()
            .filter_map(|id| self.entities.get(&id))
    }

    /// Remove every entity whose hit points are at or below zero.
    ///
    /// Returns the removed entities in ascending id order.
    pub fn purge_dead(&mut self) -> Vec<Entity> {
        let dead: Vec<EntityId> = self
            .sorted_ids()
            .into_iter()
            .filter(|id| self.entities.get(id).is_some_and(|e| e.health.is_dead()))
            .collect();

        dead.into_iter()
            .filter_map(|id| self.entities.remove(&id))
            .collect()
    }

    /// The king structure of a team, if it still stands.
    #[must_use]
    pub fn king_of(&self, team: Team) -> Option<&Entity> {
        self.entities
            .values()
            .find(|e| e.team == team && e.is_king)
    }

    /// Surviving crown towers (king included) of a team.
    #[must_use]
    pub fn crown_tower_count(&self, team: Team) -> u32 {
        let count = self
            .entities
            .values()
            .filter(|e| e.team == team && e.is_crown_tower)
            .count();
        u32::try_from(count).unwrap_or(u32::MAX)
    }
}

/// Read-only copy of one entity as seen at tick start.
///
/// Catalog-derived flags are resolved once while capturing so that the
/// targeting and pathing rules never touch the catalog for candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityView {
    /// Entity id.
    pub id: EntityId,
    /// Owning team.
    pub team: Team,
    /// Catalog row.
    pub kind: UnitKind,
    /// Position at tick start.
    pub position: Vec3Fixed,
    /// Hit points at tick start.
    pub hp: Fixed,
    /// Target id held at tick start (may be stale).
    pub target: Option<EntityId>,
    /// Cooldown at tick start.
    pub cooldown: u32,
    /// King structure flag.
    pub is_king: bool,
    /// Crown tower flag.
    pub is_crown_tower: bool,
    /// Buildings never move.
    pub is_building: bool,
    /// Flying units need air-capable attackers.
    pub is_flying: bool,
}

impl EntityView {
    /// Alive at tick start.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.hp > Fixed::ZERO
    }
}

/// Immutable view of the whole world at the start of a tick.
#[derive(Debug, Clone, Default)]
pub struct WorldSnapshot {
    views: Vec<EntityView>,
    index: HashMap<EntityId, usize>,
}

impl WorldSnapshot {
    /// Capture the store.
    ///
    /// # Errors
    ///
    /// [`GameError::InvariantViolation`] if any entity's kind is missing
    /// from the catalog.
    pub fn capture(store: &EntityStore, catalog: &Catalog) -> Result<Self> {
        let mut views = Vec::with_capacity(store.len());
        let mut index = HashMap::with_capacity(store.len());

        for entity in store.iter_sorted() {
            let def = catalog.unit(entity.kind).map_err(|e| {
                GameError::InvariantViolation(format!("entity {}: {e}", entity.id))
            })?;
            index.insert(entity.id, views.len());
            views.push(EntityView {
                id: entity.id,
                team: entity.team,
                kind: entity.kind,
                position: entity.position,
                hp: entity.health.current,
                target: entity.attack.target,
                cooldown: entity.attack.cooldown,
                is_king: entity.is_king,
                is_crown_tower: entity.is_crown_tower,
                is_building: def.is_building,
                is_flying: def.is_flying,
            });
        }

        Ok(Self { views, index })
    }

    /// Look up an entity that was alive at tick start.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&EntityView> {
        self.index.get(&id).and_then(|&i| self.views.get(i))
    }

    /// All entities in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &EntityView> {
        self.views.iter()
    }

    /// Entities not on `team`, in ascending id order.
    pub fn enemies_of(&self, team: Team) -> impl Iterator<Item = &EntityView> {
        self.views.iter().filter(move |v| v.team != team)
    }

    /// Number of entities captured.
    #[must_use]
    pub fn len(&self) -> usize {
        self.views.len()
    }

    /// Whether nothing was captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn knight(team: Team) -> Entity {
        Entity::new(team, UnitKind::Knight, Vec3Fixed::ZERO, Fixed::from_num(100))
    }

    #[test]
    fn test_ids_are_monotonic() {
        let mut store = EntityStore::new();
        let a = store.insert(knight(Team::Player));
        let b = store.insert(knight(Team::Enemy));
        store.remove(a);
        let c = store.insert(knight(Team::Player));
        assert_eq!((a, b, c), (1, 2, 3));
        assert_eq!(store.sorted_ids(), vec![2, 3]);
    }

    #[test]
    fn test_from_entities_seeds_counter_above_max() {
        let mut first = knight(Team::Player);
        first.id = 7;
        let mut second = knight(Team::Enemy);
        second.id = 3;

        let mut store = EntityStore::from_entities([first, second]).unwrap();
        assert_eq!(store.next_id(), 8);
        assert_eq!(store.insert(knight(Team::Player)), 8);
    }

    #[test]
    fn test_from_entities_rejects_duplicates() {
        let mut a = knight(Team::Player);
        a.id = 4;
        let b = a.clone();
        assert!(EntityStore::from_entities([a, b]).is_err());
    }

    #[test]
    fn test_purge_dead_only_removes_non_positive_hp() {
        let mut store = EntityStore::new();
        let alive = store.insert(knight(Team::Player));
        let zero = store.insert(knight(Team::Player));
        let negative = store.insert(knight(Team::Enemy));

        store.get_mut(alive).unwrap().health.current = Fixed::from_num(0.01);
        store.get_mut(zero).unwrap().health.current = Fixed::ZERO;
        store.get_mut(negative).unwrap().health.current = Fixed::from_num(-5);

        let removed: Vec<EntityId> = store.purge_dead().iter().map(|e| e.id).collect();
        assert_eq!(removed, vec![zero, negative]);
        assert!(store.contains(alive));
    }

    #[test]
    fn test_crown_tower_count_and_king() {
        let mut store = EntityStore::new();
        store.insert(knight(Team::Player).crown_tower());
        store.insert(knight(Team::Player).king());
        store.insert(knight(Team::Player));

        assert_eq!(store.crown_tower_count(Team::Player), 2);
        assert_eq!(store.crown_tower_count(Team::Enemy), 0);
        assert!(store.king_of(Team::Player).is_some());
        assert!(store.king_of(Team::Enemy).is_none());
    }

    #[test]
    fn test_snapshot_is_sorted_and_indexed() {
        let catalog = Catalog::standard().unwrap();
        let mut store = EntityStore::new();
        let a = store.insert(knight(Team::Player));
        let b = store.insert(Entity::new(
            Team::Enemy,
            UnitKind::Minion,
            Vec3Fixed::ZERO,
            Fixed::from_num(35),
        ));

        let snapshot = WorldSnapshot::capture(&store, &catalog).unwrap();
        let ids: Vec<EntityId> = snapshot.iter().map(|v| v.id).collect();
        assert_eq!(ids, vec![a, b]);
        assert!(snapshot.get(b).unwrap().is_flying);
        assert_eq!(snapshot.enemies_of(Team::Player).count(), 1);
        assert!(snapshot.get(99).is_none());
    }
}
