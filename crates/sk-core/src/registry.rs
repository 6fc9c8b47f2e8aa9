use std::collections::HashMap;

use tracing::debug;

use crate::entity::{EntityHandle, EntityKind};
use crate::error::{CoreError, CoreResult};
use crate::loot::{LootTable, LootTableId};
use crate::mob::{TypeDefinition, TypeId};

/// What a spawn type id resolves to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpawnTarget<'a> {
    /// A registered custom mob type.
    Custom(&'a TypeDefinition),
    /// A built-in kind with no registry entry.
    Builtin(EntityKind),
}

impl SpawnTarget<'_> {
    /// Host kind to spawn.
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Custom(def) => def.kind(),
            Self::Builtin(kind) => *kind,
        }
    }
}

/// Mob types, loot tables, and the live handle → type association.
///
/// One instance is shared by every spawn scheduler (which track on spawn)
/// and the death resolver (which untracks on death). Every removal path is
/// idempotent, so tracking and untracking may happen in either order.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    types: HashMap<TypeId, TypeDefinition>,
    loot_tables: HashMap<LootTableId, LootTable>,
    live: HashMap<EntityHandle, TypeId>,
}

impl TypeRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    // -----------------------------------------------------------------------
    // Definitions
    // -----------------------------------------------------------------------

    /// Insert or replace a mob type. Returns the previous definition.
    pub fn register_type(&mut self, def: TypeDefinition) -> Option<TypeDefinition> {
        self.types.insert(def.id().clone(), def)
    }

    /// Insert or replace a loot table. Returns the previous table.
    pub fn register_loot_table(&mut self, table: LootTable) -> Option<LootTable> {
        self.loot_tables.insert(table.id().clone(), table)
    }

    /// Look up a mob type.
    pub fn get_type(&self, id: &TypeId) -> Option<&TypeDefinition> {
        self.types.get(id)
    }

    /// Look up a loot table.
    pub fn loot_table(&self, id: &LootTableId) -> Option<&LootTable> {
        self.loot_tables.get(id)
    }

    /// Resolve a spawn type id. Registered mob types win over built-in
    /// kind names.
    pub fn spawn_target(&self, id: &TypeId) -> Option<SpawnTarget<'_>> {
        match self.types.get(id) {
            Some(def) => Some(SpawnTarget::Custom(def)),
            None => EntityKind::parse(id.as_str()).map(SpawnTarget::Builtin),
        }
    }

    /// Check that every id resolves to a spawn target.
    pub fn validate_spawn_types(&self, ids: &[TypeId]) -> CoreResult<()> {
        match ids.iter().find(|id| self.spawn_target(id).is_none()) {
            Some(missing) => Err(CoreError::UnknownType(missing.to_string())),
            None => Ok(()),
        }
    }

    /// Number of registered mob types.
    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    /// Number of registered loot tables.
    pub fn loot_table_count(&self) -> usize {
        self.loot_tables.len()
    }

    /// Registered mob type ids, sorted.
    pub fn type_ids(&self) -> Vec<&TypeId> {
        let mut ids: Vec<_> = self.types.keys().collect();
        ids.sort();
        ids
    }

    /// Registered loot table ids, sorted.
    pub fn loot_table_ids(&self) -> Vec<&LootTableId> {
        let mut ids: Vec<_> = self.loot_tables.keys().collect();
        ids.sort();
        ids
    }

    // -----------------------------------------------------------------------
    // Live associations
    // -----------------------------------------------------------------------

    /// Associate a live entity with the mob type it was spawned from.
    pub fn track(&mut self, handle: EntityHandle, type_id: TypeId) {
        self.live.insert(handle, type_id);
    }

    /// Drop an association. Unknown handles are a no-op.
    pub fn untrack(&mut self, handle: EntityHandle) -> Option<TypeId> {
        self.live.remove(&handle)
    }

    /// Mob type a live entity was spawned from, if it is a custom spawn.
    pub fn resolve(&self, handle: EntityHandle) -> Option<&TypeId> {
        self.live.get(&handle)
    }

    /// Whether the handle has an association.
    pub fn is_tracked(&self, handle: EntityHandle) -> bool {
        self.live.contains_key(&handle)
    }

    /// Number of live associations.
    pub fn tracked_count(&self) -> usize {
        self.live.len()
    }

    /// Remove every association whose entity is no longer valid.
    pub fn sweep_dead(&mut self, is_valid: impl Fn(EntityHandle) -> bool) -> usize {
        let before = self.live.len();
        self.live.retain(|handle, _| is_valid(*handle));
        let removed = before - self.live.len();
        if removed > 0 {
            debug!(removed, remaining = self.live.len(), "swept dead registry entries");
        }
        removed
    }
}
