use rand::SeedableRng;
use rand::rngs::StdRng;
use sk_core::{EntityHandle, ItemStack, LootTableId, Location, TypeId, TypeRegistry};
use tracing::{debug, warn};

/// A death notification from the host, with the drops it is about to spawn.
///
/// The resolver may rewrite `drops` and `dropped_experience` in place; the
/// host applies whatever is left after resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct DeathEvent {
    /// Entity that died.
    pub handle: EntityHandle,
    /// Where it died.
    pub location: Location,
    /// Items the host will drop. Replaced when a loot table applies.
    pub drops: Vec<ItemStack>,
    /// Experience the host will drop.
    pub dropped_experience: u32,
}

impl DeathEvent {
    /// A death with the host's default drops.
    pub fn new(
        handle: EntityHandle,
        location: Location,
        drops: Vec<ItemStack>,
        dropped_experience: u32,
    ) -> Self {
        Self {
            handle,
            location,
            drops,
            dropped_experience,
        }
    }
}

/// What the resolver did with a death.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeathOutcome {
    /// The entity was not a registered custom spawn; host defaults apply.
    NotCustom,
    /// The entity's type id is no longer registered.
    UnknownType(TypeId),
    /// The mob type has no loot table.
    NoLootTable(TypeId),
    /// The mob type names a loot table that is not registered.
    MissingLootTable(LootTableId),
    /// Default drops were replaced with generated stacks.
    Replaced {
        /// Table the drops were rolled from.
        table: LootTableId,
        /// Number of stacks generated.
        items: usize,
    },
}

impl DeathOutcome {
    /// Whether the host's default drops were replaced.
    pub fn replaced_drops(&self) -> bool {
        matches!(self, Self::Replaced { .. })
    }
}

/// Replaces default drops of custom mobs with their loot table's output.
#[derive(Debug)]
pub struct DeathResolver {
    rng: StdRng,
}

impl DeathResolver {
    /// A resolver with its own seeded loot RNG.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Resolve one death.
    ///
    /// The handle is always untracked from the registry, whatever the outcome.
    pub fn resolve(&mut self, registry: &mut TypeRegistry, event: &mut DeathEvent) -> DeathOutcome {
        let Some(type_id) = registry.untrack(event.handle) else {
            return DeathOutcome::NotCustom;
        };

        let Some(definition) = registry.get_type(&type_id) else {
            warn!(handle = %event.handle, mob_type = %type_id, "death of unregistered mob type");
            return DeathOutcome::UnknownType(type_id);
        };
        let Some(table_id) = definition.loot_table() else {
            return DeathOutcome::NoLootTable(type_id);
        };
        let Some(table) = registry.loot_table(table_id) else {
            warn!(mob_type = %type_id, table = %table_id, "loot table not found");
            return DeathOutcome::MissingLootTable(table_id.clone());
        };

        event.drops = table.generate_drops(&event.location, &mut self.rng);
        event.dropped_experience = 0;
        debug!(
            handle = %event.handle,
            mob_type = %type_id,
            table = %table_id,
            items = event.drops.len(),
            "replaced death drops"
        );
        DeathOutcome::Replaced {
            table: table_id.clone(),
            items: event.drops.len(),
        }
    }
}

impl Default for DeathResolver {
    fn default() -> Self {
        Self::new(42)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sk_core::{Cosmetics, EntityKind, LootEntry, LootTable, TypeDefinition};

    fn registry() -> TypeRegistry {
        let mut reg = TypeRegistry::new();
        reg.register_type(
            TypeDefinition::new(
                "brute",
                EntityKind::Zombie,
                Some(LootTableId::new("bonus")),
                Cosmetics::default(),
            )
            .unwrap(),
        );
        reg.register_type(TypeDefinition::plain("plain", EntityKind::Cow).unwrap());
        reg.register_type(
            TypeDefinition::new(
                "orphan",
                EntityKind::Husk,
                Some(LootTableId::new("missing")),
                Cosmetics::default(),
            )
            .unwrap(),
        );
        reg.register_loot_table(
            LootTable::new("bonus").with_entry(LootEntry::new("GOLD", 1, 1, 1.0).unwrap()),
        );
        reg
    }

    fn death(raw: u128) -> DeathEvent {
        DeathEvent::new(
            EntityHandle::from_u128(raw),
            Location::new("w", 1.5, 64.0, 1.5),
            vec![ItemStack::new("ROTTEN_FLESH", 2)],
            5,
        )
    }

    #[test]
    fn custom_mob_drops_are_replaced() {
        let mut reg = registry();
        let mut resolver = DeathResolver::new(1);
        let mut event = death(1);
        reg.track(event.handle, TypeId::new("brute"));

        let outcome = resolver.resolve(&mut reg, &mut event);
        assert!(outcome.replaced_drops());
        assert_eq!(event.drops, vec![ItemStack::new("GOLD", 1)]);
        assert_eq!(event.dropped_experience, 0);
        assert!(reg.resolve(event.handle).is_none());
    }

    #[test]
    fn unknown_handle_keeps_defaults() {
        let mut reg = registry();
        let mut resolver = DeathResolver::default();
        let mut event = death(2);
        assert_eq!(resolver.resolve(&mut reg, &mut event), DeathOutcome::NotCustom);
        assert_eq!(event.drops, vec![ItemStack::new("ROTTEN_FLESH", 2)]);
        assert_eq!(event.dropped_experience, 5);
    }

    #[test]
    fn no_loot_table_still_untracks() {
        let mut reg = registry();
        let mut resolver = DeathResolver::default();
        let mut event = death(3);
        reg.track(event.handle, TypeId::new("plain"));

        let outcome = resolver.resolve(&mut reg, &mut event);
        assert_eq!(outcome, DeathOutcome::NoLootTable(TypeId::new("plain")));
        assert_eq!(event.dropped_experience, 5);
        assert!(reg.resolve(event.handle).is_none());
    }

    #[test]
    fn missing_loot_table_still_untracks() {
        let mut reg = registry();
        let mut resolver = DeathResolver::default();
        let mut event = death(4);
        reg.track(event.handle, TypeId::new("orphan"));

        let outcome = resolver.resolve(&mut reg, &mut event);
        assert_eq!(outcome, DeathOutcome::MissingLootTable(LootTableId::new("missing")));
        assert_eq!(event.drops.len(), 1);
        assert!(reg.resolve(event.handle).is_none());
    }

    #[test]
    fn unknown_type_still_untracks() {
        let mut reg = registry();
        let mut resolver = DeathResolver::default();
        let mut event = death(5);
        reg.track(event.handle, TypeId::new("ghost"));

        let outcome = resolver.resolve(&mut reg, &mut event);
        assert_eq!(outcome, DeathOutcome::UnknownType(TypeId::new("ghost")));
        assert!(!reg.is_tracked(event.handle));
    }

    #[test]
    fn resolving_twice_is_harmless() {
        let mut reg = registry();
        let mut resolver = DeathResolver::default();
        let mut event = death(6);
        reg.track(event.handle, TypeId::new("brute"));
        resolver.resolve(&mut reg, &mut event);
        assert_eq!(resolver.resolve(&mut reg, &mut event), DeathOutcome::NotCustom);
    }
}
