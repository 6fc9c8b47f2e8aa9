use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use sk_core::loot::Decoration;
use sk_core::{
    Cosmetics, EntityKind, LootEntry, LootTable, LootTableId, TypeDefinition, TypeRegistry,
};
use tracing::{info, warn};

use crate::error::SpawnResult;

fn one() -> u32 {
    1
}

fn certain() -> f64 {
    1.0
}

/// One drop rule as written in a catalog file.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogLootEntry {
    /// Item material name.
    pub item: String,
    /// Smallest stack size. Defaults to 1.
    #[serde(default = "one")]
    pub min: u32,
    /// Largest stack size. Defaults to 1.
    #[serde(default = "one")]
    pub max: u32,
    /// Drop probability in `[0, 1]`. Defaults to 1.
    #[serde(default = "certain")]
    pub chance: f64,
    /// Display name, lore and enchantments.
    #[serde(flatten)]
    pub decoration: Decoration,
}

/// One mob type as written in a catalog file.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogMob {
    /// Built-in kind name, case-insensitive.
    pub entity: String,
    /// Loot table replacing the default drops.
    pub loot_table: Option<LootTableId>,
    /// Presentation and attributes forwarded to the host.
    #[serde(flatten)]
    pub cosmetics: Cosmetics,
}

/// Declarative mob types and loot tables.
///
/// ```json
/// {
///   "loot_tables": { "bonus": [{ "item": "GOLD", "min": 1, "max": 1, "chance": 1.0 }] },
///   "mobs": { "brute": { "entity": "ZOMBIE", "loot_table": "bonus", "health": 40 } }
/// }
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Catalog {
    /// Loot tables by id.
    #[serde(default)]
    pub loot_tables: BTreeMap<String, Vec<CatalogLootEntry>>,
    /// Mob types by id.
    #[serde(default)]
    pub mobs: BTreeMap<String, CatalogMob>,
}

/// What a catalog added to a registry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CatalogSummary {
    /// Mob types registered.
    pub types: usize,
    /// Loot tables registered.
    pub loot_tables: usize,
}

impl Catalog {
    /// Parse a catalog from JSON text.
    pub fn from_json_str(text: &str) -> SpawnResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Read and parse a catalog file.
    pub fn from_json_file(path: &Path) -> SpawnResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Validate every table and mob type.
    ///
    /// Fails on the first invalid entry; nothing is returned partially.
    pub fn build(&self) -> SpawnResult<(Vec<LootTable>, Vec<TypeDefinition>)> {
        let mut tables = Vec::with_capacity(self.loot_tables.len());
        for (id, entries) in &self.loot_tables {
            let mut table = LootTable::new(LootTableId::new(id.as_str()));
            for entry in entries {
                table.push(
                    LootEntry::new(entry.item.as_str(), entry.min, entry.max, entry.chance)?
                        .with_decoration(entry.decoration.clone()),
                );
            }
            tables.push(table);
        }

        let mut types = Vec::with_capacity(self.mobs.len());
        for (id, mob) in &self.mobs {
            let kind: EntityKind = mob.entity.parse()?;
            let foreign = mob
                .loot_table
                .as_ref()
                .filter(|table| !self.loot_tables.contains_key(table.as_str()));
            if let Some(table) = foreign {
                warn!(mob_type = %id, table = %table, "mob references a loot table not in this catalog");
            }
            types.push(TypeDefinition::new(
                id.as_str(),
                kind,
                mob.loot_table.clone(),
                mob.cosmetics.clone(),
            )?);
        }
        Ok((tables, types))
    }

    /// Validate the catalog and upsert everything into `registry`.
    pub fn register_into(&self, registry: &mut TypeRegistry) -> SpawnResult<CatalogSummary> {
        let (tables, types) = self.build()?;
        let summary = CatalogSummary {
            types: types.len(),
            loot_tables: tables.len(),
        };
        for table in tables {
            registry.register_loot_table(table);
        }
        for def in types {
            registry.register_type(def);
        }
        info!(
            types = summary.types,
            loot_tables = summary.loot_tables,
            "catalog registered"
        );
        Ok(summary)
    }
}
