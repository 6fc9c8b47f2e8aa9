use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::region::Location;

/// Identifier of a loot table.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LootTableId(pub String);

impl LootTableId {
    /// Create a loot table id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LootTableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LootTableId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Item material name as the host knows it (e.g. `GOLD_INGOT`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemKind(pub String);

impl ItemKind {
    /// Create an item kind.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The material name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An enchantment carried by a dropped item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enchantment {
    /// Enchantment name as the host knows it.
    pub name: String,
    /// Enchantment level.
    pub level: u32,
}

/// Optional presentation applied to a dropped item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decoration {
    /// Custom item name.
    pub display_name: Option<String>,
    /// Lore lines shown under the name.
    #[serde(default)]
    pub lore: Vec<String>,
    /// Enchantments applied regardless of item compatibility.
    #[serde(default)]
    pub enchantments: Vec<Enchantment>,
}

impl Decoration {
    /// Returns true when the decoration changes nothing.
    pub fn is_empty(&self) -> bool {
        self.display_name.is_none() && self.lore.is_empty() && self.enchantments.is_empty()
    }
}

/// One stack of items produced by a loot roll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStack {
    /// Material of the stack.
    pub item: ItemKind,
    /// Number of items in the stack.
    pub quantity: u32,
    /// Presentation, if any.
    pub decoration: Option<Decoration>,
}

impl ItemStack {
    /// A plain stack with no decoration.
    pub fn new(item: impl Into<String>, quantity: u32) -> Self {
        Self {
            item: ItemKind::new(item),
            quantity,
            decoration: None,
        }
    }
}

/// An independent probabilistic drop rule.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LootEntry {
    item: ItemKind,
    min_quantity: u32,
    max_quantity: u32,
    drop_chance: f64,
    decoration: Option<Decoration>,
}

impl LootEntry {
    /// Build and validate a drop rule.
    ///
    /// Requires `min_quantity <= max_quantity` and `drop_chance` in `[0, 1]`.
    pub fn new(
        item: impl Into<String>,
        min_quantity: u32,
        max_quantity: u32,
        drop_chance: f64,
    ) -> CoreResult<Self> {
        let item = ItemKind::new(item);
        if item.as_str().trim().is_empty() {
            return Err(CoreError::InvalidLoot("item kind must not be empty".into()));
        }
        if min_quantity > max_quantity {
            return Err(CoreError::InvalidLoot(format!(
                "{item}: min quantity {min_quantity} exceeds max quantity {max_quantity}"
            )));
        }
        if !(0.0..=1.0).contains(&drop_chance) {
            return Err(CoreError::InvalidLoot(format!(
                "{item}: drop chance {drop_chance} is outside [0, 1]"
            )));
        }
        Ok(Self {
            item,
            min_quantity,
            max_quantity,
            drop_chance,
            decoration: None,
        })
    }

    /// Attach a decoration to every stack this entry produces.
    pub fn with_decoration(mut self, decoration: Decoration) -> Self {
        self.decoration = (!decoration.is_empty()).then_some(decoration);
        self
    }

    /// Item material.
    pub fn item(&self) -> &ItemKind {
        &self.item
    }

    /// Inclusive quantity range.
    pub fn quantity_range(&self) -> (u32, u32) {
        (self.min_quantity, self.max_quantity)
    }

    /// Probability of this entry dropping.
    pub fn drop_chance(&self) -> f64 {
        self.drop_chance
    }

    /// Roll this entry once.
    pub fn roll<R: Rng>(&self, rng: &mut R) -> Option<ItemStack> {
        if rng.random::<f64>() >= self.drop_chance {
            return None;
        }
        Some(ItemStack {
            item: self.item.clone(),
            quantity: rng.random_range(self.min_quantity..=self.max_quantity),
            decoration: self.decoration.clone(),
        })
    }
}

/// A named, ordered list of independent drop rules.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LootTable {
    id: LootTableId,
    entries: Vec<LootEntry>,
}

impl LootTable {
    /// An empty table.
    pub fn new(id: impl Into<LootTableId>) -> Self {
        Self {
            id: id.into(),
            entries: Vec::new(),
        }
    }

    /// Append an entry.
    pub fn with_entry(mut self, entry: LootEntry) -> Self {
        self.entries.push(entry);
        self
    }

    /// Append an entry in place.
    pub fn push(&mut self, entry: LootEntry) {
        self.entries.push(entry);
    }

    /// Table id.
    pub fn id(&self) -> &LootTableId {
        &self.id
    }

    /// Entries in declaration order.
    pub fn entries(&self) -> &[LootEntry] {
        &self.entries
    }

    /// Roll every entry independently for a death at `at`.
    ///
    /// Any number of entries may drop in the same call. Output follows entry
    /// order.
    pub fn generate_drops<R: Rng>(&self, at: &Location, rng: &mut R) -> Vec<ItemStack> {
        let drops: Vec<ItemStack> = self.entries.iter().filter_map(|e| e.roll(rng)).collect();
        tracing::trace!(table = %self.id, at = %at, count = drops.len(), "generated drops");
        drops
    }
}
