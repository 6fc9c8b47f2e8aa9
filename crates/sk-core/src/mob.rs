use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::entity::EntityKind;
use crate::error::{CoreError, CoreResult};
use crate::loot::{ItemKind, LootTableId};

/// Identifier of a spawnable type: either a registered mob type id or the
/// name of a built-in [`EntityKind`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeId(pub String);

impl TypeId {
    /// Create a type id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TypeId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<EntityKind> for TypeId {
    fn from(kind: EntityKind) -> Self {
        Self::new(kind.as_str())
    }
}

/// Equipment slots a mob can be dressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EquipmentSlot {
    /// Head.
    Helmet,
    /// Chest.
    Chestplate,
    /// Legs.
    Leggings,
    /// Feet.
    Boots,
    /// Primary hand.
    MainHand,
    /// Off hand.
    OffHand,
}

/// A status effect applied to a mob when it spawns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PotionEffect {
    /// Effect name as the host knows it.
    pub effect: String,
    /// Zero-based amplifier.
    #[serde(default)]
    pub amplifier: u8,
    /// Duration in ticks.
    pub duration_ticks: u32,
}

/// Visual and combat attributes of a mob type.
///
/// The spawn engine never inspects these; they are handed to the host in
/// the spawn request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cosmetics {
    /// Name shown above the mob.
    pub display_name: Option<String>,
    /// Maximum health override.
    pub health: Option<f64>,
    /// Attack damage override.
    pub damage: Option<f64>,
    /// Movement speed override.
    pub speed: Option<f64>,
    /// Spawn as the baby variant.
    #[serde(default)]
    pub baby: bool,
    /// Item worn or held in each slot.
    #[serde(default)]
    pub equipment: BTreeMap<EquipmentSlot, ItemKind>,
    /// Effects applied on spawn.
    #[serde(default)]
    pub effects: Vec<PotionEffect>,
}

impl Cosmetics {
    fn validate(&self) -> Result<(), String> {
        for (label, value) in [
            ("health", self.health),
            ("damage", self.damage),
            ("speed", self.speed),
        ] {
            if let Some(v) = value.filter(|v| !(v.is_finite() && *v > 0.0)) {
                return Err(format!("{label} must be a positive number, got {v}"));
            }
        }
        Ok(())
    }
}

/// A registered custom mob type. Immutable after construction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeDefinition {
    id: TypeId,
    kind: EntityKind,
    loot_table: Option<LootTableId>,
    cosmetics: Cosmetics,
}

impl TypeDefinition {
    /// Build and validate a mob type.
    pub fn new(
        id: impl Into<TypeId>,
        kind: EntityKind,
        loot_table: Option<LootTableId>,
        cosmetics: Cosmetics,
    ) -> CoreResult<Self> {
        let id = id.into();
        if id.as_str().trim().is_empty() {
            return Err(CoreError::InvalidType("type id must not be empty".into()));
        }
        cosmetics
            .validate()
            .map_err(|msg| CoreError::InvalidType(format!("{id}: {msg}")))?;
        Ok(Self {
            id,
            kind,
            loot_table,
            cosmetics,
        })
    }

    /// A plain mob type with no loot table and no cosmetics.
    pub fn plain(id: impl Into<TypeId>, kind: EntityKind) -> CoreResult<Self> {
        Self::new(id, kind, None, Cosmetics::default())
    }

    /// Type id.
    pub fn id(&self) -> &TypeId {
        &self.id
    }

    /// Underlying host entity kind.
    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Loot table applied on death, if any.
    pub fn loot_table(&self) -> Option<&LootTableId> {
        self.loot_table.as_ref()
    }

    /// Cosmetic attributes forwarded to the host.
    pub fn cosmetics(&self) -> &Cosmetics {
        &self.cosmetics
    }
}
