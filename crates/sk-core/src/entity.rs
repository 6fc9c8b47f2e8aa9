use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CoreError;

/// Opaque identifier for one live entity in the host world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityHandle(pub Uuid);

impl EntityHandle {
    /// Generate a new random handle.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Build a handle from a raw 128-bit value. Used by hosts that hand out
    /// sequential ids.
    pub fn from_u128(raw: u128) -> Self {
        Self(Uuid::from_u128(raw))
    }
}

impl Default for EntityHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EntityHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let simple = self.0.simple().to_string();
        write!(f, "{}", &simple[simple.len() - 8..])
    }
}

/// Built-in entity kinds the host knows how to spawn.
///
/// User-declared mob types live in the [`TypeRegistry`](crate::registry::TypeRegistry)
/// and always resolve down to one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityKind {
    /// Cow.
    Cow,
    /// Sheep.
    Sheep,
    /// Pig.
    Pig,
    /// Chicken.
    Chicken,
    /// Rabbit.
    Rabbit,
    /// Horse.
    Horse,
    /// Wolf.
    Wolf,
    /// Villager.
    Villager,
    /// Iron golem.
    IronGolem,
    /// Zombie.
    Zombie,
    /// Husk, the desert zombie.
    Husk,
    /// Drowned, the underwater zombie.
    Drowned,
    /// Skeleton.
    Skeleton,
    /// Stray, the frozen skeleton.
    Stray,
    /// Spider.
    Spider,
    /// Cave spider.
    CaveSpider,
    /// Creeper.
    Creeper,
    /// Enderman.
    Enderman,
    /// Witch.
    Witch,
    /// Slime.
    Slime,
    /// Pillager.
    Pillager,
    /// Vindicator.
    Vindicator,
}

impl EntityKind {
    /// Every built-in kind, in declaration order.
    pub const ALL: [EntityKind; 22] = [
        Self::Cow,
        Self::Sheep,
        Self::Pig,
        Self::Chicken,
        Self::Rabbit,
        Self::Horse,
        Self::Wolf,
        Self::Villager,
        Self::IronGolem,
        Self::Zombie,
        Self::Husk,
        Self::Drowned,
        Self::Skeleton,
        Self::Stray,
        Self::Spider,
        Self::CaveSpider,
        Self::Creeper,
        Self::Enderman,
        Self::Witch,
        Self::Slime,
        Self::Pillager,
        Self::Vindicator,
    ];

    /// Canonical upper-case name, as written in area configuration.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cow => "COW",
            Self::Sheep => "SHEEP",
            Self::Pig => "PIG",
            Self::Chicken => "CHICKEN",
            Self::Rabbit => "RABBIT",
            Self::Horse => "HORSE",
            Self::Wolf => "WOLF",
            Self::Villager => "VILLAGER",
            Self::IronGolem => "IRON_GOLEM",
            Self::Zombie => "ZOMBIE",
            Self::Husk => "HUSK",
            Self::Drowned => "DROWNED",
            Self::Skeleton => "SKELETON",
            Self::Stray => "STRAY",
            Self::Spider => "SPIDER",
            Self::CaveSpider => "CAVE_SPIDER",
            Self::Creeper => "CREEPER",
            Self::Enderman => "ENDERMAN",
            Self::Witch => "WITCH",
            Self::Slime => "SLIME",
            Self::Pillager => "PILLAGER",
            Self::Vindicator => "VINDICATOR",
        }
    }

    /// Parse a kind name, ignoring case and accepting `-` or spaces for `_`.
    pub fn parse(name: &str) -> Option<Self> {
        let normalized = name.trim().to_ascii_uppercase().replace(['-', ' '], "_");
        Self::ALL.into_iter().find(|k| k.as_str() == normalized)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| CoreError::UnknownType(s.to_string()))
    }
}
