use serde::Serialize;

use crate::error::{CoreError, CoreResult};
use crate::mob::TypeId;
use crate::region::Region;

/// Check interval used when none is given: once per second at 20 ticks/s.
pub const DEFAULT_CHECK_INTERVAL: u32 = 20;

/// Persisted configuration of one named spawn area.
///
/// `allowed_types` is an ordered set: insertion order is kept and duplicates
/// are dropped. Cap and intervals are always positive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AreaDefinition {
    name: String,
    region: Region,
    allowed_types: Vec<TypeId>,
    population_cap: u32,
    spawn_interval: u32,
    check_interval: u32,
    auto_start: bool,
}

impl AreaDefinition {
    /// Build and validate an area with the default check interval and
    /// auto-start off.
    pub fn new(
        name: impl Into<String>,
        region: Region,
        allowed_types: Vec<TypeId>,
        population_cap: u32,
        spawn_interval: u32,
    ) -> CoreResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(CoreError::InvalidArea("area name must not be empty".into()));
        }
        let mut def = Self {
            name,
            region,
            allowed_types: Vec::new(),
            population_cap: 1,
            spawn_interval: 1,
            check_interval: DEFAULT_CHECK_INTERVAL,
            auto_start: false,
        };
        def.set_allowed_types(allowed_types)?;
        def.set_population_cap(population_cap)?;
        def.set_spawn_interval(spawn_interval)?;
        Ok(def)
    }

    /// Same as [`new`](Self::new) with an explicit check interval.
    pub fn with_check_interval(mut self, ticks: u32) -> CoreResult<Self> {
        self.set_check_interval(ticks)?;
        Ok(self)
    }

    /// Same as [`new`](Self::new) with the auto-start flag set.
    pub fn with_auto_start(mut self, auto_start: bool) -> Self {
        self.auto_start = auto_start;
        self
    }

    /// Area name (unique key).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Spawn region.
    pub fn region(&self) -> &Region {
        &self.region
    }

    /// Types this area may spawn, in order.
    pub fn allowed_types(&self) -> &[TypeId] {
        &self.allowed_types
    }

    /// Maximum number of tracked entities.
    pub fn population_cap(&self) -> u32 {
        self.population_cap
    }

    /// Ticks between spawn attempts.
    pub fn spawn_interval(&self) -> u32 {
        self.spawn_interval
    }

    /// Ticks between containment sweeps.
    pub fn check_interval(&self) -> u32 {
        self.check_interval
    }

    /// Whether the area starts when loaded.
    pub fn auto_start(&self) -> bool {
        self.auto_start
    }

    /// Whether the type is in the allowed set.
    pub fn allows(&self, type_id: &TypeId) -> bool {
        self.allowed_types.contains(type_id)
    }

    /// Replace the region wholesale.
    pub fn set_region(&mut self, region: Region) {
        self.region = region;
    }

    /// Replace the allowed set. Fails if it would be empty.
    pub fn set_allowed_types(&mut self, types: Vec<TypeId>) -> CoreResult<()> {
        let mut deduped: Vec<TypeId> = Vec::with_capacity(types.len());
        for t in types {
            if !deduped.contains(&t) {
                deduped.push(t);
            }
        }
        if deduped.is_empty() {
            return Err(CoreError::InvalidArea(format!(
                "{}: at least one allowed type is required",
                self.name
            )));
        }
        self.allowed_types = deduped;
        Ok(())
    }

    /// Add a type to the allowed set. Returns false if already present.
    pub fn add_type(&mut self, type_id: TypeId) -> bool {
        if self.allows(&type_id) {
            return false;
        }
        self.allowed_types.push(type_id);
        true
    }

    /// Remove a type from the allowed set.
    ///
    /// Returns false if it was absent or is the last remaining type.
    pub fn remove_type(&mut self, type_id: &TypeId) -> bool {
        if self.allowed_types.len() <= 1 || !self.allows(type_id) {
            return false;
        }
        self.allowed_types.retain(|t| t != type_id);
        true
    }

    /// Set the population cap. Must be positive.
    pub fn set_population_cap(&mut self, cap: u32) -> CoreResult<()> {
        self.population_cap = positive(&self.name, "population cap", cap)?;
        Ok(())
    }

    /// Set the spawn interval in ticks. Must be positive.
    pub fn set_spawn_interval(&mut self, ticks: u32) -> CoreResult<()> {
        self.spawn_interval = positive(&self.name, "spawn interval", ticks)?;
        Ok(())
    }

    /// Set the check interval in ticks. Must be positive.
    pub fn set_check_interval(&mut self, ticks: u32) -> CoreResult<()> {
        self.check_interval = positive(&self.name, "check interval", ticks)?;
        Ok(())
    }

    /// Set the auto-start flag.
    pub fn set_auto_start(&mut self, auto_start: bool) {
        self.auto_start = auto_start;
    }
}

fn positive(area: &str, what: &str, value: u32) -> CoreResult<u32> {
    if value == 0 {
        return Err(CoreError::InvalidArea(format!(
            "{area}: {what} must be greater than zero"
        )));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::BlockPos;

    fn region() -> Region {
        Region::new("w", BlockPos::new(0, 64, 0), BlockPos::new(10, 64, 10))
    }

    fn farm() -> AreaDefinition {
        AreaDefinition::new("farm", region(), vec![TypeId::new("COW")], 3, 5).unwrap()
    }

    #[test]
    fn defaults() {
        let def = farm();
        assert_eq!(def.name(), "farm");
        assert_eq!(def.population_cap(), 3);
        assert_eq!(def.spawn_interval(), 5);
        assert_eq!(def.check_interval(), DEFAULT_CHECK_INTERVAL);
        assert!(!def.auto_start());
    }

    #[test]
    fn rejects_zero_values() {
        assert!(AreaDefinition::new("a", region(), vec![TypeId::new("COW")], 0, 5).is_err());
        assert!(AreaDefinition::new("a", region(), vec![TypeId::new("COW")], 1, 0).is_err());
        assert!(farm().with_check_interval(0).is_err());
    }

    #[test]
    fn rejects_empty_types_and_name() {
        assert!(AreaDefinition::new("a", region(), vec![], 1, 1).is_err());
        assert!(AreaDefinition::new(" ", region(), vec![TypeId::new("COW")], 1, 1).is_err());
    }

    #[test]
    fn allowed_types_are_an_ordered_set() {
        let def = AreaDefinition::new(
            "a",
            region(),
            vec![
                TypeId::new("PIG"),
                TypeId::new("COW"),
                TypeId::new("PIG"),
            ],
            1,
            1,
        )
        .unwrap();
        let names: Vec<&str> = def.allowed_types().iter().map(|t| t.as_str()).collect();
        assert_eq!(names, vec!["PIG", "COW"]);
    }

    #[test]
    fn add_and_remove_types() {
        let mut def = farm();
        assert!(def.add_type(TypeId::new("SHEEP")));
        assert!(!def.add_type(TypeId::new("SHEEP")));
        assert!(def.remove_type(&TypeId::new("COW")));
        assert!(!def.remove_type(&TypeId::new("SHEEP")), "last type stays");
        assert!(def.allows(&TypeId::new("SHEEP")));
    }

    #[test]
    fn failed_setter_leaves_value_unchanged() {
        let mut def = farm();
        assert!(def.set_population_cap(0).is_err());
        assert_eq!(def.population_cap(), 3);
    }
}
