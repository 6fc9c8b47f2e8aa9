use std::path::Path;

use sk_core::{AreaDefinition, BlockPos, Region, TypeId};
use sk_spawn::{SpawnConfig, SpawnError};

/// Everything `create` needs to describe one area.
pub struct NewArea {
    pub name: String,
    pub world: String,
    pub from: BlockPos,
    pub to: BlockPos,
    pub types: Vec<TypeId>,
    pub cap: u32,
    pub interval: u32,
    pub check_interval: Option<u32>,
    pub auto_start: bool,
}

pub fn run(
    store: &Path,
    catalog: Option<&Path>,
    config: &SpawnConfig,
    area: NewArea,
) -> Result<(), String> {
    let region = Region::new(area.world.as_str(), area.from, area.to);
    let invalid = |e: &dyn std::fmt::Display| format!("cannot create area '{}': {e}", area.name);
    let definition = AreaDefinition::new(
        area.name.as_str(),
        region.clone(),
        area.types,
        area.cap,
        area.interval,
    )
    .and_then(|def| {
        def.with_check_interval(
            area.check_interval
                .unwrap_or(config.default_check_interval),
        )
    })
    .map_err(|e| invalid(&e))?
    .with_auto_start(area.auto_start);

    let registry = super::load_registry(catalog)?;
    let mut sb = super::open_sandbox(store, registry, super::editing_config(config))?;
    let (orch, registry) = sb.orchestrator_and_registry();
    orch.try_add_area(definition, registry).map_err(|e| match e {
        SpawnError::Io(_) | SpawnError::Json(_) => {
            format!("cannot write store {}: {e}", store.display())
        }
        other => invalid(&other),
    })?;

    println!("  Created area '{}' in {region}.", area.name);
    Ok(())
}
