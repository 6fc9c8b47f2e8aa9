pub mod check;
pub mod create;
pub mod list;
pub mod remove;
pub mod simulate;

use std::path::Path;

use sk_core::{BlockPos, TypeRegistry};
use sk_spawn::{Catalog, JsonFileStore, Sandbox, SandboxWorld, SpawnConfig};

/// Terrain height of the in-memory world the commands run against.
const SANDBOX_TERRAIN: i32 = 63;

/// Parse an `x,y,z` block position.
pub fn parse_block_pos(raw: &str) -> Result<BlockPos, String> {
    let parts: Vec<&str> = raw.split(',').map(str::trim).collect();
    let [x, y, z] = parts.as_slice() else {
        return Err(format!("expected x,y,z but got '{raw}'"));
    };
    let coord = |s: &str| {
        s.parse::<i32>()
            .map_err(|e| format!("bad coordinate '{s}': {e}"))
    };
    Ok(BlockPos::new(coord(x)?, coord(y)?, coord(z)?))
}

/// Registry holding the catalog's mob types, or an empty one.
fn load_registry(catalog: Option<&Path>) -> Result<TypeRegistry, String> {
    let mut registry = TypeRegistry::new();
    if let Some(path) = catalog {
        let catalog = Catalog::from_json_file(path)
            .map_err(|e| format!("cannot load catalog {}: {e}", path.display()))?;
        catalog
            .register_into(&mut registry)
            .map_err(|e| format!("invalid catalog {}: {e}", path.display()))?;
    }
    Ok(registry)
}

/// Open the store in a sandbox host. Nothing starts unless `config` says so.
fn open_sandbox(
    store: &Path,
    registry: TypeRegistry,
    config: SpawnConfig,
) -> Result<Sandbox, String> {
    Sandbox::open(
        SandboxWorld::new(SANDBOX_TERRAIN),
        registry,
        Box::new(JsonFileStore::new(store)),
        config,
    )
    .map_err(|e| format!("cannot open store {}: {e}", store.display()))
}

/// Load `--config`, or the defaults when none is given.
pub fn load_config(path: Option<&Path>) -> Result<SpawnConfig, String> {
    match path {
        Some(path) => SpawnConfig::from_json_file(path)
            .map_err(|e| format!("cannot load config {}: {e}", path.display())),
        None => Ok(SpawnConfig::default()),
    }
}

/// `base` adjusted for commands that only edit the store.
fn editing_config(base: &SpawnConfig) -> SpawnConfig {
    base.clone()
        .with_auto_start_on_load(false)
        .with_registry_sweep_interval(0)
}

fn plural(n: usize) -> &'static str {
    if n == 1 { "" } else { "s" }
}
