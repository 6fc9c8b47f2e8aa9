use std::path::Path;

use comfy_table::{ContentArrangement, Table};
use sk_core::TypeRegistry;
use sk_spawn::SpawnConfig;

use super::plural;

pub fn run(store: &Path, config: &SpawnConfig) -> Result<(), String> {
    let sb = super::open_sandbox(store, TypeRegistry::new(), super::editing_config(config))?;
    let statuses = sb.orchestrator().statuses();

    if statuses.is_empty() {
        println!("  No areas found.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        "Name", "World", "From", "To", "Types", "Cap", "Spawn", "Check", "Auto",
    ]);

    for status in &statuses {
        let types: Vec<&str> = status.allowed_types.iter().map(|t| t.as_str()).collect();
        table.add_row(vec![
            status.name.clone(),
            status.region.world().to_string(),
            status.region.min().to_string(),
            status.region.max().to_string(),
            types.join(", "),
            status.population_cap.to_string(),
            status.spawn_interval.to_string(),
            status.check_interval.to_string(),
            if status.auto_start { "yes" } else { "no" }.to_string(),
        ]);
    }

    println!("{table}");
    println!();
    println!("  {} area{}", statuses.len(), plural(statuses.len()));

    Ok(())
}
