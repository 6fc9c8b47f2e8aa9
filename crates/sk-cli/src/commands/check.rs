use std::path::Path;

use colored::Colorize;
use sk_spawn::{AreaStore, JsonFileStore};

use super::plural;

pub fn run(store: &Path, catalog: Option<&Path>) -> Result<(), String> {
    let registry = super::load_registry(catalog)?;
    let areas = JsonFileStore::new(store)
        .load()
        .map_err(|e| format!("cannot read store {}: {e}", store.display()))?;

    if areas.is_empty() {
        println!("  No areas in {}.", store.display());
        return Ok(());
    }

    let mut problems = 0;
    for (name, area) in areas {
        let definition = match area.into_definition(&name) {
            Ok(def) => def,
            Err(e) => {
                println!("  {} {name}: {e}", "FAIL".red().bold());
                problems += 1;
                continue;
            }
        };
        let missing: Vec<String> = definition
            .allowed_types()
            .iter()
            .filter(|id| registry.spawn_target(id).is_none())
            .map(ToString::to_string)
            .collect();
        if missing.is_empty() {
            println!("  {}   {name}", "ok".green());
        } else {
            println!(
                "  {} {name}: unknown type{} {}",
                "FAIL".red().bold(),
                plural(missing.len()),
                missing.join(", ")
            );
            problems += 1;
        }
    }

    if problems > 0 {
        return Err(format!("{problems} area{} with problems", plural(problems)));
    }
    println!();
    println!("  All checks passed.");
    Ok(())
}
