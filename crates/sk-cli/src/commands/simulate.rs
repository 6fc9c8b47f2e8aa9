use std::path::Path;

use colored::Colorize;
use comfy_table::{ContentArrangement, Table};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sk_core::{EntityHandle, Location};
use sk_spawn::{DeathOutcome, Sandbox, SpawnConfig};

use super::plural;

/// Largest accepted `--wander` step, in blocks.
const MAX_WANDER: f64 = 1024.0;

/// Knobs for one simulation run.
pub struct SimulateOptions {
    pub ticks: u64,
    pub seed: u64,
    pub wander: f64,
    pub death_chance: f64,
    pub verbose: bool,
}

#[derive(Debug, Default)]
struct Totals {
    deaths: usize,
    replaced: usize,
    loot_items: usize,
}

pub fn run(
    store: &Path,
    catalog: Option<&Path>,
    config: &SpawnConfig,
    opts: SimulateOptions,
) -> Result<(), String> {
    if !(0.0..=1.0).contains(&opts.death_chance) {
        return Err(format!(
            "death chance {} is outside [0, 1]",
            opts.death_chance
        ));
    }
    if !(0.0..=MAX_WANDER).contains(&opts.wander) {
        return Err(format!(
            "wander distance {} is outside [0, {MAX_WANDER}]",
            opts.wander
        ));
    }

    let registry = super::load_registry(catalog)?;
    let config = config
        .clone()
        .with_seed(opts.seed)
        .with_auto_start_on_load(false);
    let mut sb = super::open_sandbox(store, registry, config)?;

    if sb.orchestrator().area_count() == 0 {
        println!("  No areas found. Nothing to simulate.");
        return Ok(());
    }
    let started = sb.with_context(|orch, ctx| orch.start_all(&mut *ctx.scheduler));

    // Own stream: spawn placement must not depend on --wander or --death-chance.
    let mut rng = StdRng::seed_from_u64(opts.seed.wrapping_add(2));
    let mut totals = Totals::default();

    if opts.verbose {
        println!("  {}", "Event Log".bold().underline());
        println!();
    }
    for _ in 0..opts.ticks {
        sb.tick();
        let handles: Vec<EntityHandle> = sb.world().handles().collect();
        for handle in handles {
            if rng.random::<f64>() < opts.death_chance {
                resolve_death(&mut sb, handle, &mut totals, opts.verbose);
            } else if opts.wander > 0.0 {
                wander(&mut sb, handle, opts.wander, &mut rng);
            }
        }
    }
    if opts.verbose {
        if totals.deaths == 0 {
            println!("  {}", "(no deaths)".dimmed());
        }
        println!();
    }

    println!(
        "  {} '{}' {}",
        "Simulation".bold(),
        store.display(),
        format!("({} ticks, seed={})", opts.ticks, opts.seed).dimmed()
    );
    println!("  {started} area{} running", plural(started));
    println!();

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Area", "Active", "Tracked", "Cap", "Types"]);
    for status in sb.orchestrator().statuses() {
        let types: Vec<&str> = status.allowed_types.iter().map(|t| t.as_str()).collect();
        table.add_row(vec![
            status.name.clone(),
            if status.active { "yes" } else { "no" }.to_string(),
            status.tracked.to_string(),
            status.population_cap.to_string(),
            types.join(", "),
        ]);
    }
    println!("{table}");
    println!();

    println!("  {}", "Totals".bold().underline());
    println!("  spawned:                 {}", sb.world().spawn_calls());
    println!("  removed by containment:  {}", sb.world().remove_calls());
    println!("  deaths resolved:         {}", totals.deaths);
    println!("  loot tables applied:     {}", totals.replaced);
    println!("  loot items:              {}", totals.loot_items);
    println!("  alive at end:            {}", sb.world().live_count());

    let removed = sb.with_context(|orch, ctx| orch.shutdown_all(ctx));
    tracing::debug!(removed, "sandbox shut down");
    Ok(())
}

fn resolve_death(sb: &mut Sandbox, handle: EntityHandle, totals: &mut Totals, verbose: bool) {
    let tick = sb.clock().tick();
    let mob_type = sb.registry().resolve(handle).cloned();
    let Some((event, outcome)) = sb.kill(handle) else {
        return;
    };
    totals.deaths += 1;
    if outcome.replaced_drops() {
        totals.replaced += 1;
        totals.loot_items += event.drops.len();
    }
    if !verbose {
        return;
    }

    let label = mob_type.map_or_else(|| "built-in".to_string(), |t| t.to_string());
    let detail = match &outcome {
        DeathOutcome::Replaced { table, items } => {
            format!("{items} item{} from '{table}'", plural(*items)).green()
        }
        DeathOutcome::NotCustom => "default drops".dimmed(),
        other => format!("{other:?}").yellow(),
    };
    let tick_label = format!("[tick {tick:>5}]").dimmed();
    println!(
        "  {tick_label} {}  {handle} ({label}) at {}  {detail}",
        "DEATH".red().bold(),
        event.location.block()
    );
}

fn wander(sb: &mut Sandbox, handle: EntityHandle, step: f64, rng: &mut StdRng) {
    let Some(from) = sb.world().entity(handle).map(|e| e.location.clone()) else {
        return;
    };
    let to = Location::new(
        from.world,
        from.x + rng.random_range(-step..=step),
        from.y,
        from.z + rng.random_range(-step..=step),
    );
    sb.world_mut().move_entity(handle, to);
}
