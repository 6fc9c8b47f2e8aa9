//! CLI frontend for the Spawnkeep spawn-area engine.

mod commands;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use sk_core::{BlockPos, TypeId};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    name = "spawnkeep",
    about = "Spawnkeep: scheduled mob spawning in bounded areas",
    version,
    propagate_version = true
)]
struct Cli {
    /// Debug logging, and per-tick output where a command has it
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Engine config file (JSON); missing fields take their defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate stored areas against the mob catalog
    Check {
        /// Area store file
        #[arg(short, long, default_value = "areas.json")]
        store: PathBuf,

        /// Mob and loot table catalog
        #[arg(short, long)]
        catalog: Option<PathBuf>,
    },

    /// List stored spawn areas
    List {
        /// Area store file
        #[arg(short, long, default_value = "areas.json")]
        store: PathBuf,
    },

    /// Create and persist a spawn area
    Create {
        /// Area name
        name: String,

        /// World the region lies in
        #[arg(short, long)]
        world: String,

        /// First region corner as x,y,z
        #[arg(long, value_parser = commands::parse_block_pos, allow_hyphen_values = true)]
        from: BlockPos,

        /// Opposite region corner as x,y,z
        #[arg(long, value_parser = commands::parse_block_pos, allow_hyphen_values = true)]
        to: BlockPos,

        /// Comma-separated mob types (built-in kinds or catalog ids)
        #[arg(short, long, value_delimiter = ',', required = true)]
        types: Vec<String>,

        /// Maximum tracked entities
        #[arg(long, default_value = "20")]
        cap: u32,

        /// Ticks between spawn attempts
        #[arg(short, long, default_value = "100")]
        interval: u32,

        /// Ticks between containment checks
        #[arg(long)]
        check_interval: Option<u32>,

        /// Start the area whenever the store is loaded
        #[arg(long)]
        auto_start: bool,

        /// Area store file
        #[arg(short, long, default_value = "areas.json")]
        store: PathBuf,

        /// Mob and loot table catalog
        #[arg(short, long)]
        catalog: Option<PathBuf>,
    },

    /// Remove a spawn area
    Remove {
        /// Area name
        name: String,

        /// Area store file
        #[arg(short, long, default_value = "areas.json")]
        store: PathBuf,
    },

    /// Run every stored area in an in-memory world
    Simulate {
        /// Area store file
        #[arg(short, long, default_value = "areas.json")]
        store: PathBuf,

        /// Mob and loot table catalog
        #[arg(short, long)]
        catalog: Option<PathBuf>,

        /// Number of ticks to simulate (default: 1200 = one minute at 20 ticks/s)
        #[arg(short, long, default_value = "1200")]
        ticks: u64,

        /// RNG seed for deterministic simulation (default: the config's seed)
        #[arg(long)]
        seed: Option<u64>,

        /// Largest per-tick horizontal step of a wandering entity, in blocks (at most 1024)
        #[arg(long, default_value = "0.5")]
        wander: f64,

        /// Per-tick chance that a live entity dies
        #[arg(long, default_value = "0.002")]
        death_chance: f64,
    },
}

fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_writer(std::io::stderr),
        )
        .init();

    let config = match commands::load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Check { store, catalog } => commands::check::run(&store, catalog.as_deref()),
        Commands::List { store } => commands::list::run(&store, &config),
        Commands::Create {
            name,
            world,
            from,
            to,
            types,
            cap,
            interval,
            check_interval,
            auto_start,
            store,
            catalog,
        } => commands::create::run(
            &store,
            catalog.as_deref(),
            &config,
            commands::create::NewArea {
                name,
                world,
                from,
                to,
                types: types.into_iter().map(TypeId::new).collect(),
                cap,
                interval,
                check_interval,
                auto_start,
            },
        ),
        Commands::Remove { name, store } => commands::remove::run(&store, &name, &config),
        Commands::Simulate {
            store,
            catalog,
            ticks,
            seed,
            wander,
            death_chance,
        } => commands::simulate::run(
            &store,
            catalog.as_deref(),
            &config,
            commands::simulate::SimulateOptions {
                ticks,
                seed: seed.unwrap_or(config.seed),
                wander,
                death_chance,
                verbose: cli.verbose,
            },
        ),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        process::exit(1);
    }
}
