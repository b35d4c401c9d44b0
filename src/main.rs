//! symstore CLI - incremental symbol index store

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use symstore::config::{self, StoreLocation, SymstoreConfig};
use symstore::output::is_quiet;
use symstore::storage::SymbolStore;
use symstore::ui::{self, Icons};
use symstore::{Batch, SourceId};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "symstore")]
#[command(version)]
#[command(about = "Incremental symbol index store - staged, atomic merges of symbols and locations")]
#[command(long_about = r#"
symstore keeps a persistent index of code symbols and where they occur.
Each merge batch replaces the locations of the files it touches and leaves
every other file alone.

Example usage:
  symstore init
  symstore merge --batch batch.json
  symstore locate --usr "c:@F@main#"
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON instead of human-readable output
    #[arg(long, global = true)]
    json: bool,

    /// Path to the config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Path to the database file (overrides the config file)
    #[arg(short, long, global = true)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database and its schema
    Init {
        /// Also write a config file pointing at the database
        #[arg(long)]
        write_config: bool,

        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// Merge a batch file into the index
    Merge {
        /// JSON batch produced by a re-indexing pass
        #[arg(short, long)]
        batch: PathBuf,
    },

    /// Show statistics about the index
    Stats,

    /// List every location of a symbol
    Locate {
        /// Symbol usr
        #[arg(short, long)]
        usr: String,
    },

    /// List every location recorded for a source file
    Source {
        /// Source id
        #[arg(short, long)]
        id: i64,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config = SymstoreConfig::load(cli.config.as_deref())?;
    let location = config.resolve(cli.database.as_deref());
    let database = location.database.clone();

    match cli.command {
        Commands::Init { write_config, force } => {
            let store = open_store(&location)?;
            let stats = store.stats()?;

            if write_config {
                let path = cli.config.clone().unwrap_or_else(config::default_config_path);
                config.pinned_to(&location).save(&path, force)?;
                tracing::info!("Wrote config to {}", path.display());
            }

            if cli.json {
                println!("{}", serde_json::json!({ "database": database, "stats": stats }));
            } else {
                ui::success(&format!("Index ready at {}", database.display()));
                println!("{}", ui::stats_table(&stats));
            }
        }

        Commands::Merge { batch } => {
            let parsed = Batch::load(&batch)?;
            let mut store = open_store(&location)?;

            if !cli.json && !is_quiet() {
                ui::header(&format!("Merging {}", batch.display()));
                ui::info("Database", &database.display().to_string());
                ui::info("Symbols", &parsed.symbols.len().to_string());
                ui::info("Locations", &parsed.locations.len().to_string());
            }

            match parsed.apply(&mut store) {
                Ok(stats) => {
                    if cli.json {
                        println!("{}", serde_json::to_string_pretty(&stats)?);
                    } else {
                        println!("{}", ui::merge_table(&stats));
                        ui::success("Batch merged");
                    }
                }
                Err(e) => {
                    ui::error("Batch not applied; index left unchanged");
                    return Err(e.into());
                }
            }
        }

        Commands::Stats => {
            let store = open_store(&location)?;
            let stats = store.stats()?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                println!("{} symstore statistics ({})", Icons::STATS, database.display());
                println!("{}", ui::stats_table(&stats));
            }
        }

        Commands::Locate { usr } => {
            let store = open_store(&location)?;
            let Some(symbol) = store.symbol_by_usr(&usr)? else {
                if cli.json {
                    println!("null");
                } else {
                    ui::warn(&format!("No symbol with usr {}", usr));
                }
                return Ok(());
            };
            let locations = store.locations_of_usr(&usr)?;

            if cli.json {
                let data = serde_json::json!({ "symbol": symbol, "locations": locations });
                println!("{}", serde_json::to_string_pretty(&data)?);
            } else {
                ui::symbol_section(&symbol.name, &symbol.usr);
                if locations.is_empty() {
                    println!("  {} No locations", Icons::EMPTY);
                }
                for location in &locations {
                    let path = store.source_path(location.source_id)?;
                    ui::location_row(location, path.as_deref());
                }
            }
        }

        Commands::Source { id } => {
            let store = open_store(&location)?;
            let source_id = SourceId(id);
            let path = store.source_path(source_id)?;
            let locations = store.locations_in_source(source_id)?;

            if cli.json {
                let data = serde_json::json!({ "sourceId": source_id, "sourcePath": path, "locations": locations });
                println!("{}", serde_json::to_string_pretty(&data)?);
            } else {
                let title = path.clone().unwrap_or_else(|| format!("source #{}", id));
                ui::section(&format!("{} {}", Icons::FILE, title));
                if locations.is_empty() {
                    println!("  {} No locations", Icons::EMPTY);
                }
                for location in &locations {
                    ui::location_row(location, path.as_deref());
                }
            }
        }
    }

    Ok(())
}

fn open_store(location: &StoreLocation) -> anyhow::Result<SymbolStore> {
    tracing::debug!("{} Opening {}", Icons::DATABASE, location.database.display());
    location.open()
}
