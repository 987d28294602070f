//! Fraymakers Metadata CLI
//!
//! Command-line interface for assembling metadata schemas and migrating
//! asset documents and plugin configurations.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use fray_metadata::{
    ConfigMigrationEngine, ConfigOutcome, EngineConfig, MigrationEngine, MigrationOutcome,
    PluginConfig, PresetRegistry, SchemaAssembler,
};

#[derive(Parser)]
#[command(name = "fray-metadata")]
#[command(about = "Assemble metadata schemas and migrate asset documents")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Emit the metadata definitions for an asset's classification
    Definitions {
        /// Asset metadata document (JSON)
        asset: PathBuf,

        /// Plugin configuration supplying the preset collections
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output file (stdout if not specified)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Migrate an asset document to the current version
    Migrate {
        /// Asset metadata document (JSON)
        asset: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Migrate a plugin configuration to the current version
    MigrateConfig {
        /// Plugin configuration file (JSON)
        config: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Definitions {
            asset,
            config,
            output,
            pretty,
        } => run_definitions(&asset, config.as_deref(), output, pretty),

        Commands::Migrate {
            asset,
            output,
            pretty,
        } => run_migrate(&asset, output, pretty),

        Commands::MigrateConfig {
            config,
            output,
            pretty,
        } => run_migrate_config(&config, output, pretty),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

fn run_definitions(
    asset_path: &std::path::Path,
    config_path: Option<&std::path::Path>,
    output: Option<PathBuf>,
    pretty: bool,
) -> Result<(), u8> {
    let asset = load_json(asset_path)?;

    let registry = match config_path {
        Some(path) => {
            let raw = load_json(path)?;
            let config: PluginConfig = serde_json::from_value(raw).map_err(|e| {
                eprintln!("Error parsing {}: {}", path.display(), e);
                2u8
            })?;
            config.registry()
        }
        None => PresetRegistry::new(),
    };

    let engine_config = EngineConfig::default();
    let definitions = SchemaAssembler::new(&engine_config, &registry)
        .definitions(&asset)
        .map_err(|e| {
            eprintln!("Error: {}", e);
            e.exit_code() as u8
        })?;

    write_json(&definitions, output, pretty)
}

fn run_migrate(
    asset_path: &std::path::Path,
    output: Option<PathBuf>,
    pretty: bool,
) -> Result<(), u8> {
    let asset = load_json(asset_path)?;

    let engine = MigrationEngine::new(EngineConfig::default());
    match engine.migrate(&asset) {
        Ok(MigrationOutcome::UpToDate) => {
            println!("Up to date");
            Ok(())
        }
        Ok(MigrationOutcome::Migrated(changeset)) => write_json(&changeset, output, pretty),
        Err(e) => {
            eprintln!("Error: {}", e);
            Err(e.exit_code() as u8)
        }
    }
}

fn run_migrate_config(
    config_path: &std::path::Path,
    output: Option<PathBuf>,
    pretty: bool,
) -> Result<(), u8> {
    let raw = load_json(config_path)?;
    let config: PluginConfig = serde_json::from_value(raw).map_err(|e| {
        eprintln!("Error parsing {}: {}", config_path.display(), e);
        2u8
    })?;

    let engine = ConfigMigrationEngine::new(EngineConfig::default());
    match engine.migrate(&config) {
        Ok(ConfigOutcome::UpToDate) => {
            println!("Up to date");
            Ok(())
        }
        Ok(ConfigOutcome::Migrated(migrated)) => write_json(&migrated, output, pretty),
        Err(e) => {
            eprintln!("Error: {}", e);
            Err(e.exit_code() as u8)
        }
    }
}

fn load_json(path: &std::path::Path) -> Result<serde_json::Value, u8> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        eprintln!("Error reading {}: {}", path.display(), e);
        3u8
    })?;
    serde_json::from_str(&contents).map_err(|e| {
        eprintln!("Error parsing {}: {}", path.display(), e);
        2u8
    })
}

fn write_json<T: serde::Serialize>(
    value: &T,
    output: Option<PathBuf>,
    pretty: bool,
) -> Result<(), u8> {
    let json_output = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .map_err(|e| {
        eprintln!("Error serializing output: {}", e);
        2u8
    })?;

    match output {
        Some(path) => {
            std::fs::write(&path, &json_output).map_err(|e| {
                eprintln!("Error writing to {}: {}", path.display(), e);
                3u8
            })?;
        }
        None => {
            println!("{}", json_output);
        }
    }

    Ok(())
}
