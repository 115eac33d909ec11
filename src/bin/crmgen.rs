//! crmgen CLI - generate entity and action proxies from a metadata snapshot

use clap::{Parser, Subcommand};
use crmgen::{GenerationRequest, Generator, GeneratorConfig, SnapshotService};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "crmgen")]
#[command(version, about = "Strongly-typed proxy generation from CRM metadata", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate proxies for entities and actions
    Generate {
        /// Metadata snapshot (JSON or YAML)
        #[arg(short, long)]
        snapshot: PathBuf,

        /// Entity logical names, comma separated
        #[arg(short, long, value_delimiter = ',')]
        entities: Vec<String>,

        /// Action unique names, comma separated
        #[arg(short, long, value_delimiter = ',')]
        actions: Vec<String>,

        /// Output dialect (csharp, typescript) - overrides config file
        #[arg(short, long)]
        dialect: Option<String>,

        /// Maximum attribute filter terms per metadata request - overrides config file
        #[arg(short, long)]
        filter_cap: Option<usize>,

        /// Path to crmgen.yaml
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output directory for generated code
        #[arg(short, long, default_value = "Proxies")]
        output: PathBuf,
    },

    /// Load a metadata snapshot and report what it contains
    Validate {
        /// Metadata snapshot (JSON or YAML)
        #[arg(short, long)]
        snapshot: PathBuf,
    },
}

fn main() {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("crmgen=info")),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Generate {
            snapshot,
            entities,
            actions,
            dialect,
            filter_cap,
            config,
            output,
        } => generate(
            snapshot,
            GenerationRequest { entities, actions },
            dialect,
            filter_cap,
            config,
            output,
        ),
        Commands::Validate { snapshot } => validate(snapshot),
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        process::exit(1);
    }
}

fn generate(
    snapshot: PathBuf,
    request: GenerationRequest,
    dialect: Option<String>,
    filter_cap: Option<usize>,
    config_file: Option<PathBuf>,
    output: PathBuf,
) -> crmgen::Result<()> {
    if request.entities.is_empty() && request.actions.is_empty() {
        return Err(crmgen::GenerationError::Config(
            "Nothing to generate: pass --entities and/or --actions".to_string(),
        ));
    }

    let config = match &config_file {
        Some(path) => {
            let config = GeneratorConfig::from_file(path)?;
            println!("  ✓ Loaded config from {}", path.display());
            config
        }
        None => GeneratorConfig::default(),
    }
    .with_overrides(dialect, filter_cap)?;
    println!("  ✓ Dialect: {}", config.dialect);
    println!("  ✓ Filter cap: {}", config.filter_cap);

    let service = SnapshotService::from_file(&snapshot)?;
    println!(
        "  ✓ Loaded snapshot: {} entities, {} actions",
        service.entity_count(),
        service.action_count()
    );

    let generator = Generator::new(Arc::new(service), config)?;
    let generated = generator.generate(&request)?;
    let created = generated.write_to(&output)?;

    for unit in generated.units() {
        println!("  ✓ {}", unit.path.display());
    }
    println!(
        "\n✨ Generated {} files in {}",
        generated.len(),
        output.display()
    );
    if created {
        println!("  ℹ New files were created; add them to your project.");
    }

    Ok(())
}

fn validate(snapshot: PathBuf) -> crmgen::Result<()> {
    let service = SnapshotService::from_file(&snapshot)?;
    println!("✓ Snapshot {} is valid", snapshot.display());
    println!("  Entities: {}", service.entity_count());
    println!("  Actions: {}", service.action_count());
    Ok(())
}
