//! Stellaris research tree tools.
//!
//! # Usage
//!
//! ```bash
//! # Parse a game directory and write JSON into ./output
//! research-tools generate --input ~/.steam/steamapps/common/Stellaris
//!
//! # Strict check of a technology directory
//! research-tools validate ~/.steam/steamapps/common/Stellaris/common/technology
//!
//! # Tree statistics
//! research-tools stats --input ~/.steam/steamapps/common/Stellaris
//! ```
//!
//! Logs go to stderr. `RUST_LOG` overrides `--verbose`.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use research_tools::{
    config::ToolConfig,
    error::Result,
    export::export_tree,
    pipeline::build_tree,
    validate::validate_technology_dir,
};

#[derive(Parser)]
#[command(name = "research-tools")]
#[command(about = "Stellaris technology parser and research tree generator")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// RON configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Parse files on a single thread
    #[arg(long, global = true)]
    no_parallel: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the tree and write JSON files
    Generate {
        /// Stellaris game directory
        #[arg(short, long)]
        input: PathBuf,

        /// Output directory
        #[arg(short, long, default_value = "output")]
        output: PathBuf,
    },

    /// Report unresolved prerequisites, overrides and cycles
    Validate {
        /// Technology directory
        path: PathBuf,
    },

    /// Print tree statistics
    Stats {
        /// Stellaris game directory
        #[arg(short, long)]
        input: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::builder()
                .with_default_directive(
                    tracing_subscriber::filter::LevelFilter::from_level(log_level).into(),
                )
                .from_env_lossy(),
        )
        .init();

    let result = load_config(&cli).and_then(|config| match &cli.command {
        Commands::Generate { input, output } => cmd_generate(input, output, &config),
        Commands::Validate { path } => cmd_validate(path, &config),
        Commands::Stats { input } => cmd_stats(input, &config),
    });

    if let Err(e) = result {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}

fn load_config(cli: &Cli) -> Result<ToolConfig> {
    let mut config = ToolConfig::load_or_default(cli.config.as_deref())?;
    if cli.no_parallel {
        config.parallel = false;
    }
    Ok(config)
}

fn cmd_generate(input: &Path, output: &Path, config: &ToolConfig) -> Result<()> {
    let built = build_tree(input, config)?;
    let written = export_tree(&built.tree, output)?;
    tracing::info!(
        technologies = built.tree.len(),
        files = written.len(),
        output = %output.display(),
        "Generation complete"
    );
    Ok(())
}

fn cmd_validate(path: &Path, config: &ToolConfig) -> Result<()> {
    let report = validate_technology_dir(path, &config.load_options())?;
    report.log();
    if !report.is_clean() {
        tracing::error!("Validation failed");
        std::process::exit(1);
    }
    tracing::info!("Validation passed");
    Ok(())
}

fn cmd_stats(input: &Path, config: &ToolConfig) -> Result<()> {
    let built = build_tree(input, config)?;
    let tree = &built.tree;

    println!("Technologies: {}", tree.len());
    println!("Files:        {}", built.parsed_files.len());
    println!("Roots:        {}", tree.roots().len());
    println!("Max level:    {}", tree.max_level());
    println!("Languages:    {}", built.languages.join(", "));
    println!();
    println!("Areas:");
    for area in tree.areas() {
        println!("  {area:<16} {}", tree.nodes_by_area(area).len());
    }
    println!("Tiers:");
    for tier in tree.tiers() {
        println!("  {tier:<16} {}", tree.nodes_by_tier(tier).len());
    }
    println!("Categories:");
    for category in tree.categories() {
        println!("  {category:<16} {}", tree.nodes_by_category(category).len());
    }
    Ok(())
}
