//! photofx - Main Entry Point
//!
//! Command-line front end for the filter engine: browse the catalog, render
//! a filter onto an image file, and edit per-filter metadata.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use photofx::{
    filters::ParamValue, EngineConfig, FilterCatalog, FilterDescriptor, FrameSink, ImageSource,
    PictureSource, PipelineWirer,
};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "photofx", version, about = "Photo filter pipeline and catalog")]
struct Cli {
    /// Engine config file (defaults to the app data directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List categories and their filters
    List {
        /// Only this category
        category: Option<String>,
        /// Include hidden filters
        #[arg(long)]
        all: bool,
    },
    /// Show a filter's parameters and metadata
    Info { key: String },
    /// Apply a filter to an image file
    Render {
        #[arg(long)]
        filter: String,
        #[arg(long)]
        input: PathBuf,
        /// Side input for blend filters
        #[arg(long)]
        blend: Option<PathBuf>,
        #[arg(long)]
        output: PathBuf,
        /// Parameter override, `name=value`
        #[arg(long = "param", value_parser = parse_param)]
        params: Vec<(String, ParamValue)>,
    },
    /// Hide a filter from category listings
    Hide { key: String },
    /// Show a hidden filter again
    Show { key: String },
    /// Add a filter to favorites
    Favorite { key: String },
    /// Remove a filter from favorites
    Unfavorite { key: String },
    /// Rate a filter from 0 to 3
    Rate { key: String, rating: i64 },
    /// Mark a filter as slow to render
    Slow {
        key: String,
        /// Clear the flag instead
        #[arg(long)]
        clear: bool,
    },
    /// Reset categories and metadata to the shipped defaults
    RestoreDefaults,
}

fn parse_param(text: &str) -> Result<(String, ParamValue), String> {
    let (name, value) = text
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got '{}'", text))?;
    let value = ParamValue::parse(value).ok_or_else(|| format!("invalid value '{}'", value))?;
    Ok((name.trim().to_string(), value))
}

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,photofx=debug")),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => EngineConfig::load_from(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => EngineConfig::load_or_default(),
    };
    let catalog = FilterCatalog::open(&config).context("Failed to open catalog")?;

    match cli.command {
        Command::List { category, all } => {
            let keys = match category {
                Some(c) => vec![c],
                None => catalog.category_keys(),
            };
            for key in keys {
                let members = catalog.try_filters_in(&key)?;
                let title = catalog.category_title(&key).unwrap_or_else(|| key.clone());
                println!("{} ({})", title, key);
                let filters = if all {
                    members
                } else {
                    catalog.shown_filters_in(&key)
                };
                for filter in filters {
                    let meta = catalog.metadata(&filter).unwrap_or_default();
                    println!(
                        "  {:<20} {}{}{}{}",
                        filter,
                        "*".repeat(meta.rating.value() as usize),
                        if meta.favorite { " [fav]" } else { "" },
                        if meta.hidden { " [hidden]" } else { "" },
                        if meta.slow { " [slow]" } else { "" },
                    );
                }
            }
        }
        Command::Info { key } => {
            let descriptor = catalog.try_descriptor_for(&key)?;
            print_info(&descriptor);
        }
        Command::Render {
            filter,
            input,
            blend,
            output,
            params,
        } => {
            let descriptor = catalog.try_descriptor_for(&filter)?;
            for (name, value) in params {
                if descriptor.set_parameter(&name, value).is_none() {
                    bail!("Invalid parameter '{}' for '{}'", name, filter);
                }
            }

            let mut primary = PictureSource::open(&input)?;
            let mut secondary = blend.as_deref().map(PictureSource::open).transpose()?;
            let (frames, sink) = FrameSink::shared();
            let mut wirer = PipelineWirer::new(config.adjunct_opacity);

            let connection = wirer.wire(
                &descriptor,
                &mut primary,
                secondary.as_mut().map(|s| s as &mut dyn ImageSource),
                &sink,
            )?;
            wirer.teardown();

            if !frames.borrow().save(&output)? {
                bail!("Filter '{}' produced no frame", filter);
            }
            tracing::info!(
                "Rendered '{}' ({}) to {}",
                connection.key(),
                connection.arity,
                output.display()
            );
        }
        Command::Hide { key } => require(catalog.set_hidden(&key, true), &key)?,
        Command::Show { key } => require(catalog.set_hidden(&key, false), &key)?,
        Command::Favorite { key } => require(catalog.add_favorite(&key), &key)?,
        Command::Unfavorite { key } => require(catalog.remove_favorite(&key), &key)?,
        Command::Rate { key, rating } => require(catalog.set_rating(&key, rating), &key)?,
        Command::Slow { key, clear } => require(catalog.set_slow(&key, !clear), &key)?,
        Command::RestoreDefaults => {
            catalog.restore_defaults();
            println!("Catalog restored to defaults");
        }
    }

    Ok(())
}

fn require(found: bool, key: &str) -> anyhow::Result<()> {
    if !found {
        bail!("Unknown filter '{}'", key);
    }
    Ok(())
}

fn print_info(descriptor: &FilterDescriptor) {
    println!("{} ({})", descriptor.title(), descriptor.key());
    println!("  arity:    {}", descriptor.arity());
    println!("  rating:   {}", descriptor.rating());
    println!("  favorite: {}", descriptor.is_favorite());
    println!("  hidden:   {}", descriptor.is_hidden());
    println!("  slow:     {}", descriptor.is_slow());
    let rows = descriptor.parameter_rows();
    if rows.is_empty() {
        println!("  no parameters");
    }
    for row in rows {
        println!("  {:<12} {:<8} {:<20} [{}]", row.name, row.value.to_string(), row.kind.to_string(), row.node);
    }
}
