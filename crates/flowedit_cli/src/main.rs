// SPDX-License-Identifier: MIT OR Apache-2.0
//! `FlowEdit` command line.
//!
//! Headless companion to the flow editor:
//! - Check flow documents against every graph invariant
//! - List module catalogs
//! - Compute minimap projections
//! - Build a demo flow through a full editing session

mod commands;

use clap::{Parser, Subcommand};
use commands::Format;
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// FlowEdit - flow graph tooling
#[derive(Parser, Debug)]
#[command(name = "flowedit")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Module catalog (RON); the built-in catalog is used when absent
    #[arg(short, long, global = true)]
    catalog: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load a flow document and verify it
    Check {
        /// Flow document (.json or .ron)
        file: PathBuf,
    },

    /// List the modules of the catalog
    Catalog,

    /// Project a flow onto a minimap and print the result as JSON
    Minimap {
        /// Flow document (.json or .ron)
        file: PathBuf,
        /// Minimap width
        #[arg(long, default_value_t = 150.0)]
        width: f32,
        /// Minimap height
        #[arg(long, default_value_t = 100.0)]
        height: f32,
        /// Padding around the nodes, in graph units
        #[arg(long, default_value_t = flowedit_graph::minimap::MINIMAP_PADDING)]
        padding: f32,
        /// Viewport pan, x
        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        x: f32,
        /// Viewport pan, y
        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        y: f32,
        /// Viewport zoom
        #[arg(long, default_value_t = 1.0)]
        zoom: f32,
        /// Visible canvas width
        #[arg(long, default_value_t = 1280.0)]
        view_width: f32,
        /// Visible canvas height
        #[arg(long, default_value_t = 720.0)]
        view_height: f32,
    },

    /// Build a small demo flow and print it
    Demo {
        /// Output format; defaults to the output file's extension, else JSON
        #[arg(short, long, value_enum)]
        format: Option<Format>,
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "flowedit=info,flowedit_graph=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    tracing::debug!("FlowEdit v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(cli) {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), commands::CliError> {
    let catalog = commands::load_catalog(cli.catalog.as_deref())?;

    match cli.command {
        Command::Check { file } => commands::check(&file),
        Command::Catalog => {
            commands::list_catalog(&catalog);
            Ok(())
        }
        Command::Minimap {
            file,
            width,
            height,
            padding,
            x,
            y,
            zoom,
            view_width,
            view_height,
        } => {
            let viewport = flowedit_graph::minimap::Viewport {
                x,
                y,
                zoom,
                width: view_width,
                height: view_height,
            };
            let config = flowedit_graph::minimap::MinimapConfig {
                width,
                height,
                padding,
            };
            commands::minimap(&file, &viewport, &config)
        }
        Command::Demo { format, output } => {
            commands::demo(catalog, format, output.as_deref())
        }
    }
}
