use std::path::PathBuf;

use clap::{Parser, Subcommand};
use forge::workspace::ConflictStrategy;

/// Forge - package manager and compiler for AI-agent artifacts.
#[derive(Parser, Debug)]
#[command(name = "forge")]
#[command(version)]
#[command(about = "Install skills, agents, plugins and workspace configs into a workspace.", long_about = None)]
pub struct Cli {
    /// Workspace directory holding forge.toml
    #[arg(short = 'C', long, global = true, default_value = ".")]
    pub workspace: PathBuf,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve, compile and write artifacts into the workspace
    Install {
        /// References of the form [type:]id[@version]; defaults to the forge.toml install list
        refs: Vec<String>,

        /// Compile target (claude-code, cursor)
        #[arg(short, long)]
        target: Option<String>,

        /// What to do with existing files Forge does not own
        #[arg(long, value_parser = parse_strategy)]
        conflict: Option<ConflictStrategy>,

        /// Report what would be written without touching disk
        #[arg(long)]
        dry_run: bool,

        /// Remove files the previous install wrote but this one no longer
        /// produces (default only when installing the forge.toml list)
        #[arg(long, conflicts_with = "no_clean")]
        clean: bool,

        /// Never remove previously installed files
        #[arg(long)]
        no_clean: bool,
    },

    /// Print the resolved dependency tree of one artifact
    Resolve {
        /// Reference of the form [type:]id[@version]
        reference: String,
    },

    /// Search registries by id, name, description and tags
    Search {
        query: String,

        /// Restrict to one artifact type
        #[arg(short = 'k', long = "type")]
        kind: Option<String>,
    },

    /// List available artifacts
    List {
        /// Restrict to one artifact type
        #[arg(short = 'k', long = "type")]
        kind: Option<String>,
    },
}

fn parse_strategy(raw: &str) -> Result<ConflictStrategy, String> {
    raw.parse().map_err(|e: forge::ForgeError| e.to_string())
}
