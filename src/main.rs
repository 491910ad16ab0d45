#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]

use anyhow::{Context, Result};
use clap::Parser;
use forge::artifact::{ArtifactRef, ArtifactType, ResolvedArtifact};
use forge::{Forge, InstallOptions};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

mod cli;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("setting default subscriber failed")?;

    let mut forge = Forge::open(&cli.workspace).map_err(report)?;
    dispatch(&mut forge, cli.command).await.map_err(report)
}

async fn dispatch(forge: &mut Forge, command: Commands) -> forge::Result<()> {
    match command {
        Commands::Install {
            refs,
            target,
            conflict,
            dry_run,
            clean,
            no_clean,
        } => {
            let refs = refs
                .iter()
                .map(|raw| raw.parse())
                .collect::<forge::Result<Vec<ArtifactRef>>>()?;
            let report = forge
                .install(InstallOptions {
                    refs,
                    target,
                    conflict_strategy: conflict,
                    dry_run,
                    clean: match (clean, no_clean) {
                        (true, _) => Some(true),
                        (_, true) => Some(false),
                        _ => None,
                    },
                })
                .await?;

            let verb = if report.dry_run { "would write" } else { "wrote" };
            for path in &report.files_written {
                println!("{verb} {}", path.display());
            }
            for conflict in &report.conflicts {
                println!("conflict {} ({})", conflict.path.display(), conflict.resolution);
            }
            for path in &report.removed {
                println!("removed {}", path.display());
            }
            println!(
                "{} artifact(s) for {} in {} ms",
                report.installed_refs.len(),
                report.target,
                report.duration_ms
            );
        }
        Commands::Resolve { reference } => {
            let resolved = forge.resolve(&reference.parse()?).await?;
            print_tree(&resolved, 0);
        }
        Commands::Search { query, kind } => {
            let kind = kind.map(|k| k.parse::<ArtifactType>()).transpose()?;
            for hit in forge.search(&query, kind).await {
                println!(
                    "{:>4}  {}  {}",
                    hit.score, hit.summary.reference, hit.summary.description
                );
            }
        }
        Commands::List { kind } => {
            let kind = kind.map(|k| k.parse::<ArtifactType>()).transpose()?;
            for summary in forge.list(kind).await {
                println!("{}  {}", summary.reference, summary.description);
            }
        }
    }
    Ok(())
}

fn print_tree(node: &ResolvedArtifact, depth: usize) {
    println!("{}{}", "  ".repeat(depth), node.bundle.meta.to_ref());
    for dependency in &node.dependencies {
        print_tree(dependency, depth + 1);
    }
}

fn report(err: forge::ForgeError) -> anyhow::Error {
    match err.suggestion() {
        Some(hint) => anyhow::anyhow!("[{}] {err}\n  hint: {hint}", err.code()),
        None => anyhow::anyhow!("[{}] {err}", err.code()),
    }
}
