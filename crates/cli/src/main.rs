//! Command-line interface for wheel reconciliation.
//!
//! This CLI tool runs the reconciliation engine against a managed directory,
//! previews the plan, or inspects a single wheel.

use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process;
use wheel_sync::{
    apply, inspect_archive, load_sources, plan_only, ApplyRequest, SyncError, SyncOptions,
};

#[derive(Parser)]
#[command(name = "wheel-sync")]
#[command(version, about = "Reconcile a site-packages directory with wheel archives", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Target {
    /// Managed directory; nothing outside it is modified
    #[arg(long)]
    local_dir: PathBuf,

    /// Directory wheels are extracted into (below the managed directory)
    #[arg(long)]
    site_packages: PathBuf,

    /// JSON file listing archive sources
    #[arg(long)]
    sources: PathBuf,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Remove obsolete packages and extract missing ones
    Apply {
        #[command(flatten)]
        target: Target,

        /// Keep directories left empty by a rolled-back extraction
        #[arg(long)]
        keep_empty_dirs: bool,
    },

    /// Show what apply would do without changing anything
    Plan {
        #[command(flatten)]
        target: Target,
    },

    /// Show the package id and top-level paths of a wheel
    Inspect {
        /// Wheel file to inspect
        archive: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Serialize)]
struct InspectOutput<'a> {
    archive: &'a Path,
    package: Option<String>,
    top_level: Vec<String>,
}

fn main() {
    let cli = Cli::parse();

    // Initialize tracing
    let default_level = if cli.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Apply {
            target,
            keep_empty_dirs,
        } => handle_apply(target, cli.debug, keep_empty_dirs),
        Commands::Plan { target } => handle_plan(target),
        Commands::Inspect { archive, json } => handle_inspect(archive, json),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn build_request(target: &Target, options: SyncOptions) -> Result<ApplyRequest, SyncError> {
    Ok(ApplyRequest {
        local_dir: target.local_dir.clone(),
        site_packages: target.site_packages.clone(),
        sources: load_sources(&target.sources)?,
        options,
    })
}

fn handle_apply(
    target: Target,
    debug: bool,
    keep_empty_dirs: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let options = SyncOptions {
        debug,
        prune_empty_dirs: !keep_empty_dirs,
    };
    let request = build_request(&target, options)?;

    let mut stale_paths: Vec<PathBuf> = Vec::new();
    let report = {
        let mut on_error = |err: SyncError| eprintln!("error: {}", err);
        let mut on_stale = |path: &Path, err: SyncError| {
            eprintln!("stale: {} ({})", path.display(), err);
            stale_paths.push(path.to_path_buf());
        };
        apply(&request, &mut on_error, &mut on_stale)?
    };

    if target.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    for id in &report.removed {
        println!("removed   {}", id);
    }
    for id in &report.installed {
        println!("installed {}", id);
    }
    for id in &report.failed {
        println!("failed    {}", id);
    }
    for path in &stale_paths {
        println!("stale     {}", path.display());
    }
    Ok(())
}

fn handle_plan(target: Target) -> Result<(), Box<dyn std::error::Error>> {
    let request = build_request(&target, SyncOptions::default())?;
    let mut on_error = |err: SyncError| eprintln!("error: {}", err);
    let preview = plan_only(&request, &mut on_error)?;

    if target.json {
        println!("{}", serde_json::to_string_pretty(&preview)?);
        return Ok(());
    }

    if preview.plan.is_empty() {
        println!("Nothing to do");
    }
    for id in &preview.plan.removals {
        println!("remove  {}", id);
    }
    for id in &preview.plan.installs {
        let archive = preview
            .desired
            .archives
            .get(id)
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        println!("install {} from {}", id, archive);
    }
    for path in &preview.skipped_archives {
        println!("skip    {}", path.display());
    }
    for name in &preview.unowned {
        println!("unowned {}", name);
    }
    Ok(())
}

fn handle_inspect(archive: PathBuf, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let record = inspect_archive(&archive)?;
    let output = InspectOutput {
        archive: &archive,
        package: record.as_ref().map(|r| r.id.to_string()),
        top_level: record
            .map(|r| r.top_level.into_iter().collect())
            .unwrap_or_default(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    match &output.package {
        Some(id) => {
            println!("Package: {}", id);
            for path in &output.top_level {
                println!("  {}", path);
            }
        }
        None => println!("No package metadata found in {}", archive.display()),
    }
    Ok(())
}
