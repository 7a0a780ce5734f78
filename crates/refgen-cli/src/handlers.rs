//! Command handlers: resolve arguments, call into refgen-core, render.

use std::process::ExitCode;

use anyhow::{Result, bail};
use console::style;

use refgen_core::build::{AssetState, BuildOptions, BuildReport};
use refgen_core::commands::{
    self, AddOptions, InitOptions, InitOutcome, LocalListing, PullOptions, PullState, RemoveReport,
    RemoveRequest, SeekResult,
};
use refgen_core::context::AppContext;
use refgen_core::remote::{RemoteCatalog, RemoteListing};

use crate::{Commands, OutputFormat, prompt};

fn exit_code(success: bool) -> ExitCode {
    if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

pub fn run_init(ctx: &AppContext, command: Commands) -> Result<ExitCode> {
    let Commands::Init { genome_server } = command else {
        bail!("init handler received another command");
    };
    let mut options = InitOptions::new(ctx.config_path());
    if let Some(server) = genome_server {
        options = options.with_server(server);
    }

    match commands::init(&options)? {
        InitOutcome::Created(path) => println!("Initialized genome config: {}", path.display()),
        InitOutcome::AlreadyExists(path) => println!(
            "{} can't initialize, file exists: {}",
            style("warning:").yellow().bold(),
            path.display()
        ),
    }
    Ok(ExitCode::SUCCESS)
}

pub fn run_build(ctx: &AppContext, command: Commands) -> Result<ExitCode> {
    let Commands::Build(args) = command else {
        bail!("build handler received another command");
    };
    let args = *args;
    let targets = args.target.resolve()?;
    let options = BuildOptions {
        outfolder: args.outfolder,
        inputs: args.inputs.into_map(),
        docker: args.docker,
        volumes: args.volumes,
        new_start: args.new_start,
        fail_fast: args.fail_fast,
    };

    let report = commands::build(ctx, &targets, &options)?;
    match args.format {
        OutputFormat::Table => print_build_table(&report),
        OutputFormat::Json => print_build_json(&report)?,
    }
    Ok(exit_code(report.is_success()))
}

fn print_build_table(report: &BuildReport) {
    for outcome in &report.outcomes {
        let label = match &outcome.state {
            AssetState::Built => style("built").green(),
            AssetState::Skipped => style("skipped").dim(),
            AssetState::Failed(_) => style("failed").red(),
        };
        print!("{:<40} {}", outcome.target.to_string(), label);
        if let AssetState::Failed(err) = &outcome.state {
            print!("  {}", err);
        }
        println!();
    }
    if report.aborted {
        println!("{}", style("Build aborted; remaining assets were not attempted.").red());
    }
    println!(
        "Summary: {} built, {} skipped, {} failed",
        report.built(),
        report.skipped(),
        report.failed()
    );
}

fn print_build_json(report: &BuildReport) -> Result<()> {
    let outcomes: Vec<_> = report
        .outcomes
        .iter()
        .map(|o| {
            let error = match &o.state {
                AssetState::Failed(err) => Some(err.to_string()),
                _ => None,
            };
            serde_json::json!({
                "asset": o.target.to_string(),
                "state": o.state.label(),
                "error": error,
            })
        })
        .collect();
    let output = serde_json::json!({
        "outcomes": outcomes,
        "aborted": report.aborted,
        "summary": {
            "built": report.built(),
            "skipped": report.skipped(),
            "failed": report.failed(),
        },
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

pub fn run_seek(ctx: &AppContext, command: Commands) -> Result<ExitCode> {
    let Commands::Seek { target, format } = command else {
        bail!("seek handler received another command");
    };
    let registry = ctx.open_registry()?;
    let results = commands::seek(&registry, &target.resolve()?)?;
    match format {
        OutputFormat::Table => print_seek_table(&results),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&results)?),
    }
    Ok(ExitCode::SUCCESS)
}

fn print_seek_table(results: &[SeekResult]) {
    for result in results {
        println!("{}", result.path.display());
    }
}

pub fn run_add(ctx: &AppContext, command: Commands) -> Result<ExitCode> {
    let Commands::Add {
        target,
        path,
        description,
        genome_description,
    } = command
    else {
        bail!("add handler received another command");
    };
    let mut registry = ctx.open_registry()?;
    let added = commands::add(
        &mut registry,
        &target.resolve()?,
        &AddOptions {
            path,
            description,
            genome_description,
        },
    )?;
    println!("Added {}: {}", added, registry.asset_path(&added)?.display());
    Ok(ExitCode::SUCCESS)
}

pub fn run_remove(ctx: &AppContext, command: Commands) -> Result<ExitCode> {
    let Commands::Remove {
        target,
        yes,
        format,
    } = command
    else {
        bail!("remove handler received another command");
    };
    let mut registry = ctx.open_registry()?;
    let request = match (&target.registry_path, &target.genome) {
        (None, Some(genome)) if target.assets.is_empty() => RemoveRequest::Genome(genome.clone()),
        _ => RemoveRequest::Assets(target.resolve()?),
    };

    let plan = commands::plan_remove(&registry, &request);
    if !plan.missing.is_empty() {
        for missing in &plan.missing {
            println!("{} does not exist", missing);
        }
        println!("Nothing removed.");
        return Ok(ExitCode::SUCCESS);
    }
    if plan.items.is_empty() {
        println!("Nothing to remove.");
        return Ok(ExitCode::SUCCESS);
    }
    if !yes && !prompt::confirm_removal(&plan)? {
        println!("Action aborted by user");
        return Ok(ExitCode::SUCCESS);
    }

    let report = commands::execute_remove(&mut registry, &plan);
    match format {
        OutputFormat::Table => print_remove_table(&report),
        OutputFormat::Json => print_remove_json(&report)?,
    }
    Ok(exit_code(report.is_success()))
}

fn print_remove_table(report: &RemoveReport) {
    for warning in &report.warnings {
        println!("{} {}", style("warning:").yellow().bold(), warning);
    }
    for (target, err) in &report.failures {
        println!("{} {}: {}", style("failed:").red().bold(), target, err);
    }
    if report.removed.is_empty() {
        println!("Nothing removed.");
    } else {
        let removed: Vec<String> = report.removed.iter().map(ToString::to_string).collect();
        println!("Removed: {}", removed.join(", "));
    }
}

fn print_remove_json(report: &RemoveReport) -> Result<()> {
    let output = serde_json::json!({
        "removed": report.removed.iter().map(ToString::to_string).collect::<Vec<_>>(),
        "failed": report
            .failures
            .iter()
            .map(|(target, err)| serde_json::json!({
                "asset": target.to_string(),
                "error": err.to_string(),
            }))
            .collect::<Vec<_>>(),
        "warnings": report.warnings,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

pub fn run_list(ctx: &AppContext, command: Commands) -> Result<ExitCode> {
    let Commands::List {
        genome,
        remote,
        format,
    } = command
    else {
        bail!("list handler received another command");
    };
    let registry = ctx.open_registry()?;

    if remote {
        let catalog = ctx.remote_catalog(&registry)?;
        let listing = catalog.list_remote(genome.as_deref())?;
        match format {
            OutputFormat::Table => print_remote_table(catalog.server().as_str(), &listing),
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&listing)?),
        }
        return Ok(ExitCode::SUCCESS);
    }

    let listing = commands::list_local(&registry, ctx.catalog(), genome.as_deref())?;
    match format {
        OutputFormat::Table => print_local_table(&listing),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&listing)?),
    }
    Ok(ExitCode::SUCCESS)
}

fn print_assets(genomes: &std::collections::BTreeMap<String, Vec<(String, String)>>) {
    if genomes.is_empty() {
        println!("No genomes.");
        return;
    }
    println!("{:<20} Assets", "Genome");
    println!("{}", "-".repeat(70));
    for (genome, assets) in genomes {
        let assets: Vec<String> = assets
            .iter()
            .map(|(asset, tag)| format!("{}:{}", asset, tag))
            .collect();
        let assets = if assets.is_empty() {
            "-".to_string()
        } else {
            assets.join(", ")
        };
        println!("{:<20} {}", genome, assets);
    }
}

fn print_local_table(listing: &LocalListing) {
    print_assets(&listing.genomes);
    println!();
    println!("Recipes: {}", listing.recipes.join(", "));
}

fn print_remote_table(server: &str, listing: &RemoteListing) {
    println!("Server: {}", server);
    print_assets(&listing.genomes);
}

pub fn run_getseq(ctx: &AppContext, command: Commands) -> Result<ExitCode> {
    let Commands::Getseq { genome, locus } = command else {
        bail!("getseq handler received another command");
    };
    let registry = ctx.open_registry()?;
    println!("{}", commands::getseq(&registry, &genome, &locus)?);
    Ok(ExitCode::SUCCESS)
}

pub fn run_pull(ctx: &AppContext, command: Commands) -> Result<ExitCode> {
    let Commands::Pull {
        target,
        force,
        no_untar,
    } = command
    else {
        bail!("pull handler received another command");
    };
    let mut registry = ctx.open_registry()?;
    let remote = ctx.remote_catalog(&registry)?;
    let outcomes = commands::pull(
        &mut registry,
        ctx.catalog(),
        &remote,
        &target.resolve()?,
        &PullOptions { force, no_untar },
    )?;

    let mut success = true;
    for outcome in &outcomes {
        match &outcome.state {
            PullState::Pulled(path) => {
                println!("{:<40} {}", outcome.target.to_string(), path.display())
            }
            PullState::Present(path) => println!(
                "{:<40} {} (already present)",
                outcome.target.to_string(),
                path.display()
            ),
            PullState::Failed(err) => {
                success = false;
                println!(
                    "{:<40} {} {}",
                    outcome.target.to_string(),
                    style("failed:").red(),
                    err
                );
            }
        }
    }
    Ok(exit_code(success))
}
