//! Refgen - reference genome asset manager
//!
//! Usage:
//!   refgen init -c genome_config.toml
//!   refgen build hg38/fasta --fasta hg38.fa.gz
//!   refgen seek hg38/bowtie2_index
//!   refgen list [--remote]

mod handlers;
mod prompt;

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use console::style;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use refgen_core::context::AppContext;
use refgen_core::registry::{AssetRef, normalize_targets};

#[derive(Parser)]
#[command(name = "refgen", version)]
#[command(about = "Reference genome asset manager", long_about = None)]
struct Cli {
    /// Genome config file [default: $REFGEN_CONFIG, then the user config dir]
    #[arg(short = 'c', long = "genome-config", global = true)]
    genome_config: Option<PathBuf>,

    /// Show debug output
    #[arg(short = 'v', long, global = true, conflicts_with = "silent")]
    verbose: bool,

    /// Only show errors
    #[arg(long, global = true)]
    silent: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Initialize a genome configuration
    Init {
        /// URL of the asset server
        #[arg(short = 's', long)]
        genome_server: Option<String>,
    },

    /// Build genome assets
    Build(Box<BuildArgs>),

    /// Get the local path of registered assets
    Seek {
        #[command(flatten)]
        target: TargetArgs,

        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Register an existing path as an asset
    Add {
        #[command(flatten)]
        target: TargetArgs,

        /// Path to register, relative to the genome folder or absolute
        #[arg(short, long)]
        path: String,

        /// Asset description
        #[arg(long, default_value = "")]
        description: String,

        /// Genome description
        #[arg(long)]
        genome_description: Option<String>,
    },

    /// Remove assets from disk and from the config
    #[command(alias = "rm")]
    Remove {
        #[command(flatten)]
        target: TargetArgs,

        /// Skip the confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,

        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// List genomes, assets and recipes
    List {
        /// Only list this genome
        #[arg(short, long)]
        genome: Option<String>,

        /// List assets available on the server instead
        #[arg(long)]
        remote: bool,

        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Print a sequence from a genome's fasta asset
    Getseq {
        #[arg(short, long)]
        genome: String,

        /// `chr` or `chr:start-end` (0-based, end-exclusive)
        #[arg(short, long)]
        locus: String,
    },

    /// Download prebuilt assets from the server
    Pull {
        #[command(flatten)]
        target: TargetArgs,

        /// Download even if the asset is already registered
        #[arg(long)]
        force: bool,

        /// Keep the downloaded archive packed
        #[arg(short = 'u', long)]
        no_untar: bool,
    },
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Init { .. } => "init",
            Commands::Build(_) => "build",
            Commands::Seek { .. } => "seek",
            Commands::Add { .. } => "add",
            Commands::Remove { .. } => "remove",
            Commands::List { .. } => "list",
            Commands::Getseq { .. } => "getseq",
            Commands::Pull { .. } => "pull",
        }
    }
}

/// Either a registry path or the `--genome`/`--asset` pair.
#[derive(Args, Debug, Clone, Default)]
struct TargetArgs {
    /// Registry path: genome/asset:tag
    registry_path: Option<String>,

    /// Genome name
    #[arg(short, long)]
    genome: Option<String>,

    /// Asset name(s), each optionally with `:tag`
    #[arg(short, long = "asset", num_args = 1..)]
    assets: Vec<String>,
}

impl TargetArgs {
    fn resolve(&self) -> refgen_core::Result<Vec<AssetRef>> {
        normalize_targets(
            self.registry_path.as_deref(),
            self.genome.as_deref(),
            &self.assets,
        )
    }
}

#[derive(Args, Debug)]
struct BuildArgs {
    #[command(flatten)]
    target: TargetArgs,

    #[command(flatten)]
    inputs: RecipeInputArgs,

    /// Build below this folder instead of the configured genome folder
    #[arg(short, long)]
    outfolder: Option<PathBuf>,

    /// Run commands in the recipe's container image
    #[arg(short, long)]
    docker: bool,

    /// Extra folders to mount in docker mode
    #[arg(long, num_args = 1..)]
    volumes: Vec<PathBuf>,

    /// Rebuild even if a completion marker exists
    #[arg(short = 'R', long)]
    new_start: bool,

    /// Stop at the first failing build command
    #[arg(long)]
    fail_fast: bool,

    /// Output format
    #[arg(short, long, default_value = "table")]
    format: OutputFormat,
}

/// Recipe inputs; which ones are required depends on the asset.
#[derive(Args, Debug, Default)]
struct RecipeInputArgs {
    /// FASTA file (fasta)
    #[arg(long)]
    fasta: Option<String>,
    /// GTF annotation (gencode_gtf)
    #[arg(long)]
    gtf: Option<String>,
    /// GFF annotation (ensembl_rb)
    #[arg(long)]
    gff: Option<String>,
    /// Methylation context (epilog_index)
    #[arg(long)]
    context: Option<String>,
    /// refGene annotation (refgene_anno)
    #[arg(long)]
    refgene: Option<String>,
}

impl RecipeInputArgs {
    fn into_map(self) -> BTreeMap<String, String> {
        [
            ("fasta", self.fasta),
            ("gtf", self.gtf),
            ("gff", self.gff),
            ("context", self.context),
            ("refgene", self.refgene),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.map(|v| (name.to_string(), v)))
        .collect()
    }
}

#[derive(Clone, Copy, Debug, ValueEnum, Default, PartialEq, Eq)]
enum OutputFormat {
    /// Human-readable table
    #[default]
    Table,
    /// Machine-readable JSON
    Json,
}

type Handler = fn(&AppContext, Commands) -> Result<ExitCode>;

/// Command name to handler.
const HANDLERS: &[(&str, Handler)] = &[
    ("init", handlers::run_init),
    ("build", handlers::run_build),
    ("seek", handlers::run_seek),
    ("add", handlers::run_add),
    ("remove", handlers::run_remove),
    ("list", handlers::run_list),
    ("getseq", handlers::run_getseq),
    ("pull", handlers::run_pull),
];

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.silent);

    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{} {:#}", style("error:").red().bold(), err);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool, silent: bool) {
    let default = if silent {
        "error"
    } else if verbose {
        "refgen=debug,refgen_core=debug,info"
    } else {
        "warn"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run(cli: Cli) -> Result<ExitCode> {
    let ctx = AppContext::from_env(cli.genome_config.as_deref())?;
    let name = cli.command.name();
    let handler = HANDLERS
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, h)| *h)
        .ok_or_else(|| anyhow::anyhow!("No handler for command: {}", name))?;
    tracing::debug!(command = name, config = %ctx.config_path().display(), "dispatching");
    handler(&ctx, cli.command)
}
