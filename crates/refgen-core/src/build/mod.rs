//! Asset build orchestration.
//!
//! A request is checked as a whole before anything runs: recipe inputs,
//! their readability, dependencies (registered or produced by an earlier
//! target) and the identity of any primary asset. Each asset then moves
//! through planning, execution and registration.

pub mod runner;

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::checksum::{GenomeChecksum, compute_genome_checksum, content_table_path};
use crate::error::{RefgenError, Result};
use crate::fasta::FastaReader;
use crate::fs::{ensure_readable, ensure_writable, hash_tree};
use crate::recipe::{AssetVars, BuildPackage, Catalog, FILE_INPUTS, PRIMARY_ASSET};
use crate::registry::{AssetRecord, AssetRef, GenomeAttribute, Registry};

pub use runner::{ContainerSpec, ShellStepRunner, StepJob, StepRunner, StepStatus};

/// File whose presence marks an asset output folder as complete.
pub const COMPLETION_MARKER: &str = "build_complete.flag";

#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    /// Build below this folder instead of the registry's genome folder.
    /// Assets built here are registered with absolute paths.
    pub outfolder: Option<PathBuf>,
    /// Recipe inputs by name, e.g. `fasta` -> `/data/hg38.fa.gz`.
    pub inputs: BTreeMap<String, String>,
    /// Run commands in the package's container image.
    pub docker: bool,
    /// Extra host folders mounted in docker mode.
    pub volumes: Vec<PathBuf>,
    /// Ignore existing completion markers.
    pub new_start: bool,
    /// Treat a failing build command as fatal for the request.
    pub fail_fast: bool,
}

#[derive(Debug)]
pub enum AssetState {
    Built,
    Skipped,
    Failed(RefgenError),
}

impl AssetState {
    pub fn label(&self) -> &'static str {
        match self {
            AssetState::Built => "built",
            AssetState::Skipped => "skipped",
            AssetState::Failed(_) => "failed",
        }
    }
}

#[derive(Debug)]
pub struct AssetOutcome {
    pub target: AssetRef,
    pub state: AssetState,
}

/// Per-asset terminal states, in request order.
#[derive(Debug, Default)]
pub struct BuildReport {
    pub outcomes: Vec<AssetOutcome>,
    /// A fatal failure stopped the request; later assets were not attempted.
    pub aborted: bool,
}

impl BuildReport {
    fn count(&self, f: impl Fn(&AssetState) -> bool) -> usize {
        self.outcomes.iter().filter(|o| f(&o.state)).count()
    }

    pub fn built(&self) -> usize {
        self.count(|s| matches!(s, AssetState::Built))
    }

    pub fn skipped(&self) -> usize {
        self.count(|s| matches!(s, AssetState::Skipped))
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, AssetState::Failed(_)))
    }

    pub fn is_success(&self) -> bool {
        !self.aborted && self.failed() == 0
    }

    fn record(&mut self, target: &AssetRef, state: AssetState) {
        match &state {
            AssetState::Failed(err) => warn!(asset = %target, error = %err, "asset failed"),
            other => info!(asset = %target, state = other.label(), "asset finished"),
        }
        self.outcomes.push(AssetOutcome {
            target: target.clone(),
            state,
        });
    }
}

/// Resolves requested assets against a catalog and builds them with a
/// step runner.
pub struct BuildOrchestrator<'a> {
    catalog: &'a Catalog,
    runner: &'a dyn StepRunner,
}

/// Folders and values shared by every step of one asset build.
struct AssetPlan<'p> {
    package: &'p BuildPackage,
    genome_dir: PathBuf,
    vars: AssetVars,
}

impl<'a> BuildOrchestrator<'a> {
    pub fn new(catalog: &'a Catalog, runner: &'a dyn StepRunner) -> Self {
        Self { catalog, runner }
    }

    /// Build `targets` in order.
    ///
    /// Returns `Err` only when the request is rejected before any asset is
    /// attempted (missing input or dependency, unreadable input, identity
    /// conflict, unwritable output folder). Failures after that are
    /// reported per asset in the [`BuildReport`].
    pub fn build(
        &self,
        registry: &mut Registry,
        targets: &[AssetRef],
        options: &BuildOptions,
    ) -> Result<BuildReport> {
        let mut checksums = self.precheck(registry, targets, options)?;

        let root = options
            .outfolder
            .clone()
            .unwrap_or_else(|| registry.genome_folder());
        ensure_writable(&root)?;

        let mut report = BuildReport::default();
        for (index, target) in targets.iter().enumerate() {
            let checksum = checksums.remove(&index);
            let state = match self.build_one(registry, target, &root, options, checksum) {
                Ok(state) => state,
                Err(err) => {
                    let fatal = err.is_fatal()
                        || (options.fail_fast && matches!(err, RefgenError::BuildCommand { .. }));
                    report.record(target, AssetState::Failed(err));
                    if fatal {
                        report.aborted = true;
                        break;
                    }
                    continue;
                }
            };
            report.record(target, state);
        }

        info!(
            built = report.built(),
            skipped = report.skipped(),
            failed = report.failed(),
            "build finished"
        );
        Ok(report)
    }

    /// Reject the request before anything is written. Returns the computed
    /// checksum of every primary-asset target, keyed by its position.
    fn precheck(
        &self,
        registry: &Registry,
        targets: &[AssetRef],
        options: &BuildOptions,
    ) -> Result<BTreeMap<usize, GenomeChecksum>> {
        let mut planned: BTreeSet<AssetRef> = BTreeSet::new();
        let mut identities: BTreeMap<&str, String> = BTreeMap::new();
        let mut checksums = BTreeMap::new();

        for (index, target) in targets.iter().enumerate() {
            let Ok(package) = self.catalog.get_package(&target.asset) else {
                continue;
            };

            for input in &package.required_inputs {
                let value = options
                    .inputs
                    .get(input)
                    .map(|v| v.trim())
                    .filter(|v| !v.is_empty())
                    .ok_or_else(|| RefgenError::MissingInput {
                        input: input.clone(),
                        asset: target.asset.clone(),
                    })?;
                if FILE_INPUTS.contains(&input.as_str()) {
                    ensure_readable(Path::new(value))?;
                }
            }

            for required in &package.required_assets {
                let dependency = AssetRef::with_default_tag(&target.genome, required);
                if !registry.has_asset(&dependency) && !planned.contains(&dependency) {
                    return Err(RefgenError::MissingDependency {
                        required: required.clone(),
                        asset: target.asset.clone(),
                        genome: target.genome.clone(),
                    });
                }
            }

            if package.name == PRIMARY_ASSET {
                let pending = identities.get(target.genome.as_str()).map(String::as_str);
                let computed = identity_check(registry, target, options, pending)?;
                identities.insert(&target.genome, computed.collection.clone());
                checksums.insert(index, computed);
            }

            for output in package.outputs.keys() {
                planned.insert(AssetRef::new(&target.genome, output, &target.tag));
            }
        }
        Ok(checksums)
    }

    fn build_one(
        &self,
        registry: &mut Registry,
        target: &AssetRef,
        root: &Path,
        options: &BuildOptions,
        checksum: Option<GenomeChecksum>,
    ) -> Result<AssetState> {
        let package = self.catalog.get_package(&target.asset)?;
        let plan = self.plan(registry, target, package, root, options)?;

        let job = self.job(&plan, options)?;
        let status = self.runner.run(&job)?;

        self.register(registry, target, &plan, checksum, options)?;
        Ok(match status {
            StepStatus::Built => AssetState::Built,
            StepStatus::Skipped => AssetState::Skipped,
        })
    }

    /// Resolve required assets and assemble template variables. Nothing is
    /// written here.
    fn plan<'p>(
        &self,
        registry: &Registry,
        target: &AssetRef,
        package: &'p BuildPackage,
        root: &Path,
        options: &BuildOptions,
    ) -> Result<AssetPlan<'p>> {
        let genome_dir = root.join(&target.genome);
        let outfolder = genome_dir.join(&target.asset).join(&target.tag);
        let mut vars = AssetVars::new(&target.genome, &target.asset, &target.tag, outfolder);

        for required in &package.required_assets {
            let dependency = AssetRef::with_default_tag(&target.genome, required);
            let path = registry.asset_path(&dependency).map_err(|_| {
                RefgenError::MissingDependency {
                    required: required.clone(),
                    asset: target.asset.clone(),
                    genome: target.genome.clone(),
                }
            })?;
            debug!(dependency = %dependency, path = %path.display(), "dependency resolved");
            vars.assets.insert(required.clone(), path);
        }

        for input in &package.required_inputs {
            if let Some(value) = options.inputs.get(input) {
                vars.inputs.insert(input.clone(), value.clone());
            }
        }

        Ok(AssetPlan {
            package,
            genome_dir,
            vars,
        })
    }

    fn job(&self, plan: &AssetPlan<'_>, options: &BuildOptions) -> Result<StepJob> {
        let commands = plan
            .package
            .commands
            .iter()
            .map(|t| t.expand(&plan.vars))
            .collect::<Result<Vec<_>>>()?;

        let container = match (&plan.package.container_image, options.docker) {
            (Some(image), true) => {
                let mut volumes = vec![plan.genome_dir.clone()];
                for value in plan.vars.inputs.values() {
                    if let Some(parent) = Path::new(value).parent().filter(|p| p.is_dir()) {
                        volumes.push(parent.to_path_buf());
                    }
                }
                volumes.extend(options.volumes.iter().cloned());
                Some(ContainerSpec {
                    image: image.clone(),
                    volumes,
                })
            }
            _ => None,
        };

        let outfolder = &plan.vars.asset_outfolder;
        Ok(StepJob {
            asset: plan.vars.asset.clone(),
            commands,
            workdir: outfolder.clone(),
            completion_marker: outfolder.join(COMPLETION_MARKER),
            new_start: options.new_start,
            container,
        })
    }

    fn register(
        &self,
        registry: &mut Registry,
        target: &AssetRef,
        plan: &AssetPlan<'_>,
        checksum: Option<GenomeChecksum>,
        options: &BuildOptions,
    ) -> Result<()> {
        let outfolder = &plan.vars.asset_outfolder;

        if let Some(checksum) = &checksum {
            checksum
                .contents
                .write_tsv(&content_table_path(outfolder, &target.genome))?;
        }

        let digest = match hash_tree(outfolder) {
            Ok(digest) => Some(digest),
            Err(err) => {
                warn!(asset = %target, error = %err, "could not digest asset folder");
                None
            }
        };

        if let Some(checksum) = checksum {
            registry.set_genome_attribute(
                &target.genome,
                GenomeAttribute::Checksum(checksum.collection),
            )?;
        }

        for (name, output) in &plan.package.outputs {
            let relative = output.path.expand(&plan.vars)?;
            let path = if options.outfolder.is_some() {
                plan.genome_dir.join(&relative).to_string_lossy().to_string()
            } else {
                relative
            };
            let record = AssetRecord::new(path, output.description.clone())
                .with_build_parameters(plan.vars.inputs.clone())
                .with_digest(digest.clone())
                .touched();
            registry.upsert_asset(&AssetRef::new(&target.genome, name, &target.tag), record)?;
        }
        Ok(())
    }
}

/// Compare the checksum of the `fasta` input against the one recorded for
/// the genome, or against `pending` when an earlier target of the same
/// request establishes it. Nothing is written on conflict.
fn identity_check(
    registry: &Registry,
    target: &AssetRef,
    options: &BuildOptions,
    pending: Option<&str>,
) -> Result<GenomeChecksum> {
    let source = options
        .inputs
        .get(PRIMARY_ASSET)
        .ok_or_else(|| RefgenError::MissingInput {
            input: PRIMARY_ASSET.to_string(),
            asset: target.asset.clone(),
        })?;
    let computed = compute_genome_checksum(&FastaReader::open(source.trim())?)?;

    if let Some(recorded) = registry.checksum(&target.genome).or(pending)
        && recorded != computed.collection
    {
        return Err(RefgenError::IdentityConflict {
            genome: target.genome.clone(),
            recorded: recorded.to_string(),
            computed: computed.collection,
        });
    }
    Ok(computed)
}
