//! Shared fixtures for refgen-core integration tests.
#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use refgen_core::build::{StepJob, StepRunner, StepStatus};
use refgen_core::registry::{DEFAULT_SERVER, Registry, RegistryDocument, RegistryStore};
use refgen_core::{RefgenError, Result};
use tempfile::TempDir;

/// Fresh registry with its genome folder at `<temp>/genomes`.
pub fn registry(temp: &TempDir) -> Registry {
    let folder = temp.path().join("genomes");
    fs::create_dir_all(&folder).expect("create genome folder");
    let store = RegistryStore::new(temp.path().join("genome_config.toml"));
    store
        .save(&RegistryDocument::new(folder, DEFAULT_SERVER))
        .expect("save registry");
    Registry::open(store).expect("open registry")
}

pub fn config_bytes(registry: &Registry) -> Vec<u8> {
    fs::read(registry.config_path()).expect("read config")
}

pub fn write_file(path: &Path, content: &str) -> PathBuf {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent");
    }
    fs::write(path, content).expect("write file");
    path.to_path_buf()
}

/// In-memory step runner that honors completion markers without spawning
/// processes.
#[derive(Default)]
pub struct ScriptedRunner {
    pub jobs: RefCell<Vec<StepJob>>,
    pub failing: BTreeSet<String>,
}

impl ScriptedRunner {
    pub fn failing(assets: &[&str]) -> Self {
        Self {
            jobs: RefCell::default(),
            failing: assets.iter().map(|a| a.to_string()).collect(),
        }
    }

    pub fn calls(&self) -> usize {
        self.jobs.borrow().len()
    }
}

impl StepRunner for ScriptedRunner {
    fn run(&self, job: &StepJob) -> Result<StepStatus> {
        self.jobs.borrow_mut().push(job.clone());
        if job.completion_marker.exists() && !job.new_start {
            return Ok(StepStatus::Skipped);
        }
        fs::create_dir_all(&job.workdir).map_err(|e| RefgenError::io(&job.workdir, e))?;
        if self.failing.contains(&job.asset) {
            return Err(RefgenError::BuildCommand {
                asset: job.asset.clone(),
                command: job.commands.first().cloned().unwrap_or_default(),
                detail: "exit status: 1".to_string(),
            });
        }
        fs::write(&job.completion_marker, b"").map_err(|e| RefgenError::io(&job.completion_marker, e))?;
        Ok(StepStatus::Built)
    }
}
