//! Step runners: execute the expanded commands of one asset build.
//!
//! A runner is handed the ordered command list and a completion marker.
//! The marker is the only record of success: it is written after the last
//! command exits cleanly, and its presence turns the next run of the same
//! job into [`StepStatus::Skipped`].

use std::fs;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use tracing::{debug, info};

use crate::error::{RefgenError, Result};

/// Terminal state of a successful [`StepRunner::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    Built,
    Skipped,
}

/// Container used to isolate the commands of a job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSpec {
    pub image: String,
    /// Host folders mounted at the same path inside the container.
    pub volumes: Vec<PathBuf>,
}

/// Everything a runner needs to build one asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepJob {
    /// Label used in logs and errors.
    pub asset: String,
    pub commands: Vec<String>,
    /// Folder the commands write into; created before the first command.
    pub workdir: PathBuf,
    pub completion_marker: PathBuf,
    /// Remove an existing marker and run anyway.
    pub new_start: bool,
    pub container: Option<ContainerSpec>,
}

/// Executes a [`StepJob`] with at-most-once semantics per marker.
pub trait StepRunner {
    fn run(&self, job: &StepJob) -> Result<StepStatus>;
}

/// Concrete process invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessSpec {
    pub program: String,
    pub args: Vec<String>,
}

/// Runs each command through `sh -c`, optionally inside `docker run`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShellStepRunner;

impl ShellStepRunner {
    pub fn new() -> Self {
        Self
    }

    /// Resolve one shell command into the process to spawn.
    pub fn process_spec(&self, command: &str, job: &StepJob) -> ProcessSpec {
        let Some(container) = &job.container else {
            return ProcessSpec {
                program: "sh".to_string(),
                args: vec!["-c".to_string(), command.to_string()],
            };
        };

        let mut args = vec!["run".to_string(), "--rm".to_string()];
        let mut mounts = vec![job.workdir.clone()];
        for volume in &container.volumes {
            if !mounts.contains(volume) {
                mounts.push(volume.clone());
            }
        }
        for mount in mounts {
            let mount = mount.to_string_lossy();
            args.push("-v".to_string());
            args.push(format!("{}:{}", mount, mount));
        }
        args.push(container.image.clone());
        args.extend(["sh".to_string(), "-c".to_string(), command.to_string()]);

        ProcessSpec {
            program: "docker".to_string(),
            args,
        }
    }

    fn execute(&self, command: &str, job: &StepJob) -> Result<()> {
        let spec = self.process_spec(command, job);
        debug!(asset = %job.asset, program = %spec.program, command, "running build step");

        let output = Command::new(&spec.program)
            .args(&spec.args)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| RefgenError::BuildCommand {
                asset: job.asset.clone(),
                command: command.to_string(),
                detail: format!("failed to spawn {}: {}", spec.program, e),
            })?;

        if !output.stdout.is_empty() {
            debug!(asset = %job.asset, stdout = %String::from_utf8_lossy(&output.stdout).trim_end());
        }
        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let tail: Vec<&str> = stderr.lines().rev().take(5).collect();
        let mut detail = output.status.to_string();
        if !tail.is_empty() {
            let tail: Vec<&str> = tail.into_iter().rev().collect();
            detail = format!("{}: {}", detail, tail.join(" | "));
        }
        Err(RefgenError::BuildCommand {
            asset: job.asset.clone(),
            command: command.to_string(),
            detail,
        })
    }
}

impl StepRunner for ShellStepRunner {
    fn run(&self, job: &StepJob) -> Result<StepStatus> {
        if job.completion_marker.exists() {
            if !job.new_start {
                info!(asset = %job.asset, marker = %job.completion_marker.display(), "completion marker present, skipping");
                return Ok(StepStatus::Skipped);
            }
            fs::remove_file(&job.completion_marker)
                .map_err(|e| RefgenError::io(&job.completion_marker, e))?;
        }

        fs::create_dir_all(&job.workdir).map_err(|e| RefgenError::io(&job.workdir, e))?;
        for command in &job.commands {
            self.execute(command, job)?;
        }

        fs::write(&job.completion_marker, b"")
            .map_err(|e| RefgenError::io(&job.completion_marker, e))?;
        Ok(StepStatus::Built)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn job(temp: &TempDir, commands: &[&str]) -> StepJob {
        let workdir = temp.path().join("hg38").join("fasta").join("default");
        StepJob {
            asset: "fasta".to_string(),
            commands: commands.iter().map(|c| c.to_string()).collect(),
            completion_marker: workdir.join("build_complete.flag"),
            workdir,
            new_start: false,
            container: None,
        }
    }

    #[test]
    fn local_commands_run_through_sh() {
        let temp = TempDir::new().unwrap();
        let spec = ShellStepRunner::new().process_spec("echo hi", &job(&temp, &[]));
        assert_eq!(spec.program, "sh");
        assert_eq!(spec.args, vec!["-c", "echo hi"]);
    }

    #[test]
    fn docker_mode_mounts_workdir_and_volumes() {
        let temp = TempDir::new().unwrap();
        let mut job = job(&temp, &[]);
        job.container = Some(ContainerSpec {
            image: "databio/refgenie".to_string(),
            volumes: vec![PathBuf::from("/data/inputs"), job.workdir.clone()],
        });

        let spec = ShellStepRunner::new().process_spec("samtools faidx x.fa", &job);
        assert_eq!(spec.program, "docker");
        assert_eq!(&spec.args[..2], &["run", "--rm"]);
        let mounts = spec.args.iter().filter(|a| a.as_str() == "-v").count();
        assert_eq!(mounts, 2, "workdir listed twice must be mounted once");
        assert!(spec.args.contains(&"/data/inputs:/data/inputs".to_string()));
        assert_eq!(
            &spec.args[spec.args.len() - 4..],
            &["databio/refgenie", "sh", "-c", "samtools faidx x.fa"]
        );
    }

    #[cfg(unix)]
    #[test]
    fn marker_is_written_only_after_success() {
        let temp = TempDir::new().unwrap();
        let runner = ShellStepRunner::new();

        let failing = job(&temp, &["true", "exit 3", "touch never"]);
        let err = runner.run(&failing).unwrap_err();
        assert!(matches!(err, RefgenError::BuildCommand { ref command, .. } if command == "exit 3"));
        assert!(!failing.completion_marker.exists());

        let ok = job(&temp, &["true"]);
        assert_eq!(runner.run(&ok).unwrap(), StepStatus::Built);
        assert!(ok.completion_marker.exists());
    }

    #[cfg(unix)]
    #[test]
    fn existing_marker_skips_unless_new_start() {
        let temp = TempDir::new().unwrap();
        let runner = ShellStepRunner::new();
        let mut job = job(&temp, &["true"]);
        assert_eq!(runner.run(&job).unwrap(), StepStatus::Built);
        assert_eq!(runner.run(&job).unwrap(), StepStatus::Skipped);

        job.new_start = true;
        assert_eq!(runner.run(&job).unwrap(), StepStatus::Built);
    }

    #[cfg(unix)]
    #[test]
    fn stderr_tail_is_reported() {
        let temp = TempDir::new().unwrap();
        let job = job(&temp, &["echo 'index failed' >&2; exit 1"]);
        let err = ShellStepRunner::new().run(&job).unwrap_err();
        assert!(err.to_string().contains("index failed"));
    }
}
