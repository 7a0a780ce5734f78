//! Error types for refgen.
//!
//! Library code returns [`RefgenError`] via `thiserror`. The CLI wraps it
//! with `anyhow` at the process boundary.

use std::fmt;
use std::path::PathBuf;

/// Access right checked before touching the filesystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Read,
    Write,
    Execute,
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Access::Read => "read",
            Access::Write => "write",
            Access::Execute => "execute",
        };
        f.write_str(label)
    }
}

/// Top-level error type for all refgen operations.
#[derive(Debug, thiserror::Error)]
pub enum RefgenError {
    #[error("malformed registry path '{input}': {reason}")]
    MalformedPath { input: String, reason: String },

    #[error("recipe does not exist for asset '{asset}'")]
    UnknownRecipe { asset: String },

    #[error("argument '{input}' is required to build asset '{asset}', but not provided")]
    MissingInput { input: String, asset: String },

    #[error("asset '{required}' is required to build asset '{asset}' for genome '{genome}', but not found")]
    MissingDependency {
        required: String,
        asset: String,
        genome: String,
    },

    #[error(
        "checksum mismatch for genome '{genome}': recorded {recorded}, computed {computed}"
    )]
    IdentityConflict {
        genome: String,
        recorded: String,
        computed: String,
    },

    #[error("build of '{asset}' failed running `{command}`: {detail}")]
    BuildCommand {
        asset: String,
        command: String,
        detail: String,
    },

    #[error("failed to persist {path:?}: {reason}")]
    Persistence { path: PathBuf, reason: String },

    #[error("asset '{asset}:{tag}' does not exist for genome '{genome}'")]
    MissingAsset {
        genome: String,
        asset: String,
        tag: String,
    },

    #[error("genome '{genome}' does not exist")]
    MissingGenome { genome: String },

    #[error("invalid genome config {path:?}: {reason}")]
    InvalidConfig { path: PathBuf, reason: String },

    #[error("insufficient permissions: {access} access required for {path:?}")]
    Permission { path: PathBuf, access: Access },

    #[error("template '{template}': {reason}")]
    Template { template: String, reason: String },

    #[error("invalid locus '{locus}': {reason}")]
    InvalidLocus { locus: String, reason: String },

    #[error("invalid FASTA {path:?}: {reason}")]
    InvalidFasta { path: PathBuf, reason: String },

    #[error(
        "no genome config found; pass --genome-config or set ${}",
        crate::context::CONFIG_ENV_VAR
    )]
    MissingGenomeConfig,

    #[error("folder does not exist: {path:?}")]
    MissingFolder { path: PathBuf },

    #[error("path does not exist: {path:?}")]
    MissingPath { path: PathBuf },

    #[error("only one asset can be added at a time, got {count}")]
    TooManyAssets { count: usize },

    #[error("remote error: {0}")]
    Remote(String),

    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, RefgenError>;

impl RefgenError {
    pub fn malformed_path(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedPath {
            input: input.into(),
            reason: reason.into(),
        }
    }

    pub fn template(template: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Template {
            template: template.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_config(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn persistence(path: impl Into<PathBuf>, reason: impl fmt::Display) -> Self {
        Self::Persistence {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error aborts the rest of a multi-asset request.
    ///
    /// Unknown recipes and failing build commands only fail the asset they
    /// belong to; everything else stops the command.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            RefgenError::UnknownRecipe { .. } | RefgenError::BuildCommand { .. }
        )
    }
}
