//! Registry path parsing.
//!
//! A registry path names an asset compactly: `namespace/item:tag`, where
//! the namespace is a genome and the tag is optional.

use std::fmt;
use std::str::FromStr;

use crate::error::{RefgenError, Result};

/// Tag substituted when a path omits one.
pub const DEFAULT_TAG: &str = "default";

/// Parsed `namespace/item:tag` identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RegistryPath {
    pub namespace: Option<String>,
    pub item: String,
    pub tag: String,
}

impl RegistryPath {
    /// Parse `namespace/item:tag`, `item:tag`, `namespace/item` or `item`.
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(RefgenError::malformed_path(input, "path is empty"));
        }
        if trimmed.matches('/').count() > 1 {
            return Err(RefgenError::malformed_path(input, "more than one '/'"));
        }
        if trimmed.matches(':').count() > 1 {
            return Err(RefgenError::malformed_path(input, "more than one ':'"));
        }

        let (namespace, rest) = match trimmed.split_once('/') {
            Some((ns, rest)) => {
                if ns.is_empty() {
                    return Err(RefgenError::malformed_path(input, "namespace is empty"));
                }
                (Some(ns.to_string()), rest)
            }
            None => (None, trimmed),
        };

        let (item, tag) = match rest.split_once(':') {
            Some((item, tag)) => {
                if tag.is_empty() {
                    return Err(RefgenError::malformed_path(input, "tag is empty"));
                }
                (item, tag.to_string())
            }
            None => (rest, DEFAULT_TAG.to_string()),
        };

        if item.is_empty() {
            return Err(RefgenError::malformed_path(input, "item is empty"));
        }

        Ok(Self {
            namespace,
            item: item.to_string(),
            tag,
        })
    }

    /// Resolve into a fully qualified [`AssetRef`], taking the genome from
    /// the path or from `fallback_genome` (the legacy `--genome` flag).
    pub fn resolve(&self, fallback_genome: Option<&str>) -> Result<AssetRef> {
        let genome = self
            .namespace
            .as_deref()
            .or(fallback_genome)
            .filter(|g| !g.is_empty())
            .ok_or_else(|| RefgenError::malformed_path(self.to_string(), "no genome given"))?;
        Ok(AssetRef::new(genome, &self.item, &self.tag))
    }
}

impl FromStr for RegistryPath {
    type Err = RefgenError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for RegistryPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ns) = &self.namespace {
            write!(f, "{}/", ns)?;
        }
        write!(f, "{}:{}", self.item, self.tag)
    }
}

/// Fully qualified asset reference: every field is non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AssetRef {
    pub genome: String,
    pub asset: String,
    pub tag: String,
}

impl AssetRef {
    pub fn new(genome: impl Into<String>, asset: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            genome: genome.into(),
            asset: asset.into(),
            tag: tag.into(),
        }
    }

    pub fn with_default_tag(genome: impl Into<String>, asset: impl Into<String>) -> Self {
        Self::new(genome, asset, DEFAULT_TAG)
    }
}

impl fmt::Display for AssetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}:{}", self.genome, self.asset, self.tag)
    }
}

/// Normalize the two argument styles into asset references.
///
/// Either a single `registry_path` is given, or the legacy pair of a
/// `genome` plus one or more `assets` (each of which may carry a `:tag`).
pub fn normalize_targets(
    registry_path: Option<&str>,
    genome: Option<&str>,
    assets: &[String],
) -> Result<Vec<AssetRef>> {
    if let Some(raw) = registry_path {
        let parsed = RegistryPath::parse(raw)?;
        return Ok(vec![parsed.resolve(genome)?]);
    }

    let genome = genome
        .filter(|g| !g.is_empty())
        .ok_or_else(|| RefgenError::malformed_path("", "provide a genome or a registry path"))?;
    if assets.is_empty() {
        return Err(RefgenError::malformed_path(
            genome,
            "provide an asset or a registry path",
        ));
    }
    assets
        .iter()
        .map(|raw| {
            let parsed = RegistryPath::parse(raw)?;
            if parsed.namespace.is_some() {
                return Err(RefgenError::malformed_path(
                    raw.as_str(),
                    "asset flag must not carry a genome",
                ));
            }
            parsed.resolve(Some(genome))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_path() {
        let path = RegistryPath::parse("hg38/bowtie2_index:1.0.0").unwrap();
        assert_eq!(path.namespace.as_deref(), Some("hg38"));
        assert_eq!(path.item, "bowtie2_index");
        assert_eq!(path.tag, "1.0.0");
    }

    #[test]
    fn missing_tag_uses_default() {
        let path = RegistryPath::parse("hg38/fasta").unwrap();
        assert_eq!(path.tag, DEFAULT_TAG);

        let path = RegistryPath::parse("fasta").unwrap();
        assert_eq!(path.namespace, None);
        assert_eq!(path.item, "fasta");
        assert_eq!(path.tag, DEFAULT_TAG);
    }

    #[test]
    fn display_then_parse_is_identity() {
        for raw in ["hg38/fasta:default", "mm10/bwa_index:v2", "gtf:1", "x/y"] {
            let parsed = RegistryPath::parse(raw).unwrap();
            let again = RegistryPath::parse(&parsed.to_string()).unwrap();
            assert_eq!(parsed, again, "round trip failed for {raw}");
        }
    }

    #[test]
    fn rejects_malformed_paths() {
        for raw in ["", "hg38/", "hg38/fasta:", "a/b/c", "a:b:c", "/fasta", "hg38/:tag"] {
            let err = RegistryPath::parse(raw).unwrap_err();
            assert!(
                matches!(err, RefgenError::MalformedPath { .. }),
                "expected malformed path for {raw:?}, got {err}"
            );
        }
    }

    #[test]
    fn resolve_uses_fallback_genome() {
        let path = RegistryPath::parse("fasta:v1").unwrap();
        let asset = path.resolve(Some("hg38")).unwrap();
        assert_eq!(asset, AssetRef::new("hg38", "fasta", "v1"));
        assert!(path.resolve(None).is_err());
    }

    #[test]
    fn normalize_legacy_flags() {
        let assets = vec!["fasta".to_string(), "bwa_index:2".to_string()];
        let targets = normalize_targets(None, Some("hg38"), &assets).unwrap();
        assert_eq!(
            targets,
            vec![
                AssetRef::new("hg38", "fasta", DEFAULT_TAG),
                AssetRef::new("hg38", "bwa_index", "2"),
            ]
        );
    }

    #[test]
    fn normalize_registry_path_wins() {
        let targets = normalize_targets(Some("mm10/fasta"), None, &[]).unwrap();
        assert_eq!(targets, vec![AssetRef::with_default_tag("mm10", "fasta")]);
    }

    #[test]
    fn normalize_requires_genome() {
        let err = normalize_targets(None, None, &["fasta".to_string()]).unwrap_err();
        assert!(matches!(err, RefgenError::MalformedPath { .. }));
    }
}
