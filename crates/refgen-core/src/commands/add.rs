//! Register an existing local path as an asset without building it.

use std::path::Path;

use tracing::{info, warn};

use crate::error::{RefgenError, Result};
use crate::recipe::{AssetVars, Template};
use crate::registry::{AssetRecord, AssetRef, GenomeAttribute, Registry};

#[derive(Debug, Clone, Default)]
pub struct AddOptions {
    /// Path to register, relative to the genome directory or absolute.
    /// May use `{genome}`, `{asset}`, `{tag}` and `{asset_outfolder}`.
    pub path: String,
    pub description: String,
    /// Also set the genome's description.
    pub genome_description: Option<String>,
}

/// Insert a record for exactly one target.
pub fn add(registry: &mut Registry, targets: &[AssetRef], options: &AddOptions) -> Result<AssetRef> {
    let target = match targets {
        [one] => one,
        [] => return Err(RefgenError::malformed_path("", "no asset to add")),
        many => return Err(RefgenError::TooManyAssets { count: many.len() }),
    };

    let genome_dir = registry.genome_dir(&target.genome);
    let vars = AssetVars::new(
        &target.genome,
        &target.asset,
        &target.tag,
        genome_dir.join(&target.asset).join(&target.tag),
    );
    let path = Template::parse(&options.path)?.expand(&vars)?;
    if path.trim().is_empty() {
        return Err(RefgenError::template(&options.path, "path is empty"));
    }

    let absolute = genome_dir.join(Path::new(&path));
    if !absolute.exists() {
        warn!(asset = %target, path = %absolute.display(), "adding a path that does not exist");
    }

    registry.upsert_asset(
        target,
        AssetRecord::new(path, options.description.clone()).touched(),
    )?;
    if let Some(description) = &options.genome_description {
        registry.set_genome_attribute(
            &target.genome,
            GenomeAttribute::Description(description.clone()),
        )?;
    }
    info!(asset = %target, "asset added");
    Ok(target.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{DEFAULT_SERVER, RegistryDocument, RegistryStore};
    use tempfile::TempDir;

    fn registry(temp: &TempDir) -> Registry {
        let store = RegistryStore::new(temp.path().join("genome_config.toml"));
        let doc = RegistryDocument::new(temp.path().to_path_buf(), DEFAULT_SERVER);
        store.save(&doc).unwrap();
        Registry::open(store).unwrap()
    }

    fn options(path: &str) -> AddOptions {
        AddOptions {
            path: path.to_string(),
            description: String::new(),
            genome_description: None,
        }
    }

    #[test]
    fn rejects_more_than_one_asset() {
        let temp = TempDir::new().unwrap();
        let mut registry = registry(&temp);
        let targets = [
            AssetRef::with_default_tag("hg38", "gtf"),
            AssetRef::with_default_tag("hg38", "gff"),
        ];
        let err = add(&mut registry, &targets, &options("x")).unwrap_err();
        assert!(matches!(err, RefgenError::TooManyAssets { count: 2 }));
        assert!(registry.genomes().is_empty());
    }

    #[test]
    fn path_templates_are_expanded() {
        let temp = TempDir::new().unwrap();
        let mut registry = registry(&temp);
        let target = AssetRef::new("hg38", "blacklist", "v2");
        add(&mut registry, &[target.clone()], &options("{asset}/{tag}/{genome}.bed")).unwrap();

        let record = registry.asset_record(&target).unwrap();
        assert_eq!(record.path, "blacklist/v2/hg38.bed");
        assert!(record.updated.is_some());

        registry.reload().unwrap();
        assert!(registry.has_asset(&target));
    }

    #[test]
    fn absolute_paths_are_kept() {
        let temp = TempDir::new().unwrap();
        let mut registry = registry(&temp);
        let file = temp.path().join("custom.bed");
        std::fs::write(&file, "chr1\t0\t10\n").unwrap();

        let target = AssetRef::with_default_tag("hg38", "blacklist");
        add(&mut registry, &[target.clone()], &options(&file.to_string_lossy())).unwrap();
        assert_eq!(registry.asset_path(&target).unwrap(), file);
    }

    #[test]
    fn genome_description_is_recorded() {
        let temp = TempDir::new().unwrap();
        let mut registry = registry(&temp);
        let target = AssetRef::with_default_tag("hg38", "blacklist");
        let options = AddOptions {
            genome_description: Some("Human GRCh38".to_string()),
            ..options("blacklist/default/hg38.bed")
        };
        add(&mut registry, &[target], &options).unwrap();

        registry.reload().unwrap();
        let genome = registry.genome("hg38").unwrap();
        assert_eq!(genome.description.as_deref(), Some("Human GRCh38"));
    }
}
