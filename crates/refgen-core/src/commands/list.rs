//! Local listing of genomes, assets and recipes.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::Result;
use crate::recipe::Catalog;
use crate::registry::Registry;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LocalListing {
    /// `(asset, tag)` pairs per genome.
    pub genomes: BTreeMap<String, Vec<(String, String)>>,
    pub recipes: Vec<String>,
}

/// Read-only view of the registry, optionally limited to one genome.
pub fn list_local(registry: &Registry, catalog: &Catalog, genome: Option<&str>) -> Result<LocalListing> {
    Ok(LocalListing {
        genomes: registry.assets_by_genome(genome)?,
        recipes: catalog.names().map(str::to_string).collect(),
    })
}
