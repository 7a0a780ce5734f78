//! Remote asset catalog.
//!
//! Logical operations only: list genomes and their assets, download one
//! asset archive. [`HttpRemoteCatalog`] talks JSON to a refgen server.

pub mod archive;

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use url::Url;

use crate::error::{RefgenError, Result};
use crate::registry::AssetRef;

pub use archive::extract_archive;

/// `(asset, tag)` pairs per genome, as advertised by a server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RemoteListing {
    pub genomes: BTreeMap<String, Vec<(String, String)>>,
}

/// Body of `GET /genome/{genome}`.
#[derive(Debug, Clone, Default, Deserialize)]
struct GenomeSummary {
    #[serde(default)]
    assets: BTreeMap<String, Vec<String>>,
}

pub trait RemoteCatalog {
    fn list_remote(&self, genome: Option<&str>) -> Result<RemoteListing>;

    /// Fetch the archive of `target` to `archive`, returning its path.
    fn download(&self, target: &AssetRef, archive: &Path) -> Result<PathBuf>;
}

/// Archive file that sits next to an asset folder: `<dir>.zip`.
pub fn archive_path(asset_dir: &Path) -> PathBuf {
    let mut name = OsString::from(asset_dir.as_os_str());
    name.push(".zip");
    PathBuf::from(name)
}

#[derive(Debug, Clone)]
pub struct HttpRemoteCatalog {
    server: Url,
}

impl HttpRemoteCatalog {
    pub fn new(server: &str) -> Result<Self> {
        let mut server = Url::parse(server)
            .map_err(|e| RefgenError::Remote(format!("invalid server URL '{}': {}", server, e)))?;
        if !server.path().ends_with('/') {
            let path = format!("{}/", server.path());
            server.set_path(&path);
        }
        Ok(Self { server })
    }

    pub fn server(&self) -> &Url {
        &self.server
    }

    pub fn genomes_url(&self) -> Result<Url> {
        self.endpoint("genomes")
    }

    pub fn genome_url(&self, genome: &str) -> Result<Url> {
        self.endpoint(&format!("genome/{}", genome))
    }

    pub fn archive_url(&self, target: &AssetRef) -> Result<Url> {
        let mut url = self.endpoint(&format!("asset/{}/{}/archive", target.genome, target.asset))?;
        url.query_pairs_mut().append_pair("tag", &target.tag);
        Ok(url)
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.server
            .join(path)
            .map_err(|e| RefgenError::Remote(format!("invalid endpoint '{}': {}", path, e)))
    }

    fn block_on<T>(&self, fut: impl Future<Output = anyhow::Result<T>>) -> Result<T> {
        let runtime = tokio::runtime::Runtime::new()
            .map_err(|e| RefgenError::Remote(format!("failed to create tokio runtime: {}", e)))?;
        runtime
            .block_on(fut)
            .map_err(|e| RefgenError::Remote(format!("{:#}", e)))
    }
}

impl RemoteCatalog for HttpRemoteCatalog {
    fn list_remote(&self, genome: Option<&str>) -> Result<RemoteListing> {
        let genomes = match genome {
            Some(name) => vec![name.to_string()],
            None => {
                let url = self.genomes_url()?;
                self.block_on(fetch_json::<Vec<String>>(url))?
            }
        };

        let mut listing = RemoteListing::default();
        for name in genomes {
            let summary: GenomeSummary = self.block_on(fetch_json(self.genome_url(&name)?))?;
            let pairs = summary
                .assets
                .into_iter()
                .flat_map(|(asset, tags)| tags.into_iter().map(move |tag| (asset.clone(), tag)))
                .collect();
            listing.genomes.insert(name, pairs);
        }
        debug!(server = %self.server, genomes = listing.genomes.len(), "listed remote assets");
        Ok(listing)
    }

    fn download(&self, target: &AssetRef, archive: &Path) -> Result<PathBuf> {
        let url = self.archive_url(target)?;
        info!(asset = %target, url = %url, "downloading asset archive");
        let bytes = self.block_on(fetch_bytes(url))?;

        if let Some(parent) = archive.parent() {
            std::fs::create_dir_all(parent).map_err(|e| RefgenError::io(parent, e))?;
        }
        std::fs::write(archive, &bytes).map_err(|e| RefgenError::io(archive, e))?;
        Ok(archive.to_path_buf())
    }
}

fn client() -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(concat!("refgen/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to build HTTP client")
}

async fn get(url: Url) -> anyhow::Result<reqwest::Response> {
    let response = client()?
        .get(url.clone())
        .send()
        .await
        .with_context(|| format!("Failed to reach {}", url))?;
    if !response.status().is_success() {
        anyhow::bail!("HTTP {} from {}", response.status(), url);
    }
    Ok(response)
}

async fn fetch_json<T: serde::de::DeserializeOwned>(url: Url) -> anyhow::Result<T> {
    get(url.clone())
        .await?
        .json()
        .await
        .with_context(|| format!("Failed to parse response from {}", url))
}

async fn fetch_bytes(url: Url) -> anyhow::Result<Vec<u8>> {
    let bytes = get(url.clone())
        .await?
        .bytes()
        .await
        .with_context(|| format!("Failed to read response body from {}", url))?;
    Ok(bytes.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_keep_server_prefix() {
        let remote = HttpRemoteCatalog::new("http://refgenomes.databio.org/api").unwrap();
        assert_eq!(
            remote.genomes_url().unwrap().as_str(),
            "http://refgenomes.databio.org/api/genomes"
        );
        assert_eq!(
            remote.genome_url("hg38").unwrap().as_str(),
            "http://refgenomes.databio.org/api/genome/hg38"
        );
    }

    #[test]
    fn archive_url_carries_tag() {
        let remote = HttpRemoteCatalog::new("http://localhost:8000/").unwrap();
        let target = AssetRef::new("hg38", "bowtie2_index", "2.3.5");
        assert_eq!(
            remote.archive_url(&target).unwrap().as_str(),
            "http://localhost:8000/asset/hg38/bowtie2_index/archive?tag=2.3.5"
        );
    }

    #[test]
    fn invalid_server_is_rejected() {
        assert!(matches!(
            HttpRemoteCatalog::new("not a url"),
            Err(RefgenError::Remote(_))
        ));
    }

    #[test]
    fn archive_sits_next_to_folder() {
        assert_eq!(
            archive_path(Path::new("/g/hg38/fasta/1.0.0")),
            PathBuf::from("/g/hg38/fasta/1.0.0.zip")
        );
    }

    #[test]
    fn genome_summary_tolerates_missing_assets() {
        let summary: GenomeSummary = serde_json::from_str("{}").unwrap();
        assert!(summary.assets.is_empty());
        let summary: GenomeSummary =
            serde_json::from_str(r#"{"assets": {"fasta": ["default", "v2"]}}"#).unwrap();
        assert_eq!(summary.assets["fasta"], vec!["default", "v2"]);
    }
}
