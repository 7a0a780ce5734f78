//! Recipe catalog: declarative build packages keyed by asset name.

mod builtin;
pub mod template;

use std::collections::BTreeMap;

use crate::error::{RefgenError, Result};

pub use builtin::{FILE_INPUTS, PRIMARY_ASSET, RECIPE_INPUTS};
pub use template::{AssetVars, Placeholder, Template};

/// One asset registered by a package after a successful build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputSpec {
    /// Path relative to the genome directory.
    pub path: Template,
    pub description: String,
}

/// Declarative description of how to produce an asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildPackage {
    pub name: String,
    pub description: String,
    pub required_inputs: Vec<String>,
    pub required_assets: Vec<String>,
    pub commands: Vec<Template>,
    pub outputs: BTreeMap<String, OutputSpec>,
    pub container_image: Option<String>,
}

impl BuildPackage {
    /// Check that every placeholder can be satisfied from the package's
    /// own declaration.
    pub fn validate(&self) -> Result<()> {
        if self.outputs.is_empty() {
            return Err(RefgenError::template(
                &self.name,
                "package declares no outputs",
            ));
        }

        let templates = self
            .commands
            .iter()
            .chain(self.outputs.values().map(|o| &o.path));
        for template in templates {
            for placeholder in template.placeholders() {
                let declared = match placeholder {
                    Placeholder::Input(name) => self.required_inputs.contains(name),
                    Placeholder::RequiredAsset(name) => self.required_assets.contains(name),
                    _ => true,
                };
                if !declared {
                    return Err(RefgenError::template(
                        template.source(),
                        format!(
                            "{} is not declared by package '{}'",
                            placeholder, self.name
                        ),
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Immutable set of build packages.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    packages: BTreeMap<String, BuildPackage>,
}

impl Catalog {
    /// Validate and index `packages` by name.
    pub fn new(packages: impl IntoIterator<Item = BuildPackage>) -> Result<Self> {
        let mut indexed = BTreeMap::new();
        for package in packages {
            package.validate()?;
            indexed.insert(package.name.clone(), package);
        }
        Ok(Self { packages: indexed })
    }

    /// The catalog compiled into this binary.
    pub fn builtin() -> Result<Self> {
        Self::new(builtin::packages()?)
    }

    pub fn get_package(&self, asset: &str) -> Result<&BuildPackage> {
        self.packages
            .get(asset)
            .ok_or_else(|| RefgenError::UnknownRecipe {
                asset: asset.to_string(),
            })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.packages.keys().map(String::as_str)
    }

    /// Package and output spec that register `asset`.
    pub fn output_for(&self, asset: &str) -> Option<(&BuildPackage, &OutputSpec)> {
        self.packages
            .values()
            .find_map(|p| p.outputs.get(asset).map(|o| (p, o)))
    }
}

/// Construct a package from string templates.
pub fn package(
    name: &str,
    description: &str,
    required_inputs: &[&str],
    required_assets: &[&str],
    commands: &[&str],
    outputs: &[(&str, &str, &str)],
    container_image: Option<&str>,
) -> Result<BuildPackage> {
    let commands = commands
        .iter()
        .map(|c| Template::parse(c))
        .collect::<Result<Vec<_>>>()?;
    let outputs = outputs
        .iter()
        .map(|(asset, path, description)| {
            Ok((
                asset.to_string(),
                OutputSpec {
                    path: Template::parse(path)?,
                    description: description.to_string(),
                },
            ))
        })
        .collect::<Result<BTreeMap<_, _>>>()?;

    Ok(BuildPackage {
        name: name.to_string(),
        description: description.to_string(),
        required_inputs: required_inputs.iter().map(|s| s.to_string()).collect(),
        required_assets: required_assets.iter().map(|s| s.to_string()).collect(),
        commands,
        outputs,
        container_image: container_image.map(str::to_string),
    })
}
