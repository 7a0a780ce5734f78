//! Structured command and path templates.
//!
//! Templates are parsed once into literal and placeholder segments, so a
//! mistyped placeholder is rejected when the catalog is built rather than
//! when a shell runs the command.
//!
//! | Placeholder         | Value                                   |
//! |---------------------|-----------------------------------------|
//! | `{genome}`          | genome name                             |
//! | `{asset}`           | asset being built                       |
//! | `{tag}`             | tag being built                         |
//! | `{asset_outfolder}` | absolute output folder of the build     |
//! | `{assets.NAME}`     | absolute path of required asset `NAME`  |
//! | `{NAME}`            | user-supplied recipe input `NAME`       |
//!
//! `{{` and `}}` produce literal braces.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use crate::error::{RefgenError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placeholder {
    Genome,
    Asset,
    Tag,
    AssetOutfolder,
    RequiredAsset(String),
    Input(String),
}

impl Placeholder {
    fn parse(name: &str) -> Option<Self> {
        let valid = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
        match name {
            "genome" => Some(Self::Genome),
            "asset" => Some(Self::Asset),
            "tag" => Some(Self::Tag),
            "asset_outfolder" => Some(Self::AssetOutfolder),
            _ => match name.strip_prefix("assets.") {
                Some(asset) if valid(asset) => Some(Self::RequiredAsset(asset.to_string())),
                Some(_) => None,
                None if valid(name) => Some(Self::Input(name.to_string())),
                None => None,
            },
        }
    }
}

impl fmt::Display for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Placeholder::Genome => f.write_str("{genome}"),
            Placeholder::Asset => f.write_str("{asset}"),
            Placeholder::Tag => f.write_str("{tag}"),
            Placeholder::AssetOutfolder => f.write_str("{asset_outfolder}"),
            Placeholder::RequiredAsset(name) => write!(f, "{{assets.{}}}", name),
            Placeholder::Input(name) => write!(f, "{{{}}}", name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Placeholder(Placeholder),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    segments: Vec<Segment>,
}

impl Template {
    pub fn parse(source: &str) -> Result<Self> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = source.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    literal.push('{');
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    literal.push('}');
                }
                '}' => return Err(RefgenError::template(source, "unmatched '}'")),
                '{' => {
                    let mut name = String::new();
                    loop {
                        match chars.next() {
                            Some('}') => break,
                            Some('{') | None => {
                                return Err(RefgenError::template(source, "unclosed '{'"));
                            }
                            Some(ch) => name.push(ch),
                        }
                    }
                    let placeholder = Placeholder::parse(name.trim()).ok_or_else(|| {
                        RefgenError::template(source, format!("invalid placeholder '{{{}}}'", name))
                    })?;
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Placeholder(placeholder));
                }
                _ => literal.push(c),
            }
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self {
            source: source.to_string(),
            segments,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn placeholders(&self) -> impl Iterator<Item = &Placeholder> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Placeholder(p) => Some(p),
            Segment::Literal(_) => None,
        })
    }

    /// Substitute every placeholder, failing on the first missing value.
    pub fn expand(&self, vars: &AssetVars) -> Result<String> {
        let mut out = String::with_capacity(self.source.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Placeholder(p) => {
                    let value = vars.resolve(p).ok_or_else(|| {
                        RefgenError::template(&self.source, format!("no value for {}", p))
                    })?;
                    out.push_str(&value);
                }
            }
        }
        Ok(out)
    }
}

/// Values available to templates while building one asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetVars {
    pub genome: String,
    pub asset: String,
    pub tag: String,
    pub asset_outfolder: PathBuf,
    pub inputs: BTreeMap<String, String>,
    pub assets: BTreeMap<String, PathBuf>,
}

impl AssetVars {
    pub fn new(
        genome: impl Into<String>,
        asset: impl Into<String>,
        tag: impl Into<String>,
        asset_outfolder: impl Into<PathBuf>,
    ) -> Self {
        Self {
            genome: genome.into(),
            asset: asset.into(),
            tag: tag.into(),
            asset_outfolder: asset_outfolder.into(),
            inputs: BTreeMap::new(),
            assets: BTreeMap::new(),
        }
    }

    fn resolve(&self, placeholder: &Placeholder) -> Option<String> {
        match placeholder {
            Placeholder::Genome => Some(self.genome.clone()),
            Placeholder::Asset => Some(self.asset.clone()),
            Placeholder::Tag => Some(self.tag.clone()),
            Placeholder::AssetOutfolder => {
                Some(self.asset_outfolder.to_string_lossy().to_string())
            }
            Placeholder::RequiredAsset(name) => self
                .assets
                .get(name)
                .map(|p| p.to_string_lossy().to_string()),
            Placeholder::Input(name) => self.inputs.get(name).filter(|v| !v.is_empty()).cloned(),
        }
    }
}
