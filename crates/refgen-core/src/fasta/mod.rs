//! Sequence file access.
//!
//! [`FastaReader`] streams records from a plain-text FASTA file in file
//! order; [`SequenceReader::fetch`] slices one contig by [`Locus`].

pub mod locus;

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use crate::error::{RefgenError, Result};

pub use locus::Locus;

/// One named sequence, exactly as it appears in the file minus line breaks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FastaRecord {
    pub name: String,
    pub sequence: String,
}

/// One meaningful line of a FASTA stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FastaLine {
    /// Record name: header text up to the first whitespace.
    Header(String),
    /// Trimmed sequence text belonging to the last header.
    Bases(String),
}

/// Random-access-by-name view over a collection of sequences.
pub trait SequenceReader {
    /// Records in file order.
    fn records(&self) -> Result<Box<dyn Iterator<Item = Result<FastaRecord>> + '_>>;

    /// Origin shown in error messages.
    fn origin(&self) -> &Path;

    /// Feed headers and base lines to `visit` in file order without
    /// holding a whole contig in memory.
    fn visit_lines(&self, visit: &mut dyn FnMut(FastaLine) -> Result<()>) -> Result<()> {
        for record in self.records()? {
            let record = record?;
            visit(FastaLine::Header(record.name))?;
            visit(FastaLine::Bases(record.sequence))?;
        }
        Ok(())
    }

    /// Subsequence of one contig; see [`Locus`] for the coordinate
    /// convention.
    fn fetch(&self, locus: &Locus) -> Result<String> {
        for record in self.records()? {
            let record = record?;
            if record.name != locus.contig {
                continue;
            }
            let bounds = locus.bounds(record.sequence.len())?;
            return record
                .sequence
                .get(bounds)
                .map(str::to_string)
                .ok_or_else(|| RefgenError::InvalidFasta {
                    path: self.origin().to_path_buf(),
                    reason: format!("sequence of '{}' is not ASCII", record.name),
                });
        }
        Err(RefgenError::InvalidLocus {
            locus: locus.to_string(),
            reason: format!("contig '{}' not found in {}", locus.contig, self.origin().display()),
        })
    }
}

/// Plain FASTA file on disk.
#[derive(Debug, Clone)]
pub struct FastaReader {
    path: PathBuf,
}

impl FastaReader {
    /// Open `path`, failing early if it cannot be read.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        File::open(&path).map_err(|e| RefgenError::io(&path, e))?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SequenceReader for FastaReader {
    fn records(&self) -> Result<Box<dyn Iterator<Item = Result<FastaRecord>> + '_>> {
        let file = File::open(&self.path).map_err(|e| RefgenError::io(&self.path, e))?;
        Ok(Box::new(FastaRecords::new(
            BufReader::new(file),
            self.path.clone(),
        )))
    }

    fn origin(&self) -> &Path {
        &self.path
    }

    fn visit_lines(&self, visit: &mut dyn FnMut(FastaLine) -> Result<()>) -> Result<()> {
        let file = File::open(&self.path).map_err(|e| RefgenError::io(&self.path, e))?;
        let mut lines = FastaRecords::new(BufReader::new(file), self.path.clone());
        while let Some(line) = lines.next_line() {
            visit(line?)?;
        }
        Ok(())
    }
}

/// Streaming record parser over any buffered source.
pub struct FastaRecords<R> {
    reader: R,
    origin: PathBuf,
    pending: Option<String>,
    seen: HashSet<String>,
    line: String,
    started: bool,
    done: bool,
}

impl<R: BufRead> FastaRecords<R> {
    pub fn new(reader: R, origin: PathBuf) -> Self {
        Self {
            reader,
            origin,
            pending: None,
            seen: HashSet::new(),
            line: String::new(),
            started: false,
            done: false,
        }
    }

    fn invalid(&mut self, reason: String) -> RefgenError {
        self.done = true;
        RefgenError::InvalidFasta {
            path: self.origin.clone(),
            reason,
        }
    }

    /// Next header or non-empty sequence line.
    pub fn next_line(&mut self) -> Option<Result<FastaLine>> {
        while !self.done {
            self.line.clear();
            match self.reader.read_line(&mut self.line) {
                Ok(0) => self.done = true,
                Ok(_) => {
                    let text = self.line.trim();
                    if text.is_empty() {
                        continue;
                    }
                    if let Some(header) = text.strip_prefix('>') {
                        let header = header.to_string();
                        return Some(self.start_record(&header).map(FastaLine::Header));
                    }
                    if !self.started {
                        return Some(Err(
                            self.invalid("sequence data before the first header".to_string())
                        ));
                    }
                    return Some(Ok(FastaLine::Bases(text.to_string())));
                }
                Err(e) => {
                    self.done = true;
                    return Some(Err(RefgenError::io(&self.origin, e)));
                }
            }
        }
        None
    }

    fn start_record(&mut self, header: &str) -> Result<String> {
        let name = header
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .to_string();
        if name.is_empty() {
            return Err(self.invalid("record header without a name".to_string()));
        }
        if !self.seen.insert(name.clone()) {
            return Err(self.invalid(format!("duplicate sequence name '{}'", name)));
        }
        self.started = true;
        Ok(name)
    }
}

impl<R: BufRead> Iterator for FastaRecords<R> {
    type Item = Result<FastaRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        let name = match self.pending.take() {
            Some(name) => name,
            None => match self.next_line()? {
                Ok(FastaLine::Header(name)) => name,
                Ok(FastaLine::Bases(_)) => {
                    return Some(Err(self.invalid("sequence without a header".to_string())));
                }
                Err(e) => return Some(Err(e)),
            },
        };

        let mut sequence = String::new();
        while let Some(line) = self.next_line() {
            match line {
                Ok(FastaLine::Header(next)) => {
                    self.pending = Some(next);
                    break;
                }
                Ok(FastaLine::Bases(bases)) => sequence.push_str(&bases),
                Err(e) => return Some(Err(e)),
            }
        }
        Some(Ok(FastaRecord { name, sequence }))
    }
}
