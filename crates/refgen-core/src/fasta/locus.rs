//! Locus parsing for sequence retrieval.
//!
//! Coordinates are 0-based and end-exclusive: `chr1:0-4` is the first four
//! bases of `chr1`.

use std::fmt;
use std::ops::Range;

use crate::error::{RefgenError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locus {
    pub contig: String,
    pub range: Option<Range<u64>>,
}

impl Locus {
    /// Parse `contig` or `contig:start-end`. Thousands separators are
    /// accepted in coordinates.
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        if input.is_empty() {
            return Err(invalid(input, "locus is empty"));
        }

        // Contig names may themselves contain ':', so only a trailing
        // `start-end` group is treated as coordinates.
        let Some((contig, coords)) = input.rsplit_once(':') else {
            return Ok(Self {
                contig: input.to_string(),
                range: None,
            });
        };
        let Some((start, end)) = coords.split_once('-') else {
            return Ok(Self {
                contig: input.to_string(),
                range: None,
            });
        };
        if contig.is_empty() {
            return Err(invalid(input, "contig name is empty"));
        }

        let start = parse_coordinate(input, start)?;
        let end = parse_coordinate(input, end)?;
        if start > end {
            return Err(invalid(input, "start is greater than end"));
        }

        Ok(Self {
            contig: contig.to_string(),
            range: Some(start..end),
        })
    }

    /// Clamp the range against a contig of `len` bases.
    pub fn bounds(&self, len: usize) -> Result<Range<usize>> {
        let Some(range) = &self.range else {
            return Ok(0..len);
        };
        let start = usize::try_from(range.start).unwrap_or(usize::MAX);
        if start > len {
            return Err(invalid(
                &self.to_string(),
                &format!("start is beyond the end of '{}' ({} bases)", self.contig, len),
            ));
        }
        let end = usize::try_from(range.end).unwrap_or(usize::MAX).min(len);
        Ok(start..end)
    }
}

impl fmt::Display for Locus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.range {
            Some(range) => write!(f, "{}:{}-{}", self.contig, range.start, range.end),
            None => f.write_str(&self.contig),
        }
    }
}

fn parse_coordinate(locus: &str, raw: &str) -> Result<u64> {
    raw.trim()
        .replace(',', "")
        .parse::<u64>()
        .map_err(|_| invalid(locus, &format!("'{}' is not a coordinate", raw)))
}

fn invalid(locus: &str, reason: &str) -> RefgenError {
    RefgenError::InvalidLocus {
        locus: locus.to_string(),
        reason: reason.to_string(),
    }
}
