//! Adapters for classifier output tables.
//!
//! Every supported classifier writes one delimited row per read. A
//! [`ClassifierFormat`] names the columns holding the read name and the taxon
//! id, so adding a classifier is a configuration change rather than new code.

use std::collections::{HashMap, HashSet};
use std::io::BufRead;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::core::lineage::{Lineage, TaxonId};
use crate::parsing::reads::open_text;
use crate::taxonomy::resolver::LineageResolver;
use crate::utils::validation::{normalize_read_name, parse_taxon_id};

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    #[error("noodles error: {0}")]
    Noodles(String),
}

fn default_delimiter() -> char {
    '\t'
}

/// Column layout of one classifier's output table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifierFormat {
    /// Name used in manifests, e.g. `kraken`
    pub name: String,

    /// Zero-based column of the read name
    pub read_column: usize,

    /// Zero-based column of the taxon id
    pub taxid_column: usize,

    /// Column consulted when the primary taxon id does not parse (CLARK-S)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_taxid_column: Option<usize>,

    /// First line is a header
    #[serde(default)]
    pub has_header: bool,

    #[serde(default = "default_delimiter")]
    pub delimiter: char,

    /// Only every other data row is read (tools that write two lines per read)
    #[serde(default)]
    pub alternate_lines: bool,
}

impl ClassifierFormat {
    /// Extract `(read, taxon)` from one row.
    ///
    /// Returns `None` when neither taxon id column parses or the read name is missing.
    fn assignment(&self, line: &str) -> Option<(String, TaxonId)> {
        let fields: Vec<&str> = line.split(self.delimiter).collect();

        let taxon = fields
            .get(self.taxid_column)
            .and_then(|f| parse_taxon_id(f))
            .or_else(|| {
                self.fallback_taxid_column
                    .and_then(|col| fields.get(col))
                    .and_then(|f| parse_taxon_id(f))
            })?;

        let read = normalize_read_name(fields.get(self.read_column)?);
        if read.is_empty() {
            return None;
        }

        Some((read, taxon))
    }
}

/// Known classifier formats, looked up by name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassifierRegistry {
    formats: Vec<ClassifierFormat>,
}

impl ClassifierRegistry {
    #[must_use]
    pub fn new(formats: Vec<ClassifierFormat>) -> Self {
        let mut registry = Self::default();
        for format in formats {
            registry.insert(format);
        }
        registry
    }

    /// Add a format, replacing any existing format with the same name
    pub fn insert(&mut self, format: ClassifierFormat) {
        match self.formats.iter_mut().find(|f| f.name == format.name) {
            Some(existing) => *existing = format,
            None => self.formats.push(format),
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ClassifierFormat> {
        self.formats.iter().find(|f| f.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ClassifierFormat> {
        self.formats.iter()
    }

    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.formats.iter().map(|f| f.name.as_str()).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.formats.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.formats.is_empty()
    }
}

/// Read `(read, taxon)` assignments from classifier output.
///
/// Rows without a parseable taxon id are skipped. Rows that are not valid
/// UTF-8 are decoded lossily, so only the affected read loses its call. A
/// read listed twice keeps its last assignment.
///
/// # Errors
///
/// Returns `ParseError::Io` if the reader fails.
pub fn parse_assignments<R: BufRead>(
    mut reader: R,
    format: &ClassifierFormat,
) -> Result<Vec<(String, TaxonId)>, ParseError> {
    let mut assignments = Vec::new();
    let mut skipped = 0usize;
    let mut buf = Vec::new();

    if format.has_header {
        reader.read_until(b'\n', &mut buf)?;
    }

    let mut row = 0usize;
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        let second_line = format.alternate_lines && row % 2 == 1;
        row += 1;
        if second_line {
            continue;
        }

        let line = String::from_utf8_lossy(&buf);
        let line = line.trim_end_matches(['\r', '\n']);
        match format.assignment(line) {
            Some(assignment) => assignments.push(assignment),
            None => skipped += 1,
        }
    }

    if skipped > 0 {
        debug!(
            classifier = %format.name,
            skipped,
            "Skipped rows without a usable taxon id"
        );
    }

    Ok(assignments)
}

/// Map each read to its lineage, resolving every distinct taxon id once.
///
/// Taxon id `0` means the classifier left the read unclassified and maps to
/// [`Lineage::na`].
pub fn assign_lineages<L: LineageResolver>(
    assignments: Vec<(String, TaxonId)>,
    resolver: &L,
) -> HashMap<String, Lineage> {
    let unique: HashSet<TaxonId> = assignments
        .iter()
        .map(|(_, taxon)| *taxon)
        .filter(|taxon| !taxon.is_unknown())
        .collect();
    let resolved = resolver.resolve_all(unique);

    assignments
        .into_iter()
        .map(|(read, taxon)| {
            let lineage = resolved.get(&taxon).cloned().unwrap_or_else(Lineage::na);
            (read, lineage)
        })
        .collect()
}

/// Parse classifier output from a reader into per-read lineages
///
/// # Errors
///
/// Returns `ParseError::Io` if the reader fails.
pub fn read_classifier_output<R: BufRead, L: LineageResolver>(
    reader: R,
    format: &ClassifierFormat,
    resolver: &L,
) -> Result<HashMap<String, Lineage>, ParseError> {
    let assignments = parse_assignments(reader, format)?;
    Ok(assign_lineages(assignments, resolver))
}

/// Parse a classifier output file (plain or gzip) into per-read lineages
///
/// # Errors
///
/// Returns `ParseError::Io` if the file is missing or unreadable.
pub fn load_classifier_output<L: LineageResolver>(
    path: &Path,
    format: &ClassifierFormat,
    resolver: &L,
) -> Result<HashMap<String, Lineage>, ParseError> {
    let reader = open_text(path)?;
    let lineages = read_classifier_output(reader, format, resolver)?;
    debug!(
        classifier = %format.name,
        path = %path.display(),
        reads = lineages.len(),
        "Loaded classifier output"
    );
    Ok(lineages)
}
