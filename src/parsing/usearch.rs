//! Best-hit reduction for raw USEARCH hit tables.
//!
//! USEARCH (like BLAST with `-outfmt 6`) reports every hit of every read as a
//! 12-column row. The consensus vote wants one call per read, so hits are
//! filtered on identity and e-value and the best remaining hit is kept:
//! highest identity first, then lowest e-value.
//!
//! Subjects are reference accessions (`gi|123|ref|NC_000913.3|` or a bare
//! `NC_000913.3`); a local accession → taxon id table maps them to taxa. The
//! reduced table is what the `usearch` classifier format reads.

use std::collections::{HashMap, HashSet};
use std::io::{BufRead, Write};
use std::path::Path;

use serde::Serialize;
use tracing::{debug, warn};

use crate::core::lineage::TaxonId;
use crate::parsing::classifier::ParseError;
use crate::parsing::reads::open_text;
use crate::utils::validation::{normalize_read_name, parse_taxon_id};

/// Columns in a USEARCH/BLAST tabular hit row
const HIT_COLUMNS: usize = 12;
const IDENTITY_COLUMN: usize = 2;
const EVALUE_COLUMN: usize = 10;

pub const DEFAULT_MIN_IDENTITY: f64 = 80.0;
pub const DEFAULT_MAX_EVALUE: f64 = 1e-4;

/// Hits must reach `min_identity` percent and stay at or below `max_evalue`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitFilter {
    pub min_identity: f64,
    pub max_evalue: f64,
}

impl Default for HitFilter {
    fn default() -> Self {
        Self {
            min_identity: DEFAULT_MIN_IDENTITY,
            max_evalue: DEFAULT_MAX_EVALUE,
        }
    }
}

impl HitFilter {
    fn accepts(&self, hit: &BestHit) -> bool {
        hit.identity >= self.min_identity && hit.evalue <= self.max_evalue
    }
}

/// The retained hit for one read
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BestHit {
    pub read: String,
    pub taxon_id: TaxonId,
    pub identity: f64,
    pub evalue: f64,
}

impl BestHit {
    fn beats(&self, other: &BestHit) -> bool {
        self.identity > other.identity
            || (self.identity == other.identity && self.evalue < other.evalue)
    }
}

/// Counts from one reduction
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HitStats {
    /// Well-formed hit rows
    pub hits: usize,
    /// Rows that were not 12 columns or had unparseable numbers
    pub malformed: usize,
    /// Distinct accessions missing from the accession table
    pub unmapped_accessions: usize,
    /// Reads with a best hit
    pub reads: usize,
}

/// Accession of a hit subject, without version.
///
/// Pipe-delimited NCBI identifiers carry the accession in the fourth field;
/// anything else is taken as a bare accession.
///
/// ```
/// use metatax::parsing::usearch::subject_accession;
///
/// assert_eq!(subject_accession("gi|49175990|ref|NC_000913.2|"), "NC_000913");
/// assert_eq!(subject_accession("NC_000913.3"), "NC_000913");
/// ```
#[must_use]
pub fn subject_accession(subject: &str) -> &str {
    let accession = subject.split('|').nth(3).unwrap_or(subject).trim();
    accession.split('.').next().unwrap_or(accession)
}

/// Read an accession → taxon id table.
///
/// Accepts two-column `accession<TAB>taxid` rows and NCBI `accession2taxid`
/// files (`accession`, `accession.version`, `taxid`, `gi`). A first row whose
/// taxon id does not parse is treated as a header. Versions are dropped from
/// accessions.
///
/// # Errors
///
/// Returns `ParseError::Io` if the reader fails, or
/// `ParseError::InvalidFormat` for a row with too few columns or a bad taxon id.
pub fn read_accession_map<R: BufRead>(
    reader: R,
) -> Result<HashMap<String, TaxonId>, ParseError> {
    let mut map = HashMap::new();

    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let fields: Vec<&str> = line.split('\t').map(str::trim).collect();
        let taxid_field = match fields.len() {
            2 => fields[1],
            n if n >= 4 => fields[2],
            _ => {
                return Err(ParseError::InvalidFormat(format!(
                    "Line {}: expected accession and taxid columns",
                    i + 1
                )));
            }
        };

        let Some(taxon) = parse_taxon_id(taxid_field) else {
            if i == 0 {
                continue;
            }
            return Err(ParseError::InvalidFormat(format!(
                "Line {}: invalid taxid '{taxid_field}'",
                i + 1
            )));
        };

        map.insert(subject_accession(fields[0]).to_string(), taxon);
    }

    Ok(map)
}

/// Load an accession → taxon id table (plain or gzip)
///
/// # Errors
///
/// Returns `ParseError::Io` if the file is missing or unreadable, or
/// `ParseError::InvalidFormat` for malformed rows.
pub fn load_accession_map(path: &Path) -> Result<HashMap<String, TaxonId>, ParseError> {
    let map = read_accession_map(open_text(path)?)?;
    debug!(path = %path.display(), accessions = map.len(), "Loaded accession table");
    Ok(map)
}

enum HitRow {
    Hit(BestHit),
    Unmapped(String),
    Malformed,
}

fn parse_hit(line: &str, accessions: &HashMap<String, TaxonId>) -> HitRow {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() != HIT_COLUMNS {
        return HitRow::Malformed;
    }

    let read = normalize_read_name(fields[0]);
    let identity = fields[IDENTITY_COLUMN].trim().parse::<f64>();
    let evalue = fields[EVALUE_COLUMN].trim().parse::<f64>();
    let (Ok(identity), Ok(evalue)) = (identity, evalue) else {
        return HitRow::Malformed;
    };
    if read.is_empty() {
        return HitRow::Malformed;
    }

    let accession = subject_accession(fields[1]);
    match accessions.get(accession) {
        Some(&taxon_id) if !taxon_id.is_unknown() => HitRow::Hit(BestHit {
            read,
            taxon_id,
            identity,
            evalue,
        }),
        _ => HitRow::Unmapped(accession.to_string()),
    }
}

/// Reduce raw hits to the best accepted hit per read, in first-seen order.
///
/// Hits whose subject has no taxon id never win. Rows that are not valid
/// UTF-8 are decoded lossily.
///
/// # Errors
///
/// Returns `ParseError::Io` if the reader fails.
pub fn best_hits<R: BufRead>(
    mut reader: R,
    accessions: &HashMap<String, TaxonId>,
    filter: HitFilter,
) -> Result<(Vec<BestHit>, HitStats), ParseError> {
    let mut best: Vec<BestHit> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut unmapped: HashSet<String> = HashSet::new();
    let mut stats = HitStats::default();
    let mut buf = Vec::new();

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        let line = String::from_utf8_lossy(&buf);
        let line = line.trim_end_matches(['\r', '\n']);
        if line.is_empty() {
            continue;
        }

        let hit = match parse_hit(line, accessions) {
            HitRow::Hit(hit) => hit,
            HitRow::Unmapped(accession) => {
                stats.hits += 1;
                unmapped.insert(accession);
                continue;
            }
            HitRow::Malformed => {
                stats.malformed += 1;
                continue;
            }
        };
        stats.hits += 1;
        if !filter.accepts(&hit) {
            continue;
        }

        match index.get(&hit.read) {
            Some(&i) => {
                if hit.beats(&best[i]) {
                    best[i] = hit;
                }
            }
            None => {
                index.insert(hit.read.clone(), best.len());
                best.push(hit);
            }
        }
    }

    stats.unmapped_accessions = unmapped.len();
    stats.reads = best.len();

    if stats.unmapped_accessions > 0 {
        warn!(
            accessions = stats.unmapped_accessions,
            "Hit subjects without a taxon id were ignored"
        );
    }
    if stats.malformed > 0 {
        debug!(rows = stats.malformed, "Skipped malformed hit rows");
    }

    Ok((best, stats))
}

/// Write best hits as `read<TAB>taxid<TAB>identity<TAB>evalue`
///
/// # Errors
///
/// Returns an I/O error if the writer fails.
pub fn write_best_hits<W: Write>(mut writer: W, hits: &[BestHit]) -> std::io::Result<()> {
    for hit in hits {
        writeln!(
            writer,
            "{}\t{}\t{:.6}\t{:e}",
            hit.read, hit.taxon_id, hit.identity, hit.evalue
        )?;
    }
    writer.flush()
}
