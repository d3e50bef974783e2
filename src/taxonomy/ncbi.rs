//! NCBI taxdump-backed lineage resolver.
//!
//! Dump files use `\t|\t` as the field separator and end each line with `\t|`:
//!
//! - `nodes.dmp`: `tax_id | parent_tax_id | rank | ...`
//! - `names.dmp`: `tax_id | name_txt | unique_name | name_class`
//! - `merged.dmp`: `old_tax_id | new_tax_id`

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use thiserror::Error;
use tracing::{info, warn};

use crate::core::lineage::{Lineage, TaxonId};
use crate::core::rank::RankOrder;
use crate::taxonomy::resolver::LineageResolver;

/// Upper bound on parent hops; NCBI paths are well under 100 deep
const MAX_LINEAGE_DEPTH: usize = 1024;

#[derive(Error, Debug)]
pub enum TaxonomyError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid {file} line {line}: {message}")]
    InvalidFormat {
        file: &'static str,
        line: usize,
        message: String,
    },

    #[error("Taxonomy file not found: {0}")]
    MissingFile(String),
}

#[derive(Debug, Clone)]
struct TaxonNode {
    parent: u32,
    rank: String,
}

/// In-memory NCBI taxonomy restricted to a rank order
#[derive(Debug)]
pub struct NcbiTaxonomy {
    nodes: HashMap<u32, TaxonNode>,
    names: HashMap<u32, String>,
    merged: HashMap<u32, u32>,
    ranks: RankOrder,
}

impl NcbiTaxonomy {
    /// Load `nodes.dmp`, `names.dmp` and, when present, `merged.dmp` from a taxdump directory
    ///
    /// # Errors
    ///
    /// Returns `TaxonomyError::MissingFile` if a required file is absent,
    /// `TaxonomyError::Io` on read failures, or `TaxonomyError::InvalidFormat`
    /// for malformed lines.
    pub fn load_dir(dir: &Path, ranks: RankOrder) -> Result<Self, TaxonomyError> {
        let nodes_path = dir.join("nodes.dmp");
        let names_path = dir.join("names.dmp");
        let merged_path = dir.join("merged.dmp");

        for required in [&nodes_path, &names_path] {
            if !required.is_file() {
                return Err(TaxonomyError::MissingFile(required.display().to_string()));
            }
        }

        let nodes = BufReader::new(File::open(&nodes_path)?);
        let names = BufReader::new(File::open(&names_path)?);
        let merged = if merged_path.is_file() {
            Some(BufReader::new(File::open(&merged_path)?))
        } else {
            None
        };

        let taxonomy = Self::from_readers(nodes, names, merged, ranks)?;
        info!(
            taxa = taxonomy.nodes.len(),
            merged = taxonomy.merged.len(),
            "loaded NCBI taxonomy from {}",
            dir.display()
        );
        Ok(taxonomy)
    }

    /// Build from already-open dump readers
    ///
    /// # Errors
    ///
    /// Returns `TaxonomyError::Io` on read failures or
    /// `TaxonomyError::InvalidFormat` for malformed lines.
    pub fn from_readers<N: BufRead, M: BufRead, G: BufRead>(
        nodes: N,
        names: M,
        merged: Option<G>,
        ranks: RankOrder,
    ) -> Result<Self, TaxonomyError> {
        Ok(Self {
            nodes: load_nodes(nodes)?,
            names: load_names(names)?,
            merged: match merged {
                Some(reader) => load_merged(reader)?,
                None => HashMap::new(),
            },
            ranks,
        })
    }

    #[must_use]
    pub fn ranks(&self) -> &RankOrder {
        &self.ranks
    }

    #[must_use]
    pub fn taxa_count(&self) -> usize {
        self.nodes.len()
    }

    /// Current identifier for a possibly merged one
    #[must_use]
    pub fn canonical(&self, taxon: TaxonId) -> TaxonId {
        self.merged.get(&taxon.0).map_or(taxon, |&id| TaxonId(id))
    }
}

impl LineageResolver for NcbiTaxonomy {
    fn resolve(&self, taxon: TaxonId) -> Lineage {
        if taxon.is_unknown() {
            return Lineage::na();
        }

        let mut current = self.canonical(taxon).0;
        let mut pairs: Vec<(String, TaxonId)> = Vec::new();

        for _ in 0..MAX_LINEAGE_DEPTH {
            let Some(node) = self.nodes.get(&current) else {
                break;
            };

            // Walking upwards, so the first hit for a rank is the most specific one
            if self.ranks.contains(&node.rank) && !pairs.iter().any(|(r, _)| *r == node.rank) {
                pairs.push((node.rank.clone(), TaxonId(current)));
            }

            if node.parent == current {
                break;
            }
            current = node.parent;
        }

        if pairs.is_empty() {
            return Lineage::na();
        }

        Lineage::from_pairs(pairs, &self.ranks).unwrap_or_else(|e| {
            warn!("taxon {taxon} produced an invalid lineage: {e}");
            Lineage::na()
        })
    }

    fn scientific_name(&self, taxon: TaxonId) -> Option<&str> {
        self.names
            .get(&taxon.0)
            .or_else(|| self.names.get(&self.canonical(taxon).0))
            .map(String::as_str)
    }
}

/// Split a dump line into trimmed fields
fn dmp_fields(line: &str) -> Vec<&str> {
    line.trim_end()
        .trim_end_matches('|')
        .split('|')
        .map(str::trim)
        .collect()
}

fn parse_id(field: &str, file: &'static str, line: usize) -> Result<u32, TaxonomyError> {
    field.parse().map_err(|_| TaxonomyError::InvalidFormat {
        file,
        line,
        message: format!("invalid taxon id '{field}'"),
    })
}

fn load_nodes<R: BufRead>(reader: R) -> Result<HashMap<u32, TaxonNode>, TaxonomyError> {
    let mut nodes = HashMap::new();

    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let fields = dmp_fields(&line);
        if fields.len() < 3 {
            return Err(TaxonomyError::InvalidFormat {
                file: "nodes.dmp",
                line: i + 1,
                message: format!("expected at least 3 fields, found {}", fields.len()),
            });
        }

        let taxon = parse_id(fields[0], "nodes.dmp", i + 1)?;
        let parent = parse_id(fields[1], "nodes.dmp", i + 1)?;
        nodes.insert(
            taxon,
            TaxonNode {
                parent,
                rank: fields[2].to_string(),
            },
        );
    }

    Ok(nodes)
}

fn load_names<R: BufRead>(reader: R) -> Result<HashMap<u32, String>, TaxonomyError> {
    let mut names = HashMap::new();

    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let fields = dmp_fields(&line);
        if fields.len() < 4 {
            return Err(TaxonomyError::InvalidFormat {
                file: "names.dmp",
                line: i + 1,
                message: format!("expected 4 fields, found {}", fields.len()),
            });
        }

        if fields[3] == "scientific name" {
            let taxon = parse_id(fields[0], "names.dmp", i + 1)?;
            names.insert(taxon, fields[1].to_string());
        }
    }

    Ok(names)
}

fn load_merged<R: BufRead>(reader: R) -> Result<HashMap<u32, u32>, TaxonomyError> {
    let mut merged = HashMap::new();

    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let fields = dmp_fields(&line);
        if fields.len() < 2 {
            return Err(TaxonomyError::InvalidFormat {
                file: "merged.dmp",
                line: i + 1,
                message: format!("expected 2 fields, found {}", fields.len()),
            });
        }

        let old = parse_id(fields[0], "merged.dmp", i + 1)?;
        let new = parse_id(fields[1], "merged.dmp", i + 1)?;
        merged.insert(old, new);
    }

    Ok(merged)
}


#[cfg(test)]
mod tests {
    use super::fixtures::taxonomy;
    use super::*;

    #[test]
    fn test_resolve_species() {
        let taxonomy = taxonomy();
        let lineage = taxonomy.resolve(TaxonId(562));
        assert_eq!(
            lineage.to_string(),
            "superkingdom:2,phylum:1224,class:1236,order:91347,family:543,genus:561,species:562"
        );
    }

    #[test]
    fn test_resolve_skips_unconfigured_ranks() {
        // The strain rank is not configured, so the lineage stops at species
        let lineage = taxonomy().resolve(TaxonId(83333));
        assert_eq!(lineage.deepest(), Some(("species", TaxonId(562))));
    }

    #[test]
    fn test_resolve_follows_merged_ids() {
        let taxonomy = taxonomy();
        assert_eq!(taxonomy.resolve(TaxonId(469598)), taxonomy.resolve(TaxonId(562)));
        assert_eq!(taxonomy.scientific_name(TaxonId(469598)), Some("Escherichia coli"));
    }

    #[test]
    fn test_resolve_unknown_and_root_are_na() {
        let taxonomy = taxonomy();
        assert!(taxonomy.resolve(TaxonId(0)).is_na());
        assert!(taxonomy.resolve(TaxonId(999_999)).is_na());
        assert!(taxonomy.resolve(TaxonId(1)).is_na());
        assert!(taxonomy.resolve(TaxonId(131_567)).is_na());
    }

    #[test]
    fn test_resolve_respects_custom_ranks() {
        let ranks = RankOrder::new(["family", "genus"]).unwrap();
        let taxonomy = NcbiTaxonomy::from_readers(
            fixtures::NODES.as_bytes(),
            fixtures::NAMES.as_bytes(),
            None::<&[u8]>,
            ranks,
        )
        .unwrap();
        assert_eq!(taxonomy.resolve(TaxonId(28901)).to_string(), "family:543,genus:590");
    }

    #[test]
    fn test_scientific_names_only() {
        let taxonomy = taxonomy();
        assert_eq!(taxonomy.scientific_name(TaxonId(2)), Some("Bacteria"));
        assert_eq!(taxonomy.taxa_count(), 12);
    }

    #[test]
    fn test_resolve_all_dedupes() {
        let resolved = taxonomy().resolve_all([TaxonId(562), TaxonId(562), TaxonId(0)]);
        assert_eq!(resolved.len(), 2);
        assert!(resolved[&TaxonId(0)].is_na());
    }

    #[test]
    fn test_invalid_nodes_line() {
        let result = NcbiTaxonomy::from_readers(
            "abc\t|\t1\t|\tgenus\t|\n".as_bytes(),
            fixtures::NAMES.as_bytes(),
            None::<&[u8]>,
            RankOrder::default(),
        );
        assert!(matches!(
            result,
            Err(TaxonomyError::InvalidFormat { file: "nodes.dmp", line: 1, .. })
        ));
    }
}
