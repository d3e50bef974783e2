use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::rank::RankOrder;

/// Rank key of the "no classification" sentinel lineage
pub const NA_RANK: &str = "root";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum LineageError {
    #[error("Rank '{0}' is not part of the configured rank order")]
    UnknownRank(String),

    #[error("Rank '{0}' is assigned more than once")]
    DuplicateRank(String),

    #[error("Invalid lineage entry '{0}': expected rank:taxid")]
    InvalidEntry(String),
}

/// NCBI taxon identifier. `0` is reserved for the unknown/root sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaxonId(pub u32);

impl TaxonId {
    pub const UNKNOWN: TaxonId = TaxonId(0);

    #[must_use]
    pub fn is_unknown(self) -> bool {
        self == Self::UNKNOWN
    }
}

impl std::fmt::Display for TaxonId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One classifier's call for one read: rank → taxon, broadest first.
///
/// Values are immutable once built; pruning returns a new lineage.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Lineage {
    entries: Vec<(String, TaxonId)>,
}

impl Lineage {
    /// The "no classification" sentinel `{root: 0}`
    #[must_use]
    pub fn na() -> Self {
        Self {
            entries: vec![(NA_RANK.to_string(), TaxonId::UNKNOWN)],
        }
    }

    /// Build a lineage from `(rank, taxon)` pairs in any order, sorted by `ranks`.
    ///
    /// A sole `(root, 0)` pair yields the NA sentinel.
    ///
    /// # Errors
    ///
    /// Returns `LineageError::UnknownRank` for ranks outside `ranks` and
    /// `LineageError::DuplicateRank` when a rank is assigned twice.
    pub fn from_pairs<I, S>(pairs: I, ranks: &RankOrder) -> Result<Self, LineageError>
    where
        I: IntoIterator<Item = (S, TaxonId)>,
        S: Into<String>,
    {
        let mut entries: Vec<(usize, String, TaxonId)> = Vec::new();
        let pairs: Vec<(String, TaxonId)> =
            pairs.into_iter().map(|(r, t)| (r.into(), t)).collect();

        if let [(rank, taxon)] = pairs.as_slice() {
            if rank == NA_RANK && taxon.is_unknown() {
                return Ok(Self::na());
            }
        }

        for (rank, taxon) in pairs {
            let position = ranks
                .position(&rank)
                .ok_or_else(|| LineageError::UnknownRank(rank.clone()))?;
            if entries.iter().any(|(p, _, _)| *p == position) {
                return Err(LineageError::DuplicateRank(rank));
            }
            entries.push((position, rank, taxon));
        }

        entries.sort_by_key(|(position, _, _)| *position);

        Ok(Self {
            entries: entries
                .into_iter()
                .map(|(_, rank, taxon)| (rank, taxon))
                .collect(),
        })
    }

    /// Parse the `rank:taxid,rank:taxid` notation used on the command line and in logs.
    ///
    /// `NA` (any case) and `root:0` denote the sentinel.
    ///
    /// # Errors
    ///
    /// Returns `LineageError::InvalidEntry` for malformed entries, plus the
    /// errors of [`Lineage::from_pairs`].
    pub fn parse(text: &str, ranks: &RankOrder) -> Result<Self, LineageError> {
        let text = text.trim();
        if text.eq_ignore_ascii_case("na") {
            return Ok(Self::na());
        }

        let mut pairs = Vec::new();
        for entry in text.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (rank, taxon) = entry
                .split_once(':')
                .ok_or_else(|| LineageError::InvalidEntry(entry.to_string()))?;
            let taxon: u32 = taxon
                .trim()
                .parse()
                .map_err(|_| LineageError::InvalidEntry(entry.to_string()))?;
            pairs.push((rank.trim().to_string(), TaxonId(taxon)));
        }

        Self::from_pairs(pairs, ranks)
    }

    #[must_use]
    pub fn is_na(&self) -> bool {
        matches!(self.entries.as_slice(), [(rank, taxon)] if rank == NA_RANK && taxon.is_unknown())
    }

    #[must_use]
    pub fn get(&self, rank: &str) -> Option<TaxonId> {
        self.entries
            .iter()
            .find(|(r, _)| r == rank)
            .map(|(_, taxon)| *taxon)
    }

    #[must_use]
    pub fn contains_rank(&self, rank: &str) -> bool {
        self.entries.iter().any(|(r, _)| r == rank)
    }

    /// Most specific entry
    #[must_use]
    pub fn deepest(&self) -> Option<(&str, TaxonId)> {
        self.entries
            .last()
            .map(|(rank, taxon)| (rank.as_str(), *taxon))
    }

    /// Position in `ranks` of the most specific entry present
    #[must_use]
    pub fn deepest_position(&self, ranks: &RankOrder) -> Option<usize> {
        self.entries
            .iter()
            .filter_map(|(rank, _)| ranks.position(rank))
            .max()
    }

    /// Copy of this lineage without `rank`; unchanged if the rank is absent
    #[must_use]
    pub fn without_rank(&self, rank: &str) -> Self {
        Self {
            entries: self
                .entries
                .iter()
                .filter(|(r, _)| r != rank)
                .cloned()
                .collect(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, TaxonId)> + '_ {
        self.entries
            .iter()
            .map(|(rank, taxon)| (rank.as_str(), *taxon))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Display for Lineage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self
            .entries
            .iter()
            .map(|(rank, taxon)| format!("{rank}:{taxon}"))
            .collect();
        write!(f, "{}", parts.join(","))
    }
}
