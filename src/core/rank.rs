use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Ranks used when no configuration overrides them, broadest first
pub const DEFAULT_RANKS: [&str; 7] = [
    "superkingdom",
    "phylum",
    "class",
    "order",
    "family",
    "genus",
    "species",
];

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RankOrderError {
    #[error("Rank order is empty")]
    Empty,

    #[error("Rank '{0}' appears more than once in the rank order")]
    Duplicate(String),

    #[error("Rank name must not be blank (position {0})")]
    Blank(usize),
}

/// Total order over taxonomic rank names, from broadest to most specific.
///
/// Positions are dense: the broadest rank has position 0 and the most
/// specific rank has position `len() - 1`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct RankOrder {
    ranks: Vec<String>,
    positions: HashMap<String, usize>,
}

impl RankOrder {
    /// Build a rank order from names listed broadest first.
    ///
    /// # Errors
    ///
    /// Returns `RankOrderError::Empty` for an empty list, `RankOrderError::Blank`
    /// for whitespace-only names, and `RankOrderError::Duplicate` when a name repeats.
    pub fn new<I, S>(ranks: I) -> Result<Self, RankOrderError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut names = Vec::new();
        let mut positions = HashMap::new();

        for (i, rank) in ranks.into_iter().enumerate() {
            let rank = rank.into().trim().to_string();
            if rank.is_empty() {
                return Err(RankOrderError::Blank(i));
            }
            if positions.insert(rank.clone(), i).is_some() {
                return Err(RankOrderError::Duplicate(rank));
            }
            names.push(rank);
        }

        if names.is_empty() {
            return Err(RankOrderError::Empty);
        }

        Ok(Self {
            ranks: names,
            positions,
        })
    }

    /// Parse a comma-separated rank list such as `order,family,genus`
    ///
    /// # Errors
    ///
    /// Same conditions as [`RankOrder::new`].
    pub fn parse_list(list: &str) -> Result<Self, RankOrderError> {
        Self::new(list.split(',').filter(|s| !s.trim().is_empty()))
    }

    /// Position of a rank, 0 being the broadest
    #[must_use]
    pub fn position(&self, rank: &str) -> Option<usize> {
        self.positions.get(rank).copied()
    }

    #[must_use]
    pub fn contains(&self, rank: &str) -> bool {
        self.positions.contains_key(rank)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ranks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ranks.is_empty()
    }

    /// Ranks from broadest to most specific
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &str> + '_ {
        self.ranks.iter().map(String::as_str)
    }

    /// Ranks from most specific to broadest
    pub fn iter_specific_first(&self) -> impl Iterator<Item = &str> + '_ {
        self.iter().rev()
    }
}

impl Default for RankOrder {
    fn default() -> Self {
        Self::new(DEFAULT_RANKS).expect("default ranks are unique and non-empty")
    }
}

impl TryFrom<Vec<String>> for RankOrder {
    type Error = RankOrderError;

    fn try_from(ranks: Vec<String>) -> Result<Self, Self::Error> {
        Self::new(ranks)
    }
}

impl From<RankOrder> for Vec<String> {
    fn from(order: RankOrder) -> Self {
        order.ranks
    }
}

impl std::fmt::Display for RankOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.ranks.join(","))
    }
}
