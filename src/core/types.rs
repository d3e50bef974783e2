use serde::{Deserialize, Serialize};

use crate::core::lineage::{Lineage, TaxonId};

/// Relationship of a candidate lineage to a reference lineage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    /// Same deepest rank and taxon
    Equal,
    /// Candidate is a consistent, less specific path of the reference
    Compatible,
    /// Candidate contradicts the reference at some rank
    Incompatible,
}

/// A winning consensus call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Classification {
    /// Most specific rank of the winning lineage
    pub rank: String,

    /// Taxon at that rank
    pub taxon_id: TaxonId,

    /// Equal plus compatible votes received by the winner
    pub votes: usize,

    /// Full winning lineage, broadest first
    pub lineage: Lineage,
}

impl Classification {
    /// Percentage of consulted classifiers that voted for this call, rounded down
    #[must_use]
    pub fn percent_of(&self, classifiers: usize) -> usize {
        if classifiers == 0 {
            0
        } else {
            self.votes * 100 / classifiers
        }
    }
}

/// Result of one consensus round or of the whole voting procedure
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ClassificationOutcome {
    /// No lineage took part in the vote
    Unclassified,
    /// Top-scoring groups are tied
    Disagreement,
    Classified(Classification),
}

impl ClassificationOutcome {
    #[must_use]
    pub fn classification(&self) -> Option<&Classification> {
        match self {
            Self::Classified(c) => Some(c),
            _ => None,
        }
    }

    /// Votes behind the outcome; zero unless classified
    #[must_use]
    pub fn votes(&self) -> usize {
        self.classification().map_or(0, |c| c.votes)
    }
}

impl std::fmt::Display for ClassificationOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unclassified => write!(f, "NA"),
            Self::Disagreement => write!(f, "disagreement"),
            Self::Classified(c) => write!(f, "{}: {}", c.rank, c.taxon_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rank::RankOrder;

    #[test]
    fn test_percent_rounds_down() {
        let lineage = Lineage::parse("order:4", &RankOrder::default()).unwrap();
        let call = Classification {
            rank: "order".to_string(),
            taxon_id: TaxonId(4),
            votes: 2,
            lineage,
        };
        assert_eq!(call.percent_of(3), 66);
        assert_eq!(call.percent_of(2), 100);
        assert_eq!(call.percent_of(0), 0);
    }

    #[test]
    fn test_outcome_json_is_tagged() {
        let json = serde_json::to_value(ClassificationOutcome::Disagreement).unwrap();
        assert_eq!(json["status"], "disagreement");
        assert_eq!(ClassificationOutcome::Unclassified.votes(), 0);
        assert_eq!(ClassificationOutcome::Unclassified.to_string(), "NA");
    }
}
