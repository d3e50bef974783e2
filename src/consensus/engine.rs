use crate::consensus::compare::compare;
use crate::core::lineage::Lineage;
use crate::core::types::{Classification, ClassificationOutcome, Comparison};

/// A group of agreeing lineages, represented by the first lineage that opened it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsensusNode {
    /// Representative lineage
    pub lineage: Lineage,

    /// Lineages equal to the representative, the representative included
    pub equal_count: usize,

    /// Lineages compatible with (less specific than) the representative
    pub compatible_count: usize,
}

impl ConsensusNode {
    fn new(lineage: Lineage) -> Self {
        Self {
            lineage,
            equal_count: 1,
            compatible_count: 0,
        }
    }

    /// Votes received by this group
    #[must_use]
    pub fn votes(&self) -> usize {
        self.equal_count + self.compatible_count
    }
}

/// Single consensus round over a set of lineages.
///
/// Lineages should be accumulated most specific first (see
/// [`crate::consensus::pruning::sort_for_voting`]) so existing roots are valid
/// references for [`compare`].
#[derive(Debug, Default)]
pub struct ClassTree {
    roots: Vec<ConsensusNode>,
}

impl ClassTree {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one lineage to the round. NA lineages are ignored.
    ///
    /// A lineage compatible with several roots adds a compatible vote to each
    /// of them.
    pub fn accumulate(&mut self, lineage: &Lineage) {
        if lineage.is_na() {
            return;
        }

        let mut compatible = Vec::new();
        for (i, node) in self.roots.iter_mut().enumerate() {
            match compare(&node.lineage, lineage) {
                Comparison::Equal => {
                    node.equal_count += 1;
                    return;
                }
                Comparison::Compatible => compatible.push(i),
                Comparison::Incompatible => {}
            }
        }

        if compatible.is_empty() {
            self.roots.push(ConsensusNode::new(lineage.clone()));
        } else {
            for i in compatible {
                self.roots[i].compatible_count += 1;
            }
        }
    }

    /// Decide the round: a unique top-scoring root wins, a tie is a disagreement
    #[must_use]
    pub fn decide(&self) -> ClassificationOutcome {
        let Some(best) = self.roots.iter().map(ConsensusNode::votes).max() else {
            return ClassificationOutcome::Unclassified;
        };

        let mut leaders = self.roots.iter().filter(|node| node.votes() == best);
        match (leaders.next(), leaders.next()) {
            (Some(winner), None) => classified(winner),
            _ => ClassificationOutcome::Disagreement,
        }
    }

    #[must_use]
    pub fn roots(&self) -> &[ConsensusNode] {
        &self.roots
    }
}

fn classified(node: &ConsensusNode) -> ClassificationOutcome {
    // Roots are never empty: NA is filtered and pruning drops emptied lineages
    let Some((rank, taxon_id)) = node.lineage.deepest() else {
        return ClassificationOutcome::Unclassified;
    };

    ClassificationOutcome::Classified(Classification {
        rank: rank.to_string(),
        taxon_id,
        votes: node.votes(),
        lineage: node.lineage.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::lineage::TaxonId;
    use crate::core::rank::RankOrder;

    fn lineage(text: &str) -> Lineage {
        Lineage::parse(text, &RankOrder::default()).unwrap()
    }

    fn tree_of(lineages: &[&str]) -> ClassTree {
        let mut tree = ClassTree::new();
        for text in lineages {
            tree.accumulate(&lineage(text));
        }
        tree
    }

    #[test]
    fn test_empty_round_is_unclassified() {
        assert_eq!(ClassTree::new().decide(), ClassificationOutcome::Unclassified);
    }

    #[test]
    fn test_single_lineage_gets_one_vote() {
        let tree = tree_of(&["order:4,family:5"]);
        let outcome = tree.decide();
        let call = outcome.classification().unwrap();
        assert_eq!(call.rank, "family");
        assert_eq!(call.taxon_id, TaxonId(5));
        assert_eq!(call.votes, 1);
    }

    #[test]
    fn test_two_equal_lineages() {
        let tree = tree_of(&["order:4,family:5", "order:4,family:5"]);
        assert_eq!(tree.roots().len(), 1);

        let outcome = tree.decide();
        let call = outcome.classification().unwrap();
        assert_eq!(call.votes, 2);
        assert_eq!(call.lineage, lineage("order:4,family:5"));
    }

    #[test]
    fn test_incompatible_pair_disagrees() {
        let tree = tree_of(&["order:4,family:5", "order:4,family:6"]);
        assert_eq!(tree.roots().len(), 2);
        assert_eq!(tree.decide(), ClassificationOutcome::Disagreement);
    }

    #[test]
    fn test_compatible_vote_breaks_tie() {
        // family:5 and genus:7 are separate roots; order:4 supports only family:5's path
        let tree = tree_of(&["order:4,family:5", "order:8,genus:7", "order:4"]);
        let roots = tree.roots();
        assert_eq!(roots.len(), 2);
        assert_eq!(roots[0].compatible_count, 1);
        assert_eq!(roots[1].compatible_count, 0);

        let outcome = tree.decide();
        let call = outcome.classification().unwrap();
        assert_eq!(call.taxon_id, TaxonId(5));
        assert_eq!(call.votes, 2);
    }

    #[test]
    fn test_compatible_lineage_credits_every_matching_root() {
        let tree = tree_of(&["order:4,family:5", "order:4,genus:9", "order:4"]);
        let roots = tree.roots();
        assert_eq!(roots.len(), 2);
        assert!(roots.iter().all(|node| node.compatible_count == 1));
        // Both roots now have two votes: the shared ancestor manufactures a tie
        assert_eq!(tree.decide(), ClassificationOutcome::Disagreement);
    }

    #[test]
    fn test_equal_match_stops_scanning() {
        let tree = tree_of(&["order:4,family:5", "order:4,genus:9", "order:4,genus:9"]);
        let roots = tree.roots();
        assert_eq!(roots[0].votes(), 1);
        assert_eq!(roots[1].equal_count, 2);
    }

    #[test]
    fn test_na_lineage_never_counted() {
        let mut tree = ClassTree::new();
        tree.accumulate(&Lineage::na());
        assert!(tree.roots().is_empty());

        tree.accumulate(&lineage("order:4"));
        tree.accumulate(&Lineage::na());
        assert_eq!(tree.roots().len(), 1);
        assert_eq!(tree.roots()[0].votes(), 1);
        assert!(tree.roots().iter().all(|node| !node.lineage.is_na()));
    }
}
