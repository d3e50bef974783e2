use serde::Serialize;
use tracing::trace;

use crate::consensus::engine::ClassTree;
use crate::core::lineage::Lineage;
use crate::core::rank::RankOrder;
use crate::core::types::ClassificationOutcome;

/// Outcome of the multi-level vote for one read, with how it was reached
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VotingReport {
    pub outcome: ClassificationOutcome,

    /// Consensus rounds run, at least one
    pub rounds: usize,

    /// Ranks removed after each disagreement, most specific first
    pub pruned_ranks: Vec<String>,
}

/// Where the vote currently stands
enum VotingState {
    /// Lineages waiting for a consensus round
    Voting(Vec<Lineage>),
    /// The previous round tied and `rank` was removed from every lineage
    Pruned { rank: String, lineages: Vec<Lineage> },
    Done(ClassificationOutcome),
}

/// Runs consensus rounds, generalising the lineages one rank at a time until
/// a winner emerges or no ranks remain
#[derive(Debug, Clone)]
pub struct MultiLevelVoter<'a> {
    ranks: &'a RankOrder,
}

impl<'a> MultiLevelVoter<'a> {
    #[must_use]
    pub fn new(ranks: &'a RankOrder) -> Self {
        Self { ranks }
    }

    /// Vote over the lineages of one read.
    ///
    /// NA lineages are dropped up front; an empty input is `Unclassified`.
    #[must_use]
    pub fn vote(&self, lineages: &[Lineage]) -> VotingReport {
        let mut candidates: Vec<Lineage> = lineages
            .iter()
            .filter(|l| !l.is_na() && !l.is_empty())
            .cloned()
            .collect();
        sort_for_voting(&mut candidates, self.ranks);

        let mut report = VotingReport {
            outcome: ClassificationOutcome::Unclassified,
            rounds: 0,
            pruned_ranks: Vec::new(),
        };

        let mut state = VotingState::Voting(candidates);
        loop {
            state = match state {
                VotingState::Voting(current) => {
                    report.rounds += 1;
                    self.round(current)
                }
                VotingState::Pruned { rank, lineages } => {
                    trace!(rank = %rank, remaining = lineages.len(), "pruned rank after tie");
                    report.pruned_ranks.push(rank);
                    VotingState::Voting(lineages)
                }
                VotingState::Done(outcome) => {
                    report.outcome = outcome;
                    return report;
                }
            };
        }
    }

    /// Convenience wrapper returning only the outcome
    #[must_use]
    pub fn classify(&self, lineages: &[Lineage]) -> ClassificationOutcome {
        self.vote(lineages).outcome
    }

    fn round(&self, lineages: Vec<Lineage>) -> VotingState {
        let mut tree = ClassTree::new();
        for lineage in &lineages {
            tree.accumulate(lineage);
        }

        match tree.decide() {
            ClassificationOutcome::Disagreement => {
                let Some(rank) = deepest_present_rank(&lineages, self.ranks) else {
                    return VotingState::Done(ClassificationOutcome::Disagreement);
                };
                let rank = rank.to_string();
                let pruned = prune_rank(&lineages, &rank);
                if pruned.is_empty() {
                    VotingState::Done(ClassificationOutcome::Disagreement)
                } else {
                    VotingState::Pruned {
                        rank,
                        lineages: pruned,
                    }
                }
            }
            outcome => VotingState::Done(outcome),
        }
    }
}

/// Order lineages so that earlier ones are valid comparison references for later ones.
///
/// Two stable passes: by number of ranks (descending), then by depth of the
/// deepest rank (most specific first). The second pass dominates; equal depth
/// keeps the longer lineage first, then the original order.
pub fn sort_for_voting(lineages: &mut [Lineage], ranks: &RankOrder) {
    lineages.sort_by(|a, b| b.len().cmp(&a.len()));
    lineages.sort_by(|a, b| b.deepest_position(ranks).cmp(&a.deepest_position(ranks)));
}

/// Most specific rank present in any of the lineages
#[must_use]
pub fn deepest_present_rank<'r>(lineages: &[Lineage], ranks: &'r RankOrder) -> Option<&'r str> {
    ranks
        .iter_specific_first()
        .find(|rank| lineages.iter().any(|l| l.contains_rank(rank)))
}

/// Remove `rank` from every lineage, dropping lineages left empty
#[must_use]
pub fn prune_rank(lineages: &[Lineage], rank: &str) -> Vec<Lineage> {
    lineages
        .iter()
        .map(|l| l.without_rank(rank))
        .filter(|l| !l.is_empty())
        .collect()
}
