use crate::core::lineage::Lineage;
use crate::core::types::Comparison;

/// Compare a candidate lineage against a reference lineage.
///
/// This is a one-directional containment test: `reference` must be the more
/// specific of the two (callers establish this by ordering lineages before
/// voting). Swapping the arguments can turn `Compatible` into `Incompatible`.
///
/// - `Equal`: both deepest entries name the same rank and the same taxon
/// - `Compatible`: every rank of `candidate` appears in `reference` with the
///   same taxon, but the deepest entries differ
/// - `Incompatible`: otherwise
#[must_use]
pub fn compare(reference: &Lineage, candidate: &Lineage) -> Comparison {
    if let (Some(deepest_ref), Some(deepest_cand)) = (reference.deepest(), candidate.deepest()) {
        if deepest_ref == deepest_cand {
            return Comparison::Equal;
        }
    }

    let contained = candidate
        .iter()
        .all(|(rank, taxon)| reference.get(rank) == Some(taxon));

    if contained {
        Comparison::Compatible
    } else {
        Comparison::Incompatible
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::lineage::TaxonId;
    use crate::core::rank::RankOrder;
    use proptest::prelude::*;

    fn lineage(text: &str) -> Lineage {
        Lineage::parse(text, &RankOrder::default()).unwrap()
    }

    #[test]
    fn test_equal_on_same_deepest_taxon() {
        let a = lineage("phylum:2,class:3,order:4");
        assert_eq!(compare(&a, &a), Comparison::Equal);

        // Only the deepest entry decides equality
        let b = lineage("phylum:9,order:4");
        assert_eq!(compare(&a, &b), Comparison::Equal);
    }

    #[test]
    fn test_compatible_subset() {
        let reference = lineage("phylum:2,class:3,order:4,family:5");
        let candidate = lineage("phylum:2,class:3");
        assert_eq!(compare(&reference, &candidate), Comparison::Compatible);
    }

    #[test]
    fn test_compatible_subset_with_gap() {
        let reference = lineage("phylum:2,class:3,order:4,family:5");
        let candidate = lineage("phylum:2,order:4");
        assert_eq!(compare(&reference, &candidate), Comparison::Compatible);
    }

    #[test]
    fn test_incompatible_on_differing_taxon() {
        let reference = lineage("phylum:2,class:3,order:4");
        let candidate = lineage("phylum:2,class:6");
        assert_eq!(compare(&reference, &candidate), Comparison::Incompatible);
    }

    #[test]
    fn test_incompatible_on_missing_rank() {
        let reference = lineage("phylum:2,order:4");
        let candidate = lineage("phylum:2,class:3");
        assert_eq!(compare(&reference, &candidate), Comparison::Incompatible);
    }

    #[test]
    fn test_argument_order_matters() {
        let deep = lineage("order:4,family:5");
        let shallow = lineage("order:4");
        assert_eq!(compare(&deep, &shallow), Comparison::Compatible);
        assert_eq!(compare(&shallow, &deep), Comparison::Incompatible);
    }

    fn arb_lineage() -> impl Strategy<Value = Lineage> {
        proptest::collection::vec(proptest::option::of(1u32..50), 7).prop_filter_map(
            "at least one rank",
            |ids| {
                let ranks = RankOrder::default();
                let pairs: Vec<(String, TaxonId)> = ranks
                    .iter()
                    .zip(ids)
                    .filter_map(|(rank, id)| id.map(|id| (rank.to_string(), TaxonId(id))))
                    .collect();
                if pairs.is_empty() {
                    None
                } else {
                    Lineage::from_pairs(pairs, &ranks).ok()
                }
            },
        )
    }

    proptest! {
        #[test]
        fn prop_self_comparison_is_equal(l in arb_lineage()) {
            prop_assert_eq!(compare(&l, &l), Comparison::Equal);
        }

        #[test]
        fn prop_strict_prefix_is_compatible(l in arb_lineage()) {
            prop_assume!(l.len() > 1);
            let deepest = l.deepest().map(|(rank, _)| rank.to_string()).unwrap();
            let shorter = l.without_rank(&deepest);
            prop_assert_eq!(compare(&l, &shorter), Comparison::Compatible);
        }

        #[test]
        fn prop_subset_with_gap_is_compatible(l in arb_lineage(), gap in 0usize..7) {
            prop_assume!(l.len() > 2);
            let deepest = l.deepest().map(|(rank, _)| rank.to_string()).unwrap();
            let shorter = l.without_rank(&deepest);
            let dropped = shorter
                .iter()
                .nth(gap % shorter.len())
                .map(|(rank, _)| rank.to_string())
                .unwrap();
            let subset = shorter.without_rank(&dropped);
            prop_assert_eq!(compare(&l, &subset), Comparison::Compatible);
        }

        #[test]
        fn prop_conflicting_deepest_rank_is_incompatible(
            l in arb_lineage(),
            bump in 1u32..10,
            keep in 0usize..7,
        ) {
            let (deepest, taxon) = l.deepest().map(|(r, t)| (r.to_string(), t)).unwrap();
            // Conflict at the deepest rank, keeping only some of the broader ranks
            let pairs: Vec<(String, TaxonId)> = l
                .iter()
                .enumerate()
                .filter(|(i, (rank, _))| *rank == deepest || *i < keep)
                .map(|(_, (rank, t))| {
                    if rank == deepest {
                        (rank.to_string(), TaxonId(taxon.0 + bump))
                    } else {
                        (rank.to_string(), t)
                    }
                })
                .collect();
            let conflicting = Lineage::from_pairs(pairs, &RankOrder::default()).unwrap();
            prop_assert_eq!(compare(&l, &conflicting), Comparison::Incompatible);
        }
    }
}
