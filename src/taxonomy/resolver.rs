use std::collections::HashMap;

use crate::core::lineage::{Lineage, TaxonId};

/// Capability to turn a taxon identifier into a lineage over the configured ranks
pub trait LineageResolver {
    /// Resolve `taxon` into a lineage limited to configured ranks.
    ///
    /// Unknown identifiers, the root itself, and taxa whose path contains no
    /// configured rank resolve to [`Lineage::na`].
    fn resolve(&self, taxon: TaxonId) -> Lineage;

    /// Scientific name of a taxon, if known
    fn scientific_name(&self, taxon: TaxonId) -> Option<&str>;

    /// Resolve a batch, looking each distinct identifier up only once
    fn resolve_all<I>(&self, taxa: I) -> HashMap<TaxonId, Lineage>
    where
        I: IntoIterator<Item = TaxonId>,
        Self: Sized,
    {
        let mut resolved = HashMap::new();
        for taxon in taxa {
            resolved
                .entry(taxon)
                .or_insert_with(|| self.resolve(taxon));
        }
        resolved
    }
}
