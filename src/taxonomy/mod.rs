//! Resolution of taxon identifiers into rank-ordered lineages.
//!
//! The consensus core never looks taxa up itself. Callers inject a
//! [`LineageResolver`]; the bundled implementation is [`NcbiTaxonomy`], which
//! reads the `nodes.dmp`, `names.dmp` and (optionally) `merged.dmp` files of an
//! NCBI taxdump.
//!
//! ```rust,no_run
//! use metatax::core::lineage::TaxonId;
//! use metatax::core::rank::RankOrder;
//! use metatax::taxonomy::{LineageResolver, NcbiTaxonomy};
//! use std::path::Path;
//!
//! let taxonomy = NcbiTaxonomy::load_dir(Path::new("taxdump"), RankOrder::default()).unwrap();
//! let lineage = taxonomy.resolve(TaxonId(562));
//! println!("{lineage}");
//! ```

pub mod ncbi;
pub mod resolver;

pub use ncbi::NcbiTaxonomy;
pub use resolver::LineageResolver;
