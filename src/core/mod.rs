//! Core data types for taxonomic consensus.
//!
//! - [`RankOrder`]: the configured total order over rank names, broadest first
//! - [`Lineage`]: one classifier's rank → taxon path for one read
//! - [`TaxonId`]: NCBI taxon identifier (`0` is the unknown/root sentinel)
//! - [`Comparison`], [`ClassificationOutcome`]: voting result types
//!
//! ## The NA sentinel
//!
//! A lineage consisting only of `root:0` means the classifier made no call
//! for the read. It is carried through parsing so a read can be reported as
//! "seen but unclassified", and it is dropped before voting.
//!
//! [`RankOrder`]: rank::RankOrder
//! [`Lineage`]: lineage::Lineage
//! [`TaxonId`]: lineage::TaxonId
//! [`Comparison`]: types::Comparison
//! [`ClassificationOutcome`]: types::ClassificationOutcome

pub mod lineage;
pub mod rank;
pub mod types;
