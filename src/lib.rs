//! # metatax
//!
//! A library for reconciling the taxonomic calls that several read classifiers
//! made for the same sequencing reads.
//!
//! Classifiers such as CLARK, Kraken or One Codex routinely disagree: one calls
//! a read *E. coli*, another stops at *Enterobacteriaceae*, a third places it in
//! a different genus altogether. `metatax` turns each call into a lineage over a
//! configured rank order and votes for the most specific rank a majority of
//! classifiers agree on.
//!
//! ## Features
//!
//! - **Multi-level voting**: ties are broken by generalising every lineage one rank at a time
//! - **Compatible votes**: a less specific call supports the deeper calls it agrees with
//! - **NCBI taxonomy**: lineages resolved from a taxdump, following merged ids
//! - **Declarative classifier formats**: new tools are a JSON entry, not new code
//! - **Parallel**: reads are voted independently on a thread pool
//!
//! ## Example
//!
//! ```rust
//! use metatax::{Lineage, MultiLevelVoter, RankOrder};
//!
//! let ranks = RankOrder::default();
//! let lineages = vec![
//!     Lineage::parse("genus:561,species:562", &ranks).unwrap(),
//!     Lineage::parse("genus:561", &ranks).unwrap(),
//!     Lineage::parse("genus:590,species:28901", &ranks).unwrap(),
//! ];
//!
//! let outcome = MultiLevelVoter::new(&ranks).classify(&lineages);
//! let call = outcome.classification().unwrap();
//! assert_eq!(call.taxon_id.0, 562);
//! assert_eq!(call.votes, 2);
//! ```
//!
//! ## Modules
//!
//! - [`core`]: Ranks, lineages and outcome types
//! - [`consensus`]: Comparator, consensus rounds and rank pruning
//! - [`taxonomy`]: Lineage resolution from NCBI taxdump files
//! - [`parsing`]: Classifier outputs, manifests and reads files
//! - [`config`]: Embedded defaults and user overrides
//! - [`cli`]: Command-line interface implementation

pub mod cli;
pub mod config;
pub mod consensus;
pub mod core;
pub mod parsing;
pub mod taxonomy;
pub mod utils;

// Re-export commonly used types for convenience
pub use config::Config;
pub use consensus::{ClassTree, MultiLevelVoter, VotingReport};
pub use core::lineage::{Lineage, TaxonId};
pub use core::rank::RankOrder;
pub use core::types::*;
pub use taxonomy::{LineageResolver, NcbiTaxonomy};
