//! Multi-level voting consensus over classifier lineages.
//!
//! - [`compare`](compare::compare): Equal / Compatible / Incompatible test between two lineages
//! - [`ClassTree`]: one consensus round, grouping lineages into weighted roots
//! - [`MultiLevelVoter`]: repeats rounds, pruning the most specific rank after each tie
//!
//! ## Voting
//!
//! Every lineage either joins a root it equals, adds a compatible vote to every
//! root it is a consistent prefix of, or opens a new root. A root's score is its
//! equal plus compatible votes. A unique top score wins; a tie prunes the most
//! specific rank from all lineages and votes again.
//!
//! ## Example
//!
//! ```rust
//! use metatax::consensus::MultiLevelVoter;
//! use metatax::core::lineage::Lineage;
//! use metatax::core::rank::RankOrder;
//!
//! let ranks = RankOrder::default();
//! let lineages: Vec<Lineage> = ["order:4,family:5", "order:4,family:6", "order:7"]
//!     .iter()
//!     .map(|text| Lineage::parse(text, &ranks).unwrap())
//!     .collect();
//!
//! let outcome = MultiLevelVoter::new(&ranks).classify(&lineages);
//! let call = outcome.classification().unwrap();
//! assert_eq!((call.rank.as_str(), call.taxon_id.0, call.votes), ("order", 4, 2));
//! ```

pub mod compare;
pub mod engine;
pub mod pruning;

pub use engine::{ClassTree, ConsensusNode};
pub use pruning::{MultiLevelVoter, VotingReport};
