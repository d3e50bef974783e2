//! Parsers for the inputs of a consensus run.
//!
//! This module provides parsers for:
//!
//! - **Classifier output tables**: CLARK, CLARK-S, Kraken, One Codex, Centrifuge
//!   and USEARCH rows, described declaratively by [`classifier::ClassifierFormat`]
//! - **Manifests**: which classifier outputs belong to which reads file
//! - **Reads files**: record names from FASTA/FASTQ, plain or gzip compressed
//! - **USEARCH hits**: raw hit tables reduced to one best hit per read
//!
//! ## Example
//!
//! ```rust,no_run
//! use metatax::config::Config;
//! use metatax::parsing::manifest::parse_manifest_file;
//! use std::path::Path;
//!
//! let config = Config::load_embedded().unwrap();
//! let read_sets = parse_manifest_file(Path::new("manifest.txt"), &config.classifiers).unwrap();
//! for set in &read_sets {
//!     println!("{}: {} classifiers", set.reads.display(), set.classifiers.len());
//! }
//! ```

pub mod classifier;
pub mod manifest;
pub mod reads;
pub mod usearch;
