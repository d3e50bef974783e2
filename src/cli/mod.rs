//! Command-line interface for metatax.
//!
//! This module implements the CLI using clap. Available commands:
//!
//! - **classify**: Reconcile classifier outputs for every read listed in a manifest
//! - **vote**: Run the multi-level vote on lineages given on the command line
//! - **lineage**: Resolve taxon ids against an NCBI taxdump
//! - **classifiers**: List the supported classifier output formats
//! - **best-hits**: Reduce raw USEARCH hits to one best hit per read
//!
//! ## Usage
//!
//! ```text
//! # Reconcile CLARK and Kraken calls, writing per-read results to out/
//! metatax classify manifest.txt out/ --taxdump /db/taxdump
//!
//! # Same, keeping a detailed log and using 8 threads
//! metatax classify manifest.txt out/ --taxdump /db/taxdump --log --threads 8
//!
//! # Try the vote by hand
//! metatax vote order:4,family:5 order:4,family:6 order:7
//!
//! # Prepare USEARCH output for the `usearch` classifier format
//! metatax best-hits hits.b6 --accessions acc2taxid.tsv --output usearch.tsv
//!
//! # JSON output for scripting
//! metatax lineage 562 590 --taxdump /db/taxdump --format json
//! ```

use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};

use crate::config::Config;

pub mod best_hits;
pub mod classifiers;
pub mod classify;
pub mod lineage;
pub mod vote;

#[derive(Parser)]
#[command(name = "metatax")]
#[command(author = "Fulcrum Genomics")]
#[command(version)]
#[command(about = "Consensus taxonomic classification of reads from several classifiers")]
#[command(
    long_about = "metatax reconciles the taxonomic calls that several read classifiers made for the same reads.\n\nFor every read it collects one lineage per classifier and votes:\n- The most specific rank a majority agrees on wins\n- Ties are resolved by dropping the most specific rank and voting again\n- Reads no classifier could place are reported as unclassified"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(short, long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Classify reads by voting over the outputs listed in a manifest
    Classify(classify::ClassifyArgs),

    /// Vote over lineages written as rank:taxid,rank:taxid
    Vote(vote::VoteArgs),

    /// Resolve taxon ids to lineages
    Lineage(lineage::LineageArgs),

    /// List supported classifier formats
    Classifiers(classifiers::ClassifiersArgs),

    /// Reduce raw USEARCH hits to one best hit per read
    BestHits(best_hits::BestHitsArgs),
}

/// Options shared by every command that needs the run configuration
#[derive(Args, Clone, Debug, Default)]
pub struct ConfigArgs {
    /// JSON file with ranks and/or classifier formats merged over the defaults
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Comma-separated rank order, broadest first (applied after --config)
    #[arg(long)]
    pub ranks: Option<String>,
}

impl ConfigArgs {
    /// Embedded defaults with the user's overrides applied
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or a rank list is invalid.
    pub fn load(&self) -> anyhow::Result<Config> {
        Config::resolve(self.config.as_deref(), self.ranks.as_deref())
            .context("Failed to load configuration")
    }
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Tsv,
}
