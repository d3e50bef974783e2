use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use serde::Serialize;
use tracing::info;

use crate::cli::OutputFormat;
use crate::parsing::reads::open_text;
use crate::parsing::usearch::{
    best_hits, load_accession_map, write_best_hits, HitFilter, HitStats, DEFAULT_MAX_EVALUE,
    DEFAULT_MIN_IDENTITY,
};

#[derive(Args)]
pub struct BestHitsArgs {
    /// Raw USEARCH/BLAST tabular hits (12 columns, plain or gzip)
    #[arg(required = true)]
    pub hits: PathBuf,

    /// Accession to taxon id table (two columns, or NCBI accession2taxid)
    #[arg(short, long, required = true)]
    pub accessions: PathBuf,

    /// Where to write the reduced table read by the `usearch` classifier format
    #[arg(short, long, required = true)]
    pub output: PathBuf,

    /// Minimum percent identity of a usable hit
    #[arg(long, default_value_t = DEFAULT_MIN_IDENTITY)]
    pub min_identity: f64,

    /// Maximum e-value of a usable hit
    #[arg(long, default_value_t = DEFAULT_MAX_EVALUE)]
    pub max_evalue: f64,
}

#[derive(Serialize)]
struct BestHitsSummary<'a> {
    hits_file: String,
    output: String,
    #[serde(flatten)]
    stats: &'a HitStats,
}

/// Execute best-hits subcommand
///
/// # Errors
///
/// Returns an error if an input cannot be read, the accession table is
/// malformed, or the output cannot be written.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: BestHitsArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let accessions = load_accession_map(&args.accessions)
        .with_context(|| format!("Failed to load accessions {}", args.accessions.display()))?;

    if verbose {
        eprintln!("Loaded {} accession(s)", accessions.len());
    }

    let filter = HitFilter {
        min_identity: args.min_identity,
        max_evalue: args.max_evalue,
    };
    let reader = open_text(&args.hits)
        .with_context(|| format!("Failed to open {}", args.hits.display()))?;
    let (hits, stats) = best_hits(reader, &accessions, filter)
        .with_context(|| format!("Failed to read hits {}", args.hits.display()))?;

    let file = File::create(&args.output)
        .with_context(|| format!("Failed to create {}", args.output.display()))?;
    write_best_hits(BufWriter::new(file), &hits)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;

    info!(reads = stats.reads, hits = stats.hits, "Reduced {}", args.hits.display());

    let summary = BestHitsSummary {
        hits_file: args.hits.display().to_string(),
        output: args.output.display().to_string(),
        stats: &stats,
    };

    match format {
        OutputFormat::Text => {
            println!("Hits file:            {}", summary.hits_file);
            println!("Output:               {}", summary.output);
            println!("Hit rows:             {}", stats.hits);
            println!("Malformed rows:       {}", stats.malformed);
            println!("Unmapped accessions:  {}", stats.unmapped_accessions);
            println!("Reads with best hit:  {}", stats.reads);
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
        OutputFormat::Tsv => {
            println!("hits_file\toutput\thits\tmalformed\tunmapped_accessions\treads");
            println!(
                "{}\t{}\t{}\t{}\t{}\t{}",
                summary.hits_file,
                summary.output,
                stats.hits,
                stats.malformed,
                stats.unmapped_accessions,
                stats.reads
            );
        }
    }

    Ok(())
}
