use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

use crate::cli::{ConfigArgs, OutputFormat};
use crate::consensus::{MultiLevelVoter, VotingReport};
use crate::core::lineage::Lineage;
use crate::core::types::{Classification, ClassificationOutcome};
use crate::parsing::classifier::load_classifier_output;
use crate::parsing::manifest::{parse_manifest_file, ReadSet};
use crate::parsing::reads::read_names;
use crate::taxonomy::{LineageResolver, NcbiTaxonomy};
use crate::utils::validation::output_prefix;

const LOG_FILE: &str = "log.txt";
const FILE_RULE: &str = "<=========================================================>";
const READ_RULE: &str = "<------------------------------------------------------------------>";

#[derive(Args)]
pub struct ClassifyArgs {
    /// Manifest listing reads files and the classifier outputs for each
    #[arg(required = true)]
    pub manifest: PathBuf,

    /// Directory for the result files (created if missing)
    #[arg(required = true)]
    pub outdir: PathBuf,

    /// NCBI taxdump directory containing nodes.dmp and names.dmp
    #[arg(long, env = "METATAX_TAXDUMP")]
    pub taxdump: PathBuf,

    /// Write a detailed per-read log to <outdir>/log.txt (can be very large)
    #[arg(long)]
    pub log: bool,

    /// Report only the deepest rank of each call instead of the full lineage
    #[arg(long)]
    pub deepest_only: bool,

    /// Worker threads for voting (defaults to all cores)
    #[arg(short, long)]
    pub threads: Option<usize>,

    #[command(flatten)]
    pub config: ConfigArgs,
}

/// Counts for one reads file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReadSetSummary {
    pub reads_file: String,
    pub prefix: String,
    pub classifiers: usize,
    pub reads: usize,
    pub classified: usize,
    pub disagreement: usize,
    pub unclassified: usize,
}

/// Vote for one read; `report` is `None` when no classifier placed the read
struct ReadResult {
    read: String,
    calls: Vec<(String, Lineage)>,
    report: Option<VotingReport>,
}

impl ReadResult {
    fn outcome(&self) -> &ClassificationOutcome {
        static UNCLASSIFIED: ClassificationOutcome = ClassificationOutcome::Unclassified;
        self.report.as_ref().map_or(&UNCLASSIFIED, |r| &r.outcome)
    }
}

/// Execute classify subcommand
///
/// # Errors
///
/// Returns an error if any input is missing or malformed, or if the output
/// directory cannot be written.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: ClassifyArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let config = args.config.load()?;

    let read_sets = parse_manifest_file(&args.manifest, &config.classifiers)
        .with_context(|| format!("Failed to read manifest {}", args.manifest.display()))?;

    std::fs::create_dir_all(&args.outdir)
        .with_context(|| format!("Failed to create {}", args.outdir.display()))?;

    let taxonomy = NcbiTaxonomy::load_dir(&args.taxdump, config.ranks.clone())
        .with_context(|| format!("Failed to load taxonomy from {}", args.taxdump.display()))?;

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(args.threads.unwrap_or(0))
        .build()
        .context("Failed to initialize thread pool")?;

    if verbose {
        eprintln!(
            "Loaded {} taxa; {} reads file(s); {} thread(s)",
            taxonomy.taxa_count(),
            read_sets.len(),
            pool.current_num_threads()
        );
    }

    let mut log = if args.log {
        let path = args.outdir.join(LOG_FILE);
        let file = File::create(&path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        Some(BufWriter::new(file))
    } else {
        None
    };

    let voter = MultiLevelVoter::new(taxonomy.ranks());
    let mut summaries = Vec::with_capacity(read_sets.len());

    for set in &read_sets {
        let summary = classify_read_set(
            set,
            &args,
            &taxonomy,
            &voter,
            &pool,
            log.as_mut().map(|w| w as &mut dyn Write),
        )?;
        info!(
            reads = summary.reads,
            classified = summary.classified,
            disagreement = summary.disagreement,
            unclassified = summary.unclassified,
            "Finished {}",
            summary.reads_file
        );
        summaries.push(summary);
    }

    if let Some(mut writer) = log {
        writer.flush().context("Failed to write log")?;
    }

    match format {
        OutputFormat::Text => print_text_summary(&summaries, &args.outdir),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summaries)?),
        OutputFormat::Tsv => print_tsv_summary(&summaries),
    }

    Ok(())
}

fn classify_read_set(
    set: &ReadSet,
    args: &ClassifyArgs,
    taxonomy: &NcbiTaxonomy,
    voter: &MultiLevelVoter<'_>,
    pool: &rayon::ThreadPool,
    mut log: Option<&mut dyn Write>,
) -> anyhow::Result<ReadSetSummary> {
    let prefix = output_prefix(&set.reads)
        .with_context(|| format!("Invalid reads file name {}", set.reads.display()))?;

    if let Some(log) = log.as_mut() {
        writeln!(log, "{FILE_RULE}")?;
        writeln!(log, "Analyzing read file: {}", set.reads.display())?;
        writeln!(log, "Classifiers:")?;
        for c in &set.classifiers {
            writeln!(log, "\t{}\t->\t{}", c.name, c.path.display())?;
        }
    }

    let outputs: Vec<HashMap<String, Lineage>> = pool.install(|| {
        set.classifiers
            .par_iter()
            .map(|c| {
                load_classifier_output(&c.path, &c.format, taxonomy).with_context(|| {
                    format!("Failed to load {} output {}", c.name, c.path.display())
                })
            })
            .collect::<anyhow::Result<Vec<_>>>()
    })?;

    let names = read_names(&set.reads)
        .with_context(|| format!("Failed to read {}", set.reads.display()))?;
    debug!(reads = names.len(), "Read names from {}", set.reads.display());

    let results: Vec<ReadResult> = pool.install(|| {
        names
            .into_par_iter()
            .map(|read| vote_read(read, set, &outputs, voter))
            .collect()
    });

    let summary = write_results(set, &prefix, &results, args, taxonomy)?;

    if let Some(log) = log {
        for result in &results {
            write_log_entry(log, result)?;
        }
        writeln!(log, "{FILE_RULE}")?;
    }

    Ok(summary)
}

fn vote_read(
    read: String,
    set: &ReadSet,
    outputs: &[HashMap<String, Lineage>],
    voter: &MultiLevelVoter<'_>,
) -> ReadResult {
    let calls: Vec<(String, Lineage)> = set
        .classifiers
        .iter()
        .zip(outputs)
        .filter_map(|(c, output)| {
            output
                .get(&read)
                .filter(|lineage| !lineage.is_na())
                .map(|lineage| (c.name.clone(), lineage.clone()))
        })
        .collect();

    let report = if calls.is_empty() {
        None
    } else {
        let lineages: Vec<Lineage> = calls.iter().map(|(_, l)| l.clone()).collect();
        Some(voter.vote(&lineages))
    };

    ReadResult {
        read,
        calls,
        report,
    }
}

fn create_output(outdir: &Path, prefix: &str, suffix: &str) -> anyhow::Result<BufWriter<File>> {
    let path = outdir.join(format!("{prefix}_{suffix}"));
    let file =
        File::create(&path).with_context(|| format!("Failed to create {}", path.display()))?;
    Ok(BufWriter::new(file))
}

fn write_results(
    set: &ReadSet,
    prefix: &str,
    results: &[ReadResult],
    args: &ClassifyArgs,
    taxonomy: &NcbiTaxonomy,
) -> anyhow::Result<ReadSetSummary> {
    let mut classified = create_output(&args.outdir, prefix, "classified.tsv")?;
    let mut disagreement = create_output(&args.outdir, prefix, "disagreement.tsv")?;
    let mut unclassified = create_output(&args.outdir, prefix, "NAs.tsv")?;

    let last_column = if args.deepest_only {
        "Lineage"
    } else {
        "FullLineage"
    };
    writeln!(
        classified,
        "Read\tToolsN\tTotalClassif\tVotes\tPercentVotes\t{last_column}"
    )?;

    let tools = set.classifiers.len();
    let mut summary = ReadSetSummary {
        reads_file: set.reads.display().to_string(),
        prefix: prefix.to_string(),
        classifiers: tools,
        reads: results.len(),
        ..ReadSetSummary::default()
    };

    for result in results {
        match result.outcome() {
            ClassificationOutcome::Classified(call) => {
                summary.classified += 1;
                writeln!(
                    classified,
                    "{}\t{}\t{}\t{}\t{}\t{}",
                    result.read,
                    tools,
                    result.calls.len(),
                    call.votes,
                    call.percent_of(tools),
                    format_call(call, taxonomy, args.deepest_only)
                )?;
            }
            ClassificationOutcome::Disagreement => {
                summary.disagreement += 1;
                writeln!(disagreement, "{}", result.read)?;
            }
            ClassificationOutcome::Unclassified => {
                summary.unclassified += 1;
                writeln!(unclassified, "{}", result.read)?;
            }
        }
    }

    for writer in [&mut classified, &mut disagreement, &mut unclassified] {
        writer.flush()?;
    }

    Ok(summary)
}

/// `rank|name|id` entries, tab separated, broadest first
fn format_call(call: &Classification, taxonomy: &NcbiTaxonomy, deepest_only: bool) -> String {
    let entry = |rank: &str, taxon| {
        let name = taxonomy.scientific_name(taxon).unwrap_or("NA");
        format!("{rank}|{name}|{taxon}")
    };

    if deepest_only {
        entry(&call.rank, call.taxon_id)
    } else {
        call.lineage
            .iter()
            .map(|(rank, taxon)| entry(rank, taxon))
            .collect::<Vec<_>>()
            .join("\t")
    }
}

fn write_log_entry(log: &mut dyn Write, result: &ReadResult) -> std::io::Result<()> {
    writeln!(log, "{READ_RULE}")?;
    writeln!(log, "Classifying read '{}'", result.read)?;

    let Some(report) = &result.report else {
        writeln!(log, "Read without classification: NA")?;
        return Ok(());
    };

    for (classifier, lineage) in &result.calls {
        writeln!(log, "Classification according to {classifier}: {lineage}")?;
    }
    if !report.pruned_ranks.is_empty() {
        writeln!(
            log,
            "Pruned after ties: {} ({} rounds)",
            report.pruned_ranks.join(", "),
            report.rounds
        )?;
    }
    writeln!(
        log,
        "Final classification: {} with {} votes",
        report.outcome,
        report.outcome.votes()
    )
}

fn print_text_summary(summaries: &[ReadSetSummary], outdir: &Path) {
    println!("Consensus classification ({} reads file(s))\n", summaries.len());

    let name_width = summaries
        .iter()
        .map(|s| s.prefix.len())
        .max()
        .unwrap_or(10)
        .max(10);

    println!(
        "{:<name_w$} {:>11} {:>10} {:>12} {:>12} {:>12}",
        "Reads file",
        "Classifiers",
        "Reads",
        "Classified",
        "Disagreement",
        "Unclassified",
        name_w = name_width
    );
    println!("{}", "-".repeat(name_width + 62));

    for s in summaries {
        println!(
            "{:<name_w$} {:>11} {:>10} {:>12} {:>12} {:>12}",
            s.prefix,
            s.classifiers,
            s.reads,
            s.classified,
            s.disagreement,
            s.unclassified,
            name_w = name_width
        );
    }

    println!("\nResults written to {}", outdir.display());
}

fn print_tsv_summary(summaries: &[ReadSetSummary]) {
    println!("reads_file\tprefix\tclassifiers\treads\tclassified\tdisagreement\tunclassified");
    for s in summaries {
        println!(
            "{}\t{}\t{}\t{}\t{}\t{}\t{}",
            s.reads_file,
            s.prefix,
            s.classifiers,
            s.reads,
            s.classified,
            s.disagreement,
            s.unclassified
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::lineage::TaxonId;
    use crate::core::rank::RankOrder;
    use crate::parsing::classifier::ClassifierFormat;
    use crate::parsing::manifest::ClassifierInput;
    use crate::taxonomy::ncbi::fixtures::taxonomy;

    fn read_set(names: &[&str]) -> ReadSet {
        ReadSet {
            reads: PathBuf::from("reads.fq"),
            classifiers: names
                .iter()
                .map(|name| ClassifierInput {
                    name: (*name).to_string(),
                    format: ClassifierFormat {
                        name: (*name).to_string(),
                        read_column: 0,
                        taxid_column: 1,
                        fallback_taxid_column: None,
                        has_header: false,
                        delimiter: '\t',
                        alternate_lines: false,
                    },
                    path: PathBuf::from(format!("{name}.tsv")),
                })
                .collect(),
        }
    }

    fn output(entries: &[(&str, Lineage)]) -> HashMap<String, Lineage> {
        entries
            .iter()
            .map(|(read, lineage)| ((*read).to_string(), lineage.clone()))
            .collect()
    }

    #[test]
    fn test_vote_read_skips_missing_and_na() {
        let taxonomy = taxonomy();
        let ranks = RankOrder::default();
        let voter = MultiLevelVoter::new(&ranks);
        let set = read_set(&["clark", "kraken", "onecodex"]);
        let outputs = vec![
            output(&[("r1", taxonomy.resolve(TaxonId(562)))]),
            output(&[("r1", Lineage::na())]),
            output(&[("r2", taxonomy.resolve(TaxonId(562)))]),
        ];

        let result = vote_read("r1".to_string(), &set, &outputs, &voter);
        assert_eq!(result.calls.len(), 1);
        assert_eq!(result.calls[0].0, "clark");
        assert_eq!(result.outcome().votes(), 1);

        let result = vote_read("r3".to_string(), &set, &outputs, &voter);
        assert!(result.calls.is_empty());
        assert!(result.report.is_none());
        assert_eq!(result.outcome(), &ClassificationOutcome::Unclassified);
    }

    #[test]
    fn test_format_call() {
        let taxonomy = taxonomy();
        let ranks = RankOrder::default();
        let voter = MultiLevelVoter::new(&ranks);
        let outcome = voter.classify(&[taxonomy.resolve(TaxonId(561))]);
        let call = outcome.classification().unwrap();

        assert_eq!(format_call(call, &taxonomy, true), "genus|Escherichia|561");
        let full = format_call(call, &taxonomy, false);
        assert!(full.starts_with("superkingdom|Bacteria|2\tphylum|Pseudomonadota|1224"));
        assert!(full.ends_with("genus|Escherichia|561"));
        assert_eq!(full.split('\t').count(), 6);
    }

    #[test]
    fn test_log_entry() {
        let taxonomy = taxonomy();
        let ranks = RankOrder::default();
        let voter = MultiLevelVoter::new(&ranks);
        let set = read_set(&["clark", "kraken"]);
        let outputs = vec![
            output(&[("r1", taxonomy.resolve(TaxonId(562)))]),
            output(&[("r1", taxonomy.resolve(TaxonId(28901)))]),
        ];
        let result = vote_read("r1".to_string(), &set, &outputs, &voter);

        let mut buffer = Vec::new();
        write_log_entry(&mut buffer, &result).unwrap();
        let text = String::from_utf8(buffer).unwrap();

        assert!(text.contains("Classifying read 'r1'"));
        assert!(text.contains("Classification according to kraken: "));
        assert!(text.contains("Pruned after ties: species, genus (3 rounds)"));
        assert!(text.contains("Final classification: family: 543 with 2 votes"));
    }
}
