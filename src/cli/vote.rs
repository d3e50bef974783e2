use anyhow::Context;
use clap::Args;

use crate::cli::{ConfigArgs, OutputFormat};
use crate::consensus::{MultiLevelVoter, VotingReport};
use crate::core::lineage::Lineage;
use crate::core::rank::RankOrder;
use crate::core::types::ClassificationOutcome;

#[derive(Args)]
pub struct VoteArgs {
    /// Lineages written as rank:taxid,rank:taxid (use NA for an unclassified call)
    #[arg(required = true, num_args = 1..)]
    pub lineages: Vec<String>,

    #[command(flatten)]
    pub config: ConfigArgs,
}

/// Execute vote subcommand
///
/// # Errors
///
/// Returns an error if a lineage cannot be parsed against the rank order.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: VoteArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let config = args.config.load()?;
    let lineages = parse_lineages(&args.lineages, &config.ranks)?;

    if verbose {
        eprintln!("Voting over {} lineage(s) with ranks {}", lineages.len(), config.ranks);
    }

    let report = MultiLevelVoter::new(&config.ranks).vote(&lineages);

    match format {
        OutputFormat::Text => print_text_report(&report, lineages.len()),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Tsv => print_tsv_report(&report, lineages.len()),
    }

    Ok(())
}

fn parse_lineages(texts: &[String], ranks: &RankOrder) -> anyhow::Result<Vec<Lineage>> {
    texts
        .iter()
        .map(|text| {
            Lineage::parse(text, ranks).with_context(|| format!("Invalid lineage '{text}'"))
        })
        .collect()
}

fn print_text_report(report: &VotingReport, total: usize) {
    println!("Outcome:  {}", report.outcome);
    if let Some(call) = report.outcome.classification() {
        println!(
            "Votes:    {}/{} ({}%)",
            call.votes,
            total,
            call.percent_of(total)
        );
        println!("Lineage:  {}", call.lineage);
    }
    println!("Rounds:   {}", report.rounds);
    if !report.pruned_ranks.is_empty() {
        println!("Pruned:   {}", report.pruned_ranks.join(", "));
    }
}

fn print_tsv_report(report: &VotingReport, total: usize) {
    println!("status\trank\ttaxid\tvotes\tpercent\trounds\tpruned\tlineage");
    let status = match report.outcome {
        ClassificationOutcome::Unclassified => "unclassified",
        ClassificationOutcome::Disagreement => "disagreement",
        ClassificationOutcome::Classified(_) => "classified",
    };
    let call = report.outcome.classification();
    println!(
        "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
        status,
        call.map_or("NA".to_string(), |c| c.rank.clone()),
        call.map_or("NA".to_string(), |c| c.taxon_id.to_string()),
        report.outcome.votes(),
        call.map_or(0, |c| c.percent_of(total)),
        report.rounds,
        report.pruned_ranks.join(","),
        call.map_or("NA".to_string(), |c| c.lineage.to_string()),
    );
}
