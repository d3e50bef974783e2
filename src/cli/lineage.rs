use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

use crate::cli::{ConfigArgs, OutputFormat};
use crate::core::lineage::TaxonId;
use crate::taxonomy::{LineageResolver, NcbiTaxonomy};

#[derive(Args)]
pub struct LineageArgs {
    /// NCBI taxon ids to resolve
    #[arg(required = true, num_args = 1..)]
    pub taxids: Vec<u32>,

    /// NCBI taxdump directory containing nodes.dmp and names.dmp
    #[arg(long, env = "METATAX_TAXDUMP")]
    pub taxdump: PathBuf,

    #[command(flatten)]
    pub config: ConfigArgs,
}

/// Execute lineage subcommand
///
/// # Errors
///
/// Returns an error if the configuration or taxonomy cannot be loaded.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: LineageArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let config = args.config.load()?;
    let taxonomy = NcbiTaxonomy::load_dir(&args.taxdump, config.ranks)
        .with_context(|| format!("Failed to load taxonomy from {}", args.taxdump.display()))?;

    if verbose {
        eprintln!("Loaded taxonomy with {} taxa", taxonomy.taxa_count());
    }

    match format {
        OutputFormat::Text => print_text(&args.taxids, &taxonomy),
        OutputFormat::Json => print_json(&args.taxids, &taxonomy)?,
        OutputFormat::Tsv => print_tsv(&args.taxids, &taxonomy),
    }

    Ok(())
}

fn name_of(taxonomy: &NcbiTaxonomy, taxon: TaxonId) -> &str {
    taxonomy.scientific_name(taxon).unwrap_or("NA")
}

fn print_text(taxids: &[u32], taxonomy: &NcbiTaxonomy) {
    for &id in taxids {
        let taxon = TaxonId(id);
        let lineage = taxonomy.resolve(taxon);
        println!("{} ({})", taxon, name_of(taxonomy, taxon));

        if lineage.is_na() {
            println!("  NA");
            continue;
        }
        for (rank, t) in lineage.iter() {
            println!("  {:<14} {:>10}  {}", rank, t.0, name_of(taxonomy, t));
        }
    }
}

fn print_json(taxids: &[u32], taxonomy: &NcbiTaxonomy) -> anyhow::Result<()> {
    let output: Vec<serde_json::Value> = taxids
        .iter()
        .map(|&id| {
            let taxon = TaxonId(id);
            let lineage = taxonomy.resolve(taxon);
            let entries: Vec<serde_json::Value> = if lineage.is_na() {
                Vec::new()
            } else {
                lineage
                    .iter()
                    .map(|(rank, t)| {
                        serde_json::json!({
                            "rank": rank,
                            "taxid": t,
                            "name": taxonomy.scientific_name(t),
                        })
                    })
                    .collect()
            };
            serde_json::json!({
                "taxid": taxon,
                "canonical_taxid": taxonomy.canonical(taxon),
                "name": taxonomy.scientific_name(taxon),
                "classified": !lineage.is_na(),
                "lineage": entries,
            })
        })
        .collect();

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn print_tsv(taxids: &[u32], taxonomy: &NcbiTaxonomy) {
    println!("taxid\tname\tlineage");
    for &id in taxids {
        let taxon = TaxonId(id);
        let lineage = taxonomy.resolve(taxon);
        let text = if lineage.is_na() {
            "NA".to_string()
        } else {
            lineage
                .iter()
                .map(|(rank, t)| format!("{rank}|{}|{t}", name_of(taxonomy, t)))
                .collect::<Vec<_>>()
                .join("\t")
        };
        println!("{}\t{}\t{}", taxon, name_of(taxonomy, taxon), text);
    }
}
