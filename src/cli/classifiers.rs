use clap::Args;

use crate::cli::{ConfigArgs, OutputFormat};
use crate::parsing::classifier::ClassifierFormat;

#[derive(Args)]
pub struct ClassifiersArgs {
    #[command(flatten)]
    pub config: ConfigArgs,
}

/// Execute classifiers subcommand
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: ClassifiersArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let config = args.config.load()?;

    if verbose {
        eprintln!("Rank order: {}", config.ranks);
    }

    match format {
        OutputFormat::Text => {
            let name_width = config
                .classifiers
                .iter()
                .map(|f| f.name.len())
                .max()
                .unwrap_or(4)
                .max(4);

            println!("Classifier formats ({})\n", config.classifiers.len());
            println!(
                "{:<name_w$} {:>6} {:>6} {:>8} {:>6} {:>9}",
                "Name",
                "Read",
                "TaxId",
                "Fallback",
                "Header",
                "Delimiter",
                name_w = name_width
            );
            println!("{}", "-".repeat(name_width + 42));
            for f in config.classifiers.iter() {
                println!(
                    "{:<name_w$} {:>6} {:>6} {:>8} {:>6} {:>9}",
                    f.name,
                    f.read_column,
                    f.taxid_column,
                    f.fallback_taxid_column
                        .map_or("-".to_string(), |c| c.to_string()),
                    if f.has_header { "yes" } else { "no" },
                    delimiter_label(f),
                    name_w = name_width
                );
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&config.classifiers)?);
        }
        OutputFormat::Tsv => {
            println!("name\tread_column\ttaxid_column\tfallback_taxid_column\thas_header\tdelimiter\talternate_lines");
            for f in config.classifiers.iter() {
                println!(
                    "{}\t{}\t{}\t{}\t{}\t{}\t{}",
                    f.name,
                    f.read_column,
                    f.taxid_column,
                    f.fallback_taxid_column
                        .map_or("NA".to_string(), |c| c.to_string()),
                    f.has_header,
                    delimiter_label(f),
                    f.alternate_lines
                );
            }
        }
    }

    Ok(())
}

fn delimiter_label(format: &ClassifierFormat) -> String {
    match format.delimiter {
        '\t' => "tab".to_string(),
        ' ' => "space".to_string(),
        c => c.to_string(),
    }
}
