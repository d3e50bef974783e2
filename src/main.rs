use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod config;
mod consensus;
mod core;
mod parsing;
mod taxonomy;
mod utils;

fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();

    // Initialize logging based on verbosity flag
    let filter = if cli.verbose {
        EnvFilter::new("metatax=debug,info")
    } else {
        EnvFilter::new("metatax=warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        cli::Commands::Classify(args) => {
            cli::classify::run(args, cli.format, cli.verbose)?;
        }
        cli::Commands::Vote(args) => {
            cli::vote::run(args, cli.format, cli.verbose)?;
        }
        cli::Commands::Lineage(args) => {
            cli::lineage::run(args, cli.format, cli.verbose)?;
        }
        cli::Commands::Classifiers(args) => {
            cli::classifiers::run(args, cli.format, cli.verbose)?;
        }
        cli::Commands::BestHits(args) => {
            cli::best_hits::run(args, cli.format, cli.verbose)?;
        }
    }

    Ok(())
}
