//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and initializes logging
//! - parses CLI arguments
//! - reads or generates corpora
//! - runs the batch selection and prints/exports the report

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::cli::{Command, GenerateArgs, SelectArgs};
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `hmmsel` binary.
pub fn run() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    let cli = crate::cli::Cli::parse();

    let verbose = matches!(&cli.command, Command::Select(args) if args.verbose);
    init_logging(verbose);

    match cli.command {
        Command::Select(args) => handle_select(args),
        Command::Generate(args) => handle_generate(args),
    }
}

/// Log to stderr; `RUST_LOG` wins over the default level.
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init();
}

fn handle_select(args: SelectArgs) -> Result<(), AppError> {
    let corpus = crate::io::read_corpus_json(&args.corpus)?;
    let config = args.selection_config();
    let run = pipeline::run_selection(&corpus, &args.labels, args.selector, config)?;

    println!("{}", crate::report::format_run_summary(&run.report));

    if args.verbose {
        for result in &run.results {
            println!(
                "{}",
                crate::report::format_candidates(
                    &result.label,
                    result.outcome.best_components,
                    &result.outcome.candidates
                )
            );
        }
    }

    if let Some(path) = &args.export {
        crate::io::write_report_json(path, &run.report)?;
        tracing::info!(path = %path.display(), "report exported");
    }

    Ok(())
}

fn handle_generate(args: GenerateArgs) -> Result<(), AppError> {
    let corpus = crate::data::generate_corpus(&args.sample_spec())?;
    crate::io::write_corpus_json(&args.out, &corpus)?;
    println!(
        "Wrote {} labels x {} sequences to {}",
        corpus.len(),
        args.sequences,
        args.out.display()
    );
    Ok(())
}
