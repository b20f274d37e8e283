use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use typebleed::cli::{Cli, OutputFormat};
use typebleed::config::EngineConfig;
use typebleed::inference::Vocabulary;
use typebleed::json_output::{ReconstructionReport, ReportOptions, SessionReconstruction, SessionsReport};
use typebleed::replay;
use typebleed::text_output::TextReport;

/// Exit status when the source was read but held no sessions
const EXIT_NO_DATA: u8 = 2;

/// Initialize tracing subscriber for debug output
fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::DEBUG.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }
}

/// Load the sessions snapshot from whichever source was selected
fn load_sessions(
    args: &Cli,
    vocabulary: &Vocabulary,
    config: &EngineConfig,
) -> Result<SessionsReport> {
    match (&args.log, &args.api) {
        (Some(path), None) => {
            let outcome = replay::replay_file(path)?;
            tracing::debug!(
                lines = outcome.stats.lines_read,
                ingested = outcome.stats.records_ingested,
                skipped = outcome.stats.skipped_lines,
                "replayed log file"
            );
            // Per-category words are computed per session below
            let options =
                ReportOptions::without_words(vocabulary, config.client_identifier_max_len);
            Ok(outcome.into_report(&options))
        }
        (None, Some(url)) => Ok(replay::fetch_sessions(url)?),
        (Some(_), Some(_)) => {
            anyhow::bail!("Cannot specify both --log and --api. Choose one.");
        }
        (None, None) => {
            anyhow::bail!("Must specify either --log FILE or --api URL.");
        }
    }
}

fn main() -> Result<ExitCode> {
    let args = Cli::parse();

    init_tracing(args.debug);

    let mut config = match &args.config {
        Some(path) => EngineConfig::from_toml(path)?,
        None => EngineConfig::default(),
    };
    if let Some(path) = &args.vocabulary {
        config.vocabulary_path = Some(path.clone());
    }
    let vocabulary = config.load_vocabulary()?;

    let report = load_sessions(&args, &vocabulary, &config)?;
    if report.is_empty() {
        eprintln!("[-] No session data found.");
        return Ok(ExitCode::from(EXIT_NO_DATA));
    }

    let categories: Vec<&str> = args.categories.iter().map(String::as_str).collect();
    let categories = (!categories.is_empty()).then_some(categories.as_slice());
    let limit = args.limit.unwrap_or(config.replay_word_limit);

    let reconstructions = report
        .sessions
        .iter()
        .map(|view| SessionReconstruction::from_view(view, &vocabulary, categories, Some(limit)));

    match args.format {
        OutputFormat::Json => {
            let mut output = ReconstructionReport::new();
            for session in reconstructions {
                output.add_session(session);
            }
            println!("{}", output.to_json()?);
        }
        OutputFormat::Text => {
            let mut output = TextReport::new(args.verbose);
            for session in reconstructions {
                output.add_session(session);
            }
            print!("{}", output.to_text());
        }
    }

    Ok(ExitCode::SUCCESS)
}
