mod script;
mod session;

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use rewind_config::HistorySettings;

use crate::session::Session;

/// Replays an undo/redo command script against a JSON state.
#[derive(Parser, Debug)]
#[command(name = "rewind", version, about)]
struct Cli {
    /// Script to run, one command per line. Reads stdin when omitted.
    script: Option<PathBuf>,

    /// Settings file. Defaults to the per-user settings location.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Observe these fields on independent timelines.
    #[arg(long, value_delimiter = ',')]
    fields: Option<Vec<String>>,

    /// Maximum combined length of past and future.
    #[arg(long)]
    limit: Option<usize>,

    /// Trace every history action.
    #[arg(long)]
    debug: bool,
}

impl Cli {
    /// File settings with command-line overrides applied.
    fn settings(&self) -> Result<HistorySettings> {
        let mut settings = match &self.config {
            Some(path) => HistorySettings::load(path)?,
            None => HistorySettings::load_or_create(&HistorySettings::settings_path())?,
        };
        if let Some(fields) = &self.fields {
            settings.fields = Some(fields.clone());
        }
        if let Some(limit) = self.limit {
            settings.limit = Some(i64::try_from(limit).context("limit is too large")?);
        }
        settings.debug |= self.debug;
        settings.validate()?;
        Ok(settings)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let default_filter = if cli.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .with_writer(io::stderr)
        .init();

    let settings = cli.settings()?;
    let mut session = Session::new(&settings)?;
    tracing::info!("Starting rewind");

    let reader: Box<dyn BufRead> = match &cli.script {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("Failed to open script {}", path.display()))?;
            Box::new(BufReader::new(file))
        }
        None => Box::new(io::stdin().lock()),
    };

    let mut out = io::stdout().lock();
    for (index, line) in reader.lines().enumerate() {
        let line = line.context("Failed to read script")?;
        let command = match script::parse_line(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                let message = format!("{e:#}");
                let reason = message.lines().next().unwrap_or_default();
                tracing::warn!("line {}: {reason}", index + 1);
                continue;
            }
        };

        let report = session.execute(command);
        let json = serde_json::to_string(&report).context("Failed to serialize report")?;
        writeln!(out, "{json}").context("Failed to write report")?;
    }

    Ok(())
}
