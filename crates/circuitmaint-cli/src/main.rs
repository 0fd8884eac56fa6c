//! `circuitmaint` binary: file or stdin in, canonical JSON out.

mod cli;

use std::io::Read;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser as _;
use thiserror::Error;
use tracing::{debug, warn};

use circuitmaint_core::{TracingConfig, init_tracing};
use circuitmaint_providers::{NotificationData, OpenAiBackend, registry};

use crate::cli::Cli;

#[derive(Debug, Error)]
enum CliError {
    #[error("could not read {path}: {source}")]
    Input {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("unknown provider `{0}` (see --help for the registered names)")]
    UnknownProvider(String),

    #[error("could not serialize output: {0}")]
    Output(#[from] serde_json::Error),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let tracing_config = if cli.debug {
        TracingConfig::cli_debug()
    } else {
        TracingConfig::default()
    };
    if let Err(err) = init_tracing(tracing_config) {
        eprintln!("warning: {err}");
    }

    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(2)
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode, CliError> {
    let raw = read_input(cli.input.as_deref())?;

    let mut provider = registry::build(&cli.provider)
        .ok_or_else(|| CliError::UnknownProvider(cli.provider.clone()))?;

    if let Some(api_key) = &cli.llm_api_key {
        let backend = match &cli.llm_endpoint {
            Some(endpoint) => OpenAiBackend::with_endpoint(endpoint, &cli.llm_model, api_key),
            None => OpenAiBackend::new(&cli.llm_model, api_key),
        };
        provider = provider.with_llm_backend(Arc::new(backend));
    }

    let data = if cli.email {
        NotificationData::from_email_bytes(&raw)
    } else {
        NotificationData::new(cli.kind.into(), raw)
    };

    let outcome = provider.get_maintenances(&data);
    for diagnostic in &outcome.diagnostics {
        debug!(?diagnostic.kind, parser = ?diagnostic.parser, "{}", diagnostic.message);
    }
    if outcome.is_empty() && !outcome.diagnostics.is_empty() {
        warn!(
            provider = provider.name(),
            diagnostics = outcome.diagnostics.len(),
            "no maintenance records extracted"
        );
    }

    let rendered = if cli.diagnostics {
        serde_json::to_string_pretty(&serde_json::json!({
            "maintenances": outcome.maintenances,
            "diagnostics": outcome.diagnostics,
        }))?
    } else {
        serde_json::to_string_pretty(&outcome.maintenances)?
    };
    println!("{rendered}");

    Ok(ExitCode::SUCCESS)
}

fn read_input(path: Option<&std::path::Path>) -> Result<Vec<u8>, CliError> {
    match path {
        Some(path) => std::fs::read(path).map_err(|source| CliError::Input {
            path: path.display().to_string(),
            source,
        }),
        None => {
            let mut buffer = Vec::new();
            std::io::stdin()
                .read_to_end(&mut buffer)
                .map_err(|source| CliError::Input {
                    path: "<stdin>".to_string(),
                    source,
                })?;
            Ok(buffer)
        }
    }
}
