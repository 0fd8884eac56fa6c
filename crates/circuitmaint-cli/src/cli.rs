//! Command-line interface definition.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use circuitmaint_providers::PartKind;

/// circuitmaint - parse circuit maintenance notifications
#[derive(Debug, Parser)]
#[command(name = "circuitmaint")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Notification file to parse; reads stdin when omitted
    pub input: Option<PathBuf>,

    /// Provider profile to parse with
    #[arg(long, short, default_value = "generic")]
    pub provider: String,

    /// Treat the input as a complete RFC 5322 e-mail message
    #[arg(long, short, group = "input_shape")]
    pub email: bool,

    /// Treat the input as a single part of this format
    #[arg(long, short, value_enum, default_value = "calendar", group = "input_shape")]
    pub kind: KindArg,

    /// Include diagnostics in the JSON output
    #[arg(long)]
    pub diagnostics: bool,

    /// Enable debug output
    #[arg(long, short = 'v')]
    pub debug: bool,

    /// API key enabling the generative fallback extractor
    #[arg(long, env = "CIRCUITMAINT_LLM_API_KEY", hide_env_values = true)]
    pub llm_api_key: Option<String>,

    /// Model used by the generative fallback extractor
    #[arg(long, default_value = "gpt-4o-mini")]
    pub llm_model: String,

    /// OpenAI-compatible endpoint for the generative fallback extractor
    #[arg(long)]
    pub llm_endpoint: Option<String>,
}

/// The part formats selectable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    /// iCalendar payload
    Calendar,
    /// HTML document
    Html,
    /// Delimited tabular text
    Csv,
    /// Free-form text
    Text,
}

impl From<KindArg> for PartKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Calendar => PartKind::Calendar,
            KindArg::Html => PartKind::Html,
            KindArg::Csv => PartKind::Csv,
            KindArg::Text => PartKind::Text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser as _;

    #[test]
    fn defaults() {
        let cli = Cli::try_parse_from(["circuitmaint"]).unwrap();
        assert_eq!(cli.provider, "generic");
        assert_eq!(cli.kind, KindArg::Calendar);
        assert!(!cli.email);
        assert!(!cli.debug);
        assert!(cli.input.is_none());
    }

    #[test]
    fn provider_and_kind() {
        let cli =
            Cli::try_parse_from(["circuitmaint", "-p", "zayo", "-k", "html", "notice.html"])
                .unwrap();
        assert_eq!(cli.provider, "zayo");
        assert_eq!(cli.kind, KindArg::Html);
        assert_eq!(cli.input.unwrap().to_str(), Some("notice.html"));
    }

    #[test]
    fn email_and_kind_are_mutually_exclusive() {
        assert!(Cli::try_parse_from(["circuitmaint", "--email", "--kind", "html"]).is_err());
    }

    #[test]
    fn kind_mapping() {
        assert_eq!(PartKind::from(KindArg::Calendar), PartKind::Calendar);
        assert_eq!(PartKind::from(KindArg::Csv), PartKind::Csv);
    }
}
