//! Built-in and provider-specific extractors.
//!
//! `ical` and `email` are format extractors every profile can use; the
//! per-provider modules hold the extraction rules for one NSP's
//! notification shape each; `llm` is the generative fallback.

pub mod aws;
pub mod colt;
pub mod email;
pub mod equinix;
pub mod ical;
pub mod llm;
pub mod lumen;
pub mod zayo;

pub use aws::{SubjectParserAws, TextParserAws};
pub use colt::{CsvParserColt, SubjectParserColt1, SubjectParserColt2};
pub use email::EmailDateParser;
pub use equinix::{HtmlParserEquinix, SubjectParserEquinix};
pub use ical::ICalParser;
pub use llm::{LlmBackend, LlmError, LlmParser, LlmReply, OpenAiBackend, TokenUsage};
pub use lumen::HtmlParserLumen;
pub use zayo::{HtmlParserZayo, SubjectParserZayo};
