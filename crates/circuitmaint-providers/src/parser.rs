//! The format extractor abstraction.
//!
//! A [`Parser`] is a pure function from one [`DataPart`] to zero or
//! more [`ExtractedFields`] records. Extractors declare which part
//! kinds they accept, own no cross-call state, and report failure
//! through [`ParserError`]; the reconciliation engine converts those
//! errors into diagnostics so nothing escapes the public boundary.

use thiserror::Error;

use crate::data::{DataPart, PartKind};
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::fields::ExtractedFields;
use crate::tz::ResolutionError;

/// A format-specific extractor.
///
/// Implementations must be stateless between calls: everything an
/// invocation learns lives in its return value. Parsers that need
/// collaborators (the timezone resolver, a generative backend) hold
/// them behind shared references configured at construction time.
pub trait Parser: Send + Sync {
    /// Short identifier used in logs and diagnostics.
    fn name(&self) -> &'static str;

    /// The part kinds this extractor understands.
    fn data_kinds(&self) -> &'static [PartKind];

    /// Extracts zero or more field sets from one part.
    ///
    /// One part may describe several maintenance events (multiple
    /// calendar events, multiple table rows), hence the vector. An
    /// empty vector is a normal "nothing here" outcome. Non-fatal
    /// observations (a timezone that would not resolve, backend usage
    /// accounting) go into `diags`.
    ///
    /// # Errors
    ///
    /// Returns a [`ParserError`] when the content is malformed beyond
    /// partial extraction; the engine records it and moves on.
    fn parse(
        &self,
        part: &DataPart,
        diags: &mut Diagnostics,
    ) -> Result<Vec<ExtractedFields>, ParserError>;

    /// Whether this extractor accepts parts of the given kind.
    fn accepts(&self, kind: PartKind) -> bool {
        self.data_kinds().contains(&kind)
    }
}

/// An extraction failure for one (extractor, part) application.
#[derive(Debug, Error)]
pub enum ParserError {
    /// The content did not match the format the extractor expects.
    #[error("malformed {kind} content: {reason}")]
    Malformed {
        /// The part kind being parsed.
        kind: PartKind,
        /// What went wrong.
        reason: String,
    },

    /// A timestamp could not be understood.
    #[error("could not parse timestamp `{0}`")]
    BadTimestamp(String),

    /// An external extraction backend was unreachable or misbehaved.
    #[error("extraction backend unavailable: {0}")]
    Backend(String),

    /// A local time could not be anchored to a timezone.
    #[error(transparent)]
    Resolution(#[from] ResolutionError),
}

impl ParserError {
    /// Convenience constructor for [`ParserError::Malformed`].
    pub fn malformed(kind: PartKind, reason: impl Into<String>) -> Self {
        Self::Malformed {
            kind,
            reason: reason.into(),
        }
    }

    /// The diagnostic class this error maps to.
    pub fn diagnostic_kind(&self) -> DiagnosticKind {
        match self {
            Self::Backend(_) => DiagnosticKind::CapabilityFailure,
            Self::Resolution(_) => DiagnosticKind::ResolutionFailure,
            Self::Malformed { .. } | Self::BadTimestamp(_) => DiagnosticKind::ExtractionFailure,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoParser;

    impl Parser for EchoParser {
        fn name(&self) -> &'static str {
            "echo"
        }

        fn data_kinds(&self) -> &'static [PartKind] {
            &[PartKind::Text, PartKind::EmailSubject]
        }

        fn parse(
            &self,
            part: &DataPart,
            _diags: &mut Diagnostics,
        ) -> Result<Vec<ExtractedFields>, ParserError> {
            Ok(vec![ExtractedFields {
                summary: Some(part.text().into_owned()),
                ..Default::default()
            }])
        }
    }

    #[test]
    fn accepts_declared_kinds_only() {
        let parser = EchoParser;
        assert!(parser.accepts(PartKind::Text));
        assert!(parser.accepts(PartKind::EmailSubject));
        assert!(!parser.accepts(PartKind::Calendar));
    }

    #[test]
    fn error_to_diagnostic_mapping() {
        assert_eq!(
            ParserError::malformed(PartKind::Html, "no tables").diagnostic_kind(),
            DiagnosticKind::ExtractionFailure
        );
        assert_eq!(
            ParserError::Backend("connection refused".to_string()).diagnostic_kind(),
            DiagnosticKind::CapabilityFailure
        );
        assert_eq!(
            ParserError::Resolution(ResolutionError::UnknownPlace("Atlantis".to_string()))
                .diagnostic_kind(),
            DiagnosticKind::ResolutionFailure
        );
    }
}
