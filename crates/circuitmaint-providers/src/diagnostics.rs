//! Diagnostics collected alongside a parse.
//!
//! Nothing in the pipeline raises across the public boundary; whatever
//! goes wrong on the way is recorded here and handed back next to the
//! (possibly empty) list of valid records.

use serde::Serialize;

/// The failure class of one [`Diagnostic`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// One extractor/part combination failed; extraction continued.
    ExtractionFailure,
    /// A merged field group could not form a valid record and was dropped.
    ValidationFailure,
    /// The provider filter rejected the notification. Not an error.
    IrrelevantNotification,
    /// The timezone resolver could not place a local time; the affected
    /// field was left unset.
    ResolutionFailure,
    /// An external extraction backend was unreachable.
    CapabilityFailure,
}

/// One recorded observation about a parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// The failure class.
    pub kind: DiagnosticKind,
    /// The extractor involved, when one was.
    pub parser: Option<String>,
    /// Human-readable description.
    pub message: String,
}

/// Collection of diagnostics scoped to one parse invocation.
#[derive(Debug, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    /// Creates an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one diagnostic.
    pub fn record(
        &mut self,
        kind: DiagnosticKind,
        parser: Option<&str>,
        message: impl Into<String>,
    ) {
        self.entries.push(Diagnostic {
            kind,
            parser: parser.map(str::to_string),
            message: message.into(),
        });
    }

    /// The recorded diagnostics, in order.
    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    /// Consumes the collection.
    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.entries
    }

    /// Returns true when nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
