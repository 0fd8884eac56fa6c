//! Notification decomposition, format extractors, and reconciliation.
//!
//! This crate turns one provider notification — an iCalendar payload,
//! an HTML e-mail, a CSV attachment, free text, or a whole MIME
//! message — into validated canonical `Maintenance` records:
//!
//! ```text
//! raw bytes
//!     │
//!     ▼
//! ┌──────────────────┐   NotificationData::from_email_bytes / ::new
//! │ NotificationData │   ordered DataParts tagged by format
//! └────────┬─────────┘
//!          │  Provider filters (include/exclude)
//!          ▼
//! ┌──────────────────┐   SimpleProcessor / CombinedProcessor over an
//! │    Processor     │   ordered Parser list; pools and merges the
//! └────────┬─────────┘   ExtractedFields every parser contributed
//!          │  provider defaults, then validation
//!          ▼
//!   Vec<Maintenance> + Vec<Diagnostic>
//! ```
//!
//! Nothing in here panics or errors across the public boundary:
//! [`Provider::get_maintenances`] always returns an outcome, with
//! whatever went wrong described in its diagnostics.
//!
//! # Example
//!
//! ```
//! use circuitmaint_providers::{registry, NotificationData, PartKind};
//!
//! let ical = "BEGIN:VCALENDAR\r\nBEGIN:VEVENT\r\nUID:1\r\n\
//!             ORGANIZER:noc@example.net\r\n\
//!             DTSTART:20151010T080000Z\r\nDTEND:20151010T100000Z\r\n\
//!             DTSTAMP:20151010T001000Z\r\n\
//!             X-MAINTNOTE-PROVIDER:example.net\r\n\
//!             X-MAINTNOTE-ACCOUNT:ACC-1\r\n\
//!             X-MAINTNOTE-MAINTENANCE-ID:WO-1\r\n\
//!             X-MAINTNOTE-IMPACT:OUTAGE\r\n\
//!             X-MAINTNOTE-OBJECT-ID:circ-1\r\n\
//!             X-MAINTNOTE-STATUS:CONFIRMED\r\n\
//!             END:VEVENT\r\nEND:VCALENDAR\r\n";
//!
//! let provider = registry::build("generic").expect("registered profile");
//! let outcome = provider.get_maintenances(&NotificationData::new(PartKind::Calendar, ical));
//! assert_eq!(outcome.maintenances.len(), 1);
//! ```

pub mod data;
pub mod diagnostics;
pub mod fields;
pub mod html;
pub mod parser;
pub mod parsers;
pub mod processor;
pub mod provider;
pub mod registry;
pub mod tz;

// Re-export main types at crate root
pub use data::{DataPart, NotificationData, PartKind};
pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
pub use fields::ExtractedFields;
pub use parser::{Parser, ParserError};
pub use parsers::{
    EmailDateParser, ICalParser, LlmBackend, LlmError, LlmParser, LlmReply, OpenAiBackend,
    TokenUsage,
};
pub use processor::{CombinedProcessor, Processor, SimpleProcessor};
pub use provider::{ParseOutcome, Provider};
pub use tz::{GeoBackend, OpenMeteoBackend, ResolutionError, TimezoneResolver};
