//! Extractors over e-mail header parts.
//!
//! Most provider notifications do not carry their issue time in the
//! body, so every combined profile registers [`EmailDateParser`] to
//! contribute `stamp` from the `Date:` header.

use circuitmaint_core::time;

use crate::data::{DataPart, PartKind};
use crate::diagnostics::Diagnostics;
use crate::fields::ExtractedFields;
use crate::parser::{Parser, ParserError};

/// Extractor turning the `Date:` header into the `stamp` field.
#[derive(Debug, Default)]
pub struct EmailDateParser;

impl Parser for EmailDateParser {
    fn name(&self) -> &'static str {
        "email-date"
    }

    fn data_kinds(&self) -> &'static [PartKind] {
        &[PartKind::EmailDate]
    }

    fn parse(
        &self,
        part: &DataPart,
        _diags: &mut Diagnostics,
    ) -> Result<Vec<ExtractedFields>, ParserError> {
        let raw = part.text();
        let stamp = time::parse_email_date(&raw)
            .ok_or_else(|| ParserError::BadTimestamp(raw.trim().to_string()))?;
        Ok(vec![ExtractedFields {
            stamp: Some(time::epoch(stamp)),
            ..Default::default()
        }])
    }
}
