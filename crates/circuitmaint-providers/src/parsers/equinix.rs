//! Equinix notification extractors.
//!
//! Equinix writes the maintenance window in the local civil time of the
//! affected metro ("2021-08-10 03:00 - 2021-08-10 07:00 Singapore"),
//! which makes this the one shipped extractor that needs the timezone
//! resolver. A resolution failure is recorded and the record goes out
//! partial — without the window — rather than being dropped here.

use std::sync::Arc;

use regex::Regex;
use tracing::warn;

use circuitmaint_core::{CircuitImpact, Impact, Status, time};

use crate::data::{DataPart, PartKind};
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::fields::ExtractedFields;
use crate::html;
use crate::parser::{Parser, ParserError};
use crate::tz::TimezoneResolver;

/// Extractor for the HTML body of an Equinix notification.
pub struct HtmlParserEquinix {
    resolver: Arc<TimezoneResolver>,
}

impl HtmlParserEquinix {
    /// Creates the extractor with the resolver it should anchor local
    /// times with.
    pub fn new(resolver: Arc<TimezoneResolver>) -> Self {
        Self { resolver }
    }
}

impl Parser for HtmlParserEquinix {
    fn name(&self) -> &'static str {
        "equinix-html"
    }

    fn data_kinds(&self) -> &'static [PartKind] {
        &[PartKind::Html]
    }

    fn parse(
        &self,
        part: &DataPart,
        diags: &mut Diagnostics,
    ) -> Result<Vec<ExtractedFields>, ParserError> {
        let doc = html::parse_document(part.content());
        let mut fields = ExtractedFields::default();
        let mut impact = Impact::default();

        for table in html::select(&doc, "table") {
            for row in html::table_rows(table) {
                let [label, value, ..] = row.as_slice() else {
                    continue;
                };
                let label = label.to_lowercase();
                if label.starts_with("maintenance window") {
                    self.parse_window(value, &mut fields, diags);
                } else if label.starts_with("account") {
                    fields.account = Some(value.clone());
                } else if label.starts_with("impact") {
                    let lowered = value.to_lowercase();
                    if lowered.contains("no impact") {
                        impact = Impact::NoImpact;
                    } else if lowered.contains("degraded") {
                        impact = Impact::Degraded;
                    } else if lowered.contains("redundancy") {
                        impact = Impact::ReducedRedundancy;
                    }
                } else if label.starts_with("circuit") {
                    for circuit_id in value.split(',') {
                        let circuit_id = circuit_id.trim();
                        if !circuit_id.is_empty() {
                            fields
                                .circuits
                                .push(CircuitImpact::new(circuit_id, Impact::default()));
                        }
                    }
                } else if label.starts_with("description") {
                    fields.summary = Some(value.clone());
                }
            }
        }

        if fields.is_empty() {
            return Ok(Vec::new());
        }

        for circuit in &mut fields.circuits {
            circuit.impact = impact;
        }
        fields.status = Some(Status::Confirmed);
        Ok(vec![fields])
    }
}

impl HtmlParserEquinix {
    /// Parses `"<local start> - <local end> <place>"` and anchors both
    /// bounds in the place's timezone.
    fn parse_window(&self, value: &str, fields: &mut ExtractedFields, diags: &mut Diagnostics) {
        let pattern = Regex::new(
            r"(\d{4}-\d{2}-\d{2} \d{2}:\d{2}) - (\d{4}-\d{2}-\d{2} \d{2}:\d{2})\s+(.+)",
        )
        .expect("extractor regexes are valid");
        let Some(captures) = pattern.captures(value) else {
            warn!(value, "unrecognized maintenance window shape");
            return;
        };

        let place = captures[3].trim().to_string();
        let (Some(start), Some(end)) = (
            time::parse_human_datetime(&captures[1]),
            time::parse_human_datetime(&captures[2]),
        ) else {
            warn!(value, "unparseable maintenance window bounds");
            return;
        };

        match (
            self.resolver.resolve(start, &place),
            self.resolver.resolve(end, &place),
        ) {
            (Ok(start), Ok(end)) => {
                fields.start = Some(time::epoch(start));
                fields.end = Some(time::epoch(end));
            }
            (Err(err), _) | (_, Err(err)) => {
                // Keep the record, drop the window.
                warn!(place, error = %err, "could not anchor local maintenance window");
                diags.record(
                    DiagnosticKind::ResolutionFailure,
                    Some("equinix-html"),
                    format!("could not anchor window in `{place}`: {err}"),
                );
            }
        }
    }
}

/// Extractor contributing the ticket number and summary from the subject.
#[derive(Debug, Default)]
pub struct SubjectParserEquinix;

impl Parser for SubjectParserEquinix {
    fn name(&self) -> &'static str {
        "equinix-subject"
    }

    fn data_kinds(&self) -> &'static [PartKind] {
        &[PartKind::EmailSubject]
    }

    fn parse(
        &self,
        part: &DataPart,
        _diags: &mut Diagnostics,
    ) -> Result<Vec<ExtractedFields>, ParserError> {
        let subject = part.text();
        let ticket = Regex::new(r"\b(\d-\d{9,})\b")
            .expect("extractor regexes are valid")
            .find(&subject)
            .map(|m| m.as_str().to_string());
        let Some(ticket) = ticket else {
            return Ok(Vec::new());
        };
        Ok(vec![ExtractedFields {
            maintenance_id: Some(ticket),
            summary: Some(subject.trim().to_string()),
            ..Default::default()
        }])
    }
}
