//! Zayo notification extractors.
//!
//! Zayo e-mails carry their fields as bold labels followed by plain
//! text, plus one table listing the affected circuits. The subject
//! repeats the ticket number, which the subject extractor contributes
//! so that body-less updates still group correctly.

use regex::Regex;
use tracing::warn;

use circuitmaint_core::{CircuitImpact, Impact, Status, time};

use crate::data::{DataPart, PartKind};
use crate::diagnostics::Diagnostics;
use crate::fields::ExtractedFields;
use crate::html;
use crate::parser::{Parser, ParserError};

/// Circuit-table headers Zayo is known to use.
const CIRCUIT_TABLE_HEADERS: &[&[&str]] = &[
    &["Circuit Id", "Expected Impact", "A Location CLLI", "Z Location CLLI", "Legacy Circuit Id"],
    &["Circuit Id", "Expected Impact", "A Location Address", "Z Location Address", "Legacy Circuit Id"],
];

/// Extractor for the HTML body of a Zayo notification.
#[derive(Debug, Default)]
pub struct HtmlParserZayo;

impl Parser for HtmlParserZayo {
    fn name(&self) -> &'static str {
        "zayo-html"
    }

    fn data_kinds(&self) -> &'static [PartKind] {
        &[PartKind::Html]
    }

    fn parse(
        &self,
        part: &DataPart,
        _diags: &mut Diagnostics,
    ) -> Result<Vec<ExtractedFields>, ParserError> {
        let doc = html::parse_document(part.content());
        let mut fields = ExtractedFields::default();

        for bold in html::select(&doc, "b") {
            let label = html::element_text(bold).to_lowercase();
            if label.starts_with("maintenance ticket #:") {
                fields.maintenance_id = html::tail_text(bold);
            } else if label.contains("serves as official notification") {
                if label.contains("will be performing maintenance") {
                    fields.status = Some(Status::Confirmed);
                } else if label.contains("has cancelled") {
                    fields.status = Some(Status::Cancelled);
                }
            } else if label.contains("activity date") {
                if let Some((start, end)) = parse_gmt_window(html::following_texts(bold))? {
                    // Only the first window is kept; repeated activity
                    // dates in one ticket share the other fields.
                    if fields.start.is_none() {
                        fields.start = Some(start);
                        fields.end = Some(end);
                    }
                }
            } else if label.starts_with("reason for maintenance:") {
                fields.summary = html::tail_text(bold);
            } else if label.starts_with("date notice sent:") {
                if let Some(text) = html::tail_text(bold) {
                    fields.stamp = time::parse_human_utc(&text).map(time::epoch);
                }
            } else if label.starts_with("customer:") {
                fields.account = html::tail_text(bold);
            }
        }

        for table in html::select(&doc, "table") {
            parse_circuit_table(table, &mut fields);
        }

        if fields.is_empty() {
            return Ok(Vec::new());
        }

        if fields.account.is_none() {
            fields.account = Some("unknown".to_string());
        }
        if fields.status.is_none() {
            let text = html::clean_text(&doc.root_element().text().collect::<String>());
            if text.contains("will be commencing momentarily") {
                fields.status = Some(Status::InProcess);
            } else if text.contains("has been completed") {
                fields.status = Some(Status::Completed);
            }
        }

        Ok(vec![fields])
    }
}

/// Finds the `( GMT )` line among the texts following an activity-date
/// label and parses it into a window.
fn parse_gmt_window(texts: Vec<String>) -> Result<Option<(i64, i64)>, ParserError> {
    for text in texts {
        if !text.contains("( GMT )") {
            continue;
        }
        let window = text.replace("( GMT )", "");
        let mut bounds = window.split(" to ");
        let (Some(start), Some(end)) = (bounds.next(), bounds.next()) else {
            return Err(ParserError::malformed(
                PartKind::Html,
                format!("unexpected activity window `{window}`"),
            ));
        };
        let start = time::parse_human_utc(start)
            .ok_or_else(|| ParserError::BadTimestamp(start.to_string()))?;
        let end = time::parse_human_utc(end)
            .ok_or_else(|| ParserError::BadTimestamp(end.to_string()))?;
        return Ok(Some((time::epoch(start), time::epoch(end))));
    }
    Ok(None)
}

fn parse_circuit_table(table: scraper::ElementRef<'_>, fields: &mut ExtractedFields) {
    let headers = html::header_cells(table);
    if headers.len() < 5 {
        warn!(?headers, "fewer circuit-table headers than expected");
        return;
    }
    if !CIRCUIT_TABLE_HEADERS
        .iter()
        .any(|expected| headers[..5] == **expected)
    {
        warn!(?headers, "circuit-table headers are not as expected");
        return;
    }

    let cells = html::data_cells(table);
    for row in cells.chunks(5) {
        if row.len() < 2 {
            continue;
        }
        let impact_text = row[1].to_lowercase();
        let impact = if impact_text.contains("hard down") {
            Impact::Outage
        } else if impact_text.contains("no expected impact") {
            Impact::NoImpact
        } else {
            Impact::default()
        };
        fields
            .circuits
            .push(CircuitImpact::new(row[0].clone(), impact));
    }
}

/// Extractor contributing the ticket number from the subject line.
#[derive(Debug, Default)]
pub struct SubjectParserZayo;

impl Parser for SubjectParserZayo {
    fn name(&self) -> &'static str {
        "zayo-subject"
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
        let ticket = Regex::new(r"TTN-\d+")
            .expect("extractor regexes are valid")
            .find(&subject)
            .map(|m| m.as_str().to_string());

        match ticket {
            Some(id) => Ok(vec![ExtractedFields {
                maintenance_id: Some(id),
                ..Default::default()
            }]),
            None => Ok(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_html() -> &'static str {
        "<html><body>\
         <b>Zayo serves as official notification that we will be performing maintenance.</b><br>\
         <b>Maintenance Ticket #:</b> TTN-0003456789<br>\
         <b>Date Notice Sent:</b> 25-Oct-2021 10:00<br>\
         <b>Customer:</b> ACME Corp<br>\
         <b>Reason for Maintenance:</b> Emergency fiber splice<br>\
         <b>1st Activity Date</b><br>\
         01-Nov-2021 00:01 to 01-Nov-2021 05:00 ( Mountain )<br>\
         01-Nov-2021 06:01 to 01-Nov-2021 11:00 ( GMT )<br>\
         <table>\
         <tr><th>Circuit Id</th><th>Expected Impact</th><th>A Location CLLI</th>\
         <th>Z Location CLLI</th><th>Legacy Circuit Id</th></tr>\
         <tr><td>/OGYX/000001/ /ZYO /</td><td>Hard Down</td><td>AAAA</td><td>BBBB</td><td></td></tr>\
         <tr><td>/OGYX/000002/ /ZYO /</td><td>No Expected Impact</td><td>AAAA</td><td>BBBB</td><td></td></tr>\
         </table>\
         </body></html>"
    }

    #[test]
    fn parses_labels_window_and_circuits() {
        let part = DataPart::new(PartKind::Html, sample_html());
        let records = HtmlParserZayo.parse(&part, &mut Diagnostics::new()).unwrap();
        assert_eq!(records.len(), 1);
        let record = &records[0];

        assert_eq!(record.maintenance_id.as_deref(), Some("TTN-0003456789"));
        assert_eq!(record.account.as_deref(), Some("ACME Corp"));
        assert_eq!(record.summary.as_deref(), Some("Emergency fiber splice"));
        assert_eq!(record.status, Some(Status::Confirmed));
        // The ( GMT ) line wins over the local one.
        assert_eq!(record.start, Some(1_635_746_460));
        assert_eq!(record.end, Some(1_635_764_400));
        assert_eq!(record.stamp, Some(1_635_156_000));

        assert_eq!(record.circuits.len(), 2);
        assert_eq!(record.circuits[0].impact, Impact::Outage);
        assert_eq!(record.circuits[1].impact, Impact::NoImpact);
    }

    #[test]
    fn cancelled_notification() {
        let html = sample_html().replace(
            "we will be performing maintenance",
            "Zayo has cancelled this maintenance",
        );
        let part = DataPart::new(PartKind::Html, html);
        let records = HtmlParserZayo.parse(&part, &mut Diagnostics::new()).unwrap();
        assert_eq!(records[0].status, Some(Status::Cancelled));
    }

    #[test]
    fn unrelated_html_yields_nothing() {
        let part = DataPart::new(PartKind::Html, "<html><body><p>newsletter</p></body></html>");
        let records = HtmlParserZayo.parse(&part, &mut Diagnostics::new()).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn subject_contributes_ticket_id() {
        let part = DataPart::new(
            PartKind::EmailSubject,
            "[ Impacted Customer ] Zayo TTN-0003456789 Maintenance Notification",
        );
        let records = SubjectParserZayo
            .parse(&part, &mut Diagnostics::new())
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].maintenance_id.as_deref(), Some("TTN-0003456789"));
    }

    #[test]
    fn subject_without_ticket_yields_nothing() {
        let part = DataPart::new(PartKind::EmailSubject, "Monthly newsletter");
        let records = SubjectParserZayo
            .parse(&part, &mut Diagnostics::new())
            .unwrap();
        assert!(records.is_empty());
    }
}
