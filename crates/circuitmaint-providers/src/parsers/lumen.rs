//! Lumen notification extractor.
//!
//! Lumen tickets write their labels into `<span>` elements and the
//! structured data into two tables: a Start/End table that may list
//! several maintenance windows, and a per-circuit table headed by
//! "Customer Name". A ticket with several windows fans out into one
//! record per window, all sharing the remaining fields.

use tracing::warn;

use circuitmaint_core::{CircuitImpact, Impact, Status, time};

use crate::data::{DataPart, PartKind};
use crate::diagnostics::Diagnostics;
use crate::fields::ExtractedFields;
use crate::html;
use crate::parser::{Parser, ParserError};

/// Extractor for the HTML body of a Lumen notification.
#[derive(Debug, Default)]
pub struct HtmlParserLumen;

impl Parser for HtmlParserLumen {
    fn name(&self) -> &'static str {
        "lumen-html"
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
        let mut base = ExtractedFields::default();
        let mut windows: Vec<(i64, i64)> = Vec::new();

        for span in html::select(&doc, "span") {
            let label = html::element_text(span).to_lowercase();
            if label.starts_with("scheduled maintenance #:")
                || label.starts_with("scheduled maintenance window #:")
            {
                if let Some((_, ticket)) = label.split_once("#: ")
                    && !ticket.trim().is_empty()
                {
                    base.maintenance_id = Some(ticket.trim().to_string());
                }
            } else if label.starts_with("summary:") {
                base.summary = html::tail_text(span);
            } else if label.starts_with("updates:") {
                if let Some(update) = html::tail_text(span) {
                    if update.contains("This maintenance is scheduled")
                        || update.contains("The scheduled maintenance work has begun")
                    {
                        base.status = Some(Status::InProcess);
                    }
                    if let Some(captures) = gmt_stamp_regex().captures(&update) {
                        base.stamp = time::parse_human_utc(&captures[1]).map(time::epoch);
                    }
                }
            }
        }

        for table in html::select(&doc, "table") {
            let cells = html::data_cells(table);
            if cells.is_empty() {
                continue;
            }
            if cells[0] == "Start" && cells.get(1).map(String::as_str) == Some("End") {
                parse_window_rows(&cells[2..], &mut windows)?;
            } else if cells[0] == "Customer Name" {
                parse_circuit_rows(&cells, &mut base);
            }
        }

        if base.status.is_none() && !base.is_empty() {
            // An update to an existing ticket may not restate the status.
            base.status = Some(Status::Confirmed);
        }

        let records: Vec<ExtractedFields> = windows
            .into_iter()
            .map(|(start, end)| {
                let mut record = base.clone();
                record.start = Some(start);
                record.end = Some(end);
                record
            })
            .collect();

        if records.is_empty() && !base.is_empty() {
            return Ok(vec![base]);
        }
        Ok(records)
    }
}

fn gmt_stamp_regex() -> regex::Regex {
    regex::Regex::new(r"(\d{1,2}-\w{3}-\d{4} \d{1,2}:\d{2}(?::\d{2})?) GMT")
        .expect("extractor regexes are valid")
}

fn parse_window_rows(cells: &[String], windows: &mut Vec<(i64, i64)>) -> Result<(), ParserError> {
    for pair in cells.chunks(2) {
        let [start, end] = pair else { continue };
        if !start.contains("GMT") || !end.contains("GMT") {
            continue;
        }
        let start = parse_gmt_cell(start)?;
        let end = parse_gmt_cell(end)?;
        windows.push((start, end));
    }
    Ok(())
}

fn parse_gmt_cell(cell: &str) -> Result<i64, ParserError> {
    let text = cell.split(" GMT").next().unwrap_or(cell);
    time::parse_human_utc(text)
        .map(time::epoch)
        .ok_or_else(|| ParserError::BadTimestamp(cell.to_string()))
}

/// The Customer Name table comes in 9 or 10 column flavors; the 10th
/// column is a per-row status.
fn parse_circuit_rows(cells: &[String], base: &mut ExtractedFields) {
    let columns = if cells.len() % 10 == 0 {
        10
    } else if cells.len() % 9 == 0 {
        9
    } else {
        warn!(cells = cells.len(), "unexpected circuit-table format");
        return;
    };

    for row in cells.chunks(columns).skip(1) {
        if base.account.is_none() {
            base.account = Some(row[0].clone());
        }
        if columns == 10 {
            match row[9].as_str() {
                "Completed" => base.status = Some(Status::Completed),
                "Postponed" | "Alternate Night" => base.status = Some(Status::ReScheduled),
                "Not Completed" | "Cancelled" => base.status = Some(Status::Cancelled),
                _ => {}
            }
        }

        // Prefer the Circuit ID column, fall back to the Alt Circuit ID.
        let mut circuit_id = row[1].as_str();
        if circuit_id == "_" || circuit_id == "N/A" {
            circuit_id = row[2].as_str();
        }
        if circuit_id == "_" || circuit_id == "N/A" {
            continue;
        }
        if row[6].to_lowercase().contains("outage") {
            base.circuits
                .push(CircuitImpact::new(circuit_id, Impact::Outage));
        }
    }
}
