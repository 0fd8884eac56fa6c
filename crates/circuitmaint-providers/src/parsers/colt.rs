//! Colt notification extractors.
//!
//! Colt sends the circuit list as a tab-separated spreadsheet export
//! (frequently UTF-16 with a BOM) and everything else — ticket id,
//! window, status — in the subject line, of which two grammars are in
//! circulation.

use regex::Regex;

use circuitmaint_core::{CircuitImpact, Impact, Status, time};

use crate::data::{DataPart, PartKind};
use crate::diagnostics::Diagnostics;
use crate::fields::ExtractedFields;
use crate::parser::{Parser, ParserError};

/// Extractor for the circuit spreadsheet attached to Colt notifications.
#[derive(Debug, Default)]
pub struct CsvParserColt;

impl Parser for CsvParserColt {
    fn name(&self) -> &'static str {
        "colt-csv"
    }

    fn data_kinds(&self) -> &'static [PartKind] {
        &[PartKind::Csv]
    }

    fn parse(
        &self,
        part: &DataPart,
        _diags: &mut Diagnostics,
    ) -> Result<Vec<ExtractedFields>, ParserError> {
        let decoded = decode_utf16_or_utf8(part.content());
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .flexible(true)
            .from_reader(decoded.as_bytes());

        let headers = reader
            .headers()
            .map_err(|err| ParserError::malformed(PartKind::Csv, err.to_string()))?
            .clone();
        let circuit_column = headers.iter().position(|h| h.trim() == "Circuit ID");
        let ocn_column = headers.iter().position(|h| h.trim() == "OCN");
        let Some(circuit_column) = circuit_column else {
            return Err(ParserError::malformed(
                PartKind::Csv,
                "no `Circuit ID` column",
            ));
        };

        let account_number = Regex::new(r"\d+").expect("extractor regexes are valid");
        let mut fields = ExtractedFields::default();
        for record in reader.records() {
            let record = record.map_err(|err| ParserError::malformed(PartKind::Csv, err.to_string()))?;
            if let Some(circuit_id) = record.get(circuit_column) {
                let circuit_id = circuit_id.trim();
                if !circuit_id.is_empty() {
                    fields
                        .circuits
                        .push(CircuitImpact::new(circuit_id, Impact::Outage));
                }
            }
            if fields.account.is_none()
                && let Some(ocn) = ocn_column.and_then(|idx| record.get(idx))
                && let Some(number) = account_number.find(ocn)
            {
                fields.account = Some(number.as_str().to_string());
            }
        }

        if fields.is_empty() {
            return Ok(Vec::new());
        }
        Ok(vec![fields])
    }
}

/// Spreadsheet exports arrive as UTF-16 with a BOM often enough that
/// the extractor decodes them itself.
fn decode_utf16_or_utf8(raw: &[u8]) -> String {
    match raw {
        [0xff, 0xfe, rest @ ..] => decode_utf16_units(rest, u16::from_le_bytes),
        [0xfe, 0xff, rest @ ..] => decode_utf16_units(rest, u16::from_be_bytes),
        _ => String::from_utf8_lossy(raw).into_owned(),
    }
}

fn decode_utf16_units(raw: &[u8], combine: fn([u8; 2]) -> u16) -> String {
    let units: Vec<u16> = raw
        .chunks_exact(2)
        .map(|pair| combine([pair[0], pair[1]]))
        .collect();
    String::from_utf16_lossy(&units)
}

/// Subject grammar 1: `MAINTENANCE ALERT: <id> <start> - <end> ... <STATE>`.
#[derive(Debug, Default)]
pub struct SubjectParserColt1;

impl Parser for SubjectParserColt1 {
    fn name(&self) -> &'static str {
        "colt-subject-alert"
    }

    fn data_kinds(&self) -> &'static [PartKind] {
        &[PartKind::EmailSubject]
    }

    fn parse(
        &self,
        part: &DataPart,
        _diags: &mut Diagnostics,
    ) -> Result<Vec<ExtractedFields>, ParserError> {
        let subject = part.text().replace(['\r', '\n'], " ");
        let pattern = Regex::new(
            r"\[.+\]\s([A-Za-z\s]+).+?(CRQ\w+-\w+)\s(\d+/\d+/\d+\s\d+:\d+:\d+)\s+[A-Z]+.+?(\d+/\d+/\d+\s\d+:\d+:\d+)\s+[A-Z]+.+?\s([A-Z]+)\s*$",
        )
        .expect("extractor regexes are valid");

        let Some(captures) = pattern.captures(&subject) else {
            return Ok(Vec::new());
        };

        let status = match captures[5].trim() {
            "START" => Status::InProcess,
            "COMPLETED" => Status::Completed,
            _ => Status::Confirmed,
        };
        Ok(vec![ExtractedFields {
            maintenance_id: Some(captures[2].to_string()),
            start: Some(parse_gmt(&captures[3])?),
            end: Some(parse_gmt(&captures[4])?),
            status: Some(status),
            summary: Some(captures[1].trim().to_string()),
            ..Default::default()
        }])
    }
}

/// Subject grammar 2: `[Cancellation ]Colt Third Party Maintenance
/// Notification - <id> [<start> - <end>] for <customer>`.
#[derive(Debug, Default)]
pub struct SubjectParserColt2;

impl Parser for SubjectParserColt2 {
    fn name(&self) -> &'static str {
        "colt-subject-notification"
    }

    fn data_kinds(&self) -> &'static [PartKind] {
        &[PartKind::EmailSubject]
    }

    fn parse(
        &self,
        part: &DataPart,
        _diags: &mut Diagnostics,
    ) -> Result<Vec<ExtractedFields>, ParserError> {
        let subject = part.text().replace(['\r', '\n'], " ");
        let pattern = Regex::new(
            r"\[.+\]\s+([A-Za-z]+)\s+([\w\s]+)[\s-]+?(CRQ\w+-\w+).+?(\d+/\d+/\d+\s\d+:\d+:\d+)\s+[A-Z]+.+?(\d+/\d+/\d+\s\d+:\d+:\d+)\s[A-Z]+.+",
        )
        .expect("extractor regexes are valid");

        let Some(captures) = pattern.captures(&subject) else {
            return Ok(Vec::new());
        };

        let status = if captures[1].eq_ignore_ascii_case("cancellation") {
            Status::Cancelled
        } else {
            Status::Confirmed
        };
        Ok(vec![ExtractedFields {
            status: Some(status),
            maintenance_id: Some(captures[3].to_string()),
            start: Some(parse_gmt(&captures[4])?),
            end: Some(parse_gmt(&captures[5])?),
            summary: Some(captures[2].trim().to_string()),
            ..Default::default()
        }])
    }
}

fn parse_gmt(text: &str) -> Result<i64, ParserError> {
    time::parse_human_utc(text)
        .map(time::epoch)
        .ok_or_else(|| ParserError::BadTimestamp(text.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV_BODY: &str = "Customer Name\tOCN\tCircuit ID\tService\n\
                            ACME\tOCN 123456 EU\tDE/DUS1-FRA2/123456\t10G Wave\n\
                            ACME\tOCN 123456 EU\tDE/DUS1-FRA2/654321\t10G Wave\n";

    fn encode_utf16_le(text: &str) -> Vec<u8> {
        let mut bytes = vec![0xff, 0xfe];
        for unit in text.encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        bytes
    }

    #[test]
    fn csv_collects_circuits_and_account() {
        let part = DataPart::new(PartKind::Csv, CSV_BODY);
        let records = CsvParserColt.parse(&part, &mut Diagnostics::new()).unwrap();
        assert_eq!(records.len(), 1);

        let record = &records[0];
        assert_eq!(record.account.as_deref(), Some("123456"));
        assert_eq!(record.circuits.len(), 2);
        assert_eq!(record.circuits[0].circuit_id, "DE/DUS1-FRA2/123456");
        assert_eq!(record.circuits[0].impact, Impact::Outage);
    }

    #[test]
    fn csv_decodes_utf16_with_bom() {
        let part = DataPart::new(PartKind::Csv, encode_utf16_le(CSV_BODY));
        let records = CsvParserColt.parse(&part, &mut Diagnostics::new()).unwrap();
        assert_eq!(records[0].circuits.len(), 2);
    }

    #[test]
    fn csv_without_circuit_column_is_an_error() {
        let part = DataPart::new(PartKind::Csv, "a\tb\n1\t2\n");
        assert!(CsvParserColt
            .parse(&part, &mut Diagnostics::new())
            .is_err());
    }

    #[test]
    fn subject_alert_grammar() {
        let subject = "[ EXTERNAL ] MAINTENANCE ALERT: CRQ1-12345678 24/10/2021 04:00:00 GMT - 24/10/2021 11:00:00 GMT is about to START";
        let part = DataPart::new(PartKind::EmailSubject, subject);
        let records = SubjectParserColt1
            .parse(&part, &mut Diagnostics::new())
            .unwrap();
        assert_eq!(records.len(), 1);

        let record = &records[0];
        assert_eq!(record.maintenance_id.as_deref(), Some("CRQ1-12345678"));
        assert_eq!(record.status, Some(Status::InProcess));
        assert_eq!(record.start, Some(1_635_048_000));
        assert_eq!(record.end, Some(1_635_073_200));
        assert_eq!(record.summary.as_deref(), Some("MAINTENANCE ALERT"));
    }

    #[test]
    fn subject_alert_completed() {
        let subject = "[ EXTERNAL ] MAINTENANCE ALERT: CRQ1-12345678 31/10/2021 00:00:00 GMT - 31/10/2021 07:30:00 GMT - COMPLETED";
        let part = DataPart::new(PartKind::EmailSubject, subject);
        let records = SubjectParserColt1
            .parse(&part, &mut Diagnostics::new())
            .unwrap();
        assert_eq!(records[0].status, Some(Status::Completed));
    }

    #[test]
    fn subject_notification_grammar_cancellation() {
        let subject = "[ EXTERNAL ] Cancellation Colt Third Party Maintenance Notification - CRQ1-87654321 [27/12/2021 23:00:00 GMT - 28/12/2021 05:00:00 GMT] for ACME, 123456";
        let part = DataPart::new(PartKind::EmailSubject, subject);
        let records = SubjectParserColt2
            .parse(&part, &mut Diagnostics::new())
            .unwrap();
        assert_eq!(records.len(), 1);

        let record = &records[0];
        assert_eq!(record.status, Some(Status::Cancelled));
        assert_eq!(record.maintenance_id.as_deref(), Some("CRQ1-87654321"));
        assert_eq!(record.start, Some(1_640_646_000));
        assert_eq!(record.end, Some(1_640_667_600));
    }

    #[test]
    fn unrelated_subject_yields_nothing() {
        let part = DataPart::new(PartKind::EmailSubject, "lunch plans");
        assert!(SubjectParserColt1
            .parse(&part, &mut Diagnostics::new())
            .unwrap()
            .is_empty());
        assert!(SubjectParserColt2
            .parse(&part, &mut Diagnostics::new())
            .unwrap()
            .is_empty());
    }
}
