//! AWS Direct Connect notification extractors.
//!
//! AWS notifications are plain text: a prose paragraph naming the
//! window in `<rfc2822-ish> GMT to <rfc2822-ish> GMT` form (or as
//! `Start Time:` / `End Time:` lines), followed by one affected
//! resource id per line. The account number only appears in the
//! subject.

use regex::Regex;

use circuitmaint_core::{CircuitImpact, Impact, Status, time};

use crate::data::{DataPart, PartKind};
use crate::diagnostics::Diagnostics;
use crate::fields::ExtractedFields;
use crate::parser::{Parser, ParserError};

/// Extractor for the plain-text body of an AWS notification.
#[derive(Debug, Default)]
pub struct TextParserAws;

impl Parser for TextParserAws {
    fn name(&self) -> &'static str {
        "aws-text"
    }

    fn data_kinds(&self) -> &'static [PartKind] {
        &[PartKind::Text]
    }

    fn parse(
        &self,
        part: &DataPart,
        _diags: &mut Diagnostics,
    ) -> Result<Vec<ExtractedFields>, ParserError> {
        let text = part.text();
        let mut fields = ExtractedFields::default();

        let window = Regex::new(
            r"([A-Z][a-z]{2}, \d{1,2} [A-Z][a-z]{2,9} \d{4} \d{2}:\d{2}:\d{2}) GMT to ([A-Z][a-z]{2}, \d{1,2} [A-Z][a-z]{2,9} \d{4} \d{2}:\d{2}:\d{2}) GMT",
        )
        .expect("extractor regexes are valid");
        let bound = Regex::new(
            r"^(Start|End) Time: ([A-Z][a-z]{2}, \d{1,2} [A-Z][a-z]{2,9} \d{4} \d{2}:\d{2}:\d{2}) GMT",
        )
        .expect("extractor regexes are valid");
        let account = Regex::new(r"^Account ?Id?: (\d+)").expect("extractor regexes are valid");
        let resource =
            Regex::new(r"^[a-z]{2,5}-[0-9a-z]{7,}$").expect("extractor regexes are valid");

        for line in text.lines() {
            let line = line.trim();
            let lower = line.to_lowercase();
            if lower.contains("planned maintenance") || lower.contains("maintenance has been scheduled")
            {
                fields.summary = Some(line.to_string());
            }
            if let Some(captures) = window.captures(line) {
                fields.start = Some(parse_gmt(&captures[1])?);
                fields.end = Some(parse_gmt(&captures[2])?);
            } else if let Some(captures) = bound.captures(line) {
                let stamp = parse_gmt(&captures[2])?;
                if &captures[1] == "Start" {
                    fields.start = Some(stamp);
                } else {
                    fields.end = Some(stamp);
                }
            } else if let Some(captures) = account.captures(line) {
                fields.account = Some(captures[1].to_string());
            } else if resource.is_match(line) {
                fields
                    .circuits
                    .push(CircuitImpact::new(line, Impact::Outage));
            }
        }

        if fields.is_empty() {
            return Ok(Vec::new());
        }
        if fields.status.is_none() {
            fields.status = Some(Status::Confirmed);
        }
        Ok(vec![fields])
    }
}

fn parse_gmt(text: &str) -> Result<i64, ParserError> {
    time::parse_human_utc(text)
        .map(time::epoch)
        .ok_or_else(|| ParserError::BadTimestamp(text.to_string()))
}

/// Extractor contributing the account number from the subject line.
#[derive(Debug, Default)]
pub struct SubjectParserAws;

impl Parser for SubjectParserAws {
    fn name(&self) -> &'static str {
        "aws-subject"
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
        let pattern =
            Regex::new(r"\[AWS Account ?I?D?: (\d+)\]").expect("extractor regexes are valid");
        let Some(captures) = pattern.captures(&subject) else {
            return Ok(Vec::new());
        };
        Ok(vec![ExtractedFields {
            account: Some(captures[1].to_string()),
            ..Default::default()
        }])
    }
}
