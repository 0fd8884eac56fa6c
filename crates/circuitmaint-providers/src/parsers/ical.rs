//! Standard iCalendar maintenance-notification extractor.
//!
//! Parses the MAINTNOTE calendar format: one VEVENT per maintenance
//! event, canonical fields carried as `X-MAINTNOTE-*` extension
//! properties, timestamps already absolute. This is the only extractor
//! expected to produce complete records on its own.
//!
//! Reference: <https://tools.ietf.org/html/draft-gunter-calext-maintenance-notifications-00>

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use icalendar::parser::{Component, read_calendar, unfold};
use tracing::debug;

use circuitmaint_core::{CircuitImpact, Impact, Status, time};

use crate::data::{DataPart, PartKind};
use crate::diagnostics::Diagnostics;
use crate::fields::ExtractedFields;
use crate::parser::{Parser, ParserError};

/// Extractor for `calendar` parts in the MAINTNOTE format.
#[derive(Debug, Default)]
pub struct ICalParser;

impl Parser for ICalParser {
    fn name(&self) -> &'static str {
        "ical"
    }

    fn data_kinds(&self) -> &'static [PartKind] {
        &[PartKind::Calendar]
    }

    fn parse(
        &self,
        part: &DataPart,
        _diags: &mut Diagnostics,
    ) -> Result<Vec<ExtractedFields>, ParserError> {
        let content = decode_payload(part);
        let unfolded = unfold(&content);
        let calendar = read_calendar(&unfolded)
            .map_err(|err| ParserError::malformed(PartKind::Calendar, err.to_string()))?;

        let mut events = Vec::new();
        collect_events(&calendar.components, &mut events);

        let mut records = Vec::with_capacity(events.len());
        for event in events {
            records.push(extract_event(event)?);
        }
        debug!(events = records.len(), "parsed calendar notification");
        Ok(records)
    }
}

/// Calendar payloads sometimes arrive wrapped in base64.
fn decode_payload(part: &DataPart) -> String {
    let text = part.text();
    if text.contains("BEGIN:VCALENDAR") {
        return text.into_owned();
    }
    let compact: String = text.split_whitespace().collect();
    match BASE64.decode(compact.as_bytes()) {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(_) => text.into_owned(),
    }
}

fn collect_events<'a>(components: &'a [Component<'a>], events: &mut Vec<&'a Component<'a>>) {
    for component in components {
        if component.name.as_str().eq_ignore_ascii_case("VEVENT") {
            events.push(component);
        }
        collect_events(&component.components, events);
    }
}

fn extract_event(event: &Component<'_>) -> Result<ExtractedFields, ParserError> {
    let mut fields = ExtractedFields::default();
    let mut component_impact: Option<Impact> = None;
    let mut objects: Vec<(String, Option<Impact>)> = Vec::new();
    let mut saw_status = false;
    let mut saw_sequence = false;

    for property in &event.properties {
        let name = property.name.as_str().to_ascii_uppercase();
        let value = unescape(property.val.as_str());
        match name.as_str() {
            "X-MAINTNOTE-PROVIDER" => fields.provider = non_blank(value),
            "X-MAINTNOTE-ACCOUNT" => fields.account = non_blank(value),
            "X-MAINTNOTE-MAINTENANCE-ID" => fields.maintenance_id = non_blank(value),
            "X-MAINTNOTE-STATUS" => {
                saw_status = true;
                fields.status = Some(parse_status(&value)?);
            }
            "X-MAINTNOTE-IMPACT" => component_impact = Some(parse_impact(&value)?),
            "X-MAINTNOTE-OBJECT-ID" => {
                let impact = object_impact(property)?;
                objects.push((value, impact));
            }
            "ORGANIZER" => fields.organizer = non_blank(value),
            "SUMMARY" => fields.summary = non_blank(value),
            "UID" => fields.uid = non_blank(value),
            "SEQUENCE" => {
                saw_sequence = true;
                fields.sequence = Some(value.trim().parse().map_err(|_| {
                    ParserError::malformed(
                        PartKind::Calendar,
                        format!("bad SEQUENCE value `{value}`"),
                    )
                })?);
            }
            "DTSTART" => fields.start = parse_stamp(&value)?,
            "DTEND" => fields.end = parse_stamp(&value)?,
            "DTSTAMP" => fields.stamp = parse_stamp(&value)?,
            _ => {}
        }
    }

    // The calendar format is the one source allowed to leave these out.
    if !saw_status {
        fields.status = Some(Status::NoChange);
    }
    if !saw_sequence {
        fields.sequence = Some(-1);
    }

    for (circuit_id, impact) in objects {
        let impact = impact.or(component_impact).unwrap_or_default();
        fields.circuits.push(CircuitImpact::new(circuit_id, impact));
    }

    Ok(fields)
}

/// The per-object impact override, carried as a property parameter.
fn object_impact(property: &icalendar::parser::Property<'_>) -> Result<Option<Impact>, ParserError> {
    for param in &property.params {
        if param.key.as_str().eq_ignore_ascii_case("X-MAINTNOTE-OBJECT-IMPACT")
            && let Some(value) = &param.val
        {
            return parse_impact(value.as_str()).map(Some);
        }
    }
    Ok(None)
}

fn parse_impact(value: &str) -> Result<Impact, ParserError> {
    value
        .parse()
        .map_err(|_| ParserError::malformed(PartKind::Calendar, format!("bad impact `{value}`")))
}

fn parse_status(value: &str) -> Result<Status, ParserError> {
    value
        .parse()
        .map_err(|_| ParserError::malformed(PartKind::Calendar, format!("bad status `{value}`")))
}

fn parse_stamp(value: &str) -> Result<Option<i64>, ParserError> {
    time::parse_ical_datetime(value)
        .map(|dt| Some(time::epoch(dt)))
        .ok_or_else(|| ParserError::BadTimestamp(value.to_string()))
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Undoes RFC 5545 TEXT escaping.
fn unescape(value: &str) -> String {
    value
        .replace("\\n", " ")
        .replace("\\N", " ")
        .replace("\\,", ",")
        .replace("\\;", ";")
        .replace("\\\\", "\\")
}
