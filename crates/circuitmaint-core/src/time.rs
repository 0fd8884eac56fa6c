//! Timestamp parsing helpers shared by the extractors.
//!
//! Notifications carry datetimes in wildly different shapes: iCalendar
//! basic format, RFC 2822 e-mail headers, and whatever a provider's
//! ticketing system prints into an HTML body. Everything here parses
//! into UTC; naive datetimes are taken as UTC, which is what every
//! shipped extractor wants (formats with a real local-time component go
//! through the timezone resolver instead).

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// Converts a UTC datetime to epoch seconds.
pub fn epoch(dt: DateTime<Utc>) -> i64 {
    dt.timestamp()
}

/// Parses an iCalendar basic-format datetime.
///
/// Handles:
/// - `20151010T080000Z` (UTC)
/// - `20151010T080000` (naive, taken as UTC)
/// - `20151010` (date only, midnight UTC)
pub fn parse_ical_datetime(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();

    if s.len() == 8 && s.chars().all(|c| c.is_ascii_digit()) {
        let date = NaiveDate::parse_from_str(s, "%Y%m%d").ok()?;
        return Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?));
    }

    if let Some(naive) = s.strip_suffix('Z') {
        let dt = NaiveDateTime::parse_from_str(naive, "%Y%m%dT%H%M%S").ok()?;
        return Some(Utc.from_utc_datetime(&dt));
    }

    let dt = NaiveDateTime::parse_from_str(s, "%Y%m%dT%H%M%S").ok()?;
    Some(Utc.from_utc_datetime(&dt))
}

/// Parses an e-mail `Date:` header value.
///
/// RFC 2822 is tried first, RFC 3339 second (some gateways rewrite the
/// header that way).
pub fn parse_email_date(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    None
}

/// Formats tried by [`parse_human_datetime`], in order. Month-first
/// slash dates come before day-first ones so that an unambiguous
/// day > 12 falls through to the day-first interpretation.
const HUMAN_FORMATS: &[&str] = &[
    "%d-%b-%Y %H:%M:%S",
    "%d-%b-%Y %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%a, %d %b %Y %H:%M:%S",
    "%d %b %Y %H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%b %d, %Y %H:%M:%S",
    "%b %d, %Y %H:%M",
];

/// Parses a human-written timestamp as found in notification bodies.
///
/// The result is naive: the caller decides whether the value was UTC
/// (`GMT`-suffixed windows) or local civil time that still needs the
/// timezone resolver.
pub fn parse_human_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    HUMAN_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
}

/// Parses a human-written timestamp known to be expressed in UTC.
pub fn parse_human_utc(s: &str) -> Option<DateTime<Utc>> {
    parse_human_datetime(s).map(|dt| Utc.from_utc_datetime(&dt))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ical_datetime_utc() {
        let dt = parse_ical_datetime("20151010T080000Z").unwrap();
        assert_eq!(epoch(dt), 1_444_464_000);
    }

    #[test]
    fn ical_datetime_naive_is_utc() {
        let dt = parse_ical_datetime("20151010T001000").unwrap();
        assert_eq!(epoch(dt), 1_444_435_800);
    }

    #[test]
    fn ical_date_only_is_midnight() {
        let dt = parse_ical_datetime("20151010").unwrap();
        assert_eq!(epoch(dt), 1_444_435_200);
    }

    #[test]
    fn ical_garbage_is_none() {
        assert!(parse_ical_datetime("today at noon").is_none());
        assert!(parse_ical_datetime("").is_none());
    }

    #[test]
    fn email_date_rfc2822() {
        let dt = parse_email_date("Sat, 10 Oct 2015 00:10:00 +0000").unwrap();
        assert_eq!(epoch(dt), 1_444_435_800);
    }

    #[test]
    fn email_date_rfc2822_with_offset() {
        let dt = parse_email_date("Sat, 10 Oct 2015 02:10:00 +0200").unwrap();
        assert_eq!(epoch(dt), 1_444_435_800);
    }

    #[test]
    fn email_date_rfc3339_fallback() {
        let dt = parse_email_date("2015-10-10T00:10:00Z").unwrap();
        assert_eq!(epoch(dt), 1_444_435_800);
    }

    #[test]
    fn human_datetime_dashed_month_name() {
        // Zayo activity windows: 01-Nov-2021 06:01
        let dt = parse_human_utc("01-Nov-2021 06:01").unwrap();
        assert_eq!(epoch(dt), 1_635_746_460);
    }

    #[test]
    fn human_datetime_month_first_slash() {
        // 08/10/2021 03:00 reads as August 10th, like the notifications do.
        let dt = parse_human_datetime("08/10/2021 03:00").unwrap();
        assert_eq!(dt.format("%Y-%m-%d %H:%M").to_string(), "2021-08-10 03:00");
    }

    #[test]
    fn human_datetime_day_first_fallback() {
        // 24 cannot be a month, so the day-first format applies.
        let dt = parse_human_datetime("24/10/2021 04:00:00").unwrap();
        assert_eq!(dt.format("%Y-%m-%d %H:%M").to_string(), "2021-10-24 04:00");
    }

    #[test]
    fn human_datetime_rfc2822_like_body_text() {
        let dt = parse_human_utc("Thu, 20 May 2021 08:00:00").unwrap();
        assert_eq!(epoch(dt), 1_621_497_600);
    }

    #[test]
    fn human_datetime_unknown_shape() {
        assert!(parse_human_datetime("next Tuesday").is_none());
    }
}
