//! Raw notification data containers.
//!
//! This module provides the normalized view of one incoming
//! notification before any extraction happens:
//! - [`DataPart`]: one chunk of raw input tagged by format
//! - [`NotificationData`]: the ordered parts of one notification
//!
//! Construction never fails. A malformed payload still becomes a part
//! (decoding is the consuming extractor's problem); an unparseable
//! e-mail simply yields an empty part list.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use mail_parser::{MessageParser, MimeHeaders};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// The format of one [`DataPart`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PartKind {
    /// Structured iCalendar text.
    Calendar,
    /// HTML markup document.
    Html,
    /// Delimited tabular text.
    Csv,
    /// Free-form plain text.
    Text,
    /// The `Subject:` header of an e-mail notification.
    EmailSubject,
    /// The `Date:` header of an e-mail notification.
    EmailDate,
}

impl PartKind {
    /// Returns the canonical tag for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Calendar => "calendar",
            Self::Html => "html",
            Self::Csv => "csv",
            Self::Text => "text",
            Self::EmailSubject => "email-subject",
            Self::EmailDate => "email-date",
        }
    }
}

impl fmt::Display for PartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PartKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "calendar" | "ical" | "text/calendar" => Ok(Self::Calendar),
            "html" | "text/html" => Ok(Self::Html),
            "csv" | "text/csv" => Ok(Self::Csv),
            "text" | "text/plain" => Ok(Self::Text),
            "email-subject" => Ok(Self::EmailSubject),
            "email-date" => Ok(Self::EmailDate),
            other => Err(format!("unknown part kind `{other}`")),
        }
    }
}

/// One chunk of raw notification input, tagged by format.
///
/// Created once at ingestion and never mutated; the raw bytes are
/// preserved even when they turn out to be malformed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPart {
    kind: PartKind,
    content: Vec<u8>,
}

impl DataPart {
    /// Creates a part from raw bytes and a format tag.
    pub fn new(kind: PartKind, content: impl Into<Vec<u8>>) -> Self {
        Self {
            kind,
            content: content.into(),
        }
    }

    /// The format tag of this part.
    pub fn kind(&self) -> PartKind {
        self.kind
    }

    /// The raw bytes of this part.
    pub fn content(&self) -> &[u8] {
        &self.content
    }

    /// The content decoded as UTF-8, lossily.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.content)
    }
}

/// The ordered parts of one notification instance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotificationData {
    parts: Vec<DataPart>,
}

impl NotificationData {
    /// Builds a notification holding a single part.
    pub fn new(kind: PartKind, content: impl Into<Vec<u8>>) -> Self {
        Self {
            parts: vec![DataPart::new(kind, content)],
        }
    }

    /// Builds a notification from an ordered list of parts.
    pub fn from_parts(parts: Vec<DataPart>) -> Self {
        Self { parts }
    }

    /// Decomposes a raw RFC 5322 message into parts.
    ///
    /// Emits one `EmailSubject` part, one `EmailDate` part, one `Text`
    /// part per plain-text body, one `Html` part per HTML body, and one
    /// part per attachment with a recognized content type. Absent
    /// alternatives are simply omitted; a message that does not parse
    /// at all yields an empty notification.
    pub fn from_email_bytes(raw: &[u8]) -> Self {
        let Some(message) = MessageParser::default().parse(raw) else {
            warn!("could not parse e-mail message, notification will be empty");
            return Self::default();
        };

        let mut parts = Vec::new();

        if let Some(subject) = message.subject() {
            parts.push(DataPart::new(PartKind::EmailSubject, subject.as_bytes()));
        }

        // Prefer the raw header so the extractor sees the original
        // spelling; fall back to the parsed date for rewritten messages.
        let date = message
            .header_raw("Date")
            .map(|raw| raw.trim().to_string())
            .or_else(|| message.date().map(mail_parser::DateTime::to_rfc3339));
        if let Some(date) = date {
            parts.push(DataPart::new(PartKind::EmailDate, date.into_bytes()));
        }

        let mut idx = 0;
        while let Some(body) = message.body_text(idx) {
            parts.push(DataPart::new(PartKind::Text, body.as_bytes()));
            idx += 1;
        }

        let mut idx = 0;
        while let Some(body) = message.body_html(idx) {
            parts.push(DataPart::new(PartKind::Html, body.as_bytes()));
            idx += 1;
        }

        for attachment in message.attachments() {
            let Some(kind) = attachment
                .content_type()
                .and_then(|ct| attachment_kind(ct.ctype(), ct.subtype()))
            else {
                debug!(
                    name = attachment.attachment_name().unwrap_or("<unnamed>"),
                    "skipping attachment with unrecognized content type"
                );
                continue;
            };
            parts.push(DataPart::new(kind, attachment.contents()));
        }

        Self { parts }
    }

    /// The parts of this notification, in order.
    pub fn parts(&self) -> &[DataPart] {
        &self.parts
    }

    /// Returns true when the notification holds no parts at all.
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}

fn attachment_kind(ctype: &str, subtype: Option<&str>) -> Option<PartKind> {
    match (ctype, subtype) {
        ("text", Some("calendar")) | ("application", Some("ics")) => Some(PartKind::Calendar),
        ("text", Some("csv")) => Some(PartKind::Csv),
        ("text", Some("html")) => Some(PartKind::Html),
        ("text", Some("plain")) => Some(PartKind::Text),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_EMAIL: &str = concat!(
        "From: noc@example.net\r\n",
        "To: ops@example.org\r\n",
        "Subject: Maintenance Ticket #TTN-0001 scheduled\r\n",
        "Date: Sat, 10 Oct 2015 00:10:00 +0000\r\n",
        "MIME-Version: 1.0\r\n",
        "Content-Type: multipart/mixed; boundary=\"outer\"\r\n",
        "\r\n",
        "--outer\r\n",
        "Content-Type: multipart/alternative; boundary=\"inner\"\r\n",
        "\r\n",
        "--inner\r\n",
        "Content-Type: text/plain; charset=utf-8\r\n",
        "\r\n",
        "Maintenance is planned.\r\n",
        "--inner\r\n",
        "Content-Type: text/html; charset=utf-8\r\n",
        "\r\n",
        "<html><body><b>Maintenance is planned.</b></body></html>\r\n",
        "--inner--\r\n",
        "--outer\r\n",
        "Content-Type: text/calendar; name=\"maint.ics\"\r\n",
        "Content-Disposition: attachment; filename=\"maint.ics\"\r\n",
        "\r\n",
        "BEGIN:VCALENDAR\r\nEND:VCALENDAR\r\n",
        "--outer--\r\n",
    );

    #[test]
    fn single_part_factory() {
        let data = NotificationData::new(PartKind::Calendar, "BEGIN:VCALENDAR");
        assert_eq!(data.parts().len(), 1);
        assert_eq!(data.parts()[0].kind(), PartKind::Calendar);
        assert_eq!(data.parts()[0].text(), "BEGIN:VCALENDAR");
    }

    #[test]
    fn email_decomposition_emits_all_recognized_parts() {
        let data = NotificationData::from_email_bytes(SAMPLE_EMAIL.as_bytes());

        let kinds: Vec<PartKind> = data.parts().iter().map(DataPart::kind).collect();
        assert!(kinds.contains(&PartKind::EmailSubject));
        assert!(kinds.contains(&PartKind::EmailDate));
        assert!(kinds.contains(&PartKind::Text));
        assert!(kinds.contains(&PartKind::Html));
        assert!(kinds.contains(&PartKind::Calendar));

        let subject = data
            .parts()
            .iter()
            .find(|p| p.kind() == PartKind::EmailSubject)
            .unwrap();
        assert_eq!(subject.text(), "Maintenance Ticket #TTN-0001 scheduled");
    }

    #[test]
    fn email_date_part_preserves_raw_header() {
        let data = NotificationData::from_email_bytes(SAMPLE_EMAIL.as_bytes());
        let date = data
            .parts()
            .iter()
            .find(|p| p.kind() == PartKind::EmailDate)
            .unwrap();
        assert_eq!(date.text(), "Sat, 10 Oct 2015 00:10:00 +0000");
    }

    #[test]
    fn email_without_html_alternative_omits_the_part() {
        let plain = concat!(
            "From: noc@example.net\r\n",
            "Subject: heads up\r\n",
            "Date: Sat, 10 Oct 2015 00:10:00 +0000\r\n",
            "\r\n",
            "plain body only\r\n",
        );
        let data = NotificationData::from_email_bytes(plain.as_bytes());
        assert!(data.parts().iter().all(|p| p.kind() != PartKind::Html));
        assert!(data.parts().iter().any(|p| p.kind() == PartKind::Text));
    }

    #[test]
    fn unparseable_email_yields_empty_notification() {
        let data = NotificationData::from_email_bytes(&[]);
        assert!(data.is_empty());
    }

    #[test]
    fn malformed_bytes_are_preserved_verbatim() {
        let data = NotificationData::new(PartKind::Html, vec![0xff, 0xfe, 0x00]);
        assert_eq!(data.parts()[0].content(), &[0xff, 0xfe, 0x00]);
    }

    #[test]
    fn part_kind_parsing() {
        assert_eq!("ical".parse::<PartKind>().unwrap(), PartKind::Calendar);
        assert_eq!("text/html".parse::<PartKind>().unwrap(), PartKind::Html);
        assert_eq!(
            "email-subject".parse::<PartKind>().unwrap(),
            PartKind::EmailSubject
        );
        assert!("spreadsheet".parse::<PartKind>().is_err());
    }
}
