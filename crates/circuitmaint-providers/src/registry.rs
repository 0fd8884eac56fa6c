//! Explicit slug-to-provider registry.
//!
//! Every supported NSP profile is constructed right here — no
//! discovery, no globals. Callers that need a custom profile (say,
//! with a remote geocoding backend or a generative fallback) build a
//! [`Provider`] directly instead.

use std::sync::Arc;

use regex::Regex;

use crate::data::PartKind;
use crate::parsers::{
    CsvParserColt, EmailDateParser, HtmlParserEquinix, HtmlParserLumen, HtmlParserZayo,
    ICalParser, SubjectParserAws, SubjectParserColt1, SubjectParserColt2, SubjectParserEquinix,
    SubjectParserZayo, TextParserAws,
};
use crate::processor::{CombinedProcessor, SimpleProcessor};
use crate::provider::Provider;
use crate::tz::TimezoneResolver;

/// The slugs [`build`] knows about.
pub fn names() -> &'static [&'static str] {
    &[
        "arelion", "aws", "colt", "equinix", "generic", "lumen", "ntt", "packetfabric", "zayo",
    ]
}

/// Constructs the profile registered under `name`, if any.
pub fn build(name: &str) -> Option<Provider> {
    match name.trim().to_lowercase().as_str() {
        "arelion" | "telia" => Some(
            ical("arelion")
                .with_organizer("support@arelion.com")
                .with_exclude_filter(
                    PartKind::EmailSubject,
                    pattern("Disturbance Information"),
                ),
        ),
        "aws" => Some(
            Provider::new("aws")
                .with_organizer("aws-account-notifications@amazon.com")
                .with_processor(CombinedProcessor::new(vec![
                    Arc::new(EmailDateParser),
                    Arc::new(TextParserAws),
                    Arc::new(SubjectParserAws),
                ])),
        ),
        "colt" => Some(
            Provider::new("colt")
                .with_organizer("PlannedWorks@colt.net")
                .with_processor(CombinedProcessor::new(vec![
                    Arc::new(EmailDateParser),
                    Arc::new(CsvParserColt),
                    Arc::new(SubjectParserColt1),
                ]))
                .with_processor(CombinedProcessor::new(vec![
                    Arc::new(EmailDateParser),
                    Arc::new(CsvParserColt),
                    Arc::new(SubjectParserColt2),
                ])),
        ),
        "equinix" => Some(
            Provider::new("equinix")
                .with_organizer("servicedesk@equinix.com")
                .with_include_filter(PartKind::EmailSubject, pattern("Network Maintenance"))
                .with_processor(CombinedProcessor::new(vec![
                    Arc::new(EmailDateParser),
                    Arc::new(HtmlParserEquinix::new(Arc::new(TimezoneResolver::offline()))),
                    Arc::new(SubjectParserEquinix),
                ])),
        ),
        "generic" | "ical" => Some(ical("generic")),
        "lumen" => Some(
            Provider::new("lumen")
                .with_organizer("smc@lumen.com")
                .with_include_filter(PartKind::EmailSubject, pattern("Scheduled Maintenance"))
                .with_processor(CombinedProcessor::new(vec![
                    Arc::new(EmailDateParser),
                    Arc::new(HtmlParserLumen),
                ])),
        ),
        "ntt" => Some(ical("ntt").with_organizer("noc@us.ntt.net")),
        "packetfabric" => Some(
            ical("packetfabric").with_organizer("support@packetfabric.com"),
        ),
        "zayo" => Some(
            Provider::new("zayo")
                .with_organizer("mr@zayo.com")
                .with_include_filter(PartKind::Html, pattern("Maintenance Ticket #"))
                .with_processor(CombinedProcessor::new(vec![
                    Arc::new(EmailDateParser),
                    Arc::new(SubjectParserZayo),
                    Arc::new(HtmlParserZayo),
                ])),
        ),
        _ => None,
    }
}

/// A pure-iCalendar profile under the given slug.
fn ical(name: &str) -> Provider {
    Provider::new(name).with_processor(SimpleProcessor::new(vec![Arc::new(ICalParser)]))
}

fn pattern(re: &str) -> Regex {
    Regex::new(re).expect("registry filter patterns are valid")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::NotificationData;

    #[test]
    fn every_registered_name_builds() {
        for name in names() {
            let provider = build(name).expect("registered profile builds");
            assert_eq!(provider.name(), *name);
        }
    }

    #[test]
    fn aliases_resolve_to_their_profile() {
        assert_eq!(build("telia").unwrap().name(), "arelion");
        assert_eq!(build("ical").unwrap().name(), "generic");
        assert_eq!(build(" Zayo ").unwrap().name(), "zayo");
    }

    #[test]
    fn unknown_slug_is_none() {
        assert!(build("definitely-not-an-nsp").is_none());
    }

    #[test]
    fn generic_profile_parses_plain_calendar_notifications() {
        let ical = concat!(
            "BEGIN:VCALENDAR\r\n",
            "BEGIN:VEVENT\r\n",
            "UID:1\r\n",
            "ORGANIZER:noc@example.net\r\n",
            "DTSTART:20151010T080000Z\r\n",
            "DTEND:20151010T100000Z\r\n",
            "DTSTAMP:20151010T001000Z\r\n",
            "X-MAINTNOTE-PROVIDER:example.net\r\n",
            "X-MAINTNOTE-ACCOUNT:ACC-1\r\n",
            "X-MAINTNOTE-MAINTENANCE-ID:WO-1\r\n",
            "X-MAINTNOTE-IMPACT:OUTAGE\r\n",
            "X-MAINTNOTE-OBJECT-ID:circ-1\r\n",
            "X-MAINTNOTE-STATUS:CONFIRMED\r\n",
            "END:VEVENT\r\n",
            "END:VCALENDAR\r\n",
        );
        let outcome = build("generic")
            .unwrap()
            .get_maintenances(&NotificationData::new(PartKind::Calendar, ical));
        assert_eq!(outcome.maintenances.len(), 1);
        assert_eq!(outcome.maintenances[0].maintenance_id, "WO-1");
    }
}
