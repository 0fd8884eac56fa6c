//! The per-NSP entry point.
//!
//! A [`Provider`] binds a named profile — ordered processors, default
//! field values, include/exclude relevance filters, optionally a
//! generative fallback backend — and exposes
//! [`Provider::get_maintenances`], the one call the outside world
//! makes. That call never fails: whatever goes wrong inside becomes a
//! diagnostic next to the (possibly empty) record list.

use std::sync::Arc;

use regex::Regex;
use tracing::{debug, warn};

use circuitmaint_core::Maintenance;

use crate::data::{NotificationData, PartKind};
use crate::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
use crate::fields::ExtractedFields;
use crate::parsers::email::EmailDateParser;
use crate::parsers::llm::{LlmBackend, LlmParser};
use crate::processor::{CombinedProcessor, Processor};

/// The outcome of one notification parse.
#[derive(Debug)]
pub struct ParseOutcome {
    /// The validated records, possibly empty.
    pub maintenances: Vec<Maintenance>,
    /// Everything recorded on the way.
    pub diagnostics: Vec<Diagnostic>,
}

impl ParseOutcome {
    /// Returns true when no record was produced.
    pub fn is_empty(&self) -> bool {
        self.maintenances.is_empty()
    }
}

/// A named NSP profile over the reconciliation pipeline.
///
/// Build one with the builder methods and keep it around: a provider
/// holds only its static configuration, so one instance can serve any
/// number of independent notifications.
pub struct Provider {
    name: String,
    default_organizer: String,
    include: Vec<(PartKind, Regex)>,
    exclude: Vec<(PartKind, Regex)>,
    processors: Vec<Box<dyn Processor>>,
    llm_fallback: Option<Box<dyn Processor>>,
}

impl Provider {
    /// Creates a profile with the given name and no processors yet.
    ///
    /// The name doubles as the default `provider` output field.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default_organizer: "unknown".to_string(),
            include: Vec::new(),
            exclude: Vec::new(),
            processors: Vec::new(),
            llm_fallback: None,
        }
    }

    /// Sets the default `organizer` applied when extraction found none.
    #[must_use]
    pub fn with_organizer(mut self, organizer: impl Into<String>) -> Self {
        self.default_organizer = organizer.into();
        self
    }

    /// Appends a processor; processors run in the order they were added.
    #[must_use]
    pub fn with_processor(mut self, processor: impl Processor + 'static) -> Self {
        self.processors.push(Box::new(processor));
        self
    }

    /// Adds an include filter: when any include filter is configured,
    /// a notification must match one of them to be processed.
    #[must_use]
    pub fn with_include_filter(mut self, kind: PartKind, pattern: Regex) -> Self {
        self.include.push((kind, pattern));
        self
    }

    /// Adds an exclude filter; a match short-circuits the whole parse.
    /// Exclusion takes precedence over inclusion.
    #[must_use]
    pub fn with_exclude_filter(mut self, kind: PartKind, pattern: Regex) -> Self {
        self.exclude.push((kind, pattern));
        self
    }

    /// Attaches a generative backend, enabling a last-resort combined
    /// processor over text and markup parts when every configured
    /// processor came up empty.
    #[must_use]
    pub fn with_llm_backend(mut self, backend: Arc<dyn LlmBackend>) -> Self {
        self.llm_fallback = Some(Box::new(CombinedProcessor::new(vec![
            Arc::new(EmailDateParser),
            Arc::new(LlmParser::new(backend)),
        ])));
        self
    }

    /// The profile name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Extracts the maintenance records announced by one notification.
    ///
    /// Processors are tried in declaration order and the first one
    /// producing at least one validator-approved record wins; later
    /// ones never run, so a notification cannot be interpreted twice.
    /// Filter rejections, extraction failures and dropped groups are
    /// all reported through the outcome's diagnostics — this method
    /// never fails.
    pub fn get_maintenances(&self, data: &NotificationData) -> ParseOutcome {
        let mut diags = Diagnostics::new();

        if self.matches(&self.exclude, data) {
            debug!(provider = %self.name, "notification matches exclude filter");
            diags.record(
                DiagnosticKind::IrrelevantNotification,
                None,
                format!("notification excluded by the {} profile", self.name),
            );
            return ParseOutcome {
                maintenances: Vec::new(),
                diagnostics: diags.into_vec(),
            };
        }
        if !self.include.is_empty() && !self.matches(&self.include, data) {
            debug!(provider = %self.name, "notification matches no include filter");
            diags.record(
                DiagnosticKind::IrrelevantNotification,
                None,
                format!("notification not relevant to the {} profile", self.name),
            );
            return ParseOutcome {
                maintenances: Vec::new(),
                diagnostics: diags.into_vec(),
            };
        }

        for processor in self.processor_chain() {
            let groups = processor.process(data, &mut diags);
            let mut valid = Vec::new();
            for mut group in groups {
                group.merge_from(&self.defaults());
                match group.into_maintenance() {
                    Ok(maintenance) => valid.push(maintenance),
                    Err(err) => {
                        warn!(
                            provider = %self.name,
                            processor = processor.name(),
                            error = %err,
                            "dropping field group that failed validation"
                        );
                        diags.record(
                            DiagnosticKind::ValidationFailure,
                            None,
                            format!("{} group rejected: {err}", processor.name()),
                        );
                    }
                }
            }
            if !valid.is_empty() {
                return ParseOutcome {
                    maintenances: valid,
                    diagnostics: diags.into_vec(),
                };
            }
        }

        ParseOutcome {
            maintenances: Vec::new(),
            diagnostics: diags.into_vec(),
        }
    }

    /// The configured processors, followed by the generative fallback
    /// when a backend is attached.
    fn processor_chain(&self) -> Vec<&dyn Processor> {
        let mut chain: Vec<&dyn Processor> =
            self.processors.iter().map(Box::as_ref).collect();
        if let Some(fallback) = &self.llm_fallback {
            chain.push(fallback.as_ref());
        }
        chain
    }

    fn defaults(&self) -> ExtractedFields {
        ExtractedFields {
            provider: Some(self.name.clone()),
            organizer: Some(self.default_organizer.clone()),
            ..Default::default()
        }
    }

    fn matches(&self, filters: &[(PartKind, Regex)], data: &NotificationData) -> bool {
        for (kind, pattern) in filters {
            for part in data.parts() {
                if part.kind() != *kind {
                    continue;
                }
                let content = part.text().replace(['\r', '\n'], "");
                if pattern.is_match(&content) {
                    return true;
                }
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::DataPart;
    use crate::parsers::ical::ICalParser;
    use crate::processor::SimpleProcessor;
    use circuitmaint_core::{Impact, Status};

    fn golden_ical() -> String {
        concat!(
            "BEGIN:VCALENDAR\r\n",
            "VERSION:2.0\r\n",
            "BEGIN:VEVENT\r\n",
            "UID:42\r\n",
            "SEQUENCE:1\r\n",
            "SUMMARY:Major upgrade in a core node\r\n",
            "ORGANIZER:mailto:noone@example.com\r\n",
            "DTSTART:20151010T080000Z\r\n",
            "DTEND:20151010T100000Z\r\n",
            "DTSTAMP:20151010T001000Z\r\n",
            "X-MAINTNOTE-PROVIDER:example.com\r\n",
            "X-MAINTNOTE-ACCOUNT:137.035999173\r\n",
            "X-MAINTNOTE-MAINTENANCE-ID:WorkOrder-31415\r\n",
            "X-MAINTNOTE-IMPACT:OUTAGE\r\n",
            "X-MAINTNOTE-OBJECT-ID;X-MAINTNOTE-OBJECT-IMPACT=NO-IMPACT:acme-widgets-as-number-1234\r\n",
            "X-MAINTNOTE-OBJECT-ID;X-MAINTNOTE-OBJECT-IMPACT=OUTAGE:acme-widgets-as-number-5678\r\n",
            "X-MAINTNOTE-STATUS:TENTATIVE\r\n",
            "END:VEVENT\r\n",
            "END:VCALENDAR\r\n",
        )
        .to_string()
    }

    fn ical_provider() -> Provider {
        Provider::new("genericprovider")
            .with_processor(SimpleProcessor::new(vec![Arc::new(ICalParser)]))
    }

    fn email_with_ical_body(subject: &str) -> NotificationData {
        NotificationData::from_parts(vec![
            DataPart::new(PartKind::EmailSubject, subject),
            DataPart::new(PartKind::EmailDate, "Sat, 10 Oct 2015 00:10:00 +0000"),
            DataPart::new(PartKind::Calendar, golden_ical()),
        ])
    }

    #[test]
    fn golden_calendar_scenario_end_to_end() {
        let outcome = ical_provider().get_maintenances(&NotificationData::new(
            PartKind::Calendar,
            golden_ical(),
        ));

        assert_eq!(outcome.maintenances.len(), 1);
        let m = &outcome.maintenances[0];
        assert_eq!(m.provider, "example.com");
        assert_eq!(m.account, "137.035999173");
        assert_eq!(m.maintenance_id, "WorkOrder-31415");
        assert_eq!(m.start, 1_444_464_000);
        assert_eq!(m.end, 1_444_471_200);
        assert_eq!(m.stamp, 1_444_435_800);
        assert_eq!(m.sequence, 1);
        assert_eq!(m.status, Status::Tentative);
        assert_eq!(m.uid, "42");
        assert_eq!(m.circuits.len(), 2);
        assert_eq!(m.circuits[0].impact, Impact::NoImpact);
        assert_eq!(m.circuits[1].impact, Impact::Outage);
        assert!(m.validate().is_ok());
    }

    #[test]
    fn defaults_never_override_extracted_fields() {
        // The calendar names its own provider and organizer; the
        // profile defaults must not clobber them.
        let outcome = ical_provider()
            .get_maintenances(&NotificationData::new(PartKind::Calendar, golden_ical()));
        let m = &outcome.maintenances[0];
        assert_eq!(m.provider, "example.com");
        assert_eq!(m.organizer, "mailto:noone@example.com");

        // Without an ORGANIZER line, the default applies.
        let stripped = golden_ical().replace("ORGANIZER:mailto:noone@example.com\r\n", "");
        let outcome = ical_provider()
            .with_organizer("noc@genericprovider.example")
            .get_maintenances(&NotificationData::new(PartKind::Calendar, stripped));
        assert_eq!(outcome.maintenances[0].organizer, "noc@genericprovider.example");
    }

    #[test]
    fn exclude_filter_short_circuits_even_a_valid_body() {
        let provider = ical_provider().with_exclude_filter(
            PartKind::EmailSubject,
            Regex::new("Disturbance Information").unwrap(),
        );
        let data = email_with_ical_body("Disturbance Information for circuit X");

        let outcome = provider.get_maintenances(&data);
        assert!(outcome.is_empty());
        assert_eq!(outcome.diagnostics.len(), 1);
        assert_eq!(
            outcome.diagnostics[0].kind,
            DiagnosticKind::IrrelevantNotification
        );
    }

    #[test]
    fn include_filter_must_match_when_configured() {
        let provider = ical_provider().with_include_filter(
            PartKind::EmailSubject,
            Regex::new("Maintenance Notification").unwrap(),
        );

        let relevant = email_with_ical_body("Planned Maintenance Notification");
        assert_eq!(provider.get_maintenances(&relevant).maintenances.len(), 1);

        let irrelevant = email_with_ical_body("Your invoice is ready");
        let outcome = provider.get_maintenances(&irrelevant);
        assert!(outcome.is_empty());
        assert_eq!(
            outcome.diagnostics[0].kind,
            DiagnosticKind::IrrelevantNotification
        );
    }

    #[test]
    fn exclusion_beats_inclusion() {
        let provider = ical_provider()
            .with_include_filter(PartKind::EmailSubject, Regex::new("Maintenance").unwrap())
            .with_exclude_filter(PartKind::EmailSubject, Regex::new("Cancelled").unwrap());
        let data = email_with_ical_body("Cancelled Maintenance Notification");
        assert!(provider.get_maintenances(&data).is_empty());
    }

    #[test]
    fn first_processor_with_valid_records_wins() {
        // Both processors would match the calendar part; only the
        // first may produce the outcome.
        let provider = Provider::new("genericprovider")
            .with_processor(SimpleProcessor::new(vec![Arc::new(ICalParser)]))
            .with_processor(SimpleProcessor::new(vec![Arc::new(ICalParser)]));
        let outcome = provider
            .get_maintenances(&NotificationData::new(PartKind::Calendar, golden_ical()));
        assert_eq!(outcome.maintenances.len(), 1);
    }

    #[test]
    fn invalid_groups_are_dropped_and_reported() {
        // Remove the circuits: the one group fails validation, the
        // call still returns normally.
        let no_circuits = golden_ical()
            .replace(
                "X-MAINTNOTE-OBJECT-ID;X-MAINTNOTE-OBJECT-IMPACT=NO-IMPACT:acme-widgets-as-number-1234\r\n",
                "",
            )
            .replace(
                "X-MAINTNOTE-OBJECT-ID;X-MAINTNOTE-OBJECT-IMPACT=OUTAGE:acme-widgets-as-number-5678\r\n",
                "",
            );
        let outcome = ical_provider()
            .get_maintenances(&NotificationData::new(PartKind::Calendar, no_circuits));

        assert!(outcome.is_empty());
        assert!(outcome
            .diagnostics
            .iter()
            .any(|d| d.kind == DiagnosticKind::ValidationFailure));
    }

    #[test]
    fn unparseable_notification_is_empty_not_fatal() {
        let outcome = ical_provider()
            .get_maintenances(&NotificationData::new(PartKind::Calendar, "not a calendar"));
        assert!(outcome.is_empty());
        assert!(outcome
            .diagnostics
            .iter()
            .any(|d| d.kind == DiagnosticKind::ExtractionFailure));
    }

    mod llm_fallback {
        use super::*;
        use crate::parsers::llm::{LlmError, LlmReply, TokenUsage};
        use std::sync::atomic::{AtomicUsize, Ordering};

        struct CannedLlm {
            calls: Arc<AtomicUsize>,
        }

        impl LlmBackend for CannedLlm {
            fn name(&self) -> &'static str {
                "canned"
            }

            fn complete(&self, _instruction: &str, _content: &str) -> Result<LlmReply, LlmError> {
                self.calls.fetch_add(1, Ordering::SeqCst);
                Ok(LlmReply {
                    content: r#"{"maintenance_id": "WO-7", "account": "A-1",
                                 "start": 100, "end": 200, "status": "CONFIRMED",
                                 "impact": "OUTAGE", "circuit_ids": ["c-1"]}"#
                        .to_string(),
                    usage: TokenUsage::default(),
                })
            }
        }

        fn canned() -> (Arc<dyn LlmBackend>, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            (Arc::new(CannedLlm { calls: calls.clone() }), calls)
        }

        #[test]
        fn fallback_completes_unstructured_notifications() {
            let (backend, _) = canned();
            let provider = Provider::new("mysteryisp")
                .with_organizer("noc@mysteryisp.example")
                .with_llm_backend(backend);
            let data = NotificationData::from_parts(vec![
                DataPart::new(PartKind::EmailDate, "Sat, 10 Oct 2015 00:10:00 +0000"),
                DataPart::new(PartKind::Text, "we will work on your circuit soon"),
            ]);

            let outcome = provider.get_maintenances(&data);
            assert_eq!(outcome.maintenances.len(), 1);
            let m = &outcome.maintenances[0];
            assert_eq!(m.maintenance_id, "WO-7");
            assert_eq!(m.provider, "mysteryisp");
            assert_eq!(m.organizer, "noc@mysteryisp.example");
            assert_eq!(m.stamp, 1_444_435_800);
        }

        #[test]
        fn fallback_does_not_run_when_a_processor_succeeds() {
            let (backend, calls) = canned();
            let provider = ical_provider().with_llm_backend(backend);
            let data = email_with_ical_body("Planned maintenance");

            let outcome = provider.get_maintenances(&data);
            assert_eq!(outcome.maintenances.len(), 1);
            assert_eq!(calls.load(Ordering::SeqCst), 0);
        }
    }

    #[test]
    fn provider_instance_is_reusable_across_notifications() {
        let provider = ical_provider();
        let first = provider
            .get_maintenances(&NotificationData::new(PartKind::Calendar, golden_ical()));
        let second = provider
            .get_maintenances(&NotificationData::new(PartKind::Calendar, golden_ical()));
        assert_eq!(first.maintenances, second.maintenances);
    }
}
