//! Reconciliation of extractor outputs into record groups.
//!
//! A [`Processor`] owns an ordered list of extractors and turns one
//! [`NotificationData`] into zero or more merged field groups. Two
//! strategies exist:
//!
//! - [`SimpleProcessor`]: one extractor family produces complete
//!   records on its own (the calendar case); every extracted record is
//!   its own group.
//! - [`CombinedProcessor`]: several extractors each contribute a piece;
//!   the pooled records are grouped by maintenance id and merged.
//!
//! Merge state lives entirely inside one `process` call — the engine
//! holds nothing between invocations, so independent notifications can
//! never contaminate each other.

use std::sync::Arc;

use tracing::debug;

use crate::data::NotificationData;
use crate::diagnostics::Diagnostics;
use crate::fields::ExtractedFields;
use crate::parser::Parser;

/// A reconciliation strategy over an ordered extractor list.
pub trait Processor: Send + Sync {
    /// Short identifier used in logs and diagnostics.
    fn name(&self) -> &'static str;

    /// Runs the extractors over the notification and reconciles their
    /// outputs into Maintenance-ready field groups.
    ///
    /// Extraction failures are recorded in `diags` and extraction
    /// continues; an empty result is the normal "no maintenance found"
    /// outcome, not an error.
    fn process(&self, data: &NotificationData, diags: &mut Diagnostics) -> Vec<ExtractedFields>;
}

/// Runs every configured extractor over every matching part and keeps
/// each extracted record as its own group.
pub struct SimpleProcessor {
    parsers: Vec<Arc<dyn Parser>>,
}

impl SimpleProcessor {
    /// Creates the processor with its extractors, in priority order.
    pub fn new(parsers: Vec<Arc<dyn Parser>>) -> Self {
        Self { parsers }
    }
}

impl Processor for SimpleProcessor {
    fn name(&self) -> &'static str {
        "simple"
    }

    fn process(&self, data: &NotificationData, diags: &mut Diagnostics) -> Vec<ExtractedFields> {
        pool_records(&self.parsers, data, diags)
            .into_iter()
            .filter(|record| !record.is_empty())
            .collect()
    }
}

/// Pools every extractor's records and merges them into groups.
///
/// Grouping: records carrying a `maintenance_id` form one group per
/// distinct id; records without identity belong to every group (or form
/// one shared group when no id was seen at all). Within a group, the
/// scalar merge is first-non-empty-wins in pool order and circuit
/// impacts are last-wins, as defined on
/// [`ExtractedFields::merge_from`].
pub struct CombinedProcessor {
    parsers: Vec<Arc<dyn Parser>>,
}

impl CombinedProcessor {
    /// Creates the processor with its extractors, in priority order.
    pub fn new(parsers: Vec<Arc<dyn Parser>>) -> Self {
        Self { parsers }
    }
}

impl Processor for CombinedProcessor {
    fn name(&self) -> &'static str {
        "combined"
    }

    fn process(&self, data: &NotificationData, diags: &mut Diagnostics) -> Vec<ExtractedFields> {
        let pooled = pool_records(&self.parsers, data, diags);

        // Distinct ids in first-appearance order.
        let mut ids: Vec<String> = Vec::new();
        for record in &pooled {
            if record.has_identity() {
                let id = record.maintenance_id.clone().unwrap_or_default();
                if !ids.contains(&id) {
                    ids.push(id);
                }
            }
        }

        if ids.is_empty() {
            // One shared group out of everything extracted.
            let mut shared = ExtractedFields::default();
            for record in &pooled {
                shared.merge_from(record);
            }
            if shared.is_empty() {
                debug!("no extractor contributed any field");
                return Vec::new();
            }
            return vec![shared];
        }

        // One group per id: its own records plus every anonymous
        // record, folded in pool order so the merge policy applies
        // uniformly.
        ids.into_iter()
            .map(|id| {
                let mut group = ExtractedFields::default();
                for record in &pooled {
                    let belongs =
                        !record.has_identity() || record.maintenance_id.as_deref() == Some(&id);
                    if belongs {
                        group.merge_from(record);
                    }
                }
                group
            })
            .collect()
    }
}

/// Applies each parser to each part it accepts, in parser registration
/// order, pooling all extracted records. Failures become diagnostics.
fn pool_records(
    parsers: &[Arc<dyn Parser>],
    data: &NotificationData,
    diags: &mut Diagnostics,
) -> Vec<ExtractedFields> {
    let mut pooled = Vec::new();
    let mut matched = false;

    for parser in parsers {
        for part in data.parts() {
            if !parser.accepts(part.kind()) {
                continue;
            }
            matched = true;
            match parser.parse(part, diags) {
                Ok(records) => pooled.extend(records),
                Err(err) => {
                    debug!(parser = parser.name(), error = %err, "extraction failed");
                    diags.record(
                        err.diagnostic_kind(),
                        Some(parser.name()),
                        format!("extraction failed for {}: {err}", part.kind()),
                    );
                }
            }
        }
    }

    if !matched {
        debug!("no configured extractor matched any part of the notification");
    }
    pooled
}
