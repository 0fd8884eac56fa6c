//! Transient field sets produced by extractors.
//!
//! [`ExtractedFields`] is what one extractor gets out of one data part:
//! any subset of the canonical record, plus zero or more circuits. The
//! reconciliation engine merges several of these into one group and the
//! group is then promoted to a validated [`Maintenance`] — or dropped.

use circuitmaint_core::{CircuitImpact, Maintenance, Status, ValidationError};

/// A partial, not-yet-validated set of canonical fields.
///
/// Merge semantics (used both between extractor outputs and when
/// applying provider defaults):
/// - scalars: an already-present non-blank value is never overwritten,
///   so whoever contributed first wins;
/// - circuits: unioned by `circuit_id`, and a later contribution for an
///   already-known circuit replaces its impact.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedFields {
    /// Provider of the maintained service.
    pub provider: Option<String>,
    /// Account associated with the service.
    pub account: Option<String>,
    /// Provider-side maintenance identifier.
    pub maintenance_id: Option<String>,
    /// Contact information from the notification.
    pub organizer: Option<String>,
    /// Human-readable description.
    pub summary: Option<String>,
    /// Notification unique identifier.
    pub uid: Option<String>,
    /// Overall maintenance status.
    pub status: Option<Status>,
    /// Window start, UTC epoch seconds.
    pub start: Option<i64>,
    /// Window end, UTC epoch seconds.
    pub end: Option<i64>,
    /// Notification issue time, UTC epoch seconds.
    pub stamp: Option<i64>,
    /// Update serialization counter.
    pub sequence: Option<i32>,
    /// Affected circuits.
    pub circuits: Vec<CircuitImpact>,
}

impl ExtractedFields {
    /// Returns true when no field at all was extracted.
    pub fn is_empty(&self) -> bool {
        self.provider.is_none()
            && self.account.is_none()
            && self.maintenance_id.is_none()
            && self.organizer.is_none()
            && self.summary.is_none()
            && self.uid.is_none()
            && self.status.is_none()
            && self.start.is_none()
            && self.end.is_none()
            && self.stamp.is_none()
            && self.sequence.is_none()
            && self.circuits.is_empty()
    }

    /// Returns true when this record names the maintenance it belongs to.
    pub fn has_identity(&self) -> bool {
        self.maintenance_id
            .as_deref()
            .is_some_and(|id| !id.trim().is_empty())
    }

    /// Merges `other` into `self` under the first-wins scalar /
    /// last-wins circuit-impact policy described on the type.
    pub fn merge_from(&mut self, other: &ExtractedFields) {
        keep_or(&mut self.provider, &other.provider);
        keep_or(&mut self.account, &other.account);
        keep_or(&mut self.maintenance_id, &other.maintenance_id);
        keep_or(&mut self.organizer, &other.organizer);
        keep_or(&mut self.summary, &other.summary);
        keep_or(&mut self.uid, &other.uid);

        if self.status.is_none() {
            self.status = other.status;
        }
        if self.start.is_none() {
            self.start = other.start;
        }
        if self.end.is_none() {
            self.end = other.end;
        }
        if self.stamp.is_none() {
            self.stamp = other.stamp;
        }
        if self.sequence.is_none() {
            self.sequence = other.sequence;
        }

        for circuit in &other.circuits {
            if let Some(known) = self
                .circuits
                .iter_mut()
                .find(|c| c.circuit_id == circuit.circuit_id)
            {
                known.impact = circuit.impact;
            } else {
                self.circuits.push(circuit.clone());
            }
        }
    }

    /// Promotes this group to a validated [`Maintenance`].
    ///
    /// Applies the record-level defaults — `uid` `"0"`, `sequence` `-1`,
    /// empty `summary` — and requires everything else to be present.
    /// `status` deliberately has no default here: the calendar extractor
    /// supplies `NO-CHANGE` itself, every other source must state one.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] when a mandatory field is missing
    /// or a record invariant is broken.
    pub fn into_maintenance(self) -> Result<Maintenance, ValidationError> {
        let maintenance = Maintenance {
            provider: self.provider.ok_or(ValidationError::MissingField("provider"))?,
            account: self.account.ok_or(ValidationError::MissingField("account"))?,
            maintenance_id: self
                .maintenance_id
                .ok_or(ValidationError::MissingField("maintenance_id"))?,
            organizer: self
                .organizer
                .ok_or(ValidationError::MissingField("organizer"))?,
            status: self.status.ok_or(ValidationError::MissingField("status"))?,
            start: self.start.ok_or(ValidationError::MissingField("start"))?,
            end: self.end.ok_or(ValidationError::MissingField("end"))?,
            stamp: self.stamp.ok_or(ValidationError::MissingField("stamp"))?,
            circuits: self.circuits,
            uid: self
                .uid
                .filter(|uid| !uid.trim().is_empty())
                .unwrap_or_else(|| "0".to_string()),
            sequence: self.sequence.unwrap_or(-1),
            summary: self.summary.unwrap_or_default(),
        };
        maintenance.validate()?;
        Ok(maintenance)
    }
}

fn keep_or(current: &mut Option<String>, incoming: &Option<String>) {
    let current_blank = current.as_deref().is_none_or(|s| s.trim().is_empty());
    if current_blank
        && let Some(value) = incoming.as_deref()
        && !value.trim().is_empty()
    {
        *current = Some(value.to_string());
    }
}
