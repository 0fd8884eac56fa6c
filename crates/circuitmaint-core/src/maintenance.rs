//! Canonical maintenance record types.
//!
//! This module provides the validated output model of the library:
//! - [`Maintenance`]: one scheduled network-service disruption
//! - [`CircuitImpact`]: the impact of that disruption on one circuit
//! - [`Impact`] / [`Status`]: the controlled vocabularies for both
//!
//! Field names and enum spellings follow the maintenance-notification
//! BCOP extension fields (`X-MAINTNOTE-*`), so a serialized record is a
//! flat JSON object a downstream consumer can ingest directly.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The expected impact of a maintenance on one circuit.
///
/// Variants are ordered by severity, `NO-IMPACT` being the mildest and
/// `OUTAGE` the harshest, so impacts can be compared and ranked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Impact {
    /// No expected impact to the services in scope.
    #[serde(rename = "NO-IMPACT")]
    NoImpact,
    /// Services keep operating but without their normal redundancy.
    #[serde(rename = "REDUCED-REDUNDANCY")]
    ReducedRedundancy,
    /// Negative impact expected, short of a total outage.
    #[serde(rename = "DEGRADED")]
    Degraded,
    /// Services in scope are expected to be completely out of service.
    #[default]
    #[serde(rename = "OUTAGE")]
    Outage,
}

impl Impact {
    /// Returns the wire spelling of this impact.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoImpact => "NO-IMPACT",
            Self::ReducedRedundancy => "REDUCED-REDUNDANCY",
            Self::Degraded => "DEGRADED",
            Self::Outage => "OUTAGE",
        }
    }
}

impl fmt::Display for Impact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Impact {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "NO-IMPACT" => Ok(Self::NoImpact),
            "REDUCED-REDUNDANCY" => Ok(Self::ReducedRedundancy),
            "DEGRADED" => Ok(Self::Degraded),
            "OUTAGE" => Ok(Self::Outage),
            other => Err(ValidationError::UnknownImpact(other.to_string())),
        }
    }
}

/// The overall status or confirmation level of a maintenance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    /// The maintenance event is possible.
    #[serde(rename = "TENTATIVE")]
    Tentative,
    /// The maintenance event is definite.
    #[serde(rename = "CONFIRMED")]
    Confirmed,
    /// The maintenance event was cancelled.
    #[serde(rename = "CANCELLED")]
    Cancelled,
    /// The maintenance event is currently open.
    #[serde(rename = "IN-PROCESS")]
    InProcess,
    /// The maintenance event is closed.
    #[serde(rename = "COMPLETED")]
    Completed,
    /// The maintenance event was re-scheduled.
    #[serde(rename = "RE-SCHEDULED")]
    ReScheduled,
    /// An update that does not change the previously announced status.
    ///
    /// Only calendar payloads may omit their status; the calendar
    /// extractor fills this value in for them.
    #[serde(rename = "NO-CHANGE")]
    NoChange,
}

impl Status {
    /// Returns the wire spelling of this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tentative => "TENTATIVE",
            Self::Confirmed => "CONFIRMED",
            Self::Cancelled => "CANCELLED",
            Self::InProcess => "IN-PROCESS",
            Self::Completed => "COMPLETED",
            Self::ReScheduled => "RE-SCHEDULED",
            Self::NoChange => "NO-CHANGE",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Status {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "TENTATIVE" => Ok(Self::Tentative),
            "CONFIRMED" => Ok(Self::Confirmed),
            "CANCELLED" => Ok(Self::Cancelled),
            "IN-PROCESS" => Ok(Self::InProcess),
            "COMPLETED" => Ok(Self::Completed),
            "RE-SCHEDULED" => Ok(Self::ReScheduled),
            "NO-CHANGE" => Ok(Self::NoChange),
            other => Err(ValidationError::UnknownStatus(other.to_string())),
        }
    }
}

/// One circuit affected by a maintenance, with its specific impact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircuitImpact {
    /// Circuit unique identifier, as reported by the provider.
    pub circuit_id: String,
    /// Impact level for this circuit.
    pub impact: Impact,
}

impl CircuitImpact {
    /// Creates a circuit impact entry.
    pub fn new(circuit_id: impl Into<String>, impact: Impact) -> Self {
        Self {
            circuit_id: circuit_id.into(),
            impact,
        }
    }
}

/// A validated, canonical circuit-maintenance record.
///
/// `start`, `end` and `stamp` are UTC epoch seconds. Instances are built
/// by the reconciliation pipeline, which runs [`Maintenance::validate`]
/// before handing a record to the caller; a record is never mutated
/// afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Maintenance {
    /// Provider of the service under maintenance.
    pub provider: String,
    /// Account associated with the affected service.
    pub account: String,
    /// Text uniquely identifying this maintenance at the provider.
    pub maintenance_id: String,
    /// Affected circuits with their individual impact.
    pub circuits: Vec<CircuitImpact>,
    /// Overall status of the maintenance.
    pub status: Status,
    /// Start of the maintenance window (UTC epoch seconds).
    pub start: i64,
    /// End of the maintenance window (UTC epoch seconds).
    pub end: i64,
    /// When the notification itself was issued (UTC epoch seconds).
    pub stamp: i64,
    /// Contact information from the original notification.
    pub organizer: String,
    /// Unique identifier of the notification, `"0"` when the source
    /// format carries none.
    pub uid: String,
    /// Update serialization counter, `-1` when the source carries none.
    pub sequence: i32,
    /// Human-readable description of the maintenance.
    pub summary: String,
}

impl Maintenance {
    /// Checks the record invariants.
    ///
    /// # Errors
    ///
    /// Returns the first broken invariant: a blank or placeholder
    /// mandatory string, an empty or duplicated circuit list, or a
    /// window that ends before it starts.
    pub fn validate(&self) -> Result<(), ValidationError> {
        non_placeholder("provider", &self.provider)?;
        non_placeholder("account", &self.account)?;
        non_placeholder("maintenance_id", &self.maintenance_id)?;
        non_placeholder("organizer", &self.organizer)?;

        if self.circuits.is_empty() {
            return Err(ValidationError::NoCircuits);
        }
        for (idx, circuit) in self.circuits.iter().enumerate() {
            if self.circuits[..idx]
                .iter()
                .any(|c| c.circuit_id == circuit.circuit_id)
            {
                return Err(ValidationError::DuplicateCircuit(circuit.circuit_id.clone()));
            }
        }

        if self.end < self.start {
            return Err(ValidationError::EndBeforeStart {
                start: self.start,
                end: self.end,
            });
        }

        Ok(())
    }

    /// Lowercased first word of the provider name, usable as a slug.
    pub fn slug(&self) -> String {
        self.provider
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .to_lowercase()
    }

    /// Pretty-printed JSON representation of the record.
    ///
    /// # Errors
    ///
    /// Returns a `serde_json` error; with this type that only happens
    /// on formatter I/O failure.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

fn non_placeholder(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() || value == "None" {
        return Err(ValidationError::EmptyField { field });
    }
    Ok(())
}

/// An invariant broken while building or checking a [`Maintenance`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A mandatory field was absent from the merged extraction.
    #[error("mandatory field `{0}` is missing")]
    MissingField(&'static str),

    /// A mandatory string field was blank or a textual placeholder.
    #[error("field `{field}` is empty or a placeholder")]
    EmptyField {
        /// Name of the offending field.
        field: &'static str,
    },

    /// The circuit list was empty.
    #[error("at least one circuit has to be included in the maintenance")]
    NoCircuits,

    /// The same circuit id appeared more than once.
    #[error("circuit id `{0}` listed more than once")]
    DuplicateCircuit(String),

    /// The maintenance window ends before it starts.
    #[error("end time ({end}) precedes start time ({start})")]
    EndBeforeStart {
        /// Window start, UTC epoch seconds.
        start: i64,
        /// Window end, UTC epoch seconds.
        end: i64,
    },

    /// An impact string outside the controlled vocabulary.
    #[error("`{0}` is not a valid impact type")]
    UnknownImpact(String),

    /// A status string outside the controlled vocabulary.
    #[error("`{0}` is not a valid status type")]
    UnknownStatus(String),
}
