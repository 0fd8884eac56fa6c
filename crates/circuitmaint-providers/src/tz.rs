//! Local-time-to-UTC resolution for formats that only hint at a place.
//!
//! Some providers write maintenance windows in local civil time with
//! nothing but a city or metro name next to them. [`TimezoneResolver`]
//! turns such a (naive datetime, place hint) pair into a UTC instant:
//! first through a bundled offline place table, then — on a miss —
//! through a pluggable [`GeoBackend`] doing a remote geocoding lookup.
//! Successful lookups are cached for the lifetime of the resolver
//! instance and never persisted.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, NaiveDateTime, TimeZone as _, Utc};
use chrono_tz::Tz;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

/// A resolution failure. Non-fatal by contract: the calling extractor
/// leaves the affected field unset instead of dropping its record.
#[derive(Debug, Error)]
pub enum ResolutionError {
    /// The place is not in the offline table and no backend is
    /// configured, or the backend did not know it either.
    #[error("unknown place `{0}`")]
    UnknownPlace(String),

    /// The remote lookup failed.
    #[error("geocoding lookup failed: {0}")]
    Backend(String),

    /// The zone is known but the local time does not exist in it
    /// (a DST gap).
    #[error("local time {0} does not exist in zone {1}")]
    InvalidLocalTime(NaiveDateTime, String),
}

/// Remote place-to-timezone lookup.
pub trait GeoBackend: Send + Sync {
    /// Resolves a free-form place name to an IANA timezone.
    ///
    /// # Errors
    ///
    /// Returns [`ResolutionError::Backend`] on transport problems and
    /// [`ResolutionError::UnknownPlace`] when the service has no match.
    fn timezone_for(&self, place: &str) -> Result<Tz, ResolutionError>;
}

/// Offline place table. Metro names and the bare region words that
/// providers print next to maintenance windows.
const BUILTIN_PLACES: &[(&str, Tz)] = &[
    ("amsterdam", Tz::Europe__Amsterdam),
    ("ashburn", Tz::America__New_York),
    ("atlanta", Tz::America__New_York),
    ("central", Tz::America__Chicago),
    ("chicago", Tz::America__Chicago),
    ("dallas", Tz::America__Chicago),
    ("denver", Tz::America__Denver),
    ("dubai", Tz::Asia__Dubai),
    ("dublin", Tz::Europe__Dublin),
    ("eastern", Tz::America__New_York),
    ("frankfurt", Tz::Europe__Berlin),
    ("gmt", Tz::UTC),
    ("hillsboro", Tz::America__Los_Angeles),
    ("hong kong", Tz::Asia__Hong_Kong),
    ("london", Tz::Europe__London),
    ("los angeles", Tz::America__Los_Angeles),
    ("madrid", Tz::Europe__Madrid),
    ("miami", Tz::America__New_York),
    ("milan", Tz::Europe__Rome),
    ("mountain", Tz::America__Denver),
    ("mumbai", Tz::Asia__Kolkata),
    ("new york", Tz::America__New_York),
    ("pacific", Tz::America__Los_Angeles),
    ("paris", Tz::Europe__Paris),
    ("sao paulo", Tz::America__Sao_Paulo),
    ("seattle", Tz::America__Los_Angeles),
    ("singapore", Tz::Asia__Singapore),
    ("sydney", Tz::Australia__Sydney),
    ("tokyo", Tz::Asia__Tokyo),
    ("toronto", Tz::America__Toronto),
    ("utc", Tz::UTC),
];

/// Converts (naive local datetime, place hint) pairs to UTC instants.
///
/// The remote-result cache lives inside the instance — construct one
/// resolver per worker, or share one and pay a short lock on each miss.
pub struct TimezoneResolver {
    backend: Option<Box<dyn GeoBackend>>,
    cache: Mutex<HashMap<String, Tz>>,
}

impl TimezoneResolver {
    /// A resolver limited to the bundled offline table.
    pub fn offline() -> Self {
        Self {
            backend: None,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// A resolver that falls back to the given backend on table misses.
    pub fn with_backend(backend: Box<dyn GeoBackend>) -> Self {
        Self {
            backend: Some(backend),
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Resolves a place hint to its IANA timezone.
    ///
    /// # Errors
    ///
    /// See [`ResolutionError`]. Also see the IANA name parse: a place
    /// hint that is already a zone name ("Europe/Rome") short-circuits.
    pub fn zone_for(&self, place: &str) -> Result<Tz, ResolutionError> {
        let key = place.trim().to_lowercase();
        if key.is_empty() {
            return Err(ResolutionError::UnknownPlace(place.to_string()));
        }

        if let Some(tz) = self.cached(&key) {
            return Ok(tz);
        }

        if let Ok(tz) = place.trim().parse::<Tz>() {
            self.remember(&key, tz);
            return Ok(tz);
        }

        if let Some((_, tz)) = BUILTIN_PLACES.iter().find(|(name, _)| *name == key) {
            self.remember(&key, *tz);
            return Ok(*tz);
        }

        let Some(backend) = self.backend.as_deref() else {
            debug!(place, "place not in offline table and no geo backend configured");
            return Err(ResolutionError::UnknownPlace(place.to_string()));
        };

        match backend.timezone_for(place) {
            Ok(tz) => {
                self.remember(&key, tz);
                Ok(tz)
            }
            Err(err) => {
                warn!(place, error = %err, "remote timezone lookup failed");
                Err(err)
            }
        }
    }

    /// Anchors a naive local datetime to the zone of `place` and
    /// returns the corresponding UTC instant. Ambiguous local times
    /// (DST fold) resolve to the earlier instant.
    ///
    /// # Errors
    ///
    /// See [`ResolutionError`].
    pub fn resolve(
        &self,
        local: NaiveDateTime,
        place: &str,
    ) -> Result<DateTime<Utc>, ResolutionError> {
        let tz = self.zone_for(place)?;
        tz.from_local_datetime(&local)
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
            .ok_or_else(|| ResolutionError::InvalidLocalTime(local, tz.name().to_string()))
    }

    fn cached(&self, key: &str) -> Option<Tz> {
        self.lock().get(key).copied()
    }

    fn remember(&self, key: &str, tz: Tz) {
        self.lock().insert(key.to_string(), tz);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Tz>> {
        self.cache
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl Default for TimezoneResolver {
    fn default() -> Self {
        Self::offline()
    }
}

/// [`GeoBackend`] backed by the Open-Meteo geocoding API, which returns
/// the IANA timezone of the best-matching place in a single call.
pub struct OpenMeteoBackend {
    client: reqwest::blocking::Client,
    endpoint: String,
}

#[derive(Debug, Deserialize)]
struct GeocodingResponse {
    #[serde(default)]
    results: Vec<GeocodingResult>,
}

#[derive(Debug, Deserialize)]
struct GeocodingResult {
    timezone: Option<String>,
}

impl OpenMeteoBackend {
    /// Backend against the public Open-Meteo endpoint.
    pub fn new() -> Self {
        Self::with_endpoint("https://geocoding-api.open-meteo.com/v1/search")
    }

    /// Backend against a custom endpoint (tests, mirrors).
    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::blocking::Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

impl Default for OpenMeteoBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl GeoBackend for OpenMeteoBackend {
    fn timezone_for(&self, place: &str) -> Result<Tz, ResolutionError> {
        let response: GeocodingResponse = self
            .client
            .get(&self.endpoint)
            .query(&[("name", place), ("count", "1")])
            .send()
            .and_then(reqwest::blocking::Response::error_for_status)
            .map_err(|err| ResolutionError::Backend(err.to_string()))?
            .json()
            .map_err(|err| ResolutionError::Backend(err.to_string()))?;

        let Some(zone) = response
            .results
            .into_iter()
            .find_map(|result| result.timezone)
        else {
            return Err(ResolutionError::UnknownPlace(place.to_string()));
        };

        zone.parse::<Tz>()
            .map_err(|err| ResolutionError::Backend(format!("bad zone `{zone}`: {err}")))
    }
}
