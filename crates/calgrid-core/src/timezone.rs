//! Zone adjustment for stored instants.
//!
//! Stored instants are UTC. [`TimezoneResolver::resolve`] turns them into the
//! wall-clock value of the zone the event was written in. Two zone names are
//! not looked up in the IANA database:
//!
//! - [`FLOATING`]: the instant already is a wall-clock value
//! - anything starting with [`VTIMEZONE_MARKER`]: an embedded zone definition,
//!   which is not interpreted and leaves the instant unchanged

use std::collections::HashMap;
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, Utc};
use chrono_tz::Tz;
use thiserror::Error;
use tracing::trace;

/// Zone name of values with no fixed zone.
pub const FLOATING: &str = "floating";

/// Prefix of a zone column holding an embedded VTIMEZONE block.
pub const VTIMEZONE_MARKER: &str = "BEGIN:VTIMEZONE";

const MOZILLA_PREFIX: &str = "/mozilla.org/";

/// A zone name that is neither floating, an embedded block, nor a known zone.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unresolvable timezone {0:?}")]
pub struct UnknownTimezone(pub String);

/// Resolves zone names and applies their UTC offset.
///
/// Successful lookups are cached, so a resolver should live as long as the
/// stream of rows it serves.
#[derive(Debug, Default)]
pub struct TimezoneResolver {
    cache: HashMap<String, Tz>,
}

impl TimezoneResolver {
    /// Creates a new resolver with an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Converts `instant` to wall-clock time in `zone`.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownTimezone`] if `zone` is not floating, not an embedded
    /// block and not a recognized zone.
    pub fn resolve(
        &mut self,
        instant: DateTime<Utc>,
        zone: &str,
    ) -> Result<NaiveDateTime, UnknownTimezone> {
        if zone == FLOATING {
            return Ok(instant.naive_utc());
        }
        if zone.starts_with(VTIMEZONE_MARKER) {
            trace!("embedded VTIMEZONE block left uninterpreted");
            return Ok(instant.naive_utc());
        }

        let tz = self.lookup(zone)?;
        Ok(instant.with_timezone(&tz).naive_local())
    }

    fn lookup(&mut self, zone: &str) -> Result<Tz, UnknownTimezone> {
        if let Some(tz) = self.cache.get(zone) {
            return Ok(*tz);
        }

        let tz = Tz::from_str(normalize_zone_name(zone))
            .map_err(|_| UnknownTimezone(zone.to_string()))?;
        self.cache.insert(zone.to_string(), tz);
        Ok(tz)
    }
}

/// Strips the legacy `/mozilla.org/<version>/` prefix from a zone name.
fn normalize_zone_name(zone: &str) -> &str {
    zone.strip_prefix(MOZILLA_PREFIX)
        .and_then(|rest| rest.split_once('/'))
        .map_or(zone, |(_, name)| name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    fn naive(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn floating_is_identity() {
        let mut resolver = TimezoneResolver::new();
        for instant in [utc(2024, 1, 1, 0, 0), utc(2024, 7, 15, 13, 45), utc(1999, 12, 31, 23, 59)] {
            assert_eq!(resolver.resolve(instant, FLOATING).unwrap(), instant.naive_utc());
        }
    }

    #[test]
    fn applies_zone_offset() {
        let mut resolver = TimezoneResolver::new();

        // CET in winter
        let winter = resolver.resolve(utc(2024, 1, 10, 9, 0), "Europe/Berlin").unwrap();
        assert_eq!(winter, naive(2024, 1, 10, 10, 0));

        // CEST in summer
        let summer = resolver.resolve(utc(2024, 7, 10, 9, 0), "Europe/Berlin").unwrap();
        assert_eq!(summer, naive(2024, 7, 10, 11, 0));

        let new_york = resolver.resolve(utc(2024, 1, 10, 9, 0), "America/New_York").unwrap();
        assert_eq!(new_york, naive(2024, 1, 10, 4, 0));
    }

    #[test]
    fn utc_zone_name() {
        let mut resolver = TimezoneResolver::new();
        let instant = utc(2024, 3, 1, 8, 30);
        assert_eq!(resolver.resolve(instant, "UTC").unwrap(), instant.naive_utc());
    }

    #[test]
    fn embedded_block_left_unchanged() {
        let mut resolver = TimezoneResolver::new();
        let instant = utc(2024, 3, 1, 8, 30);
        let block = "BEGIN:VTIMEZONE\nTZID:Custom\nEND:VTIMEZONE";
        assert_eq!(resolver.resolve(instant, block).unwrap(), instant.naive_utc());
    }

    #[test]
    fn mozilla_prefixed_names() {
        let mut resolver = TimezoneResolver::new();
        let resolved = resolver
            .resolve(utc(2024, 1, 10, 9, 0), "/mozilla.org/20070129_1/Europe/Berlin")
            .unwrap();
        assert_eq!(resolved, naive(2024, 1, 10, 10, 0));
    }

    #[test]
    fn unknown_zone_is_an_error() {
        let mut resolver = TimezoneResolver::new();
        let err = resolver.resolve(utc(2024, 1, 1, 0, 0), "Mars/Olympus_Mons").unwrap_err();
        assert_eq!(err, UnknownTimezone("Mars/Olympus_Mons".to_string()));
        assert!(err.to_string().contains("Mars/Olympus_Mons"));

        // Empty names are not floating
        assert!(resolver.resolve(utc(2024, 1, 1, 0, 0), "").is_err());
    }

    #[test]
    fn lookups_are_cached() {
        let mut resolver = TimezoneResolver::new();
        resolver.resolve(utc(2024, 1, 1, 0, 0), "Asia/Tokyo").unwrap();
        resolver.resolve(utc(2024, 1, 2, 0, 0), "Asia/Tokyo").unwrap();
        assert_eq!(resolver.cache.len(), 1);
    }
}
