use crate::core::errors::BoxError;
use crate::core::remote::RemoteMetadata;
use crate::core::snapshot::Snapshot;
use chrono::{DateTime, NaiveDateTime, Utc};
use std::fmt;

/*-------------------------------------------------------------------------------------------------
  Freshness Validation
-------------------------------------------------------------------------------------------------*/

/// Outcome of validating a cached snapshot against the remote document's metadata.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Freshness {
    Valid,
    Stale(StaleReason),
}

impl Freshness {
    pub fn is_valid(&self) -> bool {
        matches!(self, Freshness::Valid)
    }
}

/// Why a snapshot may not be reused.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum StaleReason {
    /// No snapshot could be loaded.
    Absent,
    /// The snapshot timestamp is not a parsable date-time.
    InvalidTimestamp(String),
    /// The snapshot timestamp lies after the current time.
    FutureTimestamp(DateTime<Utc>),
    /// The metadata probe failed.
    ProbeFailed(String),
    /// The probe response carried no last-modified value.
    MissingLastModified,
    /// The remote last-modified value is not a parsable date-time.
    InvalidLastModified(String),
    /// The remote document changed after the snapshot was taken.
    UpstreamModified {
        remote: DateTime<Utc>,
        cached: DateTime<Utc>,
    },
}

impl fmt::Display for StaleReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StaleReason::Absent => write!(f, "no cached snapshot"),
            StaleReason::InvalidTimestamp(timestamp) => {
                write!(f, "cache does not contain a valid timestamp: {timestamp:?}")
            }
            StaleReason::FutureTimestamp(timestamp) => {
                write!(f, "cache timestamp {timestamp} is in the future")
            }
            StaleReason::ProbeFailed(error) => write!(f, "metadata probe failed: {error}"),
            StaleReason::MissingLastModified => {
                write!(f, "metadata response did not have a last-modified value")
            }
            StaleReason::InvalidLastModified(value) => {
                write!(f, "remote last-modified value is not a date: {value:?}")
            }
            StaleReason::UpstreamModified { remote, cached } => {
                write!(f, "upstream modified at {remote}, after cache timestamp {cached}")
            }
        }
    }
}

/// Decide whether `snapshot` may be reused.
///
/// Local time only rules out impossible timestamps; the remote last-modified time is the oracle.
/// The probe is only invoked once the local checks pass, and any failure to confirm freshness
/// is treated as staleness.
pub fn validate<P>(snapshot: Option<&Snapshot>, now: DateTime<Utc>, probe: P) -> Freshness
where
    P: FnOnce() -> std::result::Result<RemoteMetadata, BoxError>,
{
    let Some(snapshot) = snapshot else {
        return Freshness::Stale(StaleReason::Absent);
    };

    let Some(cached) = snapshot.fetched_at() else {
        return Freshness::Stale(StaleReason::InvalidTimestamp(snapshot.timestamp.clone()));
    };

    if cached > now {
        return Freshness::Stale(StaleReason::FutureTimestamp(cached));
    }

    let metadata = match probe() {
        Ok(metadata) => metadata,
        Err(error) => return Freshness::Stale(StaleReason::ProbeFailed(error.to_string())),
    };

    let Some(last_modified) = metadata.last_modified else {
        return Freshness::Stale(StaleReason::MissingLastModified);
    };

    let Some(remote) = parse_http_date(&last_modified) else {
        return Freshness::Stale(StaleReason::InvalidLastModified(last_modified));
    };

    if remote > cached {
        return Freshness::Stale(StaleReason::UpstreamModified { remote, cached });
    }

    Freshness::Valid
}

/// Obsolete HTTP-date forms, always in GMT: RFC 850 and ANSI C `asctime()`.
const RFC_850_FORMAT: &str = "%A, %d-%b-%y %H:%M:%S GMT";
const ASCTIME_FORMAT: &str = "%a %b %e %H:%M:%S %Y";

/// Parse an HTTP date (`Wed, 21 Oct 2015 07:28:00 GMT`), also accepting the obsolete RFC 850
/// and `asctime()` forms and RFC 3339.
pub fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    DateTime::parse_from_rfc2822(value)
        .or_else(|_| DateTime::parse_from_rfc3339(value))
        .map(|timestamp| timestamp.with_timezone(&Utc))
        .or_else(|_| NaiveDateTime::parse_from_str(value, RFC_850_FORMAT).map(|dt| dt.and_utc()))
        .or_else(|_| NaiveDateTime::parse_from_str(value, ASCTIME_FORMAT).map(|dt| dt.and_utc()))
        .ok()
}

/*-------------------------------------------------------------------------------------------------
  Unit Tests
-------------------------------------------------------------------------------------------------*/

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use std::cell::Cell;
    use test_log::test;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    fn snapshot_at(timestamp: DateTime<Utc>) -> Snapshot {
        Snapshot::new(timestamp, vec![])
    }

    fn probe_ok(last_modified: &str) -> std::result::Result<RemoteMetadata, BoxError> {
        Ok(RemoteMetadata::last_modified(last_modified))
    }

    #[test]
    fn test_valid_when_upstream_older_than_cache() {
        let snapshot = snapshot_at(now() - Duration::days(30));
        let freshness = validate(Some(&snapshot), now(), || {
            probe_ok("Mon, 01 Jan 2024 00:00:00 GMT")
        });
        assert_eq!(freshness, Freshness::Valid);
    }

    #[test]
    fn test_valid_when_upstream_equals_cache() {
        let cached = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let freshness = validate(Some(&snapshot_at(cached)), now(), || {
            probe_ok("Mon, 01 Jan 2024 00:00:00 GMT")
        });
        assert!(freshness.is_valid());
    }

    #[test]
    fn test_absent_snapshot_skips_probe() {
        let probed = Cell::new(false);
        let freshness = validate(None, now(), || {
            probed.set(true);
            probe_ok("Mon, 01 Jan 2024 00:00:00 GMT")
        });
        assert_eq!(freshness, Freshness::Stale(StaleReason::Absent));
        assert!(!probed.get());
    }

    #[test]
    fn test_invalid_timestamp_is_stale() {
        for timestamp in ["", "garbage", "2024-13-45T99:00:00Z", "1704067200"] {
            let snapshot = Snapshot {
                timestamp: timestamp.to_string(),
                prefixes: vec![],
            };
            let probed = Cell::new(false);
            let freshness = validate(Some(&snapshot), now(), || {
                probed.set(true);
                probe_ok("Mon, 01 Jan 2024 00:00:00 GMT")
            });
            assert_eq!(
                freshness,
                Freshness::Stale(StaleReason::InvalidTimestamp(timestamp.to_string()))
            );
            assert!(!probed.get());
        }
    }

    #[test]
    fn test_future_timestamp_is_stale() {
        let future = now() + Duration::seconds(1);
        let freshness = validate(Some(&snapshot_at(future)), now(), || {
            probe_ok("Mon, 01 Jan 2024 00:00:00 GMT")
        });
        assert_eq!(freshness, Freshness::Stale(StaleReason::FutureTimestamp(future)));
    }

    #[test]
    fn test_probe_failure_is_stale() {
        let snapshot = snapshot_at(now() - Duration::hours(1));
        let freshness = validate(Some(&snapshot), now(), || Err("timed out".into()));
        assert_eq!(
            freshness,
            Freshness::Stale(StaleReason::ProbeFailed("timed out".to_string()))
        );
    }

    #[test]
    fn test_missing_last_modified_is_stale() {
        let snapshot = snapshot_at(now() - Duration::hours(1));
        let freshness = validate(Some(&snapshot), now(), || Ok(RemoteMetadata::default()));
        assert_eq!(freshness, Freshness::Stale(StaleReason::MissingLastModified));
    }

    #[test]
    fn test_unparsable_last_modified_is_stale() {
        let snapshot = snapshot_at(now() - Duration::hours(1));
        let freshness = validate(Some(&snapshot), now(), || probe_ok("yesterday"));
        assert_eq!(
            freshness,
            Freshness::Stale(StaleReason::InvalidLastModified("yesterday".to_string()))
        );
    }

    #[test]
    fn test_upstream_modified_after_cache_is_stale() {
        let cached = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let freshness = validate(Some(&snapshot_at(cached)), now(), || {
            probe_ok("Mon, 01 Jan 2024 00:00:01 GMT")
        });
        assert!(matches!(
            freshness,
            Freshness::Stale(StaleReason::UpstreamModified { .. })
        ));
    }

    #[test]
    fn test_parse_http_date() {
        let expected = Utc.with_ymd_and_hms(2015, 10, 21, 7, 28, 0).unwrap();
        assert_eq!(parse_http_date("Wed, 21 Oct 2015 07:28:00 GMT"), Some(expected));
        assert_eq!(parse_http_date(" 2015-10-21T07:28:00Z "), Some(expected));
        assert_eq!(parse_http_date("21/10/2015"), None);
    }

    #[test]
    fn test_parse_obsolete_http_dates() {
        let expected = Utc.with_ymd_and_hms(1994, 11, 6, 8, 49, 37).unwrap();
        assert_eq!(parse_http_date("Sunday, 06-Nov-94 08:49:37 GMT"), Some(expected));
        assert_eq!(parse_http_date("Sun Nov  6 08:49:37 1994"), Some(expected));
    }
}
