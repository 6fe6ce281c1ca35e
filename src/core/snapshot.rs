use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/*-------------------------------------------------------------------------------------------------
  Prefix Entry
-------------------------------------------------------------------------------------------------*/

/// One published IP range. Exactly one of `ip_prefix` (IPv4) or `ipv6_prefix` (IPv6) is
/// populated. Provider-specific fields (`region`, `network_border_group`, ...) are kept verbatim
/// in `attributes` so they round-trip through the cache file.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct PrefixEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_prefix: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipv6_prefix: Option<String>,

    pub service: String,

    #[serde(flatten)]
    pub attributes: BTreeMap<String, Value>,
}

impl PrefixEntry {
    /// The CIDR string carried by the entry, IPv4 first.
    pub fn cidr(&self) -> Option<&str> {
        self.ip_prefix
            .as_deref()
            .filter(|prefix| !prefix.is_empty())
            .or(self.ipv6_prefix.as_deref())
            .filter(|prefix| !prefix.is_empty())
    }

    /// Look up a field by name for filter matching. The well-known fields shadow any extra
    /// attribute with the same name.
    pub fn field(&self, key: &str) -> Option<Value> {
        match key {
            "ip_prefix" => self.ip_prefix.clone().map(Value::String),
            "ipv6_prefix" => self.ipv6_prefix.clone().map(Value::String),
            "service" => Some(Value::String(self.service.clone())),
            _ => self.attributes.get(key).cloned(),
        }
    }

    /// Convenience accessor for a string attribute such as `region`.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(Value::as_str)
    }
}

/*-------------------------------------------------------------------------------------------------
  Snapshot
-------------------------------------------------------------------------------------------------*/

/// The cached unit of truth: the prefix list together with the time it was fetched.
///
/// The timestamp is kept as the raw persisted string. A cache file whose timestamp does not
/// parse still loads (so it can be read offline) but never passes freshness validation.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Snapshot {
    pub timestamp: String,
    pub prefixes: Vec<PrefixEntry>,
}

impl Snapshot {
    pub fn new(timestamp: DateTime<Utc>, prefixes: Vec<PrefixEntry>) -> Self {
        Self {
            timestamp: timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
            prefixes,
        }
    }

    /// The snapshot timestamp, or `None` when the stored value is not an RFC 3339 date-time.
    pub fn fetched_at(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(self.timestamp.trim())
            .ok()
            .map(|timestamp| timestamp.with_timezone(&Utc))
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

/*-------------------------------------------------------------------------------------------------
  Unit Tests
-------------------------------------------------------------------------------------------------*/
