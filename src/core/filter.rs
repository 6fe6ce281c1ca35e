use crate::core::errors::{Error, Result};
use crate::core::snapshot::PrefixEntry;
use log::trace;
use regex::Regex;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/*-------------------------------------------------------------------------------------------------
  Filter
-------------------------------------------------------------------------------------------------*/

/// Predicate callback type used by [Filter::Predicate].
pub type PredicateFn = dyn Fn(&PrefixEntry) -> bool + Send + Sync;

/// A selection criterion matched against [PrefixEntry] values.
///
/// A sequence of filters selects an entry when *any* filter matches it. Within an
/// [Filter::Attributes] filter *every* key must match.
///
/// ```
/// use ipranges::Filter;
///
/// # fn main() -> ipranges::Result<()> {
/// let filters = [
///     Filter::service("EC2"),
///     Filter::attributes()
///         .equals("service", "S3")
///         .matches("region", "^us-")?
///         .build(),
/// ];
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub enum Filter {
    /// Service name, trimmed and compared case-insensitively.
    Service(String),

    /// Arbitrary predicate over the entry.
    Predicate(Arc<PredicateFn>),

    /// Field-level literal or pattern matches, all of which must hold.
    Attributes(Vec<(String, Matcher)>),
}

impl Filter {
    pub fn service<S: AsRef<str>>(service: S) -> Self {
        Filter::Service(service.as_ref().trim().to_uppercase())
    }

    pub fn predicate<F>(predicate: F) -> Self
    where
        F: Fn(&PrefixEntry) -> bool + Send + Sync + 'static,
    {
        Filter::Predicate(Arc::new(predicate))
    }

    pub fn attributes() -> AttributeFilterBuilder {
        AttributeFilterBuilder::default()
    }

    pub fn matches(&self, entry: &PrefixEntry) -> bool {
        match self {
            Filter::Service(service) => entry.service.trim().eq_ignore_ascii_case(service.trim()),
            Filter::Predicate(predicate) => predicate(entry),
            Filter::Attributes(matchers) => matchers.iter().all(|(key, matcher)| {
                let matched = matcher.matches(entry.field(key).as_ref());
                if !matched {
                    trace!("Entry {:?} does not match `{}` {:?}", entry.cidr(), key, matcher);
                }
                matched
            }),
        }
    }
}

impl fmt::Debug for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::Service(service) => f.debug_tuple("Service").field(service).finish(),
            Filter::Predicate(_) => f.write_str("Predicate(..)"),
            Filter::Attributes(matchers) => f.debug_tuple("Attributes").field(matchers).finish(),
        }
    }
}

/*--------------------------------------------------------------------------------------
  Attribute Matcher
--------------------------------------------------------------------------------------*/

/// How a single attribute is tested.
#[derive(Clone, Debug)]
pub enum Matcher {
    /// Exact equality with the attribute's JSON value.
    Literal(Value),

    /// Regular-expression search over the attribute's text.
    Pattern(Regex),
}

impl Matcher {
    /// Missing attributes never match.
    pub fn matches(&self, value: Option<&Value>) -> bool {
        let Some(value) = value else {
            return false;
        };

        match self {
            Matcher::Literal(expected) => value == expected,
            Matcher::Pattern(pattern) => match value {
                Value::String(text) => pattern.is_match(text),
                Value::Null | Value::Array(_) | Value::Object(_) => false,
                scalar => pattern.is_match(&scalar.to_string()),
            },
        }
    }
}

/*--------------------------------------------------------------------------------------
  Attribute Filter Builder
--------------------------------------------------------------------------------------*/

/// Builder for a [Filter::Attributes] filter.
#[derive(Debug, Default)]
pub struct AttributeFilterBuilder {
    matchers: Vec<(String, Matcher)>,
}

impl AttributeFilterBuilder {
    /// Require `key` to equal `value` exactly.
    pub fn equals<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.matchers
            .push((key.into(), Matcher::Literal(value.into())));
        self
    }

    /// Require `key` to match the regular expression `pattern`.
    pub fn matches<K: Into<String>>(mut self, key: K, pattern: &str) -> Result<Self> {
        let key = key.into();
        let pattern = Regex::new(pattern).map_err(|source| Error::InvalidPattern {
            key: key.clone(),
            source,
        })?;
        self.matchers.push((key, Matcher::Pattern(pattern)));
        Ok(self)
    }

    /// Require `key` to match an already compiled expression.
    pub fn matches_regex<K: Into<String>>(mut self, key: K, pattern: Regex) -> Self {
        self.matchers.push((key.into(), Matcher::Pattern(pattern)));
        self
    }

    pub fn build(self) -> Filter {
        Filter::Attributes(self.matchers)
    }
}

/*-------------------------------------------------------------------------------------------------
  Filter Functions
-------------------------------------------------------------------------------------------------*/

/// Whether `entry` is selected by `filters`. An empty filter list selects every entry.
pub fn include_entry(filters: &[Filter], entry: &PrefixEntry) -> bool {
    filters.is_empty() || filters.iter().any(|filter| filter.matches(entry))
}

/// Entries selected by `filters`, in their original order.
pub fn select<'e>(
    filters: &'e [Filter],
    entries: &'e [PrefixEntry],
) -> impl Iterator<Item = &'e PrefixEntry> + 'e {
    entries
        .iter()
        .filter(move |entry| include_entry(filters, entry))
}

/// CIDR strings of the entries selected by `filters`, in their original order.
pub fn select_cidrs(filters: &[Filter], entries: &[PrefixEntry]) -> Vec<String> {
    select(filters, entries)
        .filter_map(|entry| {
            entry.cidr().map(str::to_string).or_else(|| {
                trace!("Entry without a prefix: {:?}", entry);
                None
            })
        })
        .collect()
}

/*-------------------------------------------------------------------------------------------------
  Unit Tests
-------------------------------------------------------------------------------------------------*/

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::snapshot::tests::{test_entries, test_ipv4_entry};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /*-------------------------------------------------------------------------
      Test Single Filters
    -------------------------------------------------------------------------*/

    #[test]
    fn test_service_filter() {
        let entry = test_ipv4_entry("13.32.0.0/15", "CLOUDFRONT", "GLOBAL");

        assert!(Filter::service("CLOUDFRONT").matches(&entry));
        assert!(Filter::service("  cloudfront ").matches(&entry)); // Trimmed, case-insensitive
        assert!(!Filter::service("CLOUD").matches(&entry)); // Exact match only
        assert!(!Filter::service("EC2").matches(&entry));
    }

    #[test]
    fn test_predicate_filter() {
        let filter = Filter::predicate(|entry| entry.attribute("region") == Some("us-east-1"));

        assert!(filter.matches(&test_ipv4_entry("52.95.245.0/24", "EC2", "us-east-1")));
        assert!(!filter.matches(&test_ipv4_entry("3.5.160.0/22", "S3", "eu-west-1")));
    }

    #[test]
    fn test_attribute_literal_filter() {
        let entry = test_ipv4_entry("52.216.0.0/15", "S3", "us-east-1");

        let filter = Filter::attributes()
            .equals("service", "S3")
            .equals("region", "us-east-1")
            .build();
        assert!(filter.matches(&entry));

        // Literal comparison is exact
        let filter = Filter::attributes().equals("service", "s3").build();
        assert!(!filter.matches(&entry));

        // Missing attribute never matches
        let filter = Filter::attributes().equals("zone", "us-east-1a").build();
        assert!(!filter.matches(&entry));

        // Prefix fields are addressable
        let filter = Filter::attributes()
            .equals("ip_prefix", "52.216.0.0/15")
            .build();
        assert!(filter.matches(&entry));
    }

    #[test]
    fn test_attribute_pattern_filter() {
        let entry = test_ipv4_entry("52.216.0.0/15", "S3", "us-east-1");

        let filter = Filter::attributes().matches("region", "^us-").unwrap().build();
        assert!(filter.matches(&entry));

        let filter = Filter::attributes().matches("region", "^eu-").unwrap().build();
        assert!(!filter.matches(&entry));

        let filter = Filter::attributes().matches("ipv6_prefix", ".*").unwrap().build();
        assert!(!filter.matches(&entry));
    }

    #[test]
    fn test_attribute_pattern_on_scalar_values() {
        let mut entry = test_ipv4_entry("52.216.0.0/15", "S3", "us-east-1");
        entry.attributes.insert("weight".to_string(), json!(42));

        let filter = Filter::attributes().matches("weight", r"^\d+$").unwrap().build();
        assert!(filter.matches(&entry));

        let filter = Filter::attributes().equals("weight", 42).build();
        assert!(filter.matches(&entry));
    }

    #[test]
    fn test_invalid_pattern() {
        let result = Filter::attributes().matches("region", "([");
        assert!(matches!(result, Err(Error::InvalidPattern { key, .. }) if key == "region"));
    }

    /*-------------------------------------------------------------------------
      Test Filter Lists
    -------------------------------------------------------------------------*/

    #[test]
    fn test_no_filters_select_everything() {
        let entries = test_entries();
        let cidrs = select_cidrs(&[], &entries);
        assert_eq!(cidrs.len(), entries.len());
        assert_eq!(cidrs[0], "3.5.140.0/22");
        assert_eq!(cidrs[6], "2600:1f18::/33");
    }

    #[test]
    fn test_or_across_filters_and_within_attributes() {
        let filters = [
            Filter::service("EC2"),
            Filter::attributes()
                .equals("service", "S3")
                .matches("region", "^us-")
                .unwrap()
                .build(),
        ];

        let cidrs = select_cidrs(&filters, &test_entries());
        assert_eq!(
            cidrs,
            ["52.95.245.0/24", "52.216.0.0/15", "2600:1f18::/33"]
        );
    }

    #[test]
    fn test_selection_keeps_snapshot_order() {
        let cidrs = select_cidrs(&[Filter::service("cloudfront")], &test_entries());
        assert_eq!(cidrs, ["13.32.0.0/15", "2600:9000::/28"]);
    }

    #[test]
    fn test_filters_short_circuit() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let filters = [
            Filter::service("EC2"),
            Filter::predicate(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                false
            }),
        ];

        let entries = [test_ipv4_entry("52.95.245.0/24", "EC2", "us-east-1")];
        assert_eq!(select_cidrs(&filters, &entries).len(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_entry_without_prefix_is_skipped() {
        let mut entry = test_ipv4_entry("", "EC2", "us-east-1");
        entry.ip_prefix = None;
        assert!(select_cidrs(&[], &[entry]).is_empty());
    }
}
