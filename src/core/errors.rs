use std::path::PathBuf;

/*-------------------------------------------------------------------------------------------------
  Errors and Results
-------------------------------------------------------------------------------------------------*/

/// Boxed error type returned by the injected remote capability.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that surface to callers of the [Resolver](crate::Resolver) operations.
///
/// A missing, unreadable, or unparsable cache file is never reported as an error; the snapshot
/// store treats all three as "no snapshot" and the resolver takes the refresh path.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The metadata probe or the full document fetch failed.
    #[error("remote IP ranges unavailable from `{url}`: {source}")]
    RemoteUnavailable {
        url: String,
        #[source]
        source: BoxError,
    },

    /// The cache was required (no network allowed) but could not be loaded.
    #[error("cache does not exist or is not readable: {path:?}")]
    CacheUnavailable { path: PathBuf },

    /// A freshly fetched snapshot could not be written to storage.
    #[error("failed to persist snapshot to {path:?}: {source}")]
    PersistFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The cache file could neither be deleted nor overwritten.
    #[error("failed to clear cache file {path:?}: {source}")]
    ClearFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A mapping-filter pattern is not a valid regular expression.
    #[error("invalid filter pattern for `{key}`: {source}")]
    InvalidPattern {
        key: String,
        #[source]
        source: regex::Error,
    },

    /// A filter argument could not be parsed.
    #[error("invalid filter: {0}")]
    InvalidFilter(String),
}

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/*--------------------------------------------------------------------------------------
  Log Error Function
--------------------------------------------------------------------------------------*/

#[cfg(test)]
pub(crate) fn log_error(error: &Error) {
    log::error!("{}", error);
}
