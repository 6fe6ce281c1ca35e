use crate::blocking::HttpRemote;
use crate::core::config;
use crate::core::errors::{Error, Result};
use crate::core::filter::{self, Filter};
use crate::core::freshness::{self, Freshness};
use crate::core::remote::Remote;
use crate::core::snapshot::{PrefixEntry, Snapshot};
use crate::core::storage::{FileStorage, Storage};
use crate::core::store::SnapshotStore;
use chrono::Utc;
use log::{error, log, Level};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError, RwLock};

/*-------------------------------------------------------------------------------------------------
  Simple Interface
-------------------------------------------------------------------------------------------------*/

/// _**Simple library interface**_ resolves the published IP ranges with the default resolver
/// configuration and returns the CIDR prefixes selected by `filters`.
///
/// ```no_run
/// let cloudfront = ipranges::resolve(&[ipranges::Filter::service("CLOUDFRONT")])?;
/// # Ok::<(), ipranges::Error>(())
/// ```
pub fn resolve(filters: &[Filter]) -> Result<Vec<String>> {
    Resolver::new().resolve(filters)
}

/*-------------------------------------------------------------------------------------------------
  Resolver Builder
-------------------------------------------------------------------------------------------------*/

/// A builder for the [Resolver] struct.
///
/// ```
/// let resolver = ipranges::ResolverBuilder::default()
///     .url("https://ip-ranges.amazonaws.com/ip-ranges.json")
///     .cache_file("/tmp/ip-ranges.cache.json")
///     .debug(true)
///     .build();
///
/// assert!(resolver.debug());
/// ```
///
/// [ResolverBuilder::new] sources initial values from the `IPRANGES_URL`,
/// `IPRANGES_CACHE_FILE` (or `AWS_IP_RANGES_CACHE_FILE_PATH`), and `IPRANGES_DEBUG`
/// environment variables; [ResolverBuilder::default] ignores the environment.
#[derive(Debug, Clone)]
pub struct ResolverBuilder {
    url: String,
    cache_file: PathBuf,
    debug: bool,
}

/*--------------------------------------------------------------------------------------
  Resolver Builder Implementation
--------------------------------------------------------------------------------------*/

impl Default for ResolverBuilder {
    /// Create a new [ResolverBuilder] with default configuration values.
    ///
    /// ```
    /// let resolver = ipranges::ResolverBuilder::default().build();
    ///
    /// assert_eq!(resolver.url(), "https://ip-ranges.amazonaws.com/ip-ranges.json");
    /// assert!(resolver.storage_path().ends_with("ip-ranges.cache.json"));
    /// assert!(!resolver.debug());
    /// ```
    fn default() -> Self {
        Self {
            url: config::DEFAULT_URL.to_string(),
            cache_file: config::default_cache_file(),
            debug: false,
        }
    }
}

impl ResolverBuilder {
    pub fn new() -> Self {
        let default = ResolverBuilder::default();

        let cache_file = config::try_env_var(config::ENV_CACHE_FILE)
            .or_else(|| config::try_env_var(config::ENV_CACHE_FILE_LEGACY))
            .unwrap_or(default.cache_file);

        Self {
            url: config::get_env_var(config::ENV_URL, default.url),
            cache_file,
            debug: config::get_env_var(config::ENV_DEBUG, default.debug),
        }
    }

    /*-------------------------------------------------------------------------
      Setters
    -------------------------------------------------------------------------*/

    /// Set the URL of the published IP ranges document.
    pub fn url(&mut self, url: &str) -> &mut Self {
        self.url = url.to_string();
        self
    }

    /// Set the file path used to persist the snapshot.
    pub fn cache_file<P: AsRef<Path>>(&mut self, cache_file: P) -> &mut Self {
        self.cache_file = cache_file.as_ref().to_path_buf();
        self
    }

    /// Raise the resolver's decision trail from `debug` to `info` log level.
    pub fn debug(&mut self, debug: bool) -> &mut Self {
        self.debug = debug;
        self
    }

    /*-------------------------------------------------------------------------
      Build Methods
    -------------------------------------------------------------------------*/

    /// Build a resolver using the local filesystem and HTTP.
    pub fn build(&self) -> Resolver {
        self.build_with(FileStorage, HttpRemote::new())
    }

    /// Build a resolver with injected storage and remote capabilities.
    pub fn build_with<S: Storage, R: Remote>(&self, storage: S, remote: R) -> Resolver<S, R> {
        Resolver {
            url: self.url.clone(),
            cache_file: RwLock::new(self.cache_file.clone()),
            debug: AtomicBool::new(self.debug),
            refresh_lock: Mutex::new(()),
            storage,
            remote,
        }
    }
}

/*-------------------------------------------------------------------------------------------------
  Resolver
-------------------------------------------------------------------------------------------------*/

/// Resolves the published IP ranges through a locally persisted snapshot.
///
/// A snapshot is reused only while the remote document's last-modified time is not newer than
/// the snapshot's timestamp; otherwise the document is fetched again and the snapshot replaced.
/// Calls to [Resolver::resolve] on the same resolver are serialized so that at most one refresh
/// is in flight.
///
/// ```no_run
/// use ipranges::{Filter, Resolver};
///
/// let resolver = Resolver::new();
/// let s3_us = resolver.resolve(&[Filter::attributes()
///     .equals("service", "S3")
///     .matches("region", "^us-")?
///     .build()])?;
/// let offline = resolver.get_from_cache(&[Filter::service("S3")])?;
/// # Ok::<(), ipranges::Error>(())
/// ```
#[derive(Debug)]
pub struct Resolver<S: Storage = FileStorage, R: Remote = HttpRemote> {
    url: String,
    cache_file: RwLock<PathBuf>,
    debug: AtomicBool,
    refresh_lock: Mutex<()>,
    storage: S,
    remote: R,
}

/*--------------------------------------------------------------------------------------
  Resolver Implementation
--------------------------------------------------------------------------------------*/

impl Default for Resolver {
    fn default() -> Self {
        ResolverBuilder::default().build()
    }
}

impl Resolver {
    /// Create a resolver configured from environment variables and defaults.
    pub fn new() -> Self {
        ResolverBuilder::new().build()
    }
}

impl<S: Storage, R: Remote> Resolver<S, R> {
    /*-------------------------------------------------------------------------
      Getters and Setters
    -------------------------------------------------------------------------*/

    pub fn url(&self) -> &str {
        &self.url
    }

    /// The path the snapshot is currently persisted to.
    pub fn storage_path(&self) -> PathBuf {
        self.cache_file
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Change where the snapshot is persisted. Takes effect on the next operation; operations
    /// already running keep the path they started with.
    pub fn set_storage_path<P: AsRef<Path>>(&self, path: P) {
        let path = path.as_ref().to_path_buf();
        self.trace(format_args!("Storage path set to {:?}", path));
        *self
            .cache_file
            .write()
            .unwrap_or_else(PoisonError::into_inner) = path;
    }

    pub fn debug(&self) -> bool {
        self.debug.load(Ordering::Relaxed)
    }

    /// Toggle verbose diagnostics.
    pub fn set_debug(&self, debug: bool) {
        self.debug.store(debug, Ordering::Relaxed);
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    /*-------------------------------------------------------------------------
      Public Operations
    -------------------------------------------------------------------------*/

    /// CIDR prefixes selected by `filters` (all prefixes when `filters` is empty), refreshing
    /// the cached snapshot first when it cannot be confirmed fresh.
    pub fn resolve(&self, filters: &[Filter]) -> Result<Vec<String>> {
        let snapshot = self.authoritative_snapshot()?;
        Ok(filter::select_cidrs(filters, &snapshot.prefixes))
    }

    /// Like [Resolver::resolve], returning the selected entries instead of their prefixes.
    pub fn resolve_entries(&self, filters: &[Filter]) -> Result<Vec<PrefixEntry>> {
        let snapshot = self.authoritative_snapshot()?;
        Ok(filter::select(filters, &snapshot.prefixes).cloned().collect())
    }

    /// Whether the cached snapshot is confirmed fresh. Never fetches or writes.
    pub fn is_up_to_date(&self) -> bool {
        self.freshness().is_valid()
    }

    /// Validate the cached snapshot, reporting why it is stale. Never fetches or writes.
    pub fn freshness(&self) -> Freshness {
        let path = self.storage_path();
        let snapshot = SnapshotStore::new(&self.storage, &path).load();
        self.validate(snapshot.as_ref())
    }

    /// CIDR prefixes selected by `filters` from the cached snapshot, without validating it
    /// and without touching the network.
    pub fn get_from_cache(&self, filters: &[Filter]) -> Result<Vec<String>> {
        let snapshot = self.cached_snapshot()?;
        Ok(filter::select_cidrs(filters, &snapshot.prefixes))
    }

    /// Like [Resolver::get_from_cache], returning the selected entries.
    pub fn get_entries_from_cache(&self, filters: &[Filter]) -> Result<Vec<PrefixEntry>> {
        let snapshot = self.cached_snapshot()?;
        Ok(filter::select(filters, &snapshot.prefixes).cloned().collect())
    }

    /// Remove the cached snapshot.
    pub fn clear_cache(&self) -> Result<()> {
        let path = self.storage_path();
        SnapshotStore::new(&self.storage, &path)
            .clear()
            .map_err(|source| Error::ClearFailure {
                path: path.clone(),
                source,
            })
            .inspect_err(|error| error!("{}", error))
    }

    /// Whether anything is stored at the current storage path.
    pub fn has_persisted(&self) -> bool {
        let path = self.storage_path();
        SnapshotStore::new(&self.storage, &path).has_persisted()
    }

    /*-------------------------------------------------------------------------
      Private Methods
    -------------------------------------------------------------------------*/

    /// Load the cached snapshot and reuse it when fresh; otherwise fetch, persist, and return a
    /// new one.
    fn authoritative_snapshot(&self) -> Result<Snapshot> {
        let _refresh = self
            .refresh_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let path = self.storage_path();
        let store = SnapshotStore::new(&self.storage, &path);

        let loaded = store.load();
        match (self.validate(loaded.as_ref()), loaded) {
            (Freshness::Valid, Some(snapshot)) => Ok(snapshot),
            _ => self.refresh(&store),
        }
    }

    fn refresh(&self, store: &SnapshotStore<'_, S>) -> Result<Snapshot> {
        self.trace(format_args!("Fetching a new snapshot from {}", self.url));

        let document = self
            .remote
            .fetch_document(&self.url)
            .map_err(|source| Error::RemoteUnavailable {
                url: self.url.clone(),
                source,
            })
            .inspect_err(|error| error!("{}", error))?;

        let snapshot = Snapshot::new(Utc::now(), document.into_entries());

        self.trace(format_args!("Writing new cache file {:?}", store.path()));
        store
            .save(&snapshot)
            .map_err(|source| Error::PersistFailure {
                path: store.path().to_path_buf(),
                source,
            })
            .inspect_err(|error| error!("{}", error))?;

        Ok(snapshot)
    }

    fn cached_snapshot(&self) -> Result<Snapshot> {
        let path = self.storage_path();
        let snapshot = SnapshotStore::new(&self.storage, &path).load();
        snapshot.ok_or(Error::CacheUnavailable { path })
    }

    fn validate(&self, snapshot: Option<&Snapshot>) -> Freshness {
        let freshness = freshness::validate(snapshot, Utc::now(), || {
            self.remote.head_metadata(&self.url)
        });
        match &freshness {
            Freshness::Valid => self.trace(format_args!("Cache is up to date")),
            Freshness::Stale(reason) => self.trace(format_args!("Cache is stale: {}", reason)),
        }
        freshness
    }

    /// Log the resolver's decision trail at `info` when debugging, `debug` otherwise.
    fn trace(&self, message: std::fmt::Arguments<'_>) {
        let level = if self.debug() {
            Level::Info
        } else {
            Level::Debug
        };
        log!(level, "{}", message);
    }
}

/*-------------------------------------------------------------------------------------------------
  Unit Tests
-------------------------------------------------------------------------------------------------*/
