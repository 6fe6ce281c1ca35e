use log::{info, warn};
use std::env;
use std::path::PathBuf;

/*-------------------------------------------------------------------------------------------------
  Configuration
-------------------------------------------------------------------------------------------------*/

/// URL of the published AWS IP ranges document.
pub const DEFAULT_URL: &str = "https://ip-ranges.amazonaws.com/ip-ranges.json";

pub const ENV_URL: &str = "IPRANGES_URL";
pub const ENV_CACHE_FILE: &str = "IPRANGES_CACHE_FILE";
pub const ENV_DEBUG: &str = "IPRANGES_DEBUG";

/// Older name for [ENV_CACHE_FILE], still honored when the new variable is unset.
pub const ENV_CACHE_FILE_LEGACY: &str = "AWS_IP_RANGES_CACHE_FILE_PATH";

/// Default cache file: `${HOME}/.aws/ip-ranges.cache.json`, or `./.aws/ip-ranges.cache.json`
/// when the home directory cannot be determined.
pub fn default_cache_file() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".aws")
        .join("ip-ranges.cache.json")
}

/*--------------------------------------------------------------------------------------
  Environment Variables
--------------------------------------------------------------------------------------*/

/// Get and parse an environment variable value or return a default value.
pub fn get_env_var<T: std::str::FromStr>(env_var: &str, default: T) -> T {
    try_env_var(env_var).unwrap_or(default)
}

/// Get and parse an environment variable value; `None` when unset or invalid.
pub fn try_env_var<T: std::str::FromStr>(env_var: &str) -> Option<T> {
    env::var(env_var).ok().and_then(|value| {
        value
            .parse::<T>()
            .inspect(|_| info!("Using {}: {}", env_var, value))
            .inspect_err(|_| warn!("Invalid {}: {}", env_var, value))
            .ok()
    })
}

/*-------------------------------------------------------------------------------------------------
  Unit Tests
-------------------------------------------------------------------------------------------------*/
