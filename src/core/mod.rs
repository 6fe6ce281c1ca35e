/*-------------------------------------------------------------------------------------------------
  Core Modules
-------------------------------------------------------------------------------------------------*/

pub mod config;
pub mod errors;
pub mod filter;
pub mod freshness;
pub mod remote;
pub mod resolver;
pub mod snapshot;
pub mod storage;
pub mod store;
