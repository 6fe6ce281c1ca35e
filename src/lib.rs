//! Resolve a cloud provider's published IP ranges into a filtered list of CIDR prefixes, using a
//! locally persisted snapshot that is reused only while the provider confirms it is current.
//!
//! ```no_run
//! use ipranges::{Filter, Resolver};
//!
//! # fn main() -> ipranges::Result<()> {
//! let resolver = Resolver::new();
//!
//! // Fetches on the first call; later calls only probe the document's last-modified time
//! let cloudfront = resolver.resolve(&[Filter::service("CLOUDFRONT")])?;
//!
//! // EC2 anywhere, or S3 in the US regions
//! let filters = [
//!     Filter::service("EC2"),
//!     Filter::attributes()
//!         .equals("service", "S3")
//!         .matches("region", "^us-")?
//!         .build(),
//! ];
//! let prefixes = resolver.resolve(&filters)?;
//!
//! // Read the snapshot without touching the network
//! let cached = resolver.get_from_cache(&filters)?;
//! assert_eq!(prefixes, cached);
//! # Ok(())
//! # }
//! ```

/*-------------------------------------------------------------------------------------------------
  Library Modules
-------------------------------------------------------------------------------------------------*/

pub mod blocking;
mod core;

/*-------------------------------------------------------------------------------------------------
  Primary Interface
-------------------------------------------------------------------------------------------------*/

pub use crate::core::errors::{BoxError, Error, Result};
pub use crate::core::filter::{AttributeFilterBuilder, Filter, Matcher, PredicateFn};
pub use crate::core::freshness::{Freshness, StaleReason};
pub use crate::core::remote::{Document, Remote, RemoteMetadata};
pub use crate::core::resolver::{resolve, Resolver, ResolverBuilder};
pub use crate::core::snapshot::{PrefixEntry, Snapshot};
pub use crate::core::storage::{FileStorage, Storage};

/*-------------------------------------------------------------------------------------------------
  Re-exports
-------------------------------------------------------------------------------------------------*/

pub use regex;
