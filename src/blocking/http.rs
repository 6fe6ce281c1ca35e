use crate::core::errors::BoxError;
use crate::core::remote::{Document, Remote, RemoteMetadata};
use log::{debug, trace};
use reqwest::blocking::Client;
use reqwest::header::LAST_MODIFIED;

/*-------------------------------------------------------------------------------------------------
  Blocking HTTP Remote
-------------------------------------------------------------------------------------------------*/

/// [Remote] implementation backed by a blocking `reqwest` client. Each call is a single request;
/// failures are returned to the caller without retrying.
#[derive(Debug, Clone, Default)]
pub struct HttpRemote {
    client: Client,
}

impl HttpRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl Remote for HttpRemote {
    fn head_metadata(&self, url: &str) -> std::result::Result<RemoteMetadata, BoxError> {
        debug!("Get IP ranges metadata: HEAD {}", url);
        let response = self.client.head(url).send()?.error_for_status()?;

        let last_modified = response
            .headers()
            .get(LAST_MODIFIED)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        trace!("HEAD {} last-modified: {:?}", url, last_modified);

        Ok(RemoteMetadata { last_modified })
    }

    fn fetch_document(&self, url: &str) -> std::result::Result<Document, BoxError> {
        debug!("Get IP ranges document: GET {}", url);
        let document: Document = self.client.get(url).send()?.error_for_status()?.json()?;
        debug!(
            "Retrieved {} IPv4 and {} IPv6 prefixes",
            document.prefixes.len(),
            document.ipv6_prefixes.len()
        );
        Ok(document)
    }
}

/*-------------------------------------------------------------------------------------------------
  Unit Tests
-------------------------------------------------------------------------------------------------*/
