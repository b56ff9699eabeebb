// PSE transmission-map HTTP client
//
// One endpoint, one verb. The body is decoded strictly (UTF-8, then JSON)
// and handed back untyped: field-level interpretation belongs to the core
// crate, which reads paths lazily so a malformed payload surfaces per
// entity instead of failing the whole poll.

use tracing::{debug, trace};
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;

/// Public transmission-map service of the Polish transmission system operator.
pub const BASE_API_URL: &str = "https://www.pse.pl/transmissionMapService";

/// Number of body characters kept in decode error messages.
const BODY_PREVIEW_CHARS: usize = 200;

/// Raw HTTP client for the PSE transmission-map endpoint.
///
/// Cheap to clone: the inner `reqwest::Client` is reference counted.
#[derive(Debug, Clone)]
pub struct PseClient {
    http: reqwest::Client,
    endpoint: Url,
}

impl PseClient {
    /// Create a client for `endpoint` from a `TransportConfig`.
    pub fn new(endpoint: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self { http, endpoint })
    }

    /// Create a client for the public PSE endpoint with default transport settings.
    pub fn public() -> Result<Self, Error> {
        let endpoint = Url::parse(BASE_API_URL)?;
        Self::new(endpoint, &TransportConfig::default())
    }

    /// The endpoint this client polls.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Fetch the current transmission map as a JSON document.
    ///
    /// Non-2xx responses are transport errors. The body must be valid UTF-8
    /// and valid JSON, otherwise `Error::Decode` is returned. No retries.
    pub async fn fetch(&self) -> Result<serde_json::Value, Error> {
        debug!("GET {}", self.endpoint);

        let resp = self
            .http
            .get(self.endpoint.clone())
            .send()
            .await?
            .error_for_status()?;

        let bytes = resp.bytes().await?;
        trace!(len = bytes.len(), "received response body");

        let body = String::from_utf8(bytes.to_vec()).map_err(|e| Error::Decode {
            message: format!("body is not valid UTF-8: {e}"),
            body: String::from_utf8_lossy(&bytes).into_owned(),
        })?;

        serde_json::from_str(&body).map_err(|e| {
            let preview: String = body.chars().take(BODY_PREVIEW_CHARS).collect();
            Error::Decode {
                message: format!("{e} (body preview: {preview:?})"),
                body,
            }
        })
    }
}
