// Mixer backend HTTP client
//
// Wraps `reqwest::Client` with the backend's URL layout: every route lives
// under `{scheme}://{host}:{port}/api`. The scheme and port are fixed by the
// backend; only the host varies between installations.

use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::models::{ControlPatch, ControlRecord};
use crate::transport::TransportConfig;

/// Scheme the backend listens on.
pub const BACKEND_SCHEME: &str = "http";
/// Port the backend listens on.
pub const BACKEND_PORT: u16 = 5000;
/// Route prefix shared by every endpoint.
pub const API_PREFIX: &str = "/api";

/// Raw HTTP client for the mixer backend. Cheap to clone: the inner
/// `reqwest::Client` is reference counted.
#[derive(Clone)]
pub struct MixerClient {
    http: reqwest::Client,
    base_url: Url,
}

impl MixerClient {
    /// Create a client for `base_url` (e.g. `http://pipedal.local:5000/api`).
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self { http, base_url })
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self { http, base_url }
    }

    /// Derive the backend base URL from the device host name.
    ///
    /// `base_url_for_host("pipedal.local")` → `http://pipedal.local:5000/api`.
    /// Bare IPv6 literals are bracketed.
    pub fn base_url_for_host(host: &str) -> Result<Url, Error> {
        let host = host.trim();
        let host = if host.contains(':') && !host.starts_with('[') {
            format!("[{host}]")
        } else {
            host.to_owned()
        };
        let url = Url::parse(&format!(
            "{BACKEND_SCHEME}://{host}:{BACKEND_PORT}{API_PREFIX}"
        ))?;
        Ok(url)
    }

    /// The backend base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── Endpoints ────────────────────────────────────────────────────

    /// Fetch the full control list.
    ///
    /// `GET {base}/controls`
    pub async fn list_controls(&self) -> Result<Vec<ControlRecord>, Error> {
        let url = self.endpoint(&["controls"])?;
        self.get(url).await
    }

    /// Push a partial change for one control. The response body is ignored.
    ///
    /// `POST {base}/controls/{id}`
    pub async fn update_control(&self, id: &str, patch: &ControlPatch) -> Result<(), Error> {
        let url = self.endpoint(&["controls", id])?;
        debug!("POST {}", url);

        let resp = self
            .http
            .post(url.clone())
            .json(patch)
            .send()
            .await
            .map_err(Error::Transport)?;

        check_status(&resp, &url)
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Append path segments to the base URL. Segments are percent-encoded,
    /// so control ids containing spaces or slashes stay a single segment.
    pub(crate) fn endpoint(&self, segments: &[&str]) -> Result<Url, Error> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| Error::InvalidBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Send a GET request and decode the JSON body.
    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!("GET {}", url);

        let resp = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(Error::Transport)?;

        check_status(&resp, &url)?;

        let body = resp.text().await.map_err(Error::Transport)?;
        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body,
        })
    }
}

fn check_status(resp: &reqwest::Response, url: &Url) -> Result<(), Error> {
    let status = resp.status();
    if status.is_success() {
        Ok(())
    } else {
        Err(Error::Status {
            status: status.as_u16(),
            url: url.to_string(),
        })
    }
}
