// ── Runtime backend configuration ──
//
// Describes *where* the mixer backend lives and how strictly its data is
// taken. Never touches disk: `mixdeck-config` (or a test) builds a
// `ControllerConfig` and hands it in.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use url::Url;

use mixdeck_api::MixerClient;

use crate::error::CoreError;

/// Default whole-request timeout for backend calls.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// What to do with a level control whose backend value lies outside its
/// own `[min, max]`.
///
/// Only applies to records delivered by the backend. The fallback dataset is
/// always served as-is.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum RangePolicy {
    /// Keep the value; the widget shows it with an overflowing percentage.
    #[default]
    PassThrough,
    /// Clamp the value into range.
    Clamp,
    /// Drop the control from the list.
    Reject,
}

/// Configuration for talking to a single mixer backend.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Backend base URL (e.g. `http://pipedal.local:5000/api`).
    pub base_url: Url,
    /// Request timeout.
    pub timeout: Duration,
    /// Handling of out-of-range backend levels.
    pub range_policy: RangePolicy,
}

impl ControllerConfig {
    /// Config for the backend on `host`, with default tuning.
    pub fn for_host(host: &str) -> Result<Self, CoreError> {
        let base_url = MixerClient::base_url_for_host(host).map_err(|e| CoreError::Config {
            message: format!("invalid host '{host}': {e}"),
        })?;
        Ok(Self::new(base_url))
    }

    /// Config for an explicit base URL, with default tuning.
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            timeout: DEFAULT_TIMEOUT,
            range_policy: RangePolicy::default(),
        }
    }

    /// Host name shown to the user (`Connected: <host>`).
    pub fn host(&self) -> &str {
        self.base_url.host_str().unwrap_or_default()
    }
}
