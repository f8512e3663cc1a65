// Tracking endpoint client
//
// Wraps `reqwest::Client` with the query layout a Matomo-compatible
// tracker expects. One `TrackingHit` maps to exactly one GET request;
// nothing is queued or retried here.

use std::time::Duration;

use indexmap::IndexMap;
use serde_json::{Map, Value};
use tracing::debug;
use url::Url;
use uuid::Uuid;

use crate::error::Error;
use crate::transport::TransportConfig;

/// Path of the tracking script, relative to the configured base URL.
const TRACKING_PATH: &str = "matomo.php";

/// Connection settings for a tracking endpoint.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Tracker root, e.g. `https://espeasy.homey.joolee.nl`.
    pub base_url: Url,
    /// Site identifier registered on the tracker.
    pub site_id: u32,
    /// Application id, used as the host part of the reported `app://` URL.
    pub app_id: String,
    /// Length of the tracker's visit window. The first snapshot has to be
    /// sent before it elapses.
    pub initial_timeout: Duration,
}

/// A single telemetry hit: one category/reason pair plus its metrics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackingHit {
    pub category: String,
    pub reason: String,
    pub route: String,
    pub metrics: IndexMap<String, u64>,
}

/// HTTP client for a Matomo-compatible tracking endpoint.
///
/// Every client carries a random visitor id for its whole lifetime, so
/// all hits from one process are grouped into the same visit.
pub struct TelemetryClient {
    http: reqwest::Client,
    config: TelemetryConfig,
    visitor_id: String,
}

impl TelemetryClient {
    /// Create a new client from a `TransportConfig`.
    pub fn new(config: TelemetryConfig, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self::from_reqwest(config, http))
    }

    /// Create a client around a pre-built `reqwest::Client`.
    pub fn from_reqwest(config: TelemetryConfig, http: reqwest::Client) -> Self {
        let visitor_id = Uuid::new_v4().simple().to_string().chars().take(16).collect();
        Self {
            http,
            config,
            visitor_id,
        }
    }

    /// The tracker's visit window.
    pub fn initial_timeout(&self) -> Duration {
        self.config.initial_timeout
    }

    /// The 16 hex character visitor id sent with every hit.
    pub fn visitor_id(&self) -> &str {
        &self.visitor_id
    }

    /// The endpoint configuration.
    pub fn config(&self) -> &TelemetryConfig {
        &self.config
    }

    // ── URL / query builders ─────────────────────────────────────────

    /// Full URL of the tracking script.
    pub(crate) fn tracking_url(&self) -> Result<Url, Error> {
        let mut base = self.config.base_url.clone();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(base.join(TRACKING_PATH)?)
    }

    /// Query parameters for a hit, in the order they are sent.
    pub fn query_pairs(&self, hit: &TrackingHit) -> Result<Vec<(&'static str, String)>, Error> {
        Ok(vec![
            ("idsite", self.config.site_id.to_string()),
            ("rec", "1".into()),
            ("apiv", "1".into()),
            ("_id", self.visitor_id.clone()),
            ("rand", Uuid::new_v4().simple().to_string()),
            ("url", format!("app://{}{}", self.config.app_id, hit.route)),
            ("action_name", format!("{}/{}", hit.category, hit.reason)),
            ("e_c", hit.category.clone()),
            ("e_a", hit.reason.clone()),
            ("cvar", encode_custom_variables(&hit.metrics)?),
        ])
    }

    // ── Delivery ─────────────────────────────────────────────────────

    /// Deliver one hit and wait for the tracker's answer.
    pub async fn deliver(&self, hit: &TrackingHit) -> Result<(), Error> {
        let url = self.tracking_url()?;
        let query = self.query_pairs(hit)?;
        debug!(category = %hit.category, reason = %hit.reason, %url, "delivering telemetry hit");

        let resp = self.http.get(url).query(&query).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Rejected {
                status: status.as_u16(),
            });
        }
        Ok(())
    }
}

/// Encode metrics as Matomo custom variables:
/// `{"1":["Total tasks","5"],"2":[...]}`, numbered from 1 in key order.
pub fn encode_custom_variables(metrics: &IndexMap<String, u64>) -> Result<String, Error> {
    let vars: Map<String, Value> = metrics
        .iter()
        .enumerate()
        .map(|(i, (name, value))| {
            (
                (i + 1).to_string(),
                Value::Array(vec![
                    Value::String(name.clone()),
                    Value::String(value.to_string()),
                ]),
            )
        })
        .collect();
    Ok(serde_json::to_string(&vars)?)
}
