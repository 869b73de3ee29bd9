//! Google geocoding adapter

use std::env;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::config::GeocodeSettings;
use crate::domain::{Coordinates, GeocodePort};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

pub struct GoogleGeocoder {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl GoogleGeocoder {
    pub fn new(settings: &GeocodeSettings) -> anyhow::Result<Self> {
        let api_key = env::var(&settings.api_key_env).map_err(|_| {
            anyhow::anyhow!("Environment variable {} not set", settings.api_key_env)
        })?;

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: settings.base_url.clone(),
        })
    }
}

#[async_trait]
impl GeocodePort for GoogleGeocoder {
    async fn lookup(&self, query: &str) -> anyhow::Result<Option<Coordinates>> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("address", query),
                ("language", "ja"),
                ("key", self.api_key.as_str()),
            ])
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?
            .error_for_status()?;

        let data: Value = response.json().await?;

        if data.get("status").and_then(|s| s.as_str()) != Some("OK") {
            debug!(query, status = ?data.get("status"), "geocode returned no result");
            return Ok(None);
        }

        let location = data
            .pointer("/results/0/geometry/location")
            .cloned()
            .unwrap_or_default();
        match (
            location.get("lat").and_then(|v| v.as_f64()),
            location.get("lng").and_then(|v| v.as_f64()),
        ) {
            (Some(lat), Some(lon)) => Ok(Some(Coordinates { lat, lon })),
            _ => {
                debug!(query, "geocode result had unexpected shape");
                Ok(None)
            }
        }
    }
}
