//! Disaster-hazard sampling adapter

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::config::HazardSettings;
use crate::domain::HazardPort;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Samples the flood-hazard layer at a coordinate and maps the reported
/// depth class to a human-readable risk label.
pub struct HazardClient {
    client: reqwest::Client,
    base_url: String,
}

impl HazardClient {
    pub fn new(settings: &HazardSettings) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: settings.base_url.clone(),
        }
    }

    fn risk_label(depth_class: u32) -> &'static str {
        match depth_class {
            0 => "リスク低",
            1..=2 => "浸水リスクあり（0.5m未満〜3m）",
            _ => "浸水リスク高（3m以上）",
        }
    }
}

#[async_trait]
impl HazardPort for HazardClient {
    async fn risk_level(&self, lat: f64, lon: f64) -> anyhow::Result<Option<String>> {
        let response = self
            .client
            .get(format!("{}/sample", self.base_url))
            .query(&[("lat", lat), ("lon", lon)])
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?
            .error_for_status()?;

        let data: Value = response.json().await?;
        let Some(depth_class) = data.get("depth_class").and_then(|v| v.as_u64()) else {
            debug!(lat, lon, "hazard layer had no data for coordinate");
            return Ok(None);
        };

        Ok(Some(Self::risk_label(depth_class as u32).to_string()))
    }
}
