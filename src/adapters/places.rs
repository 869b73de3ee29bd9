//! Nearby-facility search adapter

use std::env;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::config::PlacesSettings;
use crate::domain::{Facility, PlacesPort};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub struct PlacesClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl PlacesClient {
    pub fn new(settings: &PlacesSettings) -> anyhow::Result<Self> {
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
impl PlacesPort for PlacesClient {
    async fn nearby(
        &self,
        lat: f64,
        lon: f64,
        radius_meters: u32,
    ) -> anyhow::Result<Vec<Facility>> {
        let location = format!("{lat},{lon}");
        let radius = radius_meters.to_string();

        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("location", location.as_str()),
                ("radius", radius.as_str()),
                ("language", "ja"),
                ("key", self.api_key.as_str()),
            ])
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?
            .error_for_status()?;

        let data: Value = response.json().await?;
        let results = data
            .get("results")
            .and_then(|r| r.as_array())
            .cloned()
            .unwrap_or_default();
        debug!(lat, lon, radius_meters, hits = results.len(), "places fetched");

        Ok(results
            .iter()
            .filter_map(|item| {
                let name = item.get("name")?.as_str()?.to_string();
                let category = item
                    .pointer("/types/0")
                    .and_then(|t| t.as_str())
                    .unwrap_or("place")
                    .to_string();
                Some(Facility {
                    name,
                    category,
                    distance_meters: None,
                })
            })
            .collect())
    }
}
