//! Reachable-stations adapter

use std::env;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::config::TransitSettings;
use crate::domain::{ReachableStation, TransitPort};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for the transit routing service's reachability endpoint.
pub struct TransitClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

#[derive(Deserialize)]
struct ReachableResponse {
    #[serde(default)]
    reachable_stations: Vec<ReachableItem>,
}

#[derive(Deserialize)]
struct ReachableItem {
    station_name: String,
    #[serde(default)]
    line_name: String,
    travel_time: u32,
    lat: f64,
    lon: f64,
    #[serde(default)]
    rent_1r: Option<f64>,
}

impl TransitClient {
    pub fn new(settings: &TransitSettings) -> anyhow::Result<Self> {
        let api_key = match &settings.api_key_env {
            Some(var) => Some(env::var(var).map_err(|_| {
                anyhow::anyhow!("Environment variable {} not set", var)
            })?),
            None => None,
        };

        Ok(Self {
            client: reqwest::Client::new(),
            base_url: settings.base_url.clone(),
            api_key,
        })
    }
}

#[async_trait]
impl TransitPort for TransitClient {
    async fn reachable(
        &self,
        origin: &str,
        time_limit_minutes: u32,
    ) -> anyhow::Result<Vec<ReachableStation>> {
        let time_limit = time_limit_minutes.to_string();
        let mut query: Vec<(&str, &str)> =
            vec![("station", origin), ("time_limit", &time_limit)];
        if let Some(key) = &self.api_key {
            query.push(("key", key));
        }

        let response = self
            .client
            .get(&self.base_url)
            .query(&query)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?
            .error_for_status()?;

        let data: ReachableResponse = response.json().await?;
        debug!(
            origin,
            time_limit_minutes,
            hits = data.reachable_stations.len(),
            "reachable stations fetched"
        );

        Ok(data
            .reachable_stations
            .into_iter()
            .map(|item| ReachableStation {
                name: item.station_name,
                line: item.line_name,
                travel_time_minutes: item.travel_time,
                lat: item.lat,
                lon: item.lon,
                rent_1r: item.rent_1r,
            })
            .collect())
    }
}
