//! Tools that resolve a place to coordinates and enqueue a map pin

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::warn;

use super::{error_payload, str_arg, success_payload, AgentTool};
use crate::chat::PinStore;
use crate::domain::{GeocodePort, Pin};

/// Resolves a station name and pins it on the user's map.
pub struct StationPinTool {
    geocode: Arc<dyn GeocodePort>,
    pins: Arc<PinStore>,
}

impl StationPinTool {
    pub fn new(geocode: Arc<dyn GeocodePort>, pins: Arc<PinStore>) -> Self {
        Self { geocode, pins }
    }
}

#[async_trait]
impl AgentTool for StationPinTool {
    fn name(&self) -> &str {
        "get_station_coordinates"
    }

    fn description(&self) -> &str {
        "駅名から座標を取得し、ユーザーのマップにピンを表示する"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "station_name": { "type": "string", "description": "駅名" }
            },
            "required": ["station_name"]
        })
    }

    async fn call(&self, args: Value, user_id: &str) -> Value {
        let Some(station) = str_arg(&args, "station_name") else {
            return error_payload("station_name が指定されていません");
        };

        match self.geocode.lookup(station).await {
            Ok(Some(coords)) => {
                self.pins
                    .enqueue(user_id, Pin::new(coords.lat, coords.lon, station))
                    .await;
                success_payload(format!("{station}を左側の地図に表示いたします"))
            }
            Ok(None) => error_payload(format!("{station}の座標が見つかりませんでした")),
            Err(e) => {
                warn!(station, error = %e, "station geocode lookup failed");
                error_payload("座標取得に失敗しました")
            }
        }
    }
}

/// Resolves a free-form address and pins it. Used by the continuation agent,
/// which receives arbitrary place references rather than station names.
pub struct AddressPinTool {
    geocode: Arc<dyn GeocodePort>,
    pins: Arc<PinStore>,
}

impl AddressPinTool {
    pub fn new(geocode: Arc<dyn GeocodePort>, pins: Arc<PinStore>) -> Self {
        Self { geocode, pins }
    }
}

#[async_trait]
impl AgentTool for AddressPinTool {
    fn name(&self) -> &str {
        "get_latlon_from_address"
    }

    fn description(&self) -> &str {
        "住所や施設名から緯度・経度を取得し、ユーザーのマップにピンを表示する"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "address": { "type": "string", "description": "住所・駅名・施設名" }
            },
            "required": ["address"]
        })
    }

    async fn call(&self, args: Value, user_id: &str) -> Value {
        let Some(address) = str_arg(&args, "address") else {
            return error_payload("address が指定されていません");
        };

        match self.geocode.lookup(address).await {
            Ok(Some(coords)) => {
                self.pins
                    .enqueue(user_id, Pin::new(coords.lat, coords.lon, address))
                    .await;
                json!({
                    "status": "success",
                    "lat": coords.lat,
                    "lon": coords.lon,
                    "message": format!("{address}を左側の地図に表示いたします"),
                })
            }
            Ok(None) => error_payload(format!("{address}の座標が見つかりませんでした")),
            Err(e) => {
                warn!(address, error = %e, "address geocode lookup failed");
                error_payload("座標取得に失敗しました")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Coordinates;

    struct FakeGeocoder(Option<Coordinates>);

    #[async_trait]
    impl GeocodePort for FakeGeocoder {
        async fn lookup(&self, _query: &str) -> anyhow::Result<Option<Coordinates>> {
            Ok(self.0)
        }
    }

    struct BrokenGeocoder;

    #[async_trait]
    impl GeocodePort for BrokenGeocoder {
        async fn lookup(&self, _query: &str) -> anyhow::Result<Option<Coordinates>> {
            anyhow::bail!("upstream down")
        }
    }

    #[tokio::test]
    async fn station_pin_enqueues_on_hit() {
        let pins = Arc::new(PinStore::new());
        let tool = StationPinTool::new(
            Arc::new(FakeGeocoder(Some(Coordinates { lat: 35.69, lon: 139.70 }))),
            pins.clone(),
        );

        let result = tool.call(json!({ "station_name": "新宿駅" }), "u1").await;
        assert_eq!(result["status"], "success");

        let drained = pins.drain("u1").await;
        assert_eq!(drained.len(), 1);
        assert_eq!(drained[0].name, "新宿駅");
        assert_eq!(drained[0].lat, 35.69);
    }

    #[tokio::test]
    async fn station_pin_reports_miss_without_enqueue() {
        let pins = Arc::new(PinStore::new());
        let tool = StationPinTool::new(Arc::new(FakeGeocoder(None)), pins.clone());

        let result = tool.call(json!({ "station_name": "謎の駅" }), "u1").await;
        assert_eq!(result["status"], "error");
        assert!(pins.drain("u1").await.is_empty());
    }

    #[tokio::test]
    async fn station_pin_absorbs_upstream_failure() {
        let pins = Arc::new(PinStore::new());
        let tool = StationPinTool::new(Arc::new(BrokenGeocoder), pins.clone());

        let result = tool.call(json!({ "station_name": "新宿駅" }), "u1").await;
        assert_eq!(result["status"], "error");
        assert!(pins.drain("u1").await.is_empty());
    }

    #[tokio::test]
    async fn address_pin_returns_coordinates() {
        let pins = Arc::new(PinStore::new());
        let tool = AddressPinTool::new(
            Arc::new(FakeGeocoder(Some(Coordinates { lat: 35.0, lon: 139.0 }))),
            pins.clone(),
        );

        let result = tool.call(json!({ "address": "東京都渋谷区" }), "u2").await;
        assert_eq!(result["status"], "success");
        assert_eq!(result["lat"], 35.0);
        assert_eq!(pins.drain("u2").await.len(), 1);
    }

    #[tokio::test]
    async fn missing_argument_is_in_band_error() {
        let pins = Arc::new(PinStore::new());
        let tool = StationPinTool::new(Arc::new(FakeGeocoder(None)), pins);
        let result = tool.call(json!({}), "u1").await;
        assert_eq!(result["status"], "error");
    }
}
