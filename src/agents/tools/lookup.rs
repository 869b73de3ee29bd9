//! Read-only lookup tools: transit reachability, web search, places, hazard

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::warn;

use super::{error_payload, str_arg, AgentTool};
use crate::domain::{HazardPort, PlacesPort, SearchPort, TransitPort};

const DEFAULT_TIME_LIMIT_MINUTES: u32 = 30;
const DEFAULT_PLACES_RADIUS_METERS: u32 = 800;

/// Ranked stations reachable from an origin within a commute-time limit.
pub struct ReachableStationsTool {
    transit: Arc<dyn TransitPort>,
}

impl ReachableStationsTool {
    pub fn new(transit: Arc<dyn TransitPort>) -> Self {
        Self { transit }
    }
}

#[async_trait]
impl AgentTool for ReachableStationsTool {
    fn name(&self) -> &str {
        "reachable_station"
    }

    fn description(&self) -> &str {
        "指定駅から制限時間内に到達可能な駅を、家賃相場付きで検索する"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "station_name": { "type": "string", "description": "起点となる駅名" },
                "time_limit": {
                    "type": "integer",
                    "description": "到達時間の上限（分）。省略時は30分"
                }
            },
            "required": ["station_name"]
        })
    }

    async fn call(&self, args: Value, _user_id: &str) -> Value {
        let Some(station) = str_arg(&args, "station_name") else {
            return error_payload("station_name が指定されていません");
        };
        let time_limit = args
            .get("time_limit")
            .and_then(|v| v.as_u64())
            .map(|v| v as u32)
            .unwrap_or(DEFAULT_TIME_LIMIT_MINUTES);

        match self.transit.reachable(station, time_limit).await {
            Ok(stations) if stations.is_empty() => json!({
                "error": format!(
                    "No reachable stations found for '{station}' within {time_limit} minutes"
                ),
                "origin_station": station,
                "time_limit": time_limit,
                "reachable_stations": [],
            }),
            Ok(stations) => json!({
                "origin_station": station,
                "time_limit": time_limit,
                "total_stations": stations.len(),
                "reachable_stations": stations,
            }),
            Err(e) => {
                warn!(station, error = %e, "reachable stations lookup failed");
                json!({
                    "error": format!("Failed to get reachable stations: {e}"),
                    "origin_station": station,
                    "time_limit": time_limit,
                    "reachable_stations": [],
                })
            }
        }
    }
}

/// General-purpose web search, used when structured lookups come up empty.
pub struct WebSearchTool {
    search: Arc<dyn SearchPort>,
}

impl WebSearchTool {
    pub fn new(search: Arc<dyn SearchPort>) -> Self {
        Self { search }
    }
}

#[async_trait]
impl AgentTool for WebSearchTool {
    fn name(&self) -> &str {
        "web_search"
    }

    fn description(&self) -> &str {
        "Web検索を行い、クエリに対する回答テキストを返す"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": { "type": "string", "description": "検索クエリ" }
            },
            "required": ["query"]
        })
    }

    async fn call(&self, args: Value, _user_id: &str) -> Value {
        let Some(query) = str_arg(&args, "query") else {
            return error_payload("query が指定されていません");
        };

        match self.search.search(query).await {
            Ok(answer) => json!({ "status": "success", "answer": answer }),
            Err(e) => {
                warn!(query, error = %e, "web search failed");
                error_payload("検索に失敗しました")
            }
        }
    }
}

/// Nearby facilities for a coordinate, for neighborhood questions.
pub struct NearbyBuildingsTool {
    places: Arc<dyn PlacesPort>,
}

impl NearbyBuildingsTool {
    pub fn new(places: Arc<dyn PlacesPort>) -> Self {
        Self { places }
    }
}

#[async_trait]
impl AgentTool for NearbyBuildingsTool {
    fn name(&self) -> &str {
        "get_nearby_buildings"
    }

    fn description(&self) -> &str {
        "座標周辺の学校・病院・商業施設などを検索する"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "lat": { "type": "number" },
                "lon": { "type": "number" },
                "radius": {
                    "type": "integer",
                    "description": "検索半径（メートル）。省略時は800m"
                }
            },
            "required": ["lat", "lon"]
        })
    }

    async fn call(&self, args: Value, _user_id: &str) -> Value {
        let (Some(lat), Some(lon)) = (
            args.get("lat").and_then(|v| v.as_f64()),
            args.get("lon").and_then(|v| v.as_f64()),
        ) else {
            return error_payload("lat / lon が指定されていません");
        };
        let radius = args
            .get("radius")
            .and_then(|v| v.as_u64())
            .map(|v| v as u32)
            .unwrap_or(DEFAULT_PLACES_RADIUS_METERS);

        match self.places.nearby(lat, lon, radius).await {
            Ok(facilities) => json!({
                "status": "success",
                "total": facilities.len(),
                "facilities": facilities,
            }),
            Err(e) => {
                warn!(lat, lon, error = %e, "nearby facilities lookup failed");
                error_payload("周辺施設の取得に失敗しました")
            }
        }
    }
}

/// Disaster-hazard risk level for a coordinate.
pub struct HazardInfoTool {
    hazard: Arc<dyn HazardPort>,
}

impl HazardInfoTool {
    pub fn new(hazard: Arc<dyn HazardPort>) -> Self {
        Self { hazard }
    }
}

#[async_trait]
impl AgentTool for HazardInfoTool {
    fn name(&self) -> &str {
        "check_hazard_info"
    }

    fn description(&self) -> &str {
        "座標の災害ハザード（浸水リスクなど）を確認する"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "lat": { "type": "number" },
                "lon": { "type": "number" }
            },
            "required": ["lat", "lon"]
        })
    }

    async fn call(&self, args: Value, _user_id: &str) -> Value {
        let (Some(lat), Some(lon)) = (
            args.get("lat").and_then(|v| v.as_f64()),
            args.get("lon").and_then(|v| v.as_f64()),
        ) else {
            return error_payload("lat / lon が指定されていません");
        };

        match self.hazard.risk_level(lat, lon).await {
            Ok(Some(level)) => json!({ "status": "success", "risk_level": level }),
            Ok(None) => json!({ "status": "success", "risk_level": "情報なし" }),
            Err(e) => {
                warn!(lat, lon, error = %e, "hazard lookup failed");
                error_payload("ハザード情報の取得に失敗しました")
            }
        }
    }
}
