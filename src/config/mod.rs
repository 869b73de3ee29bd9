use config::{Config, File};
use serde::{Deserialize, Serialize};

pub mod validator;

use crate::cli::Cli;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub rate_limit: RateLimitSettings,
    #[serde(default)]
    pub llm: LlmSettings,
    #[serde(default)]
    pub geocode: GeocodeSettings,
    #[serde(default)]
    pub transit: TransitSettings,
    #[serde(default)]
    pub places: PlacesSettings,
    #[serde(default)]
    pub hazard: HazardSettings,
    #[serde(default)]
    pub chat: ChatSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RateLimitSettings {
    pub enabled: bool,
    /// Max requests per client key within the window.
    pub limit: usize,
    pub window_seconds: u64,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            limit: 10,
            window_seconds: 60,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LlmSettings {
    pub model: String,
    /// Environment variable the API key is read from.
    pub api_key_env: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Upper bound on function-calling rounds within one agent turn.
    pub max_tool_iterations: u32,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            model: "gemini-2.0-flash-001".to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            base_url: None,
            max_tool_iterations: 4,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeocodeSettings {
    pub base_url: String,
    pub api_key_env: String,
}

impl Default for GeocodeSettings {
    fn default() -> Self {
        Self {
            base_url: "https://maps.googleapis.com/maps/api/geocode/json".to_string(),
            api_key_env: "GOOGLE_MAPS_API_KEY".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TransitSettings {
    pub base_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,
}

impl Default for TransitSettings {
    fn default() -> Self {
        Self {
            base_url: "https://transit.example.com/api/v1/reachable".to_string(),
            api_key_env: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlacesSettings {
    pub base_url: String,
    pub api_key_env: String,
}

impl Default for PlacesSettings {
    fn default() -> Self {
        Self {
            base_url: "https://maps.googleapis.com/maps/api/place/nearbysearch/json".to_string(),
            api_key_env: "GOOGLE_MAPS_API_KEY".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HazardSettings {
    pub base_url: String,
}

impl Default for HazardSettings {
    fn default() -> Self {
        Self {
            base_url: "https://disaportal.gsi.go.jp/maps".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChatSettings {
    /// Number of per-slot report agents in the first-turn pipeline.
    pub report_slots: usize,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self { report_slots: 3 }
    }
}

impl Settings {
    pub fn new() -> Result<Self, anyhow::Error> {
        Self::from_file("sumika.toml")
    }

    /// Create settings from CLI arguments (config file plus CLI overrides).
    pub fn new_with_cli(cli: &Cli) -> Result<Self, anyhow::Error> {
        let mut settings = Self::from_file(
            cli.config
                .to_str()
                .ok_or_else(|| anyhow::anyhow!("config path is not valid UTF-8"))?,
        )?;

        if let Some(host) = &cli.host {
            settings.server.host = host.clone();
        }
        if let Some(port) = cli.port {
            settings.server.port = port;
        }

        validator::ConfigValidator::validate(&settings).map_err(|errors| {
            let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            anyhow::anyhow!("Configuration validation failed:\n{}", messages.join("\n"))
        })?;

        Ok(settings)
    }

    fn from_file(path: &str) -> Result<Self, anyhow::Error> {
        let s = Config::builder()
            .add_source(File::with_name(path).required(false))
            .build()?;

        Ok(s.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let settings = Settings::default();
        assert_eq!(settings.server.port, 3000);
        assert_eq!(settings.rate_limit.limit, 10);
        assert_eq!(settings.rate_limit.window_seconds, 60);
        assert_eq!(settings.chat.report_slots, 3);
        assert_eq!(settings.llm.model, "gemini-2.0-flash-001");
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let settings = Settings::from_file("does-not-exist.toml").unwrap();
        assert_eq!(settings.server.host, "127.0.0.1");
        assert!(settings.rate_limit.enabled);
    }
}
