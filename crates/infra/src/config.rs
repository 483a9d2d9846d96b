//! Process configuration, read once from the environment.

use thiserror::Error;

use toolcrib_inventory::ReconcilePolicy;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {var}: `{value}` ({reason})")]
    Invalid {
        var: &'static str,
        value: String,
        reason: &'static str,
    },
}

/// Spreadsheet-backed store settings. Absent means the in-memory store is used.
#[derive(Clone, PartialEq, Eq)]
pub struct SheetsConfig {
    pub spreadsheet_id: String,
    pub access_token: String,
    pub inventory_tab: String,
    /// `None` when no catalog tab is configured.
    pub catalog_tab: Option<String>,
}

impl std::fmt::Debug for SheetsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SheetsConfig")
            .field("spreadsheet_id", &self.spreadsheet_id)
            .field("access_token", &"<redacted>")
            .field("inventory_tab", &self.inventory_tab)
            .field("catalog_tab", &self.catalog_tab)
            .finish()
    }
}

#[derive(Clone, PartialEq)]
pub struct AppConfig {
    pub sheets: Option<SheetsConfig>,
    pub vision_api_key: Option<String>,
    pub vision_endpoint: String,
    pub webhook_secret: Option<String>,
    pub default_min_quantity: u32,
    pub allow_unknown_labels: bool,
    pub min_detection_score: f32,
    pub server_host: String,
    pub server_port: u16,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("sheets", &self.sheets)
            .field("vision_api_key", &self.vision_api_key.as_ref().map(|_| "<redacted>"))
            .field("vision_endpoint", &self.vision_endpoint)
            .field("webhook_secret", &self.webhook_secret.as_ref().map(|_| "<redacted>"))
            .field("default_min_quantity", &self.default_min_quantity)
            .field("allow_unknown_labels", &self.allow_unknown_labels)
            .field("min_detection_score", &self.min_detection_score)
            .field("server_host", &self.server_host)
            .field("server_port", &self.server_port)
            .finish()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            sheets: None,
            vision_api_key: None,
            vision_endpoint: crate::detector::vision::DEFAULT_ENDPOINT.to_string(),
            webhook_secret: None,
            default_min_quantity: 1,
            allow_unknown_labels: true,
            min_detection_score: 0.5,
            server_host: "0.0.0.0".to_string(),
            server_port: 8000,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from any variable source. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        let sheets = match get("SHEETS_SPREADSHEET_ID") {
            Some(spreadsheet_id) => Some(SheetsConfig {
                spreadsheet_id,
                access_token: get("SHEETS_ACCESS_TOKEN").ok_or(ConfigError::Missing("SHEETS_ACCESS_TOKEN"))?,
                inventory_tab: get("SHEETS_INVENTORY_TAB").unwrap_or_else(|| "Inventory".to_string()),
                // Set-but-empty disables the catalog; unset uses the default tab.
                catalog_tab: match lookup("SHEETS_CATALOG_TAB") {
                    Some(tab) if tab.trim().is_empty() => None,
                    Some(tab) => Some(tab.trim().to_string()),
                    None => Some("Catalog".to_string()),
                },
            }),
            None => None,
        };

        let min_detection_score = match get("MIN_DETECTION_SCORE") {
            Some(raw) => {
                let score: f32 = raw.parse().map_err(|_| invalid("MIN_DETECTION_SCORE", &raw, "not a number"))?;
                if !(0.0..=1.0).contains(&score) {
                    return Err(invalid("MIN_DETECTION_SCORE", &raw, "must be within 0..=1"));
                }
                score
            }
            None => defaults.min_detection_score,
        };

        Ok(Self {
            sheets,
            vision_api_key: get("VISION_API_KEY"),
            vision_endpoint: get("VISION_ENDPOINT").unwrap_or(defaults.vision_endpoint),
            webhook_secret: get("ZAPIER_WEBHOOK_SECRET"),
            default_min_quantity: parse_or(&get, "DEFAULT_MIN_QUANTITY", defaults.default_min_quantity)?,
            allow_unknown_labels: match get("ALLOW_UNKNOWN_LABELS") {
                Some(raw) => parse_bool("ALLOW_UNKNOWN_LABELS", &raw)?,
                None => defaults.allow_unknown_labels,
            },
            min_detection_score,
            server_host: get("SERVER_HOST").unwrap_or(defaults.server_host),
            server_port: parse_or(&get, "SERVER_PORT", defaults.server_port)?,
        })
    }

    /// Policy for one request; `allow_unknown` overrides the configured default.
    pub fn policy(&self, allow_unknown: Option<bool>) -> ReconcilePolicy {
        ReconcilePolicy::default()
            .with_allow_unknown(allow_unknown.unwrap_or(self.allow_unknown_labels))
            .with_default_min_quantity(self.default_min_quantity)
            .with_min_score(self.min_detection_score)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

fn invalid(var: &'static str, value: &str, reason: &'static str) -> ConfigError {
    ConfigError::Invalid {
        var,
        value: value.to_string(),
        reason,
    }
}

fn parse_or<G, T>(get: &G, var: &'static str, default: T) -> Result<T, ConfigError>
where
    G: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match get(var) {
        Some(raw) => raw.parse().map_err(|_| invalid(var, &raw, "not a non-negative integer")),
        None => Ok(default),
    }
}

fn parse_bool(var: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(invalid(var, raw, "not a boolean")),
    }
}
