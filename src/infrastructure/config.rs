use crate::domain::fleet::FixedStation;
use serde::Deserialize;
use std::collections::HashMap;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerSettings,
    pub influx: InfluxSettings,
    #[serde(default)]
    pub pipeline: PipelineSettings,
    #[serde(default)]
    pub fleet: FleetSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct InfluxSettings {
    pub host: String,
    pub token: String,
    pub database: String,
    pub retention_policy: String,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct PipelineSettings {
    #[serde(default = "default_sample_size")]
    pub sample_size: usize,
    /// Memoized render payloads kept before the cache is reset; 0 disables it.
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            sample_size: default_sample_size(),
            cache_capacity: default_cache_capacity(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct FleetSettings {
    /// InfluxQL template; `${hours}` is replaced with `lookback_hours`.
    #[serde(default = "default_snapshot_query")]
    pub snapshot_query: String,
    #[serde(default = "default_lookback_hours")]
    pub lookback_hours: i32,
}

impl Default for FleetSettings {
    fn default() -> Self {
        Self {
            snapshot_query: default_snapshot_query(),
            lookback_hours: default_lookback_hours(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct StationRegistry {
    #[serde(default)]
    pub stations: Vec<FixedStation>,
}

fn default_bind_address() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_sample_size() -> usize {
    crate::application::field_classifier::DEFAULT_SAMPLE_SIZE
}

fn default_cache_capacity() -> usize {
    64
}

fn default_snapshot_query() -> String {
    "SELECT last(\"latitude\") AS \"latitude\", last(\"longitude\") AS \"longitude\", \
     last(\"charge\") AS \"charge\" FROM unit_telemetry \
     WHERE time >= now() - ${hours}h GROUP BY \"unit_id\""
        .to_string()
}

fn default_lookback_hours() -> i32 {
    1
}

pub fn load_app_config() -> anyhow::Result<AppConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/fleet").required(false))
        .add_source(config::Environment::with_prefix("FLEET").separator("__"))
        .build()?;

    Ok(settings.try_deserialize()?)
}

pub fn load_station_registry() -> anyhow::Result<StationRegistry> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/stations"))
        .build()?;

    Ok(settings.try_deserialize()?)
}

/// Replace template variables in a query string
pub fn prepare_query(query: &str, vars: &HashMap<String, String>) -> String {
    let mut result = query.to_string();
    for (key, value) in vars {
        let placeholder = format!("${{{}}}", key);
        result = result.replace(&placeholder, value);
    }
    result
}
