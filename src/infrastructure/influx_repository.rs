// InfluxDB repository implementation
use crate::application::repositories::{DatasetSource, FleetTelemetryRepository};
use crate::domain::dataset::{Dataset, Row};
use crate::domain::fleet::MobileUnit;
use crate::infrastructure::config::{prepare_query, FleetSettings};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

const UNIT_TAG: &str = "unit_id";

#[derive(Debug, Clone)]
pub struct InfluxRepository {
    host: String,
    token: String,
    database: String,
    retention_policy: String,
    fleet: FleetSettings,
}

#[derive(Debug, Deserialize)]
struct InfluxQLResponse {
    results: Vec<InfluxQLResult>,
}

#[derive(Debug, Deserialize)]
struct InfluxQLResult {
    #[serde(default)]
    series: Option<Vec<InfluxQLSeries>>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct InfluxQLSeries {
    #[allow(dead_code)]
    name: String,
    columns: Vec<String>,
    #[serde(default)]
    values: Vec<Vec<Value>>,
    #[serde(default)]
    tags: Option<HashMap<String, String>>,
}

impl InfluxQLSeries {
    /// Rows keyed by column name, with group-by tags added as extra cells.
    fn rows(&self) -> impl Iterator<Item = Row> + '_ {
        self.values.iter().map(move |values| {
            let mut row: Row = self
                .columns
                .iter()
                .cloned()
                .zip(values.iter().cloned())
                .collect();
            if let Some(tags) = &self.tags {
                for (key, value) in tags {
                    row.entry(key.clone())
                        .or_insert_with(|| Value::String(value.clone()));
                }
            }
            row
        })
    }
}

impl InfluxRepository {
    pub fn new(
        host: String,
        token: String,
        database: String,
        retention_policy: String,
        fleet: FleetSettings,
    ) -> Self {
        Self {
            host: host.trim_end_matches('/').to_string(),
            token,
            database,
            retention_policy,
            fleet,
        }
    }

    fn build_query_url(&self, query: &str) -> String {
        let encoded_query = urlencoding::encode(query);
        format!(
            "{}/query?db={}&rp={}&q={}",
            self.host, self.database, self.retention_policy, encoded_query
        )
    }

    async fn execute_query(&self, query: &str) -> Result<InfluxQLResponse> {
        let url = self.build_query_url(query);

        let client = reqwest::Client::new();
        let response = client
            .get(&url)
            .header("Authorization", format!("Token {}", self.token))
            .header("Accept", "application/json")
            .send()
            .await
            .context("Failed to send request to InfluxDB")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("InfluxDB query failed with status {}: {}", status, body);
        }

        let data = response
            .json::<InfluxQLResponse>()
            .await
            .context("Failed to parse InfluxDB response")?;

        if let Some(result) = data.results.first() {
            if let Some(error) = &result.error {
                anyhow::bail!("InfluxDB query error: {}", error);
            }
        }

        Ok(data)
    }

    /// Flattens every series of the first result into one dataset.
    ///
    /// Column order follows the first series, then tag keys in sorted order,
    /// then any columns only later series introduce.
    fn response_to_dataset(response: InfluxQLResponse) -> Dataset {
        let series = response
            .results
            .into_iter()
            .next()
            .and_then(|r| r.series)
            .unwrap_or_default();

        let mut columns: Vec<String> = Vec::new();
        let mut rows = Vec::new();
        for s in &series {
            let mut tag_keys: Vec<&String> = s.tags.iter().flat_map(|t| t.keys()).collect();
            tag_keys.sort();
            for name in s.columns.iter().chain(tag_keys) {
                if !columns.contains(name) {
                    columns.push(name.clone());
                }
            }
            rows.extend(s.rows());
        }

        Dataset::new(columns, rows)
    }

    fn dataset_to_units(dataset: &Dataset) -> Vec<MobileUnit> {
        dataset
            .rows
            .iter()
            .filter_map(|row| {
                let id = row.get(UNIT_TAG)?.as_str()?.to_string();
                let number = |column: &str| row.get(column).and_then(Value::as_f64);
                // Kept with a NaN charge so the unit is still classified (as unknown)
                let charge = number("charge").unwrap_or_else(|| {
                    tracing::warn!("Unit {} reported no charge level", id);
                    f64::NAN
                });
                let reported_at = row
                    .get("time")
                    .and_then(Value::as_str)
                    .and_then(|t| chrono::DateTime::parse_from_rfc3339(t).ok())
                    .map(|t| t.with_timezone(&chrono::Utc));
                Some(MobileUnit {
                    id,
                    latitude: number("latitude"),
                    longitude: number("longitude"),
                    charge_level_percent: charge,
                    reported_at,
                })
            })
            .collect()
    }
}

#[async_trait]
impl DatasetSource for InfluxRepository {
    async fn run_query(&self, query: &str) -> Result<Dataset> {
        tracing::debug!("Executing ad-hoc query: {}", query);
        let response = self.execute_query(query).await?;
        Ok(Self::response_to_dataset(response))
    }
}

#[async_trait]
impl FleetTelemetryRepository for InfluxRepository {
    async fn latest_unit_snapshots(&self) -> Result<Vec<MobileUnit>> {
        let mut vars = HashMap::new();
        vars.insert("hours".to_string(), self.fleet.lookback_hours.to_string());
        let query = prepare_query(&self.fleet.snapshot_query, &vars);

        tracing::debug!("Executing unit snapshot query: {}", query);
        let response = self.execute_query(&query).await?;
        let units = Self::dataset_to_units(&Self::response_to_dataset(response));

        tracing::debug!("Found {} unit snapshots", units.len());
        Ok(units)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(raw: Value) -> InfluxQLResponse {
        serde_json::from_value(raw).unwrap()
    }

    fn snapshot() -> InfluxQLResponse {
        response(json!({
            "results": [{
                "series": [
                    {
                        "name": "unit_telemetry",
                        "tags": {"unit_id": "ev-1"},
                        "columns": ["time", "latitude", "longitude", "charge"],
                        "values": [["2026-10-18T08:00:00Z", 31.23, 121.55, 64.0]]
                    },
                    {
                        "name": "unit_telemetry",
                        "tags": {"unit_id": "ev-2"},
                        "columns": ["time", "latitude", "longitude", "charge"],
                        "values": [["2026-10-18T08:00:05Z", null, null, 18.5]]
                    }
                ]
            }]
        }))
    }

    #[test]
    fn test_series_flatten_into_dataset() {
        let dataset = InfluxRepository::response_to_dataset(snapshot());
        assert_eq!(
            dataset.columns,
            vec!["time", "latitude", "longitude", "charge", "unit_id"]
        );
        assert_eq!(dataset.rows.len(), 2);
        assert_eq!(dataset.rows[1]["unit_id"], json!("ev-2"));
    }

    #[test]
    fn test_empty_result() {
        let dataset = InfluxRepository::response_to_dataset(response(json!({"results": [{}]})));
        assert!(dataset.columns.is_empty());
        assert!(dataset.is_empty());
    }

    #[test]
    fn test_units_from_snapshot() {
        let dataset = InfluxRepository::response_to_dataset(snapshot());
        let units = InfluxRepository::dataset_to_units(&dataset);

        assert_eq!(units.len(), 2);
        assert_eq!(units[0].id, "ev-1");
        assert_eq!(units[0].charge_level_percent, 64.0);
        assert!(units[0].reported_at.is_some());
        assert_eq!(units[1].latitude, None);
        assert_eq!(units[1].coordinate(), None);
    }

    #[test]
    fn test_unit_without_charge_is_kept() {
        let snapshot = response(json!({
            "results": [{
                "series": [{
                    "name": "unit_telemetry",
                    "tags": {"unit_id": "ev-5"},
                    "columns": ["time", "latitude", "longitude", "charge"],
                    "values": [["2026-10-18T08:00:00Z", 31.23, 121.55, null]]
                }]
            }]
        }));
        let units = InfluxRepository::dataset_to_units(&InfluxRepository::response_to_dataset(snapshot));

        assert_eq!(units.len(), 1);
        assert_eq!(units[0].id, "ev-5");
        assert!(units[0].charge_level_percent.is_nan());
    }

    #[test]
    fn test_query_url_is_encoded() {
        let repo = InfluxRepository::new(
            "http://influx:8086/".into(),
            "t".into(),
            "fleet".into(),
            "autogen".into(),
            FleetSettings::default(),
        );
        assert_eq!(
            repo.build_query_url("SELECT 1"),
            "http://influx:8086/query?db=fleet&rp=autogen&q=SELECT%201"
        );
    }
}
