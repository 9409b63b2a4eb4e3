// Repository ports for query results and fleet telemetry
use crate::domain::dataset::Dataset;
use crate::domain::fleet::MobileUnit;
use async_trait::async_trait;

#[async_trait]
pub trait DatasetSource: Send + Sync {
    /// Run an ad-hoc query and return its rows untyped
    async fn run_query(&self, query: &str) -> anyhow::Result<Dataset>;
}

#[async_trait]
pub trait FleetTelemetryRepository: Send + Sync {
    /// Latest reported position and charge for every unit
    async fn latest_unit_snapshots(&self) -> anyhow::Result<Vec<MobileUnit>>;
}
