// Fleet service - Safety tiers for every unit against the station registry
use crate::application::proximity::{assess_fleet, assess_unit, station_diagnostics};
use crate::application::repositories::FleetTelemetryRepository;
use crate::domain::diagnostics::Diagnostic;
use crate::domain::fleet::{FixedStation, FleetSafetyReport, SafetyAssessment, SafetySummary};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;

/// Progressive report chunks: skeleton first, one message per unit, then completion.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum FleetStreamMessage {
    #[serde(rename_all = "camelCase")]
    Skeleton {
        stations: Vec<FixedStation>,
        unit_count: usize,
    },
    Assessment(SafetyAssessment),
    #[serde(rename_all = "camelCase")]
    Complete {
        summary: SafetySummary,
        diagnostics: Vec<Diagnostic>,
        duration_ms: u64,
    },
}

#[derive(Clone)]
pub struct FleetService {
    repository: Arc<dyn FleetTelemetryRepository>,
    stations: Arc<Vec<FixedStation>>,
}

impl FleetService {
    pub fn new(repository: Arc<dyn FleetTelemetryRepository>, stations: Vec<FixedStation>) -> Self {
        Self {
            repository,
            stations: Arc::new(stations),
        }
    }

    pub async fn safety_report(&self) -> anyhow::Result<FleetSafetyReport> {
        let units = self.repository.latest_unit_snapshots().await?;
        let report = assess_fleet(&units, &self.stations);
        tracing::info!(
            "Fleet safety: {} safe, {} warning, {} danger, {} unknown",
            report.summary.safe,
            report.summary.warning,
            report.summary.danger,
            report.summary.unknown
        );
        Ok(report)
    }

    pub async fn stream_safety(&self) -> mpsc::Receiver<FleetStreamMessage> {
        let (tx, rx) = mpsc::channel(100);
        let start_time = Instant::now();

        let units = match self.repository.latest_unit_snapshots().await {
            Ok(units) => units,
            Err(e) => {
                tracing::error!("Error fetching unit snapshots: {:#}", e);
                Vec::new()
            }
        };

        let skeleton = FleetStreamMessage::Skeleton {
            stations: self.stations.to_vec(),
            unit_count: units.len(),
        };
        let _ = tx.send(skeleton).await;

        let stations = self.stations.clone();
        tokio::spawn(async move {
            let mut summary = SafetySummary::default();
            let mut diagnostics = Vec::new();
            station_diagnostics(&stations, &mut diagnostics);

            for unit in &units {
                let assessment = assess_unit(unit, &stations, &mut diagnostics);
                summary.record(assessment.tier);
                if tx.send(FleetStreamMessage::Assessment(assessment)).await.is_err() {
                    tracing::debug!("Fleet stream receiver dropped");
                    return;
                }
            }

            let complete = FleetStreamMessage::Complete {
                summary,
                diagnostics,
                duration_ms: start_time.elapsed().as_millis() as u64,
            };
            let _ = tx.send(complete).await;
        });

        rx
    }
}
