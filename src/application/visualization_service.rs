// Visualization service - Suggests charts and renders configurations, memoized by input structure
use crate::application::chart_data::build_chart_data;
use crate::application::chart_suggestion::suggest_charts;
use crate::application::field_classifier::classify_columns;
use crate::application::repositories::DatasetSource;
use crate::domain::chart::{AggregationOp, ChartConfiguration, ChartType, FieldMapping, RenderPayload};
use crate::domain::dataset::{ColumnDescriptor, Dataset, TypeOverrides};
use crate::infrastructure::config::PipelineSettings;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    pub columns: Vec<ColumnDescriptor>,
    pub charts: Vec<ChartType>,
    pub stale_overrides: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct RenderKey {
    dataset: u64,
    chart_type: ChartType,
    field_mapping: FieldMapping,
    aggregation_op: Option<AggregationOp>,
    overrides: TypeOverrides,
}

impl RenderKey {
    fn new(dataset: &Dataset, config: &ChartConfiguration, overrides: &TypeOverrides) -> Self {
        Self {
            dataset: dataset.fingerprint(),
            chart_type: config.chart_type,
            field_mapping: config.field_mapping.clone(),
            aggregation_op: config.aggregation_op,
            overrides: overrides.clone(),
        }
    }
}

#[derive(Clone)]
pub struct VisualizationService {
    source: Arc<dyn DatasetSource>,
    settings: PipelineSettings,
    cache: Arc<Mutex<HashMap<RenderKey, Arc<RenderPayload>>>>,
}

impl VisualizationService {
    pub fn new(source: Arc<dyn DatasetSource>, settings: PipelineSettings) -> Self {
        Self {
            source,
            settings,
            cache: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn suggest(&self, dataset: &Dataset, overrides: &TypeOverrides) -> Suggestion {
        let columns = classify_columns(dataset, overrides, self.settings.sample_size);
        let charts = suggest_charts(&columns);
        Suggestion {
            columns,
            charts,
            stale_overrides: overrides.stale(dataset),
        }
    }

    pub fn render(
        &self,
        dataset: &Dataset,
        config: &ChartConfiguration,
        overrides: &TypeOverrides,
    ) -> Arc<RenderPayload> {
        let key = RenderKey::new(dataset, config, overrides);
        if let Some(payload) = self.cached(&key) {
            tracing::debug!("Render cache hit for {:?} chart", config.chart_type);
            return payload;
        }

        let columns = classify_columns(dataset, overrides, self.settings.sample_size);
        let payload = Arc::new(build_chart_data(dataset, config, &columns));
        tracing::debug!(
            "Rendered {:?} chart: {} rows, {} diagnostics",
            config.chart_type,
            payload.rows.len(),
            payload.diagnostics.len()
        );

        self.store(key, payload.clone());
        payload
    }

    /// Fetches a dataset from the query layer and renders it.
    pub async fn run_query(
        &self,
        query: &str,
        config: &ChartConfiguration,
        overrides: &TypeOverrides,
    ) -> anyhow::Result<Arc<RenderPayload>> {
        let dataset = self.source.run_query(query).await?;
        tracing::debug!(
            "Query returned {} columns, {} rows",
            dataset.columns.len(),
            dataset.rows.len()
        );
        Ok(self.render(&dataset, config, overrides))
    }

    fn cached(&self, key: &RenderKey) -> Option<Arc<RenderPayload>> {
        self.cache.lock().ok()?.get(key).cloned()
    }

    fn store(&self, key: RenderKey, payload: Arc<RenderPayload>) {
        if self.settings.cache_capacity == 0 {
            return;
        }
        if let Ok(mut cache) = self.cache.lock() {
            if cache.len() >= self.settings.cache_capacity {
                cache.clear();
            }
            cache.insert(key, payload);
        }
    }
}
