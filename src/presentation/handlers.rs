// HTTP request handlers
use crate::application::visualization_service::Suggestion;
use crate::domain::chart::ChartConfiguration;
use crate::domain::dataset::{Dataset, TypeOverrides};
use crate::infrastructure::chunked_json::stream_from_receiver;
use crate::infrastructure::http_response::{accepts_brotli, json_response};
use crate::presentation::app_state::AppState;
use crate::presentation::error::ApiError;
use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Response},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Deserialize)]
pub struct SuggestRequest {
    pub dataset: Dataset,
    #[serde(default)]
    pub overrides: TypeOverrides,
}

#[derive(Deserialize)]
pub struct RenderRequest {
    pub dataset: Dataset,
    pub config: ChartConfiguration,
    #[serde(default)]
    pub overrides: TypeOverrides,
}

#[derive(Deserialize)]
pub struct QueryRenderRequest {
    pub query: String,
    pub config: ChartConfiguration,
    #[serde(default)]
    pub overrides: TypeOverrides,
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Column types and chart types a dataset supports
pub async fn suggest_visualizations(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
    Json(request): Json<SuggestRequest>,
) -> Result<Response<Body>, ApiError> {
    let suggestion: Suggestion = state
        .visualization_service
        .suggest(&request.dataset, &request.overrides);

    json_response(&suggestion, accepts_brotli(&headers))
        .await
        .map_err(ApiError::Encoding)
}

/// Shape a caller-supplied dataset for the renderer
pub async fn render_visualization(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
    Json(request): Json<RenderRequest>,
) -> Result<Response<Body>, ApiError> {
    let payload = state.visualization_service.render(
        &request.dataset,
        &request.config,
        &request.overrides,
    );

    json_response(payload.as_ref(), accepts_brotli(&headers))
        .await
        .map_err(ApiError::Encoding)
}

/// Run a query against the data source and shape its result
pub async fn render_query(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
    Json(request): Json<QueryRenderRequest>,
) -> Result<Response<Body>, ApiError> {
    if request.query.trim().is_empty() {
        return Err(ApiError::BadRequest("query must not be empty".to_string()));
    }

    let payload = state
        .visualization_service
        .run_query(&request.query, &request.config, &request.overrides)
        .await
        .map_err(ApiError::Upstream)?;

    json_response(payload.as_ref(), accepts_brotli(&headers))
        .await
        .map_err(ApiError::Encoding)
}

/// Safety tier of every unit in one response
pub async fn fleet_safety(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Result<Response<Body>, ApiError> {
    let report = state
        .fleet_service
        .safety_report()
        .await
        .map_err(ApiError::Upstream)?;

    json_response(&report, accepts_brotli(&headers))
        .await
        .map_err(ApiError::Encoding)
}

/// Safety tiers streamed unit by unit (progressive loading)
pub async fn stream_fleet_safety(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let rx = state.fleet_service.stream_safety().await;
    stream_from_receiver(rx, accepts_brotli(&headers)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::fleet_service::FleetService;
    use crate::application::repositories::{DatasetSource, FleetTelemetryRepository};
    use crate::application::visualization_service::VisualizationService;
    use crate::domain::fleet::{FixedStation, MobileUnit};
    use crate::infrastructure::config::PipelineSettings;
    use async_trait::async_trait;
    use axum::http::StatusCode;
    use serde_json::{json, Value};

    struct Fixtures;

    #[async_trait]
    impl DatasetSource for Fixtures {
        async fn run_query(&self, _query: &str) -> anyhow::Result<Dataset> {
            Ok(serde_json::from_value(json!({
                "columns": ["station", "swaps"],
                "rows": [{"station": "sh-001", "swaps": 4}, {"station": "sh-001", "swaps": 6}]
            }))?)
        }
    }

    #[async_trait]
    impl FleetTelemetryRepository for Fixtures {
        async fn latest_unit_snapshots(&self) -> anyhow::Result<Vec<MobileUnit>> {
            Ok(vec![MobileUnit::new("ev-1", 31.2214, 121.5447, 80.0)])
        }
    }

    fn state() -> Arc<AppState> {
        let fixtures = Arc::new(Fixtures);
        let stations = vec![FixedStation {
            id: "sh-001".into(),
            name: "Pudong Swap Hub".into(),
            latitude: 31.2214,
            longitude: 121.5447,
        }];
        Arc::new(AppState {
            visualization_service: VisualizationService::new(fixtures.clone(), PipelineSettings::default()),
            fleet_service: FleetService::new(fixtures, stations),
        })
    }

    async fn body_json(response: Response<Body>) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_render_query() {
        let request: QueryRenderRequest = serde_json::from_value(json!({
            "query": "SELECT * FROM swaps",
            "config": {
                "type": "pie",
                "fieldMapping": {"x": "station", "y": "swaps"}
            }
        }))
        .unwrap();

        let response = render_query(HeaderMap::new(), State(state()), Json(request))
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["type"], "pie");
        assert_eq!(body["rows"][0]["aggregatedValue"], 10.0);
        assert_eq!(body["needsConfiguration"], false);
    }

    #[tokio::test]
    async fn test_blank_query_is_rejected() {
        let request = QueryRenderRequest {
            query: "  ".into(),
            config: serde_json::from_value(json!({"type": "table"})).unwrap(),
            overrides: TypeOverrides::default(),
        };
        let err = render_query(HeaderMap::new(), State(state()), Json(request))
            .await
            .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_fleet_safety() {
        let response = fleet_safety(HeaderMap::new(), State(state())).await.unwrap();
        let body = body_json(response).await;
        assert_eq!(body["summary"]["safe"], 1);
        assert_eq!(body["assessments"][0]["nearestStation"]["id"], "sh-001");
    }
}
