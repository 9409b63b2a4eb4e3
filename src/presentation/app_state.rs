// Application state for HTTP handlers
use crate::application::fleet_service::FleetService;
use crate::application::visualization_service::VisualizationService;

#[derive(Clone)]
pub struct AppState {
    pub visualization_service: VisualizationService,
    pub fleet_service: FleetService,
}
