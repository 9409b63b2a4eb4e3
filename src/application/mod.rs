// Application layer - Pipeline stages, use-case services and repository ports
pub mod aggregator;
pub mod chart_data;
pub mod chart_suggestion;
pub mod field_classifier;
pub mod fleet_service;
pub mod geo_resolver;
pub mod proximity;
pub mod repositories;
pub mod visualization_service;
