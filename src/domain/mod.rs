// Domain layer - Value types shared by the pipeline and the fleet classifier
pub mod chart;
pub mod dataset;
pub mod diagnostics;
pub mod fleet;
pub mod geo;
