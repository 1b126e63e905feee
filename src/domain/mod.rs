// Domain layer: table/report models and the ports (traits) the pipeline is built on.

pub mod model;
pub mod ports;
