// Domain layer: request/response types and the ports the estimator depends on.

pub mod model;
pub mod ports;
