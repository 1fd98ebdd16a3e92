// Domain layer: rate models and the ports the converter is written against.

pub mod model;
pub mod ports;
