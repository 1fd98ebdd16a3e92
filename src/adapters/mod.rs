// Adapters layer: concrete implementations of the domain ports.

pub mod chart;
pub mod nbrb;
