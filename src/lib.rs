pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{CliConfig, Command};

pub use adapters::{chart::PngChartRenderer, nbrb::NbrbClient};
pub use config::ConverterConfig;
pub use core::converter::Converter;
pub use domain::model::{ConversionRequest, CurrencyPair, PlotSeries, Rate, RatePoint};
pub use utils::error::{ConverterError, Result};
