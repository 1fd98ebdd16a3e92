pub mod converter;

pub use crate::domain::model::{PlotSeries, Rate, RatePoint};
pub use crate::domain::ports::{ChartRenderer, ConfigProvider, RateProvider};
pub use crate::utils::error::Result;
