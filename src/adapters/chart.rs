use crate::config::toml_config::PlotConfig;
use crate::domain::model::PlotSeries;
use crate::domain::ports::ChartRenderer;
use crate::utils::error::{ConverterError, Result};
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use plotters::prelude::*;
use rust_decimal::prelude::ToPrimitive;
use std::path::PathBuf;

fn chart_error(stage: &str, e: impl std::fmt::Display) -> ConverterError {
    ConverterError::ChartError {
        message: format!("{}: {}", stage, e),
    }
}

fn to_timestamp(date: NaiveDate) -> DateTime<Utc> {
    DateTime::<Utc>::from_naive_utc_and_offset(date.and_time(NaiveTime::MIN), Utc)
}

/// Renders rate dynamics as a PNG line chart.
#[derive(Debug, Clone)]
pub struct PngChartRenderer {
    output_path: PathBuf,
    width: u32,
    height: u32,
    labels: bool,
}

impl PngChartRenderer {
    pub fn new(output_path: impl Into<PathBuf>, width: u32, height: u32) -> Self {
        Self {
            output_path: output_path.into(),
            width,
            height,
            labels: true,
        }
    }

    pub fn from_config(config: &PlotConfig) -> Self {
        Self::new(config.output_path.clone(), config.width, config.height)
            .with_labels(config.labels)
    }

    pub fn with_labels(mut self, labels: bool) -> Self {
        self.labels = labels;
        self
    }

    fn draw(&self, series: &PlotSeries) -> Result<()> {
        let points: Vec<(DateTime<Utc>, f64)> = series
            .points
            .iter()
            .map(|p| (to_timestamp(p.date), p.rate.to_f64().unwrap_or_default()))
            .collect();

        let min_rate = series.min_rate().and_then(|r| r.to_f64()).unwrap_or_default();
        let max_rate = series.max_rate().and_then(|r| r.to_f64()).unwrap_or_default();
        let padding = (max_rate - min_rate).max(1e-8) * 0.1;
        let y_min = (min_rate - padding).max(0.0);
        let y_max = max_rate + padding;

        let mut x_min = points[0].0;
        let mut x_max = points[points.len() - 1].0;
        if x_min == x_max {
            x_min -= Duration::days(1);
            x_max += Duration::days(1);
        }

        let root = BitMapBackend::new(&self.output_path, (self.width, self.height))
            .into_drawing_area();
        root.fill(&WHITE)
            .map_err(|e| chart_error("Failed to fill canvas", e))?;

        let label = format!("{} {}", series.scale.normalize(), series.currency);
        let mut builder = ChartBuilder::on(&root);
        builder.margin(15);
        if self.labels {
            builder
                .caption(
                    format!("The rates of {} in {}", label, series.base_currency),
                    ("sans-serif", 30.0).into_font(),
                )
                .x_label_area_size(40)
                .y_label_area_size(60);
        }
        let mut chart = builder
            .build_cartesian_2d(x_min..x_max, y_min..y_max)
            .map_err(|e| chart_error("Failed to build chart", e))?;

        // the mesh is only drawn with labels; plotters cannot lay out a
        // date axis with zero key points
        if self.labels {
            let date_label = |d: &DateTime<Utc>| d.format("%Y-%m-%d").to_string();
            chart
                .configure_mesh()
                .x_labels(8)
                .x_label_formatter(&date_label)
                .y_desc(series.base_currency.as_str())
                .x_desc("Date")
                .draw()
                .map_err(|e| chart_error("Failed to draw mesh", e))?;
        }

        let line = chart
            .draw_series(LineSeries::new(points.iter().copied(), &BLUE))
            .map_err(|e| chart_error("Failed to draw line", e))?;
        if self.labels {
            line.label(label.as_str())
                .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &BLUE));
        }

        chart
            .draw_series(
                points
                    .iter()
                    .map(|&(x, y)| Circle::new((x, y), 3, BLUE.filled())),
            )
            .map_err(|e| chart_error("Failed to draw points", e))?;

        if self.labels {
            chart
                .configure_series_labels()
                .background_style(&WHITE.mix(0.8))
                .border_style(&BLACK)
                .draw()
                .map_err(|e| chart_error("Failed to draw legend", e))?;
        }

        root.present()
            .map_err(|e| chart_error("Failed to render chart", e))?;
        Ok(())
    }
}

impl ChartRenderer for PngChartRenderer {
    fn render(&self, series: &PlotSeries) -> Result<PathBuf> {
        if series.is_empty() {
            return Err(ConverterError::RateNotFound {
                currency: series.currency.clone(),
            });
        }

        if let Some(parent) = self.output_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        tracing::debug!(
            "Rendering {} points of {} to {}",
            series.len(),
            series.currency,
            self.output_path.display()
        );
        self.draw(series)?;

        Ok(self.output_path.clone())
    }
}
