//! Static Chart Renderer
//! Renders the dashboard into a single PNG snapshot with plotters.
//!
//! Layout:
//! 1. Top: "Global Spread of Coronavirus" case map (tile grid on the fixed Reds scale)
//! 2. Bottom left: top-5 locations by cases
//! 3. Bottom right: top-5 locations by deaths

use super::palette::{color_scale, format_count, text_color_on};
use super::plotter::{ChartPlotter, Metric};
use crate::data::{AggregateResult, LocationTotals};
use image::RgbImage;
use plotters::coord::Shift;
use plotters::prelude::*;
use std::path::Path;
use thiserror::Error;
use tracing::info;

const MAP_TITLE: &str = "Global Spread of Coronavirus";
const TILE_MIN_WIDTH: u32 = 110;
const TILE_MAX_HEIGHT: i32 = 34;
const LEGEND_HEIGHT: i32 = 26;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Drawing failed: {0}")]
    Draw(String),
    #[error("Invalid image size {0}x{1}")]
    Size(u32, u32),
    #[error("Failed to write image: {0}")]
    Image(#[from] image::ImageError),
}

fn draw_err(e: impl std::fmt::Display) -> RenderError {
    RenderError::Draw(e.to_string())
}

fn rgb([r, g, b]: [u8; 3]) -> RGBColor {
    RGBColor(r, g, b)
}

/// Columns and rows needed to lay out `count` tiles across `width` pixels.
pub fn tile_grid(count: usize, width: u32) -> (usize, usize) {
    let cols = ((width / TILE_MIN_WIDTH) as usize).max(1);
    let rows = count.div_ceil(cols);
    (cols, rows)
}

pub struct StaticChartRenderer;

impl StaticChartRenderer {
    /// Render the three charts for `result` into an RGB image.
    pub fn render_snapshot(
        result: &AggregateResult,
        period_label: &str,
        ceiling: f64,
        width: u32,
        height: u32,
    ) -> Result<RgbImage, RenderError> {
        if width < 200 || height < 200 {
            return Err(RenderError::Size(width, height));
        }

        let mut buffer = vec![0u8; width as usize * height as usize * 3];
        {
            let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
            root.fill(&WHITE).map_err(draw_err)?;

            let (top, bottom) = root.split_vertically(height as i32 * 11 / 20);
            Self::draw_case_map(&top, result, period_label, ceiling)?;

            let (left, right) = bottom.split_horizontally(width as i32 / 2);
            Self::draw_ranking(&left, &result.top_cases, Metric::Cases)?;
            Self::draw_ranking(&right, &result.top_deaths, Metric::Deaths)?;

            root.present().map_err(draw_err)?;
        }

        RgbImage::from_raw(width, height, buffer).ok_or(RenderError::Size(width, height))
    }

    /// Render and write a PNG file.
    pub fn save_snapshot(
        result: &AggregateResult,
        period_label: &str,
        ceiling: f64,
        path: &Path,
    ) -> Result<(), RenderError> {
        let image = Self::render_snapshot(result, period_label, ceiling, 1600, 1100)?;
        image.save(path)?;
        info!(path = %path.display(), "snapshot written");
        Ok(())
    }

    fn draw_case_map(
        area: &DrawingArea<BitMapBackend<'_>, Shift>,
        result: &AggregateResult,
        period_label: &str,
        ceiling: f64,
    ) -> Result<(), RenderError> {
        let title = if period_label.is_empty() {
            MAP_TITLE.to_string()
        } else {
            format!("{} (through {})", MAP_TITLE, period_label)
        };
        let area = area
            .margin(8, 8, 12, 12)
            .titled(&title, ("sans-serif", 26))
            .map_err(draw_err)?;

        let (width, height) = area.dim_in_pixel();
        Self::draw_scale_legend(&area, ceiling, width)?;

        let (cols, rows) = tile_grid(result.totals.len(), width);
        if rows == 0 {
            return Ok(());
        }

        let tile_w = width as i32 / cols as i32;
        let tile_h = ((height as i32 - LEGEND_HEIGHT) / rows as i32).clamp(1, TILE_MAX_HEIGHT);
        let font_size = (tile_h - 6).clamp(6, 13);

        for (i, totals) in result.totals.iter().enumerate() {
            let x0 = (i % cols) as i32 * tile_w;
            let y0 = LEGEND_HEIGHT + (i / cols) as i32 * tile_h;
            let fill = color_scale(totals.new_cases, ceiling);

            area.draw(&Rectangle::new(
                [(x0 + 1, y0 + 1), (x0 + tile_w - 1, y0 + tile_h - 1)],
                rgb(fill).filled(),
            ))
            .map_err(draw_err)?;

            if tile_h >= 10 {
                let style = ("sans-serif", font_size)
                    .into_font()
                    .color(&rgb(text_color_on(fill)));
                area.draw(&Text::new(
                    ChartPlotter::short_name(&totals.location, 16),
                    (x0 + 4, y0 + (tile_h - font_size) / 2),
                    style,
                ))
                .map_err(draw_err)?;
            }
        }

        Ok(())
    }

    fn draw_scale_legend(
        area: &DrawingArea<BitMapBackend<'_>, Shift>,
        ceiling: f64,
        width: u32,
    ) -> Result<(), RenderError> {
        const STEPS: i32 = 32;
        let legend_w = (width as i32 / 3).max(STEPS);
        let step = legend_w / STEPS;
        let x_start = width as i32 - legend_w - 90;

        area.draw(&Text::new(
            "0",
            (x_start - 14, 2),
            ("sans-serif", 12).into_font(),
        ))
        .map_err(draw_err)?;

        for i in 0..STEPS {
            let value = ceiling * (i as f64 + 0.5) / STEPS as f64;
            let x = x_start + i * step;
            area.draw(&Rectangle::new(
                [(x, 2), (x + step, 16)],
                rgb(color_scale(value, ceiling)).filled(),
            ))
            .map_err(draw_err)?;
        }

        area.draw(&Text::new(
            format_count(ceiling),
            (x_start + STEPS * step + 6, 2),
            ("sans-serif", 12).into_font(),
        ))
        .map_err(draw_err)?;

        Ok(())
    }

    fn draw_ranking(
        area: &DrawingArea<BitMapBackend<'_>, Shift>,
        entries: &[LocationTotals],
        metric: Metric,
    ) -> Result<(), RenderError> {
        let n = entries.len().max(1);
        let names: Vec<String> = entries.iter().map(|t| t.location.clone()).collect();
        let y_max = entries
            .iter()
            .map(|t| metric.value(t))
            .fold(0.0, f64::max)
            .max(1.0)
            * 1.1;

        let mut chart = ChartBuilder::on(area)
            .caption(metric.title(entries.len()), ("sans-serif", 20))
            .margin(15)
            .x_label_area_size(40)
            .y_label_area_size(90)
            .build_cartesian_2d((0..n).into_segmented(), 0f64..y_max)
            .map_err(draw_err)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(n)
            .x_label_formatter(&|v| match v {
                SegmentValue::CenterOf(i) => names.get(*i).cloned().unwrap_or_default(),
                _ => String::new(),
            })
            .y_label_formatter(&|v| format_count(*v))
            .y_desc(metric.axis_label())
            .draw()
            .map_err(draw_err)?;

        chart
            .draw_series(
                Histogram::vertical(&chart)
                    .style(rgb(metric.color()).filled())
                    .margin(12)
                    .data(entries.iter().enumerate().map(|(i, t)| (i, metric.value(t)))),
            )
            .map_err(draw_err)?;

        Ok(())
    }
}
