//! Chart Plotter Module
//! Draws the case map and the two rankings with egui / egui_plot.

use super::palette::{color_scale, format_count, text_color_on, CASES_COLOR, DEATHS_COLOR};
use crate::data::{AggregateResult, LocationTotals};
use egui::{Align2, Color32, FontId, RichText, Sense, Stroke};
use egui_plot::{Bar, BarChart, Plot};

const TILE_WIDTH: f32 = 96.0;
const TILE_HEIGHT: f32 = 30.0;

/// Which statistic a ranking shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Cases,
    Deaths,
}

impl Metric {
    pub fn value(&self, totals: &LocationTotals) -> f64 {
        match self {
            Metric::Cases => totals.new_cases,
            Metric::Deaths => totals.new_deaths,
        }
    }

    /// Chart title for a ranking of `len` locations.
    pub fn title(&self, len: usize) -> String {
        let noun = if len == 1 { "country" } else { "countries" };
        let stat = match self {
            Metric::Cases => "cases",
            Metric::Deaths => "deaths",
        };
        format!("{len} {noun} with most {stat}")
    }

    pub fn axis_label(&self) -> &'static str {
        match self {
            Metric::Cases => "Cases",
            Metric::Deaths => "Deaths",
        }
    }

    pub fn color(&self) -> [u8; 3] {
        match self {
            Metric::Cases => CASES_COLOR,
            Metric::Deaths => DEATHS_COLOR,
        }
    }
}

fn color32([r, g, b]: [u8; 3]) -> Color32 {
    Color32::from_rgb(r, g, b)
}

/// Creates the dashboard charts using egui.
pub struct ChartPlotter;

impl ChartPlotter {
    /// Draw every location as a tile colored on the fixed Reds scale.
    pub fn draw_case_map(ui: &mut egui::Ui, result: &AggregateResult, ceiling: f64) {
        Self::draw_scale_legend(ui, ceiling);
        ui.add_space(6.0);

        if result.totals.is_empty() {
            ui.label(RichText::new("No cases reported yet").color(Color32::GRAY));
            return;
        }

        ui.horizontal_wrapped(|ui| {
            ui.spacing_mut().item_spacing = egui::vec2(3.0, 3.0);

            for totals in &result.totals {
                let fill = color_scale(totals.new_cases, ceiling);
                let (rect, response) =
                    ui.allocate_exact_size(egui::vec2(TILE_WIDTH, TILE_HEIGHT), Sense::hover());

                let painter = ui.painter();
                painter.rect_filled(rect, 3.0, color32(fill));
                if response.hovered() {
                    painter.rect_stroke(rect, 3.0, Stroke::new(1.5, Color32::BLACK));
                }
                painter.text(
                    rect.center(),
                    Align2::CENTER_CENTER,
                    Self::short_name(&totals.location, 14),
                    FontId::proportional(10.5),
                    color32(text_color_on(fill)),
                );

                response.on_hover_text(format!(
                    "{}\nCases: {}\nDeaths: {}",
                    totals.location,
                    format_count(totals.new_cases),
                    format_count(totals.new_deaths)
                ));
            }
        });
    }

    fn draw_scale_legend(ui: &mut egui::Ui, ceiling: f64) {
        const STEPS: usize = 24;

        ui.horizontal(|ui| {
            ui.label(RichText::new("0").size(11.0));
            let (rect, _) = ui.allocate_exact_size(egui::vec2(240.0, 12.0), Sense::hover());
            let step_width = rect.width() / STEPS as f32;
            for i in 0..STEPS {
                let value = ceiling * (i as f64 + 0.5) / STEPS as f64;
                let min = rect.min + egui::vec2(i as f32 * step_width, 0.0);
                let cell = egui::Rect::from_min_size(min, egui::vec2(step_width, rect.height()));
                ui.painter()
                    .rect_filled(cell, 0.0, color32(color_scale(value, ceiling)));
            }
            ui.label(RichText::new(format_count(ceiling)).size(11.0));
        });
    }

    /// Ranked bar chart; x-axis labels are the location names.
    pub fn draw_ranking_chart(ui: &mut egui::Ui, entries: &[LocationTotals], metric: Metric) {
        let names: Vec<String> = entries.iter().map(|t| t.location.clone()).collect();
        let fill = color32(metric.color());

        let bars: Vec<Bar> = entries
            .iter()
            .enumerate()
            .map(|(i, totals)| {
                Bar::new(i as f64, metric.value(totals))
                    .name(&totals.location)
                    .fill(fill)
                    .width(0.6)
            })
            .collect();

        Plot::new(format!("ranking_{:?}", metric))
            .height(260.0)
            .allow_zoom(false)
            .allow_drag(false)
            .allow_scroll(false)
            .include_y(0.0)
            .y_axis_label(metric.axis_label())
            .x_axis_formatter(move |mark, _range| {
                let idx = mark.value.round();
                if (mark.value - idx).abs() > 1e-6 || idx < 0.0 {
                    return String::new();
                }
                names.get(idx as usize).cloned().unwrap_or_default()
            })
            .y_axis_formatter(|mark, _range| format_count(mark.value))
            .show(ui, |plot_ui| {
                plot_ui.bar_chart(BarChart::new(bars).color(fill).name(metric.axis_label()));
            });
    }

    /// Truncate long location names to fit a tile.
    pub fn short_name(name: &str, max_chars: usize) -> String {
        if name.chars().count() <= max_chars {
            return name.to_string();
        }
        let mut short: String = name.chars().take(max_chars.saturating_sub(1)).collect();
        short.push('…');
        short
    }
}
