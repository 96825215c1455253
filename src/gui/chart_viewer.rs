//! Chart Viewer Widget
//! Central scrollable area: case map card on top, the two ranking cards below.

use crate::charts::{ChartPlotter, Metric};
use crate::data::AggregateResult;
use egui::{Color32, RichText, ScrollArea};

const CARD_SPACING: f32 = 12.0;

/// Latest query result and the map scale it is drawn with.
pub struct ChartViewer {
    pub result: Option<AggregateResult>,
    pub period_label: String,
    pub color_scale_max: f64,
}

impl ChartViewer {
    pub fn new(color_scale_max: f64) -> Self {
        Self {
            result: None,
            period_label: String::new(),
            color_scale_max,
        }
    }

    pub fn clear(&mut self) {
        self.result = None;
        self.period_label.clear();
    }

    pub fn set_result(&mut self, result: AggregateResult, period_label: String) {
        self.result = Some(result);
        self.period_label = period_label;
    }

    pub fn show(&self, ui: &mut egui::Ui) {
        let Some(result) = &self.result else {
            ui.centered_and_justified(|ui| {
                ui.label(RichText::new("No Data").size(20.0));
            });
            return;
        };

        ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                Self::card(ui, "Global Spread of Coronavirus", &self.period_label, |ui| {
                    ChartPlotter::draw_case_map(ui, result, self.color_scale_max);
                });

                ui.add_space(CARD_SPACING);

                let cases_title = Metric::Cases.title(result.top_cases.len());
                let deaths_title = Metric::Deaths.title(result.top_deaths.len());
                ui.columns(2, |columns| {
                    Self::card(&mut columns[0], &cases_title, "", |ui| {
                        ChartPlotter::draw_ranking_chart(ui, &result.top_cases, Metric::Cases);
                    });
                    Self::card(&mut columns[1], &deaths_title, "", |ui| {
                        ChartPlotter::draw_ranking_chart(ui, &result.top_deaths, Metric::Deaths);
                    });
                });
            });
    }

    fn card(ui: &mut egui::Ui, title: &str, subtitle: &str, body: impl FnOnce(&mut egui::Ui)) {
        egui::Frame::none()
            .rounding(8.0)
            .stroke(egui::Stroke::new(1.0, Color32::from_gray(90)))
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .inner_margin(12.0)
            .show(ui, |ui| {
                ui.set_width(ui.available_width());
                ui.vertical_centered(|ui| {
                    ui.label(RichText::new(title).size(18.0).strong());
                    if !subtitle.is_empty() {
                        ui.label(RichText::new(subtitle).size(12.0).color(Color32::GRAY));
                    }
                });
                ui.add_space(8.0);
                body(ui);
            });
    }
}
