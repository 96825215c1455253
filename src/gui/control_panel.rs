//! Control Panel Widget
//! Left side panel with the data source controls, plus the bottom time slider.

use crate::charts::format_count;
use crate::data::{TimeKey, Timeline};
use egui::{Align2, Color32, FontId, RichText, Sense};

/// Minimum horizontal gap between two slider tick labels.
const MARK_SPACING: f32 = 80.0;

/// Actions from control panel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlPanelAction {
    None,
    OpenCsv,
    Reload,
    CutoffChanged(TimeKey),
    ExportPng,
}

/// Source controls, status line and the time slider state.
pub struct ControlPanel {
    pub source_name: String,
    pub cutoff: TimeKey,
    pub max_key: TimeKey,
    pub period_label: String,
    pub marks: Vec<(TimeKey, String)>,
    pub status: String,
    pub is_busy: bool,
    /// Total cases and deaths at the current cutoff
    pub summary: Option<(f64, f64)>,
}

impl Default for ControlPanel {
    fn default() -> Self {
        Self {
            source_name: String::new(),
            cutoff: 0,
            max_key: 0,
            period_label: String::new(),
            marks: Vec::new(),
            status: "Ready".to_string(),
            is_busy: false,
            summary: None,
        }
    }
}

impl ControlPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
    }

    /// Reset the slider for a freshly loaded timeline. Returns the clamped cutoff.
    pub fn set_timeline(&mut self, timeline: &Timeline, initial: TimeKey, mark_every: usize) -> TimeKey {
        self.max_key = timeline.max_key();
        self.cutoff = initial.min(self.max_key);
        self.marks = timeline.date_marks(mark_every);
        self.period_label = timeline.period_label(self.cutoff);
        self.cutoff
    }

    /// Draw the side panel
    pub fn show(&mut self, ui: &mut egui::Ui) -> ControlPanelAction {
        let mut action = ControlPanelAction::None;

        ui.vertical_centered(|ui| {
            ui.add_space(5.0);
            ui.label(
                RichText::new("🦠 Pandemic Dashboard")
                    .size(20.0)
                    .color(Color32::from_rgb(203, 24, 29)),
            );
            ui.label(
                RichText::new("Cases and deaths by country")
                    .size(11.0)
                    .color(Color32::GRAY),
            );
        });
        ui.add_space(10.0);
        ui.separator();
        ui.add_space(5.0);

        // ===== Data Source Section =====
        ui.label(RichText::new("📁 Data Source").size(14.0).strong());
        ui.add_space(5.0);

        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                let name = if self.source_name.is_empty() {
                    "No source"
                } else {
                    self.source_name.as_str()
                };
                ui.label(RichText::new(name).size(12.0));
                ui.add_space(4.0);

                ui.horizontal(|ui| {
                    if ui
                        .add_enabled(!self.is_busy, egui::Button::new("Open CSV…"))
                        .clicked()
                    {
                        action = ControlPanelAction::OpenCsv;
                    }
                    if ui
                        .add_enabled(!self.is_busy, egui::Button::new("⟳ Reload"))
                        .clicked()
                    {
                        action = ControlPanelAction::Reload;
                    }
                });
            });

        ui.add_space(10.0);

        // ===== Summary Section =====
        ui.label(RichText::new("📈 Totals").size(14.0).strong());
        ui.add_space(5.0);

        egui::Grid::new("totals_grid")
            .num_columns(2)
            .spacing([12.0, 4.0])
            .show(ui, |ui| {
                ui.label("Through");
                ui.label(RichText::new(&self.period_label).strong());
                ui.end_row();

                let (cases, deaths) = self
                    .summary
                    .map(|(c, d)| (format_count(c), format_count(d)))
                    .unwrap_or_else(|| ("-".to_string(), "-".to_string()));
                ui.label("Cases");
                ui.label(cases);
                ui.end_row();
                ui.label("Deaths");
                ui.label(deaths);
                ui.end_row();
            });

        ui.add_space(10.0);
        ui.separator();
        ui.add_space(5.0);

        let can_export = !self.is_busy && self.summary.is_some();
        if ui
            .add_enabled(can_export, egui::Button::new("🖼 Export PNG…"))
            .clicked()
        {
            action = ControlPanelAction::ExportPng;
        }

        ui.add_space(10.0);
        if self.is_busy {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label(RichText::new(&self.status).size(11.0));
            });
        } else {
            ui.label(RichText::new(&self.status).size(11.0).color(Color32::GRAY));
        }

        action
    }

    /// Draw the time slider with its month tick labels
    pub fn show_timeline(&mut self, ui: &mut egui::Ui) -> ControlPanelAction {
        let mut action = ControlPanelAction::None;
        let enabled = !self.is_busy && self.max_key > 0;

        ui.add_space(6.0);
        ui.horizontal(|ui| {
            ui.label(RichText::new("🗓 Through").strong());
            ui.label(RichText::new(&self.period_label).size(14.0));
        });

        ui.spacing_mut().slider_width = (ui.available_width() - 20.0).max(100.0);
        let mut value = self.cutoff;
        let response = ui.add_enabled(
            enabled,
            egui::Slider::new(&mut value, 0..=self.max_key).show_value(false),
        );

        if response.changed() && value != self.cutoff {
            self.cutoff = value;
            action = ControlPanelAction::CutoffChanged(value);
        }

        // Tick labels under the slider track
        let track = response.rect;
        let (label_rect, _) =
            ui.allocate_exact_size(egui::vec2(track.width(), 16.0), Sense::hover());
        let inset = track.height() / 2.0;
        let left = track.left() + inset;
        let span = (track.width() - 2.0 * inset).max(1.0);
        let mut last_x = f32::NEG_INFINITY;

        for (key, label) in &self.marks {
            let t = if self.max_key == 0 {
                0.0
            } else {
                *key as f32 / self.max_key as f32
            };
            let x = left + t * span;
            if x - last_x < MARK_SPACING {
                continue;
            }
            last_x = x;
            ui.painter().text(
                egui::pos2(x, label_rect.top()),
                Align2::CENTER_TOP,
                label,
                FontId::proportional(10.0),
                Color32::GRAY,
            );
        }

        action
    }
}
