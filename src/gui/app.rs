//! Pandemic Dashboard Main Application
//! Side panel with source controls, time slider at the bottom, charts in the center.

use crate::charts::StaticChartRenderer;
use crate::config::DashboardConfig;
use crate::data::{DataPipeline, DataSource, RecordSet, TimeKey};
use crate::gui::{ChartViewer, ControlPanel, ControlPanelAction};
use egui::{SidePanel, TopBottomPanel};
use std::sync::mpsc::{channel, Receiver, TryRecvError};
use std::thread;
use tracing::{error, info, warn};

/// Dataset loading result from background thread
enum LoadResult {
    Progress(String),
    Complete {
        records: RecordSet,
        source: DataSource,
    },
    Error(String),
}

/// Main application window.
pub struct DashboardApp {
    config: DashboardConfig,
    source: Option<DataSource>,
    records: Option<RecordSet>,
    control_panel: ControlPanel,
    chart_viewer: ChartViewer,

    // Async dataset loading
    load_rx: Option<Receiver<LoadResult>>,
    is_loading: bool,
}

impl DashboardApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, config: DashboardConfig) -> Self {
        let mut app = Self::with_config(config);

        match DataSource::parse(&app.config.source) {
            Ok(source) => app.start_loading(source),
            Err(e) => {
                error!(error = %e, "invalid data source");
                app.control_panel.set_status(format!("Error: {}", e));
            }
        }

        app
    }

    fn with_config(config: DashboardConfig) -> Self {
        Self {
            chart_viewer: ChartViewer::new(config.color_scale_max),
            config,
            source: None,
            records: None,
            control_panel: ControlPanel::new(),
            load_rx: None,
            is_loading: false,
        }
    }

    /// Fetch and clean the dataset in a background thread
    fn start_loading(&mut self, source: DataSource) {
        if self.is_loading {
            return;
        }

        self.control_panel.source_name = source.display_name();
        self.control_panel.set_status(format!("Loading {}...", source.display_name()));
        self.control_panel.is_busy = true;
        self.is_loading = true;

        let (tx, rx) = channel();
        self.load_rx = Some(rx);
        let options = self.config.load_options();

        thread::spawn(move || {
            let _ = tx.send(LoadResult::Progress(format!("Reading {}...", source)));

            match DataPipeline::load(&source, &options) {
                Ok(records) => {
                    let _ = tx.send(LoadResult::Complete { records, source });
                }
                Err(e) => {
                    error!(source = %source, error = %e, "dataset load failed");
                    let _ = tx.send(LoadResult::Error(e.to_string()));
                }
            }
        });
    }

    /// Check for dataset loading results
    fn check_load_results(&mut self) {
        let Some(rx) = self.load_rx.take() else {
            return;
        };
        let mut should_keep_receiver = true;

        while should_keep_receiver {
            match rx.try_recv() {
                Ok(LoadResult::Progress(status)) => {
                    self.control_panel.set_status(status);
                }
                Ok(LoadResult::Complete { records, source }) => {
                    self.install_records(records, source);
                    should_keep_receiver = false;
                }
                Ok(LoadResult::Error(e)) => {
                    self.control_panel.set_status(format!("Error: {}", e));
                    self.finish_loading();
                    should_keep_receiver = false;
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    // Loader thread ended without a result (panicked)
                    error!("dataset loader stopped unexpectedly");
                    self.control_panel
                        .set_status("Error: loading stopped unexpectedly");
                    self.finish_loading();
                    should_keep_receiver = false;
                }
            }
        }

        if should_keep_receiver {
            self.load_rx = Some(rx);
        }
    }

    fn finish_loading(&mut self) {
        self.is_loading = false;
        self.control_panel.is_busy = false;
    }

    /// Replace the dataset and redraw at the configured initial cutoff
    fn install_records(&mut self, records: RecordSet, source: DataSource) {
        let cutoff = self.control_panel.set_timeline(
            records.timeline(),
            self.config.initial_cutoff,
            self.config.mark_every,
        );
        if records.is_empty() {
            warn!(source = %source, "no records left after cleaning");
            self.control_panel
                .set_status("No dated country records in this dataset");
        } else {
            self.control_panel.set_status(format!(
                "Loaded {} records, {} months",
                records.len(),
                records.timeline().len()
            ));
        }
        self.chart_viewer.clear();
        self.records = Some(records);
        self.source = Some(source);
        self.finish_loading();
        self.run_query(cutoff);
    }

    /// Recompute the aggregates for a slider position (synchronous)
    fn run_query(&mut self, cutoff: TimeKey) {
        let Some(records) = &self.records else {
            return;
        };

        match DataPipeline::with_top_n(self.config.top_n).query(records, i64::from(cutoff)) {
            Ok(result) => {
                let label = records.timeline().period_label(cutoff);
                self.control_panel.period_label = label.clone();
                self.control_panel.summary = Some((result.total_cases(), result.total_deaths()));
                self.chart_viewer.set_result(result, label);
            }
            Err(e) => {
                error!(cutoff, error = %e, "query failed");
                self.control_panel.set_status(format!("Query error: {}", e));
            }
        }
    }

    /// Handle CSV file selection
    fn handle_open_csv(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("CSV Files", &["csv"])
            .pick_file()
        {
            self.start_loading(DataSource::File(path));
        }
    }

    fn handle_reload(&mut self) {
        let source = self
            .source
            .clone()
            .or_else(|| DataSource::parse(&self.config.source).ok());
        if let Some(source) = source {
            self.start_loading(source);
        }
    }

    /// Render the current charts to a PNG chosen by the user
    fn handle_export_png(&mut self) {
        let Some(result) = &self.chart_viewer.result else {
            self.control_panel.set_status("No charts to export");
            return;
        };

        let Some(path) = rfd::FileDialog::new()
            .add_filter("PNG Image", &["png"])
            .set_file_name("pandemic_dashboard.png")
            .save_file()
        else {
            return; // User cancelled
        };

        match StaticChartRenderer::save_snapshot(
            result,
            &self.chart_viewer.period_label,
            self.config.color_scale_max,
            &path,
        ) {
            Ok(()) => {
                self.control_panel
                    .set_status(format!("Exported {}", path.display()));
                if let Err(e) = open::that(&path) {
                    warn!(error = %e, "could not open exported image");
                }
            }
            Err(e) => {
                error!(error = %e, "export failed");
                self.control_panel.set_status(format!("Export error: {}", e));
            }
        }
    }

    fn handle_action(&mut self, action: ControlPanelAction) {
        match action {
            ControlPanelAction::OpenCsv => self.handle_open_csv(),
            ControlPanelAction::Reload => self.handle_reload(),
            ControlPanelAction::CutoffChanged(cutoff) => {
                info!(cutoff, "slider moved");
                self.run_query(cutoff);
            }
            ControlPanelAction::ExportPng => self.handle_export_png(),
            ControlPanelAction::None => {}
        }
    }
}

impl eframe::App for DashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.check_load_results();

        if self.is_loading {
            ctx.request_repaint();
        }

        let mut action = ControlPanelAction::None;

        SidePanel::left("control_panel")
            .min_width(240.0)
            .max_width(300.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    action = self.control_panel.show(ui);
                });
            });

        TopBottomPanel::bottom("timeline")
            .min_height(70.0)
            .show(ctx, |ui| {
                let slider_action = self.control_panel.show_timeline(ui);
                if slider_action != ControlPanelAction::None {
                    action = slider_action;
                }
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.chart_viewer.show(ui);
        });

        self.handle_action(action);
    }
}
