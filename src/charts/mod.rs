//! Charts module - interactive and static chart rendering

mod palette;
mod plotter;
mod renderer;

pub use palette::format_count;
pub use plotter::{ChartPlotter, Metric};
pub use renderer::StaticChartRenderer;
