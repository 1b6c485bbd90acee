//! GUI module - User interface components

mod app;
mod chart_viewer;
mod control_panel;
mod map_viewer;

pub use app::DashboardApp;
pub use chart_viewer::ChartViewer;
pub use control_panel::{ControlPanel, ControlPanelAction, Page, SourceKind};
pub use map_viewer::MapViewer;
