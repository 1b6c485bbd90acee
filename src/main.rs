//! Case Trends - interactive dashboard of cumulative case/death series
//!
//! Global and regional trend charts plus a regional column map, backed by the
//! `case_trends` library pipeline.

mod charts;
mod gui;

use anyhow::{anyhow, Result};
use case_trends::DashboardConfig;
use eframe::egui;
use gui::DashboardApp;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> Result<()> {
    let config = DashboardConfig::load()?;

    // RUST_LOG wins over the configured filter
    let env = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_filter));
    fmt::Subscriber::builder().with_env_filter(env).init();
    info!(
        global = %config.global_source.display(),
        regional = %config.regional_source.display(),
        "startup"
    );

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 800.0])
            .with_min_inner_size([1000.0, 650.0])
            .with_title("Case Trends"),
        ..Default::default()
    };

    eframe::run_native(
        "Case Trends",
        options,
        Box::new(|cc| Ok(Box::new(DashboardApp::new(cc, config)))),
    )
    .map_err(|e| anyhow!("failed to start the dashboard: {e}"))
}
