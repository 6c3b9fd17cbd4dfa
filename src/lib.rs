pub mod app;
pub mod backend;
pub mod color;
pub mod config;
pub mod error;
pub mod geometry;
pub mod logging;
pub mod notification;
pub mod poller;
pub mod preview;
pub mod session;
pub mod settings;
pub mod store;
pub use error::{AppError, AppResult};

/// Headless entrypoint: loads the configured overlays and reports what the
/// renderer would be given.
pub fn run() -> AppResult<()> {
    logging::init();
    tracing::info!("starting overlaid");

    let config = config::load_app_config();
    let (xdg_config_home, home) = config::config_env_dirs();
    let mut app = app::App::from_config(&config, xdg_config_home.as_deref(), home.as_deref())?;
    let report = app.load();

    for overlay in app.session().store().overlays() {
        tracing::info!(
            overlay = %overlay.name,
            widgets = overlay.widgets.len(),
            enabled = app.quick_settings().is_enabled(&overlay.name),
            "overlay loaded"
        );
    }
    if let Some((step, err)) = report.failures.first() {
        tracing::error!(?step, "initial load failed");
        return Err(err.clone().into());
    }

    tracing::info!(images = app.session().images().len(), "load complete");
    Ok(())
}
