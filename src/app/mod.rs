//! Wires the backend, the editing session, the quick settings and the
//! visibility poller into one running plugin instance.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::backend::FileBackend;
use crate::config::AppConfig;
use crate::error::AppResult;
use crate::notification::{DesktopNotifier, ErrorReporter};
use crate::poller::{HostState, OverlayToggle, PollerHandle, VisibilityPoller};
use crate::session::{Session, SyncReport};
use crate::settings::QuickSettings;

pub type OverlaySession<R = DesktopNotifier> = Session<Arc<FileBackend>, R>;

pub struct App<R = DesktopNotifier> {
    backend: Arc<FileBackend>,
    session: OverlaySession<R>,
    quick_settings: QuickSettings,
    toggle: OverlayToggle,
    poll_interval: Duration,
    poller: Option<PollerHandle>,
}

impl App {
    /// Builds the app with failures reported as desktop notifications.
    pub fn from_config(
        config: &AppConfig,
        xdg_config_home: Option<&Path>,
        home: Option<&Path>,
    ) -> AppResult<Self> {
        Self::with_reporter(config, xdg_config_home, home, DesktopNotifier)
    }
}

impl<R> App<R> {
    /// Stops the poller, which destroys the renderer on its way out.
    pub fn stop(&mut self) {
        if let Some(poller) = self.poller.take() {
            poller.stop();
            tracing::info!("overlaid stopped");
        }
    }
}

impl<R: ErrorReporter> App<R> {
    pub fn with_reporter(
        config: &AppConfig,
        xdg_config_home: Option<&Path>,
        home: Option<&Path>,
        reporter: R,
    ) -> AppResult<Self> {
        let paths = config.backend_paths(xdg_config_home, home)?;
        let launcher = config.renderer_launcher(home)?;
        let backend = Arc::new(FileBackend::open(paths, launcher)?);

        Ok(Self {
            session: Session::new(Arc::clone(&backend), reporter),
            backend,
            quick_settings: QuickSettings::new(),
            toggle: OverlayToggle::default(),
            poll_interval: config.poll_interval(),
            poller: None,
        })
    }

    /// Loads overlays, images and the per-overlay toggles.
    pub fn load(&mut self) -> SyncReport {
        let report = self.session.mount();
        self.quick_settings
            .refresh(self.backend.as_ref(), self.session.reporter());
        report
    }

    /// Loads everything and starts watching `host` for visibility changes.
    pub fn start<H>(&mut self, host: H) -> SyncReport
    where
        H: HostState + Send + 'static,
    {
        let report = self.load();
        if self.poller.is_none() {
            let poller = VisibilityPoller::new(self.toggle.clone());
            self.poller = Some(poller.spawn(host, Arc::clone(&self.backend), self.poll_interval));
        }
        tracing::info!(overlays = self.session.store().len(), "overlaid started");
        report
    }

    pub fn session(&self) -> &OverlaySession<R> {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut OverlaySession<R> {
        &mut self.session
    }

    pub fn quick_settings(&self) -> &QuickSettings {
        &self.quick_settings
    }

    pub fn toggle(&self) -> &OverlayToggle {
        &self.toggle
    }

    pub fn set_overlay_enabled(&mut self, overlay: &str, enabled: bool) {
        self.quick_settings
            .set_enabled(self.backend.as_ref(), self.session.reporter(), overlay, enabled);
    }

    /// Points an image widget at a picked file, relative to its overlay
    /// directory when possible.
    pub fn set_widget_image(
        &mut self,
        index: usize,
        widget_id: &str,
        picked: &Path,
    ) -> AppResult<()> {
        let overlay_root = self.backend.paths().overlay_dir.clone();
        self.session
            .store_mut()
            .set_image_content(index, widget_id, picked, &overlay_root)?;
        Ok(())
    }

    pub fn reload_config(&mut self) {
        self.quick_settings
            .reload_config(self.backend.as_ref(), self.session.reporter());
    }
}

impl<R> Drop for App<R> {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{OverlayBackend, RenderCommands};
    use crate::notification::CollectingReporter;
    use crate::store::WidgetKind;

    struct Desktop;

    impl HostState for Desktop {
        fn in_game(&self) -> bool {
            false
        }

        fn menu_visible(&self) -> bool {
            true
        }
    }

    fn app_in(root: &Path) -> App<CollectingReporter> {
        let config = AppConfig {
            overlay_dir: Some(root.join("overlays")),
            renderer_path: Some(root.join("renderer")),
            display: None,
            poll_interval_ms: Some(5),
        };
        App::with_reporter(
            &config,
            Some(&root.join("config")),
            None,
            CollectingReporter::default(),
        )
        .expect("app should build")
    }

    #[test]
    fn app_edits_and_toggles_through_file_backend() {
        let root = tempfile::tempdir().unwrap();
        let mut app = app_in(root.path());
        assert!(app.start(Desktop).is_clean());

        let session = app.session_mut();
        session.create_overlay("Demo").unwrap();
        let index = session.store().selected_index().unwrap();
        session
            .store_mut()
            .add_widget(index, WidgetKind::Text)
            .unwrap();
        let image_id = session
            .store_mut()
            .add_widget(index, WidgetKind::Image)
            .unwrap();
        app.set_widget_image(index, &image_id, &root.path().join("overlays/Demo/logo.png"))
            .unwrap();
        let session = app.session_mut();
        assert!(session.save_overlay(index).unwrap().is_clean());

        app.set_overlay_enabled("Demo", true);

        assert!(app.quick_settings().is_enabled("Demo"));
        assert!(root.path().join("overlays/Demo/overlay.json").is_file());
        let saved = app.session().store().selected().unwrap();
        assert_eq!(saved.widgets.len(), 2);
        assert_eq!(saved.widget(&image_id).unwrap().content, "logo.png");
        assert!(app.backend.get_settings().unwrap().is_enabled("Demo"));
        assert!(app.session().reporter().messages().is_empty());

        app.stop();
        app.backend.supervise();
    }
}
