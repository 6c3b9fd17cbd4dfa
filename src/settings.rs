//! Quick-access panel state: which overlays the renderer should show.

use std::collections::BTreeMap;

use crate::backend::{OverlayBackend, Settings};
use crate::notification::ErrorReporter;

#[derive(Debug, Default)]
pub struct QuickSettings {
    enabled: BTreeMap<String, bool>,
}

impl QuickSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overlay toggles in name order.
    pub fn toggles(&self) -> impl Iterator<Item = (&str, bool)> {
        self.enabled
            .iter()
            .map(|(name, enabled)| (name.as_str(), *enabled))
    }

    pub fn is_enabled(&self, overlay: &str) -> bool {
        self.enabled.get(overlay).copied().unwrap_or(false)
    }

    /// Pulls the current toggles. On failure the previous toggles stay.
    pub fn refresh<B, R>(&mut self, backend: &B, reporter: &R) -> bool
    where
        B: OverlayBackend + ?Sized,
        R: ErrorReporter + ?Sized,
    {
        match backend.get_settings() {
            Ok(settings) => {
                self.enabled = settings.enabled;
                true
            }
            Err(err) => {
                tracing::warn!(message = %err.message, "failed to fetch settings");
                reporter.report(&err.message);
                false
            }
        }
    }

    /// Saves the toggle for one overlay alongside the others, then refreshes.
    pub fn set_enabled<B, R>(&mut self, backend: &B, reporter: &R, overlay: &str, enabled: bool)
    where
        B: OverlayBackend + ?Sized,
        R: ErrorReporter + ?Sized,
    {
        let mut settings = Settings {
            enabled: self.enabled.clone(),
        };
        settings.enabled.insert(overlay.to_string(), enabled);
        tracing::info!(overlay, enabled, "toggle overlay");

        if let Err(err) = backend.save_settings(&settings) {
            tracing::warn!(message = %err.message, "failed to save settings");
            reporter.report(&err.message);
        }
        self.refresh(backend, reporter);
    }

    /// Re-reads the backend configuration from disk, then refreshes.
    pub fn reload_config<B, R>(&mut self, backend: &B, reporter: &R)
    where
        B: OverlayBackend + ?Sized,
        R: ErrorReporter + ?Sized,
    {
        if let Err(err) = backend.reload_config() {
            reporter.report(&err.message);
        }
        self.refresh(backend, reporter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::CollectingReporter;
    use crate::session::tests::MemoryBackend;

    #[test]
    fn set_enabled_merges_with_existing_toggles() {
        let backend = MemoryBackend::default();
        backend
            .settings
            .borrow_mut()
            .enabled
            .insert("Clock".to_string(), true);
        let reporter = CollectingReporter::default();
        let mut quick = QuickSettings::new();
        assert!(quick.refresh(&backend, &reporter));

        quick.set_enabled(&backend, &reporter, "FPS", true);
        quick.set_enabled(&backend, &reporter, "Clock", false);

        let toggles: Vec<(&str, bool)> = quick.toggles().collect();
        assert_eq!(toggles, vec![("Clock", false), ("FPS", true)]);
        assert!(backend.settings.borrow().enabled["FPS"]);
        assert!(reporter.messages().is_empty());
    }

    #[test]
    fn reload_config_failure_is_reported_and_toggles_still_refresh() {
        let backend = MemoryBackend::default();
        backend.fail_reload.set(true);
        backend
            .settings
            .borrow_mut()
            .enabled
            .insert("FPS".to_string(), true);
        let reporter = CollectingReporter::default();
        let mut quick = QuickSettings::new();

        quick.reload_config(&backend, &reporter);

        assert_eq!(reporter.messages(), vec!["config unreadable".to_string()]);
        assert!(quick.is_enabled("FPS"));
    }
}
