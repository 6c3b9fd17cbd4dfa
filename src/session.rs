//! Keeps the in-memory store and the backend in step.
//!
//! Every commit is "write, then reload everything": the backend's view wins
//! and unsaved local edits are dropped by the reload.

use crate::backend::{BackendError, ImageAssets, OverlayBackend};
use crate::notification::ErrorReporter;
use crate::store::{OverlayStore, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStep {
    ReloadConfig,
    FetchOverlays,
    FetchImages,
    SaveOverlay,
    DeleteOverlay,
}

/// Outcome of a best-effort sync: each failed step with the backend message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub failures: Vec<(SyncStep, BackendError)>,
}

impl SyncReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failed(&self, step: SyncStep) -> bool {
        self.failures.iter().any(|(failed, _)| *failed == step)
    }

    fn merge(&mut self, other: SyncReport) {
        self.failures.extend(other.failures);
    }
}

#[derive(Debug)]
pub struct Session<B, R> {
    store: OverlayStore,
    images: ImageAssets,
    backend: B,
    reporter: R,
}

impl<B: OverlayBackend, R: ErrorReporter> Session<B, R> {
    pub fn new(backend: B, reporter: R) -> Self {
        Self {
            store: OverlayStore::new(),
            images: ImageAssets::new(),
            backend,
            reporter,
        }
    }

    pub fn store(&self) -> &OverlayStore {
        &self.store
    }

    /// Direct editing access; nothing is persisted until a save.
    pub fn store_mut(&mut self) -> &mut OverlayStore {
        &mut self.store
    }

    pub fn images(&self) -> &ImageAssets {
        &self.images
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    /// Initial load when the editor opens.
    pub fn mount(&mut self) -> SyncReport {
        self.reload()
    }

    /// Reloads config, overlays and images, then restores the previous
    /// selection by name or falls back to the first overlay. A failing step
    /// is reported and the rest still run.
    pub fn reload(&mut self) -> SyncReport {
        let previous = self.store.selected().map(|overlay| overlay.name.clone());
        let mut report = SyncReport::default();

        if let Err(err) = self.backend.reload_config() {
            self.fail(&mut report, SyncStep::ReloadConfig, err);
        }

        match self.backend.get_overlays() {
            Ok(overlays) => {
                self.store.replace_all(overlays);
                let restored = previous
                    .as_deref()
                    .is_some_and(|name| self.store.select_named(name));
                if !restored {
                    self.store.select_overlay(0);
                }
            }
            Err(err) => self.fail(&mut report, SyncStep::FetchOverlays, err),
        }

        match self.backend.get_images() {
            Ok(images) => self.images = images,
            Err(err) => self.fail(&mut report, SyncStep::FetchImages, err),
        }

        tracing::debug!(
            overlays = self.store.len(),
            images = self.images.len(),
            selected = ?self.store.selected_index(),
            failures = report.failures.len(),
            "reload finished"
        );
        report
    }

    /// Persists the overlay at `index` as it is now, then reloads.
    pub fn save_overlay(&mut self, index: usize) -> Result<SyncReport, StoreError> {
        let overlay = self
            .store
            .overlay(index)
            .cloned()
            .ok_or(StoreError::UnknownOverlay { index })?;

        let mut report = SyncReport::default();
        if let Err(err) = self.backend.save_overlay(&overlay) {
            self.fail(&mut report, SyncStep::SaveOverlay, err);
        }
        report.merge(self.reload());
        Ok(report)
    }

    /// Deletes the overlay at `index` on the backend, then reloads.
    pub fn delete_overlay(&mut self, index: usize) -> Result<SyncReport, StoreError> {
        let overlay = self
            .store
            .overlay(index)
            .cloned()
            .ok_or(StoreError::UnknownOverlay { index })?;

        let mut report = SyncReport::default();
        if let Err(err) = self.backend.delete_overlay(&overlay) {
            self.fail(&mut report, SyncStep::DeleteOverlay, err);
        }
        report.merge(self.reload());
        Ok(report)
    }

    /// Creates and saves an empty overlay, then selects it. A name collision
    /// is reported and nothing reaches the backend.
    pub fn create_overlay(&mut self, name: &str) -> Result<SyncReport, StoreError> {
        let index = match self.store.create_overlay(name) {
            Ok(index) => index,
            Err(err) => {
                self.reporter.report(&err.to_string());
                return Err(err);
            }
        };

        let report = self.save_overlay(index)?;
        self.store.select_named(name);
        Ok(report)
    }

    fn fail(&self, report: &mut SyncReport, step: SyncStep, err: BackendError) {
        tracing::warn!(?step, command = err.command, message = %err.message, "backend call failed");
        self.reporter.report(&err.message);
        report.failures.push((step, err));
    }
}
