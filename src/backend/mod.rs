//! Command surface between the editor and whatever persists overlays and owns
//! the renderer process.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::store::Overlay;

mod files;
mod renderer;

pub use files::{BackendPaths, FileBackend};
pub use renderer::RendererLauncher;

/// A backend command that reported failure. `message` is shown to the user
/// verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct BackendError {
    pub command: &'static str,
    pub message: String,
}

impl BackendError {
    pub fn new(command: &'static str, message: impl Into<String>) -> Self {
        Self {
            command,
            message: message.into(),
        }
    }
}

pub type BackendResult<T> = std::result::Result<T, BackendError>;

/// Per-overlay enable flags, keyed by overlay name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub enabled: BTreeMap<String, bool>,
}

impl Settings {
    pub fn is_enabled(&self, overlay: &str) -> bool {
        self.enabled.get(overlay).copied().unwrap_or(false)
    }
}

/// Raw bytes of one image referenced by a widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAsset {
    pub mime: &'static str,
    pub bytes: Vec<u8>,
}

impl ImageAsset {
    pub fn from_path_bytes(path: &str, bytes: Vec<u8>) -> Self {
        let mime = if path.to_ascii_lowercase().ends_with(".png") {
            "image/png"
        } else {
            "image/jpeg"
        };
        Self { mime, bytes }
    }

    pub fn decode(&self) -> image::ImageResult<image::DynamicImage> {
        image::load_from_memory(&self.bytes)
    }
}

/// Loaded images per overlay, keyed by the widget `content` that references
/// them. Relative contents only mean something inside their overlay
/// directory, so two overlays may use the same key for different files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageAssets {
    by_overlay: HashMap<String, HashMap<String, ImageAsset>>,
}

impl ImageAssets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &mut self,
        overlay: impl Into<String>,
        content: impl Into<String>,
        asset: ImageAsset,
    ) -> Option<ImageAsset> {
        self.by_overlay
            .entry(overlay.into())
            .or_default()
            .insert(content.into(), asset)
    }

    pub fn get(&self, overlay: &str, content: &str) -> Option<&ImageAsset> {
        self.by_overlay.get(overlay)?.get(content)
    }

    pub fn len(&self) -> usize {
        self.by_overlay.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub trait OverlayBackend {
    fn reload_config(&self) -> BackendResult<()>;
    fn get_overlays(&self) -> BackendResult<Vec<Overlay>>;
    fn get_images(&self) -> BackendResult<ImageAssets>;
    fn save_overlay(&self, overlay: &Overlay) -> BackendResult<()>;
    fn delete_overlay(&self, overlay: &Overlay) -> BackendResult<()>;
    fn get_settings(&self) -> BackendResult<Settings>;
    fn save_settings(&self, settings: &Settings) -> BackendResult<()>;
}

/// Fire-and-forget show/hide commands for the renderer process.
pub trait RenderCommands {
    fn create(&self);
    fn destroy(&self);

    /// Housekeeping run once per visibility tick.
    fn supervise(&self) {}
}

impl<T: OverlayBackend + ?Sized> OverlayBackend for Arc<T> {
    fn reload_config(&self) -> BackendResult<()> {
        (**self).reload_config()
    }

    fn get_overlays(&self) -> BackendResult<Vec<Overlay>> {
        (**self).get_overlays()
    }

    fn get_images(&self) -> BackendResult<ImageAssets> {
        (**self).get_images()
    }

    fn save_overlay(&self, overlay: &Overlay) -> BackendResult<()> {
        (**self).save_overlay(overlay)
    }

    fn delete_overlay(&self, overlay: &Overlay) -> BackendResult<()> {
        (**self).delete_overlay(overlay)
    }

    fn get_settings(&self) -> BackendResult<Settings> {
        (**self).get_settings()
    }

    fn save_settings(&self, settings: &Settings) -> BackendResult<()> {
        (**self).save_settings(settings)
    }
}

impl<T: RenderCommands + ?Sized> RenderCommands for Arc<T> {
    fn create(&self) {
        (**self).create()
    }

    fn destroy(&self) {
        (**self).destroy()
    }

    fn supervise(&self) {
        (**self).supervise()
    }
}
