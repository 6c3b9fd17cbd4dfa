use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::Deserialize;

use super::renderer::{RendererLauncher, RendererProcess};
use super::{
    BackendError, BackendResult, ImageAsset, ImageAssets, OverlayBackend, RenderCommands,
    Settings,
};
use crate::store::{Overlay, Widget, WidgetKind};

const OVERLAY_FILE: &str = "overlay.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendPaths {
    /// One sub-directory per overlay, each holding `overlay.json` and images.
    pub overlay_dir: PathBuf,
    /// The `{"enabled": {...}}` settings file.
    pub settings_path: PathBuf,
}

impl BackendPaths {
    pub fn overlay_path(&self, overlay_name: &str) -> PathBuf {
        self.overlay_dir.join(overlay_name)
    }

    /// Widget image paths are relative to the overlay directory unless
    /// absolute.
    pub fn expand_image_path(&self, overlay_name: &str, content: &str) -> PathBuf {
        let path = Path::new(content);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.overlay_path(overlay_name).join(path)
        }
    }
}

#[derive(Deserialize)]
struct OverlayFile {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    widgets: Vec<Widget>,
}

#[derive(Debug, Default)]
struct LoadedState {
    settings: Settings,
    overlays: Vec<Overlay>,
}

/// Overlay storage on the local filesystem, also responsible for the
/// renderer child process.
#[derive(Debug)]
pub struct FileBackend {
    paths: BackendPaths,
    launcher: RendererLauncher,
    state: Mutex<LoadedState>,
    renderer: Mutex<Option<RendererProcess>>,
}

impl FileBackend {
    /// Creates the directories if needed and loads everything once.
    pub fn open(paths: BackendPaths, launcher: RendererLauncher) -> BackendResult<Self> {
        let prepare = |dir: &Path| {
            fs::create_dir_all(dir).map_err(|err| io_error("open", "create directory", dir, err))
        };
        prepare(&paths.overlay_dir)?;
        if let Some(parent) = paths.settings_path.parent() {
            prepare(parent)?;
        }

        let backend = Self {
            paths,
            launcher,
            state: Mutex::new(LoadedState::default()),
            renderer: Mutex::new(None),
        };
        backend.load("open")?;
        tracing::info!(
            overlay_dir = %backend.paths.overlay_dir.display(),
            "overlay backend ready"
        );
        Ok(backend)
    }

    pub fn paths(&self) -> &BackendPaths {
        &self.paths
    }

    pub fn is_renderer_running(&self) -> bool {
        self.renderer().is_some()
    }

    fn state(&self) -> MutexGuard<'_, LoadedState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn renderer(&self) -> MutexGuard<'_, Option<RendererProcess>> {
        self.renderer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Directory of one overlay. The name must be a single plain path
    /// component, so it never resolves to `overlay_dir` itself or above it.
    fn overlay_dir_for(&self, command: &'static str, overlay_name: &str) -> BackendResult<PathBuf> {
        let mut components = Path::new(overlay_name).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => Ok(self.paths.overlay_path(overlay_name)),
            _ => {
                tracing::warn!(command, overlay = overlay_name, "rejected overlay name");
                Err(BackendError::new(
                    command,
                    format!("invalid overlay name {overlay_name:?}"),
                ))
            }
        }
    }

    fn load(&self, command: &'static str) -> BackendResult<()> {
        let overlay_dir = &self.paths.overlay_dir;
        fs::create_dir_all(overlay_dir)
            .map_err(|err| io_error(command, "create directory", overlay_dir, err))?;
        let previous = self.read_settings(command)?;

        let mut overlays = Vec::new();
        let entries = fs::read_dir(&self.paths.overlay_dir)
            .map_err(|err| io_error(command, "list overlays in", &self.paths.overlay_dir, err))?;
        for entry in entries.flatten() {
            let dir = entry.path();
            if !dir.is_dir() {
                continue;
            }
            let Some(dir_name) = dir.file_name().and_then(|name| name.to_str()) else {
                continue;
            };
            match read_overlay(&dir, dir_name) {
                Ok(overlay) => overlays.push(overlay),
                Err(err) => {
                    tracing::error!(overlay = dir_name, %err, "failed to parse overlay");
                }
            }
        }
        overlays.sort_by(|a, b| a.name.cmp(&b.name));

        let mut settings = Settings::default();
        for overlay in &overlays {
            settings
                .enabled
                .insert(overlay.name.clone(), previous.is_enabled(&overlay.name));
        }

        tracing::debug!(count = overlays.len(), "loaded overlays");
        let mut state = self.state();
        state.overlays = overlays;
        state.settings = settings;
        Ok(())
    }

    fn read_settings(&self, command: &'static str) -> BackendResult<Settings> {
        let path = &self.paths.settings_path;
        if !path.exists() {
            let defaults = Settings::default();
            self.write_settings(command, &defaults)?;
            return Ok(defaults);
        }

        let parsed = fs::read_to_string(path)
            .map_err(|err| err.to_string())
            .and_then(|contents| {
                serde_json::from_str::<Settings>(&contents).map_err(|err| err.to_string())
            });
        Ok(parsed.unwrap_or_else(|err| {
            tracing::error!(%err, path = %path.display(), "failed to load settings; using defaults");
            Settings::default()
        }))
    }

    fn write_settings(&self, command: &'static str, settings: &Settings) -> BackendResult<()> {
        let path = &self.paths.settings_path;
        let contents = serde_json::to_string(settings)
            .map_err(|err| BackendError::new(command, format!("failed to encode settings: {err}")))?;
        fs::write(path, contents).map_err(|err| io_error(command, "write", path, err))
    }

    /// Widgets of every enabled overlay, with image paths made absolute and
    /// images that do not exist left out.
    fn renderer_widgets(&self) -> Vec<Widget> {
        let state = self.state();
        let mut widgets = Vec::new();
        for overlay in &state.overlays {
            if !state.settings.is_enabled(&overlay.name) {
                continue;
            }
            for widget in &overlay.widgets {
                let mut widget = widget.clone();
                if widget.kind == WidgetKind::Image {
                    let path = self.paths.expand_image_path(&overlay.name, &widget.content);
                    if !path.exists() {
                        tracing::warn!(path = %path.display(), "invalid image widget");
                        continue;
                    }
                    widget.content = path.to_string_lossy().into_owned();
                }
                widgets.push(widget);
            }
        }
        widgets
    }
}

fn read_overlay(dir: &Path, dir_name: &str) -> Result<Overlay, String> {
    let path = dir.join(OVERLAY_FILE);
    let contents =
        fs::read_to_string(&path).map_err(|err| format!("{}: {err}", path.display()))?;
    let file: OverlayFile =
        serde_json::from_str(&contents).map_err(|err| format!("{}: {err}", path.display()))?;
    Ok(Overlay {
        name: file.name.unwrap_or_else(|| dir_name.to_string()),
        widgets: file.widgets,
    })
}

fn io_error(command: &'static str, action: &str, path: &Path, err: io::Error) -> BackendError {
    BackendError::new(command, format!("failed to {action} {}: {err}", path.display()))
}

impl OverlayBackend for FileBackend {
    fn reload_config(&self) -> BackendResult<()> {
        self.load("reload_config")
    }

    fn get_overlays(&self) -> BackendResult<Vec<Overlay>> {
        Ok(self.state().overlays.clone())
    }

    fn get_images(&self) -> BackendResult<ImageAssets> {
        let state = self.state();
        let mut images = ImageAssets::new();
        for overlay in &state.overlays {
            for widget in &overlay.widgets {
                if widget.kind != WidgetKind::Image || !widget.has_content() {
                    continue;
                }
                let path = self.paths.expand_image_path(&overlay.name, &widget.content);
                match fs::read(&path) {
                    Ok(bytes) => {
                        images.insert(
                            overlay.name.clone(),
                            widget.content.clone(),
                            ImageAsset::from_path_bytes(&widget.content, bytes),
                        );
                    }
                    Err(err) => {
                        tracing::warn!(?err, path = %path.display(), "failed to load image");
                    }
                }
            }
        }
        Ok(images)
    }

    fn save_overlay(&self, overlay: &Overlay) -> BackendResult<()> {
        const COMMAND: &str = "save_overlay";
        let dir = self.overlay_dir_for(COMMAND, &overlay.name)?;
        fs::create_dir_all(&dir).map_err(|err| io_error(COMMAND, "create directory", &dir, err))?;

        let path = dir.join(OVERLAY_FILE);
        let contents = serde_json::to_string_pretty(overlay).map_err(|err| {
            BackendError::new(COMMAND, format!("failed to encode overlay: {err}"))
        })?;
        fs::write(&path, contents).map_err(|err| io_error(COMMAND, "write", &path, err))?;
        tracing::info!(overlay = %overlay.name, "saved overlay");
        self.load(COMMAND)
    }

    fn delete_overlay(&self, overlay: &Overlay) -> BackendResult<()> {
        const COMMAND: &str = "delete_overlay";
        let dir = self.overlay_dir_for(COMMAND, &overlay.name)?;
        fs::remove_dir_all(&dir).map_err(|err| io_error(COMMAND, "remove", &dir, err))?;
        tracing::info!(overlay = %overlay.name, "deleted overlay");
        self.load(COMMAND)
    }

    fn get_settings(&self) -> BackendResult<Settings> {
        Ok(self.state().settings.clone())
    }

    fn save_settings(&self, settings: &Settings) -> BackendResult<()> {
        let merged = {
            let mut state = self.state();
            state.settings.enabled = settings.enabled.clone();
            state.settings.clone()
        };
        self.write_settings("save_settings", &merged)
    }
}

impl RenderCommands for FileBackend {
    fn create(&self) {
        let mut renderer = self.renderer();
        if renderer.is_some() {
            return;
        }

        let widgets = self.renderer_widgets();
        tracing::info!(widgets = widgets.len(), "creating renderer process");
        match self.launcher.spawn(&widgets) {
            Ok(process) => {
                tracing::debug!(pid = process.id(), "renderer started");
                *renderer = Some(process);
            }
            Err(err) => {
                tracing::error!(
                    ?err,
                    binary = %self.launcher.binary().display(),
                    "failed to start renderer"
                );
            }
        }
    }

    fn destroy(&self) {
        let Some(process) = self.renderer().take() else {
            return;
        };
        tracing::info!("destroying renderer process");
        let output = process.terminate();
        if !output.is_empty() {
            tracing::info!(%output, "renderer finished with output");
        }
    }

    /// Forgets a renderer that exited by itself so the next `create` can
    /// start a fresh one.
    fn supervise(&self) {
        let mut renderer = self.renderer();
        let Some(process) = renderer.as_mut() else {
            return;
        };
        if let Some(status) = process.exit_status() {
            let output = process.drain_output();
            tracing::error!(%status, %output, "renderer process died");
            *renderer = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::WidgetPosition;

    fn open_in(root: &Path) -> FileBackend {
        let paths = BackendPaths {
            overlay_dir: root.join("overlays"),
            settings_path: root.join("config").join("config.json"),
        };
        FileBackend::open(paths, RendererLauncher::new(root.join("missing-renderer"), ":0"))
            .expect("backend should open")
    }

    fn text_overlay(name: &str) -> Overlay {
        let mut widget = Widget::new("t1", WidgetKind::Text);
        widget.content = "hello".to_string();
        widget.position = WidgetPosition::new(200, 50).anchored(0.5, 0.0).offset(-100, 20);
        Overlay {
            name: name.to_string(),
            widgets: vec![widget],
        }
    }

    #[test]
    fn open_creates_directories_and_default_settings() {
        let root = tempfile::tempdir().unwrap();
        let backend = open_in(root.path());

        assert!(root.path().join("overlays").is_dir());
        let written = fs::read_to_string(root.path().join("config/config.json")).unwrap();
        assert_eq!(written, r#"{"enabled":{}}"#);
        assert!(backend.get_overlays().unwrap().is_empty());
    }

    #[test]
    fn save_overlay_round_trips_through_disk() {
        let root = tempfile::tempdir().unwrap();
        let backend = open_in(root.path());

        backend.save_overlay(&text_overlay("Demo")).unwrap();

        assert!(root.path().join("overlays/Demo/overlay.json").is_file());
        assert_eq!(backend.get_overlays().unwrap(), vec![text_overlay("Demo")]);

        let reopened = open_in(root.path());
        assert_eq!(reopened.get_overlays().unwrap(), vec![text_overlay("Demo")]);
    }

    #[test]
    fn load_sorts_overlays_and_skips_broken_ones() {
        let root = tempfile::tempdir().unwrap();
        let backend = open_in(root.path());
        backend.save_overlay(&text_overlay("b")).unwrap();
        backend.save_overlay(&text_overlay("a")).unwrap();
        fs::create_dir_all(root.path().join("overlays/broken")).unwrap();
        fs::write(root.path().join("overlays/broken/overlay.json"), "{not json").unwrap();
        fs::create_dir_all(root.path().join("overlays/empty")).unwrap();

        backend.reload_config().unwrap();

        let names: Vec<String> = backend
            .get_overlays()
            .unwrap()
            .into_iter()
            .map(|overlay| overlay.name)
            .collect();
        assert_eq!(names, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn settings_are_pruned_to_existing_overlays() {
        let root = tempfile::tempdir().unwrap();
        let backend = open_in(root.path());
        backend.save_overlay(&text_overlay("Demo")).unwrap();

        let mut settings = Settings::default();
        settings.enabled.insert("Demo".to_string(), true);
        settings.enabled.insert("Gone".to_string(), true);
        backend.save_settings(&settings).unwrap();
        backend.reload_config().unwrap();

        let loaded = backend.get_settings().unwrap();
        assert_eq!(loaded.enabled.len(), 1);
        assert!(loaded.is_enabled("Demo"));
    }

    #[test]
    fn delete_overlay_removes_directory() {
        let root = tempfile::tempdir().unwrap();
        let backend = open_in(root.path());
        backend.save_overlay(&text_overlay("Demo")).unwrap();

        backend.delete_overlay(&text_overlay("Demo")).unwrap();

        assert!(!root.path().join("overlays/Demo").exists());
        assert!(backend.get_overlays().unwrap().is_empty());
        let err = backend.delete_overlay(&text_overlay("Demo")).unwrap_err();
        assert_eq!(err.command, "delete_overlay");
    }

    #[test]
    fn delete_overlay_rejects_names_outside_overlay_dir() {
        let root = tempfile::tempdir().unwrap();
        let backend = open_in(root.path());
        backend.save_overlay(&text_overlay("A")).unwrap();

        for name in ["", "..", ".", "a/b", "/tmp"] {
            let err = backend.delete_overlay(&Overlay::new(name)).unwrap_err();
            assert_eq!(err.command, "delete_overlay", "name {name:?}");
        }

        assert!(root.path().join("overlays/A/overlay.json").is_file());
        assert!(root.path().join("config/config.json").is_file());
        backend.reload_config().unwrap();
        assert_eq!(backend.get_overlays().unwrap(), vec![text_overlay("A")]);
    }

    #[test]
    fn save_overlay_rejects_parent_directory_name() {
        let root = tempfile::tempdir().unwrap();
        let backend = open_in(root.path());

        let err = backend.save_overlay(&text_overlay("..")).unwrap_err();

        assert_eq!(err.command, "save_overlay");
        assert!(!root.path().join("overlay.json").exists());
    }

    #[test]
    fn reload_recreates_missing_overlay_dir() {
        let root = tempfile::tempdir().unwrap();
        let backend = open_in(root.path());
        backend.save_overlay(&text_overlay("A")).unwrap();
        fs::remove_dir_all(root.path().join("overlays")).unwrap();

        backend.reload_config().unwrap();

        assert!(root.path().join("overlays").is_dir());
        assert!(backend.get_overlays().unwrap().is_empty());
        backend.save_overlay(&text_overlay("B")).unwrap();
        assert_eq!(backend.get_overlays().unwrap(), vec![text_overlay("B")]);
    }

    #[test]
    fn get_images_reads_relative_and_skips_missing_files() {
        let root = tempfile::tempdir().unwrap();
        let backend = open_in(root.path());
        let mut overlay = Overlay::new("Demo");
        let mut logo = Widget::new("i1", WidgetKind::Image);
        logo.content = "logo.png".to_string();
        let mut missing = Widget::new("i2", WidgetKind::Image);
        missing.content = "missing.jpg".to_string();
        overlay.widgets = vec![logo, missing, Widget::new("i3", WidgetKind::Image)];
        backend.save_overlay(&overlay).unwrap();
        fs::write(root.path().join("overlays/Demo/logo.png"), b"png-bytes").unwrap();

        let images = backend.get_images().unwrap();

        assert_eq!(images.len(), 1);
        let logo = images.get("Demo", "logo.png").unwrap();
        assert_eq!(logo.bytes, b"png-bytes");
        assert_eq!(logo.mime, "image/png");
    }

    #[test]
    fn renderer_widgets_cover_enabled_overlays_with_expanded_paths() {
        let root = tempfile::tempdir().unwrap();
        let backend = open_in(root.path());
        let mut shown = text_overlay("Shown");
        let mut image = Widget::new("i1", WidgetKind::Image);
        image.content = "logo.png".to_string();
        let mut broken = Widget::new("i2", WidgetKind::Image);
        broken.content = "nope.png".to_string();
        shown.widgets.push(image);
        shown.widgets.push(broken);
        backend.save_overlay(&shown).unwrap();
        backend.save_overlay(&text_overlay("Hidden")).unwrap();
        fs::write(root.path().join("overlays/Shown/logo.png"), b"png").unwrap();

        let mut settings = Settings::default();
        settings.enabled.insert("Shown".to_string(), true);
        backend.save_settings(&settings).unwrap();

        let widgets = backend.renderer_widgets();
        assert_eq!(widgets.len(), 2);
        assert_eq!(widgets[0].content, "hello");
        assert_eq!(
            PathBuf::from(&widgets[1].content),
            root.path().join("overlays/Shown/logo.png")
        );
    }

    #[test]
    fn create_without_renderer_binary_keeps_running_flag_off() {
        let root = tempfile::tempdir().unwrap();
        let backend = open_in(root.path());

        backend.create();
        assert!(!backend.is_renderer_running());
        backend.supervise();
        backend.destroy();
        assert!(!backend.is_renderer_running());
    }
}
