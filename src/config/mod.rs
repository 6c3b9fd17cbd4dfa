use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::backend::{BackendPaths, RendererLauncher};
use crate::poller::POLL_INTERVAL;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConfigPathError {
    #[error("missing HOME environment variable")]
    MissingHomeDirectory,
}

const APP_DIR: &str = "overlaid";
const APP_CONFIG_FILE: &str = "app.json";
const SETTINGS_FILE: &str = "config.json";
const DEFAULT_OVERLAY_SUBDIR: &str = "homebrew/overlays";
const DEFAULT_RENDERER_SUBDIR: &str = "homebrew/plugins/OverLaid/bin/OverLaid";
const DEFAULT_DISPLAY: &str = ":0";

/// Application-level settings from `app.json`. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub overlay_dir: Option<PathBuf>,
    #[serde(default)]
    pub renderer_path: Option<PathBuf>,
    #[serde(default)]
    pub display: Option<String>,
    #[serde(default)]
    pub poll_interval_ms: Option<u64>,
}

impl AppConfig {
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval_ms
            .filter(|millis| *millis > 0)
            .map(Duration::from_millis)
            .unwrap_or(POLL_INTERVAL)
    }

    pub fn display(&self) -> &str {
        self.display.as_deref().unwrap_or(DEFAULT_DISPLAY)
    }

    /// Backend locations: overlays under the configured directory (or
    /// `~/homebrew/overlays`), settings next to `app.json`.
    pub fn backend_paths(
        &self,
        xdg_config_home: Option<&Path>,
        home: Option<&Path>,
    ) -> Result<BackendPaths, ConfigPathError> {
        let overlay_dir = match &self.overlay_dir {
            Some(dir) => dir.clone(),
            None => home
                .ok_or(ConfigPathError::MissingHomeDirectory)?
                .join(DEFAULT_OVERLAY_SUBDIR),
        };
        Ok(BackendPaths {
            overlay_dir,
            settings_path: app_config_path(SETTINGS_FILE, xdg_config_home, home)?,
        })
    }

    pub fn renderer_launcher(&self, home: Option<&Path>) -> Result<RendererLauncher, ConfigPathError> {
        let binary = match &self.renderer_path {
            Some(path) => path.clone(),
            None => home
                .ok_or(ConfigPathError::MissingHomeDirectory)?
                .join(DEFAULT_RENDERER_SUBDIR),
        };
        Ok(RendererLauncher::new(binary, self.display()))
    }
}

pub(crate) fn load_app_config() -> AppConfig {
    let (xdg_config_home, home) = config_env_dirs();
    load_app_config_with(xdg_config_home.as_deref(), home.as_deref())
}

fn load_app_config_with(xdg_config_home: Option<&Path>, home: Option<&Path>) -> AppConfig {
    let path = match app_config_path(APP_CONFIG_FILE, xdg_config_home, home) {
        Ok(p) => p,
        Err(_) => return AppConfig::default(),
    };
    if !path.exists() {
        return AppConfig::default();
    }
    match std::fs::read_to_string(&path) {
        Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|err| {
            tracing::warn!(?err, ?path, "failed to parse app.json; using defaults");
            AppConfig::default()
        }),
        Err(err) => {
            tracing::warn!(?err, ?path, "failed to read app.json; using defaults");
            AppConfig::default()
        }
    }
}

pub(crate) fn config_env_dirs() -> (Option<PathBuf>, Option<PathBuf>) {
    (
        std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from),
        std::env::var_os("HOME").map(PathBuf::from),
    )
}

/// `<config root>/overlaid/<file_name>`.
fn app_config_path(
    file_name: &str,
    xdg_config_home: Option<&Path>,
    home: Option<&Path>,
) -> Result<PathBuf, ConfigPathError> {
    let mut path = config_root(xdg_config_home, home)?;
    path.push(APP_DIR);
    path.push(file_name);
    Ok(path)
}

fn config_root(
    xdg_config_home: Option<&Path>,
    home: Option<&Path>,
) -> Result<PathBuf, ConfigPathError> {
    if let Some(xdg) = xdg_config_home.filter(|path| !path.as_os_str().is_empty()) {
        return Ok(xdg.to_path_buf());
    }

    let home = home.ok_or(ConfigPathError::MissingHomeDirectory)?;
    Ok(home.join(".config"))
}
