use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};

use crate::store::Widget;

/// How to start the native overlay renderer: `<binary> <widgets json>` on the
/// given X display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RendererLauncher {
    binary: PathBuf,
    display: String,
}

impl RendererLauncher {
    pub fn new(binary: impl Into<PathBuf>, display: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            display: display.into(),
        }
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    pub fn display(&self) -> &str {
        &self.display
    }

    pub(super) fn spawn(&self, widgets: &[Widget]) -> io::Result<RendererProcess> {
        let payload = serde_json::to_string(widgets).map_err(io::Error::other)?;
        let child = Command::new(&self.binary)
            .arg(payload)
            .env_clear()
            .env("DISPLAY", &self.display)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()?;
        Ok(RendererProcess { child })
    }
}

#[derive(Debug)]
pub(super) struct RendererProcess {
    child: Child,
}

impl RendererProcess {
    pub(super) fn id(&self) -> u32 {
        self.child.id()
    }

    /// Exit description when the process has already stopped on its own.
    pub(super) fn exit_status(&mut self) -> Option<String> {
        match self.child.try_wait() {
            Ok(Some(status)) => Some(status.to_string()),
            Ok(None) => None,
            Err(err) => {
                tracing::warn!(?err, "failed to poll renderer process");
                None
            }
        }
    }

    /// Kills the process if still running and returns whatever it printed.
    pub(super) fn terminate(mut self) -> String {
        if let Err(err) = self.child.kill() {
            if err.kind() != io::ErrorKind::InvalidInput {
                tracing::warn!(?err, "failed to kill renderer process");
            }
        }
        let output = self.drain_output();
        if let Err(err) = self.child.wait() {
            tracing::warn!(?err, "failed to wait for renderer process");
        }
        output
    }

    pub(super) fn drain_output(&mut self) -> String {
        let mut output = String::new();
        if let Some(stdout) = self.child.stdout.as_mut() {
            if let Err(err) = stdout.read_to_string(&mut output) {
                tracing::warn!(?err, "failed to read renderer output");
            }
        }
        output
    }
}
