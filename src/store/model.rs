use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::color::Rgba;
use crate::geometry::WidgetPosition;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WidgetKind {
    Image,
    Text,
}

impl WidgetKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Text => "text",
        }
    }
}

impl fmt::Display for WidgetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One positioned element of an overlay.
///
/// `content` is the text for text widgets and an image path (relative to the
/// overlay directory, or absolute) for image widgets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Widget {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: WidgetKind,
    #[serde(default)]
    pub content: String,
    #[serde(flatten)]
    pub position: WidgetPosition,
    #[serde(default = "default_color")]
    pub color: Rgba,
    #[serde(default = "default_bg_color")]
    pub bg_color: Rgba,
}

impl Widget {
    pub fn new(id: impl Into<String>, kind: WidgetKind) -> Self {
        Self {
            id: id.into(),
            kind,
            content: String::new(),
            position: WidgetPosition::default(),
            color: default_color(),
            bg_color: default_bg_color(),
        }
    }

    pub fn has_content(&self) -> bool {
        !self.content.is_empty()
    }
}

fn default_color() -> Rgba {
    Rgba::WHITE
}

fn default_bg_color() -> Rgba {
    Rgba::TRANSPARENT
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Overlay {
    pub name: String,
    #[serde(default)]
    pub widgets: Vec<Widget>,
}

impl Overlay {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            widgets: Vec::new(),
        }
    }

    pub fn widget(&self, widget_id: &str) -> Option<&Widget> {
        self.widgets.iter().find(|widget| widget.id == widget_id)
    }

    pub fn widget_mut(&mut self, widget_id: &str) -> Option<&mut Widget> {
        self.widgets.iter_mut().find(|widget| widget.id == widget_id)
    }

    pub fn contains_widget(&self, widget_id: &str) -> bool {
        self.widget(widget_id).is_some()
    }
}

static WIDGET_ID_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Opaque widget id: creation time plus a process-wide sequence number.
pub(crate) fn next_widget_id() -> String {
    let sequence = WIDGET_ID_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos())
        .unwrap_or_default();
    format!("{nanos:x}{sequence:04x}")
}
