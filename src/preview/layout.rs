use image::RgbaImage;

use super::raster::tint;
use crate::backend::ImageAssets;
use crate::color::Rgba;
use crate::geometry::{CanvasSize, PixelRect};
use crate::store::{Overlay, Widget, WidgetKind};

// Rough cell size of the preview's extra-small font.
const PREVIEW_GLYPH_WIDTH: u32 = 5;
const PREVIEW_LINE_HEIGHT: u32 = 10;
const ELLIPSIS: char = '\u{2026}';

#[derive(Debug, Clone, PartialEq)]
pub enum PreviewContent {
    /// Source image recolored with the widget color, at natural size.
    Image(RgbaImage),
    Text(String),
    Placeholder,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PreviewItem {
    pub widget_id: String,
    pub rect: PixelRect,
    pub color: Rgba,
    pub bg_color: Rgba,
    pub content: PreviewContent,
}

/// Draw list for one preview surface, back to front.
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewFrame {
    pub canvas: CanvasSize,
    pub items: Vec<PreviewItem>,
}

/// Projects the active overlay onto a preview surface of `canvas` pixels.
/// No overlay gives an empty frame.
pub fn project(overlay: Option<&Overlay>, images: &ImageAssets, canvas: CanvasSize) -> PreviewFrame {
    let items = overlay
        .map(|overlay| {
            overlay
                .widgets
                .iter()
                .map(|widget| project_widget(&overlay.name, widget, images, canvas))
                .collect()
        })
        .unwrap_or_default();

    PreviewFrame { canvas, items }
}

fn project_widget(
    overlay_name: &str,
    widget: &Widget,
    images: &ImageAssets,
    canvas: CanvasSize,
) -> PreviewItem {
    let rect = widget.position.place(canvas).to_pixels();
    let content = match widget.kind {
        WidgetKind::Image => images
            .get(overlay_name, &widget.content)
            .and_then(|asset| match asset.decode() {
                Ok(source) => Some(PreviewContent::Image(tint(&source.to_rgba8(), widget.color))),
                Err(err) => {
                    tracing::warn!(content = %widget.content, ?err, "failed to decode preview image");
                    None
                }
            })
            .unwrap_or(PreviewContent::Placeholder),
        WidgetKind::Text => PreviewContent::Text(truncate_text(&widget.content, rect)),
    };

    PreviewItem {
        widget_id: widget.id.clone(),
        rect,
        color: widget.color,
        bg_color: widget.bg_color,
        content,
    }
}

/// Cuts text to what fits in `rect`, ending in an ellipsis when shortened.
pub fn truncate_text(text: &str, rect: PixelRect) -> String {
    let columns = rect.width / PREVIEW_GLYPH_WIDTH;
    let lines = (rect.height / PREVIEW_LINE_HEIGHT).max(1);
    let capacity = usize::try_from(columns.saturating_mul(lines)).unwrap_or(usize::MAX);

    if text.chars().count() <= capacity {
        return text.to_string();
    }
    if capacity == 0 {
        return String::new();
    }

    let mut truncated: String = text.chars().take(capacity - 1).collect();
    truncated.push(ELLIPSIS);
    truncated
}
