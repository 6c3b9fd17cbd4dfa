//! Read-only projection of the active overlay onto a scaled preview surface.

mod layout;
mod raster;

pub use layout::{project, truncate_text, PreviewContent, PreviewFrame, PreviewItem};
pub use raster::{rasterize, tint, PREVIEW_BACKGROUND};
