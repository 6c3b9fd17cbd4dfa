//! Anchor-plus-offset widget placement on the logical 1280x800 display.
use serde::{Deserialize, Serialize};

pub const LOGICAL_WIDTH: u32 = 1280;
pub const LOGICAL_HEIGHT: u32 = 800;

pub const WIDTH_RANGE: (i32, i32) = (0, 800);
pub const HEIGHT_RANGE: (i32, i32) = (0, 1280);
pub const X_OFFSET_RANGE: (i32, i32) = (-800, 800);
pub const Y_OFFSET_RANGE: (i32, i32) = (-1280, 1280);

const DEFAULT_WIDGET_SIZE: i32 = 100;

/// Where a widget sits: a fractional anchor on the display plus a fixed offset
/// in logical pixels.
///
/// Field names match the flattened widget JSON shared with the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WidgetPosition {
    pub width: i32,
    pub height: i32,
    #[serde(default)]
    pub horizontal_anchor: f32,
    #[serde(default)]
    pub vertical_anchor: f32,
    #[serde(default)]
    pub x_offset: i32,
    #[serde(default)]
    pub y_offset: i32,
}

impl WidgetPosition {
    pub const fn new(width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            horizontal_anchor: 0.0,
            vertical_anchor: 0.0,
            x_offset: 0,
            y_offset: 0,
        }
    }

    pub const fn anchored(self, horizontal_anchor: f32, vertical_anchor: f32) -> Self {
        Self {
            horizontal_anchor,
            vertical_anchor,
            ..self
        }
    }

    pub const fn offset(self, x_offset: i32, y_offset: i32) -> Self {
        Self {
            x_offset,
            y_offset,
            ..self
        }
    }

    /// Forces every field into its editable range, like the reposition
    /// sliders do. Non-finite anchors collapse to 0.
    pub fn clamped(self) -> Self {
        Self {
            width: self.width.clamp(WIDTH_RANGE.0, WIDTH_RANGE.1),
            height: self.height.clamp(HEIGHT_RANGE.0, HEIGHT_RANGE.1),
            horizontal_anchor: clamp_anchor(self.horizontal_anchor),
            vertical_anchor: clamp_anchor(self.vertical_anchor),
            x_offset: self.x_offset.clamp(X_OFFSET_RANGE.0, X_OFFSET_RANGE.1),
            y_offset: self.y_offset.clamp(Y_OFFSET_RANGE.0, Y_OFFSET_RANGE.1),
        }
    }

    pub fn is_within_ranges(&self) -> bool {
        *self == self.clamped()
    }

    /// Absolute rectangle on a canvas of the given pixel size, in fractional
    /// pixels.
    pub fn place(&self, canvas: CanvasSize) -> PlacedRect {
        let width = canvas.width as f32;
        let height = canvas.height as f32;
        let scale_x = width / LOGICAL_WIDTH as f32;
        let scale_y = height / LOGICAL_HEIGHT as f32;

        PlacedRect {
            left: width * self.horizontal_anchor + scale_x * self.x_offset as f32,
            top: height * self.vertical_anchor + scale_y * self.y_offset as f32,
            width: scale_x * self.width as f32,
            height: scale_y * self.height as f32,
        }
    }
}

impl Default for WidgetPosition {
    fn default() -> Self {
        Self::new(DEFAULT_WIDGET_SIZE, DEFAULT_WIDGET_SIZE)
    }
}

fn clamp_anchor(value: f32) -> f32 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanvasSize {
    pub width: u32,
    pub height: u32,
}

impl CanvasSize {
    pub const LOGICAL: Self = Self::new(LOGICAL_WIDTH, LOGICAL_HEIGHT);

    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Preview surfaces keep the display aspect ratio (62.5% padding box).
    pub fn for_preview_width(width: u32) -> Self {
        let height = (u64::from(width) * u64::from(LOGICAL_HEIGHT) / u64::from(LOGICAL_WIDTH))
            .try_into()
            .unwrap_or(u32::MAX);
        Self::new(width, height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacedRect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl PlacedRect {
    pub fn right(&self) -> f32 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.top + self.height
    }

    /// Whole-pixel rectangle, floored the way the preview lays widgets out.
    pub fn to_pixels(&self) -> PixelRect {
        PixelRect {
            x: self.left.floor() as i32,
            y: self.top.floor() as i32,
            width: self.width.floor().max(0.0) as u32,
            height: self.height.floor().max(0.0) as u32,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-3;

    #[test]
    fn place_at_zero_anchor_and_offset_stays_on_canvas() {
        let canvases = [
            CanvasSize::new(1, 1),
            CanvasSize::new(320, 200),
            CanvasSize::LOGICAL,
            CanvasSize::new(1920, 1080),
        ];
        for canvas in canvases {
            let rect = WidgetPosition::new(800, 1280).place(canvas);
            assert_eq!(rect.left, 0.0);
            assert_eq!(rect.top, 0.0);
            assert!(rect.left <= canvas.width as f32);
            assert!(rect.top <= canvas.height as f32);
        }
    }

    #[test]
    fn place_scales_linearly_with_canvas_size() {
        let position = WidgetPosition::new(200, 50)
            .anchored(0.5, 0.25)
            .offset(-100, 20);
        let small = position.place(CanvasSize::new(640, 400));
        let large = position.place(CanvasSize::new(1280, 800));

        assert!((large.left - small.left * 2.0).abs() < EPSILON);
        assert!((large.top - small.top * 2.0).abs() < EPSILON);
        assert!((large.width - small.width * 2.0).abs() < EPSILON);
        assert!((large.height - small.height * 2.0).abs() < EPSILON);
    }

    #[test]
    fn place_on_logical_canvas_uses_offsets_as_pixels() {
        let rect = WidgetPosition::new(200, 50)
            .anchored(0.5, 0.0)
            .offset(-100, 20)
            .place(CanvasSize::LOGICAL);

        assert_eq!(rect.to_pixels(), PixelRect::new(540, 20, 200, 50));
        assert_eq!(rect.right(), 740.0);
        assert_eq!(rect.bottom(), 70.0);
    }

    #[test]
    fn to_pixels_floors_fractional_values() {
        let rect = WidgetPosition::new(100, 100)
            .anchored(1.0, 1.0)
            .offset(-100, -100)
            .place(CanvasSize::new(300, 190));

        assert_eq!(rect.to_pixels(), PixelRect::new(276, 166, 23, 23));
    }

    #[test]
    fn clamped_forces_declared_ranges() {
        let wild = WidgetPosition {
            width: 4000,
            height: -5,
            horizontal_anchor: 1.5,
            vertical_anchor: f32::NAN,
            x_offset: -9000,
            y_offset: 9000,
        };
        let clamped = wild.clamped();

        assert_eq!(
            clamped,
            WidgetPosition {
                width: 800,
                height: 0,
                horizontal_anchor: 1.0,
                vertical_anchor: 0.0,
                x_offset: -800,
                y_offset: 1280,
            }
        );
        assert!(clamped.is_within_ranges());
        assert!(WidgetPosition::default().is_within_ranges());
    }

    #[test]
    fn preview_canvas_keeps_display_aspect_ratio() {
        assert_eq!(CanvasSize::for_preview_width(640), CanvasSize::new(640, 400));
        assert_eq!(CanvasSize::for_preview_width(333), CanvasSize::new(333, 208));
    }
}
