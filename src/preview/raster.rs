use image::{imageops, Rgba as Pixel, RgbaImage};

use super::layout::{PreviewContent, PreviewFrame};
use crate::color::Rgba;
use crate::geometry::PixelRect;

pub const PREVIEW_BACKGROUND: Rgba = Rgba::new(14.0 / 255.0, 20.0 / 255.0, 27.0 / 255.0, 1.0);
const PLACEHOLDER_OUTLINE: Pixel<u8> = Pixel([0x43, 0x49, 0x55, 0xff]);

/// Recolors `source` with `color` through its alpha mask: every pixel takes
/// the flat color, with alpha `color.alpha * source alpha`.
pub fn tint(source: &RgbaImage, color: Rgba) -> RgbaImage {
    let [r, g, b, a] = color.to_rgba8();
    let mut tinted = RgbaImage::new(source.width(), source.height());
    for (src, dst) in source.pixels().zip(tinted.pixels_mut()) {
        let alpha = (f32::from(a) * f32::from(src.0[3]) / 255.0).round() as u8;
        *dst = Pixel([r, g, b, alpha]);
    }
    tinted
}

/// Composes a frame into pixels, painting items in order over
/// `background`. Text glyphs are left to the host; only their background is
/// painted.
pub fn rasterize(frame: &PreviewFrame, background: Rgba) -> RgbaImage {
    let mut canvas = RgbaImage::from_pixel(
        frame.canvas.width,
        frame.canvas.height,
        Pixel(background.to_rgba8()),
    );

    for item in &frame.items {
        if item.rect.width == 0 || item.rect.height == 0 {
            continue;
        }
        let fill = RgbaImage::from_pixel(
            item.rect.width,
            item.rect.height,
            Pixel(item.bg_color.to_rgba8()),
        );
        let (x, y) = (i64::from(item.rect.x), i64::from(item.rect.y));
        imageops::overlay(&mut canvas, &fill, x, y);

        match &item.content {
            PreviewContent::Image(tinted) => {
                let scaled = imageops::resize(
                    tinted,
                    item.rect.width,
                    item.rect.height,
                    imageops::FilterType::Triangle,
                );
                imageops::overlay(&mut canvas, &scaled, x, y);
            }
            PreviewContent::Placeholder => outline(&mut canvas, item.rect),
            PreviewContent::Text(_) => {}
        }
    }

    canvas
}

fn outline(canvas: &mut RgbaImage, rect: PixelRect) {
    let left = i64::from(rect.x);
    let top = i64::from(rect.y);
    let right = left + i64::from(rect.width) - 1;
    let bottom = top + i64::from(rect.height) - 1;

    let mut put = |x: i64, y: i64| {
        if let (Ok(x), Ok(y)) = (u32::try_from(x), u32::try_from(y)) {
            if x < canvas.width() && y < canvas.height() {
                canvas.put_pixel(x, y, PLACEHOLDER_OUTLINE);
            }
        }
    };
    for x in left..=right {
        put(x, top);
        put(x, bottom);
    }
    for y in top..=bottom {
        put(left, y);
        put(right, y);
    }
}
