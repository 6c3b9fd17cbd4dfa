//! Widget colors: normalized RGBA for storage and HSLA for the color picker.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ColorError {
    #[error("color component {component} is not a finite number")]
    NotFinite { component: &'static str },
    #[error("color component {component}={value} outside {min}..={max}")]
    OutOfRange {
        component: &'static str,
        value: f32,
        min: f32,
        max: f32,
    },
}

pub type ColorResult<T> = std::result::Result<T, ColorError>;

/// Red, green, blue and alpha, each in `0.0..=1.0`.
///
/// Serialized as a plain 4-element array, which is the form stored in
/// `overlay.json` and handed to the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba(pub [f32; 4]);

impl Rgba {
    pub const WHITE: Self = Self([1.0, 1.0, 1.0, 1.0]);
    pub const TRANSPARENT: Self = Self([0.0, 0.0, 0.0, 0.0]);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self([r, g, b, a])
    }

    pub const fn r(self) -> f32 {
        self.0[0]
    }

    pub const fn g(self) -> f32 {
        self.0[1]
    }

    pub const fn b(self) -> f32 {
        self.0[2]
    }

    pub const fn alpha(self) -> f32 {
        self.0[3]
    }

    /// Channels scaled to bytes, for compositing.
    pub fn to_rgba8(self) -> [u8; 4] {
        self.0.map(unit_to_byte)
    }

    /// CSS color text, `rgba(R,G,B,a)` or `rgb(R,G,B)` without alpha.
    pub fn to_css(self, with_alpha: bool) -> String {
        let [r, g, b, _] = self.to_rgba8();
        if with_alpha {
            format!("rgba({r},{g},{b},{})", self.alpha())
        } else {
            format!("rgb({r},{g},{b})")
        }
    }

    pub fn to_hsla(self) -> Hsla {
        let (r, g, b) = (self.r(), self.g(), self.b());
        let v = r.max(g).max(b);
        let c = v - r.min(g).min(b);
        let f = 1.0 - (v + v - c - 1.0).abs();
        let sector = if c == 0.0 {
            0.0
        } else if v == r {
            (g - b) / c
        } else if v == g {
            2.0 + (b - r) / c
        } else {
            4.0 + (r - g) / c
        };
        let sector = if sector < 0.0 { sector + 6.0 } else { sector };
        // A tiny negative sector rounds up to a full turn.
        let hue = 60.0 * sector;
        let hue = if hue >= 360.0 { hue - 360.0 } else { hue };

        Hsla {
            hue,
            saturation: if f == 0.0 { 0.0 } else { c / f * 100.0 },
            lightness: (v + v - c) / 2.0 * 100.0,
            alpha: self.alpha(),
        }
    }
}

impl Default for Rgba {
    fn default() -> Self {
        Self::WHITE
    }
}

/// Picker representation: hue in degrees, saturation and lightness in
/// percent, alpha in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsla {
    pub hue: f32,
    pub saturation: f32,
    pub lightness: f32,
    pub alpha: f32,
}

impl Hsla {
    pub fn to_rgba(self) -> Rgba {
        let h = self.hue;
        let s = self.saturation / 100.0;
        let l = self.lightness / 100.0;
        let v = s * l.min(1.0 - l);
        let channel = |n: f32| {
            let k = (n + h / 30.0).rem_euclid(12.0);
            l - v * (k - 3.0).min(9.0 - k).clamp(-1.0, 1.0)
        };
        Rgba([channel(0.0), channel(8.0), channel(4.0), self.alpha])
    }
}

impl TryFrom<(f32, f32, f32, f32)> for Hsla {
    type Error = ColorError;

    fn try_from(
        (hue, saturation, lightness, alpha): (f32, f32, f32, f32),
    ) -> ColorResult<Self> {
        let hue = check_component("hue", hue, 0.0, 360.0)?;
        if hue == 360.0 {
            return Err(ColorError::OutOfRange {
                component: "hue",
                value: hue,
                min: 0.0,
                max: 360.0,
            });
        }
        Ok(Self {
            hue,
            saturation: check_component("saturation", saturation, 0.0, 100.0)?,
            lightness: check_component("lightness", lightness, 0.0, 100.0)?,
            alpha: check_component("alpha", alpha, 0.0, 1.0)?,
        })
    }
}

fn check_component(component: &'static str, value: f32, min: f32, max: f32) -> ColorResult<f32> {
    if !value.is_finite() {
        return Err(ColorError::NotFinite { component });
    }
    if !(min..=max).contains(&value) {
        return Err(ColorError::OutOfRange {
            component,
            value,
            min,
            max,
        });
    }
    Ok(value)
}

fn unit_to_byte(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}
