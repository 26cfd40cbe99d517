//! CIE L*a*b* (D65) color representation
//!
//! Conversion to and from sRGB goes through `palette`; distances are computed
//! here so that matching can choose between the chroma plane and full CIE76.

use palette::{FromColor, Srgb};
use std::fmt;

type PaletteLab = palette::Lab;

/// A color in CIE L*a*b* with a D65 white point
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Lab {
    /// Lightness, 0 (black) to 100 (white)
    pub l: f64,
    /// Green (negative) to red (positive) axis
    pub a: f64,
    /// Blue (negative) to yellow (positive) axis
    pub b: f64,
}

impl Lab {
    /// Create a color from its three components
    pub const fn new(l: f64, a: f64, b: f64) -> Self {
        Self { l, a, b }
    }

    /// Convert an 8-bit sRGB triple
    pub fn from_rgb(rgb: [u8; 3]) -> Self {
        let [red, green, blue] = rgb;
        let srgb: Srgb<f32> = Srgb::new(red, green, blue).into_format();
        let lab: PaletteLab = PaletteLab::from_color(srgb);
        Self::new(f64::from(lab.l), f64::from(lab.a), f64::from(lab.b))
    }

    /// Convert back to 8-bit sRGB, clamping out-of-gamut colors
    pub fn to_rgb(self) -> [u8; 3] {
        let lab: PaletteLab = PaletteLab::new(self.l as f32, self.a as f32, self.b as f32);
        let srgb: Srgb<f32> = Srgb::from_color(lab);
        let srgb: Srgb<u8> = srgb.into_format();
        [srgb.red, srgb.green, srgb.blue]
    }
}

impl fmt::Display for Lab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L={:.1} a={:.1} b={:.1}", self.l, self.a, self.b)
    }
}

/// Distance in the a*b* plane, ignoring lightness
pub fn ab_distance(x: Lab, y: Lab) -> f64 {
    (x.a - y.a).hypot(x.b - y.b)
}

/// Full CIE76 distance including lightness
pub fn lab_distance(x: Lab, y: Lab) -> f64 {
    let dl = x.l - y.l;
    dl.mul_add(dl, ab_distance(x, y).powi(2)).sqrt()
}

/// Format an sRGB triple as `#rrggbb`
pub fn hex(rgb: [u8; 3]) -> String {
    let [red, green, blue] = rgb;
    format!("#{red:02x}{green:02x}{blue:02x}")
}
