//! RGB colors used to paint the icon background.

use image::Rgba;
use std::{fmt, str::FromStr};
use thiserror::Error;

/// An opaque RGB triple with channels in `0..=255`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb(pub u8, pub u8, pub u8);

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid color '{0}': expected a CSS color such as #667eea, #fff or rebeccapurple")]
pub struct ParseColorError(pub String);

impl Rgb {
    /// First color of the default purple gradient (`#667eea`).
    pub const GRADIENT_START: Rgb = Rgb(102, 126, 234);
    /// Second color of the default purple gradient (`#764ba2`).
    pub const GRADIENT_END: Rgb = Rgb(118, 75, 162);
    pub const WHITE: Rgb = Rgb(255, 255, 255);

    /// Per-channel integer average of two colors, truncated toward zero.
    ///
    /// This stands in for a real gradient: the whole circle is filled with
    /// the single blended color.
    pub fn blend(a: Rgb, b: Rgb) -> Rgb {
        let avg = |x: u8, y: u8| ((u16::from(x) + u16::from(y)) / 2) as u8;
        Rgb(avg(a.0, b.0), avg(a.1, b.1), avg(a.2, b.2))
    }

    /// Parse any CSS color string. Alpha is ignored.
    pub fn parse(s: &str) -> Result<Rgb, ParseColorError> {
        let color =
            css_color::Srgb::from_str(s.trim()).map_err(|_| ParseColorError(s.to_string()))?;
        let channel = |v: f32| (v.clamp(0.0, 1.0) * 255.).round() as u8;
        Ok(Rgb(
            channel(color.red),
            channel(color.green),
            channel(color.blue),
        ))
    }

    pub fn to_rgba(self, alpha: u8) -> Rgba<u8> {
        Rgba([self.0, self.1, self.2, alpha])
    }
}

impl FromStr for Rgb {
    type Err = ParseColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Rgb::parse(s)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}
