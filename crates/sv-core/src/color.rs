//! Categorical palette and CSS-style color formatting.
//!
//! Colors render as `rgb(r, g, b)` and translucent fills as
//! `rgba(r, g, b, a)`, the notation most chart renderers accept directly.

use std::fmt;
use std::str::FromStr;

use crate::SvError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Same hue with the given opacity, clamped to `[0, 1]`.
    pub fn with_alpha(self, alpha: f64) -> Rgba {
        Rgba {
            r: self.r,
            g: self.g,
            b: self.b,
            a: alpha.clamp(0.0, 1.0),
        }
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgb({}, {}, {})", self.r, self.g, self.b)
    }
}

impl FromStr for Rgb {
    type Err = SvError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || SvError::InvalidColor {
            literal: s.to_string(),
        };
        let inner = s
            .trim()
            .strip_prefix("rgb(")
            .and_then(|rest| rest.strip_suffix(')'))
            .ok_or_else(invalid)?;
        let parts: Vec<u8> = inner
            .split(',')
            .map(|p| p.trim().parse::<u8>())
            .collect::<Result<_, _>>()
            .map_err(|_| invalid())?;
        match parts.as_slice() {
            [r, g, b] => Ok(Rgb::new(*r, *g, *b)),
            _ => Err(invalid()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f64,
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
    }
}

impl FromStr for Rgba {
    type Err = SvError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || SvError::InvalidColor {
            literal: s.to_string(),
        };
        let inner = s
            .trim()
            .strip_prefix("rgba(")
            .and_then(|rest| rest.strip_suffix(')'))
            .ok_or_else(invalid)?;
        let parts: Vec<&str> = inner.split(',').map(str::trim).collect();
        let [r, g, b, a] = parts.as_slice() else {
            return Err(invalid());
        };
        let channel = |p: &str| p.parse::<u8>().map_err(|_| invalid());
        let alpha = a.parse::<f64>().map_err(|_| invalid())?;
        if !(0.0..=1.0).contains(&alpha) {
            return Err(invalid());
        }
        Ok(Rgb::new(channel(r)?, channel(g)?, channel(b)?).with_alpha(alpha))
    }
}

#[cfg(feature = "serde")]
mod serde_impls {
    use super::{Rgb, Rgba};
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    impl Serialize for Rgb {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            serializer.collect_str(self)
        }
    }

    impl<'de> Deserialize<'de> for Rgb {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            let raw = String::deserialize(deserializer)?;
            raw.parse().map_err(D::Error::custom)
        }
    }

    impl Serialize for Rgba {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            serializer.collect_str(self)
        }
    }

    impl<'de> Deserialize<'de> for Rgba {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            let raw = String::deserialize(deserializer)?;
            raw.parse().map_err(D::Error::custom)
        }
    }
}

/// Ten-color categorical cycle used for measure lines.
pub const DEFAULT_PALETTE: [Rgb; 10] = [
    Rgb::new(31, 119, 180),
    Rgb::new(255, 127, 14),
    Rgb::new(44, 160, 44),
    Rgb::new(214, 39, 40),
    Rgb::new(148, 103, 189),
    Rgb::new(140, 86, 75),
    Rgb::new(227, 119, 194),
    Rgb::new(127, 127, 127),
    Rgb::new(188, 189, 34),
    Rgb::new(23, 190, 207),
];

/// A non-empty color cycle. Indexing past the end wraps around.
#[derive(Debug, Clone, PartialEq)]
pub struct Palette {
    colors: Vec<Rgb>,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            colors: DEFAULT_PALETTE.to_vec(),
        }
    }
}

impl Palette {
    pub fn new(colors: Vec<Rgb>) -> Result<Self, SvError> {
        if colors.is_empty() {
            return Err(SvError::InvalidArg {
                what: "palette must contain at least one color",
            });
        }
        Ok(Self { colors })
    }

    pub fn color(&self, index: usize) -> Rgb {
        self.colors[index % self.colors.len()]
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgb_formats_like_css() {
        assert_eq!(DEFAULT_PALETTE[0].to_string(), "rgb(31, 119, 180)");
    }

    #[test]
    fn fill_color_is_translucent_variant() {
        let fill = DEFAULT_PALETTE[1].with_alpha(0.2);
        assert_eq!(fill.to_string(), "rgba(255, 127, 14, 0.2)");
        assert_eq!((fill.r, fill.g, fill.b), (255, 127, 14));
    }

    #[test]
    fn parse_roundtrips_display() {
        let c: Rgb = "rgb(44, 160, 44)".parse().unwrap();
        assert_eq!(c, DEFAULT_PALETTE[2]);
        assert!("rgb(1,2)".parse::<Rgb>().is_err());
        assert!("hsl(1,2,3)".parse::<Rgb>().is_err());
        assert!("rgb(300, 2, 3)".parse::<Rgb>().is_err());
    }

    #[test]
    fn rgba_parses_its_display() {
        let fill = DEFAULT_PALETTE[4].with_alpha(0.2);
        assert_eq!(fill.to_string().parse::<Rgba>().unwrap(), fill);
        assert!("rgba(1, 2, 3, 1.5)".parse::<Rgba>().is_err());
        assert!("rgba(1, 2, 3)".parse::<Rgba>().is_err());
    }

    #[test]
    fn palette_wraps() {
        let palette = Palette::default();
        assert_eq!(palette.len(), 10);
        assert_eq!(palette.color(10), palette.color(0));
        assert_eq!(palette.color(13), DEFAULT_PALETTE[3]);
    }

    #[test]
    fn empty_palette_rejected() {
        assert!(Palette::new(Vec::new()).is_err());
    }
}
