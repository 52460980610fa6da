//! Base colors, named palettes, and the six stop orderings.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::GradientError;

/// Opaque 8-bit RGB color. Alpha is implied fully opaque.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Self = Self::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parses `#RGB` or `#RRGGBB`. Short form expands each nibble (`F` -> `FF`).
    pub fn from_hex(value: &str) -> Result<Self, GradientError> {
        let invalid = |reason: &'static str| GradientError::InvalidHexColor {
            value: value.to_owned(),
            reason,
        };

        let digits = value
            .strip_prefix('#')
            .ok_or_else(|| invalid("must start with '#'"))?;
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid("contains non-hex characters"));
        }

        match digits.len() {
            3 => {
                let nibble = |i: usize| {
                    u8::from_str_radix(&digits[i..i + 1], 16)
                        .map(|n| n * 17)
                        .map_err(|_| invalid("contains non-hex characters"))
                };
                Ok(Self::new(nibble(0)?, nibble(1)?, nibble(2)?))
            }
            6 => {
                let pair = |i: usize| {
                    u8::from_str_radix(&digits[i..i + 2], 16)
                        .map_err(|_| invalid("contains non-hex characters"))
                };
                Ok(Self::new(pair(0)?, pair(2)?, pair(4)?))
            }
            _ => Err(invalid("must be #RGB or #RRGGBB")),
        }
    }

    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    pub fn to_rgba(self) -> [u8; 4] {
        [self.r, self.g, self.b, 255]
    }
}

impl FromStr for Rgb {
    type Err = GradientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s.trim())
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for Rgb {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

/// The three caller-supplied base colors, in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Palette {
    pub colors: [Rgb; 3],
}

pub const PALETTE_NAMES: [&str; 5] = ["default", "blue", "earth", "japanese", "ocean"];

impl Palette {
    pub const fn new(c1: Rgb, c2: Rgb, c3: Rgb) -> Self {
        Self {
            colors: [c1, c2, c3],
        }
    }

    /// Red, white, gray.
    pub const DEFAULT: Self = Self::new(
        Rgb::new(0xD9, 0x10, 0x09),
        Rgb::new(0xFF, 0xFF, 0xFF),
        Rgb::new(0x4A, 0x4D, 0x4E),
    );
    pub const BLUE: Self = Self::new(
        Rgb::new(0x00, 0x1F, 0x3F),
        Rgb::new(0x7F, 0xDB, 0xFF),
        Rgb::new(0xFF, 0xFF, 0xFF),
    );
    pub const EARTH: Self = Self::new(
        Rgb::new(0x8B, 0x45, 0x13),
        Rgb::new(0xF4, 0xA4, 0x60),
        Rgb::new(0x2E, 0x8B, 0x57),
    );
    pub const JAPANESE: Self = Self::new(
        Rgb::new(0xBC, 0x00, 0x2D),
        Rgb::new(0xF3, 0xF3, 0xF2),
        Rgb::new(0x2D, 0x29, 0x26),
    );
    pub const OCEAN: Self = Self::new(
        Rgb::new(0x00, 0x96, 0xFF),
        Rgb::new(0x6C, 0xBC, 0xFC),
        Rgb::new(0xA1, 0xD6, 0xFF),
    );

    pub fn named(name: &str) -> Result<Self, GradientError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "default" => Ok(Self::DEFAULT),
            "blue" => Ok(Self::BLUE),
            "earth" => Ok(Self::EARTH),
            "japanese" => Ok(Self::JAPANESE),
            "ocean" => Ok(Self::OCEAN),
            _ => Err(GradientError::UnknownPalette {
                name: name.to_owned(),
            }),
        }
    }

    pub fn from_hex_list<S: AsRef<str>>(values: &[S]) -> Result<Self, GradientError> {
        match values {
            [a, b, c] => Ok(Self::new(
                Rgb::from_hex(a.as_ref().trim())?,
                Rgb::from_hex(b.as_ref().trim())?,
                Rgb::from_hex(c.as_ref().trim())?,
            )),
            _ => Err(GradientError::InvalidHexColor {
                value: values
                    .iter()
                    .map(|v| v.as_ref())
                    .collect::<Vec<_>>()
                    .join(","),
                reason: "a palette needs exactly three colors",
            }),
        }
    }

    /// A named preset or an explicit `[c1, c2, c3]` hex list; the default
    /// palette when neither is given.
    pub fn resolve<S: AsRef<str>>(
        name: Option<&str>,
        colors: Option<&[S]>,
    ) -> Result<Self, GradientError> {
        match (name, colors) {
            (Some(_), Some(_)) => Err(GradientError::PaletteConflict),
            (Some(name), None) => Self::named(name),
            (None, Some(colors)) => Self::from_hex_list(colors),
            (None, None) => Ok(Self::DEFAULT),
        }
    }

    /// Resolves the (first, middle, last) interpolation stops for an ordering.
    pub fn stops(&self, order: ColorOrder) -> ColorStops {
        let [c1, c2, c3] = self.colors;
        let (first, middle, last) = match order.index() {
            0 => (c1, c2, c3),
            1 => (c1, c3, c2),
            2 => (c2, c1, c3),
            3 => (c2, c3, c1),
            4 => (c3, c1, c2),
            _ => (c3, c2, c1),
        };
        ColorStops {
            first,
            middle,
            last,
        }
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// One of the 3! orderings of a palette, always in `0..6`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ColorOrder(u8);

impl ColorOrder {
    pub const COUNT: u8 = 6;

    pub fn from_byte(byte: u8) -> Self {
        Self(byte % Self::COUNT)
    }

    pub fn index(self) -> u8 {
        self.0
    }

    pub fn all() -> impl Iterator<Item = Self> {
        (0..Self::COUNT).map(Self)
    }
}

/// Palette colors after the ordering has been applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorStops {
    pub first: Rgb,
    pub middle: Rgb,
    pub last: Rgb,
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn parses_long_and_short_hex() {
        assert_eq!(Rgb::from_hex("#4A4D4E").unwrap(), Rgb::new(0x4A, 0x4D, 0x4E));
        assert_eq!(Rgb::from_hex("#ff0000").unwrap(), Rgb::new(255, 0, 0));
        assert_eq!(Rgb::from_hex("#F0a").unwrap(), Rgb::new(255, 0, 170));
    }

    #[test]
    fn rejects_malformed_hex() {
        for bad in ["FF0000", "#FF00", "#GG0000", "#", "#FF00000", "#ÿÿ0"] {
            assert!(
                matches!(Rgb::from_hex(bad), Err(GradientError::InvalidHexColor { .. })),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn named_palettes_resolve_case_insensitively() {
        assert_eq!(Palette::named("Ocean").unwrap(), Palette::OCEAN);
        for name in PALETTE_NAMES {
            assert!(Palette::named(name).is_ok(), "{name} should resolve");
        }
        assert!(matches!(
            Palette::named("neon"),
            Err(GradientError::UnknownPalette { .. })
        ));
    }

    #[test]
    fn hex_list_requires_three_colors() {
        let palette = Palette::from_hex_list(&["#FF0000", "#FFFFFF", "#4A4D4E"]).unwrap();
        assert_eq!(palette.colors[0], Rgb::new(255, 0, 0));
        assert!(Palette::from_hex_list(&["#FF0000", "#FFFFFF"]).is_err());
    }

    #[test]
    fn resolve_prefers_explicit_source() {
        let colors = ["#000", "#888", "#FFF"];
        assert_eq!(Palette::resolve::<&str>(None, None).unwrap(), Palette::DEFAULT);
        assert_eq!(Palette::resolve::<&str>(Some("earth"), None).unwrap(), Palette::EARTH);
        assert_eq!(
            Palette::resolve(None, Some(&colors[..])).unwrap().colors[1],
            Rgb::new(0x88, 0x88, 0x88)
        );
        assert_eq!(
            Palette::resolve(Some("earth"), Some(&colors[..])),
            Err(GradientError::PaletteConflict)
        );
    }

    #[test]
    fn every_order_is_a_distinct_permutation() {
        let palette = Palette::new(Rgb::new(1, 0, 0), Rgb::new(2, 0, 0), Rgb::new(3, 0, 0));
        let input: HashSet<Rgb> = palette.colors.into_iter().collect();
        let mut seen = HashSet::new();

        for order in ColorOrder::all() {
            let stops = palette.stops(order);
            let used: HashSet<Rgb> = [stops.first, stops.middle, stops.last].into_iter().collect();
            assert_eq!(used, input, "order {} must use every color once", order.index());
            assert!(
                seen.insert((stops.first, stops.middle, stops.last)),
                "order {} repeats an earlier ordering",
                order.index()
            );
        }
        assert_eq!(seen.len(), 6);
    }

    #[test]
    fn order_table_matches_documented_mapping() {
        let (a, b, c) = (Rgb::new(1, 0, 0), Rgb::new(2, 0, 0), Rgb::new(3, 0, 0));
        let palette = Palette::new(a, b, c);
        let expected = [
            (a, b, c),
            (a, c, b),
            (b, a, c),
            (b, c, a),
            (c, a, b),
            (c, b, a),
        ];
        for (order, want) in ColorOrder::all().zip(expected) {
            let stops = palette.stops(order);
            assert_eq!((stops.first, stops.middle, stops.last), want);
        }
    }

    #[test]
    fn color_order_reduces_mod_six() {
        assert_eq!(ColorOrder::from_byte(0x1F).index(), 1);
        assert_eq!(ColorOrder::from_byte(255).index(), 3);
        assert_eq!(ColorOrder::from_byte(6).index(), 0);
    }
}
