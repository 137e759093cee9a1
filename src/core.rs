use std::fmt;
use std::str::FromStr;

use crate::error::{WavesceneError, WavesceneResult};

#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn splat(v: f32) -> Self {
        Self { x: v, y: v, z: v }
    }

    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}

/// Linear RGB color parsed from config strings (`"white"`, `"#fff"`,
/// `"#ff8800"`). Serialized back as `#rrggbb`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

const NAMED_COLORS: &[(&str, [u8; 3])] = &[
    ("black", [0x00, 0x00, 0x00]),
    ("white", [0xff, 0xff, 0xff]),
    ("red", [0xff, 0x00, 0x00]),
    ("green", [0x00, 0x80, 0x00]),
    ("blue", [0x00, 0x00, 0xff]),
    ("yellow", [0xff, 0xff, 0x00]),
    ("cyan", [0x00, 0xff, 0xff]),
    ("magenta", [0xff, 0x00, 0xff]),
    ("gray", [0x80, 0x80, 0x80]),
    ("grey", [0x80, 0x80, 0x80]),
    ("orange", [0xff, 0xa5, 0x00]),
    ("purple", [0x80, 0x00, 0x80]),
];

impl Color {
    pub const BLACK: Self = Self {
        r: 0.0,
        g: 0.0,
        b: 0.0,
    };
    pub const WHITE: Self = Self {
        r: 1.0,
        g: 1.0,
        b: 1.0,
    };

    pub fn from_rgb8(r: u8, g: u8, b: u8) -> Self {
        Self {
            r: f32::from(r) / 255.0,
            g: f32::from(g) / 255.0,
            b: f32::from(b) / 255.0,
        }
    }

    pub fn to_hex(self) -> String {
        let q = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        format!("#{:02x}{:02x}{:02x}", q(self.r), q(self.g), q(self.b))
    }
}

impl FromStr for Color {
    type Err = WavesceneError;

    fn from_str(s: &str) -> WavesceneResult<Self> {
        let s = s.trim();
        if let Some(hex) = s.strip_prefix('#') {
            let parse2 = |h: &str| {
                u8::from_str_radix(h, 16)
                    .map_err(|_| WavesceneError::validation(format!("bad color string '{s}'")))
            };
            return match hex.len() {
                3 => {
                    let mut c = [0u8; 3];
                    for (i, ch) in hex.chars().enumerate() {
                        let v = parse2(&ch.to_string())?;
                        c[i] = v << 4 | v;
                    }
                    Ok(Self::from_rgb8(c[0], c[1], c[2]))
                }
                6 => Ok(Self::from_rgb8(
                    parse2(&hex[0..2])?,
                    parse2(&hex[2..4])?,
                    parse2(&hex[4..6])?,
                )),
                _ => Err(WavesceneError::validation(format!("bad color string '{s}'"))),
            };
        }
        let lower = s.to_ascii_lowercase();
        NAMED_COLORS
            .iter()
            .find(|(name, _)| *name == lower)
            .map(|(_, [r, g, b])| Self::from_rgb8(*r, *g, *b))
            .ok_or_else(|| WavesceneError::validation(format!("unknown color name '{s}'")))
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl serde::Serialize for Color {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> serde::Deserialize<'de> for Color {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = <String as serde::Deserialize>::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_named_and_hex_colors() {
        assert_eq!(Color::from_str("white").unwrap(), Color::WHITE);
        assert_eq!(Color::from_str("#fff").unwrap(), Color::WHITE);
        assert_eq!(
            Color::from_str("#ff8800").unwrap(),
            Color::from_rgb8(0xff, 0x88, 0x00)
        );
    }

    #[test]
    fn rejects_garbage() {
        assert!(Color::from_str("#12345").is_err());
        assert!(Color::from_str("chartreuse-ish").is_err());
    }

    #[test]
    fn hex_roundtrip() {
        let c = Color::from_rgb8(1, 2, 3);
        assert_eq!(c.to_hex(), "#010203");
        assert_eq!("#010203".parse::<Color>().unwrap(), c);
    }
}
