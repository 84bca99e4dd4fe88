use std::{fmt, str::FromStr};

use anyhow::{bail, Context, Error, Result};
use serde::{Deserialize, Serialize};

/// An opaque 8-bit sRGB color. Serialized as a `#rrggbb` string.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl FromStr for Rgb {
    type Err = Error;

    /// Accepts `#rrggbb`, `rrggbb` and the short `#rgb` form.
    fn from_str(s: &str) -> Result<Self> {
        let hex = s.trim();
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if !hex.bytes().all(|x| x.is_ascii_hexdigit()) {
            bail!("Invalid color `{s}`, expected hex digits");
        }

        let channel = |range: &str| {
            u8::from_str_radix(range, 16).with_context(|| format!("Invalid color `{s}`"))
        };

        Ok(match hex.len() {
            6 => {
                Self::new(channel(&hex[0..2])?, channel(&hex[2..4])?, channel(&hex[4..6])?)
            }
            3 => {
                let short = |idx: usize| channel(&hex[idx..idx + 1]).map(|v| v * 0x11);
                Self::new(short(0)?, short(1)?, short(2)?)
            }
            _ => bail!("Invalid color `{s}`, expected #rrggbb"),
        })
    }
}

impl TryFrom<String> for Rgb {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Rgb> for String {
    fn from(value: Rgb) -> Self {
        value.to_hex()
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}
