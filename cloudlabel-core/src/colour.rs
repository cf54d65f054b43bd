//! Colours for rendered points: fixed, by partition id, from record fields or by scalar

use bytemuck::{Pod, Zeroable};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::point::Point3d;
use crate::{Error, Result};

/// An 8-bit RGBA colour, laid out for direct vertex upload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(C)]
pub struct Colour {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

unsafe impl Pod for Colour {}
unsafe impl Zeroable for Colour {}

impl Colour {
    pub const WHITE: Colour = Colour::rgb(255, 255, 255);
    pub const BLACK: Colour = Colour::rgb(0, 0, 0);
    pub const RED: Colour = Colour::rgb(255, 0, 0);
    pub const GREEN: Colour = Colour::rgb(0, 255, 0);
    pub const BLUE: Colour = Colour::rgb(0, 0, 255);
    pub const YELLOW: Colour = Colour::rgb(255, 255, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Parse a colour name (`red`, `green`, ...) or a `#rrggbb` / `#rrggbbaa` hex string
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        match s.to_lowercase().as_str() {
            "white" => return Ok(Self::WHITE),
            "black" => return Ok(Self::BLACK),
            "red" => return Ok(Self::RED),
            "green" => return Ok(Self::GREEN),
            "blue" => return Ok(Self::BLUE),
            "yellow" => return Ok(Self::YELLOW),
            _ => {}
        }
        let hex = s
            .strip_prefix('#')
            .ok_or_else(|| Error::InvalidData(format!("unknown colour \"{}\"", s)))?;
        if hex.len() != 6 && hex.len() != 8 {
            return Err(Error::InvalidData(format!("expected #rrggbb or #rrggbbaa, got \"{}\"", s)));
        }
        let byte = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16)
                .map_err(|_| Error::InvalidData(format!("invalid hex colour \"{}\"", s)))
        };
        let a = if hex.len() == 8 { byte(6)? } else { 255 };
        Ok(Self::rgba(byte(0)?, byte(2)?, byte(4)?, a))
    }
}

impl Default for Colour {
    fn default() -> Self {
        Self::WHITE
    }
}

/// Maps partition ids to visually distinct colours
///
/// Ids are folded to one byte and looked up in a shuffled table, so the mapping is
/// stable until [`IdPalette::shake`] reshuffles it.
#[derive(Debug, Clone)]
pub struct IdPalette {
    indices: [u8; 256],
    shakes: u8,
    rng: StdRng,
}

impl IdPalette {
    pub fn new() -> Self {
        Self::with_seed(0x5eed)
    }

    pub fn with_seed(seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut indices = [0u8; 256];
        for (i, v) in indices.iter_mut().enumerate() {
            *v = i as u8;
        }
        indices.shuffle(&mut rng);
        Self { indices, shakes: 0, rng }
    }

    /// Reshuffle the table; every id gets a new colour
    pub fn shake(&mut self) {
        self.indices.shuffle(&mut self.rng);
        self.shakes = self.shakes.wrapping_add(1);
    }

    pub fn colour(&self, id: u32) -> Colour {
        let folded = (id ^ (id >> 8) ^ (id >> 16) ^ (id >> 24)) as u8;
        let shuffled = self.indices[folded as usize];
        let bright = 243u8;
        let hue = shuffled;
        let dim = (0.3 * f32::from(255 - shuffled)) as u8;
        let rotation = (usize::from(folded) * 13 + usize::from(self.shakes)) % 6;
        match rotation {
            0 => Colour::rgb(bright, hue, dim),
            1 => Colour::rgb(dim, bright, hue),
            2 => Colour::rgb(hue, dim, bright),
            3 => Colour::rgb(bright, dim, hue),
            4 => Colour::rgb(hue, bright, dim),
            _ => Colour::rgb(dim, hue, bright),
        }
    }
}

impl Default for IdPalette {
    fn default() -> Self {
        Self::new()
    }
}

/// How a streamed point gets its colour
#[derive(Debug, Clone)]
pub enum ColourMode {
    Fixed(Colour),
    ById(IdPalette),
    /// Use the colour carried by the record, `fallback` when it has none
    FromRecord { fallback: Colour },
    /// Linear ramp over the record's scalar field, clamped to `[min, max]`
    Scalar { from: Colour, to: Colour, min: f64, max: f64 },
}

impl ColourMode {
    pub fn colour(&self, _point: &Point3d, id: u32, scalar: f64, colour: Option<Colour>) -> Colour {
        match self {
            ColourMode::Fixed(c) => *c,
            ColourMode::ById(palette) => palette.colour(id),
            ColourMode::FromRecord { fallback } => colour.unwrap_or(*fallback),
            ColourMode::Scalar { from, to, min, max } => {
                let range = max - min;
                let t = if range > 0.0 { ((scalar - min) / range).clamp(0.0, 1.0) } else { 0.0 };
                let lerp = |a: u8, b: u8| (f64::from(a) + (f64::from(b) - f64::from(a)) * t).round() as u8;
                Colour::rgba(lerp(from.r, to.r), lerp(from.g, to.g), lerp(from.b, to.b), lerp(from.a, to.a))
            }
        }
    }
}

impl Default for ColourMode {
    fn default() -> Self {
        ColourMode::Fixed(Colour::WHITE)
    }
}
