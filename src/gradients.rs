// Gradients Module - 16-stop palettes, palette lookup and the built-in palette set
use anyhow::Result;
use colorgrad::Color;
use std::collections::BTreeMap;

use crate::math8::{blend8, map8, qadd8, scale8};
use crate::types::Rgb;

/// How `color_from_palette` treats the space between stops
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Blend {
    /// Interpolate between stops; stop 15 blends back into stop 0
    #[default]
    Linear,
    /// Interpolate, but squeeze the index so 255 lands on the last stop
    LinearNoWrap,
    /// Nearest stop, no interpolation
    NoBlend,
}

/// A cyclic gradient described by 16 evenly spaced color stops
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette16 {
    pub stops: [Rgb; 16],
}

impl Palette16 {
    pub const fn from_codes(codes: [u32; 16]) -> Self {
        let mut stops = [Rgb::BLACK; 16];
        let mut i = 0;
        while i < 16 {
            stops[i] = Rgb::from_u32(codes[i]);
            i += 1;
        }
        Palette16 { stops }
    }

    pub fn solid(color: Rgb) -> Self {
        Palette16 { stops: [color; 16] }
    }

    /// Straight ramp from `start` (stop 0) to `end` (stop 15)
    pub fn gradient(start: Rgb, end: Rgb) -> Self {
        let mut stops = [Rgb::BLACK; 16];
        for (k, stop) in stops.iter_mut().enumerate() {
            let t = (k * 17) as u8;
            *stop = Rgb::new(
                blend8(start.r, end.r, t),
                blend8(start.g, end.g, t),
                blend8(start.b, end.b, t),
            );
        }
        Palette16 { stops }
    }

    /// Build from gradient anchors `(position 0-255, color)`, positions ascending.
    pub fn from_anchors(anchors: &[(u8, Rgb)]) -> Result<Self> {
        if anchors.len() < 2 {
            anyhow::bail!("A gradient needs at least two anchors, got {}", anchors.len());
        }
        if anchors.windows(2).any(|w| w[0].0 >= w[1].0) {
            anyhow::bail!("Gradient anchor positions must be strictly ascending");
        }

        let colors: Vec<Color> = anchors
            .iter()
            .map(|(_, c)| Color::from_rgba8(c.r, c.g, c.b, 255))
            .collect();
        let domain: Vec<f64> = anchors.iter().map(|(pos, _)| *pos as f64 / 255.0).collect();

        let gradient = colorgrad::CustomGradient::new()
            .colors(&colors)
            .domain(&domain)
            .interpolation(colorgrad::Interpolation::Linear)
            .build()?;

        Ok(Self::sample(&gradient, domain[0], domain[domain.len() - 1]))
    }

    /// Build from a comma-separated list of hex colors spread evenly over the palette
    pub fn from_hex_list(color_str: &str) -> Result<Self> {
        let mut colors = Vec::new();
        for hex in color_str.split(',').map(|s| s.trim()).filter(|s| !s.is_empty()) {
            colors.push(Rgb::from_hex(hex)?);
        }

        match colors.len() {
            0 => anyhow::bail!("Palette '{}' contains no colors", color_str),
            1 => Ok(Self::solid(colors[0])),
            n => {
                let anchors: Vec<(u8, Rgb)> = colors
                    .iter()
                    .enumerate()
                    .map(|(i, c)| (((i * 255) / (n - 1)) as u8, *c))
                    .collect();
                Self::from_anchors(&anchors)
            }
        }
    }

    fn sample(gradient: &colorgrad::Gradient, start: f64, end: f64) -> Self {
        let mut stops = [Rgb::BLACK; 16];
        for (i, stop) in stops.iter_mut().enumerate() {
            let t = start + (end - start) * i as f64 / 15.0;
            let rgba = gradient.at(t).to_rgba8();
            *stop = Rgb::new(rgba[0], rgba[1], rgba[2]);
        }
        Palette16 { stops }
    }
}

/// Look up `index` in `palette`, interpolating between the bracketing stops,
/// then scale by `brightness/255`.
pub fn color_from_palette(palette: &Palette16, index: u8, brightness: u8, blend: Blend) -> Rgb {
    let index = match blend {
        Blend::LinearNoWrap => map8(index, 0, 239),
        _ => index,
    };

    let hi4 = (index >> 4) as usize;
    let lo4 = index & 0x0F;
    let entry = palette.stops[hi4];

    let color = if lo4 != 0 && blend != Blend::NoBlend {
        let next = palette.stops[(hi4 + 1) & 0x0F];
        let f2 = lo4 << 4;
        let f1 = 255 - f2;
        Rgb::new(
            qadd8(scale8(entry.r, f1), scale8(next.r, f2)),
            qadd8(scale8(entry.g, f1), scale8(next.g, f2)),
            qadd8(scale8(entry.b, f1), scale8(next.b, f2)),
        )
    } else {
        entry
    };

    if brightness == 255 {
        color
    } else {
        color.scaled(brightness)
    }
}

/// Full-brightness linear lookup, the common case
#[inline]
pub fn palette_color(palette: &Palette16, index: u8) -> Rgb {
    color_from_palette(palette, index, 255, Blend::Linear)
}

pub const RAINBOW_COLORS: Palette16 = Palette16::from_codes([
    0xFF0000, 0xD52A00, 0xAB5500, 0xAB7F00, 0xABAB00, 0x56D500, 0x00FF00, 0x00D52A,
    0x00AB55, 0x0056AA, 0x0000FF, 0x2A00D5, 0x5500AB, 0x7F0081, 0xAB0055, 0xD5002B,
]);

pub const RAINBOW_STRIPE_COLORS: Palette16 = Palette16::from_codes([
    0xFF0000, 0x000000, 0xAB5500, 0x000000, 0xABAB00, 0x000000, 0x00FF00, 0x000000,
    0x00AB55, 0x000000, 0x0000FF, 0x000000, 0x5500AB, 0x000000, 0xAB0055, 0x000000,
]);

pub const CLOUD_COLORS: Palette16 = Palette16::from_codes([
    0x0000FF, 0x00008B, 0x00008B, 0x00008B, 0x00008B, 0x00008B, 0x00008B, 0x00008B,
    0x0000FF, 0x00008B, 0x87CEEB, 0x87CEEB, 0xADD8E6, 0xFFFFFF, 0xADD8E6, 0x87CEEB,
]);

pub const LAVA_COLORS: Palette16 = Palette16::from_codes([
    0x000000, 0x800000, 0x000000, 0x800000, 0x8B0000, 0x8B0000, 0x800000, 0x8B0000,
    0x8B0000, 0x8B0000, 0xFF0000, 0xFFA500, 0xFFFFFF, 0xFFA500, 0xFF0000, 0x8B0000,
]);

pub const OCEAN_COLORS: Palette16 = Palette16::from_codes([
    0x191970, 0x00008B, 0x191970, 0x000080, 0x00008B, 0x0000CD, 0x2E8B57, 0x008080,
    0x5F9EA0, 0x0000FF, 0x008B8B, 0x6495ED, 0x7FFFD4, 0x2E8B57, 0x00FFFF, 0x87CEFA,
]);

pub const FOREST_COLORS: Palette16 = Palette16::from_codes([
    0x006400, 0x006400, 0x556B2F, 0x006400, 0x008000, 0x228B22, 0x6B8E23, 0x008000,
    0x2E8B57, 0x66CDAA, 0x32CD32, 0x9ACD32, 0x90EE90, 0x7CFC00, 0x66CDAA, 0x228B22,
]);

pub const PARTY_COLORS: Palette16 = Palette16::from_codes([
    0x5500AB, 0x84007C, 0xB5004B, 0xE5001B, 0xE81700, 0xB84700, 0xAB7700, 0xABAB00,
    0xAB5500, 0xDD2200, 0xF2000E, 0xC2003E, 0x8F0071, 0x5F00A1, 0x2F00D0, 0x0007F9,
]);

// Black through red and yellow to white
pub const HEAT_COLORS: Palette16 = Palette16::from_codes([
    0x000000, 0x330000, 0x660000, 0x990000, 0xCC0000, 0xFF0000, 0xFF3300, 0xFF6600,
    0xFF9900, 0xFFCC00, 0xFFFF00, 0xFFFF33, 0xFFFF66, 0xFFFF99, 0xFFFFCC, 0xFFFFFF,
]);

// Black through blue and cyan to white
pub const ICE_COLORS: Palette16 = Palette16::from_codes([
    0x000000, 0x000033, 0x000066, 0x000099, 0x0000CC, 0x0000FF, 0x0033FF, 0x0066FF,
    0x0099FF, 0x00CCFF, 0x00FFFF, 0x33FFFF, 0x66FFFF, 0x99FFFF, 0xCCFFFF, 0xFFFFFF,
]);

/// Name of the palette the swirl pattern always draws with
pub const SWIRL_PALETTE_NAME: &str = "Rivendell";

fn anchor_palettes() -> Vec<(&'static str, Vec<(u8, Rgb)>)> {
    vec![
        (
            "Rivendell",
            vec![
                (0, Rgb::new(1, 14, 5)),
                (101, Rgb::new(16, 36, 14)),
                (165, Rgb::new(56, 68, 30)),
                (242, Rgb::new(150, 156, 99)),
                (255, Rgb::new(150, 156, 99)),
            ],
        ),
        (
            "Sunset",
            vec![
                (0, Rgb::new(128, 0, 128)),
                (84, Rgb::new(255, 0, 0)),
                (168, Rgb::new(255, 165, 0)),
                (255, Rgb::new(255, 255, 192)),
            ],
        ),
        (
            "Purple Haze",
            vec![
                (0, Rgb::new(75, 0, 130)),
                (84, Rgb::new(180, 0, 216)),
                (168, Rgb::new(255, 105, 240)),
                (255, Rgb::new(255, 255, 255)),
            ],
        ),
        (
            "Neon",
            vec![
                (0, Rgb::new(255, 20, 147)),
                (84, Rgb::new(128, 0, 255)),
                (168, Rgb::new(0, 0, 255)),
                (255, Rgb::new(0, 255, 255)),
            ],
        ),
        (
            "Viridis",
            vec![
                (0, Rgb::new(68, 1, 84)),
                (64, Rgb::new(44, 56, 116)),
                (128, Rgb::new(33, 123, 111)),
                (191, Rgb::new(122, 193, 50)),
                (255, Rgb::new(253, 229, 32)),
            ],
        ),
    ]
}

/// Ordered, name-addressable collection of palettes the control layer selects from
#[derive(Debug, Clone)]
pub struct PaletteSet {
    entries: Vec<(String, Palette16)>,
}

impl PaletteSet {
    /// The built-in palettes, in selection order
    pub fn builtin() -> Result<Self> {
        let mut entries: Vec<(String, Palette16)> = vec![
            ("Rainbow".to_string(), RAINBOW_COLORS),
            ("Rainbow Stripe".to_string(), RAINBOW_STRIPE_COLORS),
            ("Cloud".to_string(), CLOUD_COLORS),
            ("Lava".to_string(), LAVA_COLORS),
            ("Ocean".to_string(), OCEAN_COLORS),
            ("Forest".to_string(), FOREST_COLORS),
            ("Party".to_string(), PARTY_COLORS),
            ("Heat".to_string(), HEAT_COLORS),
            ("Ice".to_string(), ICE_COLORS),
        ];

        for (name, anchors) in anchor_palettes() {
            entries.push((name.to_string(), Palette16::from_anchors(&anchors)?));
        }

        Ok(PaletteSet { entries })
    }

    /// Built-ins followed by user palettes (`name -> "RRGGBB,RRGGBB,..."`).
    /// A user palette whose name matches a built-in replaces it in place.
    pub fn with_custom(custom: &BTreeMap<String, String>) -> Result<Self> {
        let mut set = Self::builtin()?;
        for (name, colors) in custom {
            let palette = Palette16::from_hex_list(colors)
                .map_err(|e| anyhow::anyhow!("Custom palette '{}': {}", name, e))?;
            match set.position(name) {
                Some(i) => set.entries[i].1 = palette,
                None => set.entries.push((name.clone(), palette)),
            }
        }
        Ok(set)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Palette16> {
        self.entries.get(index).map(|(_, p)| p)
    }

    /// Case-insensitive lookup of a palette's index
    pub fn position(&self, name: &str) -> Option<usize> {
        let name = name.trim();
        self.entries.iter().position(|(n, _)| n.eq_ignore_ascii_case(name))
    }

    pub fn find(&self, name: &str) -> Option<&Palette16> {
        self.position(name).and_then(|i| self.get(i))
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|(n, _)| n.as_str()).collect()
    }
}
