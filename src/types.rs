// Shared types module - Colors and the in-place buffer operations every pattern uses

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::ops::{AddAssign, BitOrAssign};

use crate::math8::{blend8, qadd8, qsub8, scale8};

// RGB color representation
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Rgb { r, g, b }
    }

    /// Build from a packed 0xRRGGBB value
    pub const fn from_u32(hex: u32) -> Self {
        Rgb {
            r: ((hex >> 16) & 0xFF) as u8,
            g: ((hex >> 8) & 0xFF) as u8,
            b: (hex & 0xFF) as u8,
        }
    }

    pub fn from_hex(hex: &str) -> Result<Self> {
        let hex = hex.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            anyhow::bail!("Invalid hex color: {}", hex);
        }
        Ok(Rgb {
            r: u8::from_str_radix(&hex[0..2], 16)?,
            g: u8::from_str_radix(&hex[2..4], 16)?,
            b: u8::from_str_radix(&hex[4..6], 16)?,
        })
    }

    pub fn to_hex(self) -> String {
        format!("{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    pub fn is_black(self) -> bool {
        self.r == 0 && self.g == 0 && self.b == 0
    }

    pub fn add_sat(self, other: Rgb) -> Rgb {
        Rgb::new(qadd8(self.r, other.r), qadd8(self.g, other.g), qadd8(self.b, other.b))
    }

    pub fn sub_sat(self, other: Rgb) -> Rgb {
        Rgb::new(qsub8(self.r, other.r), qsub8(self.g, other.g), qsub8(self.b, other.b))
    }

    /// Scale every channel by `scale/255`
    pub fn scaled(self, scale: u8) -> Rgb {
        Rgb::new(scale8(self.r, scale), scale8(self.g, scale), scale8(self.b, scale))
    }

    /// Per-channel linear interpolation toward `target` by `amount/255`
    pub fn lerp_toward(self, target: Rgb, amount: u8) -> Rgb {
        Rgb::new(
            blend8(self.r, target.r, amount),
            blend8(self.g, target.g, amount),
            blend8(self.b, target.b, amount),
        )
    }

    /// Sum of channels, handy for quick brightness comparisons
    pub fn luma_sum(self) -> u16 {
        self.r as u16 + self.g as u16 + self.b as u16
    }
}

// `leds[i] += color` saturates like the hardware expects
impl AddAssign for Rgb {
    fn add_assign(&mut self, rhs: Rgb) {
        *self = self.add_sat(rhs);
    }
}

// `leds[i] |= color` keeps the brighter value per channel
impl BitOrAssign for Rgb {
    fn bitor_assign(&mut self, rhs: Rgb) {
        self.r = self.r.max(rhs.r);
        self.g = self.g.max(rhs.g);
        self.b = self.b.max(rhs.b);
    }
}

impl From<(u8, u8, u8)> for Rgb {
    fn from((r, g, b): (u8, u8, u8)) -> Self {
        Rgb::new(r, g, b)
    }
}

// Hue/saturation/value color, all channels 8-bit (hue 0-255 covers the full wheel)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Hsv {
    pub hue: u8,
    pub sat: u8,
    pub val: u8,
}

impl Hsv {
    pub const fn new(hue: u8, sat: u8, val: u8) -> Self {
        Hsv { hue, sat, val }
    }

    /// Convert to RGB using six 43-step hue sectors
    pub fn to_rgb(self) -> Rgb {
        if self.sat == 0 {
            return Rgb::new(self.val, self.val, self.val);
        }

        let sector = self.hue / 43;
        let remainder = (self.hue - sector * 43) as u16 * 6;

        let v = self.val as u16;
        let s = self.sat as u16;
        let p = ((v * (255 - s)) >> 8) as u8;
        let q = ((v * (255 - ((s * remainder) >> 8))) >> 8) as u8;
        let t = ((v * (255 - ((s * (255 - remainder)) >> 8))) >> 8) as u8;
        let v = self.val;

        match sector {
            0 => Rgb::new(v, t, p),
            1 => Rgb::new(q, v, p),
            2 => Rgb::new(p, v, t),
            3 => Rgb::new(p, q, v),
            4 => Rgb::new(t, p, v),
            _ => Rgb::new(v, p, q),
        }
    }
}

impl From<Hsv> for Rgb {
    fn from(hsv: Hsv) -> Self {
        hsv.to_rgb()
    }
}

/// Blend `existing` toward `overlay` in place by `amount/255`
pub fn nblend(existing: &mut Rgb, overlay: Rgb, amount: u8) {
    match amount {
        0 => {}
        255 => *existing = overlay,
        _ => *existing = existing.lerp_toward(overlay, amount),
    }
}

/// Decay every pixel toward black by `amount/255`
pub fn fade_to_black_by(leds: &mut [Rgb], amount: u8) {
    let keep = 255 - amount;
    for led in leds.iter_mut() {
        *led = led.scaled(keep);
    }
}

pub fn fill_solid(leds: &mut [Rgb], color: Rgb) {
    leds.fill(color);
}

/// Fill with a hue ramp starting at `initial_hue`, stepping by `delta_hue` per pixel
pub fn fill_rainbow(leds: &mut [Rgb], initial_hue: u8, delta_hue: u8) {
    let mut hue = initial_hue;
    for led in leds.iter_mut() {
        *led = Hsv::new(hue, 240, 255).to_rgb();
        hue = hue.wrapping_add(delta_hue);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn hex_round_trip_and_rejects_garbage() {
        let c = Rgb::from_hex("#FF8000").unwrap();
        assert_eq!(c, Rgb::new(255, 128, 0));
        assert_eq!(c.to_hex(), "FF8000");
        assert!(Rgb::from_hex("FF80").is_err());
        assert!(Rgb::from_hex("GG0000").is_err());
    }

    #[test]
    fn add_assign_saturates() {
        let mut c = Rgb::new(200, 10, 255);
        c += Rgb::new(100, 10, 1);
        assert_eq!(c, Rgb::new(255, 20, 255));
    }

    #[test]
    fn bitor_keeps_brightest_channel() {
        let mut c = Rgb::new(10, 200, 30);
        c |= Rgb::new(50, 100, 30);
        assert_eq!(c, Rgb::new(50, 200, 30));
    }

    #[test]
    fn fade_by_full_amount_is_black() {
        let mut leds = vec![Rgb::WHITE, Rgb::new(12, 34, 56), Rgb::new(255, 0, 128)];
        fade_to_black_by(&mut leds, 255);
        assert!(leds.iter().all(|c| c.is_black()));
    }

    #[test]
    fn fade_by_zero_keeps_buffer() {
        let original = vec![Rgb::WHITE, Rgb::new(12, 34, 56)];
        let mut leds = original.clone();
        fade_to_black_by(&mut leds, 0);
        assert_eq!(leds, original);
    }

    #[test]
    fn hsv_primaries() {
        assert_eq!(Hsv::new(0, 255, 255).to_rgb().r, 255);
        assert_eq!(Hsv::new(0, 0, 77).to_rgb(), Rgb::new(77, 77, 77));
        assert_eq!(Hsv::new(100, 255, 0).to_rgb(), Rgb::BLACK);
    }

    proptest! {
        #[test]
        fn saturating_channels_stay_in_range(a in any::<u32>(), b in any::<u32>()) {
            let (a, b) = (Rgb::from_u32(a & 0xFF_FFFF), Rgb::from_u32(b & 0xFF_FFFF));
            let sum = a.add_sat(b);
            let diff = a.sub_sat(b);
            for (s, d, x, y) in [(sum.r, diff.r, a.r, b.r), (sum.g, diff.g, a.g, b.g), (sum.b, diff.b, a.b, b.b)] {
                prop_assert!(s >= x.max(y));
                prop_assert!(d <= x);
                prop_assert_eq!(d, x.saturating_sub(y));
            }
        }

        #[test]
        fn nblend_endpoints(r in any::<u8>(), g in any::<u8>(), b in any::<u8>(),
                            tr in any::<u8>(), tg in any::<u8>(), tb in any::<u8>()) {
            let start = Rgb::new(r, g, b);
            let target = Rgb::new(tr, tg, tb);

            let mut c = start;
            nblend(&mut c, target, 0);
            prop_assert_eq!(c, start);

            nblend(&mut c, target, 255);
            prop_assert_eq!(c, target);

            prop_assert_eq!(start.lerp_toward(target, 0), start);
            prop_assert_eq!(start.lerp_toward(target, 255), target);
        }
    }
}
