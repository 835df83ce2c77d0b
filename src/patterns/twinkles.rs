// Twinkles Module - Stateless twinkling: every pixel's cycle is derived from a fixed
// pseudo-random sequence, so nothing needs to be stored between frames
use super::{Frame, Pattern};
use crate::gradients::{color_from_palette, Blend, Palette16};
use crate::types::Rgb;
use crate::wave::{attack_decay_wave8, sin8};

/// Roughly how many pixels out of 8 are lit at once
const DENSITY: u8 = 5;
const SEQUENCE_SEED: u16 = 11337;

#[inline]
fn next(prng: u16) -> u16 {
    prng.wrapping_mul(2053).wrapping_add(1384)
}

/// Brightness and hue for one pixel at time `ms`; `salt` makes each pixel distinct
fn one_twinkle(ms: u32, salt: u8, rate_shift: u32, palette: &Palette16) -> Rgb {
    let ticks = ms >> (8 - rate_shift);
    let fast_cycle = ticks as u8;
    let mut slow_cycle16 = ((ticks >> 8) as u16).wrapping_add(salt as u16);
    slow_cycle16 = slow_cycle16.wrapping_add(sin8(slow_cycle16 as u8) as u16);
    slow_cycle16 = next(slow_cycle16);
    let slow_cycle = (slow_cycle16 as u8).wrapping_add((slow_cycle16 >> 8) as u8);

    let bright = if (slow_cycle & 0x0E) / 2 < DENSITY { attack_decay_wave8(fast_cycle) } else { 0 };
    if bright == 0 {
        return Rgb::BLACK;
    }
    let hue = slow_cycle.wrapping_sub(salt);
    color_from_palette(palette, hue, bright, Blend::NoBlend)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Twinkles;

impl Pattern for Twinkles {
    fn render(&mut self, leds: &mut [Rgb], frame: &mut Frame<'_>) {
        // Speed 0-255 selects one of eight twinkle rates
        let rate_shift = (frame.ctx.speed >> 5) as u32;
        let mut prng = SEQUENCE_SEED;

        for led in leds.iter_mut() {
            prng = next(prng);
            let clock_offset = prng;
            prng = next(prng);
            // 0.5x to 2.375x in Q5.3
            let speed_q5_3 = ((((prng & 0xFF) >> 4) + (prng & 0x0F)) & 0x0F) as u32 + 0x08;
            let clock = ((frame.now as u64 * speed_q5_3 as u64) >> 3) as u32;
            let clock = clock.wrapping_add(clock_offset as u32);
            let salt = (prng >> 8) as u8;

            *led = one_twinkle(clock, salt, rate_shift, &frame.ctx.palette);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patterns::test_support::{render_at, rng, topology};
    use crate::renderer::RenderContext;

    #[test]
    fn same_time_same_frame() {
        let topo = topology(100);
        let ctx = RenderContext { speed: 128, ..RenderContext::default() };
        let mut rng = rng();
        let mut a = vec![Rgb::BLACK; 100];
        let mut b = vec![Rgb::WHITE; 100];
        render_at(&mut Twinkles, &mut a, &topo, &ctx, &mut rng, 123_456);
        render_at(&mut Twinkles, &mut b, &topo, &ctx, &mut rng, 123_456);
        assert_eq!(a, b);
    }

    #[test]
    fn only_some_pixels_are_lit() {
        let topo = topology(256);
        let ctx = RenderContext { speed: 128, palette: Palette16::solid(Rgb::WHITE), ..RenderContext::default() };
        let mut rng = rng();
        let mut leds = vec![Rgb::BLACK; 256];
        render_at(&mut Twinkles, &mut leds, &topo, &ctx, &mut rng, 50_000);
        let lit = leds.iter().filter(|c| !c.is_black()).count();
        assert!(lit > 0 && lit < 256, "{} pixels lit", lit);
    }

    #[test]
    fn every_cycle_starts_dark() {
        let palette = Palette16::solid(Rgb::WHITE);
        assert!((0..=255u8).all(|salt| one_twinkle(0, salt, 4, &palette).is_black()));
        assert!((0..=255u8).any(|salt| !one_twinkle(20 << 4, salt, 4, &palette).is_black()));
    }
}
