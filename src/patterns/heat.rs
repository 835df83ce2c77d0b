// Heat Module - One-dimensional heat simulation (cool, drift upward, spark) mapped through a palette
use super::{Frame, Pattern};
use crate::gradients::{palette_color, Palette16};
use crate::math8::{qadd8, qsub8, random8, random8_below, random8_between, scale8};
use crate::types::{fill_solid, Rgb};

/// Sparks are only ignited near the bottom of the strip
const SPARK_ZONE: u8 = 7;

#[derive(Debug, Clone)]
pub struct HeatMap {
    palette: Palette16,
    /// Draw from the first wired pixel upward; false mirrors the strip
    up: bool,
    heat: Vec<u8>,
}

impl HeatMap {
    pub fn new(palette: Palette16, up: bool) -> Self {
        HeatMap { palette, up, heat: Vec::new() }
    }

    fn step(&mut self, frame: &mut Frame<'_>) {
        let n = self.heat.len();
        let cooling = frame.ctx.cooling as usize;
        let sparking = frame.ctx.sparking;

        // Cool every cell a little
        let cool_limit = (cooling * 10 / n + 2).min(255) as u8;
        for cell in self.heat.iter_mut() {
            *cell = qsub8(*cell, random8_below(frame.rng, cool_limit));
        }

        // Heat drifts up and diffuses
        for k in (2..n).rev() {
            let blended = (self.heat[k - 1] as u16 + 2 * self.heat[k - 2] as u16) / 3;
            self.heat[k] = blended as u8;
        }

        if random8(frame.rng) < sparking {
            let y = (random8_below(frame.rng, SPARK_ZONE) as usize).min(n - 1);
            self.heat[y] = qadd8(self.heat[y], random8_between(frame.rng, 160, 255));
        }
    }
}

impl Pattern for HeatMap {
    fn render(&mut self, leds: &mut [Rgb], frame: &mut Frame<'_>) {
        fill_solid(leds, Rgb::BLACK);
        let n = leds.len();
        if n == 0 {
            return;
        }
        if self.heat.len() != n {
            self.heat = vec![0; n];
        }

        self.step(frame);

        for (j, &heat) in self.heat.iter().enumerate() {
            // Keep the hottest cells off the palette's wrap point
            let color = palette_color(&self.palette, scale8(heat, 190));
            let pixel = if self.up { j } else { n - 1 - j };
            leds[pixel] = color;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gradients::HEAT_COLORS;
    use crate::patterns::test_support::{render_at, rng, topology};
    use crate::renderer::RenderContext;

    #[test]
    fn no_cooling_no_sparks_stays_black() {
        let topo = topology(30);
        let ctx = RenderContext { cooling: 0, sparking: 0, ..RenderContext::default() };
        let mut rng = rng();
        let mut heat = HeatMap::new(HEAT_COLORS, true);
        let mut leds = vec![Rgb::WHITE; 30];
        for step in 0..200 {
            render_at(&mut heat, &mut leds, &topo, &ctx, &mut rng, step * 16);
            assert!(leds.iter().all(|c| c.is_black()), "lit at frame {}", step);
        }
    }

    #[test]
    fn constant_sparking_heats_the_base() {
        let topo = topology(30);
        let ctx = RenderContext { cooling: 20, sparking: 255, ..RenderContext::default() };
        let mut rng = rng();
        let mut heat = HeatMap::new(HEAT_COLORS, true);
        let mut leds = vec![Rgb::BLACK; 30];
        for step in 0..60 {
            render_at(&mut heat, &mut leds, &topo, &ctx, &mut rng, step * 16);
        }
        let base: u32 = leds[..7].iter().map(|c| c.luma_sum() as u32).sum();
        assert!(base > 0);
    }

    #[test]
    fn mirrored_strip_is_reversed() {
        let topo = topology(20);
        let ctx = RenderContext { cooling: 55, sparking: 200, ..RenderContext::default() };
        let mut up = HeatMap::new(HEAT_COLORS, true);
        let mut down = HeatMap::new(HEAT_COLORS, false);
        let mut a = vec![Rgb::BLACK; 20];
        let mut b = vec![Rgb::BLACK; 20];
        let mut rng_a = rng();
        let mut rng_b = rng();
        for step in 0..40 {
            render_at(&mut up, &mut a, &topo, &ctx, &mut rng_a, step * 16);
            render_at(&mut down, &mut b, &topo, &ctx, &mut rng_b, step * 16);
        }
        b.reverse();
        assert_eq!(a, b);
    }

    #[test]
    fn tiny_strips_do_not_panic() {
        let ctx = RenderContext { sparking: 255, ..RenderContext::default() };
        let mut rng = rng();
        for n in 1..4 {
            let topo = topology(n);
            let mut heat = HeatMap::new(HEAT_COLORS, false);
            let mut leds = vec![Rgb::BLACK; n];
            for step in 0..10 {
                render_at(&mut heat, &mut leds, &topo, &ctx, &mut rng, step);
            }
        }
    }
}
