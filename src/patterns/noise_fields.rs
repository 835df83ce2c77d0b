// Noise Fields Module - Scrolling coherent-noise patterns sampled at each pixel's position
use super::{Frame, Pattern};
use crate::gradients::{palette_color, Palette16};
use crate::math8::qsub8;
use crate::noise::inoise8;
use crate::types::Rgb;
use crate::wave::{beat88, triwave8};

/// Where a noise field takes its colors from
#[derive(Debug, Clone, Copy)]
pub enum PaletteSource {
    Fixed(Palette16),
    /// Whatever palette is currently selected
    Current,
}

impl PaletteSource {
    fn resolve<'a>(&'a self, frame: &'a Frame<'_>) -> &'a Palette16 {
        match self {
            PaletteSource::Fixed(palette) => palette,
            PaletteSource::Current => &frame.ctx.palette,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    /// Rises toward the top and cools with height
    Fire,
    /// Drifts downward with a finer horizontal grain
    Water,
}

/// Fire and water effects over the pixels' cartesian positions
#[derive(Debug, Clone)]
pub struct NoiseField {
    flow: Flow,
    palette: PaletteSource,
}

impl NoiseField {
    pub fn fire(palette: PaletteSource) -> Self {
        NoiseField { flow: Flow::Fire, palette }
    }

    pub fn water(palette: PaletteSource) -> Self {
        NoiseField { flow: Flow::Water, palette }
    }
}

impl Pattern for NoiseField {
    fn render(&mut self, leds: &mut [Rgb], frame: &mut Frame<'_>) {
        let scroll = beat88((frame.ctx.speed as u16) << 2, frame.now);
        let palette = self.palette.resolve(frame);
        let topology = frame.topology;

        for (i, led) in leds.iter_mut().enumerate() {
            let x = topology.x(i) as u16;
            let y = topology.y(i) as u16;
            let level = match self.flow {
                Flow::Fire => qsub8(inoise8((y << 2).wrapping_sub(scroll), x << 2), y as u8),
                Flow::Water => inoise8((y << 2).wrapping_add(scroll), x << 4),
            };
            *led = palette_color(palette, level);
        }
    }
}

/// The current palette painted through a drifting 2D noise field
#[derive(Debug, Clone, Copy, Default)]
pub struct PaletteNoise;

impl Pattern for PaletteNoise {
    fn render(&mut self, leds: &mut [Rgb], frame: &mut Frame<'_>) {
        let speed = frame.ctx.speed as u16;
        // Two independent sawtooths; each wraps onto the noise period so the drift is seamless
        let drift_x = beat88(speed << 2, frame.now);
        let drift_y = beat88(speed.wrapping_mul(3), frame.now);
        let topology = frame.topology;

        for (i, led) in leds.iter_mut().enumerate() {
            let x = (topology.x(i) as u16) << 3;
            let y = (topology.y(i) as u16) << 3;
            let index = inoise8(x.wrapping_add(drift_x), y.wrapping_sub(drift_y));
            *led = palette_color(&frame.ctx.palette, index);
        }
    }
}

/// Noise sampled in polar coordinates: rings flow outward from the center
#[derive(Debug, Clone, Copy, Default)]
pub struct PolarNoise;

impl Pattern for PolarNoise {
    fn render(&mut self, leds: &mut [Rgb], frame: &mut Frame<'_>) {
        let scroll = beat88((frame.ctx.speed as u16) << 2, frame.now);
        let topology = frame.topology;

        for (i, led) in leds.iter_mut().enumerate() {
            let radius = (topology.radius(i) as u16) << 3;
            // Folding the angle keeps the field continuous across the 255 -> 0 seam
            let around = (triwave8(topology.angle(i)) as u16) << 3;
            let index = inoise8(radius.wrapping_sub(scroll), around);
            *led = palette_color(&frame.ctx.palette, index);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gradients::{HEAT_COLORS, ICE_COLORS};
    use crate::patterns::test_support::{render_at, rng, topology};
    use crate::renderer::RenderContext;

    #[test]
    fn fixed_palette_ignores_selection() {
        let topo = topology(128);
        let mut rng = rng();
        let a = RenderContext::default();
        let b = RenderContext { palette: Palette16::solid(Rgb::new(0, 255, 0)), ..RenderContext::default() };

        let mut fire = NoiseField::fire(PaletteSource::Fixed(HEAT_COLORS));
        let mut first = vec![Rgb::BLACK; 128];
        let mut second = vec![Rgb::BLACK; 128];
        render_at(&mut fire, &mut first, &topo, &a, &mut rng, 4321);
        render_at(&mut fire, &mut second, &topo, &b, &mut rng, 4321);
        assert_eq!(first, second);
    }

    #[test]
    fn current_palette_follows_selection() {
        let topo = topology(64);
        let mut rng = rng();
        let green = Rgb::new(0, 255, 0);
        let ctx = RenderContext { palette: Palette16::solid(green), ..RenderContext::default() };
        let mut leds = vec![Rgb::BLACK; 64];

        let mut water = NoiseField::water(PaletteSource::Current);
        render_at(&mut water, &mut leds, &topo, &ctx, &mut rng, 777);
        assert!(leds.iter().all(|c| *c == green));

        render_at(&mut PolarNoise, &mut leds, &topo, &ctx, &mut rng, 777);
        assert!(leds.iter().all(|c| *c == green));
    }

    #[test]
    fn water_is_a_pure_function_of_time() {
        let topo = topology(96);
        let ctx = RenderContext { speed: 200, ..RenderContext::default() };
        let mut rng = rng();
        let mut a = vec![Rgb::BLACK; 96];
        let mut b = vec![Rgb::WHITE; 96];
        render_at(&mut NoiseField::water(PaletteSource::Fixed(ICE_COLORS)), &mut a, &topo, &ctx, &mut rng, 9000);
        render_at(&mut NoiseField::water(PaletteSource::Fixed(ICE_COLORS)), &mut b, &topo, &ctx, &mut rng, 9000);
        assert_eq!(a, b);
    }

    #[test]
    fn palette_noise_moves_over_time() {
        let topo = topology(128);
        let ctx = RenderContext { speed: 100, ..RenderContext::default() };
        let mut rng = rng();
        let mut early = vec![Rgb::BLACK; 128];
        let mut late = vec![Rgb::BLACK; 128];
        render_at(&mut PaletteNoise, &mut early, &topo, &ctx, &mut rng, 1000);
        render_at(&mut PaletteNoise, &mut late, &topo, &ctx, &mut rng, 6000);
        assert_ne!(early, late);
    }

    #[test]
    fn zero_speed_freezes_the_field() {
        let topo = topology(64);
        let ctx = RenderContext { speed: 0, ..RenderContext::default() };
        let mut rng = rng();
        let mut early = vec![Rgb::BLACK; 64];
        let mut late = vec![Rgb::BLACK; 64];
        render_at(&mut PolarNoise, &mut early, &topo, &ctx, &mut rng, 10);
        render_at(&mut PolarNoise, &mut late, &topo, &ctx, &mut rng, 60_000);
        assert_eq!(early, late);
    }
}
