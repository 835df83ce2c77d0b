// Classic Module - Simple strip patterns laid out along the wiring order
use super::{Frame, Pattern};
use crate::gradients::{color_from_palette, palette_color, Blend};
use crate::math8::{random8, random_index};
use crate::types::{fade_to_black_by, fill_rainbow, fill_solid, Rgb};
use crate::wave::{beatsin16, beatsin8};

const GLITTER_CHANCE: u8 = 80;

/// Hue ramp that scrolls with the global hue; optional white glitter on top
#[derive(Debug, Clone, Copy, Default)]
pub struct Rainbow {
    glitter: bool,
}

impl Rainbow {
    pub fn new(glitter: bool) -> Self {
        Rainbow { glitter }
    }
}

impl Pattern for Rainbow {
    fn render(&mut self, leds: &mut [Rgb], frame: &mut Frame<'_>) {
        fill_rainbow(leds, frame.ctx.hue, frame.ctx.speed);
        if self.glitter && !leds.is_empty() && random8(frame.rng) < GLITTER_CHANCE {
            let i = random_index(frame.rng, leds.len());
            leds[i] += Rgb::WHITE;
        }
    }
}

/// Random colored speckles that blink in and fade smoothly
#[derive(Debug, Clone, Copy, Default)]
pub struct Confetti;

impl Pattern for Confetti {
    fn render(&mut self, leds: &mut [Rgb], frame: &mut Frame<'_>) {
        fade_to_black_by(leds, 10);
        if leds.is_empty() {
            return;
        }
        let i = random_index(frame.rng, leds.len());
        leds[i] += palette_color(&frame.ctx.palette, frame.ctx.hue);
    }
}

/// A colored dot sweeping back and forth with fading trails
#[derive(Debug, Clone, Copy, Default)]
pub struct Sinelon {
    previous: usize,
}

impl Pattern for Sinelon {
    fn render(&mut self, leds: &mut [Rgb], frame: &mut Frame<'_>) {
        fade_to_black_by(leds, 20);
        let n = leds.len();
        if n == 0 {
            return;
        }
        let last = (n - 1).min(u16::MAX as usize) as u16;
        let pos = beatsin16(frame.ctx.speed as u16, 0, last, frame.now) as usize;
        let previous = self.previous.min(n - 1);
        let color = palette_color(&frame.ctx.palette, frame.ctx.hue);

        // Fill the gap so fast sweeps leave a continuous trail
        let (lo, hi) = if pos < previous { (pos, previous) } else { (previous, pos) };
        leds[lo..=hi].fill(color);
        self.previous = pos;
    }
}

/// Colored stripes pulsing at the speed's beats per minute
#[derive(Debug, Clone, Copy, Default)]
pub struct Bpm;

impl Pattern for Bpm {
    fn render(&mut self, leds: &mut [Rgb], frame: &mut Frame<'_>) {
        let hue = frame.ctx.hue;
        let beat = beatsin8(frame.ctx.speed as u16, 64, 255, frame.now);
        for (i, led) in leds.iter_mut().enumerate() {
            let i = i as u8;
            let index = hue.wrapping_add(i.wrapping_mul(2));
            let brightness = beat.wrapping_sub(hue).wrapping_add(i.wrapping_mul(10));
            *led = color_from_palette(&frame.ctx.palette, index, brightness, Blend::Linear);
        }
    }
}

/// Three dots weaving in and out of sync
#[derive(Debug, Clone, Copy, Default)]
pub struct Juggle;

impl Pattern for Juggle {
    fn render(&mut self, leds: &mut [Rgb], frame: &mut Frame<'_>) {
        fade_to_black_by(leds, 20);
        let n = leds.len();
        if n == 0 {
            return;
        }
        let last = (n - 1).min(u16::MAX as usize) as u16;
        let mut dot_hue: u8 = 0;
        for i in 0..3u16 {
            let pos = beatsin16(i + frame.ctx.speed as u16, 0, last, frame.now) as usize;
            leds[pos] |= palette_color(&frame.ctx.palette, dot_hue);
            dot_hue = dot_hue.wrapping_add(80);
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SolidColor;

impl Pattern for SolidColor {
    fn render(&mut self, leds: &mut [Rgb], frame: &mut Frame<'_>) {
        fill_solid(leds, frame.ctx.solid_color);
    }
}
