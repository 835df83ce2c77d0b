// Swirl Module - Analytic spiral-arm field evaluated in polar coordinates
use std::f32::consts::TAU;

use super::{Frame, Pattern};
use crate::gradients::palette_color;
use crate::types::{nblend, Rgb};
use crate::wave::{beat88, beatsin88};

/// Radial zoom: spiral rank 0..n maps onto r in [0, ZOOM)
const ZOOM: f32 = 2.5;
/// Number of arms
const ARMS: f32 = 3.0;
const BRIGHTNESS: f32 = 240.0;
const BLEND_AMOUNT: u8 = 128;

/// Sine oscillator mapped onto a float range
fn oscillate(rate: u16, speed: u16, low: f32, high: f32, now: u32) -> f32 {
    let raw = beatsin88(rate.wrapping_mul(speed), 0, u16::MAX, now);
    low + (high - low) * raw as f32 / u16::MAX as f32
}

/// Always drawn with the dedicated swirl palette, whatever the current selection
#[derive(Debug, Clone, Copy, Default)]
pub struct Swirl;

impl Pattern for Swirl {
    fn render(&mut self, leds: &mut [Rgb], frame: &mut Frame<'_>) {
        let n = leds.len();
        if n == 0 {
            return;
        }
        let now = frame.now;
        let speed = frame.ctx.speed as u16;

        let offset = oscillate(13, speed, 0.1, 2.0, now);
        let depth = oscillate(17, speed, 0.1, 2.0, now);
        let twist = oscillate(7, speed, -3.0, 2.0, now);
        let sharpness = oscillate(27, speed, 0.1, 0.5, now);
        let rotation = (beat88(3 * speed, now) >> 3) as f32;

        let topology = frame.topology;
        let palette = &frame.ctx.swirl_palette;

        for (i, led) in leds.iter_mut().enumerate() {
            let r = topology.spiral_of(i) as f32 / n as f32 * ZOOM;
            let a = (topology.angle(i) as f32 + rotation) / 256.0 * TAU;

            let v = r - offset + depth * (ARMS * a + twist * r * r).sin();
            let c = (255.0 - BRIGHTNESS * v.abs().powf(sharpness)).clamp(0.0, 255.0);

            nblend(led, palette_color(palette, c as u8), BLEND_AMOUNT);
        }
    }
}
