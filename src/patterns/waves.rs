// Waves Module - Palette and rainbow waves driven by layered sine oscillators
//
// Both generators keep a phase accumulator advanced by elapsed wall-clock time
// scaled by a slowly oscillating multiplier. Each pixel is blended 8/255 of the
// way toward its new color, which smooths any frame-to-frame jump.
use super::{Frame, Pattern};
use crate::gradients::{color_from_palette, Blend};
use crate::math8::scale8;
use crate::types::{nblend, Hsv, Rgb};
use crate::wave::{beatsin88, sin16};

const BLEND_AMOUNT: u8 = 8;

#[derive(Debug, Default, Clone)]
struct WavePhase {
    pseudotime: u16,
    hue16: u16,
    last_ms: Option<u16>,
}

impl WavePhase {
    /// Advance by elapsed time since the previous frame; the first frame does not move.
    /// Returns the hue accumulator as it was before advancing.
    fn advance(&mut self, now: u32, ms_multiplier: u16, hue_rate: u16) -> u16 {
        let start_hue = self.hue16;
        let ms = now as u16;
        let delta = self.last_ms.map_or(0, |last| ms.wrapping_sub(last));
        self.last_ms = Some(ms);
        self.pseudotime = self.pseudotime.wrapping_add(delta.wrapping_mul(ms_multiplier));
        self.hue16 = self.hue16.wrapping_add(delta.wrapping_mul(hue_rate));
        start_hue
    }
}

// Squared sine brightness, lifted so the dimmest point is 255 - depth
fn wave_brightness(theta: u16, depth: u8) -> u8 {
    let b16 = (sin16(theta) as i32 + 32768) as u32;
    let bri16 = b16 * b16 / 65536;
    let bri8 = (bri16 * depth as u32 / 65536) as u8;
    bri8.saturating_add(255 - depth)
}

// Pixel that receives wave step `i`
fn target(frame: &Frame<'_>, spiral: bool, i: usize) -> usize {
    if spiral {
        frame.topology.physical_of(i)
    } else {
        i
    }
}

/// Palette waves, laid out along the spiral or along the wiring
#[derive(Debug, Default, Clone)]
pub struct ColorWaves {
    spiral: bool,
    phase: WavePhase,
}

impl ColorWaves {
    pub fn new(spiral: bool) -> Self {
        ColorWaves { spiral, phase: WavePhase::default() }
    }
}

impl Pattern for ColorWaves {
    fn render(&mut self, leds: &mut [Rgb], frame: &mut Frame<'_>) {
        let now = frame.now;
        let bright_depth = beatsin88(171, 96, 224, now) as u8;
        let theta_inc16 = beatsin88(102, 25 * 256, 40 * 256, now);
        let ms_multiplier = beatsin88(74, 23, 60, now);
        let hue_inc16 = beatsin88(57, 1, 128, now);
        let hue_rate = beatsin88(200, 5, 9, now);

        let mut hue16 = self.phase.advance(now, ms_multiplier, hue_rate);
        let mut theta16 = self.phase.pseudotime;

        for i in 0..leds.len() {
            hue16 = hue16.wrapping_add(hue_inc16);
            theta16 = theta16.wrapping_add(theta_inc16);

            // Ping-pong the hue so the palette is walked forward then back
            let h16_128 = hue16 >> 7;
            let hue8 = if h16_128 & 0x100 != 0 {
                255 - (h16_128 >> 1) as u8
            } else {
                (h16_128 >> 1) as u8
            };

            let index = scale8(hue8, 240);
            let bri8 = wave_brightness(theta16, bright_depth);
            let color = color_from_palette(&frame.ctx.palette, index, bri8, Blend::Linear);

            let pixel = target(frame, self.spiral, i);
            nblend(&mut leds[pixel], color, BLEND_AMOUNT);
        }
    }
}

/// Rainbow waves with a breathing saturation
#[derive(Debug, Default, Clone)]
pub struct Pride {
    spiral: bool,
    phase: WavePhase,
}

impl Pride {
    pub fn new(spiral: bool) -> Self {
        Pride { spiral, phase: WavePhase::default() }
    }
}

impl Pattern for Pride {
    fn render(&mut self, leds: &mut [Rgb], frame: &mut Frame<'_>) {
        let now = frame.now;
        let sat8 = beatsin88(43, 220, 250, now) as u8;
        let bright_depth = beatsin88(171, 96, 224, now) as u8;
        let theta_inc16 = beatsin88(102, 25 * 256, 40 * 256, now);
        let ms_multiplier = beatsin88(74, 23, 60, now);
        let hue_inc16 = beatsin88(57, 1, 128, now);
        let hue_rate = beatsin88(200, 5, 9, now);

        let mut hue16 = self.phase.advance(now, ms_multiplier, hue_rate);
        let mut theta16 = self.phase.pseudotime;

        for i in 0..leds.len() {
            hue16 = hue16.wrapping_add(hue_inc16);
            theta16 = theta16.wrapping_add(theta_inc16);

            let hue8 = (hue16 / 256) as u8;
            let bri8 = wave_brightness(theta16, bright_depth);
            let color = Hsv::new(hue8, sat8, bri8).to_rgb();

            let pixel = target(frame, self.spiral, i);
            nblend(&mut leds[pixel], color, BLEND_AMOUNT);
        }
    }
}
