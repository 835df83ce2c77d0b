// Emitters Module - Particles launched from the center that streak outward at fixed angles
use super::{Frame, Pattern};
use crate::geometry::Topology;
use crate::gradients::palette_color;
use crate::math8::{qadd8, random8, random8_below, scale8};
use crate::types::{fade_to_black_by, nblend, Rgb};
use crate::wave::{beat8, EveryNMillis};

const DEFAULT_COUNT: usize = 7;
/// Angular width of a trace, in 1/256 turns
const TRACE_WIDTH: u8 = 32;
/// Radial length of a trace at zero speed
const TRACE_LENGTH: u8 = 12;
/// Upper bound of the random per-particle speed bonus
const SPEED_SPREAD: u8 = 16;
const SPAWN_INTERVAL_MS: u32 = 20;
/// Distance over which a trace's edges fade in
const EDGE: u16 = 4;

#[derive(Debug, Clone, Copy)]
struct Particle {
    angle: u8,
    speed_bonus: u8,
    /// Sawtooth phase at launch; the particle's radius is measured from here
    launched_at: u8,
}

impl Particle {
    fn bpm(&self, speed: u8) -> u16 {
        qadd8(speed, self.speed_bonus) as u16
    }
}

#[derive(Debug, Clone)]
pub struct Emitters {
    particles: Vec<Option<Particle>>,
    next_slot: usize,
    spawner: EveryNMillis,
    /// Persistent canvas the traces are drawn into; copied out every frame
    trail: Vec<Rgb>,
    fade: Option<u8>,
}

impl Emitters {
    pub fn new() -> Self {
        Self::with_count(DEFAULT_COUNT)
    }

    pub fn with_count(count: usize) -> Self {
        Emitters {
            particles: vec![None; count],
            next_slot: 0,
            spawner: EveryNMillis::new(SPAWN_INTERVAL_MS),
            trail: Vec::new(),
            fade: None,
        }
    }

    /// Fixed trail decay instead of the speed-derived default
    pub fn with_fade(mut self, amount: u8) -> Self {
        self.fade = Some(amount);
        self
    }

    fn maybe_spawn(&mut self, frame: &mut Frame<'_>) {
        if self.particles.is_empty() || !self.spawner.ready(frame.now) {
            return;
        }
        let speed = frame.ctx.speed;
        if random8_below(frame.rng, 17) > speed >> 4 {
            return;
        }

        let mut particle = Particle {
            angle: random8(frame.rng),
            speed_bonus: random8_below(frame.rng, SPEED_SPREAD),
            launched_at: 0,
        };
        particle.launched_at = beat8(particle.bpm(speed), frame.now);

        self.particles[self.next_slot] = Some(particle);
        self.next_slot = (self.next_slot + 1) % self.particles.len();
    }
}

impl Default for Emitters {
    fn default() -> Self {
        Self::new()
    }
}

/// Blend `color` into every pixel whose polar position falls inside the given
/// angular and radial span, with coverage ramping up over the span's edges.
/// A span whose end wrapped below its start is off the disc and draws nothing.
fn draw_trace(trail: &mut [Rgb], topology: &Topology, center: u8, start: u8, end: u8, color: Rgb) {
    if end <= start {
        return;
    }
    let half_width = TRACE_WIDTH / 2;

    for (i, pixel) in trail.iter_mut().enumerate() {
        let radius = topology.radius(i);
        if radius < start || radius > end {
            continue;
        }
        let angle = topology.angle(i);
        let distance = angle.wrapping_sub(center).min(center.wrapping_sub(angle));
        if distance >= half_width {
            continue;
        }

        let angular = ((half_width - distance) as u16 * 255 / EDGE).min(255) as u8;
        let radial_margin = (radius - start).min(end - radius) as u16;
        let radial = ((radial_margin + 1) * 255 / EDGE).min(255) as u8;
        nblend(pixel, color, scale8(angular, radial));
    }
}

impl Pattern for Emitters {
    fn render(&mut self, leds: &mut [Rgb], frame: &mut Frame<'_>) {
        if leds.is_empty() {
            return;
        }
        if self.trail.len() != leds.len() {
            self.trail = vec![Rgb::BLACK; leds.len()];
        }

        self.maybe_spawn(frame);

        let speed = frame.ctx.speed;
        let fade = self.fade.unwrap_or(6 + (speed >> 3));
        fade_to_black_by(&mut self.trail, fade);

        for particle in self.particles.iter().flatten() {
            let start = beat8(particle.bpm(speed), frame.now).wrapping_sub(particle.launched_at);
            let end = start.wrapping_add(TRACE_LENGTH + (speed >> 5));
            let color = palette_color(&frame.ctx.palette, start);
            draw_trace(&mut self.trail, frame.topology, particle.angle, start, end, color);
        }

        leds.copy_from_slice(&self.trail);
    }
}
