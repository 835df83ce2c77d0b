// Renderer Module - Render context, control input and the tick-driven frame scheduler
use anyhow::Result;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Receiver;
use std::thread;
use std::time::{Duration, Instant};

use crate::geometry::Topology;
use crate::gradients::{PaletteSet, Palette16, RAINBOW_COLORS, SWIRL_PALETTE_NAME};
use crate::output::FrameSink;
use crate::patterns::{Frame, Registry};
use crate::types::Rgb;

pub const DEFAULT_HUE_INTERVAL_MS: u32 = 20;

/// Shared parameters every pattern reads. Written only between ticks.
#[derive(Debug, Clone)]
pub struct RenderContext {
    pub palette: Palette16,
    pub palette_index: usize,
    /// Palette the swirl pattern draws with regardless of selection
    pub swirl_palette: Palette16,
    pub speed: u8,
    /// Slowly rotating hue offset, advanced by the scheduler
    pub hue: u8,
    pub solid_color: Rgb,
    /// Applied by the output stage, never by patterns
    pub brightness: u8,
    pub cooling: u8,
    pub sparking: u8,
    pub pattern: usize,
}

impl Default for RenderContext {
    fn default() -> Self {
        RenderContext {
            palette: RAINBOW_COLORS,
            palette_index: 0,
            swirl_palette: RAINBOW_COLORS,
            speed: 30,
            hue: 0,
            solid_color: Rgb::new(0, 0, 255),
            brightness: 128,
            cooling: 49,
            sparking: 60,
            pattern: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternSelector {
    Index(usize),
    Name(String),
}

impl PatternSelector {
    /// Numbers select by index, anything else by name
    pub fn parse(s: &str) -> Self {
        match s.trim().parse::<usize>() {
            Ok(index) => PatternSelector::Index(index),
            Err(_) => PatternSelector::Name(s.trim().to_string()),
        }
    }
}

/// Everything the control layer may change, applied at the start of the next tick
#[derive(Debug, Clone, PartialEq)]
pub struct ControlInput {
    pub speed: u8,
    pub palette: usize,
    pub solid_color: Rgb,
    pub brightness: u8,
    pub pattern: PatternSelector,
    pub cooling: u8,
    pub sparking: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Rendering,
}

pub struct Renderer {
    topology: Topology,
    leds: Vec<Rgb>,
    registry: Registry,
    palettes: PaletteSet,
    ctx: RenderContext,
    pending: Option<ControlInput>,
    state: SchedulerState,
    rng: StdRng,

    hue_interval_ms: u32,
    hue_carry_ms: u32,
    last_tick_ms: Option<u32>,
    reset_on_switch: bool,
    frames: u64,
}

impl Renderer {
    pub fn new(topology: Topology, registry: Registry, palettes: PaletteSet) -> Result<Self> {
        topology.validate()?;
        if registry.is_empty() {
            anyhow::bail!("No patterns registered");
        }
        if palettes.is_empty() {
            anyhow::bail!("No palettes available");
        }

        let mut ctx = RenderContext::default();
        if let Some(palette) = palettes.get(0) {
            ctx.palette = *palette;
        }
        ctx.swirl_palette = match palettes.find(SWIRL_PALETTE_NAME) {
            Some(palette) => *palette,
            None => {
                log::warn!("Palette '{}' not found, swirl uses the first palette", SWIRL_PALETTE_NAME);
                ctx.palette
            }
        };

        let leds = vec![Rgb::BLACK; topology.len()];
        Ok(Renderer {
            topology,
            leds,
            registry,
            palettes,
            ctx,
            pending: None,
            state: SchedulerState::Idle,
            rng: StdRng::from_entropy(),
            hue_interval_ms: DEFAULT_HUE_INTERVAL_MS,
            hue_carry_ms: 0,
            last_tick_ms: None,
            reset_on_switch: true,
            frames: 0,
        })
    }

    /// Reproducible randomness, for tests and recordings
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Milliseconds per global hue step
    pub fn with_hue_interval(mut self, interval_ms: u32) -> Self {
        self.hue_interval_ms = interval_ms.max(1);
        self
    }

    /// Whether a newly selected pattern starts from fresh state
    pub fn with_reset_on_switch(mut self, reset: bool) -> Self {
        self.reset_on_switch = reset;
        self
    }

    pub fn context(&self) -> &RenderContext {
        &self.ctx
    }

    pub fn leds(&self) -> &[Rgb] {
        &self.leds
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn palettes(&self) -> &PaletteSet {
        &self.palettes
    }

    pub fn patterns(&self) -> Vec<(usize, &'static str)> {
        self.registry.list()
    }

    pub fn pattern_name(&self) -> &'static str {
        self.registry.name(self.ctx.pattern).unwrap_or("")
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn frame_count(&self) -> u64 {
        self.frames
    }

    /// Queue control input; it takes effect at the start of the next tick.
    /// A later call before that tick replaces the earlier one.
    pub fn apply_control(&mut self, input: ControlInput) {
        self.pending = Some(input);
    }

    fn resolve_pattern(&self, selector: &PatternSelector) -> Option<usize> {
        match selector {
            PatternSelector::Index(i) if *i < self.registry.len() => Some(*i),
            PatternSelector::Index(_) => None,
            PatternSelector::Name(name) => self.registry.position(name),
        }
    }

    fn apply_pending(&mut self) {
        let Some(input) = self.pending.take() else {
            return;
        };

        self.ctx.speed = input.speed;
        self.ctx.solid_color = input.solid_color;
        self.ctx.brightness = input.brightness;
        self.ctx.cooling = input.cooling;
        self.ctx.sparking = input.sparking;

        if input.palette != self.ctx.palette_index {
            match self.palettes.get(input.palette) {
                Some(palette) => {
                    self.ctx.palette = *palette;
                    self.ctx.palette_index = input.palette;
                    log::debug!("Palette -> {}", input.palette);
                }
                None => log::warn!(
                    "Ignoring palette index {} (only {} palettes)",
                    input.palette,
                    self.palettes.len()
                ),
            }
        }

        match self.resolve_pattern(&input.pattern) {
            Some(index) if index != self.ctx.pattern => {
                if self.reset_on_switch {
                    if let Some(descriptor) = self.registry.get_mut(index) {
                        descriptor.reset();
                    }
                }
                self.ctx.pattern = index;
                log::debug!("Pattern -> {} ({})", index, self.pattern_name());
            }
            Some(_) => {}
            None => log::warn!("Ignoring unknown pattern selection {:?}", input.pattern),
        }
    }

    // Advance the global hue by whole intervals of elapsed time, carrying the remainder
    fn advance_hue(&mut self, now_ms: u32) {
        let elapsed = self.last_tick_ms.map_or(0, |last| now_ms.wrapping_sub(last));
        self.last_tick_ms = Some(now_ms);

        let total = self.hue_carry_ms as u64 + elapsed as u64;
        let steps = total / self.hue_interval_ms as u64;
        self.hue_carry_ms = (total % self.hue_interval_ms as u64) as u32;
        self.ctx.hue = self.ctx.hue.wrapping_add((steps % 256) as u8);
    }

    /// Render one frame at `now_ms` (milliseconds since start) and return it
    pub fn tick(&mut self, now_ms: u32) -> &[Rgb] {
        self.state = SchedulerState::Rendering;
        self.apply_pending();
        self.advance_hue(now_ms);

        if let Some(descriptor) = self.registry.get_mut(self.ctx.pattern) {
            let mut frame = Frame {
                now: now_ms,
                ctx: &self.ctx,
                topology: &self.topology,
                rng: &mut self.rng,
            };
            descriptor.render(&mut self.leds, &mut frame);
        }

        self.frames += 1;
        self.state = SchedulerState::Idle;
        &self.leds
    }

    /// Render one frame and hand it to `sink`. A failed send drops the frame.
    pub fn tick_into(&mut self, now_ms: u32, sink: &mut dyn FrameSink) {
        self.tick(now_ms);
        if let Err(e) = sink.send(&self.leds, self.ctx.brightness) {
            log::warn!("Dropped frame {}: {}", self.frames, e);
        }
    }

    /// Render at `fps` until `shutdown` is set, applying control input as it arrives
    pub fn run(
        &mut self,
        sink: &mut dyn FrameSink,
        fps: f64,
        controls: &Receiver<ControlInput>,
        shutdown: &AtomicBool,
    ) {
        let start = Instant::now();
        let frame_duration = Duration::from_micros((1_000_000.0 / fps.max(1.0)) as u64);
        let mut last_frame: Option<Instant> = None;

        loop {
            let loop_start = Instant::now();

            if shutdown.load(Ordering::Relaxed) {
                break;
            }

            // Only the newest input matters
            while let Ok(input) = controls.try_recv() {
                self.apply_control(input);
            }

            let due = last_frame.map_or(true, |last| loop_start.duration_since(last) >= frame_duration);
            if due {
                last_frame = Some(loop_start);
                let now_ms = start.elapsed().as_millis() as u32;
                self.tick_into(now_ms, sink);
            }

            // Tiny sleep to avoid spinning CPU at 100%
            thread::sleep(Duration::from_micros(100));
        }

        log::info!("Rendered {} frames", self.frames);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::FibonacciLayout;
    use crate::output::NullSink;

    fn renderer(pixels: usize) -> Renderer {
        let layout = FibonacciLayout::new(pixels, 13).unwrap();
        let topology = Topology::from_layout(&layout).unwrap();
        Renderer::new(topology, Registry::standard(), PaletteSet::builtin().unwrap())
            .unwrap()
            .with_seed(42)
    }

    fn control(pattern: PatternSelector) -> ControlInput {
        ControlInput {
            speed: 30,
            palette: 0,
            solid_color: Rgb::new(0, 0, 255),
            brightness: 128,
            pattern,
            cooling: 49,
            sparking: 60,
        }
    }

    #[test]
    fn selection_applies_on_next_tick() {
        let mut r = renderer(64);
        r.apply_control(control(PatternSelector::Name("Solid Color".into())));
        assert_eq!(r.context().pattern, 0);
        let frame = r.tick(0);
        assert!(frame.iter().all(|c| *c == Rgb::new(0, 0, 255)));
        assert_eq!(r.pattern_name(), "Solid Color");
        assert_eq!(r.state(), SchedulerState::Idle);
    }

    #[test]
    fn out_of_range_selection_keeps_previous() {
        let mut r = renderer(16);
        r.apply_control(control(PatternSelector::Index(3)));
        r.tick(0);
        r.apply_control(control(PatternSelector::Index(999)));
        r.tick(20);
        assert_eq!(r.context().pattern, 3);

        r.apply_control(control(PatternSelector::Name("nope".into())));
        r.tick(40);
        assert_eq!(r.context().pattern, 3);
    }

    #[test]
    fn out_of_range_palette_keeps_previous() {
        let mut r = renderer(16);
        let mut input = control(PatternSelector::Index(0));
        input.palette = 2;
        r.apply_control(input.clone());
        r.tick(0);
        assert_eq!(r.context().palette_index, 2);

        input.palette = 10_000;
        r.apply_control(input);
        r.tick(20);
        assert_eq!(r.context().palette_index, 2);
        assert_eq!(Some(&r.context().palette), r.palettes().get(2));
    }

    #[test]
    fn hue_advances_with_wall_clock_time() {
        let mut r = renderer(8);
        r.tick(1000);
        assert_eq!(r.context().hue, 0);
        r.tick(1030);
        assert_eq!(r.context().hue, 1);
        // The 10ms remainder carries into the next tick
        r.tick(1040);
        assert_eq!(r.context().hue, 2);
        r.tick(1040 + 20 * 300);
        assert_eq!(r.context().hue, (2 + 300 % 256) as u8);
    }

    #[test]
    fn switching_resets_the_new_pattern() {
        let sinelon = PatternSelector::Name("Sinelon".into());
        let mut fresh = renderer(60);
        let mut kept = renderer(60).with_reset_on_switch(false);

        for r in [&mut fresh, &mut kept] {
            r.apply_control(control(sinelon.clone()));
            for t in 0..20 {
                r.tick(t * 20);
            }
            r.apply_control(control(PatternSelector::Name("Solid Color".into())));
            r.tick(400);
            r.apply_control(control(sinelon.clone()));
            r.tick(420);
        }
        // A reset sweep starts its trail at pixel 0 instead of the remembered cursor
        assert_ne!(fresh.leds(), kept.leds());
    }

    #[test]
    fn same_seed_same_frames() {
        let mut a = renderer(128);
        let mut b = renderer(128);
        for r in [&mut a, &mut b] {
            r.apply_control(control(PatternSelector::Name("Confetti".into())));
        }
        for t in 0..50 {
            let fa = a.tick(t * 16).to_vec();
            let fb = b.tick(t * 16).to_vec();
            assert_eq!(fa, fb);
        }
    }

    #[test]
    fn zero_pixels_is_a_no_op() {
        let mut r = Renderer::new(Topology::empty(), Registry::standard(), PaletteSet::builtin().unwrap()).unwrap();
        let mut sink = NullSink;
        for i in 0..Registry::standard().len() {
            r.apply_control(control(PatternSelector::Index(i)));
            r.tick_into(i as u32 * 20, &mut sink);
            assert!(r.leds().is_empty());
        }
    }

    #[test]
    fn swirl_palette_comes_from_the_set() {
        let r = renderer(8);
        let set = PaletteSet::builtin().unwrap();
        assert_eq!(Some(&r.context().swirl_palette), set.find(SWIRL_PALETTE_NAME));
    }

    #[test]
    fn run_stops_on_shutdown() {
        let mut r = renderer(16);
        let (tx, rx) = std::sync::mpsc::channel();
        tx.send(control(PatternSelector::Name("Solid Color".into()))).unwrap();
        let shutdown = AtomicBool::new(false);
        let mut sink = NullSink;
        std::thread::scope(|s| {
            s.spawn(|| {
                std::thread::sleep(Duration::from_millis(50));
                shutdown.store(true, Ordering::Relaxed);
            });
            r.run(&mut sink, 200.0, &rx, &shutdown);
        });
        assert!(r.frame_count() > 0);
        assert_eq!(r.pattern_name(), "Solid Color");
    }
}
