// Patterns Module - The Pattern trait, per-frame inputs and the ordered pattern registry
use rand::rngs::StdRng;

use crate::geometry::Topology;
use crate::gradients::{HEAT_COLORS, ICE_COLORS};
use crate::renderer::RenderContext;
use crate::types::Rgb;

pub mod classic;
pub mod emitters;
pub mod heat;
pub mod noise_fields;
pub mod stars;
pub mod swirl;
pub mod twinkles;
pub mod waves;

pub use classic::{Bpm, Confetti, Juggle, Rainbow, Sinelon, SolidColor};
pub use emitters::Emitters;
pub use heat::HeatMap;
pub use noise_fields::{NoiseField, PaletteNoise, PaletteSource, PolarNoise};
pub use stars::Stars;
pub use swirl::Swirl;
pub use twinkles::Twinkles;
pub use waves::{ColorWaves, Pride};

/// Everything a pattern may read while drawing one frame
pub struct Frame<'a> {
    /// Wall-clock milliseconds since the engine started
    pub now: u32,
    pub ctx: &'a RenderContext,
    pub topology: &'a Topology,
    pub rng: &'a mut StdRng,
}

/// A frame generator. `self` is the pattern's private persistent state.
///
/// `leds` is indexed by physical pixel and always has the same length as
/// `frame.topology`; it may be empty, in which case nothing is drawn.
pub trait Pattern: Send {
    fn render(&mut self, leds: &mut [Rgb], frame: &mut Frame<'_>);
}

/// A named pattern together with the state object it owns
pub struct PatternDescriptor {
    name: &'static str,
    build: fn() -> Box<dyn Pattern>,
    pattern: Box<dyn Pattern>,
}

impl PatternDescriptor {
    pub fn new(name: &'static str, build: fn() -> Box<dyn Pattern>) -> Self {
        PatternDescriptor { name, build, pattern: build() }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Throw away accumulated state and start from a freshly built pattern
    pub fn reset(&mut self) {
        self.pattern = (self.build)();
    }

    pub fn render(&mut self, leds: &mut [Rgb], frame: &mut Frame<'_>) {
        self.pattern.render(leds, frame);
    }
}

/// Fixed, ordered list of patterns built once at startup
pub struct Registry {
    patterns: Vec<PatternDescriptor>,
}

impl Registry {
    pub fn new(patterns: Vec<PatternDescriptor>) -> Self {
        Registry { patterns }
    }

    /// All built-in patterns in selection order
    pub fn standard() -> Self {
        Registry::new(vec![
            PatternDescriptor::new("Color Palette Waves", || Box::new(ColorWaves::new(true))),
            PatternDescriptor::new("Rainbow Waves", || Box::new(Pride::new(true))),
            PatternDescriptor::new("Palette Noise", || Box::new(PaletteNoise)),
            PatternDescriptor::new("Polar Palette Noise", || Box::new(PolarNoise)),
            PatternDescriptor::new("Fire", || {
                Box::new(NoiseField::fire(PaletteSource::Fixed(HEAT_COLORS)))
            }),
            PatternDescriptor::new("Water", || {
                Box::new(NoiseField::water(PaletteSource::Fixed(ICE_COLORS)))
            }),
            PatternDescriptor::new("Palette Fire", || Box::new(NoiseField::fire(PaletteSource::Current))),
            PatternDescriptor::new("Palette Water", || Box::new(NoiseField::water(PaletteSource::Current))),
            PatternDescriptor::new("Palette Stars", || Box::new(Stars::new())),
            PatternDescriptor::new("Palette Emitters", || Box::new(Emitters::new())),
            PatternDescriptor::new("Swirl", || Box::new(Swirl)),
            PatternDescriptor::new("Color Waves", || Box::new(ColorWaves::new(false))),
            PatternDescriptor::new("Pride", || Box::new(Pride::new(false))),
            PatternDescriptor::new("Twinkles", || Box::new(Twinkles)),
            PatternDescriptor::new("Fire Strip", || Box::new(HeatMap::new(HEAT_COLORS, true))),
            PatternDescriptor::new("Water Strip", || Box::new(HeatMap::new(ICE_COLORS, false))),
            PatternDescriptor::new("Rainbow", || Box::new(Rainbow::new(false))),
            PatternDescriptor::new("Rainbow With Glitter", || Box::new(Rainbow::new(true))),
            PatternDescriptor::new("Confetti", || Box::new(Confetti)),
            PatternDescriptor::new("Sinelon", || Box::new(Sinelon::default())),
            PatternDescriptor::new("Juggle", || Box::new(Juggle)),
            PatternDescriptor::new("BPM", || Box::new(Bpm)),
            PatternDescriptor::new("Solid Color", || Box::new(SolidColor)),
        ])
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn name(&self, index: usize) -> Option<&'static str> {
        self.patterns.get(index).map(|p| p.name)
    }

    /// Case-insensitive name lookup
    pub fn position(&self, name: &str) -> Option<usize> {
        let name = name.trim();
        self.patterns.iter().position(|p| p.name.eq_ignore_ascii_case(name))
    }

    /// `(index, name)` pairs in selection order, for display by the control surface
    pub fn list(&self) -> Vec<(usize, &'static str)> {
        self.patterns.iter().enumerate().map(|(i, p)| (i, p.name)).collect()
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut PatternDescriptor> {
        self.patterns.get_mut(index)
    }
}
