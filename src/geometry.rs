// Geometry Module - Physical LED layouts and the topology tables derived from them
use anyhow::Result;
use std::f64::consts::TAU;

const PHI: f64 = 1.618033988749895; // Golden ratio
const GOLDEN_ANGLE: f64 = TAU * (1.0 - 1.0 / PHI); // ~137.5 degrees, in radians

/// Something that can place each wired pixel in polar space.
/// `index` is the physical (wiring) index; angle is in radians, radius in any unit >= 0.
pub trait Layout {
    fn pixel_count(&self) -> usize;
    fn polar(&self, index: usize) -> (f64, f64);
}

/// Phyllotaxis disc: pixel `k` of the spiral sits at `k` golden angles and radius `sqrt(k)`.
/// The strip is wired arm by arm along `arms` parastichies, alternating direction,
/// so physical order and spiral order differ.
#[derive(Debug, Clone)]
pub struct FibonacciLayout {
    arms: usize,
    wiring: Vec<usize>, // physical index -> spiral index
}

impl FibonacciLayout {
    pub fn new(pixels: usize, arms: usize) -> Result<Self> {
        if arms == 0 {
            anyhow::bail!("A Fibonacci layout needs at least one arm");
        }

        let mut wiring = Vec::with_capacity(pixels);
        for arm in 0..arms.min(pixels.max(1)) {
            let mut along_arm: Vec<usize> = (arm..pixels).step_by(arms).collect();
            if arm % 2 == 1 {
                along_arm.reverse();
            }
            wiring.extend(along_arm);
        }

        Ok(FibonacciLayout { arms, wiring })
    }

    pub fn arms(&self) -> usize {
        self.arms
    }

    fn spiral_position(k: usize) -> (f64, f64) {
        let angle = (k as f64 * GOLDEN_ANGLE).rem_euclid(TAU);
        let radius = (k as f64 + 0.5).sqrt();
        (angle, radius)
    }
}

impl Layout for FibonacciLayout {
    fn pixel_count(&self) -> usize {
        self.wiring.len()
    }

    fn polar(&self, index: usize) -> (f64, f64) {
        Self::spiral_position(self.wiring[index])
    }
}

/// Explicit per-pixel polar coordinates, in wiring order
#[derive(Debug, Clone, Default)]
pub struct PolarLayout {
    pub points: Vec<(f64, f64)>,
}

impl Layout for PolarLayout {
    fn pixel_count(&self) -> usize {
        self.points.len()
    }

    fn polar(&self, index: usize) -> (f64, f64) {
        self.points[index]
    }
}

/// Precomputed per-pixel tables. Built once, read-only afterwards.
///
/// * `spiral_of[physical]` / `physical_of[spiral]`: bijection ordering pixels by radius
/// * `angle`, `radius`: 8-bit polar coordinates (full turn = 256, outermost pixel = 255)
/// * `x`, `y`: `radius·cos(angle)` / `radius·sin(angle)` in 8-bit fixed point centered on 128
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Topology {
    spiral_of: Vec<usize>,
    physical_of: Vec<usize>,
    angle: Vec<u8>,
    radius: Vec<u8>,
    x: Vec<u8>,
    y: Vec<u8>,
}

impl Topology {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build from a layout. The spiral order sorts pixels by exact radius,
    /// ties broken by wiring order.
    pub fn from_layout(layout: &dyn Layout) -> Result<Self> {
        let count = layout.pixel_count();
        let mut polar = Vec::with_capacity(count);
        for i in 0..count {
            let (angle, radius) = layout.polar(i);
            if !angle.is_finite() || !radius.is_finite() || radius < 0.0 {
                anyhow::bail!("Pixel {} has invalid polar position ({}, {})", i, angle, radius);
            }
            polar.push((angle, radius));
        }

        let max_radius = polar.iter().map(|&(_, r)| r).fold(0.0f64, f64::max);
        let normalize = |r: f64| if max_radius > 0.0 { r / max_radius } else { 0.0 };

        let angle: Vec<u8> = polar
            .iter()
            .map(|&(a, _)| ((a.rem_euclid(TAU) / TAU * 256.0).round() as u32 % 256) as u8)
            .collect();
        let radius: Vec<u8> = polar
            .iter()
            .map(|&(_, r)| (normalize(r) * 255.0).round() as u8)
            .collect();
        let x: Vec<u8> = polar.iter().map(|&(a, r)| to_fixed(normalize(r) * a.cos())).collect();
        let y: Vec<u8> = polar.iter().map(|&(a, r)| to_fixed(normalize(r) * a.sin())).collect();

        let mut order: Vec<usize> = (0..count).collect();
        order.sort_by(|&a, &b| polar[a].1.total_cmp(&polar[b].1));

        Self::assemble(order, angle, radius, x, y)
    }

    /// Build from already-quantized polar tables. Both tables must cover the same pixels.
    pub fn from_polar(angle: Vec<u8>, radius: Vec<u8>) -> Result<Self> {
        if angle.len() != radius.len() {
            anyhow::bail!(
                "Topology tables disagree: {} angles but {} radii",
                angle.len(),
                radius.len()
            );
        }

        let unit = |i: usize| {
            let a = angle[i] as f64 / 256.0 * TAU;
            let r = radius[i] as f64 / 255.0;
            (r * a.cos(), r * a.sin())
        };
        let x: Vec<u8> = (0..angle.len()).map(|i| to_fixed(unit(i).0)).collect();
        let y: Vec<u8> = (0..angle.len()).map(|i| to_fixed(unit(i).1)).collect();

        let mut order: Vec<usize> = (0..radius.len()).collect();
        order.sort_by_key(|&i| radius[i]);

        Self::assemble(order, angle, radius, x, y)
    }

    fn assemble(
        physical_of: Vec<usize>,
        angle: Vec<u8>,
        radius: Vec<u8>,
        x: Vec<u8>,
        y: Vec<u8>,
    ) -> Result<Self> {
        let mut spiral_of = vec![usize::MAX; physical_of.len()];
        for (spiral, &physical) in physical_of.iter().enumerate() {
            spiral_of[physical] = spiral;
        }

        let topology = Topology { spiral_of, physical_of, angle, radius, x, y };
        topology.validate()?;
        Ok(topology)
    }

    /// Check table sizes and that the spiral mapping is a permutation with a matching inverse
    pub fn validate(&self) -> Result<()> {
        let n = self.spiral_of.len();
        let sizes = [
            self.physical_of.len(),
            self.angle.len(),
            self.radius.len(),
            self.x.len(),
            self.y.len(),
        ];
        if sizes.iter().any(|&s| s != n) {
            anyhow::bail!("Topology tables have mismatched lengths: {} vs {:?}", n, sizes);
        }

        let mut seen = vec![false; n];
        for &spiral in &self.spiral_of {
            if spiral >= n || seen[spiral] {
                anyhow::bail!("Spiral mapping is not a permutation of 0..{}", n);
            }
            seen[spiral] = true;
        }
        for (spiral, &physical) in self.physical_of.iter().enumerate() {
            if physical >= n || self.spiral_of[physical] != spiral {
                anyhow::bail!("Spiral mapping inverse is inconsistent at {}", spiral);
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.spiral_of.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spiral_of.is_empty()
    }

    /// Spiral (radius-ordered) index of a physical pixel
    #[inline]
    pub fn spiral_of(&self, physical: usize) -> usize {
        self.spiral_of[physical]
    }

    /// Physical pixel sitting at a spiral index
    #[inline]
    pub fn physical_of(&self, spiral: usize) -> usize {
        self.physical_of[spiral]
    }

    #[inline]
    pub fn angle(&self, physical: usize) -> u8 {
        self.angle[physical]
    }

    #[inline]
    pub fn radius(&self, physical: usize) -> u8 {
        self.radius[physical]
    }

    #[inline]
    pub fn x(&self, physical: usize) -> u8 {
        self.x[physical]
    }

    #[inline]
    pub fn y(&self, physical: usize) -> u8 {
        self.y[physical]
    }
}

// [-1, 1] -> [1, 255], centered on 128
fn to_fixed(unit: f64) -> u8 {
    (128.0 + unit * 127.0).round().clamp(0.0, 255.0) as u8
}
