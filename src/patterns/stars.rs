// Stars Module - Groups of stars marching outward along the spiral
use super::{Frame, Pattern};
use crate::gradients::palette_color;
use crate::math8::random_index;
use crate::types::{fade_to_black_by, nblend, Rgb};
use crate::wave::EveryNMillis;

const STARS_PER_GROUP: usize = 16;
/// Spiral step of each group; Fibonacci numbers keep the groups on the spiral's arms
const GROUP_OFFSETS: [usize; 3] = [34, 55, 89];
const MOVE_INTERVAL_MS: u32 = 90;
const FADE_AMOUNT: u8 = 8;
const BLEND_AMOUNT: u8 = 64;

#[derive(Debug, Clone)]
struct StarGroup {
    offset: usize,
    /// Spiral indices
    stars: [usize; STARS_PER_GROUP],
}

impl StarGroup {
    fn new(offset: usize) -> Self {
        StarGroup { offset, stars: [0; STARS_PER_GROUP] }
    }

    fn update(&mut self, leds: &mut [Rgb], frame: &mut Frame<'_>, respawn_all: bool, advance: bool) {
        let n = leds.len();
        let hues_per_step = (n / 256).max(1);
        let spawn_range = (self.offset - 1).min(n);

        for star in self.stars.iter_mut() {
            if respawn_all || *star >= n {
                *star = random_index(frame.rng, spawn_range);
            }

            let pixel = frame.topology.physical_of(*star);
            let index = ((*star / hues_per_step) as u8).wrapping_add(frame.ctx.hue);
            nblend(&mut leds[pixel], palette_color(&frame.ctx.palette, index), BLEND_AMOUNT);

            if advance {
                *star += self.offset;
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct Stars {
    groups: Vec<StarGroup>,
    mover: EveryNMillis,
    seeded: bool,
}

impl Stars {
    pub fn new() -> Self {
        Stars {
            groups: GROUP_OFFSETS.iter().map(|&offset| StarGroup::new(offset)).collect(),
            mover: EveryNMillis::new(MOVE_INTERVAL_MS),
            seeded: false,
        }
    }
}

impl Default for Stars {
    fn default() -> Self {
        Self::new()
    }
}

impl Pattern for Stars {
    fn render(&mut self, leds: &mut [Rgb], frame: &mut Frame<'_>) {
        fade_to_black_by(leds, FADE_AMOUNT);
        if leds.is_empty() {
            return;
        }

        let advance = self.mover.ready(frame.now);
        let respawn_all = !self.seeded;
        for group in self.groups.iter_mut() {
            group.update(leds, frame, respawn_all, advance);
        }
        self.seeded = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gradients::Palette16;
    use crate::patterns::test_support::{render_at, rng, topology};
    use crate::renderer::RenderContext;

    #[test]
    fn stars_start_near_the_center() {
        let topo = topology(256);
        let ctx = RenderContext::default();
        let mut rng = rng();
        let mut stars = Stars::new();
        let mut leds = vec![Rgb::BLACK; 256];
        render_at(&mut stars, &mut leds, &topo, &ctx, &mut rng, 0);
        for group in &stars.groups {
            assert!(group.stars.iter().all(|&s| s < group.offset - 1));
        }
    }

    #[test]
    fn stars_advance_only_on_the_move_interval() {
        let topo = topology(256);
        let ctx = RenderContext::default();
        let mut rng = rng();
        let mut stars = Stars::new();
        let mut leds = vec![Rgb::BLACK; 256];
        render_at(&mut stars, &mut leds, &topo, &ctx, &mut rng, 1000);
        let before = stars.groups[0].stars;
        render_at(&mut stars, &mut leds, &topo, &ctx, &mut rng, 1050);
        assert_eq!(stars.groups[0].stars, before);
        render_at(&mut stars, &mut leds, &topo, &ctx, &mut rng, 1095);
        let moved = stars.groups[0].stars;
        for (a, b) in before.iter().zip(moved.iter()) {
            assert_eq!(*b, *a + 34);
        }
    }

    #[test]
    fn stars_that_leave_the_disc_respawn() {
        let topo = topology(256);
        let ctx = RenderContext::default();
        let mut rng = rng();
        let mut stars = Stars::new();
        let mut leds = vec![Rgb::BLACK; 256];
        for step in 0..200 {
            render_at(&mut stars, &mut leds, &topo, &ctx, &mut rng, step * 45);
            for group in &stars.groups {
                // A star may sit one offset past the edge until the next frame respawns it
                assert!(group.stars.iter().all(|&s| s < 256 + group.offset));
            }
        }
    }

    #[test]
    fn small_discs_keep_stars_in_range() {
        let topo = topology(12);
        let ctx = RenderContext { palette: Palette16::solid(Rgb::WHITE), ..RenderContext::default() };
        let mut rng = rng();
        let mut stars = Stars::new();
        let mut leds = vec![Rgb::BLACK; 12];
        for step in 0..50 {
            render_at(&mut stars, &mut leds, &topo, &ctx, &mut rng, step * 100);
        }
        assert!(leds.iter().any(|c| !c.is_black()));
    }
}
