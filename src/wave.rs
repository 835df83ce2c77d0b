// Wave Module - Time-driven oscillators (beat/beatsin family) and periodic wave shapes
//
// Every oscillator is a function of wall-clock milliseconds, never of frame count,
// so animation speed does not depend on the achieved frame rate.
use std::f32::consts::TAU;

use crate::math8::{scale16, scale8};

/// Signed 16-bit sine over a full 16-bit turn
pub fn sin16(theta: u16) -> i16 {
    let radians = theta as f32 / 65536.0 * TAU;
    (radians.sin() * 32767.0).round() as i16
}

/// Unsigned 8-bit sine centered on 128 over a full 8-bit turn
pub fn sin8(theta: u8) -> u8 {
    ((sin16((theta as u16) << 8) >> 8) + 128) as u8
}

/// Triangle wave: 0 -> 254 -> 0 over one 8-bit turn
pub fn triwave8(input: u8) -> u8 {
    let folded = if input & 0x80 != 0 { 255 - input } else { input };
    folded << 1
}

fn ease8_in_out_quad(input: u8) -> u8 {
    let j = if input & 0x80 != 0 { 255 - input } else { input };
    let jj2 = scale8(j, j) << 1;
    if input & 0x80 != 0 {
        255 - jj2
    } else {
        jj2
    }
}

/// Triangle wave with eased corners, close to a sine but cheaper
pub fn quadwave8(input: u8) -> u8 {
    ease8_in_out_quad(triwave8(input))
}

/// Fast rise over the first third, slow fall over the rest
pub fn attack_decay_wave8(input: u8) -> u8 {
    if input < 86 {
        input * 3
    } else {
        let i = input - 86;
        255 - (i + i / 2)
    }
}

/// Sawtooth over 16 bits; `bpm88` is beats per minute in Q8.8 fixed point
pub fn beat88(bpm88: u16, now_ms: u32) -> u16 {
    ((now_ms as u64 * bpm88 as u64 * 280) >> 16) as u16
}

/// Sawtooth over 16 bits at `bpm` beats per minute (values >= 256 are read as Q8.8)
pub fn beat16(bpm: u16, now_ms: u32) -> u16 {
    let bpm88 = if bpm < 256 { bpm << 8 } else { bpm };
    beat88(bpm88, now_ms)
}

pub fn beat8(bpm: u16, now_ms: u32) -> u8 {
    (beat16(bpm, now_ms) >> 8) as u8
}

/// Sine oscillating between `low` and `high` at a Q8.8 bpm
pub fn beatsin88(bpm88: u16, low: u16, high: u16, now_ms: u32) -> u16 {
    let beat = beat88(bpm88, now_ms);
    let wave = (sin16(beat) as i32 + 32768) as u16;
    let range = high.saturating_sub(low);
    low + scale16(wave, range)
}

pub fn beatsin16(bpm: u16, low: u16, high: u16, now_ms: u32) -> u16 {
    let beat = beat16(bpm, now_ms);
    let wave = (sin16(beat) as i32 + 32768) as u16;
    let range = high.saturating_sub(low);
    low + scale16(wave, range)
}

pub fn beatsin8(bpm: u16, low: u8, high: u8, now_ms: u32) -> u8 {
    let beat = beat8(bpm, now_ms);
    let wave = sin8(beat);
    let range = high.saturating_sub(low);
    low + scale8(wave, range)
}

/// Fires at most once per `period_ms` of wall-clock time; owned by pattern state
#[derive(Debug, Clone, Copy)]
pub struct EveryNMillis {
    period_ms: u32,
    last_ms: Option<u32>,
}

impl EveryNMillis {
    pub const fn new(period_ms: u32) -> Self {
        EveryNMillis { period_ms, last_ms: None }
    }

    /// True when a full period has elapsed since the last time this returned true.
    /// The first call only arms the timer.
    pub fn ready(&mut self, now_ms: u32) -> bool {
        match self.last_ms {
            None => {
                self.last_ms = Some(now_ms);
                false
            }
            Some(last) if now_ms.wrapping_sub(last) >= self.period_ms => {
                self.last_ms = Some(now_ms);
                true
            }
            Some(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sine_landmarks() {
        assert_eq!(sin16(0), 0);
        assert_eq!(sin16(16384), 32767);
        assert_eq!(sin16(49152), -32767);
        assert_eq!(sin8(0), 128);
        assert_eq!(sin8(64), 255);
        assert!(sin8(192) <= 1);
    }

    #[test]
    fn triwave_folds() {
        assert_eq!(triwave8(0), 0);
        assert_eq!(triwave8(127), 254);
        assert_eq!(triwave8(128), 254);
        assert_eq!(triwave8(255), 0);
    }

    #[test]
    fn quadwave_eases_a_triangle() {
        assert_eq!(quadwave8(0), 0);
        assert!(quadwave8(64) >= 126 && quadwave8(64) <= 129);
        assert!(quadwave8(128) >= 253);
        assert_eq!(quadwave8(255), 0);
        // Flatter than the triangle near the trough, steeper through the middle
        assert!(quadwave8(16) < triwave8(16));
        assert!(quadwave8(100) > triwave8(100));
        for i in 0..128u8 {
            assert!(quadwave8(i) <= quadwave8(i + 1));
        }
    }

    #[test]
    fn attack_decay_shape() {
        assert_eq!(attack_decay_wave8(0), 0);
        assert_eq!(attack_decay_wave8(85), 255);
        assert!(attack_decay_wave8(200) < attack_decay_wave8(100));
        assert!(attack_decay_wave8(255) < 10);
    }

    #[test]
    fn beat_is_periodic_in_wall_clock_time() {
        // 60 bpm -> one full sawtooth per second
        assert_eq!(beat16(60, 0), 0);
        let quarter = beat16(60, 250);
        assert!((16000..=16800).contains(&quarter), "quarter beat was {}", quarter);
        let a = beat8(60, 1234);
        let b = beat8(60, 1234 + 1000);
        assert!((a as i16 - b as i16).abs() <= 1);
    }

    #[test]
    fn beat_does_not_move_at_zero_bpm() {
        assert_eq!(beat88(0, 123_456), 0);
        assert_eq!(beatsin16(0, 10, 20, 99_999), beatsin16(0, 10, 20, 0));
    }

    #[test]
    fn beatsin_respects_bounds() {
        for t in (0..20_000).step_by(37) {
            let v = beatsin8(30, 64, 255, t);
            assert!(v >= 64);
            let w = beatsin16(13, 0, 99, t);
            assert!(w <= 99);
            let x = beatsin88(171, 96, 224, t);
            assert!((96..=224).contains(&x));
        }
    }

    #[test]
    fn every_n_millis_arms_then_fires() {
        let mut every = EveryNMillis::new(90);
        assert!(!every.ready(1000));
        assert!(!every.ready(1089));
        assert!(every.ready(1090));
        assert!(!every.ready(1100));
        assert!(every.ready(1200));
    }
}
