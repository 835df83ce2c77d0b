// Math8 Module - 8-bit saturating and fixed-point arithmetic shared by every pattern
use rand::Rng;

/// Saturating 8-bit add (never wraps past 255)
#[inline]
pub fn qadd8(a: u8, b: u8) -> u8 {
    a.saturating_add(b)
}

/// Saturating 8-bit subtract (floors at 0)
#[inline]
pub fn qsub8(a: u8, b: u8) -> u8 {
    a.saturating_sub(b)
}

/// Scale a channel by `scale/255`, rounding down.
/// `scale8(v, 255) == v` and `scale8(v, 0) == 0` for every v.
#[inline]
pub fn scale8(value: u8, scale: u8) -> u8 {
    ((value as u16 * (1 + scale as u16)) >> 8) as u8
}

/// 16-bit counterpart of `scale8`
#[inline]
pub fn scale16(value: u16, scale: u16) -> u16 {
    ((value as u32 * (1 + scale as u32)) >> 16) as u16
}

/// Blend `a` toward `b` by `amount_of_b/255`.
/// Exact at both ends: amount 0 returns `a`, amount 255 returns `b`.
#[inline]
pub fn blend8(a: u8, b: u8, amount_of_b: u8) -> u8 {
    let amount = amount_of_b as u32;
    let mut partial: u32 = ((a as u32) << 8) | b as u32;
    partial += b as u32 * amount;
    partial -= a as u32 * amount;
    (partial >> 8) as u8
}

/// Map a full-range 8-bit value onto [start, end]
#[inline]
pub fn map8(value: u8, start: u8, end: u8) -> u8 {
    let range = end.saturating_sub(start);
    start.saturating_add(scale8(value, range))
}

/// Uniform random byte
#[inline]
pub fn random8(rng: &mut impl Rng) -> u8 {
    rng.gen()
}

/// Random value in [0, lim), 0 when lim is 0
#[inline]
pub fn random8_below(rng: &mut impl Rng, lim: u8) -> u8 {
    if lim == 0 {
        return 0;
    }
    rng.gen_range(0..lim)
}

/// Random value in [min, lim), `min` when the range is empty
#[inline]
pub fn random8_between(rng: &mut impl Rng, min: u8, lim: u8) -> u8 {
    if lim <= min {
        return min;
    }
    rng.gen_range(min..lim)
}

/// Random index in [0, len), 0 when len is 0
#[inline]
pub fn random_index(rng: &mut impl Rng, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    rng.gen_range(0..len)
}
