// Noise Module - Deterministic 2D gradient (Perlin) noise sampled at 8.8 fixed-point coordinates

const PERMUTATION_SEED: u32 = 0x2545_F491;

// Fisher-Yates shuffle of 0..=255 driven by a fixed xorshift sequence
const fn build_permutation(seed: u32) -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        table[i] = i as u8;
        i += 1;
    }

    let mut state = seed;
    let mut n = 255;
    while n > 0 {
        state ^= state << 13;
        state ^= state >> 17;
        state ^= state << 5;
        let j = (state % (n as u32 + 1)) as usize;
        let tmp = table[n];
        table[n] = table[j];
        table[j] = tmp;
        n -= 1;
    }
    table
}

static PERM: [u8; 256] = build_permutation(PERMUTATION_SEED);

#[inline]
fn perm(i: usize) -> usize {
    PERM[i & 0xFF] as usize
}

#[inline]
fn fade(t: f32) -> f32 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

#[inline]
fn lerp(t: f32, a: f32, b: f32) -> f32 {
    a + t * (b - a)
}

#[inline]
fn grad(hash: usize, x: f32, y: f32) -> f32 {
    match hash & 7 {
        0 => x + y,
        1 => -x + y,
        2 => x - y,
        3 => -x - y,
        4 => x,
        5 => -x,
        6 => y,
        _ => -y,
    }
}

/// Raw 2D Perlin noise, roughly in [-1, 1]; zero on every lattice point.
/// The lattice repeats every 256 cells so the field is seamless across coordinate wrap.
pub fn noise2(x: f32, y: f32) -> f32 {
    let xi = x.floor();
    let yi = y.floor();
    let xf = x - xi;
    let yf = y - yi;
    let xi = (xi as i64 & 0xFF) as usize;
    let yi = (yi as i64 & 0xFF) as usize;

    let u = fade(xf);
    let v = fade(yf);

    let aa = perm(perm(xi) + yi);
    let ab = perm(perm(xi) + yi + 1);
    let ba = perm(perm(xi + 1) + yi);
    let bb = perm(perm(xi + 1) + yi + 1);

    let x1 = lerp(u, grad(aa, xf, yf), grad(ba, xf - 1.0, yf));
    let x2 = lerp(u, grad(ab, xf, yf - 1.0), grad(bb, xf - 1.0, yf - 1.0));
    lerp(v, x1, x2)
}

/// 8-bit coherent noise. `x` and `y` are 8.8 fixed point: the high byte picks the
/// lattice cell, the low byte the position inside it.
pub fn inoise8(x: u16, y: u16) -> u8 {
    let n = noise2(x as f32 / 256.0, y as f32 / 256.0);
    ((n + 1.0) * 127.5).round().clamp(0.0, 255.0) as u8
}
