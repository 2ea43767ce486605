//! Seeded gameplay RNG
//!
//! A string seed is folded into a 32-bit hash; every draw advances the hash
//! by one and passes it through `sin` to decorrelate successive outputs.
//! This is a gameplay RNG only. It makes no cryptographic claims.

use rand::RngCore;

/// Amplifier applied to `sin` before taking the fractional part
const SIN_SCALE: f64 = 10_000.0;

/// Deterministic random source keyed by a string seed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeededRandom {
    seed: String,
    state: i32,
}

impl SeededRandom {
    /// Create a source from a seed. An empty seed hashes to zero.
    pub fn new(seed: &str) -> Self {
        Self {
            seed: seed.to_owned(),
            state: hash_seed(seed),
        }
    }

    /// The seed this source was built from
    pub fn seed(&self) -> &str {
        &self.seed
    }

    /// Discard all draw history and start over from the original seed
    pub fn reseed(&mut self) {
        self.state = hash_seed(&self.seed);
    }

    /// Next value in `[0, 1)`
    pub fn next(&mut self) -> f64 {
        self.state = self.state.wrapping_add(1);
        let x = f64::from(self.state).sin() * SIN_SCALE;
        let frac = x - x.floor();
        // x - floor(x) rounds up to 1.0 for tiny negative x
        if frac >= 1.0 { 0.0 } else { frac }
    }

    /// `floor(next() * span)`, kept below `span`; zero when `span <= 0`
    pub fn next_below(&mut self, span: f64) -> f64 {
        let r = self.next();
        if span <= 0.0 {
            return 0.0;
        }
        (r * span).floor().min(span.ceil() - 1.0)
    }

    /// Pick an index into a palette of `len` entries
    pub fn next_index(&mut self, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        ((self.next() * len as f64) as usize).min(len - 1)
    }
}

/// Fold the seed's UTF-16 code units into a wrapping 32-bit hash (`h * 31 + c`)
pub fn hash_seed(seed: &str) -> i32 {
    seed.encode_utf16().fold(0i32, |hash, unit| {
        hash.wrapping_shl(5)
            .wrapping_sub(hash)
            .wrapping_add(i32::from(unit))
    })
}

impl RngCore for SeededRandom {
    fn next_u32(&mut self) -> u32 {
        (self.next() * 4_294_967_296.0) as u32
    }

    fn next_u64(&mut self) -> u64 {
        let hi = u64::from(self.next_u32());
        let lo = u64::from(self.next_u32());
        (hi << 32) | lo
    }

    fn fill_bytes(&mut self, dst: &mut [u8]) {
        for chunk in dst.chunks_mut(4) {
            let bytes = self.next_u32().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }
}
