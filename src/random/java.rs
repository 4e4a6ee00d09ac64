//! A bit-for-bit reimplementation of `java.util.Random`.

use super::RandomSource;

const MULTIPLIER: u64 = 0x5_DEEC_E66D;
const ADDEND: u64 = 0xB;
const MASK: u64 = (1 << 48) - 1;

/// The 48-bit linear congruential generator used by the JDK.  Given the
/// same seed it produces exactly the sequence `new Random(seed)` does,
/// including the JDK's `nextInt(bound)` rejection loop.
#[derive(Clone, Debug)]
pub struct JavaRandom {
    state: u64,
    gaussian: Option<f64>,
}

impl JavaRandom {
    /// A generator in the state `new Random(seed)` would be in.
    pub fn new(seed: u64) -> Self {
        let mut rng = JavaRandom {
            state: 0,
            gaussian: None,
        };
        rng.seed(seed);
        rng
    }

    /// `nextInt()`: all 32 bits, signed.
    pub fn next_i32(&mut self) -> i32 {
        self.next_bits(32) as i32
    }

    /// `nextLong()`: two draws glued together with the JDK's signed add.
    pub fn next_i64(&mut self) -> i64 {
        let hi = i64::from(self.next_i32());
        let lo = i64::from(self.next_i32());
        (hi << 32).wrapping_add(lo)
    }

    /// `nextFloat()`: 24 bits in [0, 1).
    pub fn next_f32(&mut self) -> f32 {
        self.next_bits(24) as f32 / (1u32 << 24) as f32
    }
}

impl RandomSource for JavaRandom {
    fn seed(&mut self, seed: u64) {
        self.state = (seed ^ MULTIPLIER) & MASK;
        self.gaussian = None;
    }

    #[inline]
    fn next_bits(&mut self, bits: u32) -> u32 {
        debug_assert!(bits >= 1 && bits <= 32);
        self.state = self.state.wrapping_mul(MULTIPLIER).wrapping_add(ADDEND) & MASK;
        (self.state >> (48 - bits)) as u32
    }

    fn gaussian_slot(&mut self) -> &mut Option<f64> {
        &mut self.gaussian
    }
}

impl rand::RngCore for JavaRandom {
    fn next_u32(&mut self) -> u32 {
        self.next_bits(32)
    }

    fn next_u64(&mut self) -> u64 {
        self.next_i64() as u64
    }

    /// `nextBytes()`: each 32-bit draw is spent low byte first, and the
    /// unused bytes of the final draw are thrown away.
    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(4) {
            let word = self.next_bits(32).to_le_bytes();
            chunk.copy_from_slice(&word[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}
