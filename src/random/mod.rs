//! Reproducible uniform random sources.
//!
//! The chaos game is only reproducible if its random stream is.  Every
//! generator here is fully determined by an explicit seed, produces the
//! same sequence on every platform, and can be re-seeded in place.
//! There is no process-wide seed state: callers that want a "random"
//! seed draw one themselves and pass it in.

mod isaac;
mod java;

pub use self::isaac::{Isaac32, Isaac64};
pub use self::java::JavaRandom;

use crate::error::{FlameError, Result};
use std::fmt;
use std::str::FromStr;

/// 2^-53, the spacing of doubles in [0.5, 1).
pub(crate) const DOUBLE_UNIT: f64 = 1.0 / (1u64 << 53) as f64;

/// The contract the renderer depends on.  Implementors supply a raw
/// bit source and a slot for the cached Gaussian; everything else has a
/// default built on top of `next_bits`.
pub trait RandomSource {
    /// Reset the internal state as determined by `seed`.  Never
    /// reallocates, and forgets any cached Gaussian.
    fn seed(&mut self, seed: u64);

    /// The next `bits` (between 1 and 32) high-order bits of the
    /// generator's output, in the low bits of the result.
    fn next_bits(&mut self, bits: u32) -> u32;

    /// Storage for the second sample of a Box-Muller pair.
    fn gaussian_slot(&mut self) -> &mut Option<f64>;

    /// A uniform double in [0, 1) with a full 53-bit mantissa.
    fn next_uniform(&mut self) -> f64 {
        let hi = u64::from(self.next_bits(26));
        let lo = u64::from(self.next_bits(27));
        ((hi << 27) + lo) as f64 * DOUBLE_UNIT
    }

    /// A uniform integer in [0, bound).  Powers of two take the high
    /// bits directly; other bounds reject the partial bucket at the top
    /// of the 31-bit range so that no value is favoured.
    fn next_int(&mut self, bound: i32) -> Result<i32> {
        if bound <= 0 {
            return Err(FlameError::InvalidArgument(format!(
                "random bound must be positive, got {}",
                bound
            )));
        }
        if bound & bound.wrapping_neg() == bound {
            let bits = i64::from(self.next_bits(31));
            return Ok(((i64::from(bound) * bits) >> 31) as i32);
        }
        loop {
            let bits = self.next_bits(31) as i32;
            let val = bits % bound;
            if bits.wrapping_sub(val).wrapping_add(bound - 1) >= 0 {
                return Ok(val);
            }
        }
    }

    /// A fair coin.
    fn next_bool(&mut self) -> bool {
        self.next_bits(1) != 0
    }

    /// A standard normal deviate (polar Box-Muller).  Samples come in
    /// pairs; the second one is cached for the next call.
    fn next_gaussian(&mut self) -> f64 {
        if let Some(g) = self.gaussian_slot().take() {
            return g;
        }
        let (v1, v2, s) = loop {
            let v1 = 2.0 * self.next_uniform() - 1.0;
            let v2 = 2.0 * self.next_uniform() - 1.0;
            let s = v1 * v1 + v2 * v2;
            if s < 1.0 && s != 0.0 {
                break (v1, v2, s);
            }
        };
        let norm = (-2.0 * s.ln() / s).sqrt();
        *self.gaussian_slot() = Some(v2 * norm);
        v1 * norm
    }
}

/// Names the generator families, so the command line can pick one.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RngKind {
    /// The 48-bit linear congruential generator of `java.util.Random`.
    Java,
    /// ISAAC with 32-bit words.
    Isaac32,
    /// ISAAC with 64-bit words.
    Isaac64,
}

impl RngKind {
    /// Every kind, in the order the command line lists them.
    pub const ALL: [RngKind; 3] = [RngKind::Java, RngKind::Isaac32, RngKind::Isaac64];

    /// The name accepted by `from_str`.
    pub fn name(self) -> &'static str {
        match self {
            RngKind::Java => "java",
            RngKind::Isaac32 => "isaac32",
            RngKind::Isaac64 => "isaac64",
        }
    }

    /// A freshly seeded generator of this kind.
    pub fn build(self, seed: u64) -> Box<dyn RandomSource + Send> {
        match self {
            RngKind::Java => Box::new(JavaRandom::new(seed)),
            RngKind::Isaac32 => Box::new(Isaac32::new(seed)),
            RngKind::Isaac64 => Box::new(Isaac64::new(seed)),
        }
    }
}

impl fmt::Display for RngKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for RngKind {
    type Err = FlameError;

    fn from_str(s: &str) -> Result<Self> {
        RngKind::ALL
            .iter()
            .cloned()
            .find(|k| k.name() == s)
            .ok_or_else(|| FlameError::InvalidArgument(format!("unknown generator \"{}\"", s)))
    }
}

/// Derive `count` well-separated sub-seeds from one seed with
/// SplitMix64, so parallel workers never share a stream.
pub fn split_seeds(seed: u64, count: usize) -> Vec<u64> {
    let mut state = seed;
    (0..count)
        .map(|_| {
            state = state.wrapping_add(0x9e37_79b9_7f4a_7c15);
            let mut z = state;
            z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
            z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
            z ^ (z >> 31)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_int_rejects_non_positive_bounds() {
        for kind in RngKind::ALL.iter() {
            let mut rng = kind.build(1);
            assert!(rng.next_int(0).is_err());
            assert!(rng.next_int(-5).is_err());
        }
    }

    #[test]
    fn next_int_stays_in_bounds() {
        for kind in RngKind::ALL.iter() {
            let mut rng = kind.build(99);
            for bound in &[1, 2, 3, 7, 10, 16, 1000, i32::max_value()] {
                for _ in 0..200 {
                    let v = rng.next_int(*bound).unwrap();
                    assert!(v >= 0 && v < *bound, "{} gave {} for {}", kind, v, bound);
                }
            }
        }
    }

    #[test]
    fn uniform_draws_are_in_unit_interval() {
        for kind in RngKind::ALL.iter() {
            let mut rng = kind.build(7);
            let mut sum = 0.0;
            for _ in 0..10_000 {
                let u = rng.next_uniform();
                assert!(u >= 0.0 && u < 1.0);
                sum += u;
            }
            let mean = sum / 10_000.0;
            assert!((mean - 0.5).abs() < 0.02, "{} mean {}", kind, mean);
        }
    }

    #[test]
    fn reseeding_restarts_the_stream() {
        for kind in RngKind::ALL.iter() {
            let mut rng = kind.build(12345);
            let first: Vec<u32> = (0..600).map(|_| rng.next_bits(32)).collect();
            rng.next_gaussian();
            rng.seed(12345);
            let again: Vec<u32> = (0..600).map(|_| rng.next_bits(32)).collect();
            assert_eq!(first, again);
        }
    }

    #[test]
    fn gaussians_have_unit_spread() {
        let mut rng = RngKind::Isaac64.build(3);
        let n = 20_000;
        let samples: Vec<f64> = (0..n).map(|_| rng.next_gaussian()).collect();
        let mean = samples.iter().sum::<f64>() / n as f64;
        let var = samples.iter().map(|g| (g - mean) * (g - mean)).sum::<f64>() / n as f64;
        assert!(mean.abs() < 0.05);
        assert!((var - 1.0).abs() < 0.05);
    }

    #[test]
    fn kinds_round_trip_through_their_names() {
        for kind in RngKind::ALL.iter() {
            assert_eq!(kind.name().parse::<RngKind>().unwrap(), *kind);
        }
        assert!("mersenne".parse::<RngKind>().is_err());
    }

    #[test]
    fn split_seeds_are_distinct_and_repeatable() {
        let a = split_seeds(42, 8);
        let b = split_seeds(42, 8);
        assert_eq!(a, b);
        let mut sorted = a.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), 8);
        assert_ne!(split_seeds(43, 1), split_seeds(42, 1));
    }
}
