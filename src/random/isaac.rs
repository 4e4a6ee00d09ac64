//! Bob Jenkins' ISAAC generators, at 32- and 64-bit word widths.
//!
//! Both produce a block of `RANDSIZ` words per mixing pass over their
//! internal permutation table, hand the block out from the end toward
//! the front, and run another pass once it is spent.  Seeding follows
//! the reference `randinit(TRUE)`: the seed words are laid into the
//! result block and folded into the table in two passes.

use super::{RandomSource, DOUBLE_UNIT};
use crate::error::{FlameError, Result};

const RANDSIZL: usize = 8;
const RANDSIZ: usize = 1 << RANDSIZL;

macro_rules! isaac_generator {
    (
        $(#[$meta:meta])*
        $name:ident, $word:ty, $golden:expr, $shift:expr,
        mix = $mix:ident,
        steps = [$s0:expr, $s1:expr, $s2:expr, $s3:expr]
    ) => {
        $(#[$meta])*
        #[derive(Clone)]
        pub struct $name {
            remaining: usize,
            results: [$word; RANDSIZ],
            memory: [$word; RANDSIZ],
            a: $word,
            b: $word,
            c: $word,
            gaussian: Option<f64>,
        }

        impl $name {
            /// A generator seeded from `seed`.
            pub fn new(seed: u64) -> Self {
                let mut rng = $name {
                    remaining: 0,
                    results: [0; RANDSIZ],
                    memory: [0; RANDSIZ],
                    a: 0,
                    b: 0,
                    c: 0,
                    gaussian: None,
                };
                rng.seed(seed);
                rng
            }

            /// Seed from up to `RANDSIZ` raw words, the way the
            /// reference implementation takes its seed.  Missing words
            /// are zero.
            pub fn seed_words(&mut self, words: &[$word]) -> Result<()> {
                if words.len() > RANDSIZ {
                    return Err(FlameError::InvalidSeed(format!(
                        "{} takes at most {} seed words, got {}",
                        stringify!($name),
                        RANDSIZ,
                        words.len()
                    )));
                }
                self.results = [0; RANDSIZ];
                self.results[..words.len()].copy_from_slice(words);
                self.initialize();
                Ok(())
            }

            /// The next raw output word.
            #[inline]
            pub fn next_word(&mut self) -> $word {
                if self.remaining == 0 {
                    self.generate();
                    self.remaining = RANDSIZ;
                }
                self.remaining -= 1;
                self.results[self.remaining]
            }

            #[inline]
            fn lookup(&self, v: $word) -> $word {
                self.memory[(v >> $shift) as usize % RANDSIZ]
            }

            fn generate(&mut self) {
                self.c = self.c.wrapping_add(1);
                let mut a = self.a;
                let mut b = self.b.wrapping_add(self.c);
                for i in 0..RANDSIZ {
                    let mixed = match i % 4 {
                        0 => $s0(a),
                        1 => $s1(a),
                        2 => $s2(a),
                        _ => $s3(a),
                    };
                    let x = self.memory[i];
                    a = mixed.wrapping_add(self.memory[(i + RANDSIZ / 2) % RANDSIZ]);
                    let y = self.lookup(x).wrapping_add(a).wrapping_add(b);
                    self.memory[i] = y;
                    b = self.lookup(y >> RANDSIZL).wrapping_add(x);
                    self.results[i] = b;
                }
                self.a = a;
                self.b = b;
            }

            fn initialize(&mut self) {
                self.a = 0;
                self.b = 0;
                self.c = 0;
                let mut s: [$word; 8] = [$golden; 8];
                for _ in 0..4 {
                    $mix(&mut s);
                }
                for i in (0..RANDSIZ).step_by(8) {
                    for k in 0..8 {
                        s[k] = s[k].wrapping_add(self.results[i + k]);
                    }
                    $mix(&mut s);
                    self.memory[i..i + 8].copy_from_slice(&s);
                }
                // second pass so every seed word reaches all of memory
                for i in (0..RANDSIZ).step_by(8) {
                    for k in 0..8 {
                        s[k] = s[k].wrapping_add(self.memory[i + k]);
                    }
                    $mix(&mut s);
                    self.memory[i..i + 8].copy_from_slice(&s);
                }
                self.generate();
                self.remaining = RANDSIZ;
                self.gaussian = None;
            }
        }

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                f.debug_struct(stringify!($name))
                    .field("remaining", &self.remaining)
                    .field("c", &self.c)
                    .finish()
            }
        }
    };
}

fn mix32(s: &mut [u32; 8]) {
    let [mut a, mut b, mut c, mut d, mut e, mut f, mut g, mut h] = *s;
    a ^= b << 11;
    d = d.wrapping_add(a);
    b = b.wrapping_add(c);
    b ^= c >> 2;
    e = e.wrapping_add(b);
    c = c.wrapping_add(d);
    c ^= d << 8;
    f = f.wrapping_add(c);
    d = d.wrapping_add(e);
    d ^= e >> 16;
    g = g.wrapping_add(d);
    e = e.wrapping_add(f);
    e ^= f << 10;
    h = h.wrapping_add(e);
    f = f.wrapping_add(g);
    f ^= g >> 4;
    a = a.wrapping_add(f);
    g = g.wrapping_add(h);
    g ^= h << 8;
    b = b.wrapping_add(g);
    h = h.wrapping_add(a);
    h ^= a >> 9;
    c = c.wrapping_add(h);
    a = a.wrapping_add(b);
    *s = [a, b, c, d, e, f, g, h];
}

fn mix64(s: &mut [u64; 8]) {
    let [mut a, mut b, mut c, mut d, mut e, mut f, mut g, mut h] = *s;
    a = a.wrapping_sub(e);
    f ^= h >> 9;
    h = h.wrapping_add(a);
    b = b.wrapping_sub(f);
    g ^= a << 9;
    a = a.wrapping_add(b);
    c = c.wrapping_sub(g);
    h ^= b >> 23;
    b = b.wrapping_add(c);
    d = d.wrapping_sub(h);
    a ^= c << 15;
    c = c.wrapping_add(d);
    e = e.wrapping_sub(a);
    b ^= d >> 14;
    d = d.wrapping_add(e);
    f = f.wrapping_sub(b);
    c ^= e << 20;
    e = e.wrapping_add(f);
    g = g.wrapping_sub(c);
    d ^= f >> 17;
    f = f.wrapping_add(g);
    h = h.wrapping_sub(d);
    e ^= g << 14;
    g = g.wrapping_add(h);
    *s = [a, b, c, d, e, f, g, h];
}

isaac_generator!(
    /// ISAAC with 32-bit words.
    Isaac32, u32, 0x9e37_79b9, 2,
    mix = mix32,
    steps = [
        |a: u32| a ^ (a << 13),
        |a: u32| a ^ (a >> 6),
        |a: u32| a ^ (a << 2),
        |a: u32| a ^ (a >> 16)
    ]
);

isaac_generator!(
    /// ISAAC-64, the 64-bit word variant.
    Isaac64, u64, 0x9e37_79b9_7f4a_7c13, 3,
    mix = mix64,
    steps = [
        |a: u64| !(a ^ (a << 21)),
        |a: u64| a ^ (a >> 5),
        |a: u64| a ^ (a << 12),
        |a: u64| a ^ (a >> 33)
    ]
);

impl RandomSource for Isaac32 {
    /// The low half of the seed goes in the first result word and the
    /// high half in the second, so a zero seed is the reference
    /// all-zero seed.
    fn seed(&mut self, seed: u64) {
        self.results = [0; RANDSIZ];
        self.results[0] = seed as u32;
        self.results[1] = (seed >> 32) as u32;
        self.initialize();
    }

    #[inline]
    fn next_bits(&mut self, bits: u32) -> u32 {
        debug_assert!(bits >= 1 && bits <= 32);
        self.next_word() >> (32 - bits)
    }

    fn gaussian_slot(&mut self) -> &mut Option<f64> {
        &mut self.gaussian
    }
}

impl RandomSource for Isaac64 {
    fn seed(&mut self, seed: u64) {
        self.results = [0; RANDSIZ];
        self.results[0] = seed;
        self.initialize();
    }

    #[inline]
    fn next_bits(&mut self, bits: u32) -> u32 {
        debug_assert!(bits >= 1 && bits <= 32);
        (self.next_word() >> (64 - bits)) as u32
    }

    /// One word is enough for a full mantissa.
    #[inline]
    fn next_uniform(&mut self) -> f64 {
        (self.next_word() >> 11) as f64 * DOUBLE_UNIT
    }

    fn gaussian_slot(&mut self) -> &mut Option<f64> {
        &mut self.gaussian
    }
}

impl rand::RngCore for Isaac32 {
    fn next_u32(&mut self) -> u32 {
        self.next_word()
    }

    fn next_u64(&mut self) -> u64 {
        let hi = u64::from(self.next_word());
        (hi << 32) | u64::from(self.next_word())
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(4) {
            let word = self.next_word().to_le_bytes();
            chunk.copy_from_slice(&word[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> std::result::Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

impl rand::RngCore for Isaac64 {
    fn next_u32(&mut self) -> u32 {
        (self.next_word() >> 32) as u32
    }

    fn next_u64(&mut self) -> u64 {
        self.next_word()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(8) {
            let word = self.next_word().to_le_bytes();
            chunk.copy_from_slice(&word[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> std::result::Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}
