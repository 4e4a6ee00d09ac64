//! The variation catalog.
//!
//! A variation is a nonlinear map of the plane.  Each one is a variant
//! of the closed `Variation` enum, resolved from its name once, when
//! the genome is parsed; the render loop only ever matches on the
//! variant.  Variations that need polar quantities of the input point
//! say so through a flag mask, and the renderer computes those values
//! once per point per XForm in a `Precalc`, no matter how many of the
//! XForm's variations share them.

use crate::planes::Point;
use num::Complex;
use std::f64::consts::PI;
use std::fmt;

/// θ = atan2(y, x)
pub const PRECALC_THETA: u8 = 1 << 0;
/// φ = atan2(x, y), the angle measured from the y axis
pub const PRECALC_PHI: u8 = 1 << 1;
/// sin θ = y / r
pub const PRECALC_SIN_THETA: u8 = 1 << 2;
/// cos θ = x / r
pub const PRECALC_COS_THETA: u8 = 1 << 3;
/// r = √(x² + y²)
pub const PRECALC_R: u8 = 1 << 4;
/// r² = x² + y²
pub const PRECALC_R2: u8 = 1 << 5;

const EPS: f64 = 1e-10;

/// Polar auxiliaries of one point.  Only the fields whose flags were
/// requested are meaningful; the rest are left at zero.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Precalc {
    /// atan2(y, x)
    pub theta: f64,
    /// atan2(x, y)
    pub phi: f64,
    /// y / r
    pub sin_theta: f64,
    /// x / r
    pub cos_theta: f64,
    /// distance from the origin
    pub r: f64,
    /// squared distance from the origin
    pub r2: f64,
}

impl Precalc {
    /// Evaluate the auxiliaries named in `mask` for `p`, sharing the
    /// intermediate square root among the ones that need it.
    #[inline]
    pub fn compute(p: Point, mask: u8) -> Precalc {
        let mut pc = Precalc::default();
        if mask == 0 {
            return pc;
        }
        let radial = PRECALC_R | PRECALC_SIN_THETA | PRECALC_COS_THETA;
        if mask & (radial | PRECALC_R2) != 0 {
            pc.r2 = p.re * p.re + p.im * p.im;
        }
        if mask & radial != 0 {
            pc.r = pc.r2.sqrt();
        }
        if mask & PRECALC_THETA != 0 {
            pc.theta = p.im.atan2(p.re);
        }
        if mask & PRECALC_PHI != 0 {
            pc.phi = p.re.atan2(p.im);
        }
        if mask & PRECALC_SIN_THETA != 0 {
            pc.sin_theta = p.im / pc.r;
        }
        if mask & PRECALC_COS_THETA != 0 {
            pc.cos_theta = p.re / pc.r;
        }
        pc
    }
}

/// Every variation the renderer knows.
#[allow(missing_docs)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Variation {
    Linear,
    Sinusoidal,
    Spherical,
    Swirl,
    Horseshoe,
    Polar,
    Handkerchief,
    Heart,
    Disc,
    Spiral,
    Hyperbolic,
    Diamond,
    Ex,
    Bent,
    Fisheye,
    Exponential,
    Power,
    Cosine,
    Bubble,
    Cylinder,
    Eyefish,
    Tangent,
    Cross,
    Log,
}

/// The registry: a static name table, read-only for the life of the
/// process.
static REGISTRY: [(&str, Variation); 24] = [
    ("linear", Variation::Linear),
    ("sinusoidal", Variation::Sinusoidal),
    ("spherical", Variation::Spherical),
    ("swirl", Variation::Swirl),
    ("horseshoe", Variation::Horseshoe),
    ("polar", Variation::Polar),
    ("handkerchief", Variation::Handkerchief),
    ("heart", Variation::Heart),
    ("disc", Variation::Disc),
    ("spiral", Variation::Spiral),
    ("hyperbolic", Variation::Hyperbolic),
    ("diamond", Variation::Diamond),
    ("ex", Variation::Ex),
    ("bent", Variation::Bent),
    ("fisheye", Variation::Fisheye),
    ("exponential", Variation::Exponential),
    ("power", Variation::Power),
    ("cosine", Variation::Cosine),
    ("bubble", Variation::Bubble),
    ("cylinder", Variation::Cylinder),
    ("eyefish", Variation::Eyefish),
    ("tangent", Variation::Tangent),
    ("cross", Variation::Cross),
    ("log", Variation::Log),
];

/// Find a variation by name.
pub fn lookup(name: &str) -> Option<Variation> {
    REGISTRY
        .iter()
        .find(|(n, _)| *n == name)
        .map(|&(_, v)| v)
}

/// The names of every registered variation, in catalog order.
pub fn names() -> impl Iterator<Item = &'static str> {
    REGISTRY.iter().map(|&(n, _)| n)
}

impl Variation {
    /// The registry name of this variation.
    pub fn name(self) -> &'static str {
        REGISTRY
            .iter()
            .find(|&&(_, v)| v == self)
            .map(|&(n, _)| n)
            .unwrap_or("unknown")
    }

    /// Which `Precalc` fields `apply` reads.
    pub fn precalc(self) -> u8 {
        use self::Variation::*;
        match self {
            Spherical | Swirl | Bubble => PRECALC_R2,
            Horseshoe | Fisheye | Eyefish => PRECALC_R,
            Polar | Handkerchief | Heart | Disc | Ex => PRECALC_PHI | PRECALC_R,
            Spiral | Hyperbolic | Diamond | Power => {
                PRECALC_R | PRECALC_SIN_THETA | PRECALC_COS_THETA
            }
            Log => PRECALC_THETA | PRECALC_R2,
            Linear | Sinusoidal | Bent | Exponential | Cosine | Cylinder | Tangent | Cross => 0,
        }
    }

    /// Map `p`.  `pc` must hold at least the auxiliaries named by
    /// `precalc()`, computed for this same `p`.
    #[inline]
    pub fn apply(self, p: Point, pc: &Precalc) -> Point {
        use self::Variation::*;
        let (x, y) = (p.re, p.im);
        let (nx, ny) = match self {
            Linear => (x, y),
            Sinusoidal => (x.sin(), y.sin()),
            Spherical => {
                let r2 = 1.0 / (pc.r2 + EPS);
                (x * r2, y * r2)
            }
            Swirl => {
                let (s, c) = pc.r2.sin_cos();
                (s * x - c * y, c * x + s * y)
            }
            Horseshoe => {
                let r = 1.0 / (pc.r + EPS);
                ((x - y) * (x + y) * r, 2.0 * x * y * r)
            }
            Polar => (pc.phi / PI, pc.r - 1.0),
            Handkerchief => (pc.r * (pc.phi + pc.r).sin(), pc.r * (pc.phi - pc.r).cos()),
            Heart => {
                let (s, c) = (pc.r * pc.phi).sin_cos();
                (pc.r * s, -pc.r * c)
            }
            Disc => {
                let a = pc.phi / PI;
                let (s, c) = (PI * pc.r).sin_cos();
                (s * a, c * a)
            }
            Spiral => {
                let r = pc.r + EPS;
                let (s, c) = r.sin_cos();
                ((pc.sin_theta + s) / r, (pc.cos_theta - c) / r)
            }
            Hyperbolic => {
                let r = pc.r + EPS;
                (pc.cos_theta / r, pc.sin_theta * r)
            }
            Diamond => {
                let (s, c) = pc.r.sin_cos();
                (pc.cos_theta * c, pc.sin_theta * s)
            }
            Ex => {
                let n0 = (pc.phi + pc.r).sin();
                let n1 = (pc.phi - pc.r).cos();
                let (m0, m1) = (n0 * n0 * n0, n1 * n1 * n1);
                (pc.r * (m0 + m1), pc.r * (m0 - m1))
            }
            Bent => (
                if x < 0.0 { 2.0 * x } else { x },
                if y < 0.0 { y / 2.0 } else { y },
            ),
            Fisheye => {
                let r = 2.0 / (pc.r + 1.0);
                (r * y, r * x)
            }
            Exponential => {
                let d = (x - 1.0).exp();
                let (s, c) = (PI * y).sin_cos();
                (d * c, d * s)
            }
            Power => {
                let r = pc.r.powf(pc.cos_theta);
                (r * pc.sin_theta, r * pc.cos_theta)
            }
            Cosine => {
                let (s, c) = (PI * x).sin_cos();
                (c * y.cosh(), -s * y.sinh())
            }
            Bubble => {
                let r = 4.0 / (pc.r2 + 4.0);
                (r * x, r * y)
            }
            Cylinder => (x.sin(), y),
            Eyefish => {
                let r = 2.0 / (pc.r + 1.0);
                (r * x, r * y)
            }
            Tangent => (x.sin() / y.cos(), y.tan()),
            Cross => {
                let s = x * x - y * y;
                let r = (1.0 / (s * s + EPS)).sqrt();
                (x * r, y * r)
            }
            Log => (0.5 * pc.r2.ln(), pc.theta),
        };
        Complex::new(nx, ny)
    }
}

impl fmt::Display for Variation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}
