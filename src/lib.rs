#![deny(missing_docs)]
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Fractal flame renderer
//!
//! A fractal flame is the attractor of an iterated function system.
//! The system is a handful of XForms: each one is an affine map,
//! followed by a weighted blend of non-linear "variations" (swirls,
//! spheres, spirals and the like), followed by a second affine map.
//! Applying randomly chosen XForms to a point over and over walks that
//! point all over the attractor, and counting how often it lands in
//! each pixel gives the flame's density, which is the picture.
//!
//! Rendering is split in two, as is traditional: `ffbuf` plays the
//! chaos game and writes the raw visit counts, and `ffgray` tone maps
//! those counts into a grayscale image.  The counts are the expensive
//! part, so keeping them lets one try many tone mappings cheaply.

pub mod error;
pub mod genome;
pub mod histogram;
pub mod optimizer;
pub mod planes;
pub mod random;
pub mod render;
pub mod streams;
pub mod tonemap;
pub mod variations;

pub use crate::error::{FlameError, Result};
pub use crate::genome::FlameModel;
pub use crate::histogram::Histogram;
pub use crate::optimizer::{optimize, OptimizedFlame};
pub use crate::random::{RandomSource, RngKind};
pub use crate::render::{ChaosGame, RenderStats};
pub use crate::tonemap::{Raster, ToneMapper, ToneSettings};
