//! One-time preparation of a flame for rendering.
//!
//! Everything that is the same for every sample is worked out here, so
//! the render loop never allocates, never renormalizes weights and
//! never evaluates a trigonometric function more than once per point.

use crate::error::Result;
use crate::genome::{FlameModel, XForm};
use crate::planes::Point;
use crate::variations::Precalc;
use num::Complex;
use tracing::debug;

/// A validated flame together with its selection table and per-XForm
/// precalc masks.  Immutable once built.
#[derive(Clone, Debug)]
pub struct OptimizedFlame {
    flame: FlameModel,
    selection_cdf: Vec<f64>,
    precalc_masks: Vec<u8>,
}

/// Validate `flame` and derive its iteration-invariant tables.
pub fn optimize(flame: FlameModel) -> Result<OptimizedFlame> {
    flame.validate()?;

    let selection_cdf: Vec<f64> = flame
        .xforms
        .iter()
        .scan(0.0, |total, xf| {
            *total += xf.weight;
            Some(*total)
        })
        .collect();

    let precalc_masks: Vec<u8> = flame
        .xforms
        .iter()
        .map(|xf| xf.variations.iter().fold(0, |mask, (v, _)| mask | v.precalc()))
        .collect();

    debug!(
        name = %flame.name,
        xforms = flame.xforms.len(),
        total_weight = selection_cdf.last().cloned().unwrap_or(0.0),
        "optimized flame"
    );

    Ok(OptimizedFlame {
        flame,
        selection_cdf,
        precalc_masks,
    })
}

impl OptimizedFlame {
    /// The underlying flame.
    pub fn flame(&self) -> &FlameModel {
        &self.flame
    }

    /// Cumulative XForm weights in declaration order.
    pub fn selection_cdf(&self) -> &[f64] {
        &self.selection_cdf
    }

    /// Sum of all XForm weights.
    pub fn total_weight(&self) -> f64 {
        // validation guarantees at least one xform
        self.selection_cdf[self.selection_cdf.len() - 1]
    }

    /// The union of the precalc flags of XForm `index`'s variations.
    pub fn precalc_mask(&self, index: usize) -> u8 {
        self.precalc_masks[index]
    }

    /// The XForm picked by a draw `u` in `[0, total_weight)`: the first
    /// one whose cumulative weight exceeds `u`.  Draws at or past the
    /// total, which rounding can produce, go to the last XForm.
    #[inline]
    pub fn select(&self, u: f64) -> usize {
        let i = self.selection_cdf.partition_point(|&c| c <= u);
        i.min(self.selection_cdf.len() - 1)
    }

    /// Push a point through XForm `index`: pre-affine, the weighted
    /// blend of its variations over one shared precalc, post-affine.
    #[inline]
    pub fn transform(&self, index: usize, p: Point) -> Point {
        let xf: &XForm = &self.flame.xforms[index];
        let t = xf.pre_affine.apply(p);
        let pc = Precalc::compute(t, self.precalc_masks[index]);
        let blended = xf
            .variations
            .iter()
            .fold(Complex::new(0.0, 0.0), |acc, &(v, w)| acc + v.apply(t, &pc) * w);
        xf.post_affine.apply(blended)
    }
}
