// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The chaos game.
//!
//! A single point wanders the plane.  At every step one XForm is picked
//! at random, in proportion to its weight, and the point is replaced by
//! its image under that XForm.  After a short warm-up (the "fuse") the
//! point has settled onto the attractor, and from then on each step
//! lands somewhere on it: mapping that location to a pixel and counting
//! the visit, over millions of steps, paints the attractor's density.
//!
//! A point that runs off toward infinity, or becomes NaN, is abandoned
//! and a fresh one is dropped into the seed square.  That step is not
//! plotted, and nothing about the runaway survives into later steps.

use crate::error::{FlameError, Result};
use crate::histogram::Histogram;
use crate::optimizer::OptimizedFlame;
use crate::planes::{PlaneMapper, Point};
use crate::random::{split_seeds, RandomSource, RngKind};
use num::Complex;
use tracing::{debug, info};

/// Warm-up iterations run before plotting starts, and never counted.
pub const FUSE_ITERATIONS: usize = 20;

/// A coordinate whose magnitude exceeds this has escaped.
pub const BAILOUT: f64 = 1e10;

/// Lower and upper bound of both coordinates of a fresh seed point.
pub const SEED_DOMAIN: (f64, f64) = (-1.0, 1.0);

/// Where every one of a render's samples went.  The three always add
/// up to the flame's sample budget.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Counted in the histogram.
    pub plotted: u64,
    /// Finite, but outside the viewport.
    pub out_of_frame: u64,
    /// Escaped the bailout radius or went non-finite; the point was
    /// reseeded.
    pub diverged: u64,
}

impl RenderStats {
    /// Every sample accounted for.
    pub fn total(&self) -> u64 {
        self.plotted + self.out_of_frame + self.diverged
    }

    fn absorb(&mut self, other: RenderStats) {
        self.plotted += other.plotted;
        self.out_of_frame += other.out_of_frame;
        self.diverged += other.diverged;
    }
}

/// Renders an optimized flame into a histogram.
pub struct ChaosGame {
    flame: OptimizedFlame,
    plane: PlaneMapper,
}

#[inline]
fn seed_point<R: RandomSource + ?Sized>(rng: &mut R) -> Point {
    let (lo, hi) = SEED_DOMAIN;
    let x = lo + rng.next_uniform() * (hi - lo);
    let y = lo + rng.next_uniform() * (hi - lo);
    Complex::new(x, y)
}

#[inline]
fn escaped(p: Point) -> bool {
    // false for NaN on both sides, so NaN escapes too
    !(p.re.abs() <= BAILOUT && p.im.abs() <= BAILOUT)
}

impl ChaosGame {
    /// Prepare to render `flame`.
    pub fn new(flame: OptimizedFlame) -> Result<Self> {
        let f = flame.flame();
        let plane = PlaneMapper::new(f.width, f.height, f.viewport)?;
        Ok(ChaosGame { flame, plane })
    }

    /// The flame being rendered.
    pub fn flame(&self) -> &OptimizedFlame {
        &self.flame
    }

    /// One step of the game: pick an XForm and apply it.
    #[inline]
    fn step<R: RandomSource + ?Sized>(&self, rng: &mut R, p: Point) -> Point {
        let u = rng.next_uniform() * self.flame.total_weight();
        self.flame.transform(self.flame.select(u), p)
    }

    /// A step plus the divergence guard.  An escaped image is dropped
    /// and a fresh seed point takes its place; the flag says which
    /// happened.
    #[inline]
    fn advance<R: RandomSource + ?Sized>(&self, rng: &mut R, p: Point) -> (Point, bool) {
        let next = self.step(rng, p);
        if escaped(next) {
            (seed_point(rng), true)
        } else {
            (next, false)
        }
    }

    /// Run the game for the flame's full sample budget.
    pub fn render<R: RandomSource + ?Sized>(&self, rng: &mut R) -> Histogram {
        self.render_with_stats(rng).0
    }

    /// As `render`, also reporting where the samples went.
    pub fn render_with_stats<R: RandomSource + ?Sized>(
        &self,
        rng: &mut R,
    ) -> (Histogram, RenderStats) {
        self.render_samples(rng, self.flame.flame().samples)
    }

    fn render_samples<R: RandomSource + ?Sized>(
        &self,
        rng: &mut R,
        samples: u64,
    ) -> (Histogram, RenderStats) {
        let f = self.flame.flame();
        let mut histogram = Histogram::new(f.width, f.height);
        let mut stats = RenderStats::default();

        let mut point = seed_point(rng);
        for _ in 0..FUSE_ITERATIONS {
            point = self.advance(rng, point).0;
        }

        for _ in 0..samples {
            let (next, diverged) = self.advance(rng, point);
            point = next;
            if diverged {
                stats.diverged += 1;
                continue;
            }
            match self.plane.point_to_offset(&point) {
                Some(offset) => {
                    histogram.increment(offset);
                    stats.plotted += 1;
                }
                None => stats.out_of_frame += 1,
            }
        }

        debug!(
            samples,
            plotted = stats.plotted,
            out_of_frame = stats.out_of_frame,
            diverged = stats.diverged,
            "chaos game finished"
        );
        (histogram, stats)
    }

    /// Split the sample budget over `threads` workers, each with its own
    /// generator of the given kind and its own histogram, and sum the
    /// results.  Worker seeds are derived from `seed`, except that a
    /// single worker uses `seed` itself and so matches `render` exactly.
    pub fn render_threaded(
        &self,
        kind: RngKind,
        seed: u64,
        threads: usize,
    ) -> Result<(Histogram, RenderStats)> {
        if threads == 0 {
            return Err(FlameError::InvalidArgument(
                "at least one render thread is needed".to_string(),
            ));
        }
        if threads == 1 {
            let mut rng = kind.build(seed);
            return Ok(self.render_with_stats(&mut *rng));
        }

        let total = self.flame.flame().samples;
        let per_worker = total / threads as u64;
        let extra = (total % threads as u64) as usize;
        let seeds = split_seeds(seed, threads);
        info!(threads, generator = %kind, "rendering in parallel");

        let results = crossbeam::scope(|spawner| {
            let handles: Vec<_> = seeds
                .iter()
                .enumerate()
                .map(|(i, &worker_seed)| {
                    let samples = per_worker + if i < extra { 1 } else { 0 };
                    spawner.spawn(move |_| {
                        debug!(worker = i, samples, "worker starting");
                        let mut rng = kind.build(worker_seed);
                        self.render_samples(&mut *rng, samples)
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|handle| handle.join().map_err(|_| FlameError::Worker))
                .collect::<Result<Vec<_>>>()
        })
        .map_err(|_| FlameError::Worker)??;

        let f = self.flame.flame();
        let mut histogram = Histogram::new(f.width, f.height);
        let mut stats = RenderStats::default();
        for (region, region_stats) in &results {
            histogram.merge(region)?;
            stats.absorb(*region_stats);
        }
        Ok((histogram, stats))
    }
}
