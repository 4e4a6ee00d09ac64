// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The flame genome: the in-memory model of one fractal, and the JSON
//! document it is read from.
//!
//! Parsing happens in two steps.  `serde` turns the document into a
//! loosely typed mirror of it, which catches missing fields, wrong
//! types and affine lists of the wrong length.  Then every field is
//! converted and range-checked into a `FlameModel`, where a failure is
//! reported with the path of the offending field.

use crate::error::{FlameError, Result};
use crate::planes::Point;
use crate::variations::{self, Variation};
use num::Complex;
use serde::Deserialize;
use std::convert::TryFrom;
use std::io::Read;

/// Canvas dimensions must be strictly below this.
pub const MAX_DIMENSION: usize = 100_000;

/// Viewport coordinates must lie strictly between `-MAX_COORDINATE`
/// and `MAX_COORDINATE`.
pub const MAX_COORDINATE: f64 = 1e5;

/// A 2×3 affine map: `x' = a·x + c·y + e`, `y' = b·x + d·y + f`.
#[allow(missing_docs)]
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Affine {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Affine {
    /// The map that leaves every point where it is.
    pub const IDENTITY: Affine = Affine {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    /// Build from coefficients in genome order: a, b, c, d, e, f.
    pub fn from_coefficients(k: [f64; 6]) -> Affine {
        Affine {
            a: k[0],
            b: k[1],
            c: k[2],
            d: k[3],
            e: k[4],
            f: k[5],
        }
    }

    /// The coefficients in genome order.
    pub fn coefficients(&self) -> [f64; 6] {
        [self.a, self.b, self.c, self.d, self.e, self.f]
    }

    /// Apply the map to a point.
    #[inline]
    pub fn apply(&self, p: Point) -> Point {
        Complex::new(
            self.a * p.re + self.c * p.im + self.e,
            self.b * p.re + self.d * p.im + self.f,
        )
    }
}

/// The rectangle of the real plane that ends up on the canvas.
#[allow(missing_docs)]
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Viewport {
    pub xmin: f64,
    pub xmax: f64,
    pub ymin: f64,
    pub ymax: f64,
}

/// One weighted branch of the function system.
#[derive(Clone, Debug, PartialEq)]
pub struct XForm {
    /// Relative probability of this branch being picked.
    pub weight: f64,
    /// Applied before the variations.
    pub pre_affine: Affine,
    /// Applied to the blended variation output.
    pub post_affine: Affine,
    /// The variations, blended by weight.
    pub variations: Vec<(Variation, f64)>,
}

impl XForm {
    /// A branch with identity affines.
    pub fn new(weight: f64, variations: Vec<(Variation, f64)>) -> XForm {
        XForm {
            weight,
            pre_affine: Affine::IDENTITY,
            post_affine: Affine::IDENTITY,
            variations,
        }
    }
}

/// A complete flame, ready to be optimized and rendered.
#[derive(Clone, Debug, PartialEq)]
pub struct FlameModel {
    /// Free-form name from the genome.
    pub name: String,
    /// Canvas width in pixels.
    pub width: usize,
    /// Canvas height in pixels.
    pub height: usize,
    /// The rendered region.
    pub viewport: Viewport,
    /// Number of plotted iterations requested.
    pub samples: u64,
    /// The branches, in declaration order.
    pub xforms: Vec<XForm>,
}

#[derive(Deserialize)]
struct RawVariation {
    name: String,
    weight: f64,
}

#[derive(Deserialize)]
struct RawXForm {
    weight: f64,
    variations: Vec<RawVariation>,
    pre_affine: [f64; 6],
    post_affine: [f64; 6],
}

#[derive(Deserialize)]
struct RawGenome {
    name: String,
    size_x: i64,
    size_y: i64,
    samples: i64,
    xmin: f64,
    xmax: f64,
    ymin: f64,
    ymax: f64,
    xforms: Vec<RawXForm>,
}

/// Convert a signed genome integer into a canvas dimension, refusing
/// anything that is not in `1..MAX_DIMENSION`.
pub fn checked_dimension(value: i64, path: &str) -> Result<usize> {
    usize::try_from(value)
        .ok()
        .filter(|&d| d > 0 && d < MAX_DIMENSION)
        .ok_or_else(|| {
            FlameError::structural(
                path,
                format!(
                    "should be between 0 and {} (exclusive), got {}",
                    MAX_DIMENSION, value
                ),
            )
        })
}

fn checked_coordinate(value: f64, path: &str) -> Result<f64> {
    if value.is_finite() && value > -MAX_COORDINATE && value < MAX_COORDINATE {
        Ok(value)
    } else {
        Err(FlameError::structural(
            path,
            format!(
                "should be between {:+} and {:+} (exclusive), got {}",
                -MAX_COORDINATE, MAX_COORDINATE, value
            ),
        ))
    }
}

fn convert_xform(raw: RawXForm, index: usize) -> Result<XForm> {
    let variations = raw
        .variations
        .into_iter()
        .enumerate()
        .map(|(vi, var)| {
            variations::lookup(&var.name)
                .map(|v| (v, var.weight))
                .ok_or_else(|| {
                    FlameError::structural(
                        format!("xforms[{}].variations[{}].name", index, vi),
                        format!("no variation called \"{}\"", var.name),
                    )
                })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(XForm {
        weight: raw.weight,
        pre_affine: Affine::from_coefficients(raw.pre_affine),
        post_affine: Affine::from_coefficients(raw.post_affine),
        variations,
    })
}

impl FlameModel {
    /// Parse and validate a genome document.
    pub fn from_json(text: &str) -> Result<FlameModel> {
        let raw: RawGenome = serde_json::from_str(text)?;
        FlameModel::from_raw(raw)
    }

    /// Parse and validate a genome document from a stream.
    pub fn from_reader<R: Read>(reader: R) -> Result<FlameModel> {
        let raw: RawGenome = serde_json::from_reader(reader)?;
        FlameModel::from_raw(raw)
    }

    fn from_raw(raw: RawGenome) -> Result<FlameModel> {
        let samples = u64::try_from(raw.samples)
            .ok()
            .filter(|&s| s > 0)
            .ok_or_else(|| {
                FlameError::structural("samples", format!("must be positive, got {}", raw.samples))
            })?;
        let flame = FlameModel {
            name: raw.name,
            width: checked_dimension(raw.size_x, "size_x")?,
            height: checked_dimension(raw.size_y, "size_y")?,
            viewport: Viewport {
                xmin: checked_coordinate(raw.xmin, "xmin")?,
                xmax: checked_coordinate(raw.xmax, "xmax")?,
                ymin: checked_coordinate(raw.ymin, "ymin")?,
                ymax: checked_coordinate(raw.ymax, "ymax")?,
            },
            samples,
            xforms: raw
                .xforms
                .into_iter()
                .enumerate()
                .map(|(i, xf)| convert_xform(xf, i))
                .collect::<Result<Vec<_>>>()?,
        };
        flame.validate()?;
        Ok(flame)
    }

    /// Check the invariants a render relies on.  A genome read through
    /// `from_json` has passed this already; a model assembled by hand
    /// is checked again by the optimizer.
    pub fn validate(&self) -> Result<()> {
        checked_dimension(self.width as i64, "size_x")?;
        checked_dimension(self.height as i64, "size_y")?;
        checked_coordinate(self.viewport.xmin, "xmin")?;
        checked_coordinate(self.viewport.xmax, "xmax")?;
        checked_coordinate(self.viewport.ymin, "ymin")?;
        checked_coordinate(self.viewport.ymax, "ymax")?;
        if !(self.viewport.xmin < self.viewport.xmax) {
            return Err(FlameError::structural("xmax", "must be greater than xmin"));
        }
        if !(self.viewport.ymin < self.viewport.ymax) {
            return Err(FlameError::structural("ymax", "must be greater than ymin"));
        }
        if self.samples == 0 {
            return Err(FlameError::structural("samples", "must be positive"));
        }
        if self.xforms.is_empty() {
            return Err(FlameError::structural("xforms", "is empty"));
        }
        for (i, xf) in self.xforms.iter().enumerate() {
            if !(xf.weight > 0.0 && xf.weight.is_finite()) {
                return Err(FlameError::structural(
                    format!("xforms[{}].weight", i),
                    format!("must be positive, got {}", xf.weight),
                ));
            }
            if xf.variations.is_empty() {
                return Err(FlameError::structural(
                    format!("xforms[{}].variations", i),
                    "is empty",
                ));
            }
            for (vi, &(_, w)) in xf.variations.iter().enumerate() {
                if !w.is_finite() {
                    return Err(FlameError::structural(
                        format!("xforms[{}].variations[{}].weight", i, vi),
                        "must be finite",
                    ));
                }
            }
            for (field, affine) in &[("pre_affine", xf.pre_affine), ("post_affine", xf.post_affine)] {
                if let Some(k) = affine.coefficients().iter().position(|c| !c.is_finite()) {
                    return Err(FlameError::structural(
                        format!("xforms[{}].{}[{}]", i, field, k),
                        "must be finite",
                    ));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const SIERPINSKI: &str = r#"{
        "name": "sierpinski",
        "size_x": 64,
        "size_y": 48,
        "samples": 20000,
        "xmin": -0.1, "xmax": 1.1, "ymin": -0.1, "ymax": 1.1,
        "xforms": [
            {"weight": 1.0, "variations": [{"name": "linear", "weight": 1.0}],
             "pre_affine": [0.5, 0.0, 0.0, 0.5, 0.0, 0.0],
             "post_affine": [1.0, 0.0, 0.0, 1.0, 0.0, 0.0]},
            {"weight": 1.0, "variations": [{"name": "linear", "weight": 1.0}],
             "pre_affine": [0.5, 0.0, 0.0, 0.5, 0.5, 0.0],
             "post_affine": [1.0, 0.0, 0.0, 1.0, 0.0, 0.0]},
            {"weight": 2.0, "variations": [{"name": "linear", "weight": 0.75},
                                           {"name": "spherical", "weight": 0.25}],
             "pre_affine": [0.5, 0.0, 0.0, 0.5, 0.0, 0.5],
             "post_affine": [1.0, 0.0, 0.0, 1.0, 0.0, 0.0]}
        ]
    }"#;

    fn edited(from: &str, to: &str) -> String {
        assert!(SIERPINSKI.contains(from), "fixture lacks {}", from);
        SIERPINSKI.replacen(from, to, 1)
    }

    fn structural_path(text: &str) -> String {
        match FlameModel::from_json(text) {
            Err(FlameError::Structural { path, .. }) => path,
            other => panic!("expected a structural error, got {:?}", other),
        }
    }

    #[test]
    fn parses_a_complete_genome() {
        let flame = FlameModel::from_json(SIERPINSKI).unwrap();
        assert_eq!(flame.name, "sierpinski");
        assert_eq!((flame.width, flame.height), (64, 48));
        assert_eq!(flame.samples, 20000);
        assert_eq!(flame.viewport.xmax, 1.1);
        assert_eq!(flame.xforms.len(), 3);
        assert_eq!(flame.xforms[1].pre_affine.e, 0.5);
        assert_eq!(flame.xforms[2].pre_affine.f, 0.5);
        assert_eq!(
            flame.xforms[2].variations,
            vec![(Variation::Linear, 0.75), (Variation::Spherical, 0.25)]
        );
    }

    #[test]
    fn reads_from_a_stream_too() {
        let flame = FlameModel::from_reader(SIERPINSKI.as_bytes()).unwrap();
        assert_eq!(flame, FlameModel::from_json(SIERPINSKI).unwrap());
    }

    #[test]
    fn missing_or_mistyped_fields_are_parse_errors() {
        for bad in &[
            edited("\"samples\": 20000,", ""),
            edited("\"size_x\": 64", "\"size_x\": \"64\""),
            edited("\"size_x\": 64", "\"size_x\": 64.5"),
            edited("[0.5, 0.0, 0.0, 0.5, 0.0, 0.0]", "[0.5, 0.0, 0.0, 0.5, 0.0]"),
            "not json at all".to_string(),
        ] {
            match FlameModel::from_json(bad) {
                Err(FlameError::Parse(_)) => (),
                other => panic!("expected a parse error, got {:?}", other),
            }
        }
    }

    #[test]
    fn dimensions_are_range_checked_not_reinterpreted() {
        assert_eq!(structural_path(&edited("\"size_x\": 64", "\"size_x\": -64")), "size_x");
        assert_eq!(structural_path(&edited("\"size_y\": 48", "\"size_y\": 0")), "size_y");
        assert_eq!(
            structural_path(&edited("\"size_y\": 48", "\"size_y\": 100000")),
            "size_y"
        );
        assert!(FlameModel::from_json(&edited("\"size_y\": 48", "\"size_y\": 99999")).is_ok());
        assert_eq!(
            structural_path(&edited("\"samples\": 20000", "\"samples\": -1")),
            "samples"
        );
    }

    #[test]
    fn viewport_must_be_in_range_and_ordered() {
        assert_eq!(structural_path(&edited("\"xmin\": -0.1", "\"xmin\": -1e6")), "xmin");
        assert_eq!(structural_path(&edited("\"xmax\": 1.1", "\"xmax\": -0.5")), "xmax");
        assert_eq!(structural_path(&edited("\"ymax\": 1.1", "\"ymax\": -0.1")), "ymax");
    }

    #[test]
    fn xform_problems_name_the_xform() {
        assert_eq!(
            structural_path(&edited("{\"weight\": 1.0", "{\"weight\": 0.0")),
            "xforms[0].weight"
        );
        assert_eq!(
            structural_path(&edited("{\"weight\": 2.0", "{\"weight\": -2.0")),
            "xforms[2].weight"
        );
        assert_eq!(
            structural_path(&edited("\"spherical\"", "\"julia\"")),
            "xforms[2].variations[1].name"
        );
        assert_eq!(
            structural_path(&edited(
                "\"variations\": [{\"name\": \"linear\", \"weight\": 1.0}]",
                "\"variations\": []"
            )),
            "xforms[0].variations"
        );
    }

    #[test]
    fn an_empty_xform_list_is_rejected() {
        let text = r#"{"name": "empty", "size_x": 4, "size_y": 4, "samples": 10,
            "xmin": -1, "xmax": 1, "ymin": -1, "ymax": 1, "xforms": []}"#;
        assert_eq!(structural_path(text), "xforms");
    }

    #[test]
    fn extra_fields_are_ignored() {
        let text = edited("\"name\": \"sierpinski\",", "\"name\": \"s\", \"scale_func\": \"log\",");
        assert!(FlameModel::from_json(&text).is_ok());
    }

    #[test]
    fn affines_apply_in_genome_order() {
        let aff = Affine::from_coefficients([1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(aff.apply(Complex::new(1.0, 1.0)), Complex::new(9.0, 12.0));
        assert_eq!(Affine::IDENTITY.apply(Complex::new(0.3, -2.0)), Complex::new(0.3, -2.0));
        assert_eq!(aff.coefficients(), [1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn validate_catches_hand_built_models() {
        let mut flame = FlameModel::from_json(SIERPINSKI).unwrap();
        flame.xforms[0].pre_affine.c = std::f64::NAN;
        match flame.validate() {
            Err(FlameError::Structural { path, .. }) => assert_eq!(path, "xforms[0].pre_affine[2]"),
            other => panic!("unexpected {:?}", other),
        }
    }
}
