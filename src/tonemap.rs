// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Turning visit counts into a grayscale image.
//!
//! Counts span many orders of magnitude, so they are first compressed
//! by a scaling function, then stretched so the largest scaled value
//! hits full white.  The image is written top row first, which is the
//! `ymax` edge of the viewport and therefore the *last* histogram row.

use crate::error::{FlameError, Result};
use crate::genome::checked_dimension;
use crate::histogram::Histogram;
use image::png::PNGEncoder;
use image::pnm::{GraymapHeader, PNMEncoder, PNMHeader, PNMSubtype, SampleEncoding};
use image::ColorType;
use num::clamp;
use serde::Deserialize;
use std::fmt;
use std::io::{self, Read, Write};
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

/// A compression curve applied to every count.  Each maps `[0, ∞)` to
/// `[0, ∞)`, never decreases, and sends 0 to 0.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Scale {
    /// `x`
    Linear,
    /// 1 for any visit, 0 otherwise.
    Binary,
    /// `ln(1 + x)`
    Log,
    /// `ln(1 + ln(1 + x))`
    LogLog,
    /// `ln(1 + x)²`
    Log2,
    /// `ln(1 + x)³`
    Log3,
    /// `√(1 + x) − 1`
    Sqrt,
    /// `∛(1 + x) − 1`
    Cbrt,
    /// `atan(1 + x) − atan(1)`
    Atan,
    /// `x / (x + 1)`
    Ratio,
}

impl Scale {
    /// Every scale, in the order they are listed to users.
    pub const ALL: [Scale; 10] = [
        Scale::Linear,
        Scale::Binary,
        Scale::Log,
        Scale::LogLog,
        Scale::Log2,
        Scale::Log3,
        Scale::Sqrt,
        Scale::Cbrt,
        Scale::Atan,
        Scale::Ratio,
    ];

    /// The name used in genomes and on the command line.
    pub fn name(self) -> &'static str {
        match self {
            Scale::Linear => "linear",
            Scale::Binary => "binary",
            Scale::Log => "log",
            Scale::LogLog => "loglog",
            Scale::Log2 => "log2",
            Scale::Log3 => "log3",
            Scale::Sqrt => "sqrt",
            Scale::Cbrt => "cbrt",
            Scale::Atan => "atan",
            Scale::Ratio => "ratio",
        }
    }

    /// Apply the curve.
    pub fn apply(self, x: f64) -> f64 {
        match self {
            Scale::Linear => x,
            Scale::Binary => {
                if x > 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
            Scale::Log => x.ln_1p(),
            Scale::LogLog => x.ln_1p().ln_1p(),
            Scale::Log2 => x.ln_1p().powi(2),
            Scale::Log3 => x.ln_1p().powi(3),
            Scale::Sqrt => (1.0 + x).sqrt() - 1.0,
            Scale::Cbrt => (1.0 + x).cbrt() - 1.0,
            Scale::Atan => (1.0 + x).atan() - 1.0f64.atan(),
            Scale::Ratio => x / (x + 1.0),
        }
    }
}

impl fmt::Display for Scale {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Scale {
    type Err = FlameError;

    fn from_str(s: &str) -> Result<Scale> {
        Scale::ALL
            .iter()
            .cloned()
            .find(|scale| scale.name() == s)
            .ok_or_else(|| FlameError::UnknownScale(s.to_string()))
    }
}

/// Bits per output sample.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BitDepth {
    /// 0 to 255.
    Eight,
    /// 0 to 65535, stored big-endian.
    Sixteen,
}

impl BitDepth {
    /// The brightest representable sample.
    pub fn full_scale(self) -> u16 {
        match self {
            BitDepth::Eight => 255,
            BitDepth::Sixteen => 65535,
        }
    }

    fn color_type(self) -> ColorType {
        match self {
            BitDepth::Eight => ColorType::Gray(8),
            BitDepth::Sixteen => ColorType::Gray(16),
        }
    }
}

impl FromStr for BitDepth {
    type Err = FlameError;

    fn from_str(s: &str) -> Result<BitDepth> {
        match s {
            "8" => Ok(BitDepth::Eight),
            "16" => Ok(BitDepth::Sixteen),
            _ => Err(FlameError::InvalidArgument(format!(
                "bit depth must be 8 or 16, not {}",
                s
            ))),
        }
    }
}

/// Container format of the written image.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ImageFormat {
    /// Binary portable graymap (`P5`).
    Pgm,
    /// PNG.
    Png,
}

impl ImageFormat {
    /// Guess from a file name: `.png` means PNG, anything else
    /// (including standard output) means PGM.
    pub fn from_path(path: &str) -> ImageFormat {
        match Path::new(path).extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("png") => ImageFormat::Png,
            _ => ImageFormat::Pgm,
        }
    }
}

impl FromStr for ImageFormat {
    type Err = FlameError;

    fn from_str(s: &str) -> Result<ImageFormat> {
        match s {
            "pgm" => Ok(ImageFormat::Pgm),
            "png" => Ok(ImageFormat::Png),
            _ => Err(FlameError::InvalidArgument(format!(
                "image format must be pgm or png, not {}",
                s
            ))),
        }
    }
}

/// A grayscale image, rows top to bottom.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Raster {
    /// Width in pixels.
    pub width: usize,
    /// Height in pixels.
    pub height: usize,
    /// Sample size.
    pub depth: BitDepth,
    /// One sample per pixel, never above `depth.full_scale()`.
    pub samples: Vec<u16>,
}

impl Raster {
    /// The samples as the image formats store them: one byte each at
    /// 8 bits, two big-endian bytes each at 16.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self.depth {
            BitDepth::Eight => self.samples.iter().map(|&s| s as u8).collect(),
            BitDepth::Sixteen => self.samples.iter().flat_map(|s| s.to_be_bytes().to_vec()).collect(),
        }
    }

    /// Write a binary PGM.  The graymap subtype alone only admits 8-bit
    /// samples, so the 16-bit header is spelled out with its range.
    pub fn write_pgm<W: Write>(&self, out: W) -> io::Result<()> {
        let (w, h) = (self.width as u32, self.height as u32);
        match self.depth {
            BitDepth::Eight => PNMEncoder::new(out)
                .with_subtype(PNMSubtype::Graymap(SampleEncoding::Binary))
                .encode(&self.to_bytes()[..], w, h, self.depth.color_type()),
            BitDepth::Sixteen => {
                let header = GraymapHeader {
                    encoding: SampleEncoding::Binary,
                    width: w,
                    height: h,
                    maxwhite: u32::from(self.depth.full_scale()),
                };
                PNMEncoder::new(out)
                    .with_header(PNMHeader::from(header))
                    .encode(&self.samples[..], w, h, self.depth.color_type())
            }
        }
    }

    /// Write a PNG.
    pub fn write_png<W: Write>(&self, out: W) -> io::Result<()> {
        PNGEncoder::new(out).encode(
            &self.to_bytes(),
            self.width as u32,
            self.height as u32,
            self.depth.color_type(),
        )
    }

    /// Write in the given format.
    pub fn encode<W: Write>(&self, out: W, format: ImageFormat) -> io::Result<()> {
        match format {
            ImageFormat::Pgm => self.write_pgm(out),
            ImageFormat::Png => self.write_png(out),
        }
    }
}

/// Histogram to raster conversion.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ToneMapper {
    /// Compression curve.
    pub scale: Scale,
    /// When false, the smallest count is subtracted before scaling, so
    /// the least visited pixel is black even if it was visited.
    pub scale_zero: bool,
    /// Output sample size.
    pub depth: BitDepth,
}

impl ToneMapper {
    /// Map every count.  The largest scaled value becomes full scale;
    /// if every scaled value is zero the image is black.
    pub fn map(&self, histogram: &Histogram) -> Raster {
        let (width, height) = (histogram.width(), histogram.height());
        let stats = histogram.stats();
        let floor = if self.scale_zero { 0 } else { stats.min };
        let scaled: Vec<f64> = histogram
            .counts()
            .iter()
            .map(|&c| self.scale.apply(f64::from(c - floor)))
            .collect();
        let peak = scaled.iter().cloned().fold(0.0, f64::max);
        let full = self.depth.full_scale();

        // one step past full scale, truncated, so the peak lands on it
        let mult = if peak > 0.0 {
            (f64::from(full) + 1.0) / peak
        } else {
            0.0
        };
        debug!(
            scale = %self.scale,
            min = stats.min,
            max = stats.max,
            peak,
            "tone mapping"
        );

        let mut samples = Vec::with_capacity(width * height);
        for row in scaled.chunks(width.max(1)).rev() {
            samples.extend(
                row.iter()
                    .map(|&v| clamp((v * mult).floor(), 0.0, f64::from(full)) as u16),
            );
        }
        Raster {
            width,
            height,
            depth: self.depth,
            samples,
        }
    }
}

#[derive(Deserialize)]
struct RawToneSettings {
    size_x: i64,
    size_y: i64,
    #[serde(default = "default_scale_func")]
    scale_func: String,
    #[serde(default = "default_scale_zero")]
    scale_zero: bool,
}

fn default_scale_func() -> String {
    Scale::Log.name().to_string()
}

fn default_scale_zero() -> bool {
    true
}

/// The parts of a genome document that tone mapping reads.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ToneSettings {
    /// Histogram width.
    pub width: usize,
    /// Histogram height.
    pub height: usize,
    /// `scale_func`, `log` when absent.
    pub scale: Scale,
    /// `scale_zero`, true when absent.
    pub scale_zero: bool,
}

impl ToneSettings {
    /// Read the settings out of a genome document.  Everything else in
    /// the document is ignored, so an unrenderable genome still tone
    /// maps as long as its size is sane.
    pub fn from_json(text: &str) -> Result<ToneSettings> {
        ToneSettings::from_raw(serde_json::from_str(text)?)
    }

    /// As `from_json`, from a stream.
    pub fn from_reader<R: Read>(reader: R) -> Result<ToneSettings> {
        ToneSettings::from_raw(serde_json::from_reader(reader)?)
    }

    fn from_raw(raw: RawToneSettings) -> Result<ToneSettings> {
        Ok(ToneSettings {
            width: checked_dimension(raw.size_x, "size_x")?,
            height: checked_dimension(raw.size_y, "size_y")?,
            scale: raw.scale_func.parse()?,
            scale_zero: raw.scale_zero,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genome::tests::SIERPINSKI;

    fn mapper(scale: Scale, scale_zero: bool, depth: BitDepth) -> ToneMapper {
        ToneMapper {
            scale,
            scale_zero,
            depth,
        }
    }

    #[test]
    fn scales_start_at_zero_and_never_decrease() {
        for &scale in &Scale::ALL {
            assert_eq!(scale.apply(0.0), 0.0, "{}", scale);
            let mut last = 0.0;
            for x in 0..=10_000 {
                let y = scale.apply(f64::from(x));
                assert!(y >= last, "{} decreases at {}", scale, x);
                assert!(y.is_finite());
                last = y;
            }
        }
    }

    #[test]
    fn scales_parse_by_name() {
        for &scale in &Scale::ALL {
            assert_eq!(scale.name().parse::<Scale>().unwrap(), scale);
        }
        match "gamma".parse::<Scale>() {
            Err(FlameError::UnknownScale(name)) => assert_eq!(name, "gamma"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn top_row_comes_first() {
        let h = Histogram::from_counts(2, 2, vec![0, 1, 2, 3]).unwrap();
        let raster = mapper(Scale::Linear, true, BitDepth::Eight).map(&h);
        assert_eq!(raster.samples, vec![170, 255, 0, 85]);
    }

    #[test]
    fn scale_zero_off_subtracts_the_minimum() {
        let h = Histogram::from_counts(2, 2, vec![5, 6, 7, 8]).unwrap();
        let raster = mapper(Scale::Linear, false, BitDepth::Eight).map(&h);
        assert_eq!(raster.samples, vec![170, 255, 0, 85]);
        let kept = mapper(Scale::Linear, true, BitDepth::Eight).map(&h);
        assert!(kept.samples.iter().all(|&s| s > 0));
    }

    #[test]
    fn empty_histograms_stay_black() {
        let h = Histogram::new(4, 3);
        for &scale in &Scale::ALL {
            let raster = mapper(scale, true, BitDepth::Sixteen).map(&h);
            assert!(raster.samples.iter().all(|&s| s == 0));
        }
        let flat = Histogram::from_counts(2, 1, vec![9, 9]).unwrap();
        assert_eq!(
            mapper(Scale::Log, false, BitDepth::Eight).map(&flat).samples,
            vec![0, 0]
        );
    }

    #[test]
    fn sixteen_bit_samples_are_big_endian() {
        let h = Histogram::from_counts(2, 1, vec![0, 40]).unwrap();
        let raster = mapper(Scale::Sqrt, true, BitDepth::Sixteen).map(&h);
        assert_eq!(raster.samples, vec![0, 65535]);
        assert_eq!(raster.to_bytes(), vec![0, 0, 0xff, 0xff]);
    }

    #[test]
    fn the_peak_is_full_white_for_every_scale() {
        let h = Histogram::from_counts(3, 1, vec![1, 17, 123_456]).unwrap();
        for &scale in &Scale::ALL {
            let raster = mapper(scale, true, BitDepth::Eight).map(&h);
            assert_eq!(*raster.samples.iter().max().unwrap(), 255, "{}", scale);
        }
    }

    #[test]
    fn pgm_output_has_a_p5_header() {
        let h = Histogram::from_counts(2, 1, vec![0, 3]).unwrap();
        let raster = mapper(Scale::Linear, true, BitDepth::Eight).map(&h);
        let mut out = Vec::new();
        raster.encode(&mut out, ImageFormat::Pgm).unwrap();
        assert!(out.starts_with(b"P5"));
        assert!(out.ends_with(&[0, 255]));
    }

    #[test]
    fn sixteen_bit_pgm_declares_its_range() {
        let h = Histogram::from_counts(2, 1, vec![1, 256]).unwrap();
        let raster = mapper(Scale::Linear, true, BitDepth::Sixteen).map(&h);
        assert_eq!(raster.samples, vec![256, 65535]);
        let mut out = Vec::new();
        raster.encode(&mut out, ImageFormat::Pgm).unwrap();
        let mut expected = b"P5\n2 1\n65535\n".to_vec();
        expected.extend_from_slice(&[1, 0, 255, 255]);
        assert_eq!(out, expected);
    }

    #[test]
    fn png_output_has_a_png_signature() {
        let h = Histogram::from_counts(2, 2, vec![0, 3, 1, 2]).unwrap();
        let raster = mapper(Scale::Log, true, BitDepth::Sixteen).map(&h);
        let mut out = Vec::new();
        raster.encode(&mut out, ImageFormat::Png).unwrap();
        assert!(out.starts_with(&[0x89, b'P', b'N', b'G']));
    }

    #[test]
    fn formats_follow_the_extension() {
        assert_eq!(ImageFormat::from_path("out.png"), ImageFormat::Png);
        assert_eq!(ImageFormat::from_path("OUT.PNG"), ImageFormat::Png);
        assert_eq!(ImageFormat::from_path("out.pgm"), ImageFormat::Pgm);
        assert_eq!(ImageFormat::from_path("-"), ImageFormat::Pgm);
        assert!("tiff".parse::<ImageFormat>().is_err());
        assert_eq!("16".parse::<BitDepth>().unwrap(), BitDepth::Sixteen);
        assert!("12".parse::<BitDepth>().is_err());
    }

    #[test]
    fn settings_default_to_log_with_zero() {
        let settings = ToneSettings::from_json(SIERPINSKI).unwrap();
        assert_eq!(
            settings,
            ToneSettings {
                width: 64,
                height: 48,
                scale: Scale::Log,
                scale_zero: true,
            }
        );
    }

    #[test]
    fn settings_are_read_when_present() {
        let text = r#"{"size_x": 3, "size_y": 2, "scale_func": "cbrt", "scale_zero": false}"#;
        let settings = ToneSettings::from_reader(text.as_bytes()).unwrap();
        assert_eq!(settings.scale, Scale::Cbrt);
        assert!(!settings.scale_zero);

        let unknown = r#"{"size_x": 3, "size_y": 2, "scale_func": "gamma"}"#;
        assert!(ToneSettings::from_json(unknown).is_err());
        let negative = r#"{"size_x": -3, "size_y": 2}"#;
        match ToneSettings::from_json(negative) {
            Err(FlameError::Structural { path, .. }) => assert_eq!(path, "size_x"),
            other => panic!("unexpected {:?}", other),
        }
    }
}
