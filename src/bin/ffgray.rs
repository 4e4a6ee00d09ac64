// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use clap::{App, Arg, ArgMatches};
use flamebuf::streams::{create_output, open_input, STANDARD_STREAM};
use flamebuf::tonemap::{BitDepth, ImageFormat, Scale};
use flamebuf::{FlameError, Histogram, ToneMapper, ToneSettings};
use std::io::Write;
use std::str::FromStr;
use tracing::info;
use tracing_subscriber::EnvFilter;

const GENOME: &str = "genome";
const BUFFER: &str = "buffer";
const OUTPUT: &str = "output";
const SCALE: &str = "scale";
const SCALE_ZERO: &str = "scale-zero";
const DEPTH: &str = "depth";
const FORMAT: &str = "format";

fn args<'a>() -> ArgMatches<'a> {
    let scales: Vec<&'static str> = Scale::ALL.iter().map(|s| s.name()).collect();

    App::new("ffgray")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Render a grayscale image from a flame frequency buffer")
        .arg(
            Arg::with_name(GENOME)
                .required(true)
                .index(1)
                .help("Genome JSON file the buffer was rendered from, or - for stdin"),
        )
        .arg(
            Arg::with_name(BUFFER)
                .required(true)
                .index(2)
                .help("Raw buffer file, or - for stdin"),
        )
        .arg(
            Arg::with_name(OUTPUT)
                .required(true)
                .index(3)
                .help("Image file, or - for stdout"),
        )
        .arg(
            Arg::with_name(SCALE)
                .long(SCALE)
                .takes_value(true)
                .possible_values(&scales)
                .help("Scaling function; overrides the genome's scale_func"),
        )
        .arg(
            Arg::with_name(SCALE_ZERO)
                .long(SCALE_ZERO)
                .takes_value(true)
                .possible_values(&["true", "false"])
                .help("Whether zero, rather than the least count, is black"),
        )
        .arg(
            Arg::with_name(DEPTH)
                .long(DEPTH)
                .short("d")
                .takes_value(true)
                .possible_values(&["8", "16"])
                .default_value("8")
                .help("Bits per sample"),
        )
        .arg(
            Arg::with_name(FORMAT)
                .long(FORMAT)
                .short("f")
                .takes_value(true)
                .possible_values(&["pgm", "png"])
                .help("Image format; guessed from the output name when absent"),
        )
        .get_matches()
}

fn run() -> Result<(), failure::Error> {
    let matches = args();
    let genome = matches.value_of(GENOME).unwrap_or(STANDARD_STREAM);
    let buffer = matches.value_of(BUFFER).unwrap_or(STANDARD_STREAM);
    let output = matches.value_of(OUTPUT).unwrap_or(STANDARD_STREAM);
    if genome == STANDARD_STREAM && buffer == STANDARD_STREAM {
        return Err(FlameError::InvalidArgument(
            "the genome and the buffer cannot both come from stdin".to_string(),
        )
        .into());
    }

    let settings = ToneSettings::from_reader(open_input(genome)?)?;
    let scale = match matches.value_of(SCALE) {
        Some(name) => Scale::from_str(name)?,
        None => settings.scale,
    };
    let scale_zero = match matches.value_of(SCALE_ZERO) {
        Some(flag) => bool::from_str(flag)?,
        None => settings.scale_zero,
    };
    let depth = BitDepth::from_str(matches.value_of(DEPTH).unwrap_or("8"))?;
    let format = match matches.value_of(FORMAT) {
        Some(name) => ImageFormat::from_str(name)?,
        None => ImageFormat::from_path(output),
    };

    let histogram = Histogram::read_raw(open_input(buffer)?, settings.width, settings.height)
        .map_err(|e| FlameError::io("read", buffer, e))?;
    let summary = histogram.stats();
    info!(
        width = settings.width,
        height = settings.height,
        total = summary.total,
        min = summary.min,
        max = summary.max,
        "read buffer"
    );

    let raster = ToneMapper {
        scale,
        scale_zero,
        depth,
    }
    .map(&histogram);
    let mut out = create_output(output)?;
    raster
        .encode(&mut out, format)
        .and_then(|_| out.flush())
        .map_err(|e| FlameError::io("write", output, e))?;
    info!(scale = %scale, scale_zero, ?depth, ?format, "wrote image");
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = run() {
        eprintln!("ffgray: {}", e);
        for cause in e.iter_causes() {
            eprintln!("  caused by: {}", cause);
        }
        std::process::exit(1);
    }
}
