// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use clap::{App, Arg, ArgMatches};
use flamebuf::random::RngKind;
use flamebuf::streams::{create_output, open_input};
use flamebuf::{optimize, ChaosGame, FlameError, FlameModel};
use std::str::FromStr;
use std::time::Instant;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn validate_range<T: FromStr + Ord>(
    s: &str,
    low: T,
    high: T,
    isnotanumber_err: &str,
    isnotinrange_err: &str,
) -> Result<(), String> {
    match T::from_str(s) {
        Ok(i) => {
            if i >= low && i <= high {
                Ok(())
            } else {
                Err(isnotinrange_err.to_string())
            }
        }
        Err(_) => Err(isnotanumber_err.to_string()),
    }
}

const INPUT: &str = "input";
const OUTPUT: &str = "output";
const SEED: &str = "seed";
const RNG: &str = "rng";
const THREADS: &str = "threads";

fn args<'a>() -> ArgMatches<'a> {
    let max_threads = num_cpus::get();

    App::new("ffbuf")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Render a flame fractal frequency buffer")
        .arg(
            Arg::with_name(INPUT)
                .required(true)
                .index(1)
                .help("Genome JSON file, or - for stdin"),
        )
        .arg(
            Arg::with_name(OUTPUT)
                .required(true)
                .index(2)
                .help("Raw buffer file, or - for stdout"),
        )
        .arg(
            Arg::with_name(SEED)
                .long(SEED)
                .short("s")
                .takes_value(true)
                .validator(|s| {
                    u64::from_str(&s)
                        .map(|_| ())
                        .map_err(|_| "Could not parse seed".to_string())
                })
                .help("Generator seed; a random one is drawn and logged when absent"),
        )
        .arg(
            Arg::with_name(RNG)
                .long(RNG)
                .short("r")
                .takes_value(true)
                .possible_values(&["java", "isaac32", "isaac64"])
                .default_value("isaac64")
                .help("Random number generator"),
        )
        .arg(
            Arg::with_name(THREADS)
                .long(THREADS)
                .short("t")
                .takes_value(true)
                .default_value("1")
                .validator(move |s| {
                    validate_range(
                        &s,
                        1,
                        max_threads,
                        "Could not parse thread count",
                        &format!("Thread count must be between 1 and {}", max_threads),
                    )
                })
                .help("Number of threads to use in the chaos game"),
        )
        .get_matches()
}

fn run() -> Result<(), failure::Error> {
    let matches = args();
    // clap guarantees presence and the validators guarantee the parses
    let input = matches.value_of(INPUT).unwrap_or("-");
    let output = matches.value_of(OUTPUT).unwrap_or("-");
    let kind = RngKind::from_str(matches.value_of(RNG).unwrap_or("isaac64"))?;
    let threads = usize::from_str(matches.value_of(THREADS).unwrap_or("1"))?;
    let seed = match matches.value_of(SEED) {
        Some(s) => u64::from_str(s)?,
        None => {
            let seed = rand::random::<u64>();
            info!(seed, "no seed given, drew one");
            seed
        }
    };

    let flame = FlameModel::from_reader(open_input(input)?)?;
    info!(
        name = %flame.name,
        width = flame.width,
        height = flame.height,
        samples = flame.samples,
        xforms = flame.xforms.len(),
        "read genome"
    );
    let samples = flame.samples;
    let game = ChaosGame::new(optimize(flame)?)?;

    let start = Instant::now();
    let (histogram, stats) = game.render_threaded(kind, seed, threads)?;
    let elapsed = start.elapsed();
    let seconds = elapsed.as_secs() as f64 + f64::from(elapsed.subsec_nanos()) * 1e-9;
    let summary = histogram.stats();
    info!(
        seconds,
        samples_per_second = samples as f64 / seconds.max(1e-9),
        generator = %kind,
        seed,
        "rendered"
    );
    info!(
        plotted = stats.plotted,
        percent_in_frame = stats.plotted as f64 / (samples.max(1)) as f64 * 100.0,
        diverged = stats.diverged,
        min = summary.min,
        max = summary.max,
        "samples in rectangle"
    );

    histogram
        .write_raw(create_output(output)?)
        .map_err(|e| FlameError::io("write", output, e))?;
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
        eprintln!("ffbuf: {}", e);
        for cause in e.iter_causes() {
            eprintln!("  caused by: {}", cause);
        }
        std::process::exit(1);
    }
}
