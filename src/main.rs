// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process;

use pico_args::Arguments;

use svg_removeoverlap::{Document, Options, UnionStrategy};

const HELP: &str = "\
svg-removeoverlap merges overlapping SVG shapes into a single path.

USAGE:
  svg-removeoverlap [OPTIONS] <in-svg> <out-svg>  # from file to file
  svg-removeoverlap [OPTIONS] <in-svg> -c         # from file to stdout
  svg-removeoverlap [OPTIONS] - <out-svg>         # from stdin to file
  svg-removeoverlap [OPTIONS] - -c                # from stdin to stdout

OPTIONS:
  -h, --help                        Prints help information
  -V, --version                     Prints version information
  -c                                Prints the output SVG to the stdout

  -k, --keep-white                  Keeps white and transparent shapes
  --skip-fill COLOR                 Treats shapes with this fill as invisible.
                                    Replaces the default list.
                                    This option can be set multiple times
                                    [default: white, rgb(255,255,255),
                                    rgb(100%,100%,100%), rgba(255,255,255,1),
                                    hsl(0,0%,100%), hsla(0,0%,100%,1),
                                    transparent, #ffffff, none]
  -s, --sequential                  Merges shapes one by one instead of all at once.
                                    Slower, but can help with problematic inputs
  --no-cairo                        Skips the normalization pass and reads only
                                    basic shapes straight from the XML.
                                    Shapes are filtered by their declared fill
  --picofy                          Converts strokes into filled outlines,
                                    so they will be merged as well
  --accuracy NUM                    Sets the union accuracy
                                    [default: 0.01] [possible values: > 0]
  --coordinates-precision NUM       Set the coordinates numeric precision.
                                    Smaller precision can lead to a malformed output in some cases
                                    [values: 2..8 (inclusive)] [default: 3]

  --use-font-file PATH              Load a specified font file into the fonts database.
                                    Will be used during text to path conversion.
                                    This option can be set multiple times
  --use-fonts-dir PATH              Loads all fonts from the specified directory
                                    into the fonts database.
                                    Will be used during text to path conversion.
                                    This option can be set multiple times
  --skip-system-fonts               Disables system fonts loading.
                                    You should add some fonts manually using
                                    --use-font-file and/or --use-fonts-dir
                                    Otherwise, text elements will not be processed

  -v, --verbose                     Prints processing steps and progress
  --quiet                           Disables warnings

ARGS:
  <in-svg>                          Input file
  <out-svg>                         Output file
";

#[derive(Debug)]
struct Args {
    keep_white: bool,
    skip_fills: Vec<String>,
    sequential: bool,
    no_cairo: bool,
    picofy: bool,
    accuracy: f64,
    coordinates_precision: u8,

    font_files: Vec<PathBuf>,
    font_dirs: Vec<PathBuf>,
    skip_system_fonts: bool,

    verbose: bool,
    quiet: bool,

    input: String,
    output: String,
}

fn collect_args() -> Result<Args, pico_args::Error> {
    let mut input = Arguments::from_env();

    if input.contains(["-h", "--help"]) {
        print!("{}", HELP);
        process::exit(0);
    }

    if input.contains(["-V", "--version"]) {
        println!("{}", env!("CARGO_PKG_VERSION"));
        process::exit(0);
    }

    Ok(Args {
        keep_white: input.contains(["-k", "--keep-white"]) || input.contains("--keep_white"),
        skip_fills: input.values_from_fn("--skip-fill", parse_fill)?,
        sequential: input.contains(["-s", "--sequential"]),
        no_cairo: input.contains("--no-cairo") || input.contains("--no-normalize"),
        picofy: input.contains("--picofy"),
        accuracy: input
            .opt_value_from_fn("--accuracy", parse_accuracy)?
            .unwrap_or(0.01),
        coordinates_precision: input
            .opt_value_from_fn("--coordinates-precision", parse_precision)?
            .unwrap_or(3),

        font_files: input.values_from_str("--use-font-file")?,
        font_dirs: input.values_from_str("--use-fonts-dir")?,
        skip_system_fonts: input.contains("--skip-system-fonts"),

        verbose: input.contains(["-v", "--verbose"]),
        quiet: input.contains("--quiet"),

        input: input.free_from_str()?,
        output: input.free_from_str()?,
    })
}

fn parse_fill(s: &str) -> Result<String, String> {
    let value = svg_removeoverlap::normalize_fill(s);
    if value.is_empty() {
        return Err("fill value cannot be empty".to_string());
    }

    Ok(value)
}

fn parse_accuracy(s: &str) -> Result<f64, String> {
    let n: f64 = s.parse().map_err(|_| "invalid accuracy NUM value")?;

    if n > 0.0 && n.is_finite() {
        Ok(n)
    } else {
        Err("accuracy NUM must be a positive number".to_string())
    }
}

fn parse_precision(s: &str) -> Result<u8, String> {
    let n: u8 = s.parse().map_err(|_| "invalid precision NUM value")?;

    if (2..=8).contains(&n) {
        Ok(n)
    } else {
        Err("precision NUM cannot be smaller than 2 or larger than 8".to_string())
    }
}

#[derive(Clone, PartialEq, Debug)]
enum InputFrom<'a> {
    Stdin,
    File(&'a str),
}

#[derive(Clone, PartialEq, Debug)]
enum OutputTo<'a> {
    Stdout,
    File(&'a str),
}

fn main() {
    let args = match collect_args() {
        Ok(v) => v,
        Err(e) => {
            eprintln!("Error: {}.", e);
            process::exit(1);
        }
    };

    if !args.quiet {
        if let Ok(()) = log::set_logger(&LOGGER) {
            let level = if args.verbose {
                log::LevelFilter::Info
            } else {
                log::LevelFilter::Warn
            };
            log::set_max_level(level);
        }
    }

    if let Err(e) = process(args) {
        eprintln!("Error: {}.", e);
        process::exit(1);
    }
}

fn process(args: Args) -> Result<(), String> {
    let (in_svg, out_svg) = {
        let in_svg = args.input.as_str();
        let out_svg = args.output.as_str();

        let svg_from = if in_svg == "-" {
            InputFrom::Stdin
        } else if in_svg == "-c" {
            return Err("-c should be set after input".to_string());
        } else {
            InputFrom::File(in_svg)
        };

        let svg_to = if out_svg == "-c" {
            OutputTo::Stdout
        } else {
            OutputTo::File(out_svg)
        };

        (svg_from, svg_to)
    };

    let mut opt = Options {
        keep_white: args.keep_white,
        strategy: if args.sequential {
            UnionStrategy::Sequential
        } else {
            UnionStrategy::Batch
        },
        normalize: !args.no_cairo,
        picofy: args.picofy,
        accuracy: args.accuracy,
        coordinates_precision: args.coordinates_precision,
        load_system_fonts: !args.skip_system_fonts,
        font_files: args.font_files.clone(),
        font_dirs: args.font_dirs.clone(),
        show_progress: args.verbose && !args.quiet,
        ..Options::default()
    };

    if !args.skip_fills.is_empty() {
        opt.skip_fills = args.skip_fills.clone();
    }

    let mut doc = match in_svg {
        InputFrom::Stdin => Document::from_data(load_stdin()?),
        InputFrom::File(path) => Document::load(Path::new(path)).map_err(|e| e.to_string())?,
    };

    let stats = doc.remove(&opt).map_err(|e| e.to_string())?;
    log::info!(
        "{} shapes were merged into a path with {} subpaths.",
        stats.shapes_kept,
        stats.subpaths
    );

    match out_svg {
        OutputTo::Stdout => {
            io::stdout()
                .write_all(doc.content())
                .map_err(|_| "failed to write to the stdout".to_string())?;
        }
        OutputTo::File(path) => {
            doc.save(Path::new(path)).map_err(|e| e.to_string())?;
        }
    }

    Ok(())
}

fn load_stdin() -> Result<Vec<u8>, String> {
    let mut buf = Vec::new();
    let stdin = io::stdin();
    let mut handle = stdin.lock();

    handle
        .read_to_end(&mut buf)
        .map_err(|_| "failed to read from stdin".to_string())?;

    Ok(buf)
}

/// A simple stderr logger.
static LOGGER: SimpleLogger = SimpleLogger;
struct SimpleLogger;
impl log::Log for SimpleLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record) {
        if self.enabled(record.metadata()) {
            let target = if !record.target().is_empty() {
                record.target()
            } else {
                record.module_path().unwrap_or_default()
            };

            let line = record.line().unwrap_or(0);
            let args = record.args();

            match record.level() {
                log::Level::Error => eprintln!("Error (in {}:{}): {}", target, line, args),
                log::Level::Warn => eprintln!("Warning (in {}:{}): {}", target, line, args),
                log::Level::Info => eprintln!("Info (in {}:{}): {}", target, line, args),
                log::Level::Debug => eprintln!("Debug (in {}:{}): {}", target, line, args),
                log::Level::Trace => eprintln!("Trace (in {}:{}): {}", target, line, args),
            }
        }
    }

    fn flush(&self) {}
}
