//! `map2fig`: renders a HEALPix FITS map to a raster image via the
//! Mollweide projection.
//!
//! Grounded in the `chartr` example's `clap` + `tracing` front-end (the
//! teacher crate has no CLI of its own); options mirror the original
//! `map2fig.c` getopt table one-for-one.
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{error, info, Level};

use healpix_rs::fits::BasicFitsAdapter;
use healpix_rs::mollweide::{trace_bitmap, BmpProjection};
use healpix_rs::render::{DrawOptions, Palette, PngRasterSink, RasterSink};

const SUPPORTED_FORMATS: &[&str] = &["png", "ps", "eps", "pdf", "svg"];
const DEFAULT_WIDTH: u32 = 3000;
const DEFAULT_HEIGHT: u32 = 1500;

#[derive(Parser)]
#[command(version, about = "Render a HEALPix FITS map as a Mollweide-projected image", long_about = None)]
struct Cli {
    /// Input FITS map
    input_map: Option<PathBuf>,

    /// Output image path (defaults to the input's stem with the format's extension)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// 1-based column within the FITS binary table to render
    #[arg(short, long, default_value_t = 1)]
    column: usize,

    /// Title drawn above the map
    #[arg(short, long)]
    title: Option<String>,

    /// Unit label drawn next to the color bar
    #[arg(short = 'u', long = "measure-unit")]
    measure_unit: Option<String>,

    /// Output format
    #[arg(short, long, default_value = "png")]
    format: String,

    /// Fixed lower bound of the color scale (defaults to the map's observed minimum)
    #[arg(long)]
    min: Option<f64>,

    /// Fixed upper bound of the color scale (defaults to the map's observed maximum)
    #[arg(long)]
    max: Option<f64>,

    /// Draw a horizontal color bar beneath the map
    #[arg(short = 'b', long = "draw-color-bar")]
    draw_color_bar: bool,

    /// Print the supported output formats and exit
    #[arg(short = 'F', long = "list-formats")]
    list_formats: bool,

    /// Increase logging verbosity (repeatable)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    if cli.list_formats {
        for fmt in SUPPORTED_FORMATS {
            println!("{fmt}");
        }
        return ExitCode::SUCCESS;
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let Some(input_map) = cli.input_map else {
        bail!("an INPUT_MAP path is required (pass --list-formats on its own to list formats)");
    };
    if !SUPPORTED_FORMATS.contains(&cli.format.as_str()) {
        bail!("unsupported format '{}', see --list-formats", cli.format);
    }
    if cli.format != "png" {
        bail!(
            "output format '{}' is named for interface parity but has no concrete renderer in this build",
            cli.format
        );
    }

    let output = cli.output.clone().unwrap_or_else(|| input_map.with_extension(&cli.format));

    info!("loading {}", input_map.display());
    let mut reader = File::open(&input_map).with_context(|| format!("opening {}", input_map.display()))?;
    let adapter = BasicFitsAdapter::new();
    let map = adapter
        .load_component(&mut reader, cli.column)
        .with_context(|| format!("reading column {} of {}", cli.column, input_map.display()))?;

    info!("rasterizing at {DEFAULT_WIDTH}x{DEFAULT_HEIGHT} via Mollweide");
    let proj = BmpProjection::new(DEFAULT_WIDTH, DEFAULT_HEIGHT, map.coordinate_system());
    let raster = trace_bitmap(&proj, &map);

    let options = DrawOptions {
        title: cli.title,
        measure_unit: cli.measure_unit,
        draw_color_bar: cli.draw_color_bar,
        min: cli.min,
        max: cli.max,
    };

    info!("writing {}", output.display());
    let file = File::create(&output).with_context(|| format!("creating {}", output.display()))?;
    let sink = PngRasterSink::new(BufWriter::new(file));
    sink.draw(&raster, &Palette, &options)
        .with_context(|| format!("encoding {}", output.display()))?;

    Ok(())
}
