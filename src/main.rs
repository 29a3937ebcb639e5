use clap::Parser;
use colorthief::{Palette, DEFAULT_MAX_CUBES, DEFAULT_PRECISION, DEFAULT_RESIZE_IMAGE_AREA};
use std::{path::PathBuf, process::ExitCode};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Extract a color palette from an image with the median cut algorithm.
#[derive(Debug, Parser)]
#[command(name = "colorthief", version)]
struct Cli {
    /// Image to analyze.
    image: PathBuf,

    /// Maximum number of palette colors.
    #[arg(short = 'n', long, default_value_t = DEFAULT_MAX_CUBES)]
    max_cubes: usize,

    /// Bits kept per channel when counting colors (1-8).
    #[arg(long, default_value_t = DEFAULT_PRECISION)]
    precision: u8,

    /// Scale the image down to at most this many pixels first. 0 keeps the full image.
    #[arg(long, default_value_t = DEFAULT_RESIZE_IMAGE_AREA)]
    resize_area: u32,

    /// List the colors from the most to the least common.
    #[arg(long)]
    sort: bool,

    /// Also write the palette as a strip of color bands to this file.
    #[arg(long, value_name = "PATH")]
    swatch: Option<PathBuf>,

    /// Increase log verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> colorthief::Result<()> {
    let image = colorthief::open_image(&cli.image)?;

    info!(path = %cli.image.display(), width = image.width(), height = image.height(), "decoded image");

    let palette = Palette::from_image(image)
        .max_cubes(cli.max_cubes)
        .precision(cli.precision)
        .resize_image_area(cli.resize_area)
        .generate()?;

    let swatches = if cli.sort {
        palette.sorted_by_population()
    } else {
        palette.swatches().to_vec()
    };

    for swatch in swatches {
        let ratio = swatch.population() as f64 / palette.total_population() as f64;
        println!("{}  {:>8}  {:>6.2}%", swatch.hex(), swatch.population(), ratio * 100.0);
    }

    if let Some(path) = &cli.swatch {
        palette.save_swatch_strip(path)?;
        info!(path = %path.display(), "wrote swatch strip");
    }

    Ok(())
}
