//! outline: run the outline pipeline on a local image file.
//!
//! Decodes the image, runs grayscale -> blur -> Canny -> contours ->
//! overlay, writes `original.png`, `edges.png`, and `contours.png`, and
//! prints per-stage diagnostics.
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin outline -- [OPTIONS] <IMAGE_PATH>
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use outline_pipeline::{ProcessingResult, StdClock, TransportImages, codec};

/// Edge map and contour overlay for a local image.
///
/// Writes three PNGs into the output directory and prints a per-stage
/// timing and count report.
#[derive(Parser)]
#[command(name = "outline", version)]
struct Cli {
    /// Path to the input image (PNG, JPEG, BMP, WebP, GIF).
    image_path: PathBuf,

    /// Directory for `original.png`, `edges.png`, and `contours.png`.
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    /// Output diagnostics as JSON instead of a human-readable report.
    #[arg(long)]
    json: bool,

    /// Print the `{original, edges, contours}` data-URI JSON the HTTP
    /// service would return, instead of diagnostics.
    #[arg(long, conflicts_with = "json")]
    data_uri: bool,
}

/// Output file names, in write order.
const OUTPUT_FILES: [&str; 3] = ["original.png", "edges.png", "contours.png"];

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(msg) => {
            eprintln!("{msg}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), String> {
    let image_bytes = std::fs::read(&cli.image_path)
        .map_err(|e| format!("Error reading {}: {e}", cli.image_path.display()))?;
    eprintln!(
        "Image: {} ({} bytes)",
        cli.image_path.display(),
        image_bytes.len(),
    );

    let image = codec::decode(&image_bytes)
        .map_err(|e| format!("Error decoding {}: {e}", cli.image_path.display()))?;
    let result = outline_pipeline::process_with_diagnostics(&image, &StdClock)
        .map_err(|e| format!("Pipeline error: {e}"))?;

    for path in write_outputs(&result, &cli.out_dir)? {
        eprintln!("Wrote {}", path.display());
    }

    if cli.data_uri {
        let transport =
            TransportImages::encode(&result).map_err(|e| format!("Error encoding images: {e}"))?;
        let json = serde_json::to_string(&transport)
            .map_err(|e| format!("Error serializing images: {e}"))?;
        println!("{json}");
    } else if cli.json {
        let json = serde_json::to_string_pretty(&result.diagnostics)
            .map_err(|e| format!("Error serializing diagnostics: {e}"))?;
        println!("{json}");
    } else {
        println!("{}", result.diagnostics.report());
    }
    Ok(())
}

/// Encode the three grids as PNG and write them into `dir`.
fn write_outputs(result: &ProcessingResult, dir: &Path) -> Result<Vec<PathBuf>, String> {
    std::fs::create_dir_all(dir).map_err(|e| format!("Error creating {}: {e}", dir.display()))?;

    let encoded = [
        codec::encode_png(&result.original),
        codec::encode_png(result.edges.as_image()),
        codec::encode_png(&result.overlay),
    ];

    let mut written = Vec::with_capacity(OUTPUT_FILES.len());
    for (name, png) in OUTPUT_FILES.iter().zip(encoded) {
        let png = png.map_err(|e| format!("Error encoding {name}: {e}"))?;
        let path = dir.join(name);
        std::fs::write(&path, &png).map_err(|e| format!("Error writing {}: {e}", path.display()))?;
        written.push(path);
    }
    Ok(written)
}
