//! vidtex-probe: open a video, print what the pipeline sees, decode it.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use vidtex::config::VideoConfig;
use vidtex::decode::{FfmpegBackend, MediaSource};

#[derive(Debug, Parser)]
#[command(
    name = "vidtex-probe",
    about = "Decode a video file into RGB frames and report what was found"
)]
struct ProbeArgs {
    /// Video file to open
    input: PathBuf,

    /// RON file overriding the default pipeline configuration
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Stop after this many frames
    #[arg(short = 'n', long = "frames")]
    frames: Option<usize>,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = ProbeArgs::parse();

    let config = match &args.config {
        Some(path) => match VideoConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Failed to load config {}: {}", path.display(), e);
                return ExitCode::FAILURE;
            }
        },
        None => VideoConfig::default(),
    };

    let mut source = match MediaSource::open_with(&FfmpegBackend::new(), &args.input, config) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Failed to open video: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let status = source.state();
    let geometry = *source.geometry();
    println!("=== {} ===", args.input.display());
    println!("Size: {}x{}", status.width, status.height);
    println!(
        "Buffer: {}x{} (par {})",
        geometry.buffer_width, geometry.buffer_height, geometry.pixel_aspect_ratio
    );
    println!("Frame rate: {:.2} fps", status.fps);
    for stream in source.streams() {
        let marker = if stream.index == source.stream_index() {
            "*"
        } else {
            " "
        };
        println!(
            "{} #{} {} {} (time base {})",
            marker, stream.index, stream.kind, stream.codec_name, stream.time_base
        );
    }

    let limit = args.frames.unwrap_or(usize::MAX);
    let started = Instant::now();
    let mut decoded = 0;
    while decoded < limit && source.advance() {
        decoded += 1;
    }
    let elapsed = started.elapsed().as_secs_f64();

    println!(
        "Decoded {} frames in {:.2}s ({})",
        decoded,
        elapsed,
        source.playback_state()
    );
    ExitCode::SUCCESS
}
