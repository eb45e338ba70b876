use argh::FromArgs;
use std::path::PathBuf;

use frame_stitch::{StitchConfig, Stitcher};

#[derive(FromArgs)]
/// Stitch camera frames with their velocity and position plots side by side
struct Args {
    /// directory with the raw camera frames
    #[argh(option, default = "PathBuf::from(\"data/images\")")]
    frames: PathBuf,

    /// directory with the velocity plots
    #[argh(option, default = "PathBuf::from(\"data/velocity\")")]
    velocity: PathBuf,

    /// directory with the position plots
    #[argh(option, default = "PathBuf::from(\"data/position\")")]
    position: PathBuf,

    /// output directory for the composed frames
    #[argh(option, short = 'o')]
    output: PathBuf,

    /// mirror the raw frames horizontally
    #[argh(switch)]
    flip: bool,

    /// number of leading raw frames without a plot
    #[argh(option, default = "1")]
    frame_offset: usize,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args: Args = argh::from_env();

    let config = StitchConfig::new(args.frames, &args.output)
        .with_panel(args.velocity)
        .with_panel(args.position)
        .with_flip(args.flip)
        .with_frame_offset(args.frame_offset);

    let stitcher = Stitcher::new(config)?;
    let written = stitcher.run()?;

    println!("{written} frames saved in {}", args.output.display());

    Ok(())
}
