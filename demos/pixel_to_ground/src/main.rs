use argh::FromArgs;
use std::path::PathBuf;

use ground_projector::{
    CameraIntrinsics, GroundProjector, PoseConfig, ProjectionError, ProjectorConfig, TermCriteria,
};

#[derive(FromArgs)]
/// Convert pixel coordinates into ground-plane coordinates
struct Args {
    /// path to a JSON projector configuration
    #[argh(option, short = 'c')]
    config: Option<PathBuf>,

    /// pixel as `u,v`, can be repeated
    #[argh(option, short = 'p', from_str_fn(parse_pixel))]
    pixel: Vec<[f64; 2]>,

    /// file with one `u,v` pixel per line
    #[argh(option)]
    pixels_file: Option<PathBuf>,

    /// also print the pixels per metre at this image row
    #[argh(option)]
    gsd_row: Option<f64>,
}

fn parse_pixel(value: &str) -> Result<[f64; 2], String> {
    let (u, v) = value
        .split_once(',')
        .ok_or_else(|| format!("expected `u,v`, got `{value}`"))?;
    let parse = |s: &str| {
        s.trim()
            .parse::<f64>()
            .map_err(|e| format!("invalid coordinate `{s}`: {e}"))
    };
    Ok([parse(u)?, parse(v)?])
}

// the calibration of the tracking rig camera
fn default_config() -> ProjectorConfig {
    ProjectorConfig {
        intrinsics: CameraIntrinsics::new(701.12, 701.12, 610.83, 380.3405),
        distortion: vec![],
        pose: PoseConfig {
            height: Some(0.7633),
            ..Default::default()
        },
        undistort: TermCriteria::default(),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args: Args = argh::from_env();

    let config = match &args.config {
        Some(path) => ProjectorConfig::from_path(path)?,
        None => {
            log::info!("no configuration given, using the default rig camera");
            default_config()
        }
    };
    let projector: GroundProjector = config.build()?;

    if let Some(row) = projector.horizon_row(None) {
        log::debug!("horizon at row {row:.2}");
    }

    let mut pixels = args.pixel;
    if let Some(path) = &args.pixels_file {
        let contents = std::fs::read_to_string(path)?;
        for line in contents.lines().map(str::trim).filter(|l| !l.is_empty()) {
            pixels.push(parse_pixel(line)?);
        }
    }

    if pixels.is_empty() {
        return Err("no pixel given, use --pixel u,v or --pixels-file".into());
    }

    for (pixel, result) in pixels.iter().zip(projector.project_batch(&pixels)?) {
        match result {
            Ok(point) => println!(
                "pixel = ({:7.1}, {:7.1}) -> ground = ({:.4}, {:.4}), range = {:.4}",
                pixel[0],
                pixel[1],
                point.x,
                point.y,
                point.range()
            ),
            Err(ProjectionError::NoIntersection { .. }) => println!(
                "pixel = ({:7.1}, {:7.1}) -> no intersection",
                pixel[0], pixel[1]
            ),
            Err(e @ ProjectionError::UndistortFailed { .. }) => println!(
                "pixel = ({:7.1}, {:7.1}) -> {e}",
                pixel[0], pixel[1]
            ),
            Err(e) => return Err(e.into()),
        }
    }

    if let Some(row) = args.gsd_row {
        println!(
            "pixels per metre at row {row}: {}",
            projector.ground_sample_distance(Some(row))
        );
    }

    Ok(())
}
