use std::path::Path;

use frame_stitch::{StitchConfig, StitchError, Stitcher};
use image::{Rgb, RgbImage};

fn write_images(dir: &Path, prefix: &str, ext: &str, count: usize, size: (u32, u32), base: u8) {
    std::fs::create_dir_all(dir).expect("create input dir");
    for i in 0..count {
        let img = RgbImage::from_pixel(size.0, size.1, Rgb([base, i as u8 * 10, 0]));
        img.save(dir.join(format!("{prefix}_{i:03}.{ext}")))
            .expect("write input image");
    }
}

#[test]
fn stitches_frames_with_offset() -> Result<(), Box<dyn std::error::Error>> {
    let root = tempfile::tempdir()?;
    let (frames, velocity, position, out) = (
        root.path().join("images"),
        root.path().join("velocity"),
        root.path().join("position"),
        root.path().join("out"),
    );
    write_images(&frames, "frame", "png", 5, (6, 4), 200);
    write_images(&velocity, "vel", "png", 4, (12, 8), 100);
    write_images(&position, "pos", "png", 3, (3, 2), 50);

    let config = StitchConfig::new(&frames, &out)
        .with_extensions("png", "png")
        .with_panel(&velocity)
        .with_panel(&position);
    let stitcher = Stitcher::new(config)?;

    // 5 frames minus the offset, cut to the 3 position plots
    assert_eq!(stitcher.len(), 3);
    assert_eq!(stitcher.run()?, 3);

    let first = image::open(stitcher.output_path(0))?.to_rgb8();
    assert_eq!(first.dimensions(), (18, 4));
    // the first output pairs raw frame 1 with plot 0
    assert_eq!(first.get_pixel(0, 0), &Rgb([200, 10, 0]));
    assert_eq!(first.get_pixel(6, 0), &Rgb([100, 0, 0]));
    assert_eq!(first.get_pixel(17, 3), &Rgb([50, 0, 0]));

    assert!(stitcher.output_path(2).exists());
    assert!(!stitcher.output_path(3).exists());
    Ok(())
}

#[test]
fn flips_raw_frames() -> Result<(), Box<dyn std::error::Error>> {
    let root = tempfile::tempdir()?;
    let (frames, out) = (root.path().join("images"), root.path().join("out"));
    std::fs::create_dir_all(&frames)?;

    let mut img = RgbImage::from_pixel(4, 2, Rgb([0, 0, 0]));
    img.put_pixel(0, 0, Rgb([255, 255, 255]));
    img.save(frames.join("000.png"))?;

    let stitcher = Stitcher::new(
        StitchConfig::new(&frames, &out)
            .with_extensions("png", "png")
            .with_frame_offset(0)
            .with_flip(true),
    )?;
    assert_eq!(stitcher.run()?, 1);

    let flipped = image::open(stitcher.output_path(0))?.to_rgb8();
    assert_eq!(flipped.get_pixel(3, 0), &Rgb([255, 255, 255]));
    assert_eq!(flipped.get_pixel(0, 0), &Rgb([0, 0, 0]));
    Ok(())
}

#[test]
fn rejects_frames_of_different_size() -> Result<(), Box<dyn std::error::Error>> {
    let root = tempfile::tempdir()?;
    let (frames, out) = (root.path().join("images"), root.path().join("out"));
    write_images(&frames, "a", "png", 2, (4, 4), 1);
    write_images(&frames, "b", "png", 1, (5, 4), 1);

    let stitcher = Stitcher::new(
        StitchConfig::new(&frames, &out)
            .with_extensions("png", "png")
            .with_frame_offset(0),
    )?;
    assert!(matches!(
        stitcher.run(),
        Err(StitchError::SizeMismatch(_, 5, 4, 4, 4))
    ));
    Ok(())
}

#[test]
fn missing_plots_fail_early() -> Result<(), Box<dyn std::error::Error>> {
    let root = tempfile::tempdir()?;
    let (frames, plots) = (root.path().join("images"), root.path().join("plots"));
    write_images(&frames, "frame", "jpg", 2, (4, 4), 1);
    std::fs::create_dir_all(&plots)?;

    let result = Stitcher::new(StitchConfig::new(&frames, root.path().join("out")).with_panel(&plots));
    assert!(matches!(result, Err(StitchError::EmptySet(..))));
    Ok(())
}
