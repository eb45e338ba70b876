use std::path::{Path, PathBuf};

use image::{imageops, RgbImage};

use crate::compose::compose_row;
use crate::error::StitchError;
use crate::image_set::ImageSet;

/// Configuration of a stitching run.
#[derive(Debug, Clone, PartialEq)]
pub struct StitchConfig {
    /// Directory with the raw camera frames
    pub frames_dir: PathBuf,
    /// Extension of the raw camera frames
    pub frames_extension: String,
    /// Directories with the plot images, in left-to-right order
    pub panel_dirs: Vec<PathBuf>,
    /// Extension of the plot images
    pub panels_extension: String,
    /// Directory receiving the composed frames
    pub output_dir: PathBuf,
    /// Mirror the raw frames horizontally
    pub flip_horizontal: bool,
    /// Number of leading raw frames that have no plot
    pub frame_offset: usize,
}

impl StitchConfig {
    /// Create a configuration with `.jpg` frames, `.png` plots and a frame offset of one.
    pub fn new(frames_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            frames_dir: frames_dir.into(),
            frames_extension: "jpg".to_string(),
            panel_dirs: Vec::new(),
            panels_extension: "png".to_string(),
            output_dir: output_dir.into(),
            flip_horizontal: false,
            frame_offset: 1,
        }
    }

    /// Append a plot directory to the right of the existing panels.
    pub fn with_panel(mut self, dir: impl Into<PathBuf>) -> Self {
        self.panel_dirs.push(dir.into());
        self
    }

    /// Mirror the raw frames horizontally.
    pub fn with_flip(mut self, flip: bool) -> Self {
        self.flip_horizontal = flip;
        self
    }

    /// Set the number of leading raw frames skipped.
    pub fn with_frame_offset(mut self, offset: usize) -> Self {
        self.frame_offset = offset;
        self
    }

    /// Set the extensions of the raw frames and of the plots.
    pub fn with_extensions(mut self, frames: &str, panels: &str) -> Self {
        self.frames_extension = frames.to_string();
        self.panels_extension = panels.to_string();
        self
    }
}

/// Composes raw frames with their plots and writes the result as a numbered PNG sequence.
pub struct Stitcher {
    config: StitchConfig,
    frames: ImageSet,
    panels: Vec<ImageSet>,
}

impl Stitcher {
    /// Scan the input directories.
    pub fn new(config: StitchConfig) -> Result<Self, StitchError> {
        let frames = ImageSet::discover(&config.frames_dir, &config.frames_extension)?;
        let panels = config
            .panel_dirs
            .iter()
            .map(|dir| ImageSet::discover(dir, &config.panels_extension))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            config,
            frames,
            panels,
        })
    }

    /// Number of composed frames a run produces.
    ///
    /// The sequence stops at the shortest input after skipping the frame offset.
    pub fn len(&self) -> usize {
        let frames = self.frames.len().saturating_sub(self.config.frame_offset);
        self.panels
            .iter()
            .map(ImageSet::len)
            .fold(frames, usize::min)
    }

    /// Whether a run would produce no frame.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Path of the `index`-th output frame.
    pub fn output_path(&self, index: usize) -> PathBuf {
        self.config.output_dir.join(format!("frame_{index:06}.png"))
    }

    /// Compose and write every frame.
    ///
    /// # Returns
    ///
    /// The number of frames written.
    pub fn run(&self) -> Result<usize, StitchError> {
        let output_dir = &self.config.output_dir;
        std::fs::create_dir_all(output_dir).map_err(|e| StitchError::Io(output_dir.clone(), e))?;

        let total = self.len();
        log::info!(
            "stitching {} frames from {} with {} panels into {}",
            total,
            self.frames.dir().display(),
            self.panels.len(),
            output_dir.display()
        );

        let mut frame_size = None;
        for index in 0..total {
            let frame_path = &self.frames.paths()[index + self.config.frame_offset];
            let frame = read_rgb(frame_path)?;

            // the sequence keeps the size of its first frame
            let (width, height) = *frame_size.get_or_insert(frame.dimensions());
            if frame.dimensions() != (width, height) {
                return Err(StitchError::SizeMismatch(
                    frame_path.clone(),
                    frame.width(),
                    frame.height(),
                    width,
                    height,
                ));
            }

            let frame = if self.config.flip_horizontal {
                imageops::flip_horizontal(&frame)
            } else {
                frame
            };

            let panels = self
                .panels
                .iter()
                .map(|set| read_rgb(&set.paths()[index]))
                .collect::<Result<Vec<_>, _>>()?;

            let combined = compose_row(&frame, &panels);
            let out_path = self.output_path(index);
            combined.save(&out_path)?;
            log::debug!("wrote {}", out_path.display());
        }

        log::info!("stitched sequence saved in {}", output_dir.display());
        Ok(total)
    }
}

fn read_rgb(path: &Path) -> Result<RgbImage, StitchError> {
    Ok(image::open(path)?.to_rgb8())
}
