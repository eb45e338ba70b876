use image::{imageops, RgbImage};

/// Concatenate a frame and its panels from left to right.
///
/// Each panel is resized to the frame size first, so the output is
/// `frame.width() * (1 + panels.len())` pixels wide and `frame.height()` tall.
///
/// # Arguments
///
/// * `frame` - The leftmost image, which sets the tile size.
/// * `panels` - The images placed to the right of the frame, in order.
///
/// # Returns
///
/// The composed image.
pub fn compose_row(frame: &RgbImage, panels: &[RgbImage]) -> RgbImage {
    let (width, height) = frame.dimensions();
    let mut dst = RgbImage::new(width * (1 + panels.len() as u32), height);

    imageops::replace(&mut dst, frame, 0, 0);
    for (i, panel) in panels.iter().enumerate() {
        let x = (width as i64) * (i as i64 + 1);
        if panel.dimensions() == (width, height) {
            imageops::replace(&mut dst, panel, x, 0);
        } else {
            let resized = imageops::resize(panel, width, height, imageops::FilterType::Triangle);
            imageops::replace(&mut dst, &resized, x, 0);
        }
    }

    dst
}
