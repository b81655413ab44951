use image::{ImageFormat, Rgb, RgbImage};
use std::io::Cursor;

use crate::layout::CanvasSize;

/// Solid white, `#ffffff`
pub const BACKGROUND_COLOR: Rgb<u8> = Rgb([0xff, 0xff, 0xff]);

/// Render the blank collage background and encode it as PNG
pub fn render_background(canvas: CanvasSize) -> Result<Vec<u8>, image::ImageError> {
    let background = RgbImage::from_pixel(canvas.width, canvas.height, BACKGROUND_COLOR);

    let mut png = Vec::new();
    background.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
    Ok(png)
}
