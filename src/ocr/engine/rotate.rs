use anyhow::{Context, Result};
use image::{DynamicImage, Rgb, RgbImage};
use imageproc::geometric_transformations::{Interpolation, rotate_about_center};
use std::path::{Path, PathBuf};

use crate::tools::Rotate;

/// Clockwise rotation with the `image` crate. Output goes next to the input
/// as `<stem>-rot<angle>.png`.
#[derive(Debug, Clone, Default)]
pub struct ImageRotator;

impl ImageRotator {
    pub fn rotated_path(image: &Path, angle: u32) -> PathBuf {
        let stem = image
            .file_stem()
            .and_then(|value| value.to_str())
            .unwrap_or("page");
        image.with_file_name(format!("{}-rot{}.png", stem, angle))
    }
}

impl Rotate for ImageRotator {
    fn rotate(&self, image: &Path, angle: u32) -> Result<PathBuf> {
        let decoded = image::open(image)
            .with_context(|| format!("failed to decode image: {}", image.display()))?;
        let rotated = rotate_image(decoded, angle);
        let output = Self::rotated_path(image, angle);
        rotated
            .save_with_format(&output, image::ImageFormat::Png)
            .with_context(|| format!("failed to write rotated image: {}", output.display()))?;
        Ok(output)
    }
}

pub(super) fn rotate_image(image: DynamicImage, angle: u32) -> DynamicImage {
    match angle % 360 {
        0 => image,
        90 => image.rotate90(),
        180 => image.rotate180(),
        270 => image.rotate270(),
        other => rotate_free(&image, other),
    }
}

/// Any other angle: the page is centred on a white canvas large enough for the
/// rotated bounds, then turned with bilinear interpolation.
fn rotate_free(image: &DynamicImage, degrees: u32) -> DynamicImage {
    let page = image.to_rgb8();
    let (width, height) = page.dimensions();
    let (sin, cos) = (degrees as f32).to_radians().sin_cos();
    let bound_w = (width as f32 * cos.abs() + height as f32 * sin.abs()).ceil() as u32;
    let bound_h = (width as f32 * sin.abs() + height as f32 * cos.abs()).ceil() as u32;
    let canvas_w = bound_w.max(width);
    let canvas_h = bound_h.max(height);

    let white = Rgb([255u8, 255u8, 255u8]);
    let mut canvas = RgbImage::from_pixel(canvas_w, canvas_h, white);
    image::imageops::overlay(
        &mut canvas,
        &page,
        i64::from((canvas_w - width) / 2),
        i64::from((canvas_h - height) / 2),
    );
    let rotated = rotate_about_center(
        &canvas,
        (degrees as f32).to_radians(),
        Interpolation::Bilinear,
        white,
    );
    DynamicImage::ImageRgb8(rotated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, Luma};
    use tempfile::tempdir;

    fn sample(width: u32, height: u32) -> DynamicImage {
        let mut luma = image::GrayImage::new(width, height);
        luma.put_pixel(0, 0, Luma([10]));
        DynamicImage::ImageLuma8(luma)
    }

    #[test]
    fn quarter_turns_swap_dimensions() {
        let rotated = rotate_image(sample(4, 2), 90);
        assert_eq!(rotated.dimensions(), (2, 4));
        let rotated = rotate_image(sample(4, 2), 180);
        assert_eq!(rotated.dimensions(), (4, 2));
    }

    #[test]
    fn free_angles_grow_the_canvas() {
        let black = DynamicImage::ImageRgb8(RgbImage::new(20, 10));
        let rotated = rotate_image(black, 45);
        assert_eq!(rotated.dimensions(), (22, 22));
        let rgb = rotated.to_rgb8();
        assert_eq!(*rgb.get_pixel(0, 0), Rgb([255, 255, 255]));
        assert_eq!(*rgb.get_pixel(11, 11), Rgb([0, 0, 0]));
    }

    #[test]
    fn free_angle_output_is_written() {
        let dir = tempdir().expect("tempdir");
        let input = dir.path().join("page.png");
        sample(8, 4)
            .save_with_format(&input, image::ImageFormat::Png)
            .expect("save");
        let output = ImageRotator.rotate(&input, 30).expect("rotate");
        assert_eq!(output, dir.path().join("page-rot30.png"));
        assert!(output.is_file());
    }

    #[test]
    fn writes_derived_path() {
        let dir = tempdir().expect("tempdir");
        let input = dir.path().join("page.png");
        sample(3, 1)
            .save_with_format(&input, image::ImageFormat::Png)
            .expect("save");
        let output = ImageRotator.rotate(&input, 270).expect("rotate");
        assert_eq!(output, dir.path().join("page-rot270.png"));
        let reopened = image::open(&output).expect("open");
        assert_eq!(reopened.dimensions(), (1, 3));
    }
}
