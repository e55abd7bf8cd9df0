//! Local adaptive binarization.

use image::{GrayImage, Luma, RgbImage, imageops};

/// Neighborhood size the local threshold is computed over, in pixels.
const WINDOW: u32 = 17;
/// Offset subtracted from the local mean before comparing.
const OFFSET: i16 = 10;

/// Binarizes a frame for run detection.
///
/// The threshold is local: a pixel becomes white when it is brighter than
/// the gaussian-weighted mean of its neighborhood minus a fixed offset.
/// This keeps the table grid readable under the uneven lighting a hall
/// camera delivers, where a single global threshold loses whole corners.
pub fn binarize(frame: &RgbImage) -> GrayImage {
    let gray = imageops::grayscale(frame);
    binarize_gray(&gray)
}

/// Same as [`binarize`], for an already grayscale image.
pub fn binarize_gray(gray: &GrayImage) -> GrayImage {
    // Sigma chosen so the gaussian support matches the threshold window.
    let sigma = (WINDOW as f32 - 1.0) / 6.0;
    let local_mean = imageops::blur(gray, sigma);

    let mut out = GrayImage::new(gray.width(), gray.height());
    for (x, y, pixel) in gray.enumerate_pixels() {
        let threshold = local_mean.get_pixel(x, y)[0] as i16 - OFFSET;
        let value = if (pixel[0] as i16) > threshold { 255 } else { 0 };
        out.put_pixel(x, y, Luma([value]));
    }
    out
}
