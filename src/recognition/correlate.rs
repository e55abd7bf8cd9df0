//! Normalized image correlation.

use image::GrayImage;

/// Zero-mean normalized cross-correlation of two equal-sized images.
///
/// Returns a value in [-1, 1]; 1.0 is a perfect match. Differently sized
/// inputs and images without any contrast carry no correlation signal and
/// score 0.
pub fn normalized_match(a: &GrayImage, b: &GrayImage) -> f32 {
    if a.dimensions() != b.dimensions() || a.width() == 0 || a.height() == 0 {
        return 0.0;
    }

    let n = (a.width() * a.height()) as f64;
    let mean_a = a.as_raw().iter().map(|&v| v as f64).sum::<f64>() / n;
    let mean_b = b.as_raw().iter().map(|&v| v as f64).sum::<f64>() / n;

    let mut numerator = 0.0;
    let mut variance_a = 0.0;
    let mut variance_b = 0.0;
    for (&pa, &pb) in a.as_raw().iter().zip(b.as_raw().iter()) {
        let da = pa as f64 - mean_a;
        let db = pb as f64 - mean_b;
        numerator += da * db;
        variance_a += da * da;
        variance_b += db * db;
    }

    let denominator = (variance_a * variance_b).sqrt();
    if denominator == 0.0 {
        0.0
    } else {
        (numerator / denominator) as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn sample_glyph() -> GrayImage {
        GrayImage::from_fn(8, 10, |x, y| {
            if (3..5).contains(&x) || y == 2 {
                Luma([0])
            } else {
                Luma([255])
            }
        })
    }

    #[test]
    fn test_identical_images_score_one() {
        let img = sample_glyph();
        let score = normalized_match(&img, &img);
        assert!((score - 1.0).abs() < 1e-6, "score was {}", score);
    }

    #[test]
    fn test_inverted_images_score_minus_one() {
        let img = sample_glyph();
        let inverted = GrayImage::from_fn(8, 10, |x, y| Luma([255 - img.get_pixel(x, y)[0]]));
        let score = normalized_match(&img, &inverted);
        assert!((score + 1.0).abs() < 1e-6, "score was {}", score);
    }

    #[test]
    fn test_flat_image_scores_zero() {
        let img = sample_glyph();
        let flat = GrayImage::from_pixel(8, 10, Luma([255]));
        assert_eq!(normalized_match(&img, &flat), 0.0);
        assert_eq!(normalized_match(&flat, &flat), 0.0);
    }

    #[test]
    fn test_size_mismatch_scores_zero() {
        let img = sample_glyph();
        let other = GrayImage::from_pixel(4, 4, Luma([0]));
        assert_eq!(normalized_match(&img, &other), 0.0);
    }
}
