//! Card fingerprints: a DCT perceptual hash plus the mean color of the card
//!
//! The hash captures the coarse structure of a card face and survives small
//! resampling and lighting changes. The mean color separates faces whose
//! structure is similar but whose colors are not (e.g. solid red vs solid blue).

use super::region::CardBox;
use image::imageops::{self, FilterType};
use image::{GrayImage, RgbImage};
use rayon::prelude::*;
use serde::Serialize;

/// Side of the low-frequency block kept from the DCT (8x8 = 64 bits)
const HASH_SIDE: usize = 8;
/// Side of the downscaled image the DCT runs on
const DCT_SIDE: usize = HASH_SIDE * 4;

/// 64-bit perceptual hash, compared by Hamming distance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct PerceptualHash(pub u64);

impl PerceptualHash {
    /// Hash a grayscale image.
    ///
    /// Downscale to 32x32, take the 2-D DCT-II, keep the top-left 8x8
    /// coefficients and set each bit whose coefficient is above their median.
    pub fn from_gray(gray: &GrayImage) -> Self {
        if gray.width() == 0 || gray.height() == 0 {
            return Self(0);
        }

        let small = imageops::resize(
            gray,
            DCT_SIDE as u32,
            DCT_SIDE as u32,
            FilterType::Lanczos3,
        );
        let pixels: Vec<f64> = small.as_raw().iter().map(|&p| p as f64).collect();

        let mut coefficients = low_frequency_dct(&pixels);
        // Flat regions leave only rounding noise in the AC terms
        let noise_floor = coefficients[0].abs().max(1.0) * 1e-9;
        for c in coefficients.iter_mut() {
            if c.abs() < noise_floor {
                *c = 0.0;
            }
        }
        let median = median_of(&coefficients);

        let bits = coefficients
            .iter()
            .enumerate()
            .filter(|&(_, &c)| c > median)
            .fold(0u64, |acc, (i, _)| acc | (1u64 << i));
        Self(bits)
    }

    /// Number of differing bits
    pub fn distance(&self, other: &PerceptualHash) -> u32 {
        (self.0 ^ other.0).count_ones()
    }
}

impl std::fmt::Display for PerceptualHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Per-channel mean intensity, compared by Euclidean distance
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MeanColor(pub [f64; 3]);

impl MeanColor {
    pub fn from_rgb(image: &RgbImage) -> Self {
        let count = image.width() as u64 * image.height() as u64;
        if count == 0 {
            return Self([0.0; 3]);
        }

        let mut sums = [0u64; 3];
        for pixel in image.pixels() {
            for (sum, &channel) in sums.iter_mut().zip(pixel.0.iter()) {
                *sum += channel as u64;
            }
        }
        Self(sums.map(|sum| sum as f64 / count as f64))
    }

    pub fn distance(&self, other: &MeanColor) -> f64 {
        self.0
            .iter()
            .zip(other.0.iter())
            .map(|(a, b)| (a - b) * (a - b))
            .sum::<f64>()
            .sqrt()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Fingerprint {
    pub hash: PerceptualHash,
    pub color: MeanColor,
}

impl Fingerprint {
    pub fn new(hash: PerceptualHash, color: MeanColor) -> Self {
        Self { hash, color }
    }

    /// Fingerprint the part of `image` covered by `card`.
    ///
    /// The box is clipped to the image first; a box that covers no pixels
    /// yields an all-zero fingerprint.
    pub fn from_region(image: &RgbImage, card: &CardBox) -> Self {
        let region = card.clip_to(image.width(), image.height());
        if !region.is_valid() {
            return Self::new(PerceptualHash(0), MeanColor([0.0; 3]));
        }

        let crop =
            imageops::crop_imm(image, region.x, region.y, region.width, region.height).to_image();
        let gray = imageops::grayscale(&crop);

        Self {
            hash: PerceptualHash::from_gray(&gray),
            color: MeanColor::from_rgb(&crop),
        }
    }

    /// `(hash distance, color distance)` to another fingerprint
    pub fn distance(&self, other: &Fingerprint) -> (u32, f64) {
        (
            self.hash.distance(&other.hash),
            self.color.distance(&other.color),
        )
    }
}

/// Fingerprint every card, keeping the order of `cards`.
pub fn compute_fingerprints(
    image: &RgbImage,
    cards: &[CardBox],
    parallel: bool,
) -> Vec<Fingerprint> {
    if parallel {
        cards
            .par_iter()
            .map(|card| Fingerprint::from_region(image, card))
            .collect()
    } else {
        cards
            .iter()
            .map(|card| Fingerprint::from_region(image, card))
            .collect()
    }
}

/// cos(pi * k * (2n + 1) / 2N) for the low frequencies k < HASH_SIDE
fn dct_basis() -> [[f64; DCT_SIDE]; HASH_SIDE] {
    let mut basis = [[0.0; DCT_SIDE]; HASH_SIDE];
    for (k, row) in basis.iter_mut().enumerate() {
        for (n, value) in row.iter_mut().enumerate() {
            let angle = std::f64::consts::PI * (k * (2 * n + 1)) as f64 / (2 * DCT_SIDE) as f64;
            *value = angle.cos();
        }
    }
    basis
}

/// Separable 2-D DCT-II of a DCT_SIDE x DCT_SIDE row-major block, restricted
/// to the top-left HASH_SIDE x HASH_SIDE output. Unnormalized; only the
/// ordering of coefficients matters for the hash.
fn low_frequency_dct(pixels: &[f64]) -> [f64; HASH_SIDE * HASH_SIDE] {
    let basis = dct_basis();

    let mut rows = [[0.0; HASH_SIDE]; DCT_SIDE];
    for (y, row) in rows.iter_mut().enumerate() {
        let line = &pixels[y * DCT_SIDE..(y + 1) * DCT_SIDE];
        for (v, out) in row.iter_mut().enumerate() {
            *out = line.iter().zip(basis[v].iter()).map(|(p, c)| p * c).sum();
        }
    }

    let mut coefficients = [0.0; HASH_SIDE * HASH_SIDE];
    for u in 0..HASH_SIDE {
        for v in 0..HASH_SIDE {
            coefficients[u * HASH_SIDE + v] = rows
                .iter()
                .zip(basis[u].iter())
                .map(|(row, c)| row[v] * c)
                .sum();
        }
    }
    coefficients
}

fn median_of(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, Rgb};

    /// Smooth, asymmetric test pattern rendered at any size
    fn pattern(size: u32) -> GrayImage {
        GrayImage::from_fn(size, size, |x, y| {
            let u = x as f64 / size as f64;
            let v = y as f64 / size as f64;
            let value = 128.0 + 60.0 * (6.1 * u + 3.3 * v).sin() + 50.0 * (2.2 * u - 7.9 * v).cos();
            Luma([value.clamp(0.0, 255.0) as u8])
        })
    }

    #[test]
    fn test_hash_identical_images_distance_zero() {
        let a = PerceptualHash::from_gray(&pattern(80));
        let b = PerceptualHash::from_gray(&pattern(80));
        assert_eq!(a.distance(&b), 0);
    }

    #[test]
    fn test_hash_survives_resampling() {
        let small = PerceptualHash::from_gray(&pattern(80));
        let large = PerceptualHash::from_gray(&pattern(120));
        let distance = small.distance(&large);
        assert!(distance <= 10, "resampled pattern drifted {distance} bits");
    }

    #[test]
    fn test_hash_separates_inverted_image() {
        let original = pattern(80);
        let mut inverted = original.clone();
        image::imageops::invert(&mut inverted);

        let distance =
            PerceptualHash::from_gray(&original).distance(&PerceptualHash::from_gray(&inverted));
        assert!(distance > 40, "inverted image only {distance} bits apart");
    }

    #[test]
    fn test_flat_images_share_a_hash() {
        let dark = PerceptualHash::from_gray(&GrayImage::from_pixel(50, 50, Luma([40])));
        let light = PerceptualHash::from_gray(&GrayImage::from_pixel(90, 70, Luma([220])));
        assert_eq!(dark.distance(&light), 0);
    }

    #[test]
    fn test_hash_of_empty_image_is_zero() {
        assert_eq!(PerceptualHash::from_gray(&GrayImage::new(0, 0)), PerceptualHash(0));
    }

    #[test]
    fn test_hamming_distance_counts_bits() {
        assert_eq!(PerceptualHash(0).distance(&PerceptualHash(0b1011)), 3);
        assert_eq!(PerceptualHash(u64::MAX).distance(&PerceptualHash(0)), 64);
    }

    #[test]
    fn test_mean_color_of_split_image() {
        // left half red, right half blue
        let image = RgbImage::from_fn(10, 4, |x, _| {
            if x < 5 { Rgb([200, 0, 0]) } else { Rgb([0, 0, 100]) }
        });
        let mean = MeanColor::from_rgb(&image);
        assert_eq!(mean, MeanColor([100.0, 0.0, 50.0]));
    }

    #[test]
    fn test_mean_color_distance_is_euclidean() {
        let a = MeanColor([0.0, 0.0, 0.0]);
        let b = MeanColor([9.0, 12.0, 0.0]);
        assert_eq!(a.distance(&b), 15.0);
    }

    #[test]
    fn test_fingerprint_uses_only_the_box() {
        let mut image = RgbImage::from_pixel(100, 100, Rgb([0, 0, 0]));
        for y in 20..40 {
            for x in 20..40 {
                image.put_pixel(x, y, Rgb([255, 255, 255]));
            }
        }
        let print = Fingerprint::from_region(&image, &CardBox::new(20, 20, 20, 20));
        assert_eq!(print.color, MeanColor([255.0, 255.0, 255.0]));
    }

    #[test]
    fn test_fingerprint_outside_image_is_zero() {
        let image = RgbImage::new(0, 0);
        let print = Fingerprint::from_region(&image, &CardBox::new(5, 5, 10, 10));
        assert_eq!(print.hash, PerceptualHash(0));
        assert_eq!(print.color, MeanColor([0.0; 3]));
    }

    #[test]
    fn test_parallel_and_sequential_fingerprints_agree() {
        let image = RgbImage::from_fn(120, 60, |x, y| Rgb([(x * 2) as u8, (y * 4) as u8, 90]));
        let cards = vec![
            CardBox::new(0, 0, 40, 30),
            CardBox::new(40, 0, 40, 30),
            CardBox::new(80, 30, 40, 30),
        ];
        assert_eq!(
            compute_fingerprints(&image, &cards, true),
            compute_fingerprints(&image, &cards, false)
        );
    }
}
