//! Card region detection and the detect-then-pair entry point

use super::{
    config::MatchConfig,
    pairing::{CardPair, match_pairs},
    region::CardBox,
};
use image::{GrayImage, Luma, RgbImage, imageops};
use imageproc::contours::{BorderType, find_contours};
use imageproc::point::Point;
use serde::Serialize;

/// Everything learned from one captured board
#[derive(Debug, Clone, Serialize)]
pub struct BoardAnalysis {
    pub image_width: u32,
    pub image_height: u32,
    pub cards: Vec<CardBox>,
    pub pairs: Vec<CardPair>,
    pub processing_time_ms: u128,
}

impl BoardAnalysis {
    pub fn has_pairs(&self) -> bool {
        !self.pairs.is_empty()
    }

    /// Cards that ended up without a partner, in detection order
    pub fn unpaired_cards(&self) -> Vec<CardBox> {
        self.cards
            .iter()
            .filter(|card| !self.pairs.iter().any(|pair| pair.contains(card)))
            .copied()
            .collect()
    }
}

/// Single-channel foreground mask: 255 where the brightest channel of the
/// pixel is strictly above `threshold`, 0 elsewhere.
pub fn brightness_mask(image: &RgbImage, threshold: u8) -> GrayImage {
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let [r, g, b] = image.get_pixel(x, y).0;
        if r.max(g).max(b) > threshold {
            Luma([255])
        } else {
            Luma([0])
        }
    })
}

/// Find bright card-shaped regions, sorted top-to-bottom then left-to-right.
///
/// Only outermost contours count; holes and blobs nested inside holes are
/// ignored. Contours enclosing `min_card_area` or less are dropped. Boxes of
/// overlapping blobs are returned as-is.
pub fn detect_cards(image: &RgbImage, config: &MatchConfig) -> Vec<CardBox> {
    if image.width() == 0 || image.height() == 0 {
        log::debug!("Empty image, no cards to detect");
        return Vec::new();
    }

    let mask = brightness_mask(image, config.brightness_threshold);
    // Components touching the image edge only get an outer border when the
    // mask is surrounded by background
    let mut padded = GrayImage::new(mask.width() + 2, mask.height() + 2);
    imageops::replace(&mut padded, &mask, 1, 1);
    let contours = find_contours::<i32>(&padded);

    let mut cards: Vec<CardBox> = contours
        .iter()
        .filter(|contour| {
            matches!(contour.border_type, BorderType::Outer) && contour.parent.is_none()
        })
        .filter_map(|contour| {
            let points: Vec<Point<i32>> = contour
                .points
                .iter()
                .map(|p| Point::new(p.x - 1, p.y - 1))
                .collect();
            if contour_area(&points) <= config.min_card_area {
                return None;
            }
            bounding_box(&points)
        })
        .collect();

    cards.sort_by_key(CardBox::sort_key);

    if config.debug_enabled {
        log::debug!(
            "🔍 {} external contours, {} cards above area {}",
            contours.iter().filter(|c| c.parent.is_none()).count(),
            cards.len(),
            config.min_card_area
        );
    }

    cards
}

/// Area enclosed by a closed contour (shoelace formula over its points)
fn contour_area(points: &[Point<i32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let twice_area: i64 = points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(a, b)| a.x as i64 * b.y as i64 - b.x as i64 * a.y as i64)
        .sum();
    (twice_area as f64 / 2.0).abs()
}

fn bounding_box(points: &[Point<i32>]) -> Option<CardBox> {
    let min_x = points.iter().map(|p| p.x).min()?;
    let max_x = points.iter().map(|p| p.x).max()?;
    let min_y = points.iter().map(|p| p.y).min()?;
    let max_y = points.iter().map(|p| p.y).max()?;

    Some(CardBox::new(
        min_x.max(0) as u32,
        min_y.max(0) as u32,
        (max_x - min_x + 1) as u32,
        (max_y - min_y + 1) as u32,
    ))
}

/// Detects cards and pairs them with one configuration
pub struct CardMatcher {
    config: MatchConfig,
}

impl CardMatcher {
    pub fn new(config: MatchConfig) -> Self {
        Self { config }
    }

    pub fn detect(&self, image: &RgbImage) -> Vec<CardBox> {
        detect_cards(image, &self.config)
    }

    pub fn match_pairs(&self, cards: &[CardBox], image: &RgbImage) -> Vec<CardPair> {
        match_pairs(cards, image, &self.config)
    }

    /// Detect and pair in one go on an already captured image
    pub fn run(&self, image: &RgbImage) -> BoardAnalysis {
        let start_time = std::time::Instant::now();

        let cards = self.detect(image);
        let pairs = self.match_pairs(&cards, image);

        let analysis = BoardAnalysis {
            image_width: image.width(),
            image_height: image.height(),
            cards,
            pairs,
            processing_time_ms: start_time.elapsed().as_millis(),
        };

        if self.config.debug_enabled {
            self.log_analysis(&analysis);
        }

        analysis
    }

    fn log_analysis(&self, analysis: &BoardAnalysis) {
        log::debug!("🔍 Board analysis:");
        log::debug!("  Processing time: {}ms", analysis.processing_time_ms);
        log::debug!("  Cards found: {}", analysis.cards.len());
        for card in &analysis.cards {
            log::debug!("    {} area={}px²", card, card.area());
        }
        for (i, pair) in analysis.pairs.iter().enumerate() {
            log::debug!(
                "    {}. {} <-> {} hash={} color={:.2}",
                i + 1,
                pair.first,
                pair.second,
                pair.hash_distance,
                pair.color_distance
            );
        }
        let unpaired = analysis.unpaired_cards();
        if !unpaired.is_empty() {
            log::debug!("  Unpaired: {:?}", unpaired);
        }
    }
}

impl Default for CardMatcher {
    fn default() -> Self {
        Self::new(MatchConfig::default())
    }
}
