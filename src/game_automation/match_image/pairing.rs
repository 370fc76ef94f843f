//! Greedy nearest-neighbour pairing of card fingerprints
//!
//! Each unmatched card in turn (in box order) is paired with its closest
//! unmatched card: smallest hash distance first, color distance as tie-break.
//! The pair is only committed when both distances are within the configured
//! limits. Commitments are never revisited, so the result is not guaranteed
//! to be a globally optimal matching.

use super::config::MatchConfig;
use super::fingerprint::{Fingerprint, compute_fingerprints};
use super::region::CardBox;
use image::RgbImage;
use serde::Serialize;

/// Indices of a committed pair plus the distances that justified it
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IndexPair {
    pub anchor: usize,
    pub partner: usize,
    pub hash_distance: u32,
    pub color_distance: f64,
}

/// Two cards believed to show the same face.
///
/// `first` is the card that was scanning for a partner, `second` the one it
/// chose. Both are clicked in that order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CardPair {
    pub first: CardBox,
    pub second: CardBox,
    pub hash_distance: u32,
    pub color_distance: f64,
}

impl CardPair {
    pub fn contains(&self, card: &CardBox) -> bool {
        self.first == *card || self.second == *card
    }

    /// Click targets, first card then second
    pub fn click_points(&self) -> [(u32, u32); 2] {
        [self.first.center(), self.second.center()]
    }
}

/// Best candidate seen so far while scanning for an anchor's partner
struct Candidate {
    index: usize,
    hash_distance: u32,
    color_distance: f64,
}

impl Candidate {
    fn is_beaten_by(&self, hash_distance: u32, color_distance: f64) -> bool {
        hash_distance < self.hash_distance
            || (hash_distance == self.hash_distance && color_distance < self.color_distance)
    }
}

/// Greedily pair fingerprints, returning pairs in discovery order.
pub fn pair_fingerprints(fingerprints: &[Fingerprint], config: &MatchConfig) -> Vec<IndexPair> {
    let mut matched = vec![false; fingerprints.len()];
    let mut pairs = Vec::new();

    for anchor in 0..fingerprints.len() {
        if matched[anchor] {
            continue;
        }

        let mut best: Option<Candidate> = None;
        for candidate in 0..fingerprints.len() {
            if candidate == anchor || matched[candidate] {
                continue;
            }
            let (hash_distance, color_distance) =
                fingerprints[anchor].distance(&fingerprints[candidate]);

            let replace = match &best {
                None => true,
                Some(current) => current.is_beaten_by(hash_distance, color_distance),
            };
            if replace {
                best = Some(Candidate {
                    index: candidate,
                    hash_distance,
                    color_distance,
                });
            }
        }

        match best {
            Some(found)
                if found.hash_distance <= config.max_hash_distance
                    && found.color_distance <= config.max_color_distance =>
            {
                if config.debug_enabled {
                    log::debug!(
                        "🃏 Card {} pairs with card {} (hash={}, color={:.2})",
                        anchor,
                        found.index,
                        found.hash_distance,
                        found.color_distance
                    );
                }
                matched[anchor] = true;
                matched[found.index] = true;
                pairs.push(IndexPair {
                    anchor,
                    partner: found.index,
                    hash_distance: found.hash_distance,
                    color_distance: found.color_distance,
                });
            }
            Some(found) => {
                if config.debug_enabled {
                    log::debug!(
                        "👀 Card {} closest is card {} but too far (hash={}, color={:.2})",
                        anchor,
                        found.index,
                        found.hash_distance,
                        found.color_distance
                    );
                }
            }
            None => {}
        }
    }

    pairs
}

/// Fingerprint each card in `image` and pair them up.
///
/// Cards without an acceptable partner are left out of the result.
pub fn match_pairs(cards: &[CardBox], image: &RgbImage, config: &MatchConfig) -> Vec<CardPair> {
    if cards.len() < 2 {
        return Vec::new();
    }

    let fingerprints = compute_fingerprints(image, cards, config.parallel_fingerprints);
    pair_fingerprints(&fingerprints, config)
        .into_iter()
        .map(|pair| CardPair {
            first: cards[pair.anchor],
            second: cards[pair.partner],
            hash_distance: pair.hash_distance,
            color_distance: pair.color_distance,
        })
        .collect()
}
