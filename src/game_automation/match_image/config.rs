//! Configuration for card detection and pair matching
//!
//! Defaults are tuned for one desktop resolution and a dark table with bright
//! cards. Other resolutions should start from [`create_scaled_config`].

use crate::game_automation::error::{MatchError, MatchResult};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchConfig {
    /// Pixels whose brightest channel is strictly above this become card foreground
    pub brightness_threshold: u8,
    /// Contours enclosing this area (px²) or less are treated as noise
    pub min_card_area: f64,
    /// Largest perceptual hash Hamming distance still accepted as a pair
    pub max_hash_distance: u32,
    /// Largest Euclidean distance between mean colors still accepted as a pair
    pub max_color_distance: f64,
    /// Compute card fingerprints on the rayon pool
    pub parallel_fingerprints: bool,
    /// Debug mode flag
    pub debug_enabled: bool,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            brightness_threshold: 240,
            min_card_area: 5000.0,
            max_hash_distance: 20,
            max_color_distance: 15.0,
            parallel_fingerprints: true,
            debug_enabled: false,
        }
    }
}

impl MatchConfig {
    /// Reject values the matcher cannot work with
    pub fn validate(&self) -> MatchResult<()> {
        if !self.min_card_area.is_finite() || self.min_card_area < 0.0 {
            return Err(MatchError::InvalidConfig {
                description: format!("min_card_area must be >= 0, got {}", self.min_card_area),
            });
        }
        if !self.max_color_distance.is_finite() || self.max_color_distance < 0.0 {
            return Err(MatchError::InvalidConfig {
                description: format!(
                    "max_color_distance must be >= 0, got {}",
                    self.max_color_distance
                ),
            });
        }
        if self.max_hash_distance > 64 {
            log::warn!(
                "max_hash_distance {} exceeds the 64-bit hash length, every candidate passes the hash test",
                self.max_hash_distance
            );
        }
        Ok(())
    }
}

/// Create a default configuration for the tuned resolution
pub fn create_default_config() -> MatchConfig {
    MatchConfig::default()
}

/// Configuration for a capture scaled by `scale` relative to the tuned resolution
///
/// Card area grows with the square of the linear scale, so doubling the
/// resolution needs four times the area threshold.
pub fn create_scaled_config(scale: f64) -> MatchConfig {
    let base = MatchConfig::default();
    MatchConfig {
        min_card_area: base.min_card_area * scale * scale,
        ..base
    }
}

/// Tighter thresholds for decks with many near-identical faces
pub fn create_strict_config() -> MatchConfig {
    MatchConfig {
        max_hash_distance: 10,
        max_color_distance: 8.0,
        ..MatchConfig::default()
    }
}
