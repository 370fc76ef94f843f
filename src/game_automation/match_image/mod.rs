//! Card detection and pair matching for memory (concentration) games
//!
//! This module finds bright card regions on a captured board, fingerprints
//! each card and greedily pairs cards that look alike.

pub mod annotate;
pub mod config;
pub mod detector;
pub mod fingerprint;
pub mod pairing;
pub mod region;


// Re-export main types and functions
pub use annotate::annotate_board;
pub use config::{MatchConfig, create_default_config, create_scaled_config, create_strict_config};
pub use detector::{BoardAnalysis, CardMatcher, brightness_mask, detect_cards};
pub use fingerprint::{Fingerprint, MeanColor, PerceptualHash, compute_fingerprints};
pub use pairing::{CardPair, IndexPair, match_pairs, pair_fingerprints};
pub use region::CardBox;
