pub mod args;
pub mod game_automation;

pub use game_automation::match_image::{
    BoardAnalysis, CardBox, CardMatcher, CardPair, MatchConfig, detect_cards, match_pairs,
};
pub use game_automation::{MatchError, MatchResult};
