// Memory game automation module
// Detects cards on a captured board, pairs matching faces and clicks them
// through pluggable screen and pointer backends.

pub mod backend;
pub mod channels;
pub mod error;
pub mod fsm;
pub mod match_image;
pub mod types;

// Re-export the main types and functions for easy access
pub use backend::{
    ClickExecutor, DryRunClicker, ImageFileSource, ScreenSource, StaticImageSource, click_pairs,
    load_rgb_image,
};
pub use channels::create_automation_channels;
pub use error::{MatchError, MatchResult};
pub use fsm::{AutomationConfig, CardAutomation, session_result};
pub use match_image::{
    BoardAnalysis, CardBox, CardMatcher, CardPair, MatchConfig, detect_cards, match_pairs,
};
pub use types::{AutomationCommand, AutomationEvent, AutomationPhase, AutomationState};
