// Types and enums for the capture / match / click loop
use super::match_image::{CardBox, CardPair};
use image::RgbImage;

/// Board captured by the screen source together with the cards found on it
#[derive(Debug, Clone)]
pub struct CapturedBoard {
    pub image: RgbImage,
    pub cards: Vec<CardBox>,
}

/// Automation state. The captured board lives inside the state itself, so
/// matching can only ever run against the image that was captured.
#[derive(Debug, Clone)]
pub enum AutomationState {
    Idle,
    Captured(CapturedBoard),
    Clicking,
    Finished,
}

impl AutomationState {
    pub fn phase(&self) -> AutomationPhase {
        match self {
            AutomationState::Idle => AutomationPhase::Idle,
            AutomationState::Captured(_) => AutomationPhase::Captured,
            AutomationState::Clicking => AutomationPhase::Clicking,
            AutomationState::Finished => AutomationPhase::Finished,
        }
    }
}

/// Lightweight view of [`AutomationState`] reported to listeners
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutomationPhase {
    Idle,
    Captured,
    Clicking,
    Finished,
}

#[derive(Debug, Clone)]
pub enum AutomationCommand {
    Capture,       // grab the screen and detect cards
    MatchAndClick, // pair the captured cards and click every pair
    Shutdown,
}

#[derive(Debug, Clone)]
pub enum AutomationEvent {
    StateChanged(AutomationPhase),
    CardsCaptured(Vec<CardBox>),
    PairsClicked(Vec<CardPair>),
    Error(String),
}
