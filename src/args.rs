use crate::game_automation::fsm::AutomationConfig;
use crate::game_automation::match_image::{MatchConfig, create_scaled_config};
use crate::game_automation::MatchResult;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub enum Mode {
    /// Detect and pair, then print the result
    Analyze,
    /// Run the capture / match / click loop with a dry-run clicker
    Click,
}

/// 🃏 Memory game card matcher
#[derive(Parser, Debug)]
#[command(
    name = "memory-match-run",
    version = env!("APP_VERSION_DISPLAY"),
    about = "Find matching card pairs on a memory game board",
    long_about = None,
    after_help = concat!("© ", env!("APP_BUILD_YEAR"), " Vigor Solutions")
)]
pub struct Args {
    /// Board screenshot to analyse (PNG or JPEG)
    #[arg(short, long)]
    pub image: PathBuf,

    /// Feed the pairs through the click loop (clicks are logged, not performed)
    #[arg(long)]
    pub click: bool,

    /// Print the analysis as JSON
    #[arg(long)]
    pub json: bool,

    /// Enable debug output
    #[arg(long)]
    pub debug: bool,

    /// Save a copy of the board with cards outlined
    #[arg(long, value_name = "PATH")]
    pub annotate: Option<PathBuf>,

    /// Brightest-channel threshold for card foreground
    #[arg(long, default_value_t = 240)]
    pub brightness: u8,

    /// Screen scale relative to the tuned resolution (rescales the area threshold)
    #[arg(long)]
    pub scale: Option<f64>,

    /// Minimum contour area of a card in px² (overrides --scale)
    #[arg(long)]
    pub min_area: Option<f64>,

    /// Largest accepted perceptual hash distance
    #[arg(long, default_value_t = 20)]
    pub max_hash: u32,

    /// Largest accepted mean color distance
    #[arg(long, default_value_t = 15.0)]
    pub max_color: f64,

    /// Pause after each click in milliseconds
    #[arg(long, default_value_t = 300)]
    pub delay_ms: u64,

    /// Fingerprint cards on the current thread only
    #[arg(long)]
    pub sequential: bool,
}

impl Args {
    pub fn mode(&self) -> Mode {
        if self.click { Mode::Click } else { Mode::Analyze }
    }

    /// Matching configuration from the flags, validated
    pub fn match_config(&self) -> MatchResult<MatchConfig> {
        let base = match self.scale {
            Some(scale) => create_scaled_config(scale),
            None => MatchConfig::default(),
        };
        let config = MatchConfig {
            brightness_threshold: self.brightness,
            min_card_area: self.min_area.unwrap_or(base.min_card_area),
            max_hash_distance: self.max_hash,
            max_color_distance: self.max_color,
            parallel_fingerprints: !self.sequential,
            debug_enabled: self.debug,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn automation_config(&self) -> AutomationConfig {
        AutomationConfig {
            click_delay: Duration::from_millis(self.delay_ms),
            debug_enabled: self.debug,
            ..AutomationConfig::default()
        }
    }
}
