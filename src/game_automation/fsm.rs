// Finite state machine driving capture -> match -> click
use super::backend::{ClickExecutor, ScreenSource, click_pairs};
use super::error::{MatchError, MatchResult};
use super::match_image::{CardMatcher, CardPair};
use super::types::{
    AutomationCommand, AutomationEvent, AutomationPhase, AutomationState, CapturedBoard,
};
use tokio::sync::mpsc;
use tokio::time::{Duration, Instant};

// Macro for debug output
macro_rules! debug_print {
    ($debug_enabled:expr, $($arg:tt)*) => {
        if $debug_enabled {
            log::debug!($($arg)*);
        }
    };
}

/// Timing of the automation loop
#[derive(Debug, Clone)]
pub struct AutomationConfig {
    /// Pause after every click so the game can flip the card
    pub click_delay: Duration,
    /// Repeated capture requests inside this window are ignored
    pub capture_cooldown: Duration,
    pub debug_enabled: bool,
}

impl Default for AutomationConfig {
    fn default() -> Self {
        Self {
            click_delay: Duration::from_millis(300),
            capture_cooldown: Duration::from_secs(1),
            debug_enabled: false,
        }
    }
}

pub struct CardAutomation<S: ScreenSource, C: ClickExecutor> {
    state: AutomationState,
    matcher: CardMatcher,
    source: S,
    clicker: C,
    config: AutomationConfig,
    command_rx: mpsc::Receiver<AutomationCommand>,
    event_tx: mpsc::Sender<AutomationEvent>,
    last_capture: Option<Instant>,
    should_exit: bool,
}

impl<S: ScreenSource, C: ClickExecutor> CardAutomation<S, C> {
    pub fn new(
        matcher: CardMatcher,
        source: S,
        clicker: C,
        config: AutomationConfig,
        command_rx: mpsc::Receiver<AutomationCommand>,
        event_tx: mpsc::Sender<AutomationEvent>,
    ) -> Self {
        Self {
            state: AutomationState::Idle,
            matcher,
            source,
            clicker,
            config,
            command_rx,
            event_tx,
            last_capture: None,
            should_exit: false,
        }
    }

    pub fn phase(&self) -> AutomationPhase {
        self.state.phase()
    }

    async fn change_state(&mut self, new_state: AutomationState) {
        let old_phase = self.state.phase();
        let new_phase = new_state.phase();
        self.state = new_state;
        if old_phase != new_phase {
            debug_print!(
                self.config.debug_enabled,
                "🎮 Automation state: {:?} -> {:?}",
                old_phase,
                new_phase
            );
            let _ = self
                .event_tx
                .send(AutomationEvent::StateChanged(new_phase))
                .await;
        }
    }

    async fn report_error(&self, error: &MatchError) {
        if error.is_recoverable() {
            log::warn!("⚠️ {}", error);
        } else {
            log::error!("❌ {}", error);
        }
        let _ = self
            .event_tx
            .send(AutomationEvent::Error(error.to_string()))
            .await;
    }

    /// Capture the screen and detect cards. The board replaces any earlier one.
    async fn capture_board(&mut self) -> MatchResult<()> {
        let image = self.source.capture().await?;
        let cards = self.matcher.detect(&image);
        log::info!(
            "📸 Cards have been captured from {}: {} found",
            self.source.name(),
            cards.len()
        );

        self.last_capture = Some(Instant::now());
        self.change_state(AutomationState::Captured(CapturedBoard {
            image,
            cards: cards.clone(),
        }))
        .await;
        let _ = self
            .event_tx
            .send(AutomationEvent::CardsCaptured(cards))
            .await;
        Ok(())
    }

    /// Pair the captured cards and click them. A failed click puts the board
    /// back so the command can be retried.
    async fn match_and_click(&mut self) -> MatchResult<Vec<CardPair>> {
        let board = match std::mem::replace(&mut self.state, AutomationState::Idle) {
            AutomationState::Captured(board) => board,
            other => {
                self.state = other;
                return Err(MatchError::NotCaptured);
            }
        };

        let pairs = self.matcher.match_pairs(&board.cards, &board.image);
        debug_print!(
            self.config.debug_enabled,
            "🃏 {} pairs among {} cards",
            pairs.len(),
            board.cards.len()
        );

        self.change_state(AutomationState::Clicking).await;
        match click_pairs(&self.clicker, &pairs, self.config.click_delay).await {
            Ok(clicked) => {
                log::info!("✅ Clicked on all {} matching pairs", clicked);
                self.change_state(AutomationState::Finished).await;
                Ok(pairs)
            }
            Err(e) => {
                self.change_state(AutomationState::Captured(board)).await;
                Err(e)
            }
        }
    }

    async fn process_command(&mut self, command: AutomationCommand) {
        debug_print!(
            self.config.debug_enabled,
            "🤖 Processing automation command: {:?}",
            command
        );
        match command {
            AutomationCommand::Capture => {
                if let Some(last) = self.last_capture
                    && last.elapsed() < self.config.capture_cooldown
                {
                    debug_print!(
                        self.config.debug_enabled,
                        "⏳ Capture ignored, last one was {}ms ago",
                        last.elapsed().as_millis()
                    );
                    return;
                }
                if let Err(e) = self.capture_board().await {
                    self.report_error(&e).await;
                }
            }
            AutomationCommand::MatchAndClick => match self.match_and_click().await {
                Ok(pairs) => {
                    let _ = self
                        .event_tx
                        .send(AutomationEvent::PairsClicked(pairs))
                        .await;
                    // one board per session
                    self.should_exit = true;
                }
                Err(e) => {
                    self.report_error(&e).await;
                }
            },
            AutomationCommand::Shutdown => {
                self.should_exit = true;
                self.change_state(AutomationState::Idle).await;
                log::info!("🛑 Card automation shutting down");
            }
        }
    }

    /// Process commands until shutdown, a finished board, or all senders drop.
    ///
    /// Consumes the automation so that listeners see the event channel close
    /// when the loop ends.
    pub async fn run(mut self) -> AutomationPhase {
        debug_print!(self.config.debug_enabled, "🎮 Card automation loop started");

        while let Some(command) = self.command_rx.recv().await {
            self.process_command(command).await;
            if self.should_exit {
                break;
            }
        }

        debug_print!(self.config.debug_enabled, "🎮 Card automation loop ended");
        self.state.phase()
    }
}

/// Outcome of a finished `run()`: `Ok` once the pairs were clicked,
/// otherwise `error`, the message the loop reported, or the phase it stopped in.
pub fn session_result(phase: AutomationPhase, error: Option<String>) -> MatchResult<()> {
    if phase == AutomationPhase::Finished {
        return Ok(());
    }
    Err(MatchError::SessionIncomplete {
        description: error.unwrap_or_else(|| format!("stopped in {:?} state", phase)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game_automation::backend::{DryRunClicker, ImageFileSource, StaticImageSource};
    use crate::game_automation::channels::create_automation_channels;
    use crate::game_automation::match_image::{CardBox, MatchConfig};
    use image::{Rgb, RgbImage};
    use imageproc::drawing::draw_filled_rect_mut;
    use imageproc::rect::Rect;

    fn board() -> RgbImage {
        let mut image = RgbImage::new(400, 300);
        for (x, y, color) in [
            (10, 10, Rgb([255, 0, 0])),
            (200, 10, Rgb([0, 0, 255])),
            (10, 150, Rgb([0, 0, 255])),
            (200, 150, Rgb([255, 0, 0])),
        ] {
            draw_filled_rect_mut(&mut image, Rect::at(x, y).of_size(80, 80), color);
        }
        image
    }

    fn fast_config() -> AutomationConfig {
        AutomationConfig {
            click_delay: Duration::ZERO,
            capture_cooldown: Duration::ZERO,
            debug_enabled: true,
        }
    }

    async fn drive(
        image: RgbImage,
        config: AutomationConfig,
        commands: Vec<AutomationCommand>,
    ) -> (AutomationPhase, Vec<AutomationEvent>, Vec<(u32, u32)>) {
        let (cmd_tx, cmd_rx, event_tx, mut event_rx) = create_automation_channels();
        let clicker = DryRunClicker::new();
        let automation = CardAutomation::new(
            CardMatcher::new(MatchConfig::default()),
            StaticImageSource::new(image),
            clicker.clone(),
            config,
            cmd_rx,
            event_tx,
        );

        for command in commands {
            cmd_tx.send(command).await.unwrap();
        }
        drop(cmd_tx);

        let (phase, events) = tokio::join!(automation.run(), async {
            let mut events = Vec::new();
            while let Some(event) = event_rx.recv().await {
                events.push(event);
            }
            events
        });
        (phase, events, clicker.clicks().await)
    }

    #[tokio::test]
    async fn test_capture_then_match_clicks_every_pair() {
        let (phase, events, clicks) = drive(
            board(),
            fast_config(),
            vec![AutomationCommand::Capture, AutomationCommand::MatchAndClick],
        )
        .await;

        assert_eq!(phase, AutomationPhase::Finished);
        assert_eq!(clicks, vec![(50, 50), (240, 190), (240, 50), (50, 190)]);

        let captured = events.iter().find_map(|e| match e {
            AutomationEvent::CardsCaptured(cards) => Some(cards.clone()),
            _ => None,
        });
        assert_eq!(captured.map(|c| c.len()), Some(4));

        let clicked = events.iter().find_map(|e| match e {
            AutomationEvent::PairsClicked(pairs) => Some(pairs.len()),
            _ => None,
        });
        assert_eq!(clicked, Some(2));
    }

    #[tokio::test]
    async fn test_match_without_capture_reports_error() {
        let (phase, events, clicks) = drive(
            board(),
            fast_config(),
            vec![AutomationCommand::MatchAndClick, AutomationCommand::Shutdown],
        )
        .await;

        assert_eq!(phase, AutomationPhase::Idle);
        assert!(clicks.is_empty());
        assert!(events.iter().any(|e| matches!(
            e,
            AutomationEvent::Error(msg) if msg.contains("No board captured")
        )));
    }

    #[tokio::test]
    async fn test_commands_after_finish_are_not_processed() {
        let (phase, _, clicks) = drive(
            board(),
            fast_config(),
            vec![
                AutomationCommand::Capture,
                AutomationCommand::MatchAndClick,
                AutomationCommand::Capture,
                AutomationCommand::MatchAndClick,
            ],
        )
        .await;

        assert_eq!(phase, AutomationPhase::Finished);
        assert_eq!(clicks.len(), 4);
    }

    #[tokio::test]
    async fn test_capture_cooldown_ignores_repeat() {
        let config = AutomationConfig {
            capture_cooldown: Duration::from_secs(60),
            ..fast_config()
        };
        let (_, events, _) = drive(
            board(),
            config,
            vec![
                AutomationCommand::Capture,
                AutomationCommand::Capture,
                AutomationCommand::Shutdown,
            ],
        )
        .await;

        let captures = events
            .iter()
            .filter(|e| matches!(e, AutomationEvent::CardsCaptured(_)))
            .count();
        assert_eq!(captures, 1);
    }

    #[tokio::test]
    async fn test_empty_board_finishes_without_clicks() {
        let (phase, events, clicks) = drive(
            RgbImage::new(100, 100),
            fast_config(),
            vec![AutomationCommand::Capture, AutomationCommand::MatchAndClick],
        )
        .await;

        assert_eq!(phase, AutomationPhase::Finished);
        assert!(clicks.is_empty());
        assert!(events.iter().any(|e| matches!(
            e,
            AutomationEvent::CardsCaptured(cards) if cards.is_empty()
        )));
    }

    #[tokio::test]
    async fn test_state_changes_are_reported_in_order() {
        let (_, events, _) = drive(
            board(),
            fast_config(),
            vec![AutomationCommand::Capture, AutomationCommand::MatchAndClick],
        )
        .await;

        let phases: Vec<AutomationPhase> = events
            .iter()
            .filter_map(|e| match e {
                AutomationEvent::StateChanged(phase) => Some(*phase),
                _ => None,
            })
            .collect();
        assert_eq!(
            phases,
            vec![
                AutomationPhase::Captured,
                AutomationPhase::Clicking,
                AutomationPhase::Finished
            ]
        );
    }

    #[tokio::test]
    async fn test_unreadable_image_surfaces_load_error() {
        let (cmd_tx, cmd_rx, event_tx, mut event_rx) = create_automation_channels();
        let automation = CardAutomation::new(
            CardMatcher::default(),
            ImageFileSource::new("/nonexistent/board.png"),
            DryRunClicker::new(),
            fast_config(),
            cmd_rx,
            event_tx,
        );
        for command in [AutomationCommand::Capture, AutomationCommand::MatchAndClick] {
            cmd_tx.send(command).await.unwrap();
        }
        drop(cmd_tx);

        let (phase, first_error) = tokio::join!(automation.run(), async {
            let mut first_error = None;
            while let Some(event) = event_rx.recv().await {
                if let AutomationEvent::Error(message) = event {
                    first_error.get_or_insert(message);
                }
            }
            first_error
        });

        assert_eq!(phase, AutomationPhase::Idle);
        let err = session_result(phase, first_error).unwrap_err();
        assert!(matches!(err, MatchError::SessionIncomplete { .. }));
        assert!(err.to_string().contains("Failed to load image"));
    }

    #[test]
    fn test_session_result() {
        assert!(session_result(AutomationPhase::Finished, None).is_ok());

        let err = session_result(AutomationPhase::Idle, None).unwrap_err();
        assert!(err.to_string().contains("Idle"));

        let err = session_result(
            AutomationPhase::Captured,
            Some("Click at x=1, y=2 failed: busy".to_string()),
        )
        .unwrap_err();
        assert!(err.to_string().contains("Click at x=1, y=2 failed"));
    }

    #[test]
    fn test_state_phase_mapping() {
        let state = AutomationState::Captured(CapturedBoard {
            image: RgbImage::new(1, 1),
            cards: vec![CardBox::new(0, 0, 1, 1)],
        });
        assert_eq!(state.phase(), AutomationPhase::Captured);
        assert_eq!(AutomationState::Finished.phase(), AutomationPhase::Finished);
    }
}
