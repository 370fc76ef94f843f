use clap::Parser;
use memory_match_run::args::{Args, Mode};
use memory_match_run::game_automation::match_image::annotate_board;
use memory_match_run::game_automation::{
    AutomationCommand, AutomationEvent, BoardAnalysis, CardAutomation, CardMatcher,
    DryRunClicker, ImageFileSource, MatchConfig, MatchError, MatchResult,
    create_automation_channels, load_rgb_image, session_result,
};
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.debug);

    let result = match args.mode() {
        Mode::Analyze => args.match_config().and_then(|config| analyze(&args, config)),
        Mode::Click => match args.match_config() {
            Ok(config) => click(&args, config).await,
            Err(e) => Err(e),
        },
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("❌ {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(debug: bool) {
    let default_filter = if debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}

fn analyze(args: &Args, config: MatchConfig) -> MatchResult<()> {
    let image = load_rgb_image(&args.image)?;
    let analysis = CardMatcher::new(config).run(&image);

    if let Some(path) = &args.annotate {
        annotate_board(&image, &analysis)
            .save(path)
            .map_err(|source| MatchError::ImageSave {
                path: path.clone(),
                source,
            })?;
        log::info!("🖼️ Annotated board saved to {}", path.display());
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&analysis)?);
    } else {
        print_analysis(&analysis);
    }
    Ok(())
}

async fn click(args: &Args, config: MatchConfig) -> MatchResult<()> {
    let (cmd_tx, cmd_rx, event_tx, mut event_rx) = create_automation_channels();
    let clicker = DryRunClicker::new();
    let automation = CardAutomation::new(
        CardMatcher::new(config),
        ImageFileSource::new(args.image.clone()),
        clicker.clone(),
        args.automation_config(),
        cmd_rx,
        event_tx,
    );

    for command in [AutomationCommand::Capture, AutomationCommand::MatchAndClick] {
        cmd_tx
            .send(command)
            .await
            .map_err(|_| MatchError::ChannelClosed)?;
    }
    drop(cmd_tx);

    // The first error is the cause; later ones follow from it
    let (phase, first_error) = tokio::join!(automation.run(), async {
        let mut first_error = None;
        while let Some(event) = event_rx.recv().await {
            print_event(&event);
            if let AutomationEvent::Error(message) = event {
                first_error.get_or_insert(message);
            }
        }
        first_error
    });

    println!("🖱️ {} clicks issued", clicker.clicks().await.len());
    session_result(phase, first_error)
}

fn print_analysis(analysis: &BoardAnalysis) {
    println!(
        "🃏 {} cards on {}x{} board ({}ms)",
        analysis.cards.len(),
        analysis.image_width,
        analysis.image_height,
        analysis.processing_time_ms
    );
    for (i, card) in analysis.cards.iter().enumerate() {
        let (cx, cy) = card.center();
        println!("    {:>2}. {} centre=({},{})", i + 1, card, cx, cy);
    }

    println!("🎯 {} pairs", analysis.pairs.len());
    for (i, pair) in analysis.pairs.iter().enumerate() {
        let [(x1, y1), (x2, y2)] = pair.click_points();
        println!(
            "    {:>2}. ({},{}) <-> ({},{}) hash={} color={:.2}",
            i + 1,
            x1,
            y1,
            x2,
            y2,
            pair.hash_distance,
            pair.color_distance
        );
    }

    let unpaired = analysis.unpaired_cards();
    if !unpaired.is_empty() {
        println!("👀 {} cards without a partner", unpaired.len());
    }
}

fn print_event(event: &AutomationEvent) {
    match event {
        AutomationEvent::StateChanged(phase) => log::debug!("state -> {:?}", phase),
        AutomationEvent::CardsCaptured(cards) => {
            println!("📸 Cards have been captured and stored: {}", cards.len())
        }
        AutomationEvent::PairsClicked(pairs) => {
            println!("✅ Clicked on all matching pairs: {}", pairs.len())
        }
        AutomationEvent::Error(message) => eprintln!("❌ {message}"),
    }
}
