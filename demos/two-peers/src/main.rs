use std::sync::Arc;
use std::time::Duration;

use doodlecast::prelude::*;

// ---------------------------------------------------------------------------
// A round of draw-and-guess
// ---------------------------------------------------------------------------

/// What the guesser saw by the end of the round.
struct RoundSummary {
    painted_after_save: usize,
    guesses: Vec<String>,
    blank_after_erase: bool,
    online: Vec<String>,
}

/// The drawer's hand, as browser events over a canvas sitting at
/// (100, 50) on the page.
fn house() -> Vec<RawInput> {
    let at = |x: f64, y: f64| Point::new(x + 100.0, y + 50.0);
    vec![
        RawInput::MouseDown { client: at(40.0, 120.0) },
        RawInput::MouseMove { client: at(40.0, 60.0) },
        RawInput::MouseMove { client: at(90.0, 20.0) },
        RawInput::MouseMove { client: at(140.0, 60.0) },
        RawInput::MouseMove { client: at(140.0, 120.0) },
        RawInput::MouseMove { client: at(40.0, 120.0) },
        RawInput::MouseUp,
        RawInput::TouchStart { touches: vec![at(80.0, 120.0)] },
        RawInput::TouchMove { touches: vec![at(80.0, 90.0)] },
        RawInput::TouchMove { touches: vec![at(100.0, 90.0)] },
        RawInput::TouchMove { touches: vec![at(100.0, 120.0)] },
        RawInput::TouchEnd,
    ]
}

async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}

async fn play_round(bus: Arc<EventBus>) -> Result<RoundSummary, DoodlecastError> {
    let drawer = Participant::join("mina", Arc::clone(&bus)).await?;
    let mut guesser = Participant::join("joon", Arc::clone(&bus)).await?;

    let adapter = InputAdapter::new(Point::new(100.0, 50.0));
    for raw in house() {
        if let Some(adapted) = adapter.adapt(&raw) {
            drawer.board().input(adapted.input).await?;
        }
    }
    let receipt = drawer.board().save().await?;
    if let Payload::Strokes(log) = &receipt.payload {
        tracing::info!(events = log.len(), "drawing saved");
    }
    settle().await;

    let painted_after_save = guesser
        .board()
        .inspect(|b| b.canvas().painted_count())
        .await?;

    guesser.chat().send("a tent?").await?;
    guesser.chat().send("a house!").await?;
    drawer.chat().send("correct").await?;
    settle().await;
    guesser.chat_mut().drain_pending();
    let guesses = guesser
        .chat()
        .entries()
        .iter()
        .map(|e| format!("{}: {}", e.sender, e.text))
        .collect();

    drawer.board().erase().await?;
    settle().await;
    let blank_after_erase = guesser.board().inspect(|b| b.canvas().is_blank()).await?;

    guesser.presence_mut().drain_pending();
    let online = guesser.presence().online().map(str::to_string).collect();

    drawer.leave().await?;
    guesser.leave().await?;

    Ok(RoundSummary {
        painted_after_save,
        guesses,
        blank_after_erase,
        online,
    })
}

#[tokio::main]
async fn main() -> Result<(), DoodlecastError> {
    init_tracing();

    let bus = Arc::new(EventBus::default());
    let summary = play_round(bus).await?;

    eprintln!("online during the round: {}", summary.online.join(", "));
    eprintln!("pixels painted on the guesser's board: {}", summary.painted_after_save);
    for line in &summary.guesses {
        eprintln!("  {line}");
    }
    eprintln!("guesser's board blank after erase: {}", summary.blank_after_erase);
    Ok(())
}
