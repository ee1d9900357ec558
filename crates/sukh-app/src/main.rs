//! Sukh application binary - composition root.
//!
//! 1. Load configuration from TOML, apply CLI and env overrides
//! 2. Build the reply client and the speech adapters
//! 3. Create the session controller and render its events to stdout
//! 4. Read input lines from stdin until `/quit` or end of input

mod cli;
mod render;

use std::sync::Arc;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::{self, error::RecvError};

use sukh_core::config::SukhConfig;
use sukh_core::events::SessionEvent;
use sukh_reply::{HttpReplyClient, MockReplyClient, ReplyClient};
use sukh_session::{IgnoreReason, SessionController, SessionError, SubmitOutcome};
use sukh_speech::{
    CommandSynthesis, SpeechInputAdapter, SpeechOutputAdapter, SynthesisEngine,
    UnavailableRecognition,
};

use cli::CliArgs;

const HELP: &str = "Type a message and press Enter. Commands: /mic, /voice, /quit";

/// Print session events as transcript lines until the session goes away.
async fn render_loop(mut events: broadcast::Receiver<SessionEvent>) {
    loop {
        match events.recv().await {
            Ok(event) => {
                if let Some(line) = render::format_event(&event) {
                    println!("{}", line);
                }
            }
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Renderer lagged behind session events");
            }
            Err(RecvError::Closed) => break,
        }
    }
}

fn spawn_submit(controller: &Arc<SessionController>, text: String) {
    let controller = Arc::clone(controller);
    tokio::spawn(async move {
        let outcome = if text.is_empty() {
            controller.submit_pending().await
        } else {
            controller.submit(&text).await
        };
        match outcome {
            SubmitOutcome::Ignored(IgnoreReason::AwaitingReply) => {
                println!("  still waiting for the last reply");
            }
            SubmitOutcome::Ignored(IgnoreReason::Empty) => {}
            SubmitOutcome::Replied | SubmitOutcome::Fallback => {
                tracing::debug!(?outcome, "Reply cycle finished");
            }
        }
    });
}

fn spawn_capture(controller: &Arc<SessionController>) {
    let controller = Arc::clone(controller);
    tokio::spawn(async move {
        match controller.begin_voice_capture().await {
            Ok(Some(_)) => {}
            Ok(None) => println!("  didn't catch that"),
            Err(SessionError::UnsupportedCapability(capability)) => {
                println!("  {} is not supported on this system", capability);
            }
            Err(SessionError::CaptureInProgress) => println!("  already listening"),
            Err(e) => println!("  voice input failed: {}", e),
        }
    });
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config.
    let config_file = args.resolve_config_path();
    let mut config = SukhConfig::load_or_default(&config_file);
    config.service.endpoint = args.resolve_endpoint(&config.service.endpoint);

    // Tracing. Logs go to stderr so they stay out of the transcript.
    let log_level = args.resolve_log_level(&config.general.log_level);
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Starting Sukh v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(path = %config_file.display(), "Configuration loaded");

    // Reply client.
    let reply_client: Arc<dyn ReplyClient> = if args.offline {
        tracing::info!("Offline mode, replies are echoed locally");
        Arc::new(MockReplyClient::new())
    } else {
        let client = HttpReplyClient::new(&config.service)?;
        tracing::info!(endpoint = %client.endpoint(), "Reply client ready");
        Arc::new(client)
    };

    // Speech.
    let synthesis = CommandSynthesis::from_config(&config.voice);
    if synthesis.is_available() {
        tracing::info!(program = %synthesis.program(), "Speech synthesis available");
    } else {
        tracing::info!(program = %synthesis.program(), "Speech synthesis not found, replies will not be spoken");
    }
    let speech_output = SpeechOutputAdapter::from_config(Arc::new(synthesis), &config.voice);
    let speech_input =
        SpeechInputAdapter::from_config(Arc::new(UnavailableRecognition), &config.voice);

    // Session.
    let controller = Arc::new(
        SessionController::new(reply_client, &config.session)
            .with_speech_input(speech_input)
            .with_speech_output(speech_output)
            .with_voice_output(args.resolve_voice_output(config.voice.output_enabled)),
    );

    let renderer = tokio::spawn(render_loop(controller.subscribe()));
    for message in controller.messages() {
        println!("{}", render::format_message(&message));
    }
    println!("{}", HELP);

    // Input loop.
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match line.trim() {
            "/quit" => break,
            "/voice" => {
                controller.toggle_voice_output();
            }
            "/mic" => spawn_capture(&controller),
            "/help" => println!("{}", HELP),
            "" => spawn_submit(&controller, String::new()),
            _ => spawn_submit(&controller, line),
        }
    }

    controller.stop_voice_capture();
    controller.speech_output().cancel();
    renderer.abort();
    tracing::info!("Sukh stopped");
    Ok(())
}
