//! Sends one prompt and prints every streamed record.
//!
//! Usage:
//!
//! ```text
//! CHATHUB_COOKIE=<_U cookie> CHATHUB_CONVERSATION=<id> CHATHUB_CLIENT=<id> \
//!     cargo run --example ask -- "What is Rust?" [--debug]
//! ```
//!
//! Press Ctrl+C to cancel the stream.

// ============================================================================
// Imports
// ============================================================================

use std::env;

use chathub_stream::{Conversation, Result, Session, StreamEvent};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

// ============================================================================
// Helpers
// ============================================================================

fn init_logging(debug: bool) {
    let filter = if debug {
        "chathub_stream=debug"
    } else {
        "chathub_stream=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();
}

fn var(name: &str) -> String {
    env::var(name).unwrap_or_default()
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();
    let debug = args.iter().any(|a| a == "--debug");
    let prompt = args
        .iter()
        .find(|a| !a.starts_with("--"))
        .cloned()
        .unwrap_or_else(|| "Hello".to_string());

    init_logging(debug);

    let session = Session::builder()
        .cookie("_U", var("CHATHUB_COOKIE"))
        .proxy(var("CHATHUB_PROXY"))
        .debug(debug)
        .build()?;

    let conversation = Conversation::new(var("CHATHUB_CONVERSATION"), var("CHATHUB_CLIENT"))
        .with_signature(var("CHATHUB_SIGNATURE"))
        .with_access_token(var("CHATHUB_ACCESS_TOKEN"));

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            println!("\nCancelling...");
            ctrl_c.cancel();
        }
    });

    let mut stream = session.ask_stream(cancel, conversation, prompt, "", "");
    while let Some(event) = stream.recv().await {
        match event {
            StreamEvent::Record(record) => println!("{record}"),
            StreamEvent::Failed(error) => return Err(error),
        }
    }

    Ok(())
}
