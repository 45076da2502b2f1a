//! Run the feedback service stub.
//!
//! # Usage
//!
//! ```bash
//! cargo run -p feedback-web
//! cargo run -p feedback-web -- --port 8080 --require-token dev-token
//! cargo run -p feedback-web -- --reject "quota exceeded" --delay-ms 2000
//! ```
//!
//! Then submit with the CLI:
//!
//! ```bash
//! cargo run -p feedback-rs -- feature --id search --vote up
//! curl http://127.0.0.1:3002/api/submissions
//! ```

use std::time::Duration;

use clap::Parser;
use feedback_web::{StubConfig, StubMode, spawn_stub};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Development stub of the feedback service.
#[derive(Parser)]
#[command(about = "Development stub of the feedback service")]
struct Args {
    /// Port to listen on.
    #[arg(long, default_value_t = 3002)]
    port: u16,

    /// Only accept submissions carrying this CAPTCHA token.
    #[arg(long)]
    require_token: Option<String>,

    /// Answer every valid submission with this failure message.
    #[arg(long, conflicts_with = "fail_status")]
    reject: Option<String>,

    /// Answer every request with this HTTP status.
    #[arg(long)]
    fail_status: Option<u16>,

    /// Wait this long before answering.
    #[arg(long, default_value_t = 0)]
    delay_ms: u64,
}

#[tokio::main]
async fn main() -> Result<(), String> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mode = match (args.reject, args.fail_status) {
        (Some(message), _) => StubMode::Reject { message },
        (None, Some(status)) => StubMode::Fail { status },
        (None, None) => StubMode::Accept,
    };
    let mut config = StubConfig::default()
        .with_bind_addr(([127, 0, 0, 1], args.port))
        .with_mode(mode)
        .with_delay(Duration::from_millis(args.delay_ms));
    if let Some(token) = args.require_token {
        config = config.with_required_token(token);
    }

    let (addr, _log) = spawn_stub(config)
        .await
        .map_err(|e| format!("failed to start stub: {e}"))?;
    println!("Feedback stub: http://{addr}/api/feedback");

    tokio::signal::ctrl_c()
        .await
        .map_err(|e| format!("failed to wait for ctrl-c: {e}"))?;
    Ok(())
}
