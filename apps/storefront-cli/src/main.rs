//! # Storefront CLI Entry Point
//!
//! Runs one command against the product list, then exits.
//!
//! ## Startup Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Command Run                                       │
//! │                                                                         │
//! │  1. Initialize Logging ───────────────────────────────────────────────► │
//! │     • tracing-subscriber with env filter, to stderr                     │
//! │     • Default: WARN/INFO, can be overridden with RUST_LOG               │
//! │                                                                         │
//! │  2. Load Configuration ───────────────────────────────────────────────► │
//! │     • storefront.toml, then STOREFRONT_* env, then flags               │
//! │                                                                         │
//! │  3. Open Session ─────────────────────────────────────────────────────► │
//! │     • storage.json (key-value) and, online, backend.json               │
//! │     • AppContext::init: theme, hydrate or first pull                    │
//! │                                                                         │
//! │  4. Run Command, then shutdown and save the backend                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod backend;
mod cli;
mod error;

use clap::Parser;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    init_tracing();

    let cli = cli::Cli::parse();
    if let Err(e) = cli.run().await {
        eprintln!("{}", e);
        std::process::exit(e.code.exit_status());
    }
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=storefront_sync=trace` - Trace the sync crate only
/// - Default: WARN, INFO for storefront crates
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,storefront_sync=info,storefront_cli=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
