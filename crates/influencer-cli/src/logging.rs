//! Tracing subscriber initialisation.
//!
//! Only the CLI crate is allowed to call [`init_logging`]; the core and
//! adapter crates only *emit* spans and events.
//!
//! # Level resolution
//!
//! | Source          | Filter level          |
//! |-----------------|-----------------------|
//! | `RUST_LOG`      | used verbatim if set  |
//! | `--quiet`       | ERROR                 |
//! | `-v`            | INFO                  |
//! | `-vv`           | DEBUG                 |
//! | `-vvv`          | TRACE                 |
//! | (no flags)      | `IM_LOG_LEVEL`        |

use std::io::IsTerminal as _;

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::GlobalArgs;

/// Crates whose events are shown at the resolved level.
const CRATES: [&str; 3] = ["influencer_manager", "influencer_core", "influencer_adapters"];

/// Initialise the global tracing subscriber.
///
/// Must be called exactly once, before any tracing macros fire.
pub fn init_logging(args: &GlobalArgs, configured_level: &str) -> anyhow::Result<()> {
    let level = derive_level(args, configured_level);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let directives: Vec<String> = CRATES.iter().map(|c| format!("{c}={level}")).collect();
        // `audit` is the target used for audit events.
        EnvFilter::new(format!("warn,audit={level},{}", directives.join(",")))
    });

    let use_ansi = !args.no_color && std::io::stderr().is_terminal();

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_ansi(use_ansi)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialise tracing: {e}"))?;

    Ok(())
}

/// Flags win over the configured level; unknown configured levels become INFO.
fn derive_level(args: &GlobalArgs, configured: &str) -> &'static str {
    if args.quiet {
        return "error";
    }
    match args.verbose {
        0 => normalise(configured),
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

fn normalise(level: &str) -> &'static str {
    match level.trim().to_ascii_lowercase().as_str() {
        "error" | "critical" => "error",
        "warn" | "warning" => "warn",
        "debug" => "debug",
        "trace" => "trace",
        _ => "info",
    }
}
