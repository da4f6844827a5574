//! Flags shared by every `influencer-manager` subcommand.
//!
//! They control two things only: how much of the pipeline's tracing and
//! `audit` output reaches stderr, and how command results are rendered on
//! stdout. Credentials and pipeline tuning never come from flags; those are
//! read from `IM_*` variables.

use clap::Args;

#[derive(Debug, Args)]
pub struct GlobalArgs {
    /// Raise the log level above `IM_LOG_LEVEL`. `RUST_LOG` still wins.
    #[arg(
        short = 'v',
        long = "verbose",
        action = clap::ArgAction::Count,
        global = true,
        help = "Show more pipeline and audit logging (-v, -vv, -vvv)",
        long_help = "Log level for the influencer crates and the `audit` target, written \
to stderr:
    (none)  - IM_LOG_LEVEL (default INFO)
    -v      - INFO: completed steps and audit events
    -vv     - DEBUG: store writes, leases, container polling
    -vvv    - TRACE
RUST_LOG, when set, replaces all of the above."
    )]
    pub verbose: u8,

    /// Only errors reach stderr; JSON results are still printed.
    #[arg(
        short = 'q',
        long = "quiet",
        global = true,
        conflicts_with = "verbose",
        help = "Print only errors and requested JSON"
    )]
    pub quiet: bool,

    #[arg(
        long = "no-color",
        global = true,
        env = "NO_COLOR",
        help = "Disable colored output (also set by NO_COLOR)"
    )]
    pub no_color: bool,

    #[arg(
        long = "output-format",
        global = true,
        value_enum,
        default_value = "auto",
        help = "How `version` and `config show` render their result"
    )]
    pub output_format: OutputFormat,
}

/// Rendering of command results on stdout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// `human` on a terminal, `plain` when piped.
    #[default]
    Auto,
    /// Colored `key = value` lines.
    Human,
    /// Uncolored `key = value` lines, stable for scripts.
    Plain,
    /// One JSON document; secrets appear only as `set` or `missing`.
    Json,
}

#[cfg(test)]
mod tests {
    use crate::cli::Cli;
    use clap::Parser;

    use super::OutputFormat;

    #[test]
    fn global_flags_are_accepted_after_the_subcommand() {
        let cli = Cli::parse_from([
            "influencer-manager",
            "config",
            "show",
            "--output-format",
            "json",
            "-vv",
        ]);
        assert_eq!(cli.global.output_format, OutputFormat::Json);
        assert_eq!(cli.global.verbose, 2);
    }

    #[test]
    fn quiet_and_verbose_conflict() {
        let result = Cli::try_parse_from(["influencer-manager", "-q", "-v", "version"]);
        assert!(result.is_err());
    }
}
