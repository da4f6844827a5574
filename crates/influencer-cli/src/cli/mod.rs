//! CLI argument definitions using the clap derive API.
//!
//! This module is the *only* place that knows about argument names, aliases,
//! help text, and value enums.  No business logic lives here.

use clap::{Parser, Subcommand, ValueEnum};

pub mod global;
pub use global::{GlobalArgs, OutputFormat};

// ── Top-level CLI ─────────────────────────────────────────────────────────────

/// Main CLI entry-point.
#[derive(Debug, Parser)]
#[command(
    name     = "influencer-manager",
    bin_name = "influencer-manager",
    version  = env!("CARGO_PKG_VERSION"),
    author   = env!("CARGO_PKG_AUTHORS"),
    about    = "Generate images and publish them through an idempotent job pipeline",
    after_help = "EXAMPLES:\n\
        \x20 influencer-manager version\n\
        \x20 influencer-manager config show\n\
        \x20 influencer-manager config show --output-format json\n\
        \x20 influencer-manager config check --feature instagram",
    arg_required_else_help = true,
    subcommand_required    = true,
)]
pub struct Cli {
    /// Flags available on every subcommand.
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

// ── Subcommands ───────────────────────────────────────────────────────────────

/// All available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print the installed version.
    #[command(about = "Print the installed version")]
    Version,

    /// Inspect the settings loaded from the environment.
    #[command(
        about = "Configuration inspection",
        subcommand,
        after_help = "EXAMPLES:\n\
            \x20 influencer-manager config show\n\
            \x20 influencer-manager config check --feature gemini\n\
            \x20 influencer-manager config check --feature all"
    )]
    Config(ConfigCommands),
}

// ── config subcommands ────────────────────────────────────────────────────────

/// Subcommands for `influencer-manager config`.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Print non-sensitive settings. Secrets are reported as set or missing.
    Show,

    /// Verify that the credentials a feature needs are present.
    Check {
        /// Feature whose credentials should be checked.
        #[arg(
            short = 'f',
            long = "feature",
            value_enum,
            default_value = "all",
            help = "Feature to check"
        )]
        feature: Feature,
    },
}

/// Features that need credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "lowercase")]
pub enum Feature {
    /// Image generation.
    Gemini,
    /// Publishing.
    Instagram,
    /// Everything above.
    All,
}

impl std::fmt::Display for Feature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Gemini => write!(f, "gemini"),
            Self::Instagram => write!(f, "instagram"),
            Self::All => write!(f, "all"),
        }
    }
}

// ── tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn parse_version_command() {
        let cli = Cli::parse_from(["influencer-manager", "version"]);
        assert!(matches!(cli.command, Commands::Version));
    }

    #[test]
    fn parse_config_check_feature() {
        let cli = Cli::parse_from(["influencer-manager", "config", "check", "--feature", "gemini"]);
        match cli.command {
            Commands::Config(ConfigCommands::Check { feature }) => {
                assert_eq!(feature, Feature::Gemini);
            }
            other => panic!("expected config check, got {other:?}"),
        }
    }

    #[test]
    fn config_check_defaults_to_all() {
        let cli = Cli::parse_from(["influencer-manager", "config", "check"]);
        assert!(matches!(
            cli.command,
            Commands::Config(ConfigCommands::Check { feature: Feature::All })
        ));
    }

    #[test]
    fn unknown_feature_is_rejected() {
        let result =
            Cli::try_parse_from(["influencer-manager", "config", "check", "--feature", "tiktok"]);
        assert!(result.is_err());
    }

    #[test]
    fn feature_display() {
        assert_eq!(Feature::Gemini.to_string(), "gemini");
        assert_eq!(Feature::Instagram.to_string(), "instagram");
        assert_eq!(Feature::All.to_string(), "all");
    }

    #[test]
    fn quiet_and_verbose_conflict() {
        let result = Cli::try_parse_from(["influencer-manager", "--quiet", "--verbose", "version"]);
        assert!(result.is_err());
    }

    #[test]
    fn output_format_is_global() {
        let cli = Cli::parse_from(["influencer-manager", "config", "show", "--output-format", "json"]);
        assert_eq!(cli.global.output_format, OutputFormat::Json);
    }
}
