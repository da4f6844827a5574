//! `influencer-manager version`

use serde::Serialize;

use crate::{cli::OutputFormat, error::CliResult, output::OutputManager};

#[derive(Debug, Serialize)]
struct VersionInfo {
    name: &'static str,
    version: &'static str,
    core: &'static str,
}

/// Print the binary name and version.
pub fn execute(output: OutputManager) -> CliResult<()> {
    let info = VersionInfo {
        name: env!("CARGO_BIN_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        core: influencer_core::VERSION,
    };

    match output.format() {
        OutputFormat::Json => output.json(&info)?,
        _ => output.print(&format!("{} {}", info.name, info.version))?,
    }
    Ok(())
}
