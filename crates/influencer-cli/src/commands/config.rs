//! `influencer-manager config`: inspect settings without revealing secrets.

use tracing::info;

use crate::{
    cli::{ConfigCommands, Feature, OutputFormat},
    config::{Settings, SettingsView},
    error::{CliError, CliResult},
    output::OutputManager,
};

/// Dispatch to the correct config subcommand.
pub fn execute(cmd: ConfigCommands, settings: Settings, output: OutputManager) -> CliResult<()> {
    match cmd {
        ConfigCommands::Show => show(&settings.view()?, &output),
        ConfigCommands::Check { feature } => check(&settings, feature, &output),
    }
}

fn show(view: &SettingsView, output: &OutputManager) -> CliResult<()> {
    match output.format() {
        OutputFormat::Json => output.json(view)?,
        _ => {
            output.header("Current settings:")?;
            for (key, value) in fields(view)? {
                output.field(&key, &value)?;
            }
        }
    }
    Ok(())
}

fn check(settings: &Settings, feature: Feature, output: &OutputManager) -> CliResult<()> {
    settings.require(feature)?;
    info!(%feature, "credentials present");

    let message = match feature {
        Feature::Gemini => "Gemini credentials are configured",
        Feature::Instagram => "Instagram credentials are configured",
        Feature::All => "All credentials are configured",
    };
    output.success(message)?;
    Ok(())
}

/// Flatten the view into `(key, value)` pairs, nested tables as dotted keys.
fn fields(view: &SettingsView) -> CliResult<Vec<(String, String)>> {
    let value = toml::Value::try_from(view).map_err(|e| CliError::ConfigError {
        message: format!("Failed to serialise settings: {e}"),
        source: Some(Box::new(e)),
    })?;

    let mut fields = Vec::new();
    if let toml::Value::Table(table) = value {
        flatten("", &table, &mut fields);
    }
    Ok(fields)
}

fn flatten(prefix: &str, table: &toml::Table, fields: &mut Vec<(String, String)>) {
    for (key, value) in table {
        let key = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match value {
            toml::Value::Table(nested) => flatten(&key, nested, fields),
            toml::Value::String(s) => fields.push((key, s.clone())),
            other => fields.push((key, other.to_string())),
        }
    }
}

// ── tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn render(view: &SettingsView) -> CliResult<String> {
        let lines: Vec<String> = fields(view)?
            .into_iter()
            .map(|(key, value)| format!("{key} = {value}"))
            .collect();
        Ok(lines.join("\n"))
    }

    fn settings(pairs: &[(&str, &str)]) -> Settings {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_vars(vars).unwrap()
    }

    #[test]
    fn render_never_contains_secret_values() {
        let settings = settings(&[
            ("GEMINI_API_KEY", "supersecret"),
            ("IM_IG_ACCESS_TOKEN", "igsecret"),
            ("IM_IG_USER_ID", "user123"),
            ("IM_META_APP_SECRET", "appsecret"),
        ]);
        let rendered = render(&settings.view().unwrap()).unwrap();

        assert!(!rendered.contains("supersecret"));
        assert!(!rendered.contains("igsecret"));
        assert!(!rendered.contains("appsecret"));
        assert!(rendered.contains("gemini_api_key = set"));
        assert!(rendered.contains("ig_user_id = user123"));
    }

    #[test]
    fn render_flattens_pipeline_section() {
        let rendered = render(&settings(&[("IM_MAX_RETRIES", "7")]).view().unwrap()).unwrap();
        assert!(rendered.contains("pipeline.max_retries = 7"));
        assert!(rendered.contains("pipeline.lease_ttl_secs = 900"));
    }

    #[test]
    fn missing_secrets_render_as_missing() {
        let rendered = render(&settings(&[]).view().unwrap()).unwrap();
        assert!(rendered.contains("ig_access_token = missing"));
        assert!(rendered.contains("meta_app_secret = missing"));
        assert!(!rendered.contains("ig_user_id"));
    }
}
