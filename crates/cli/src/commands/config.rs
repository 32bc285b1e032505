use std::env;
use std::fs;
use std::path::Path;

use flywheel_core::config::{resolve_config_path, AppConfig, LoadOptions};
use toml::Value;

use crate::commands::{CommandResult, EXIT_CONFIG};

/// Renders every effective setting with the layer it came from.
pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "config",
                "config_validation",
                format!("config validation failed: {error}"),
                EXIT_CONFIG,
            );
        }
    };

    CommandResult { exit_code: 0, output: render(&config) }
}

pub fn render(config: &AppConfig) -> String {
    let config_file_path = resolve_config_path(None);
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let entries: [(&str, String, &[&str]); 12] = [
        ("database.url", config.database.url.clone(), &["FLYWHEEL_DATABASE_URL"]),
        (
            "database.max_connections",
            config.database.max_connections.to_string(),
            &["FLYWHEEL_DATABASE_MAX_CONNECTIONS"],
        ),
        (
            "database.timeout_secs",
            config.database.timeout_secs.to_string(),
            &["FLYWHEEL_DATABASE_TIMEOUT_SECS"],
        ),
        (
            "analysis.min_data_points",
            config.analysis.min_data_points.to_string(),
            &["FLYWHEEL_ANALYSIS_MIN_DATA_POINTS"],
        ),
        (
            "analysis.trend_window_days",
            config.analysis.trend_window_days.to_string(),
            &["FLYWHEEL_ANALYSIS_TREND_WINDOW_DAYS"],
        ),
        (
            "analysis.top_opportunities",
            config.analysis.top_opportunities.to_string(),
            &["FLYWHEEL_ANALYSIS_TOP_OPPORTUNITIES"],
        ),
        (
            "analysis.max_concurrency",
            config.analysis.max_concurrency.to_string(),
            &["FLYWHEEL_ANALYSIS_MAX_CONCURRENCY"],
        ),
        (
            "collaborators.ingestion_timeout_secs",
            config.collaborators.ingestion_timeout_secs.to_string(),
            &["FLYWHEEL_COLLABORATORS_INGESTION_TIMEOUT_SECS"],
        ),
        (
            "collaborators.storage_timeout_secs",
            config.collaborators.storage_timeout_secs.to_string(),
            &["FLYWHEEL_COLLABORATORS_STORAGE_TIMEOUT_SECS"],
        ),
        (
            "logging.level",
            config.logging.level.clone(),
            &["FLYWHEEL_LOGGING_LEVEL", "FLYWHEEL_LOG_LEVEL"],
        ),
        (
            "logging.format",
            format!("{:?}", config.logging.format).to_ascii_lowercase(),
            &["FLYWHEEL_LOGGING_FORMAT", "FLYWHEEL_LOG_FORMAT"],
        ),
        (
            "config_file",
            config_file_path
                .as_ref()
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "<none>".to_string()),
            &[],
        ),
    ];

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for (key, value, env_keys) in entries {
        let source = if key == "config_file" {
            "discovery".to_string()
        } else {
            field_source(key, env_keys, config_file_doc.as_ref(), config_file_path.as_deref())
        };
        lines.push(render_line(key, &value, source));
    }

    lines.join("\n")
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|env_key| env::var_os(env_key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}
