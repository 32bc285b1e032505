use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_CONFIG_FILES: &[&str] = &["flywheel.toml", "config/flywheel.toml"];

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub analysis: AnalysisConfig,
    pub collaborators: CollaboratorConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct AnalysisConfig {
    pub min_data_points: u32,
    pub trend_window_days: u32,
    pub top_opportunities: u32,
    pub max_concurrency: u32,
}

#[derive(Clone, Debug)]
pub struct CollaboratorConfig {
    pub ingestion_timeout_secs: u64,
    pub storage_timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
    pub min_data_points: Option<u32>,
    pub trend_window_days: Option<u32>,
    pub top_opportunities: Option<u32>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://flywheel.db".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            analysis: AnalysisConfig {
                min_data_points: 7,
                trend_window_days: 30,
                top_opportunities: 10,
                max_concurrency: 8,
            },
            collaborators: CollaboratorConfig {
                ingestion_timeout_secs: 30,
                storage_timeout_secs: 30,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected =
                options.config_path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILES[0]));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(database) = patch.database {
            if let Some(url) = database.url {
                self.database.url = url;
            }
            if let Some(max_connections) = database.max_connections {
                self.database.max_connections = max_connections;
            }
            if let Some(timeout_secs) = database.timeout_secs {
                self.database.timeout_secs = timeout_secs;
            }
        }

        if let Some(analysis) = patch.analysis {
            if let Some(min_data_points) = analysis.min_data_points {
                self.analysis.min_data_points = min_data_points;
            }
            if let Some(trend_window_days) = analysis.trend_window_days {
                self.analysis.trend_window_days = trend_window_days;
            }
            if let Some(top_opportunities) = analysis.top_opportunities {
                self.analysis.top_opportunities = top_opportunities;
            }
            if let Some(max_concurrency) = analysis.max_concurrency {
                self.analysis.max_concurrency = max_concurrency;
            }
        }

        if let Some(collaborators) = patch.collaborators {
            if let Some(ingestion_timeout_secs) = collaborators.ingestion_timeout_secs {
                self.collaborators.ingestion_timeout_secs = ingestion_timeout_secs;
            }
            if let Some(storage_timeout_secs) = collaborators.storage_timeout_secs {
                self.collaborators.storage_timeout_secs = storage_timeout_secs;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("FLYWHEEL_DATABASE_URL") {
            self.database.url = value;
        }
        if let Some(value) = read_env("FLYWHEEL_DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections =
                parse_u32("FLYWHEEL_DATABASE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("FLYWHEEL_DATABASE_TIMEOUT_SECS") {
            self.database.timeout_secs = parse_u64("FLYWHEEL_DATABASE_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("FLYWHEEL_ANALYSIS_MIN_DATA_POINTS") {
            self.analysis.min_data_points =
                parse_u32("FLYWHEEL_ANALYSIS_MIN_DATA_POINTS", &value)?;
        }
        if let Some(value) = read_env("FLYWHEEL_ANALYSIS_TREND_WINDOW_DAYS") {
            self.analysis.trend_window_days =
                parse_u32("FLYWHEEL_ANALYSIS_TREND_WINDOW_DAYS", &value)?;
        }
        if let Some(value) = read_env("FLYWHEEL_ANALYSIS_TOP_OPPORTUNITIES") {
            self.analysis.top_opportunities =
                parse_u32("FLYWHEEL_ANALYSIS_TOP_OPPORTUNITIES", &value)?;
        }
        if let Some(value) = read_env("FLYWHEEL_ANALYSIS_MAX_CONCURRENCY") {
            self.analysis.max_concurrency =
                parse_u32("FLYWHEEL_ANALYSIS_MAX_CONCURRENCY", &value)?;
        }

        if let Some(value) = read_env("FLYWHEEL_COLLABORATORS_INGESTION_TIMEOUT_SECS") {
            self.collaborators.ingestion_timeout_secs =
                parse_u64("FLYWHEEL_COLLABORATORS_INGESTION_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = read_env("FLYWHEEL_COLLABORATORS_STORAGE_TIMEOUT_SECS") {
            self.collaborators.storage_timeout_secs =
                parse_u64("FLYWHEEL_COLLABORATORS_STORAGE_TIMEOUT_SECS", &value)?;
        }

        let log_level =
            read_env("FLYWHEEL_LOGGING_LEVEL").or_else(|| read_env("FLYWHEEL_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("FLYWHEEL_LOGGING_FORMAT").or_else(|| read_env("FLYWHEEL_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(database_url) = overrides.database_url {
            self.database.url = database_url;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(log_format) = overrides.log_format {
            self.logging.format = log_format;
        }
        if let Some(min_data_points) = overrides.min_data_points {
            self.analysis.min_data_points = min_data_points;
        }
        if let Some(trend_window_days) = overrides.trend_window_days {
            self.analysis.trend_window_days = trend_window_days;
        }
        if let Some(top_opportunities) = overrides.top_opportunities {
            self.analysis.top_opportunities = top_opportunities;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_database(&self.database)?;
        validate_analysis(&self.analysis)?;
        validate_collaborators(&self.collaborators)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

/// The config file `load` would read, if any.
pub fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    DEFAULT_CONFIG_FILES.iter().map(PathBuf::from).find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_database(database: &DatabaseConfig) -> Result<(), ConfigError> {
    let url = database.url.trim();
    let sqlite_url =
        url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:";
    if !sqlite_url {
        return Err(ConfigError::Validation(
            "database.url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)"
                .to_string(),
        ));
    }

    if database.max_connections == 0 {
        return Err(ConfigError::Validation(
            "database.max_connections must be greater than zero".to_string(),
        ));
    }

    if database.timeout_secs == 0 || database.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "database.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_analysis(analysis: &AnalysisConfig) -> Result<(), ConfigError> {
    let positive = [
        ("analysis.min_data_points", analysis.min_data_points),
        ("analysis.trend_window_days", analysis.trend_window_days),
        ("analysis.top_opportunities", analysis.top_opportunities),
    ];
    if let Some((key, _)) = positive.iter().find(|(_, value)| *value == 0) {
        return Err(ConfigError::Validation(format!("{key} must be at least 1")));
    }

    if analysis.max_concurrency == 0 || analysis.max_concurrency > 256 {
        return Err(ConfigError::Validation(
            "analysis.max_concurrency must be in range 1..=256".to_string(),
        ));
    }

    Ok(())
}

fn validate_collaborators(collaborators: &CollaboratorConfig) -> Result<(), ConfigError> {
    for (key, value) in [
        ("collaborators.ingestion_timeout_secs", collaborators.ingestion_timeout_secs),
        ("collaborators.storage_timeout_secs", collaborators.storage_timeout_secs),
    ] {
        if value == 0 || value > 600 {
            return Err(ConfigError::Validation(format!("{key} must be in range 1..=600")));
        }
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    database: Option<DatabasePatch>,
    analysis: Option<AnalysisPatch>,
    collaborators: Option<CollaboratorPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct AnalysisPatch {
    min_data_points: Option<u32>,
    trend_window_days: Option<u32>,
    top_opportunities: Option<u32>,
    max_concurrency: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct CollaboratorPatch {
    ingestion_timeout_secs: Option<u64>,
    storage_timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
