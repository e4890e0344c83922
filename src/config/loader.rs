//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::{DatabaseTarget, ExporterConfig};
use super::secret::secret_string;
use crate::domain::errors::ExportError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Prefix for environment variable overrides
pub const ENV_PREFIX: &str = "PLAYLIST_EXPORT";

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (`${VAR}` syntax)
/// 3. Parses the TOML into [`ExporterConfig`]
/// 4. Applies environment variable overrides (`PLAYLIST_EXPORT_*` prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns [`ExportError::Configuration`] if the file is missing or unreadable,
/// a referenced variable is unset, the TOML is malformed, or validation fails.
///
/// # Examples
///
/// ```no_run
/// use playlist_export::config::loader::load_config;
///
/// let config = load_config("playlist-export.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<ExporterConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(ExportError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        ExportError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    let contents = substitute_env_vars(&contents)?;

    let mut config: ExporterConfig = toml::from_str(&contents)
        .map_err(|e| ExportError::Configuration(format!("Failed to parse TOML: {e}")))?;

    apply_env_overrides(&mut config)?;

    config.validate().map_err(|e| {
        ExportError::Configuration(format!("Configuration validation failed: {e}"))
    })?;

    Ok(config)
}

/// Substitutes environment variables in the format `${VAR_NAME}`
///
/// Comment lines are copied verbatim. All missing variables are reported at once.
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| ExportError::Configuration(format!("Invalid substitution pattern: {e}")))?;
    let mut result = String::with_capacity(input.len());
    let mut missing_vars: Vec<String> = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in re.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    processed_line = processed_line.replace(&format!("${{{var_name}}}"), &value);
                }
                Err(_) => {
                    if !missing_vars.iter().any(|v| v == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        result.push_str(&processed_line);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(ExportError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(format!("{ENV_PREFIX}_{key}")).ok()
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Result<Option<T>> {
    match env_var(key) {
        Some(raw) => raw.parse().map(Some).map_err(|_| {
            ExportError::Configuration(format!("Invalid value for {ENV_PREFIX}_{key}: '{raw}'"))
        }),
        None => Ok(None),
    }
}

/// Applies environment variable overrides using the `PLAYLIST_EXPORT_` prefix
///
/// Variables follow the pattern `PLAYLIST_EXPORT_<SECTION>_<KEY>`, for example
/// `PLAYLIST_EXPORT_EXPORT_BATCH_SIZE` or `PLAYLIST_EXPORT_SPOTIFY_REFRESH_TOKEN`.
fn apply_env_overrides(config: &mut ExporterConfig) -> Result<()> {
    if let Some(val) = env_var("APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }

    // Spotify
    if let Some(val) = env_var("SPOTIFY_API_BASE_URL") {
        config.spotify.api_base_url = val;
    }
    if let Some(val) = env_var("SPOTIFY_ACCOUNTS_URL") {
        config.spotify.accounts_url = val;
    }
    if let Some(val) = env_var("SPOTIFY_CLIENT_ID") {
        config.spotify.client_id = val;
    }
    if let Some(val) = env_var("SPOTIFY_CLIENT_SECRET") {
        config.spotify.client_secret = Some(secret_string(val));
    }
    if let Some(val) = env_var("SPOTIFY_ACCESS_TOKEN") {
        config.spotify.access_token = Some(secret_string(val));
    }
    if let Some(val) = env_var("SPOTIFY_REFRESH_TOKEN") {
        config.spotify.refresh_token = Some(secret_string(val));
    }
    if let Some(val) = parse_env("SPOTIFY_TIMEOUT_SECONDS")? {
        config.spotify.timeout_seconds = val;
    }

    // Export
    if let Some(val) = env_var("EXPORT_STORAGE_ROOT") {
        config.export.storage_root = val;
    }
    if let Some(val) = parse_env("EXPORT_BATCH_SIZE")? {
        config.export.batch_size = val;
    }
    if let Some(val) = parse_env("EXPORT_MAX_CONCURRENT_BATCHES")? {
        config.export.max_concurrent_batches = val;
    }
    if let Some(val) = parse_env("EXPORT_JOB_MAX_ATTEMPTS")? {
        config.export.job_max_attempts = val;
    }

    // Database
    if let Some(val) = env_var("DATABASE_TARGET") {
        config.database_target = match val.to_lowercase().as_str() {
            "memory" => DatabaseTarget::Memory,
            "postgresql" => DatabaseTarget::PostgreSQL,
            other => {
                return Err(ExportError::Configuration(format!(
                    "Invalid database target '{other}'. Must be one of: memory, postgresql"
                )))
            }
        };
    }
    if let Some(ref mut pg_config) = config.postgresql {
        if let Some(val) = env_var("POSTGRESQL_CONNECTION_STRING") {
            pg_config.connection_string = secret_string(val);
        }
        if let Some(val) = parse_env("POSTGRESQL_MAX_CONNECTIONS")? {
            pg_config.max_connections = val;
        }
    }

    // Logging
    if let Some(val) = parse_env("LOGGING_LOCAL_ENABLED")? {
        config.logging.local_enabled = val;
    }
    if let Some(val) = env_var("LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }

    Ok(())
}
