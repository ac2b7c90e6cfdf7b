use super::types::Config;
use crate::config::expand_env_vars;
use regex::Regex;
use std::fs::File;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation failed:\n{}", .0.join("\n"))]
    ValidationList(Vec<String>),

    #[error("validation failed: {0}")]
    Validation(String),
}

pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    use std::io::Read;

    let mut file = File::open(path).map_err(|e| {
        ConfigError::Io(std::io::Error::new(
            e.kind(),
            format!("failed to open config file '{}': {}", path.display(), e),
        ))
    })?;

    let mut yaml_string = String::new();
    file.read_to_string(&mut yaml_string).map_err(|e| {
        ConfigError::Io(std::io::Error::new(
            e.kind(),
            format!("failed to read config file '{}': {}", path.display(), e),
        ))
    })?;

    // Expand environment variables in the YAML string before parsing
    let yaml_string = expand_env_vars(&yaml_string);

    // Secrets and identities must all have resolved by now
    check_unexpanded_vars(&yaml_string)?;

    let config: Config = serde_yaml::from_str(&yaml_string).map_err(|e| {
        ConfigError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("in file '{}': {}", path.display(), e),
        ))
    })?;

    validate_config(&config)?;

    Ok(config)
}

/// Checks for unexpanded environment variables and returns a helpful error
fn check_unexpanded_vars(yaml_string: &str) -> Result<(), ConfigError> {
    let re = Regex::new(r"\$env\{([A-Za-z_][A-Za-z0-9_]*)\}").unwrap();

    let missing: Vec<String> = re
        .captures_iter(yaml_string)
        .map(|caps| {
            format!(
                "environment variable '{}' is referenced but not set",
                &caps[1]
            )
        })
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationList(missing))
    }
}

fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let mut errors = Vec::new();

    if config.remote.url.trim().is_empty() {
        errors.push("remote.url must not be empty".to_string());
    }
    if config.remote.username.trim().is_empty() {
        errors.push("remote.username must not be empty".to_string());
    }
    if config.remote.secret.trim().is_empty() {
        errors.push("remote.secret must not be empty".to_string());
    }
    if config.remote.file_extension.trim().is_empty() {
        errors.push("remote.file_extension must not be empty".to_string());
    }

    if config.sink.url.trim().is_empty() {
        errors.push("sink.url must not be empty".to_string());
    }
    if config.sink.token.trim().is_empty() {
        errors.push("sink.token must not be empty".to_string());
    }
    if config.sink.channel_id.trim().is_empty() {
        errors.push("sink.channel_id must not be empty".to_string());
    }
    if config.sink.payload_margin == 0 {
        errors.push("sink.payload_margin must be greater than zero".to_string());
    }
    if config.sink.payload_margin > config.sink.max_payload_len {
        errors.push(format!(
            "sink.payload_margin ({}) must not exceed sink.max_payload_len ({})",
            config.sink.payload_margin, config.sink.max_payload_len
        ));
    }

    if config.scan.interval.as_secs() == 0 {
        errors.push("scan.interval must be at least one second".to_string());
    }

    if config.web.listen.trim().is_empty() {
        errors.push("web.listen must not be empty".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationList(errors))
    }
}
