//! Configuration validation utilities.

use super::error::{ConfigError, ConfigResult};
use super::schema::{LogOutput, LoggingConfig, PalaverConfig, ServerConfig};

/// Validates the entire configuration.
pub fn validate_config(config: &PalaverConfig) -> ConfigResult<()> {
    validate_server_config(&config.server)?;
    validate_logging_config(&config.logging)?;
    Ok(())
}

fn validate_server_config(server: &ServerConfig) -> ConfigResult<()> {
    if server.host.trim().is_empty() {
        return Err(ConfigError::validation("Server host cannot be empty"));
    }

    validate_port(server.port)?;
    validate_path(&server.base_path)?;

    Ok(())
}

fn validate_logging_config(logging: &LoggingConfig) -> ConfigResult<()> {
    if logging.output == LogOutput::File && logging.file_path.is_none() {
        return Err(ConfigError::validation(
            "File log output requires logging.file_path",
        ));
    }

    if logging.max_files == 0 {
        return Err(ConfigError::validation("max_files must be greater than 0"));
    }

    if let Some(target) = logging.filters.keys().find(|t| t.trim().is_empty()) {
        return Err(ConfigError::validation(format!(
            "Invalid log filter target: '{target}'"
        )));
    }

    Ok(())
}

fn validate_port(port: u16) -> ConfigResult<()> {
    if port == 0 {
        return Err(ConfigError::InvalidPort(port));
    }
    Ok(())
}

fn validate_path(path: &str) -> ConfigResult<()> {
    if !path.starts_with('/') {
        return Err(ConfigError::validation("Path must start with '/'"));
    }
    Ok(())
}
