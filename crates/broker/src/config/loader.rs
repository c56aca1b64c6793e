use rust_decimal::Decimal;
use std::path::Path;
use thiserror::Error;

use super::types::MeridianConfig;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] serde_json::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Load configuration from a JSON file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<MeridianConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    load_config_from_str(&content)
}

/// Load configuration from a JSON string
pub fn load_config_from_str(json: &str) -> Result<MeridianConfig, ConfigError> {
    let config: MeridianConfig = serde_json::from_str(json)?;
    config.validate()?;
    Ok(config)
}

/// Load the default embedded configuration
pub fn load_default_config() -> Result<MeridianConfig, ConfigError> {
    let default_config = include_str!("default_config.json");
    load_config_from_str(default_config)
}

fn require_positive(field: &str, value: Decimal) -> Result<(), ConfigError> {
    if value <= Decimal::ZERO {
        return Err(ConfigError::Invalid(format!(
            "{} must be positive, got {}",
            field, value
        )));
    }
    Ok(())
}

impl MeridianConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.paper.initial_balance < Decimal::ZERO {
            return Err(ConfigError::Invalid(
                "paper.initial_balance must not be negative".to_string(),
            ));
        }
        if self.live.gateway_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "live.gateway_timeout_ms must be positive".to_string(),
            ));
        }

        let execution = &self.execution;
        require_positive("execution.liquidity_multiplier", execution.liquidity_multiplier)?;
        if execution.fees.maker_bps < Decimal::ZERO || execution.fees.taker_bps < Decimal::ZERO {
            return Err(ConfigError::Invalid(
                "execution.fees must not be negative".to_string(),
            ));
        }
        let fallback = &execution.fallback_quote;
        if fallback.bid > fallback.ask {
            return Err(ConfigError::Invalid(format!(
                "execution.fallback_quote bid {} above ask {}",
                fallback.bid, fallback.ask
            )));
        }

        if self.risk.max_orders_per_minute == 0 {
            return Err(ConfigError::Invalid(
                "risk.max_orders_per_minute must be positive".to_string(),
            ));
        }
        require_positive("risk.max_daily_loss", self.risk.max_daily_loss)?;
        require_positive("risk.max_position_size", self.risk.max_position_size)?;
        require_positive("risk.max_total_exposure", self.risk.max_total_exposure)?;
        Ok(())
    }
}
