use crate::models::{Weights, ALL_DIMENSIONS};
use crate::{OrchestratorError, Result};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, env, str::FromStr, time::Duration};

#[cfg(test)]
mod tests;

/// Runtime configuration for the evaluation orchestrator, loaded from
/// environment variables (with optional `.env` support).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub broker: BrokerConfig,
    pub scheduling: SchedulingConfig,
    pub weights: Weights,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokerConfig {
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulingConfig {
    pub max_concurrent_tasks: usize,
    pub max_retries: u32,
    pub task_timeout: Duration,
    pub sweep_interval: Duration,
    pub partial_results_ttl: Duration,
    pub results_pop_timeout: Duration,
    pub main_pop_timeout: Duration,
    pub hard_shutdown_deadline: Duration,
}

impl Config {
    /// Load configuration from the environment, falling back to the
    /// compiled-in defaults wherever a variable is unset.
    pub fn load() -> Result<Self> {
        match dotenvy::dotenv() {
            Ok(path) => tracing::info!("loaded .env file from {:?}", path),
            Err(e) => tracing::debug!("no .env file loaded: {e}"),
        }

        let broker = BrokerConfig {
            url: env::var("QUEUE_BROKER_URL")
                .unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string()),
        };

        let scheduling = SchedulingConfig {
            max_concurrent_tasks: parse_env(
                "MAX_CONCURRENT_TASKS",
                crate::constants::DEFAULT_MAX_CONCURRENT_TASKS,
            )?,
            max_retries: parse_env("MAX_RETRIES", crate::constants::DEFAULT_MAX_RETRIES)?,
            task_timeout: Duration::from_secs(parse_env(
                "TASK_TIMEOUT_SECS",
                crate::constants::DEFAULT_TASK_TIMEOUT_SECS,
            )?),
            sweep_interval: Duration::from_secs(parse_env(
                "SWEEP_INTERVAL_SECS",
                crate::constants::DEFAULT_SWEEP_INTERVAL_SECS,
            )?),
            partial_results_ttl: Duration::from_secs(parse_env(
                "PARTIAL_RESULTS_TTL_SECS",
                crate::constants::DEFAULT_PARTIAL_RESULTS_TTL_SECS,
            )?),
            results_pop_timeout: Duration::from_secs(parse_env(
                "RESULTS_POP_TIMEOUT_SECS",
                crate::constants::DEFAULT_RESULTS_POP_TIMEOUT_SECS,
            )?),
            main_pop_timeout: Duration::from_secs(parse_env(
                "MAIN_POP_TIMEOUT_SECS",
                crate::constants::DEFAULT_MAIN_POP_TIMEOUT_SECS,
            )?),
            hard_shutdown_deadline: Duration::from_secs(parse_env(
                "HARD_SHUTDOWN_DEADLINE_SECS",
                crate::constants::DEFAULT_HARD_SHUTDOWN_DEADLINE_SECS,
            )?),
        };

        let weights = load_weights()?;
        weights
            .validate()
            .map_err(OrchestratorError::ConfigurationError)?;

        Ok(Config {
            broker,
            scheduling,
            weights,
        })
    }
}

fn parse_env<T: FromStr>(key: &str, default: T) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw.parse::<T>().map_err(|e| {
            OrchestratorError::ConfigurationError(format!("invalid value for {key}: {e}"))
        }),
        Err(_) => Ok(default),
    }
}

/// `Weights[dimension]` env vars are named `WEIGHT_<DIMENSION>`; any
/// dimension left unset keeps its compiled-in default.
fn load_weights() -> Result<Weights> {
    let defaults = Weights::default();
    let mut map = HashMap::new();
    for dimension in ALL_DIMENSIONS {
        let key = format!("WEIGHT_{}", dimension.as_str().to_uppercase());
        let value = match env::var(&key) {
            Ok(raw) => raw.parse::<f64>().map_err(|e| {
                OrchestratorError::ConfigurationError(format!("invalid value for {key}: {e}"))
            })?,
            Err(_) => defaults.get(dimension),
        };
        map.insert(dimension, value);
    }
    Ok(Weights(map))
}
