//! Run configuration.
//!
//! Defaults can be overridden from `STOCKLOOP_*` environment variables, and
//! the binary lets command-line flags override both.

use core::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use stockloop_events::{DEFAULT_MAX_CASCADE_DEPTH, DispatchMode};
use stockloop_inventory::LOW_STOCK_THRESHOLD;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// An environment variable was set but could not be parsed.
    #[error("invalid value `{value}` for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },

    /// A value parsed but is outside its allowed range.
    #[error("{field} {reason}")]
    OutOfRange { field: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    pub mode: DispatchMode,
    pub max_cascade_depth: usize,
    /// Machines are created with ids `"1"..="machines"`.
    pub machines: usize,
    pub initial_stock: i64,
    /// Number of root events to generate.
    pub events: usize,
    pub seed: u64,
    pub threshold: i64,
    /// Chance that a generated event is a sale rather than a refill.
    pub sale_probability: f64,
    /// Generated quantities fall in `1..=max_quantity`.
    pub max_quantity: i64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            mode: DispatchMode::default(),
            max_cascade_depth: DEFAULT_MAX_CASCADE_DEPTH,
            machines: 3,
            initial_stock: 10,
            events: 20,
            seed: 42,
            threshold: LOW_STOCK_THRESHOLD,
            sale_probability: 0.7,
            max_quantity: 3,
        }
    }
}

impl SimConfig {
    /// Defaults overridden by `STOCKLOOP_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each key.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        override_from(&lookup, "STOCKLOOP_MODE", &mut config.mode)?;
        override_from(&lookup, "STOCKLOOP_MAX_DEPTH", &mut config.max_cascade_depth)?;
        override_from(&lookup, "STOCKLOOP_MACHINES", &mut config.machines)?;
        override_from(&lookup, "STOCKLOOP_INITIAL_STOCK", &mut config.initial_stock)?;
        override_from(&lookup, "STOCKLOOP_EVENTS", &mut config.events)?;
        override_from(&lookup, "STOCKLOOP_SEED", &mut config.seed)?;
        override_from(&lookup, "STOCKLOOP_THRESHOLD", &mut config.threshold)?;
        override_from(&lookup, "STOCKLOOP_SALE_PROBABILITY", &mut config.sale_probability)?;
        override_from(&lookup, "STOCKLOOP_MAX_QUANTITY", &mut config.max_quantity)?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.machines == 0 {
            return Err(ConfigError::OutOfRange {
                field: "machines",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.max_cascade_depth == 0 {
            return Err(ConfigError::OutOfRange {
                field: "max_cascade_depth",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.max_quantity < 1 {
            return Err(ConfigError::OutOfRange {
                field: "max_quantity",
                reason: "must be at least 1".to_string(),
            });
        }
        if !(0.0..=1.0).contains(&self.sale_probability) {
            return Err(ConfigError::OutOfRange {
                field: "sale_probability",
                reason: "must be between 0 and 1".to_string(),
            });
        }
        Ok(())
    }
}

fn override_from<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    slot: &mut T,
) -> Result<(), ConfigError>
where
    T: FromStr,
    T::Err: core::fmt::Display,
{
    let Some(raw) = lookup(key) else {
        return Ok(());
    };
    *slot = raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        key,
        value: raw.clone(),
        reason: e.to_string(),
    })?;
    Ok(())
}
