use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

/// Simulated operation cost of the in-memory backend.
///
/// Each operation costs one request latency sampled between
/// `min_latency` and `max_latency`, plus `bytes / bytes_per_second` for the
/// payload it moves. Durations are written in milliseconds in TOML.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LatencyConfig {
    pub enabled: bool,
    #[serde(rename = "min_latency_ms", with = "millis")]
    pub min_latency: Duration,
    #[serde(rename = "max_latency_ms", with = "millis")]
    pub max_latency: Duration,
    pub bytes_per_second: u64,
}

impl LatencyConfig {
    /// A configuration that injects no delay.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Check the bounds of an enabled model.
    pub fn validate(&self) -> StoreResult<()> {
        if !self.enabled {
            return Ok(());
        }
        if self.min_latency >= self.max_latency {
            return Err(StoreError::InvalidConfig(format!(
                "min_latency ({:?}) must be less than max_latency ({:?})",
                self.min_latency, self.max_latency
            )));
        }
        if self.bytes_per_second == 0 {
            return Err(StoreError::InvalidConfig(
                "bytes_per_second must be positive".into(),
            ));
        }
        Ok(())
    }
}

impl Default for LatencyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_latency: Duration::from_millis(5),
            max_latency: Duration::from_millis(15),
            bytes_per_second: 1_000_000_000,
        }
    }
}

/// Configuration of an in-memory store.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub latency: LatencyConfig,
}

impl StoreConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(source: &str) -> StoreResult<Self> {
        let config: Self =
            toml::from_str(source).map_err(|e| StoreError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// A configuration without simulated latency.
    pub fn without_latency() -> Self {
        Self {
            latency: LatencyConfig::disabled(),
        }
    }

    pub fn validate(&self) -> StoreResult<()> {
        self.latency.validate()
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
