//! Failover configuration.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::region::RegionPolicy;
use crate::source::Provider;
use crate::{Error, Result};

/// Tunables for one failover controller.
///
/// Some embeds never report an error when the network silently drops them, so
/// every load is bounded by a timeout. The window can be tuned per provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailoverConfig {
    /// Load timeout used when a provider has no override, in milliseconds.
    #[serde(default = "default_load_timeout_ms")]
    pub default_load_timeout_ms: u64,
    /// Per-provider load timeouts in milliseconds.
    #[serde(default = "default_provider_timeouts_ms")]
    pub provider_timeouts_ms: HashMap<Provider, u64>,
    /// Rules for deriving a region hint from timezone and locale.
    #[serde(default)]
    pub region: RegionPolicy,
}

fn default_load_timeout_ms() -> u64 {
    15_000
}

fn default_provider_timeouts_ms() -> HashMap<Provider, u64> {
    HashMap::from([(Provider::DirectFile, 10_000), (Provider::SocialEmbed, 20_000)])
}

impl Default for FailoverConfig {
    fn default() -> Self {
        Self {
            default_load_timeout_ms: default_load_timeout_ms(),
            provider_timeouts_ms: default_provider_timeouts_ms(),
            region: RegionPolicy::default(),
        }
    }
}

impl FailoverConfig {
    /// Parse and validate a JSON document. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Bounded wait before a load on `provider` is presumed failed.
    pub fn load_timeout(&self, provider: Provider) -> Duration {
        let ms = self
            .provider_timeouts_ms
            .get(&provider)
            .copied()
            .unwrap_or(self.default_load_timeout_ms);
        Duration::from_millis(ms)
    }

    /// Override the timeout for one provider.
    ///
    /// The timeout is kept at millisecond precision and must be at least 1 ms.
    pub fn with_provider_timeout(mut self, provider: Provider, timeout: Duration) -> Result<Self> {
        let ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        if ms == 0 {
            return Err(Error::config(format!(
                "load timeout for {provider} must be at least 1ms"
            )));
        }
        self.provider_timeouts_ms.insert(provider, ms);
        Ok(self)
    }

    pub fn with_region_policy(mut self, region: RegionPolicy) -> Self {
        self.region = region;
        self
    }

    /// Reject zero timeouts, which would fail every load immediately.
    pub fn validate(&self) -> Result<()> {
        if self.default_load_timeout_ms == 0 {
            return Err(Error::config("default_load_timeout_ms must be greater than 0"));
        }
        if let Some((provider, _)) = self.provider_timeouts_ms.iter().find(|(_, ms)| **ms == 0) {
            return Err(Error::config(format!(
                "load timeout for {provider} must be greater than 0"
            )));
        }
        Ok(())
    }

    /// Merge another config into this one, with the other config taking precedence.
    ///
    /// A non-default `default_load_timeout_ms`, per-provider entries that differ
    /// from the built-in ones and a configured region policy from `other`
    /// override the values in `self`.
    pub fn merge(&self, other: &Self) -> Self {
        let defaults = default_provider_timeouts_ms();
        let mut provider_timeouts_ms = self.provider_timeouts_ms.clone();
        provider_timeouts_ms.extend(
            other
                .provider_timeouts_ms
                .iter()
                .filter(|(provider, ms)| defaults.get(*provider) != Some(*ms))
                .map(|(provider, ms)| (*provider, *ms)),
        );

        Self {
            default_load_timeout_ms: if other.default_load_timeout_ms != default_load_timeout_ms() {
                other.default_load_timeout_ms
            } else {
                self.default_load_timeout_ms
            },
            provider_timeouts_ms,
            region: if other.region.is_configured() {
                other.region.clone()
            } else {
                self.region.clone()
            },
        }
    }
}
