/// Deck configuration
use cassette_core::{CassetteError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DeckConfig {
    /// Seconds between position checkpoints while playing
    #[serde(default = "default_sync_interval_secs")]
    pub sync_interval_secs: u64,

    /// Driver tick period
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Seconds a load may stay pending before it fails (0 disables)
    #[serde(default = "default_load_timeout_secs")]
    pub load_timeout_secs: u64,

    /// Step used by rewind / fast-forward buttons
    #[serde(default = "default_seek_step_secs")]
    pub seek_step_secs: f64,

    #[serde(default = "default_volume")]
    pub initial_volume: f32,

    #[serde(default = "default_rate")]
    pub initial_rate: f32,

    /// Fixed shuffle seed (random when unset)
    #[serde(default)]
    pub shuffle_seed: Option<u64>,

    /// Delay before the insert clip plays after mounting a cassette
    #[serde(default = "default_insert_sfx_delay_ms")]
    pub insert_sfx_delay_ms: u64,
}

impl Default for DeckConfig {
    fn default() -> Self {
        Self {
            sync_interval_secs: default_sync_interval_secs(),
            tick_interval_ms: default_tick_interval_ms(),
            load_timeout_secs: default_load_timeout_secs(),
            seek_step_secs: default_seek_step_secs(),
            initial_volume: default_volume(),
            initial_rate: default_rate(),
            shuffle_seed: None,
            insert_sfx_delay_ms: default_insert_sfx_delay_ms(),
        }
    }
}

impl DeckConfig {
    /// Load configuration from an optional file and the environment
    ///
    /// Environment variables use the `CASSETTE_` prefix, e.g.
    /// `CASSETTE_SYNC_INTERVAL_SECS=10`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        if let Some(path) = path {
            if path.exists() {
                settings = settings.add_source(config::File::from(path));
            }
        }

        settings = settings.add_source(
            config::Environment::with_prefix("CASSETTE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: Self = settings
            .build()
            .map_err(|e| CassetteError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| CassetteError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.sync_interval_secs == 0 {
            return Err(CassetteError::Config(
                "sync_interval_secs must be at least 1".to_string(),
            ));
        }
        if self.tick_interval_ms == 0 {
            return Err(CassetteError::Config(
                "tick_interval_ms must be at least 1".to_string(),
            ));
        }
        if !(self.seek_step_secs > 0.0) {
            return Err(CassetteError::Config(format!(
                "seek_step_secs must be positive, got {}",
                self.seek_step_secs
            )));
        }
        Ok(())
    }

    pub fn sync_interval(&self) -> Duration {
        Duration::from_secs(self.sync_interval_secs)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// `None` when the timeout is disabled
    pub fn load_timeout(&self) -> Option<Duration> {
        (self.load_timeout_secs > 0).then(|| Duration::from_secs(self.load_timeout_secs))
    }

    pub fn insert_sfx_delay(&self) -> Duration {
        Duration::from_millis(self.insert_sfx_delay_ms)
    }
}

// Default values
fn default_sync_interval_secs() -> u64 {
    5
}

fn default_tick_interval_ms() -> u64 {
    250
}

fn default_load_timeout_secs() -> u64 {
    30
}

fn default_seek_step_secs() -> f64 {
    10.0
}

fn default_volume() -> f32 {
    1.0
}

fn default_rate() -> f32 {
    1.0
}

fn default_insert_sfx_delay_ms() -> u64 {
    300
}
