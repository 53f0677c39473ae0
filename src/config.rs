use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::game::constants::{ai, camera, clock, food, world};

/// Invalid simulation configuration
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("map dimensions must be positive (got {width}x{height})")]
    InvalidMapSize { width: f32, height: f32 },
    #[error("food target must be at least 1")]
    ZeroFoodTarget,
    #[error("vision range must be positive (got {0})")]
    InvalidVisionRange(f32),
    #[error("tick rate must be at least 1 Hz")]
    ZeroTickRate,
    #[error("zoom range is inverted or not a number ({min}, {max})")]
    InvertedZoomRange { min: f32, max: f32 },
    #[error("invalid config document: {0}")]
    Parse(String),
}

/// Simulation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// World width in world units
    pub map_width: f32,
    /// World height in world units
    pub map_height: f32,
    /// Food items the world is topped back up to every step
    pub food_target: usize,
    /// Autonomous agents kept alive at all times
    pub bot_count: usize,
    /// Sensing radius for autonomous agents
    pub vision_range: f32,
    /// Driver tick rate in Hz
    pub tick_rate: u32,
    /// Seed for the world RNG (random when unset)
    pub seed: Option<u64>,
    /// Display name of the player agent
    pub player_name: String,
    /// Camera zoom clamp
    pub min_zoom: f32,
    pub max_zoom: f32,
    /// Serve metrics over HTTP from the headless driver
    pub metrics_enabled: bool,
    /// Port for the metrics endpoint
    pub metrics_port: u16,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            map_width: world::MAP_WIDTH,
            map_height: world::MAP_HEIGHT,
            food_target: food::TARGET_COUNT,
            bot_count: ai::COUNT,
            vision_range: ai::VISION_RANGE,
            tick_rate: clock::TICK_RATE,
            seed: None,
            player_name: "Player".to_string(),
            min_zoom: camera::MIN_ZOOM,
            max_zoom: camera::MAX_ZOOM,
            metrics_enabled: false,
            metrics_port: 9090,
        }
    }
}

impl SimConfig {
    /// Load config from environment or use defaults
    pub fn load_or_default() -> Self {
        let mut config = Self::default();

        if let Some(width) = parse_env::<f32>("MAP_WIDTH") {
            if width > 0.0 {
                config.map_width = width;
            } else {
                tracing::warn!("MAP_WIDTH must be > 0, using default");
            }
        }

        if let Some(height) = parse_env::<f32>("MAP_HEIGHT") {
            if height > 0.0 {
                config.map_height = height;
            } else {
                tracing::warn!("MAP_HEIGHT must be > 0, using default");
            }
        }

        if let Some(target) = parse_env::<usize>("FOOD_TARGET") {
            if target > 0 && target <= 100_000 {
                config.food_target = target;
            } else {
                tracing::warn!("FOOD_TARGET must be 1-100000, using default");
            }
        }

        if let Some(bots) = parse_env::<usize>("BOT_COUNT") {
            if bots <= 1000 {
                config.bot_count = bots;
            } else {
                tracing::warn!("BOT_COUNT must be 0-1000, using default");
            }
        }

        if let Some(range) = parse_env::<f32>("VISION_RANGE") {
            if range > 0.0 {
                config.vision_range = range;
            } else {
                tracing::warn!("VISION_RANGE must be > 0, using default");
            }
        }

        if let Some(rate) = parse_env::<u32>("TICK_RATE") {
            if rate > 0 && rate <= 1000 {
                config.tick_rate = rate;
            } else {
                tracing::warn!("TICK_RATE must be 1-1000, using default");
            }
        }

        if let Some(seed) = parse_env::<u64>("SEED") {
            config.seed = Some(seed);
        }

        if let Ok(name) = std::env::var("PLAYER_NAME") {
            if !name.trim().is_empty() {
                config.player_name = name;
            }
        }

        if let Some(enabled) = parse_env::<bool>("METRICS_ENABLED") {
            config.metrics_enabled = enabled;
        }

        if let Some(port) = parse_env::<u16>("METRICS_PORT") {
            if port > 0 {
                config.metrics_port = port;
            } else {
                tracing::warn!("METRICS_PORT must be > 0, using default");
            }
        }

        config
    }

    /// Parse a JSON config document; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.map_width > 0.0 && self.map_height > 0.0) {
            return Err(ConfigError::InvalidMapSize {
                width: self.map_width,
                height: self.map_height,
            });
        }
        if self.food_target == 0 {
            return Err(ConfigError::ZeroFoodTarget);
        }
        if !(self.vision_range > 0.0) {
            return Err(ConfigError::InvalidVisionRange(self.vision_range));
        }
        if self.tick_rate == 0 {
            return Err(ConfigError::ZeroTickRate);
        }
        if !(self.min_zoom <= self.max_zoom) {
            return Err(ConfigError::InvertedZoomRange {
                min: self.min_zoom,
                max: self.max_zoom,
            });
        }
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("Invalid {} '{}', using default", key, raw);
            None
        }
    }
}
