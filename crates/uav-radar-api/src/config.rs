//! # Server Configuration
//!
//! Environment-based configuration for the radar service.

use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use uav_simulator::{SimError, SimulationConfig};

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: '{value}'")]
    InvalidVar { key: &'static str, value: String },

    #[error(transparent)]
    Simulation(#[from] SimError),
}

/// Radar server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address
    pub server_addr: SocketAddr,

    /// Logging level
    pub log_level: String,

    /// CORS allowed origins
    pub cors_origins: Vec<String>,

    /// Simulation parameters
    pub simulation: SimulationConfig,
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a variable is set but unparsable, or the
    /// resulting simulation parameters are invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Same as [`from_env`](Self::from_env).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars { lookup };
        let defaults = SimulationConfig::default();

        let mut zone = defaults.zone;
        zone.latitude = vars.parse("RADAR_LATITUDE")?.unwrap_or(zone.latitude);
        zone.longitude = vars.parse("RADAR_LONGITUDE")?.unwrap_or(zone.longitude);
        zone.altitude = vars.parse("RADAR_ALTITUDE")?.unwrap_or(zone.altitude);
        zone.radius = vars.parse("RADAR_RADIUS_M")?.unwrap_or(zone.radius);

        let simulation = SimulationConfig {
            zone,
            max_population: vars.parse("MAX_UAVS")?.unwrap_or(defaults.max_population),
            initial_population: vars
                .parse("INITIAL_UAVS")?
                .unwrap_or(defaults.initial_population),
            growth_period: vars
                .parse("GROWTH_PERIOD_MS")?
                .map_or(defaults.growth_period, Duration::from_millis),
            motion_period: vars
                .parse("MOTION_PERIOD_MS")?
                .map_or(defaults.motion_period, Duration::from_millis),
            subscriber_buffer: vars
                .parse("SUBSCRIBER_BUFFER")?
                .unwrap_or(defaults.subscriber_buffer),
            seed: vars.parse("SIM_SEED")?,
            ..defaults
        };
        simulation.validate()?;

        Ok(Self {
            server_addr: vars
                .parse("SERVER_ADDR")?
                .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3001))),

            log_level: vars
                .get("LOG_LEVEL")
                .unwrap_or_else(|| "info".to_string()),

            cors_origins: vars
                .get("CORS_ORIGINS")
                .unwrap_or_else(|| "*".to_string())
                .split(',')
                .map(|origin| origin.trim().to_string())
                .filter(|origin| !origin.is_empty())
                .collect(),

            simulation,
        })
    }
}

struct Vars<F> {
    lookup: F,
}

impl<F> Vars<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn get(&self, key: &str) -> Option<String> {
        (self.lookup)(key)
    }

    fn parse<T: FromStr>(&self, key: &'static str) -> Result<Option<T>, ConfigError> {
        match self.get(key) {
            None => Ok(None),
            Some(value) => value
                .trim()
                .parse()
                .map(Some)
                .map_err(|_| ConfigError::InvalidVar { key, value }),
        }
    }
}
