//! Configuration module - environment variable parsing

pub mod tables;

pub use tables::{MatchConfig, ReplicationPolicy, RotationOrder};

use std::env;
use std::net::SocketAddr;
use std::str::FromStr;

/// Host configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Status server binding address
    pub status_addr: SocketAddr,
    /// Allowed CORS origins, comma separated
    pub client_origin: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Index into the score limit table
    pub score_limit_index: i32,
    /// Index into the hill duration table
    pub hill_duration_index: i32,
    /// Match seed; also selects the zone scale
    pub seed: Option<u32>,
    /// Aggregate scores by team
    pub team_mode: bool,
    /// Shuffle the hill rotation order
    pub random_order: bool,

    /// Simulated peers in the lobby (peer 0 hosts)
    pub peers: usize,
    /// Bots owned by each peer
    pub bots_per_peer: usize,
    /// Match timer length, 0 for no timer
    pub match_seconds: u64,
    /// Match-time speedup relative to wall clock
    pub time_scale: f32,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        // Render provides PORT env var, fall back to STATUS_ADDR or default
        let status_addr = match (env::var("PORT"), env::var("STATUS_ADDR")) {
            (Ok(port), _) => format!("0.0.0.0:{}", port)
                .parse()
                .map_err(|_| ConfigError::InvalidAddress)?,
            (_, Ok(addr)) => addr.parse().map_err(|_| ConfigError::InvalidAddress)?,
            _ => defaults.status_addr,
        };

        Ok(Self {
            status_addr,
            client_origin: env::var("CLIENT_ORIGIN").unwrap_or(defaults.client_origin),
            log_level: env::var("LOG_LEVEL").unwrap_or(defaults.log_level),

            score_limit_index: parse_or("KOTH_SCORE_LIMIT_INDEX", defaults.score_limit_index)?,
            hill_duration_index: parse_or("KOTH_HILL_DURATION_INDEX", defaults.hill_duration_index)?,
            seed: parse_optional("KOTH_SEED")?,
            team_mode: parse_or("KOTH_TEAM_MODE", defaults.team_mode)?,
            random_order: parse_or("KOTH_RANDOM_ORDER", defaults.random_order)?,

            peers: parse_or("KOTH_PEERS", defaults.peers)?,
            bots_per_peer: parse_or("KOTH_BOTS_PER_PEER", defaults.bots_per_peer)?,
            match_seconds: parse_or("KOTH_MATCH_SECONDS", defaults.match_seconds)?,
            time_scale: parse_or("KOTH_TIME_SCALE", defaults.time_scale)?,
        })
    }

    /// Match options resolved from the configured table indices
    pub fn match_config(&self) -> MatchConfig {
        let order = if self.random_order {
            RotationOrder::Shuffled
        } else {
            RotationOrder::Fixed
        };

        MatchConfig::from_indices(
            self.score_limit_index,
            self.hill_duration_index,
            self.seed,
            self.team_mode,
        )
        .with_rotation_order(order)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            status_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            client_origin: "http://localhost:3000".to_string(),
            log_level: "info".to_string(),
            score_limit_index: 2,
            hill_duration_index: 0,
            seed: None,
            team_mode: false,
            random_order: true,
            peers: 2,
            bots_per_peer: 2,
            match_seconds: 600,
            time_scale: 1.0,
        }
    }
}

fn parse_or<T: FromStr>(var: &'static str, default: T) -> Result<T, ConfigError> {
    Ok(parse_optional(var)?.unwrap_or(default))
}

fn parse_optional<T: FromStr>(var: &'static str) -> Result<Option<T>, ConfigError> {
    match env::var(var) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { var, value }),
        Err(_) => Ok(None),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {value:?}")]
    Invalid { var: &'static str, value: String },

    #[error("Invalid status address format")]
    InvalidAddress,
}
