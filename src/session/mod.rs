//! Simulated lobby used by the dedicated host binary

pub mod bus;
pub mod sim;
pub mod status;
pub mod world;

pub use bus::{BusFrame, BusTransport, MessageBus};
pub use sim::{RenderStats, SimSession, HOST_PEER};
pub use status::{SessionStatus, StatusBoard};

use crate::config::{Config, MatchConfig};

/// Everything needed to set up a session
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub match_config: MatchConfig,
    pub peers: usize,
    pub bots_per_peer: usize,
    /// Match timer length, 0 for none
    pub match_seconds: u64,
    pub time_scale: f32,
    /// Seed for arena layout and bot behaviour
    pub rng_seed: u64,
    /// Official match start, milliseconds
    pub start_ms: u64,
}

impl SessionSettings {
    pub fn from_config(config: &Config, start_ms: u64) -> Self {
        let match_config = config.match_config();
        let rng_seed = match_config.seed.map(u64::from).unwrap_or(start_ms);

        Self {
            match_config,
            peers: config.peers,
            bots_per_peer: config.bots_per_peer,
            match_seconds: config.match_seconds,
            time_scale: config.time_scale,
            rng_seed,
            start_ms,
        }
    }
}
