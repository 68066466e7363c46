//! Application state shared across routes

use std::sync::Arc;

use crate::config::Config;
use crate::game::MatchEndedFlag;
use crate::session::StatusBoard;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// Latest snapshot published by the running session
    pub status: StatusBoard,
    pub ended: MatchEndedFlag,
}

impl AppState {
    pub fn new(config: Config, status: StatusBoard, ended: MatchEndedFlag) -> Self {
        Self {
            config: Arc::new(config),
            status,
            ended,
        }
    }
}
