//! Latest session snapshot, shared with the status server

use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use uuid::Uuid;

use crate::game::Standings;

#[derive(Debug, Clone, Serialize)]
pub struct SessionStatus {
    pub match_id: Uuid,
    pub frame: u64,
    /// Match time since the start, milliseconds
    pub match_time_ms: u64,
    pub standings: Option<Standings>,
}

/// Cloneable handle to the published status
#[derive(Debug, Clone)]
pub struct StatusBoard {
    inner: Arc<RwLock<SessionStatus>>,
}

impl StatusBoard {
    pub fn new(match_id: Uuid) -> Self {
        Self {
            inner: Arc::new(RwLock::new(SessionStatus {
                match_id,
                frame: 0,
                match_time_ms: 0,
                standings: None,
            })),
        }
    }

    pub fn publish(&self, status: SessionStatus) {
        *self.inner.write() = status;
    }

    pub fn snapshot(&self) -> SessionStatus {
        self.inner.read().clone()
    }

    pub fn standings(&self) -> Option<Standings> {
        self.inner.read().standings.clone()
    }
}
