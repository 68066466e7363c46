//! Collaborator interfaces the mode consumes from the hosting game
//!
//! Everything the match context needs from the outside world comes through
//! these traits; `MatchHost` bundles them so a tick takes a single handle.

use glam::{Mat3, Vec3};
use serde::Serialize;

use super::mesh::{FloorQuad, RingStrip};
use super::score::{PlayerSlot, TeamId};
use super::victory::VictoryDecision;
use super::volume::{ZoneShape, ZoneVolume};

/// Stable identity of a zone anchor entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct AnchorId(pub u32);

/// A zone anchor as found in the world
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoneAnchor {
    pub id: AnchorId,
    pub center: Vec3,
    pub rotation: Vec3,
    /// Unscaled width / depth / height axes
    pub basis: Mat3,
    pub shape: ZoneShape,
}

impl ZoneAnchor {
    /// Volume for this tick with the match's footprint scale applied
    pub fn volume(&self, scale: f32) -> ZoneVolume {
        ZoneVolume::new(self.center, self.rotation, self.basis, self.shape).scaled(scale)
    }
}

/// A player as reported by the registry
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerView {
    pub slot: PlayerSlot,
    pub name: String,
    pub team: Option<TeamId>,
    pub position: Vec3,
    pub alive: bool,
    /// Owned by this participant; only local players are scored here
    pub is_local: bool,
}

/// Finds zone anchor entities
pub trait ZoneSource {
    fn zone_anchors(&self) -> Vec<ZoneAnchor>;
}

/// Enumerates active players
pub trait PlayerRegistry {
    fn players(&self) -> Vec<PlayerView>;

    /// Where the local camera is, for distance shading
    fn viewer_position(&self) -> Option<Vec3> {
        None
    }
}

/// Monotonic match clock, milliseconds
pub trait MatchClock {
    fn now_ms(&self) -> u64;

    /// Official match start, when the game has one
    fn match_start_ms(&self) -> Option<u64>;

    /// Scheduled end of the match timer
    fn match_end_ms(&self) -> Option<u64>;
}

/// Session state
pub trait SessionInfo {
    fn in_game(&self) -> bool;

    /// Authoritative participant
    fn is_host(&self) -> bool;
}

/// Draw submission for the zone visual
pub trait RenderSink {
    fn submit_strip(&mut self, strip: &RingStrip);
    fn submit_quad(&mut self, quad: &FloorQuad);
}

/// Broadcast primitive for custom app messages
pub trait ScoreTransport {
    fn broadcast(&mut self, msg_id: u8, payload: &[u8]) -> Result<(), TransportError>;
}

/// Match lifecycle hooks
pub trait MatchLifecycle {
    fn declare_victory(&mut self, decision: &VictoryDecision);
}

/// Everything one tick needs
pub trait MatchHost:
    ZoneSource + PlayerRegistry + MatchClock + SessionInfo + RenderSink + ScoreTransport + MatchLifecycle
{
}

impl<T> MatchHost for T where
    T: ZoneSource
        + PlayerRegistry
        + MatchClock
        + SessionInfo
        + RenderSink
        + ScoreTransport
        + MatchLifecycle
{
}

/// Transport failures
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("No server connection")]
    NotConnected,

    #[error("Message channel closed")]
    Closed,
}
