//! Multi-peer lobby driving one `KothMatch` per peer

use tokio::sync::broadcast::{self, error::TryRecvError};
use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{info, warn};
use uuid::Uuid;

use crate::game::{
    FloorQuad, KothMatch, MatchClock, MatchEndedFlag, MatchLifecycle, PlayerRegistry,
    PlayerScoreTable, PlayerView, RenderSink, RingStrip, ScoreTransport, SessionInfo, Standings,
    TransportError, VictoryDecision, ZoneAnchor, ZoneSource,
};
use crate::net::SCORE_UPDATE_MSG_ID;
use crate::util::time::{frame_duration, frame_game_millis};

use super::bus::{BusFrame, BusTransport, MessageBus};
use super::status::{SessionStatus, StatusBoard};
use super::world::World;
use super::SessionSettings;

/// Peer that plays host
pub const HOST_PEER: usize = 0;

/// Draw calls a peer has submitted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub strips: u64,
    pub quads: u64,
}

struct Peer {
    index: usize,
    koth: KothMatch,
    transport: BusTransport,
    inbox: broadcast::Receiver<BusFrame>,
    render: RenderStats,
}

/// One peer's view of the world for the duration of a tick
struct PeerHost<'a> {
    peer: usize,
    world: &'a World,
    transport: &'a mut BusTransport,
    render: &'a mut RenderStats,
    declared: &'a mut Option<VictoryDecision>,
}

impl ZoneSource for PeerHost<'_> {
    fn zone_anchors(&self) -> Vec<ZoneAnchor> {
        self.world.anchors().to_vec()
    }
}

impl PlayerRegistry for PeerHost<'_> {
    fn players(&self) -> Vec<PlayerView> {
        self.world.players_for(self.peer)
    }

    fn viewer_position(&self) -> Option<glam::Vec3> {
        self.world.viewer_for(self.peer)
    }
}

impl MatchClock for PeerHost<'_> {
    fn now_ms(&self) -> u64 {
        self.world.now_ms()
    }

    fn match_start_ms(&self) -> Option<u64> {
        Some(self.world.start_ms())
    }

    fn match_end_ms(&self) -> Option<u64> {
        self.world.end_ms()
    }
}

impl SessionInfo for PeerHost<'_> {
    fn in_game(&self) -> bool {
        true
    }

    fn is_host(&self) -> bool {
        self.peer == HOST_PEER
    }
}

impl RenderSink for PeerHost<'_> {
    fn submit_strip(&mut self, _strip: &RingStrip) {
        self.render.strips += 1;
    }

    fn submit_quad(&mut self, _quad: &FloorQuad) {
        self.render.quads += 1;
    }
}

impl ScoreTransport for PeerHost<'_> {
    fn broadcast(&mut self, msg_id: u8, payload: &[u8]) -> Result<(), TransportError> {
        self.transport.broadcast(msg_id, payload)
    }
}

impl MatchLifecycle for PeerHost<'_> {
    fn declare_victory(&mut self, decision: &VictoryDecision) {
        *self.declared = Some(*decision);
    }
}

/// Deterministic in-process lobby
pub struct SimSession {
    id: Uuid,
    world: World,
    peers: Vec<Peer>,
    frame_ms: u64,
    frames: u64,
    time_up_sent: bool,
    ended: MatchEndedFlag,
    decision: Option<VictoryDecision>,
}

impl SimSession {
    pub fn new(settings: SessionSettings) -> Self {
        let world = World::generate(&settings);
        let bus = MessageBus::default();
        let ended = MatchEndedFlag::new();

        let peers = (0..settings.peers.max(1))
            .map(|index| Peer {
                index,
                koth: KothMatch::with_ended_flag(settings.match_config.clone(), ended.clone()),
                transport: bus.transport(index),
                inbox: bus.subscribe(),
                render: RenderStats::default(),
            })
            .collect();

        Self {
            id: Uuid::new_v4(),
            world,
            peers,
            frame_ms: frame_game_millis(settings.time_scale),
            frames: 0,
            time_up_sent: false,
            ended,
            decision: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Match time covered by one frame
    pub fn frame_ms(&self) -> u64 {
        self.frame_ms
    }

    pub fn peer_count(&self) -> usize {
        self.peers.len()
    }

    pub fn ended_flag(&self) -> MatchEndedFlag {
        self.ended.clone()
    }

    pub fn decision(&self) -> Option<VictoryDecision> {
        self.decision
    }

    pub fn peer_match(&self, peer: usize) -> Option<&KothMatch> {
        self.peers.get(peer).map(|p| &p.koth)
    }

    pub fn peer_scores(&self, peer: usize) -> Option<&PlayerScoreTable> {
        self.peer_match(peer).map(|koth| koth.scores())
    }

    pub fn render_stats(&self, peer: usize) -> Option<RenderStats> {
        self.peers.get(peer).map(|p| p.render)
    }

    pub fn transport_mut(&mut self, peer: usize) -> Option<&mut BusTransport> {
        self.peers.get_mut(peer).map(|p| &mut p.transport)
    }

    /// Apply every queued score message; returns how many were applied
    pub fn deliver_pending(&mut self) -> usize {
        let mut applied = 0;

        for peer in &mut self.peers {
            loop {
                match peer.inbox.try_recv() {
                    Ok(frame) => {
                        if frame.sender == peer.index || frame.msg_id != SCORE_UPDATE_MSG_ID {
                            continue;
                        }
                        peer.koth.on_score_message(&frame.payload);
                        applied += 1;
                    }
                    Err(TryRecvError::Lagged(skipped)) => {
                        warn!(session_id = %self.id, peer = peer.index, skipped, "Peer inbox lagged");
                    }
                    Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
                }
            }
        }

        applied
    }

    /// Advance one frame. Returns the victory declared during it, if any.
    pub fn step(&mut self) -> Option<VictoryDecision> {
        if self.decision.is_some() {
            return None;
        }

        let hill_center = self.peers.get(HOST_PEER).and_then(|peer| {
            let koth = &peer.koth;
            koth.active_hill()
                .and_then(|idx| koth.scheduler().hill(idx))
                .map(|hill| hill.anchor.center)
        });
        self.world.advance(self.frame_ms, hill_center);
        self.frames += 1;
        self.deliver_pending();

        let mut declared = None;

        // The game's timer notification arrives ahead of the frame's ticks
        if !self.time_up_sent && self.world.timer_expired() {
            self.time_up_sent = true;
            if let Some(peer) = self.peers.get_mut(HOST_PEER) {
                let mut host = PeerHost {
                    peer: peer.index,
                    world: &self.world,
                    transport: &mut peer.transport,
                    render: &mut peer.render,
                    declared: &mut declared,
                };
                peer.koth.on_time_up(&mut host);
            }
        }

        for peer in &mut self.peers {
            let mut host = PeerHost {
                peer: peer.index,
                world: &self.world,
                transport: &mut peer.transport,
                render: &mut peer.render,
                declared: &mut declared,
            };
            peer.koth.tick(&mut host);
        }

        if let Some(decision) = declared {
            info!(
                session_id = %self.id,
                frame = self.frames,
                winner = ?decision.winner,
                reason = ?decision.reason,
                score = decision.score,
                "Session decided"
            );
            self.decision = Some(decision);
        }
        declared
    }

    /// Standings as the host sees them
    pub fn standings(&self) -> Option<Standings> {
        let players = self.world.players_for(HOST_PEER);
        self.peer_match(HOST_PEER)
            .map(|koth| koth.standings(&players, self.world.now_ms()))
    }

    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            match_id: self.id,
            frame: self.frames,
            match_time_ms: self.world.now_ms().saturating_sub(self.world.start_ms()),
            standings: self.standings(),
        }
    }

    /// Drive frames in real time until a winner is declared or shutdown
    /// is requested
    pub async fn run(
        mut self,
        board: StatusBoard,
        mut shutdown: watch::Receiver<bool>,
    ) -> Option<VictoryDecision> {
        info!(
            session_id = %self.id,
            peers = self.peers.len(),
            players = self.world.bots().len(),
            frame_ms = self.frame_ms,
            "Session started"
        );

        let mut ticker = interval(frame_duration());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = shutdown.changed() => {
                    info!(session_id = %self.id, frame = self.frames, "Session stopped");
                    board.publish(self.status());
                    return None;
                }
            }

            let decision = self.step();
            board.publish(self.status());

            if decision.is_some() {
                return decision;
            }
        }
    }
}
