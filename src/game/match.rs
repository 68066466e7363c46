//! Match context and per-frame tick

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::MatchConfig;

use super::host::{MatchHost, PlayerView};
use super::mesh::Shading;
use super::replication::{ReplicationStats, ReplicationSync};
use super::scheduler::HillScheduler;
use super::score::{PlayerScoreTable, ScoreEngine, NEUTRAL_COLOR};
use super::standings::{Leaderboard, Standings};
use super::victory::{MatchEndedFlag, MatchTimer, VictoryDecision, VictoryEvaluator};
use super::volume::ZoneVolume;

/// Everything the mode keeps for one match
#[derive(Debug)]
pub struct KothMatch {
    id: Uuid,
    config: MatchConfig,
    scheduler: HillScheduler,
    scores: PlayerScoreTable,
    engine: ScoreEngine,
    replication: ReplicationSync,
    victory: VictoryEvaluator,
    active: Option<usize>,
    zone_color: u32,
}

impl KothMatch {
    pub fn new(config: MatchConfig) -> Self {
        Self::with_ended_flag(config, MatchEndedFlag::new())
    }

    /// Share an existing "match ended" flag with other subsystems
    pub fn with_ended_flag(config: MatchConfig, ended: MatchEndedFlag) -> Self {
        Self {
            id: Uuid::new_v4(),
            scheduler: HillScheduler::new(),
            scores: PlayerScoreTable::new(),
            engine: ScoreEngine::default(),
            replication: ReplicationSync::new(config.replication),
            victory: VictoryEvaluator::new(config.score_limit, ended),
            active: None,
            zone_color: NEUTRAL_COLOR,
            config,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// Apply new match options. Hill geometry picks up a new scale on the
    /// next tick.
    pub fn set_config(&mut self, config: MatchConfig) {
        if config.replication != self.replication.policy() {
            self.replication = ReplicationSync::new(config.replication);
        }
        self.victory.set_score_limit(config.score_limit);
        info!(
            match_id = %self.id,
            score_limit = config.score_limit,
            hill_duration_ms = config.hill_duration_ms,
            zone_scale = config.zone_scale,
            "Match config updated"
        );
        self.config = config;
    }

    pub fn scores(&self) -> &PlayerScoreTable {
        &self.scores
    }

    pub fn scheduler(&self) -> &HillScheduler {
        &self.scheduler
    }

    /// Index of the active hill, once hills are known
    pub fn active_hill(&self) -> Option<usize> {
        self.active
    }

    /// Current tint of the active zone, 0x00RRGGBB
    pub fn zone_color(&self) -> u32 {
        self.zone_color
    }

    pub fn decision(&self) -> Option<VictoryDecision> {
        self.victory.decision()
    }

    pub fn ended_flag(&self) -> MatchEndedFlag {
        self.victory.ended_flag()
    }

    pub fn replication_stats(&self) -> ReplicationStats {
        self.replication.stats()
    }

    /// One frame. Does nothing until the session is in a live game. Hill
    /// work waits for at least one zone anchor; the host checks for a
    /// winner on every live frame.
    pub fn tick<H: MatchHost + ?Sized>(&mut self, host: &mut H) {
        if !host.in_game() {
            return;
        }

        let now = host.now_ms();
        let players = host.players();

        if let Some(volume) = self.update_hill(host, now, &players) {
            if !self.victory.is_declared() {
                self.score(host, now, &volume, &players);
            }
        }

        if host.is_host() {
            self.check_victory(host, now, &players);
        }
    }

    /// Discover hills, rotate, tint and render the active one. Returns the
    /// active zone, or `None` while no hill is known.
    fn update_hill<H: MatchHost + ?Sized>(
        &mut self,
        host: &mut H,
        now: u64,
        players: &[PlayerView],
    ) -> Option<ZoneVolume> {
        let anchors = host.zone_anchors();
        if self.scheduler.is_initialized() {
            self.scheduler.sync_anchors(&anchors);
        } else {
            let seed = self.rotation_seed(host);
            if !self
                .scheduler
                .initialize(anchors, self.config.rotation_order, seed)
            {
                return None;
            }
        }

        let active =
            self.scheduler
                .active_index(now, host.match_start_ms(), self.config.hill_duration_ms)?;
        if self.active != Some(active) {
            self.active = Some(active);
            if let Some(hill) = self.scheduler.hill(active) {
                info!(match_id = %self.id, hill = active, anchor = hill.id().0, "Hill activated");
            }
        }

        let viewer = host.viewer_position();
        let hill = self.scheduler.hill_mut(active)?;

        let volume = hill.volume(self.config.zone_scale);
        self.zone_color = occupant_color(&volume, players);

        let mut shading = Shading::new(self.zone_color, hill.scroll.value());
        if let Some(viewer) = viewer {
            shading = shading.with_viewer(viewer);
        }
        if hill.mesh.build(&volume, &shading) {
            hill.mesh.submit(host);
        }
        hill.scroll.advance();

        Some(volume)
    }

    fn score<H: MatchHost + ?Sized>(
        &mut self,
        host: &mut H,
        now: u64,
        volume: &ZoneVolume,
        players: &[PlayerView],
    ) {
        let Some(pass) = self.engine.tick(now, volume, players, &mut self.scores) else {
            return;
        };
        if !pass.scored.is_empty() {
            debug!(match_id = %self.id, scored = pass.scored.len(), "Score tick");
        }

        for slot in pass.dirty {
            if let Err(e) = self.replication.send(slot, &mut self.scores, host) {
                warn!(match_id = %self.id, slot = slot.0, error = %e, "Score update not sent");
            }
        }
    }

    fn check_victory<H: MatchHost + ?Sized>(&mut self, host: &mut H, now: u64, players: &[PlayerView]) {
        let leader = Leaderboard::build(self.config.team_mode, players, &self.scores).leader();
        let timer = MatchTimer::from_clock(host.match_start_ms(), host.match_end_ms());

        if let Some(decision) = self.victory.evaluate(leader, timer, now) {
            host.declare_victory(&decision);
        }
    }

    /// The game's match timer ran out. Host only; true when this call
    /// declared the winner.
    pub fn on_time_up<H: MatchHost + ?Sized>(&mut self, host: &mut H) -> bool {
        if !host.is_host() {
            return false;
        }

        let players = host.players();
        let leader = Leaderboard::build(self.config.team_mode, &players, &self.scores).leader();
        let timer = MatchTimer::from_clock(host.match_start_ms(), host.match_end_ms());

        match self.victory.time_up(leader, timer) {
            Some(decision) => {
                host.declare_victory(&decision);
                true
            }
            None => false,
        }
    }

    /// Incoming score update; returns the bytes consumed
    pub fn on_score_message(&mut self, payload: &[u8]) -> usize {
        self.replication.receive(payload, &mut self.scores)
    }

    /// Clear all match state, ready for a new match
    pub fn reset(&mut self) {
        self.scheduler.reset();
        self.scores.reset();
        self.engine.reset();
        self.replication.reset();
        self.victory.reset();
        self.active = None;
        self.zone_color = NEUTRAL_COLOR;

        let previous = std::mem::replace(&mut self.id, Uuid::new_v4());
        info!(match_id = %self.id, previous = %previous, "Match reset");
    }

    pub fn standings(&self, players: &[PlayerView], now_ms: u64) -> Standings {
        let board = Leaderboard::build(self.config.team_mode, players, &self.scores);

        Standings {
            team_mode: self.config.team_mode,
            score_limit: self.config.score_limit,
            entries: board.ranked(),
            active_hill: self.active,
            active_anchor: self
                .active
                .and_then(|idx| self.scheduler.hill(idx))
                .map(|hill| hill.id()),
            next_rotation_ms: self
                .scheduler
                .next_rotation_in_ms(now_ms, self.config.hill_duration_ms),
            decision: self.victory.decision(),
        }
    }

    fn rotation_seed<H: MatchHost + ?Sized>(&self, host: &H) -> u32 {
        self.config
            .seed
            .unwrap_or_else(|| host.match_start_ms().unwrap_or_else(|| host.now_ms()) as u32)
    }
}

/// Team color of the first alive player inside the zone
fn occupant_color(volume: &ZoneVolume, players: &[PlayerView]) -> u32 {
    players
        .iter()
        .find(|p| p.alive && volume.contains(p.position))
        .and_then(|p| p.team)
        .map(|team| team.color())
        .unwrap_or(NEUTRAL_COLOR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::score::{PlayerSlot, TeamId, TEAM_COLORS};
    use glam::Vec3;

    fn player(slot: u8, team: Option<u8>, position: Vec3, alive: bool) -> PlayerView {
        PlayerView {
            slot: PlayerSlot(slot),
            name: format!("p{slot}"),
            team: team.map(TeamId),
            position,
            alive,
            is_local: true,
        }
    }

    #[test]
    fn occupant_tint() {
        let zone = ZoneVolume::cylinder(Vec3::ZERO, 10.0, 2.0);
        let players = vec![
            player(0, Some(1), Vec3::new(50.0, 0.0, 0.0), true),
            player(1, Some(2), Vec3::ZERO, false),
            player(2, Some(3), Vec3::new(1.0, 1.0, 0.0), true),
        ];
        assert_eq!(occupant_color(&zone, &players), TEAM_COLORS[3]);
        assert_eq!(occupant_color(&zone, &players[..2]), NEUTRAL_COLOR);
    }

    #[test]
    fn fresh_match_is_empty() {
        let koth = KothMatch::new(MatchConfig::default());
        assert_eq!(koth.active_hill(), None);
        assert_eq!(koth.zone_color(), NEUTRAL_COLOR);
        assert!(koth.decision().is_none());
        assert!(!koth.ended_flag().is_set());
    }

    #[test]
    fn score_messages_reach_the_table() {
        let mut koth = KothMatch::new(MatchConfig::default());
        assert_eq!(koth.on_score_message(&[4, 12, 0, 0]), 4);
        assert_eq!(koth.scores().get(PlayerSlot(4)), Some(12));

        koth.reset();
        assert_eq!(koth.scores().get(PlayerSlot(4)), Some(0));
    }

    #[test]
    fn set_config_swaps_policy() {
        use crate::config::ReplicationPolicy;

        let mut koth = KothMatch::new(MatchConfig::default());
        koth.set_config(MatchConfig::default().with_replication(ReplicationPolicy::Monotonic));
        koth.on_score_message(&[0, 9, 0, 0]);
        koth.on_score_message(&[0, 3, 0, 0]);
        assert_eq!(koth.scores().get(PlayerSlot(0)), Some(9));
    }
}
