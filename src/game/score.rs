//! Per-player scores and the once-per-second scoring pass

use serde::Serialize;

use super::host::PlayerView;
use super::volume::ZoneVolume;
use crate::util::time::SCORE_TICK_MS;

/// Player slots in a lobby
pub const MAX_PLAYERS: usize = 10;
/// Teams in team mode
pub const TEAM_MAX: usize = 8;
/// Points per scoring tick spent inside the active zone
pub const SCORE_PER_TICK: i32 = 1;

pub const TEAM_NAMES: [&str; TEAM_MAX] = [
    "Blue", "Red", "Green", "Orange", "Yellow", "Purple", "Aqua", "Pink",
];

/// Team tints, 0x00RRGGBB
pub const TEAM_COLORS: [u32; TEAM_MAX] = [
    0x0000_66FF,
    0x00FF_2222,
    0x0022_CC22,
    0x00FF_8800,
    0x00FF_EE00,
    0x00AA_22FF,
    0x0000_DDDD,
    0x00FF_66CC,
];

/// Zone tint when nobody holds it
pub const NEUTRAL_COLOR: u32 = 0x00FF_FFFF;

/// Index into the lobby's player table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct PlayerSlot(pub u8);

impl PlayerSlot {
    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn is_valid(self) -> bool {
        self.index() < MAX_PLAYERS
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TeamId(pub u8);

impl TeamId {
    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn is_valid(self) -> bool {
        self.index() < TEAM_MAX
    }

    pub fn name(self) -> &'static str {
        TEAM_NAMES.get(self.index()).copied().unwrap_or("Unknown")
    }

    pub fn color(self) -> u32 {
        TEAM_COLORS
            .get(self.index())
            .copied()
            .unwrap_or(NEUTRAL_COLOR)
    }
}

/// Authoritative scores plus the last value broadcast per slot
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayerScoreTable {
    scores: [i32; MAX_PLAYERS],
    shadow: [i32; MAX_PLAYERS],
}

impl PlayerScoreTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, slot: PlayerSlot) -> Option<i32> {
        self.scores.get(slot.index()).copied()
    }

    /// Overwrite a slot; false when the slot is out of range
    pub fn set(&mut self, slot: PlayerSlot, score: i32) -> bool {
        match self.scores.get_mut(slot.index()) {
            Some(entry) => {
                *entry = score;
                true
            }
            None => false,
        }
    }

    /// Add to a slot, returning the new score
    pub fn add(&mut self, slot: PlayerSlot, points: i32) -> Option<i32> {
        let entry = self.scores.get_mut(slot.index())?;
        *entry = entry.saturating_add(points);
        Some(*entry)
    }

    pub fn shadow(&self, slot: PlayerSlot) -> Option<i32> {
        self.shadow.get(slot.index()).copied()
    }

    /// Score differs from what was last broadcast
    pub fn needs_broadcast(&self, slot: PlayerSlot) -> bool {
        match (self.get(slot), self.shadow(slot)) {
            (Some(score), Some(sent)) => score != sent,
            _ => false,
        }
    }

    pub fn mark_broadcast(&mut self, slot: PlayerSlot, score: i32) {
        if let Some(entry) = self.shadow.get_mut(slot.index()) {
            *entry = score;
        }
    }

    /// (slot, score) for every slot
    pub fn iter(&self) -> impl Iterator<Item = (PlayerSlot, i32)> + '_ {
        self.scores
            .iter()
            .enumerate()
            .map(|(i, &score)| (PlayerSlot(i as u8), score))
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Outcome of one scoring pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScorePass {
    /// Local players that earned a point this pass
    pub scored: Vec<PlayerSlot>,
    /// Local slots whose score differs from the last broadcast
    pub dirty: Vec<PlayerSlot>,
}

/// Fixed-interval scoring schedule
#[derive(Debug, Clone)]
pub struct ScoreEngine {
    interval_ms: u64,
    next_tick_ms: Option<u64>,
}

impl Default for ScoreEngine {
    fn default() -> Self {
        Self::new(SCORE_TICK_MS)
    }
}

impl ScoreEngine {
    pub fn new(interval_ms: u64) -> Self {
        Self {
            interval_ms,
            next_tick_ms: None,
        }
    }

    pub fn next_tick_ms(&self) -> Option<u64> {
        self.next_tick_ms
    }

    /// True when a scoring pass is due. The first call only schedules.
    pub fn due(&mut self, now_ms: u64) -> bool {
        match self.next_tick_ms {
            None => {
                self.next_tick_ms = Some(now_ms + self.interval_ms);
                false
            }
            Some(next) if now_ms >= next => {
                self.next_tick_ms = Some(now_ms + self.interval_ms);
                true
            }
            Some(_) => false,
        }
    }

    /// Run a pass if one is due
    pub fn tick(
        &mut self,
        now_ms: u64,
        zone: &ZoneVolume,
        players: &[PlayerView],
        table: &mut PlayerScoreTable,
    ) -> Option<ScorePass> {
        if !self.due(now_ms) {
            return None;
        }
        Some(score_pass(zone, players, table))
    }

    pub fn reset(&mut self) {
        self.next_tick_ms = None;
    }
}

/// Award a point to every local, alive player inside `zone`
pub fn score_pass(
    zone: &ZoneVolume,
    players: &[PlayerView],
    table: &mut PlayerScoreTable,
) -> ScorePass {
    let mut seen = [false; MAX_PLAYERS];
    let mut pass = ScorePass::default();

    for player in players.iter().filter(|p| p.is_local && p.slot.is_valid()) {
        let idx = player.slot.index();
        if std::mem::replace(&mut seen[idx], true) {
            continue;
        }

        if player.alive && zone.contains(player.position) {
            table.add(player.slot, SCORE_PER_TICK);
            pass.scored.push(player.slot);
        }
        if table.needs_broadcast(player.slot) {
            pass.dirty.push(player.slot);
        }
    }

    pass
}
