//! Match setup tables for the King of the Hill mode
//!
//! Every option is chosen by index from a fixed table. An out-of-range
//! score limit or hill duration index resolves to the first entry; the
//! zone scale index is clamped to the last entry.

use serde::Serialize;

use crate::util::time::TIME_SECOND_MS;

pub const SCORE_LIMIT_TABLE: [u32; 14] = [
    0, 50, 100, 150, 200, 250, 300, 350, 400, 450, 500, 750, 1000, 2000,
];

pub const HILL_DURATION_SECS_TABLE: [u64; 5] = [60, 120, 180, 240, 300];

pub const HILL_SCALE_TABLE: [f32; 7] = [1.0, 1.5, 2.0, 2.5, 3.0, 3.5, 4.0];

/// Bits of the match seed that select the zone scale
const HILL_SCALE_SHIFT: u32 = 28;
const HILL_SCALE_BITS: u32 = 0xF;

/// How the hill rotation order is chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RotationOrder {
    /// Discovery order
    Fixed,
    /// Seeded permutation, without replacement
    Shuffled,
}

/// How incoming score updates are applied to the local table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplicationPolicy {
    /// Latest message overwrites the slot
    LastWriterWins,
    /// Updates lower than the stored score are ignored
    Monotonic,
}

/// Resolved per-match options
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchConfig {
    /// 0 disables the score limit
    pub score_limit: u32,
    pub hill_duration_ms: u64,
    pub zone_scale: f32,
    pub seed: Option<u32>,
    pub team_mode: bool,
    pub rotation_order: RotationOrder,
    pub replication: ReplicationPolicy,
}

impl MatchConfig {
    /// Resolve table indices as received from match setup
    pub fn from_indices(
        score_limit_idx: i32,
        hill_duration_idx: i32,
        seed: Option<u32>,
        team_mode: bool,
    ) -> Self {
        let scale_idx = seed
            .map(|s| ((s >> HILL_SCALE_SHIFT) & HILL_SCALE_BITS) as usize)
            .unwrap_or(0);

        Self {
            score_limit: table_entry(&SCORE_LIMIT_TABLE, score_limit_idx),
            hill_duration_ms: table_entry(&HILL_DURATION_SECS_TABLE, hill_duration_idx)
                * TIME_SECOND_MS,
            zone_scale: clamped_entry(&HILL_SCALE_TABLE, scale_idx),
            seed,
            team_mode,
            rotation_order: RotationOrder::Shuffled,
            replication: ReplicationPolicy::LastWriterWins,
        }
    }

    pub fn with_rotation_order(mut self, order: RotationOrder) -> Self {
        self.rotation_order = order;
        self
    }

    pub fn with_replication(mut self, policy: ReplicationPolicy) -> Self {
        self.replication = policy;
        self
    }
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self::from_indices(0, 0, None, false)
    }
}

/// Entry at `idx`, or the first entry when `idx` is outside the table
pub fn table_entry<T: Copy>(table: &[T], idx: i32) -> T {
    usize::try_from(idx)
        .ok()
        .and_then(|i| table.get(i).copied())
        .unwrap_or(table[0])
}

/// Entry at `idx`, or the last entry when `idx` runs past the table
pub fn clamped_entry<T: Copy>(table: &[T], idx: usize) -> T {
    table[idx.min(table.len() - 1)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_limit_out_of_range_uses_default() {
        assert_eq!(table_entry(&SCORE_LIMIT_TABLE, -1), 0);
        assert_eq!(table_entry(&SCORE_LIMIT_TABLE, SCORE_LIMIT_TABLE.len() as i32), 0);
        assert_eq!(table_entry(&SCORE_LIMIT_TABLE, 99), 0);
        assert_eq!(table_entry(&SCORE_LIMIT_TABLE, 2), 100);
    }

    #[test]
    fn hill_duration_in_millis() {
        let config = MatchConfig::from_indices(0, 2, None, false);
        assert_eq!(config.hill_duration_ms, 180_000);

        let config = MatchConfig::from_indices(0, 5, None, false);
        assert_eq!(config.hill_duration_ms, 60_000);
    }

    #[test]
    fn zone_scale_from_seed_top_nibble() {
        let config = MatchConfig::from_indices(0, 0, Some(0x3000_0000), false);
        assert_eq!(config.zone_scale, 2.5);

        let config = MatchConfig::from_indices(0, 0, Some(0x6000_0000), false);
        assert_eq!(config.zone_scale, 4.0);

        // Nibbles past the end of the scale table clamp to the largest zone
        for nibble in 7..=0xFu32 {
            let config = MatchConfig::from_indices(0, 0, Some(nibble << 28 | 0x1234), false);
            assert_eq!(config.zone_scale, 4.0, "nibble {nibble:#x}");
        }

        let config = MatchConfig::from_indices(0, 0, None, false);
        assert_eq!(config.zone_scale, 1.0);
    }

    #[test]
    fn defaults() {
        let config = MatchConfig::default();
        assert_eq!(config.score_limit, 0);
        assert_eq!(config.hill_duration_ms, 60_000);
        assert_eq!(config.rotation_order, RotationOrder::Shuffled);
        assert_eq!(config.replication, ReplicationPolicy::LastWriterWins);
        assert!(!config.team_mode);
    }
}
