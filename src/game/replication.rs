//! Score replication between participants
//!
//! Each participant scores only its own players and broadcasts their new
//! totals. Incoming updates overwrite the receiver's table.

use tracing::{debug, warn};

use super::host::{ScoreTransport, TransportError};
use super::score::{PlayerScoreTable, PlayerSlot};
use crate::config::ReplicationPolicy;
use crate::net::protocol::{ScoreDeltaMessage, SCORE_DELTA_SIZE, SCORE_UPDATE_MSG_ID};

/// Message counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplicationStats {
    pub sent: u64,
    pub applied: u64,
    pub dropped: u64,
}

#[derive(Debug, Clone)]
pub struct ReplicationSync {
    policy: ReplicationPolicy,
    stats: ReplicationStats,
}

impl ReplicationSync {
    pub fn new(policy: ReplicationPolicy) -> Self {
        Self {
            policy,
            stats: ReplicationStats::default(),
        }
    }

    pub fn policy(&self) -> ReplicationPolicy {
        self.policy
    }

    pub fn stats(&self) -> ReplicationStats {
        self.stats
    }

    /// Broadcast `slot`'s current score. The shadow only advances once the
    /// transport accepts the message.
    pub fn send<T: ScoreTransport + ?Sized>(
        &mut self,
        slot: PlayerSlot,
        table: &mut PlayerScoreTable,
        transport: &mut T,
    ) -> Result<(), TransportError> {
        let Some(score) = table.get(slot) else {
            return Ok(());
        };

        let msg = ScoreDeltaMessage::new(slot, score);
        transport.broadcast(SCORE_UPDATE_MSG_ID, &msg.encode())?;
        table.mark_broadcast(slot, score);
        self.stats.sent += 1;

        debug!(slot = slot.0, score, "Score update sent");
        Ok(())
    }

    /// Apply an incoming update. Always reports `SCORE_DELTA_SIZE` consumed.
    pub fn receive(&mut self, payload: &[u8], table: &mut PlayerScoreTable) -> usize {
        let msg = match ScoreDeltaMessage::decode(payload) {
            Ok(msg) => msg,
            Err(e) => {
                warn!(error = %e, "Dropping malformed score update");
                self.stats.dropped += 1;
                return SCORE_DELTA_SIZE;
            }
        };

        let slot = msg.player_slot();
        if !slot.is_valid() {
            warn!(slot = msg.slot, "Dropping score update for unknown slot");
            self.stats.dropped += 1;
            return SCORE_DELTA_SIZE;
        }

        let score = i32::from(msg.score);
        let apply = match self.policy {
            ReplicationPolicy::LastWriterWins => true,
            ReplicationPolicy::Monotonic => table.get(slot).map_or(false, |cur| score >= cur),
        };

        if apply {
            table.set(slot, score);
            self.stats.applied += 1;
            debug!(slot = slot.0, score, "Score update applied");
        } else {
            self.stats.dropped += 1;
            debug!(slot = slot.0, score, "Stale score update ignored");
        }

        SCORE_DELTA_SIZE
    }

    pub fn reset(&mut self) {
        self.stats = ReplicationStats::default();
    }
}

impl Default for ReplicationSync {
    fn default() -> Self {
        Self::new(ReplicationPolicy::LastWriterWins)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Outbox {
        sent: Vec<(u8, Vec<u8>)>,
        connected: bool,
    }

    impl ScoreTransport for Outbox {
        fn broadcast(&mut self, msg_id: u8, payload: &[u8]) -> Result<(), TransportError> {
            if !self.connected {
                return Err(TransportError::NotConnected);
            }
            self.sent.push((msg_id, payload.to_vec()));
            Ok(())
        }
    }

    #[test]
    fn send_encodes_and_marks_shadow() {
        let mut sync = ReplicationSync::default();
        let mut table = PlayerScoreTable::new();
        let mut outbox = Outbox {
            connected: true,
            ..Default::default()
        };
        table.set(PlayerSlot(2), 50);

        sync.send(PlayerSlot(2), &mut table, &mut outbox).unwrap();
        assert_eq!(outbox.sent, vec![(SCORE_UPDATE_MSG_ID, vec![2, 50, 0, 0])]);
        assert_eq!(table.shadow(PlayerSlot(2)), Some(50));
        assert!(!table.needs_broadcast(PlayerSlot(2)));
        assert_eq!(sync.stats().sent, 1);
    }

    #[test]
    fn failed_send_keeps_shadow() {
        let mut sync = ReplicationSync::default();
        let mut table = PlayerScoreTable::new();
        let mut outbox = Outbox::default();
        table.set(PlayerSlot(0), 3);

        assert!(sync.send(PlayerSlot(0), &mut table, &mut outbox).is_err());
        assert_eq!(table.shadow(PlayerSlot(0)), Some(0));
        assert!(table.needs_broadcast(PlayerSlot(0)));
    }

    #[test]
    fn receive_overwrites() {
        let mut sync = ReplicationSync::default();
        let mut table = PlayerScoreTable::new();
        table.set(PlayerSlot(2), 70);

        assert_eq!(sync.receive(&[2, 50, 0, 0], &mut table), 4);
        assert_eq!(table.get(PlayerSlot(2)), Some(50));
    }

    #[test]
    fn receive_out_of_range_slot() {
        let mut sync = ReplicationSync::default();
        let mut table = PlayerScoreTable::new();
        let before = table.clone();

        assert_eq!(sync.receive(&[99, 10, 0, 0], &mut table), 4);
        assert_eq!(table, before);
        assert_eq!(sync.stats().dropped, 1);
    }

    #[test]
    fn receive_truncated() {
        let mut sync = ReplicationSync::default();
        let mut table = PlayerScoreTable::new();

        assert_eq!(sync.receive(&[1], &mut table), 4);
        assert_eq!(table, PlayerScoreTable::new());
    }

    #[test]
    fn monotonic_ignores_lower_scores() {
        let mut sync = ReplicationSync::new(ReplicationPolicy::Monotonic);
        let mut table = PlayerScoreTable::new();
        table.set(PlayerSlot(1), 20);

        sync.receive(&[1, 10, 0, 0], &mut table);
        assert_eq!(table.get(PlayerSlot(1)), Some(20));

        sync.receive(&[1, 25, 0, 0], &mut table);
        assert_eq!(table.get(PlayerSlot(1)), Some(25));
        assert_eq!(sync.stats().applied, 1);
        assert_eq!(sync.stats().dropped, 1);
    }
}
