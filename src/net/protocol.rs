//! Score replication wire format
//!
//! One fixed-size record per update, sent as a custom app message:
//!
//! | offset | size | field              |
//! |--------|------|--------------------|
//! | 0      | 1    | player slot        |
//! | 1      | 2    | score, i16 LE      |
//! | 3      | 1    | reserved, always 0 |

use bytes::{Buf, BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};

use crate::game::score::PlayerSlot;

/// Custom app message id for score updates
pub const SCORE_UPDATE_MSG_ID: u8 = 0x2C;

/// Encoded size of a `ScoreDeltaMessage`
pub const SCORE_DELTA_SIZE: usize = 4;

/// A player's new total score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreDeltaMessage {
    pub slot: u8,
    pub score: i16,
    pub reserved: u8,
}

impl ScoreDeltaMessage {
    /// Scores beyond the i16 range saturate
    pub fn new(slot: PlayerSlot, score: i32) -> Self {
        let score = score.clamp(i16::MIN as i32, i16::MAX as i32) as i16;
        Self {
            slot: slot.0,
            score,
            reserved: 0,
        }
    }

    pub fn player_slot(&self) -> PlayerSlot {
        PlayerSlot(self.slot)
    }

    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(SCORE_DELTA_SIZE);
        self.encode_into(&mut buf);
        buf.freeze()
    }

    pub fn encode_into<B: BufMut>(&self, buf: &mut B) {
        buf.put_u8(self.slot);
        buf.put_i16_le(self.score);
        buf.put_u8(self.reserved);
    }

    /// Decode the leading record of `payload`; trailing bytes are ignored
    pub fn decode(mut payload: &[u8]) -> Result<Self, ProtocolError> {
        if payload.len() < SCORE_DELTA_SIZE {
            return Err(ProtocolError::Truncated {
                expected: SCORE_DELTA_SIZE,
                actual: payload.len(),
            });
        }

        Ok(Self {
            slot: payload.get_u8(),
            score: payload.get_i16_le(),
            reserved: payload.get_u8(),
        })
    }
}

/// Wire decoding errors
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    #[error("Score update truncated: expected {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_layout() {
        let msg = ScoreDeltaMessage::new(PlayerSlot(3), 0x0102);
        assert_eq!(&msg.encode()[..], &[3, 0x02, 0x01, 0]);
    }

    #[test]
    fn negative_scores_survive() {
        let bytes = [7, 0xFE, 0xFF, 0];
        let msg = ScoreDeltaMessage::decode(&bytes).unwrap();
        assert_eq!(msg.slot, 7);
        assert_eq!(msg.score, -2);
    }

    #[test]
    fn oversized_scores_saturate() {
        assert_eq!(ScoreDeltaMessage::new(PlayerSlot(0), 100_000).score, i16::MAX);
        assert_eq!(ScoreDeltaMessage::new(PlayerSlot(0), -100_000).score, i16::MIN);
    }

    #[test]
    fn truncated_payload() {
        assert_eq!(
            ScoreDeltaMessage::decode(&[1, 2]),
            Err(ProtocolError::Truncated {
                expected: 4,
                actual: 2
            })
        );
    }

    #[test]
    fn trailing_bytes_ignored() {
        let msg = ScoreDeltaMessage::decode(&[2, 50, 0, 0, 9, 9]).unwrap();
        assert_eq!(msg.player_slot(), PlayerSlot(2));
        assert_eq!(msg.score, 50);
    }
}
