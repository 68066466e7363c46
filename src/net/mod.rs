//! Network message definitions

pub mod protocol;

pub use protocol::{ProtocolError, ScoreDeltaMessage, SCORE_DELTA_SIZE, SCORE_UPDATE_MSG_ID};
