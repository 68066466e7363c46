//! King of the Hill game mode

pub mod host;
pub mod r#match;
pub mod mesh;
pub mod replication;
pub mod scheduler;
pub mod score;
pub mod standings;
pub mod victory;
pub mod volume;

pub use host::{
    AnchorId, MatchClock, MatchHost, MatchLifecycle, PlayerRegistry, PlayerView, RenderSink,
    ScoreTransport, SessionInfo, TransportError, ZoneAnchor, ZoneSource,
};
pub use mesh::{BoundaryMesh, FloorQuad, RingStrip};
pub use r#match::KothMatch;
pub use scheduler::{HillScheduler, MAX_HILLS};
pub use score::{PlayerScoreTable, PlayerSlot, TeamId, MAX_PLAYERS, TEAM_MAX};
pub use standings::{Competitor, Leaderboard, LeaderboardEntry, Standings};
pub use victory::{MatchEndedFlag, VictoryDecision, VictoryReason};
pub use volume::{ZoneShape, ZoneVolume};
