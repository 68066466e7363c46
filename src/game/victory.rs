//! Win conditions, evaluated on the host only

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use super::standings::{Competitor, Leader};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VictoryReason {
    ScoreLimitReached,
    TimeExpired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VictoryDecision {
    pub winner: Competitor,
    pub reason: VictoryReason,
    pub score: i32,
}

/// Shared "match is over" flag, visible to every holder of a clone
#[derive(Debug, Clone, Default)]
pub struct MatchEndedFlag(Arc<AtomicBool>);

impl MatchEndedFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub fn set(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn clear(&self) {
        self.0.store(false, Ordering::Release);
    }
}

/// The game's match timer window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchTimer {
    pub start_ms: u64,
    pub end_ms: u64,
}

impl MatchTimer {
    /// A timer exists only with a nonzero start and an end after it
    pub fn from_clock(start_ms: Option<u64>, end_ms: Option<u64>) -> Option<Self> {
        let (start_ms, end_ms) = (start_ms?, end_ms?);
        (start_ms > 0 && end_ms > start_ms).then_some(Self { start_ms, end_ms })
    }

    pub fn expired(&self, now_ms: u64) -> bool {
        now_ms >= self.end_ms
    }
}

#[derive(Debug, Clone)]
pub struct VictoryEvaluator {
    score_limit: u32,
    declared: Option<VictoryDecision>,
    ended: MatchEndedFlag,
}

impl VictoryEvaluator {
    /// `score_limit` of 0 disables the score rule
    pub fn new(score_limit: u32, ended: MatchEndedFlag) -> Self {
        Self {
            score_limit,
            declared: None,
            ended,
        }
    }

    pub fn decision(&self) -> Option<VictoryDecision> {
        self.declared
    }

    pub fn is_declared(&self) -> bool {
        self.declared.is_some() || self.ended.is_set()
    }

    pub fn ended_flag(&self) -> MatchEndedFlag {
        self.ended.clone()
    }

    pub fn set_score_limit(&mut self, score_limit: u32) {
        self.score_limit = score_limit;
    }

    /// Per-frame check: score limit first, then timer expiry
    pub fn evaluate(
        &mut self,
        leader: Option<Leader>,
        timer: Option<MatchTimer>,
        now_ms: u64,
    ) -> Option<VictoryDecision> {
        if self.is_declared() {
            return None;
        }
        let leader = leader.filter(|l| !l.tie)?;

        if self.score_limit > 0 && leader.score >= self.score_limit as i32 {
            return self.latch(leader, VictoryReason::ScoreLimitReached);
        }
        if timer.is_some_and(|t| t.expired(now_ms)) {
            return self.latch(leader, VictoryReason::TimeExpired);
        }
        None
    }

    /// The game reports its timer ran out
    pub fn time_up(
        &mut self,
        leader: Option<Leader>,
        timer: Option<MatchTimer>,
    ) -> Option<VictoryDecision> {
        if self.is_declared() || timer.is_none() {
            return None;
        }
        let leader = leader.filter(|l| !l.tie)?;
        self.latch(leader, VictoryReason::TimeExpired)
    }

    fn latch(&mut self, leader: Leader, reason: VictoryReason) -> Option<VictoryDecision> {
        let decision = VictoryDecision {
            winner: leader.competitor,
            reason,
            score: leader.score,
        };
        self.declared = Some(decision);
        self.ended.set();

        info!(winner = ?decision.winner, ?reason, score = decision.score, "Victory declared");
        Some(decision)
    }

    pub fn reset(&mut self) {
        self.declared = None;
        self.ended.clear();
    }
}
