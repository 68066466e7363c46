//! Leaderboard aggregation and the standings view served to observers

use serde::Serialize;

use super::host::{AnchorId, PlayerView};
use super::score::{PlayerScoreTable, PlayerSlot, TeamId, MAX_PLAYERS, TEAM_MAX};
use super::victory::VictoryDecision;

/// Whoever a score is attributed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Competitor {
    Player(PlayerSlot),
    Team(TeamId),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderboardEntry {
    pub id: Competitor,
    pub label: String,
    pub score: i32,
}

/// Highest score on a leaderboard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Leader {
    pub competitor: Competitor,
    pub score: i32,
    /// Another competitor shares the top score
    pub tie: bool,
}

/// Scores aggregated per player or per team
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Leaderboard {
    entries: Vec<LeaderboardEntry>,
}

impl Leaderboard {
    /// In individual mode every named player counts once. In team mode
    /// only teams with at least one player appear.
    pub fn build(team_mode: bool, players: &[PlayerView], table: &PlayerScoreTable) -> Self {
        if team_mode {
            Self::by_team(players, table)
        } else {
            Self::by_player(players, table)
        }
    }

    fn by_player(players: &[PlayerView], table: &PlayerScoreTable) -> Self {
        let mut seen = [false; MAX_PLAYERS];
        let mut entries = Vec::new();

        for player in players {
            if !player.slot.is_valid() || player.name.is_empty() {
                continue;
            }
            if std::mem::replace(&mut seen[player.slot.index()], true) {
                continue;
            }
            entries.push(LeaderboardEntry {
                id: Competitor::Player(player.slot),
                label: player.name.clone(),
                score: table.get(player.slot).unwrap_or_default(),
            });
        }

        entries.sort_by_key(|e| e.id);
        Self { entries }
    }

    fn by_team(players: &[PlayerView], table: &PlayerScoreTable) -> Self {
        let mut seen = [false; MAX_PLAYERS];
        let mut totals: [Option<i32>; TEAM_MAX] = [None; TEAM_MAX];

        for player in players {
            let Some(team) = player.team.filter(|t| t.is_valid()) else {
                continue;
            };
            if !player.slot.is_valid() || std::mem::replace(&mut seen[player.slot.index()], true) {
                continue;
            }
            let score = table.get(player.slot).unwrap_or_default();
            let total = totals[team.index()].get_or_insert(0);
            *total = total.saturating_add(score);
        }

        let entries = totals
            .iter()
            .enumerate()
            .filter_map(|(i, total)| {
                let team = TeamId(i as u8);
                total.map(|score| LeaderboardEntry {
                    id: Competitor::Team(team),
                    label: team.name().to_string(),
                    score,
                })
            })
            .collect();

        Self { entries }
    }

    pub fn entries(&self) -> &[LeaderboardEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn leader(&self) -> Option<Leader> {
        let mut leader: Option<Leader> = None;

        for entry in &self.entries {
            match leader.as_mut() {
                Some(best) if entry.score < best.score => {}
                Some(best) if entry.score == best.score => best.tie = true,
                _ => {
                    leader = Some(Leader {
                        competitor: entry.id,
                        score: entry.score,
                        tie: false,
                    })
                }
            }
        }

        leader
    }

    /// Entries by descending score, ties in competitor order
    pub fn ranked(&self) -> Vec<LeaderboardEntry> {
        let mut ranked = self.entries.clone();
        ranked.sort_by(|a, b| b.score.cmp(&a.score).then(a.id.cmp(&b.id)));
        ranked
    }
}

/// Snapshot of the match for HUDs and the status endpoint
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Standings {
    pub team_mode: bool,
    pub score_limit: u32,
    pub entries: Vec<LeaderboardEntry>,
    /// Index of the active hill in discovery order
    pub active_hill: Option<usize>,
    pub active_anchor: Option<AnchorId>,
    /// Until the active hill changes
    pub next_rotation_ms: Option<u64>,
    pub decision: Option<VictoryDecision>,
}

impl Standings {
    pub fn leader(&self) -> Option<&LeaderboardEntry> {
        self.entries.first()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn player(slot: u8, team: Option<u8>) -> PlayerView {
        PlayerView {
            slot: PlayerSlot(slot),
            name: format!("p{slot}"),
            team: team.map(TeamId),
            position: Vec3::ZERO,
            alive: true,
            is_local: false,
        }
    }

    fn table(scores: &[(u8, i32)]) -> PlayerScoreTable {
        let mut table = PlayerScoreTable::new();
        for &(slot, score) in scores {
            table.set(PlayerSlot(slot), score);
        }
        table
    }

    #[test]
    fn individual_skips_unnamed_and_duplicates() {
        let mut unnamed = player(3, None);
        unnamed.name.clear();
        let players = vec![player(1, None), player(0, None), player(1, None), unnamed];
        let board = Leaderboard::build(false, &players, &table(&[(0, 5), (1, 7), (3, 99)]));

        let slots: Vec<_> = board.entries().iter().map(|e| e.id).collect();
        assert_eq!(
            slots,
            vec![
                Competitor::Player(PlayerSlot(0)),
                Competitor::Player(PlayerSlot(1))
            ]
        );
        let leader = board.leader().unwrap();
        assert_eq!(leader.competitor, Competitor::Player(PlayerSlot(1)));
        assert_eq!(leader.score, 7);
        assert!(!leader.tie);
    }

    #[test]
    fn team_totals_only_for_populated_teams() {
        let players = vec![player(0, Some(0)), player(1, Some(1)), player(2, Some(0))];
        let board = Leaderboard::build(true, &players, &table(&[(0, 40), (1, 60), (2, 30)]));

        assert_eq!(board.entries().len(), 2);
        assert_eq!(board.entries()[0].label, "Blue");
        assert_eq!(board.entries()[0].score, 70);
        assert_eq!(board.entries()[1].score, 60);
        assert_eq!(
            board.leader().unwrap().competitor,
            Competitor::Team(TeamId(0))
        );
    }

    #[test]
    fn equal_top_scores_tie() {
        let players = vec![player(0, None), player(1, None), player(2, None)];
        let board = Leaderboard::build(false, &players, &table(&[(0, 100), (1, 100), (2, 3)]));
        let leader = board.leader().unwrap();
        assert!(leader.tie);
        assert_eq!(leader.score, 100);
    }

    #[test]
    fn tie_below_leader_is_not_a_tie() {
        let players = vec![player(0, None), player(1, None), player(2, None)];
        let board = Leaderboard::build(false, &players, &table(&[(0, 5), (1, 5), (2, 9)]));
        let leader = board.leader().unwrap();
        assert!(!leader.tie);
        assert_eq!(leader.competitor, Competitor::Player(PlayerSlot(2)));
    }

    #[test]
    fn empty_board_has_no_leader() {
        assert!(Leaderboard::default().leader().is_none());
    }

    #[test]
    fn ranked_descending() {
        let players = vec![player(0, None), player(1, None), player(2, None)];
        let board = Leaderboard::build(false, &players, &table(&[(0, 1), (1, 9), (2, 4)]));
        let scores: Vec<_> = board.ranked().iter().map(|e| e.score).collect();
        assert_eq!(scores, vec![9, 4, 1]);
    }
}
