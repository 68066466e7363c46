//! Simulated arena: hill anchors and bot-driven players

use std::f32::consts::{PI, TAU};

use glam::{Mat3, Vec3};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::game::{AnchorId, PlayerSlot, PlayerView, TeamId, ZoneAnchor, ZoneShape, MAX_PLAYERS};
use crate::util::time::TIME_SECOND_MS;

use super::SessionSettings;

pub const ARENA_RADIUS: f32 = 120.0;
pub const HILL_COUNT: u32 = 3;
const HILL_RING: f32 = ARENA_RADIUS * 0.6;
const HILL_HEIGHT: f32 = 4.0;

/// Bot movement speed, units per second of match time
const BOT_SPEED: f32 = 8.0;
/// Chance a bot heads for the active hill when picking a new target
const CHASE_CHANCE: f64 = 0.75;
/// Spread of targets around the hill center
const HILL_JITTER: f32 = 6.0;
const DEATH_CHANCE_PER_SEC: f64 = 0.01;
const RESPAWN_MS: u64 = 3 * TIME_SECOND_MS;

#[derive(Debug, Clone)]
pub struct Bot {
    pub slot: PlayerSlot,
    /// Peer that owns and scores this bot
    pub owner: usize,
    pub name: String,
    pub team: Option<TeamId>,
    pub position: Vec3,
    pub target: Vec3,
    pub respawn_at: Option<u64>,
}

impl Bot {
    pub fn alive(&self) -> bool {
        self.respawn_at.is_none()
    }

    fn view(&self, peer: usize) -> PlayerView {
        PlayerView {
            slot: self.slot,
            name: self.name.clone(),
            team: self.team,
            position: self.position,
            alive: self.alive(),
            is_local: self.owner == peer,
        }
    }
}

#[derive(Debug)]
pub struct World {
    anchors: Vec<ZoneAnchor>,
    bots: Vec<Bot>,
    now_ms: u64,
    start_ms: u64,
    end_ms: Option<u64>,
    rng: ChaCha8Rng,
}

impl World {
    pub fn generate(settings: &SessionSettings) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(settings.rng_seed);

        let anchors = (0..HILL_COUNT)
            .map(|i| {
                let angle = TAU * i as f32 / HILL_COUNT as f32 + rng.gen_range(-0.3..0.3);
                let center = Vec3::new(angle.cos(), angle.sin(), 0.0) * HILL_RING;
                if i % 2 == 0 {
                    ZoneAnchor {
                        id: AnchorId(i + 1),
                        center,
                        rotation: Vec3::ZERO,
                        basis: Mat3::from_diagonal(Vec3::new(20.0, 20.0, HILL_HEIGHT)),
                        shape: ZoneShape::Cylinder,
                    }
                } else {
                    ZoneAnchor {
                        id: AnchorId(i + 1),
                        center,
                        rotation: Vec3::new(0.0, 0.0, rng.gen_range(0.0..PI)),
                        basis: Mat3::from_diagonal(Vec3::new(24.0, 16.0, HILL_HEIGHT)),
                        shape: ZoneShape::Box,
                    }
                }
            })
            .collect();

        let total = (settings.peers * settings.bots_per_peer).min(MAX_PLAYERS);
        let bots = (0..total)
            .map(|i| {
                let position = random_point(&mut rng);
                Bot {
                    slot: PlayerSlot(i as u8),
                    owner: i / settings.bots_per_peer.max(1),
                    name: format!("bot-{i}"),
                    team: settings
                        .match_config
                        .team_mode
                        .then_some(TeamId((i % 2) as u8)),
                    position,
                    target: position,
                    respawn_at: None,
                }
            })
            .collect();

        let start_ms = settings.start_ms.max(1);
        let end_ms =
            (settings.match_seconds > 0).then(|| start_ms + settings.match_seconds * TIME_SECOND_MS);

        Self {
            anchors,
            bots,
            now_ms: start_ms,
            start_ms,
            end_ms,
            rng,
        }
    }

    pub fn anchors(&self) -> &[ZoneAnchor] {
        &self.anchors
    }

    pub fn bots(&self) -> &[Bot] {
        &self.bots
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn start_ms(&self) -> u64 {
        self.start_ms
    }

    pub fn end_ms(&self) -> Option<u64> {
        self.end_ms
    }

    pub fn timer_expired(&self) -> bool {
        self.end_ms.is_some_and(|end| self.now_ms >= end)
    }

    /// Players as seen by `peer`
    pub fn players_for(&self, peer: usize) -> Vec<PlayerView> {
        self.bots.iter().map(|bot| bot.view(peer)).collect()
    }

    /// First living bot owned by `peer`
    pub fn viewer_for(&self, peer: usize) -> Option<Vec3> {
        self.bots
            .iter()
            .find(|bot| bot.owner == peer && bot.alive())
            .map(|bot| bot.position)
    }

    /// Advance the clock and move every bot
    pub fn advance(&mut self, dt_ms: u64, hill_center: Option<Vec3>) {
        self.now_ms += dt_ms;
        let dt = dt_ms as f32 / TIME_SECOND_MS as f32;
        let death_chance = (DEATH_CHANCE_PER_SEC * dt as f64).clamp(0.0, 1.0);
        let now = self.now_ms;

        for bot in &mut self.bots {
            if let Some(respawn_at) = bot.respawn_at {
                if now >= respawn_at {
                    bot.position = random_point(&mut self.rng);
                    bot.target = bot.position;
                    bot.respawn_at = None;
                }
                continue;
            }

            if self.rng.gen_bool(death_chance) {
                bot.respawn_at = Some(now + RESPAWN_MS);
                continue;
            }

            let to_target = bot.target - bot.position;
            let distance = to_target.length();
            let stride = BOT_SPEED * dt;
            if distance <= stride {
                bot.position = bot.target;
                bot.target = pick_target(&mut self.rng, hill_center);
            } else {
                bot.position += to_target / distance * stride;
            }
        }
    }
}

fn random_point(rng: &mut ChaCha8Rng) -> Vec3 {
    let angle = rng.gen_range(0.0..TAU);
    let radius = ARENA_RADIUS * rng.gen_range(0.0f32..1.0).sqrt();
    Vec3::new(angle.cos() * radius, angle.sin() * radius, 0.0)
}

fn pick_target(rng: &mut ChaCha8Rng, hill_center: Option<Vec3>) -> Vec3 {
    match hill_center {
        Some(center) if rng.gen_bool(CHASE_CHANCE) => {
            center
                + Vec3::new(
                    rng.gen_range(-HILL_JITTER..HILL_JITTER),
                    rng.gen_range(-HILL_JITTER..HILL_JITTER),
                    0.0,
                )
        }
        _ => random_point(rng),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MatchConfig;

    fn settings(peers: usize, bots_per_peer: usize) -> SessionSettings {
        SessionSettings {
            match_config: MatchConfig::from_indices(1, 0, Some(7), true),
            peers,
            bots_per_peer,
            match_seconds: 60,
            time_scale: 1.0,
            rng_seed: 7,
            start_ms: 10_000,
        }
    }

    #[test]
    fn generation_is_seeded() {
        let a = World::generate(&settings(2, 2));
        let b = World::generate(&settings(2, 2));
        assert_eq!(a.anchors(), b.anchors());
        assert_eq!(a.anchors().len(), HILL_COUNT as usize);
        let pa: Vec<_> = a.bots().iter().map(|b| b.position).collect();
        let pb: Vec<_> = b.bots().iter().map(|b| b.position).collect();
        assert_eq!(pa, pb);
    }

    #[test]
    fn bots_split_between_peers() {
        let world = World::generate(&settings(3, 2));
        let owners: Vec<_> = world.bots().iter().map(|b| b.owner).collect();
        assert_eq!(owners, vec![0, 0, 1, 1, 2, 2]);
        assert_eq!(world.bots()[3].team, Some(TeamId(1)));

        let views = world.players_for(1);
        assert_eq!(views.iter().filter(|p| p.is_local).count(), 2);
    }

    #[test]
    fn bot_count_is_capped() {
        let world = World::generate(&settings(4, 4));
        assert_eq!(world.bots().len(), MAX_PLAYERS);
    }

    #[test]
    fn timer_window() {
        let mut world = World::generate(&settings(1, 1));
        assert_eq!(world.end_ms(), Some(70_000));
        assert!(!world.timer_expired());
        world.advance(60_000, None);
        assert!(world.timer_expired());
    }

    #[test]
    fn bots_stay_on_the_floor() {
        let mut world = World::generate(&settings(2, 2));
        let center = world.anchors()[0].center;
        for _ in 0..300 {
            world.advance(100, Some(center));
        }
        assert!(world.bots().iter().all(|b| b.position.z == 0.0));
    }
}
