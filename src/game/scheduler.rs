//! Hill discovery and the timed rotation between hills

use tracing::{debug, info};

use super::host::{AnchorId, ZoneAnchor};
use super::mesh::{BoundaryMesh, ScrollPhase};
use super::volume::ZoneVolume;
use crate::config::RotationOrder;

/// Most hills a match will rotate between
pub const MAX_HILLS: usize = 8;

const LCG_MULTIPLIER: u32 = 1_664_525;
const LCG_INCREMENT: u32 = 1_013_904_223;

/// Linear congruential generator for the rotation order
#[derive(Debug, Clone)]
pub struct HillRng {
    state: u32,
}

impl HillRng {
    pub fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    pub fn next_u32(&mut self) -> u32 {
        self.state = self
            .state
            .wrapping_mul(LCG_MULTIPLIER)
            .wrapping_add(LCG_INCREMENT);
        self.state
    }

    /// Value in `[min, max)`; `min` when the range is empty
    pub fn range(&mut self, min: u32, max: u32) -> u32 {
        if max <= min {
            return min;
        }
        min + self.next_u32() % (max - min)
    }
}

/// Fisher-Yates permutation of `0..count`
pub fn shuffled_order(count: usize, seed: u32) -> Vec<usize> {
    let mut order: Vec<usize> = (0..count).collect();
    let mut rng = HillRng::new(seed);
    for i in (1..count).rev() {
        let j = rng.range(0, i as u32 + 1) as usize;
        order.swap(i, j);
    }
    order
}

/// A candidate zone and the per-hill state kept across ticks
#[derive(Debug, Clone)]
pub struct Hill {
    pub anchor: ZoneAnchor,
    pub scroll: ScrollPhase,
    pub mesh: BoundaryMesh,
    last_volume: Option<ZoneVolume>,
}

impl Hill {
    fn new(anchor: ZoneAnchor) -> Self {
        Self {
            anchor,
            scroll: ScrollPhase::default(),
            mesh: BoundaryMesh::new(),
            last_volume: None,
        }
    }

    pub fn id(&self) -> AnchorId {
        self.anchor.id
    }

    /// Volume for this tick. A changed pose or scale drops the mesh cache.
    pub fn volume(&mut self, scale: f32) -> ZoneVolume {
        let volume = self.anchor.volume(scale);
        if self.last_volume.is_some_and(|last| last != volume) {
            self.mesh.invalidate();
        }
        self.last_volume = Some(volume);
        volume
    }

    /// Take the anchor's latest pose; identity and animation state stay
    pub fn update_anchor(&mut self, anchor: ZoneAnchor) {
        if anchor.id == self.anchor.id {
            self.anchor = anchor;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Uninitialized,
    Initialized(RotationOrder),
}

#[derive(Debug, Clone)]
pub struct HillScheduler {
    state: SchedulerState,
    hills: Vec<Hill>,
    order: Vec<usize>,
    cycle_start_ms: Option<u64>,
}

impl Default for HillScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl HillScheduler {
    pub fn new() -> Self {
        Self {
            state: SchedulerState::Uninitialized,
            hills: Vec::new(),
            order: Vec::new(),
            cycle_start_ms: None,
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn is_initialized(&self) -> bool {
        self.state != SchedulerState::Uninitialized
    }

    pub fn hills(&self) -> &[Hill] {
        &self.hills
    }

    pub fn hill(&self, idx: usize) -> Option<&Hill> {
        self.hills.get(idx)
    }

    pub fn hill_mut(&mut self, idx: usize) -> Option<&mut Hill> {
        self.hills.get_mut(idx)
    }

    pub fn order(&self) -> &[usize] {
        &self.order
    }

    pub fn cycle_start_ms(&self) -> Option<u64> {
        self.cycle_start_ms
    }

    /// Build the hill set from discovered anchors. No-op once initialized;
    /// an empty discovery leaves the scheduler uninitialized. Returns true
    /// when this call initialized it.
    pub fn initialize(&mut self, anchors: Vec<ZoneAnchor>, order: RotationOrder, seed: u32) -> bool {
        if self.is_initialized() || anchors.is_empty() {
            return false;
        }

        self.hills = anchors.into_iter().take(MAX_HILLS).map(Hill::new).collect();
        self.order = match order {
            RotationOrder::Fixed => (0..self.hills.len()).collect(),
            RotationOrder::Shuffled => shuffled_order(self.hills.len(), seed),
        };
        self.state = SchedulerState::Initialized(order);

        info!(
            hills = self.hills.len(),
            ?order,
            seed,
            rotation = ?self.order,
            "Hills discovered"
        );
        true
    }

    /// Refresh poses for hills whose anchors are still present
    pub fn sync_anchors(&mut self, anchors: &[ZoneAnchor]) {
        for anchor in anchors {
            if let Some(hill) = self.hills.iter_mut().find(|h| h.id() == anchor.id) {
                hill.update_anchor(*anchor);
            }
        }
    }

    /// Latch the rotation origin, once per match
    pub fn ensure_cycle_start(&mut self, now_ms: u64, official_start_ms: Option<u64>) -> u64 {
        *self.cycle_start_ms.get_or_insert_with(|| {
            let start = official_start_ms.filter(|&s| s > 0).unwrap_or(now_ms);
            debug!(cycle_start_ms = start, "Hill cycle started");
            start
        })
    }

    /// Index into `hills()` of the hill active at `now_ms`
    pub fn active_index(
        &mut self,
        now_ms: u64,
        official_start_ms: Option<u64>,
        hill_duration_ms: u64,
    ) -> Option<usize> {
        if self.order.is_empty() {
            return None;
        }
        let start = self.ensure_cycle_start(now_ms, official_start_ms);
        let slot = rotation_slot(now_ms.saturating_sub(start), hill_duration_ms, self.order.len());
        self.order.get(slot).copied()
    }

    /// Milliseconds until the active hill changes
    pub fn next_rotation_in_ms(&self, now_ms: u64, hill_duration_ms: u64) -> Option<u64> {
        let start = self.cycle_start_ms?;
        if hill_duration_ms == 0 {
            return None;
        }
        let elapsed = now_ms.saturating_sub(start);
        Some(hill_duration_ms - elapsed % hill_duration_ms)
    }

    /// Drop every cached mesh, e.g. after a scale change
    pub fn invalidate_meshes(&mut self) {
        for hill in &mut self.hills {
            hill.mesh.invalidate();
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

/// Rotation position for `elapsed_ms` into the cycle
pub fn rotation_slot(elapsed_ms: u64, hill_duration_ms: u64, count: usize) -> usize {
    if count == 0 || hill_duration_ms == 0 {
        return 0;
    }
    ((elapsed_ms / hill_duration_ms) % count as u64) as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::volume::ZoneShape;
    use glam::{Mat3, Vec3};

    fn anchors(n: u32) -> Vec<ZoneAnchor> {
        (0..n)
            .map(|i| ZoneAnchor {
                id: AnchorId(100 + i),
                center: Vec3::new(i as f32 * 50.0, 0.0, 0.0),
                rotation: Vec3::ZERO,
                basis: Mat3::from_diagonal(Vec3::new(20.0, 20.0, 4.0)),
                shape: ZoneShape::Cylinder,
            })
            .collect()
    }

    #[test]
    fn lcg_sequence() {
        let mut rng = HillRng::new(1000);
        assert_eq!(rng.next_u32(), 2_678_429_223);
        assert_eq!(rng.next_u32(), 4_219_084_122);
    }

    #[test]
    fn empty_range_returns_min() {
        let mut rng = HillRng::new(1000);
        assert_eq!(rng.range(5, 5), 5);
        assert_eq!(rng.range(9, 2), 9);
        // Empty ranges leave the stream where it was
        assert_eq!(rng.next_u32(), 2_678_429_223);

        assert_eq!(rng.range(3, 4), 3);
        assert_eq!(rng.next_u32(), 2_266_909_937);
    }

    #[test]
    fn seeded_shuffle_is_reproducible() {
        assert_eq!(shuffled_order(3, 1000), vec![1, 2, 0]);
        assert_eq!(shuffled_order(3, 1000), shuffled_order(3, 1000));
        assert_eq!(shuffled_order(5, 1000), vec![1, 0, 4, 2, 3]);
        assert_eq!(shuffled_order(1, 1000), vec![0]);
        assert!(shuffled_order(0, 1000).is_empty());
    }

    #[test]
    fn shuffle_is_a_permutation() {
        for seed in [0, 1, 42, 1000, u32::MAX] {
            let mut order = shuffled_order(MAX_HILLS, seed);
            order.sort_unstable();
            assert_eq!(order, (0..MAX_HILLS).collect::<Vec<_>>());
        }
    }

    #[test]
    fn active_sequence_follows_order() {
        let mut sched = HillScheduler::new();
        assert!(sched.initialize(anchors(3), RotationOrder::Shuffled, 1000));

        let seq: Vec<_> = [1_000, 61_000, 121_000, 181_000]
            .iter()
            .map(|&now| sched.active_index(now, Some(1_000), 60_000).unwrap())
            .collect();
        assert_eq!(seq, vec![1, 2, 0, 1]);
    }

    #[test]
    fn fixed_order_is_discovery_order() {
        let mut sched = HillScheduler::new();
        sched.initialize(anchors(3), RotationOrder::Fixed, 1000);
        assert_eq!(sched.order(), &[0, 1, 2]);
        assert_eq!(sched.state(), SchedulerState::Initialized(RotationOrder::Fixed));
    }

    #[test]
    fn initialize_is_idempotent() {
        let mut sched = HillScheduler::new();
        assert!(!sched.initialize(Vec::new(), RotationOrder::Fixed, 0));
        assert_eq!(sched.state(), SchedulerState::Uninitialized);

        assert!(sched.initialize(anchors(2), RotationOrder::Fixed, 0));
        assert!(!sched.initialize(anchors(5), RotationOrder::Fixed, 0));
        assert_eq!(sched.hills().len(), 2);
    }

    #[test]
    fn hill_count_is_capped() {
        let mut sched = HillScheduler::new();
        sched.initialize(anchors(12), RotationOrder::Shuffled, 9);
        assert_eq!(sched.hills().len(), MAX_HILLS);
        assert_eq!(sched.order().len(), MAX_HILLS);
    }

    #[test]
    fn cycle_start_prefers_official_start() {
        let mut sched = HillScheduler::new();
        sched.initialize(anchors(2), RotationOrder::Fixed, 0);
        assert_eq!(sched.active_index(70_000, Some(5_000), 60_000), Some(1));
        assert_eq!(sched.cycle_start_ms(), Some(5_000));

        // Latched; a later official start is ignored
        assert_eq!(sched.active_index(70_000, Some(60_000), 60_000), Some(1));
    }

    #[test]
    fn cycle_start_falls_back_to_first_query() {
        let mut sched = HillScheduler::new();
        sched.initialize(anchors(2), RotationOrder::Fixed, 0);
        assert_eq!(sched.active_index(40_000, None, 60_000), Some(0));
        assert_eq!(sched.active_index(100_000, None, 60_000), Some(1));
        assert_eq!(sched.next_rotation_in_ms(100_000, 60_000), Some(60_000));
        assert_eq!(sched.next_rotation_in_ms(130_000, 60_000), Some(30_000));
    }

    #[test]
    fn uninitialized_has_no_active_hill() {
        let mut sched = HillScheduler::new();
        assert_eq!(sched.active_index(1_000, None, 60_000), None);
        assert_eq!(sched.next_rotation_in_ms(1_000, 60_000), None);
    }

    #[test]
    fn pose_change_invalidates_mesh() {
        let mut sched = HillScheduler::new();
        sched.initialize(anchors(1), RotationOrder::Fixed, 0);
        let hill = sched.hill_mut(0).unwrap();

        let volume = hill.volume(1.0);
        let shading = crate::game::mesh::Shading::new(0x00FF_FFFF, 0.0);
        assert!(hill.mesh.build(&volume, &shading));
        assert!(hill.mesh.segments().is_some());

        hill.volume(1.0);
        assert!(hill.mesh.segments().is_some());

        let mut moved = hill.anchor;
        moved.center.x += 3.0;
        hill.update_anchor(moved);
        hill.volume(1.0);
        assert!(hill.mesh.segments().is_none());
    }

    #[test]
    fn reset_returns_to_uninitialized() {
        let mut sched = HillScheduler::new();
        sched.initialize(anchors(3), RotationOrder::Shuffled, 1);
        sched.active_index(10, None, 60_000);
        sched.reset();
        assert_eq!(sched.state(), SchedulerState::Uninitialized);
        assert!(sched.hills().is_empty());
        assert_eq!(sched.cycle_start_ms(), None);
    }
}
