//! Per-squad Chebyshev distances to every other squad
//!
//! Recalculated lazily: a tracker only recomputes when it is dirty or is
//! asked about a different round than it last computed.

use ahash::AHashMap;
use std::collections::BTreeMap;

use crate::core::types::{FactionId, Round, SquadId};
use crate::squad::SquadQuery;
use crate::threat::cache::RoundCache;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SquadDistanceInfo {
    pub squad: SquadId,
    pub distance: i32,
}

/// Squads of one faction, by distance from the source squad
#[derive(Debug, Clone, PartialEq)]
pub struct FactionSquadDistances {
    pub faction: FactionId,
    pub squads: Vec<SquadDistanceInfo>,
    pub by_distance: BTreeMap<i32, Vec<SquadId>>,
}

#[derive(Debug, Clone)]
pub struct SquadDistanceTracker {
    source: SquadId,
    by_faction: Vec<FactionSquadDistances>,
    all_squads: Vec<SquadDistanceInfo>,
    allies_by_distance: BTreeMap<i32, Vec<SquadId>>,
    enemies_by_distance: BTreeMap<i32, Vec<SquadId>>,
    cache: RoundCache,
}

impl SquadDistanceTracker {
    pub fn new(source: SquadId) -> Self {
        Self {
            source,
            by_faction: Vec::new(),
            all_squads: Vec::new(),
            allies_by_distance: BTreeMap::new(),
            enemies_by_distance: BTreeMap::new(),
            cache: RoundCache::new(),
        }
    }

    pub fn source(&self) -> SquadId {
        self.source
    }

    pub fn mark_dirty(&mut self) {
        self.cache.mark_dirty();
    }

    pub fn is_valid(&self, round: Round) -> bool {
        self.cache.is_valid(round)
    }

    /// Recalculate if stale. Returns whether work was done.
    pub fn update(&mut self, squads: &dyn SquadQuery, round: Round) -> bool {
        if self.cache.is_valid(round) {
            return false;
        }

        self.by_faction.clear();
        self.all_squads.clear();
        self.allies_by_distance.clear();
        self.enemies_by_distance.clear();

        let source_pos = squads.position(self.source);
        let source_faction = squads.squad_faction(self.source);

        if let Some(source_pos) = source_pos {
            for faction in squads.factions() {
                let mut distances = FactionSquadDistances {
                    faction,
                    squads: Vec::new(),
                    by_distance: BTreeMap::new(),
                };

                for target in squads.active_squads(faction) {
                    if target == self.source {
                        continue;
                    }
                    let Some(target_pos) = squads.position(target) else {
                        continue;
                    };
                    let distance = source_pos.chebyshev_distance(&target_pos);
                    distances.squads.push(SquadDistanceInfo { squad: target, distance });
                    distances.by_distance.entry(distance).or_default().push(target);
                }

                let bucket = if Some(faction) == source_faction {
                    &mut self.allies_by_distance
                } else {
                    &mut self.enemies_by_distance
                };
                for info in &distances.squads {
                    bucket.entry(info.distance).or_default().push(info.squad);
                }
                self.all_squads.extend_from_slice(&distances.squads);
                self.by_faction.push(distances);
            }
        }

        self.cache.mark_clean(round);
        true
    }

    pub fn by_faction(&self, faction: FactionId) -> Option<&FactionSquadDistances> {
        self.by_faction.iter().find(|f| f.faction == faction)
    }

    pub fn all_squads(&self) -> &[SquadDistanceInfo] {
        &self.all_squads
    }

    pub fn allies_by_distance(&self) -> &BTreeMap<i32, Vec<SquadId>> {
        &self.allies_by_distance
    }

    pub fn enemies_by_distance(&self) -> &BTreeMap<i32, Vec<SquadId>> {
        &self.enemies_by_distance
    }

    /// Closest enemy within `1..=max_distance`, as a distance
    pub fn nearest_enemy_within(&self, max_distance: i32) -> Option<i32> {
        if max_distance < 1 {
            return None;
        }
        self.enemies_by_distance
            .range(1..=max_distance)
            .find(|(_, squads)| !squads.is_empty())
            .map(|(distance, _)| *distance)
    }

    pub fn nearest_enemy_distance(&self) -> Option<i32> {
        self.enemies_by_distance.keys().next().copied()
    }

    pub fn nearest_ally_distance(&self) -> Option<i32> {
        self.allies_by_distance.keys().next().copied()
    }
}

/// One tracker per squad, created on first use
#[derive(Debug, Clone, Default)]
pub struct DistanceTrackers {
    trackers: AHashMap<SquadId, SquadDistanceTracker>,
}

impl DistanceTrackers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, squad: SquadId) -> Option<&SquadDistanceTracker> {
        self.trackers.get(&squad)
    }

    /// Call after movement: every tracker recomputes on next access
    pub fn mark_all_dirty(&mut self) {
        for tracker in self.trackers.values_mut() {
            tracker.mark_dirty();
        }
    }

    pub fn update_if_needed(&mut self, squads: &dyn SquadQuery, squad: SquadId, round: Round) -> &SquadDistanceTracker {
        let tracker = self
            .trackers
            .entry(squad)
            .or_insert_with(|| SquadDistanceTracker::new(squad));
        tracker.update(squads, round);
        tracker
    }

    /// Forget trackers of squads not in `active`
    pub fn retain_active(&mut self, active: &[SquadId]) {
        self.trackers.retain(|squad, _| active.contains(squad));
    }

    pub fn len(&self) -> usize {
        self.trackers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trackers.is_empty()
    }
}
