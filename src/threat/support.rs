//! Where support squads are most useful
//!
//! Wounded allies radiate support value (heal priority with linear falloff),
//! so healers scoring positions are pulled toward them.

use crate::core::config::SupportLayerConfig;
use crate::core::types::{FactionId, GridPos, Round, SquadId};
use crate::spatial::{paint_radius, Falloff, SpatialField};
use crate::squad::SquadQuery;
use crate::threat::base::{LayerBase, ThreatLayer};
use crate::threat::distance::DistanceTrackers;

/// Buff priority when no enemy is within engagement range
const IDLE_BUFF_PRIORITY: f64 = 0.1;

/// Per-ally priorities computed this round
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AllySupport {
    pub squad: SquadId,
    /// `1 - health_percent`
    pub heal_priority: f64,
    /// Rises as enemies close in
    pub buff_priority: f64,
}

#[derive(Debug, Clone)]
pub struct SupportValueLayer {
    base: LayerBase,
    config: SupportLayerConfig,

    allies: Vec<AllySupport>,
    support_value: SpatialField<f64>,
    ally_proximity: SpatialField<u32>,

    distances: DistanceTrackers,
}

impl SupportValueLayer {
    pub fn new(faction: FactionId, config: SupportLayerConfig) -> Self {
        Self {
            base: LayerBase::new(faction),
            config,
            allies: Vec::new(),
            support_value: SpatialField::new(),
            ally_proximity: SpatialField::new(),
            distances: DistanceTrackers::new(),
        }
    }

    fn buff_priority(&mut self, squads: &dyn SquadQuery, squad: SquadId, round: Round) -> f64 {
        let range = self.config.buff_engagement_range;
        let tracker = self.distances.update_if_needed(squads, squad, round);
        match tracker.nearest_enemy_within(range) {
            Some(distance) => 1.0 - distance as f64 / (range as f64 + 1.0),
            None => IDLE_BUFF_PRIORITY,
        }
    }

    fn paint_ally(&mut self, center: GridPos, heal_priority: f64) {
        paint_radius(
            &mut self.support_value,
            center,
            self.config.heal_radius,
            heal_priority,
            Falloff::Linear,
        );

        // Plain count, the ally's own cell included
        let radius = self.config.proximity_radius;
        for dx in -radius..=radius {
            for dy in -radius..=radius {
                self.ally_proximity.add(center.offset(dx, dy), 1);
            }
        }
    }

    pub fn support_value_at(&self, pos: GridPos) -> f64 {
        self.support_value.get(pos)
    }

    /// Number of allies whose proximity radius covers `pos`
    pub fn ally_proximity_at(&self, pos: GridPos) -> u32 {
        self.ally_proximity.get(pos)
    }

    /// Ally with the highest heal priority; `None` if nobody is hurt.
    /// Ties go to the ally listed first.
    pub fn most_damaged_ally(&self) -> Option<SquadId> {
        let mut best: Option<&AllySupport> = None;
        for ally in self.allies.iter().filter(|a| a.heal_priority > 0.0) {
            if best.map_or(true, |b| ally.heal_priority > b.heal_priority) {
                best = Some(ally);
            }
        }
        best.map(|a| a.squad)
    }

    /// Allied squads within `range` (Chebyshev) of `pos`
    pub fn allies_in_heal_range(&self, squads: &dyn SquadQuery, pos: GridPos, range: i32) -> Vec<SquadId> {
        squads
            .active_squads(self.base.faction)
            .into_iter()
            .filter(|&squad| {
                squads
                    .position(squad)
                    .is_some_and(|squad_pos| pos.chebyshev_distance(&squad_pos) <= range)
            })
            .collect()
    }

    pub fn heal_priority_of(&self, squad: SquadId) -> f64 {
        self.allies
            .iter()
            .find(|a| a.squad == squad)
            .map_or(0.0, |a| a.heal_priority)
    }

    pub fn buff_priority_of(&self, squad: SquadId) -> f64 {
        self.allies
            .iter()
            .find(|a| a.squad == squad)
            .map_or(0.0, |a| a.buff_priority)
    }

    pub fn allies(&self) -> &[AllySupport] {
        &self.allies
    }

    pub fn support_field(&self) -> &SpatialField<f64> {
        &self.support_value
    }
}

impl ThreatLayer for SupportValueLayer {
    type Input<'a> = ();

    fn name(&self) -> &'static str {
        "support"
    }

    fn base(&self) -> &LayerBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut LayerBase {
        &mut self.base
    }

    fn compute(&mut self, squads: &dyn SquadQuery, _input: (), round: Round) {
        self.allies.clear();
        self.support_value.clear();
        self.ally_proximity.clear();

        let active = squads.active_squads(self.base.faction);
        self.distances.retain_active(&active);

        for squad in active {
            let Some(health) = squads.health_percent(squad) else {
                tracing::trace!("Squad {:?} has no health data, skipping", squad);
                continue;
            };
            let heal_priority = (1.0 - health).clamp(0.0, 1.0);
            let buff_priority = self.buff_priority(squads, squad, round);

            self.allies.push(AllySupport {
                squad,
                heal_priority,
                buff_priority,
            });

            if let Some(pos) = squads.position(squad) {
                self.paint_ally(pos, heal_priority);
            }
        }

        self.base.cache.mark_clean(round);
        tracing::debug!(
            "Support layer for {:?}: {} allies, {} cells (round {})",
            self.base.faction,
            self.allies.len(),
            self.support_value.len(),
            round
        );
    }

    fn mark_dirty(&mut self) {
        self.base.cache.mark_dirty();
        self.distances.mark_all_dirty();
    }
}
