//! Tactical risk from where a squad stands rather than who hits it
//!
//! Four sub-maps: flanking exposure, isolation from allies, engagement
//! pressure and retreat quality. Pressure and retreat read the combat
//! layer, which must already be computed for the same round.

use ahash::AHashMap;

use crate::core::config::PositionalLayerConfig;
use crate::core::types::{FactionId, GridPos, Round};
use crate::spatial::{cells_in_radius, GridBounds, SpatialField};
use crate::squad::SquadQuery;
use crate::threat::base::{LayerBase, ThreatLayer};
use crate::threat::combat::CombatThreatLayer;

/// Flanking risk below this counts as a safe angle to attack from
const SAFE_FLANK_THRESHOLD: f64 = 0.3;

/// Compass bucket (0..8) of an offset from an emitter.
///
/// 0 = N (dy > 0), then clockwise: NE, E, SE, S, SW, W, NW.
pub fn direction_bucket(dx: i32, dy: i32) -> u8 {
    match (dx.signum(), dy.signum()) {
        (0, 1) => 0,
        (1, 1) => 1,
        (1, 0) => 2,
        (1, -1) => 3,
        (0, -1) => 4,
        (-1, -1) => 5,
        (-1, 0) => 6,
        _ => 7,
    }
}

#[derive(Debug, Clone)]
pub struct PositionalRiskLayer {
    base: LayerBase,
    config: PositionalLayerConfig,
    bounds: GridBounds,

    flanking_risk: SpatialField<f64>,
    isolation_risk: SpatialField<f64>,
    engagement_pressure: SpatialField<f64>,
    retreat_quality: SpatialField<f64>,

    // Direction bitmask per cell, reused between rounds
    threat_directions: AHashMap<GridPos, u8>,
    ally_positions: Vec<GridPos>,

    combat_generation: Option<u64>,
}

impl PositionalRiskLayer {
    pub fn new(faction: FactionId, bounds: GridBounds, config: PositionalLayerConfig) -> Self {
        Self {
            base: LayerBase::new(faction),
            config,
            bounds,
            flanking_risk: SpatialField::new(),
            isolation_risk: SpatialField::new(),
            engagement_pressure: SpatialField::new(),
            retreat_quality: SpatialField::new(),
            threat_directions: AHashMap::new(),
            ally_positions: Vec::new(),
            combat_generation: None,
        }
    }

    fn compute_flanking_risk(&mut self, squads: &dyn SquadQuery) {
        self.threat_directions.clear();

        for enemy_faction in self.base.enemy_factions(squads) {
            for squad in squads.active_squads(enemy_faction) {
                let (Some(enemy_pos), Some(speed)) = (squads.position(squad), squads.movement_speed(squad)) else {
                    continue;
                };
                let reach = speed.max(0).saturating_add(self.config.flanking_range_bonus);

                for (pos, _) in cells_in_radius(enemy_pos, reach) {
                    let bucket = direction_bucket(pos.x - enemy_pos.x, pos.y - enemy_pos.y);
                    *self.threat_directions.entry(pos).or_default() |= 1 << bucket;
                }
            }
        }

        for (&pos, &mask) in &self.threat_directions {
            match mask.count_ones() {
                0 | 1 => {}
                2 => self.flanking_risk.set(pos, 0.5),
                _ => self.flanking_risk.set(pos, 1.0),
            }
        }
    }

    fn compute_isolation_risk(&mut self, squads: &dyn SquadQuery) {
        self.ally_positions.clear();
        self.ally_positions.extend(
            squads
                .active_squads(self.base.faction)
                .into_iter()
                .filter_map(|squad| squads.position(squad)),
        );
        if self.ally_positions.is_empty() {
            return;
        }

        let safe = self.config.isolation_safe_distance;
        let max = self.config.isolation_max_distance;

        for pos in self.bounds.cells() {
            let nearest = self
                .ally_positions
                .iter()
                .map(|ally| pos.chebyshev_distance(ally))
                .min()
                .unwrap_or(i32::MAX);

            let risk = if nearest >= max {
                1.0
            } else if nearest > safe {
                (nearest - safe) as f64 / (max - safe) as f64
            } else {
                continue;
            };
            self.isolation_risk.set(pos, risk);
        }
    }

    fn compute_engagement_pressure(&mut self, combat: &CombatThreatLayer) {
        let max_pressure = self.config.engagement_pressure_max;

        for pos in self.bounds.cells() {
            let total = combat.melee_threat_at(pos) + combat.ranged_pressure_at(pos);
            if total > 0.0 {
                self.engagement_pressure.set(pos, (total / max_pressure).min(1.0));
            }
        }
    }

    fn compute_retreat_quality(&mut self, combat: &CombatThreatLayer) {
        let threshold = self.config.retreat_safe_threshold;

        for pos in self.bounds.cells() {
            let neighbors = pos.neighbors();
            let safe = neighbors
                .iter()
                .filter(|n| combat.melee_threat_at(**n) < threshold && combat.ranged_pressure_at(**n) < threshold)
                .count();
            if safe > 0 {
                self.retreat_quality.set(pos, safe as f64 / neighbors.len() as f64);
            }
        }
    }

    /// 1.0 with three or more threat directions, 0.5 with two, else 0
    pub fn flanking_risk_at(&self, pos: GridPos) -> f64 {
        self.flanking_risk.get(pos)
    }

    /// 0 near allies, rising linearly to 1.0 at the max isolation distance
    pub fn isolation_risk_at(&self, pos: GridPos) -> f64 {
        self.isolation_risk.get(pos)
    }

    /// Normalized melee + ranged exposure, 0 to 1
    pub fn engagement_pressure_at(&self, pos: GridPos) -> f64 {
        self.engagement_pressure.get(pos)
    }

    /// Fraction of the 8 neighbors that are safe to step back into
    pub fn retreat_quality_at(&self, pos: GridPos) -> f64 {
        self.retreat_quality.get(pos)
    }

    /// Weighted blend of the four sub-risks, retreat quality inverted
    pub fn total_risk_at(&self, pos: GridPos) -> f64 {
        let w = &self.config.weights;
        let retreat_penalty = 1.0 - self.retreat_quality.get(pos);

        self.flanking_risk.get(pos) * w.flanking
            + self.isolation_risk.get(pos) * w.isolation
            + self.engagement_pressure.get(pos) * w.pressure
            + retreat_penalty * w.retreat
    }

    /// Whether `pos` is a low-exposure cell to attack `_target` from.
    ///
    /// Only the attacker's own flanking exposure is considered.
    pub fn is_flanking_position(&self, pos: GridPos, _target: GridPos) -> bool {
        self.flanking_risk.get(pos) < SAFE_FLANK_THRESHOLD
    }

    /// Generation of the combat layer data this layer was last computed from
    pub fn combat_generation(&self) -> Option<u64> {
        self.combat_generation
    }

    pub fn bounds(&self) -> GridBounds {
        self.bounds
    }
}

impl ThreatLayer for PositionalRiskLayer {
    type Input<'a> = &'a CombatThreatLayer;

    fn name(&self) -> &'static str {
        "positional"
    }

    fn base(&self) -> &LayerBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut LayerBase {
        &mut self.base
    }

    fn compute(&mut self, squads: &dyn SquadQuery, combat: &CombatThreatLayer, round: Round) {
        if !combat.is_valid(round) {
            tracing::warn!(
                "Positional layer for {:?} computed against combat data not current for round {}",
                self.base.faction,
                round
            );
        }

        self.flanking_risk.clear();
        self.isolation_risk.clear();
        self.engagement_pressure.clear();
        self.retreat_quality.clear();

        self.compute_flanking_risk(squads);
        self.compute_isolation_risk(squads);
        self.compute_engagement_pressure(combat);
        self.compute_retreat_quality(combat);

        self.combat_generation = Some(combat.generation());
        self.base.cache.mark_clean(round);
        tracing::debug!(
            "Positional layer for {:?}: {} flanked cells, {} pressured cells (round {})",
            self.base.faction,
            self.flanking_risk.len(),
            self.engagement_pressure.len(),
            round
        );
    }
}
