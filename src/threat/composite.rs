//! Role-weighted position scoring over all threat layers
//!
//! Owns one combat, support and positional layer for a faction and keeps
//! them in step. Lower scores are better positions.

use crate::core::config::{RoleWeights, ThreatConfig};
use crate::core::types::{FactionId, GridPos, Round, SquadId};
use crate::spatial::GridBounds;
use crate::squad::SquadQuery;
use crate::threat::base::ThreatLayer;
use crate::threat::cache::RoundCache;
use crate::threat::combat::CombatThreatLayer;
use crate::threat::positional::PositionalRiskLayer;
use crate::threat::support::SupportValueLayer;

#[derive(Debug, Clone)]
pub struct CompositeThreatEvaluator {
    faction: FactionId,
    config: ThreatConfig,

    combat: CombatThreatLayer,
    support: SupportValueLayer,
    positional: PositionalRiskLayer,

    cache: RoundCache,
}

impl CompositeThreatEvaluator {
    /// Difficulty adjustments in `config` are applied once, here.
    pub fn new(faction: FactionId, bounds: GridBounds, config: &ThreatConfig) -> Self {
        let config = config.effective();
        Self {
            faction,
            combat: CombatThreatLayer::new(faction, config.combat),
            support: SupportValueLayer::new(faction, config.support),
            positional: PositionalRiskLayer::new(faction, bounds, config.positional),
            config,
            cache: RoundCache::new(),
        }
    }

    /// Recompute every layer for `round` unless already current.
    ///
    /// Combat always runs first; positional risk reads its output.
    /// Returns whether anything was recomputed.
    pub fn update(&mut self, squads: &dyn SquadQuery, round: Round) -> bool {
        if self.cache.is_valid(round) {
            return false;
        }

        self.combat.compute(squads, (), round);
        self.support.compute(squads, (), round);
        self.positional.compute(squads, &self.combat, round);

        self.cache.mark_clean(round);
        tracing::debug!("Threat evaluator for {:?} updated for round {}", self.faction, round);
        true
    }

    /// Invalidate the evaluator and every layer, e.g. after a squad moved or died
    pub fn mark_dirty(&mut self) {
        self.cache.mark_dirty();
        self.combat.mark_dirty();
        self.support.mark_dirty();
        self.positional.mark_dirty();
    }

    pub fn is_valid(&self, round: Round) -> bool {
        self.cache.is_valid(round)
    }

    /// Weights for a squad's primary role (DPS when the role is unknown)
    pub fn role_weights_for(&self, squads: &dyn SquadQuery, squad: SquadId) -> RoleWeights {
        let role = squads.primary_role(squad).unwrap_or_default();
        self.config.roles.weights_for(role)
    }

    /// Score of `pos` for `squad`; lower is better
    pub fn role_weighted_threat(&self, squads: &dyn SquadQuery, squad: SquadId, pos: GridPos) -> f64 {
        let w = self.role_weights_for(squads, squad);

        self.combat.melee_threat_at(pos) * w.melee_weight
            + self.combat.ranged_pressure_at(pos) * w.ranged_weight
            + self.support.support_value_at(pos) * w.support_weight
            + self.positional.total_risk_at(pos) * w.positional_weight
    }

    /// Lowest-scoring candidate; the first one wins ties.
    ///
    /// An empty list yields the origin. A single candidate is returned
    /// without being scored.
    pub fn optimal_position_for_role(&self, squads: &dyn SquadQuery, squad: SquadId, candidates: &[GridPos]) -> GridPos {
        match candidates {
            [] => GridPos::default(),
            [only] => *only,
            _ => {
                let mut best = candidates[0];
                let mut best_score = self.role_weighted_threat(squads, squad, best);
                for &pos in &candidates[1..] {
                    let score = self.role_weighted_threat(squads, squad, pos);
                    if score < best_score {
                        best = pos;
                        best_score = score;
                    }
                }
                best
            }
        }
    }

    pub fn faction(&self) -> FactionId {
        self.faction
    }

    /// Effective config the layers were built with
    pub fn config(&self) -> &ThreatConfig {
        &self.config
    }

    pub fn combat(&self) -> &CombatThreatLayer {
        &self.combat
    }

    pub fn support(&self) -> &SupportValueLayer {
        &self.support
    }

    pub fn positional(&self) -> &PositionalRiskLayer {
        &self.positional
    }
}
