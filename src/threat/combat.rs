//! Melee and ranged danger painted from every enemy squad
//!
//! Melee: `ThreatByRange[1]` with linear falloff over `speed + melee range`.
//! Ranged: `ThreatByRange[max range]` with no falloff over the max range.

use ahash::AHashMap;

use crate::core::config::CombatLayerConfig;
use crate::core::types::{FactionId, GridPos, Round, SquadId};
use crate::spatial::{paint_radius, paint_radius_tracked, Falloff, SpatialField};
use crate::squad::{has_attack_type, max_range_for, AttackType, SquadQuery, ThreatByRange, UnitAttack};
use crate::threat::base::{LayerBase, ThreatLayer};

#[derive(Debug, Clone)]
pub struct CombatThreatLayer {
    base: LayerBase,
    config: CombatLayerConfig,

    melee_by_pos: SpatialField<f64>,
    melee_by_squad: AHashMap<SquadId, f64>,

    ranged_by_pos: SpatialField<f64>,
    line_of_fire: AHashMap<SquadId, Vec<GridPos>>,
}

impl CombatThreatLayer {
    pub fn new(faction: FactionId, config: CombatLayerConfig) -> Self {
        Self {
            base: LayerBase::new(faction),
            config,
            melee_by_pos: SpatialField::new(),
            melee_by_squad: AHashMap::new(),
            ranged_by_pos: SpatialField::new(),
            line_of_fire: AHashMap::new(),
        }
    }

    fn paint_melee(&mut self, squad: SquadId, pos: GridPos, speed: i32, units: &[UnitAttack], threat: &ThreatByRange) {
        let melee_range = max_range_for(units, AttackType::is_melee, self.config.default_melee_range);
        let radius = speed.max(0).saturating_add(melee_range);
        let value = threat.melee();

        self.melee_by_squad.insert(squad, value);
        paint_radius(&mut self.melee_by_pos, pos, radius, value, Falloff::Linear);
    }

    fn paint_ranged(&mut self, squad: SquadId, pos: GridPos, units: &[UnitAttack], threat: &ThreatByRange) {
        let max_range = max_range_for(units, AttackType::is_ranged, self.config.default_ranged_range);
        let value = threat.at(max_range);

        // Reuses last round's buffer when this squad fired before
        let cells = self.line_of_fire.entry(squad).or_default();
        paint_radius_tracked(&mut self.ranged_by_pos, pos, max_range, value, Falloff::None, cells);
    }

    /// Accumulated melee threat at a cell
    pub fn melee_threat_at(&self, pos: GridPos) -> f64 {
        self.melee_by_pos.get(pos)
    }

    /// Accumulated ranged pressure at a cell
    pub fn ranged_pressure_at(&self, pos: GridPos) -> f64 {
        self.ranged_by_pos.get(pos)
    }

    /// Melee value an enemy squad painted this round (0 if it painted none)
    pub fn melee_threat_of(&self, squad: SquadId) -> f64 {
        self.melee_by_squad.get(&squad).copied().unwrap_or(0.0)
    }

    /// Cells covered by a ranged squad's fire
    pub fn line_of_fire(&self, squad: SquadId) -> &[GridPos] {
        self.line_of_fire.get(&squad).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Ranged squads whose fire covers `pos`, sorted by id
    pub fn ranged_squads_covering(&self, pos: GridPos) -> Vec<SquadId> {
        let mut covering: Vec<SquadId> = self
            .line_of_fire
            .iter()
            .filter(|(_, cells)| cells.contains(&pos))
            .map(|(squad, _)| *squad)
            .collect();
        covering.sort();
        covering
    }

    pub fn melee_field(&self) -> &SpatialField<f64> {
        &self.melee_by_pos
    }

    pub fn ranged_field(&self) -> &SpatialField<f64> {
        &self.ranged_by_pos
    }

    /// Number of completed computes, used by layers that read this one
    pub fn generation(&self) -> u64 {
        self.base.cache.generation()
    }
}

impl ThreatLayer for CombatThreatLayer {
    type Input<'a> = ();

    fn name(&self) -> &'static str {
        "combat"
    }

    fn base(&self) -> &LayerBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut LayerBase {
        &mut self.base
    }

    fn compute(&mut self, squads: &dyn SquadQuery, _input: (), round: Round) {
        self.melee_by_pos.clear();
        self.melee_by_squad.clear();
        self.ranged_by_pos.clear();
        for cells in self.line_of_fire.values_mut() {
            cells.clear();
        }

        let mut emitters = 0usize;
        for enemy_faction in self.base.enemy_factions(squads) {
            for squad in squads.active_squads(enemy_faction) {
                let Some(pos) = squads.position(squad) else {
                    tracing::trace!("Squad {:?} has no position, skipping", squad);
                    continue;
                };
                let Some(threat) = squads.threat_by_range(squad) else {
                    tracing::trace!("Squad {:?} has no threat profile, skipping", squad);
                    continue;
                };
                let units = squads.unit_attacks(squad);

                if has_attack_type(&units, AttackType::is_melee) {
                    match squads.movement_speed(squad) {
                        Some(speed) => self.paint_melee(squad, pos, speed, &units, &threat),
                        None => tracing::trace!("Squad {:?} has no movement speed, no melee reach", squad),
                    }
                }
                if has_attack_type(&units, AttackType::is_ranged) {
                    self.paint_ranged(squad, pos, &units, &threat);
                }
                emitters += 1;
            }
        }
        // Drop buffers of squads that no longer fire
        self.line_of_fire.retain(|_, cells| !cells.is_empty());

        self.base.cache.mark_clean(round);
        tracing::debug!(
            "Combat layer for {:?}: {} emitters, {} melee cells, {} ranged cells (round {})",
            self.base.faction,
            emitters,
            self.melee_by_pos.len(),
            self.ranged_by_pos.len(),
            round
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spatial::MAX_PAINT_RADIUS;
    use crate::squad::{SquadRecord, SquadRoster};

    const US: FactionId = FactionId(1);
    const THEM: FactionId = FactionId(2);

    fn melee_squad(id: u32, pos: GridPos, speed: i32, threat: f64) -> SquadRecord {
        SquadRecord::new(SquadId(id), THEM)
            .at(pos)
            .speed(speed)
            .unit(UnitAttack::new(AttackType::MeleeRow, 1))
            .threat(ThreatByRange::new().with(1, threat))
    }

    fn computed(roster: &SquadRoster) -> CombatThreatLayer {
        let mut layer = CombatThreatLayer::new(US, CombatLayerConfig::default());
        layer.compute(roster, (), 0);
        layer
    }

    #[test]
    fn test_melee_falloff_scenario() {
        // speed 3 + range 1 = radius 4; d=2 -> 50 * (1 - 2/5) = 30
        let mut roster = SquadRoster::new();
        roster.add_faction(US);
        roster.add_squad(melee_squad(1, GridPos::new(10, 10), 3, 50.0));

        let layer = computed(&roster);
        assert!((layer.melee_threat_at(GridPos::new(12, 10)) - 30.0).abs() < 1e-9);
        assert!((layer.melee_threat_at(GridPos::new(14, 14)) - 10.0).abs() < 1e-9);
        assert_eq!(layer.melee_threat_at(GridPos::new(15, 10)), 0.0);
        assert_eq!(layer.melee_threat_at(GridPos::new(10, 10)), 0.0, "emitter cell is never painted");
        assert_eq!(layer.melee_threat_of(SquadId(1)), 50.0);
    }

    #[test]
    fn test_own_faction_is_not_painted() {
        let mut roster = SquadRoster::new();
        roster.add_squad(
            SquadRecord::new(SquadId(1), US)
                .at(GridPos::new(5, 5))
                .speed(2)
                .unit(UnitAttack::new(AttackType::MeleeRow, 1))
                .threat(ThreatByRange::new().with(1, 40.0)),
        );
        let layer = computed(&roster);
        assert!(layer.melee_field().is_empty());
    }

    #[test]
    fn test_melee_threat_is_additive() {
        let mut roster = SquadRoster::new();
        roster.add_squad(melee_squad(1, GridPos::new(10, 10), 1, 20.0));
        roster.add_squad(melee_squad(2, GridPos::new(12, 10), 1, 30.0));

        let layer = computed(&roster);
        // Both squads have radius 2; (11,10) is distance 1 from each
        let expected = 20.0 * (1.0 - 1.0 / 3.0) + 30.0 * (1.0 - 1.0 / 3.0);
        assert!((layer.melee_threat_at(GridPos::new(11, 10)) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_ranged_pressure_is_flat_and_tracked() {
        let mut roster = SquadRoster::new();
        roster.add_squad(
            SquadRecord::new(SquadId(5), THEM)
                .at(GridPos::new(0, 0))
                .speed(2)
                .unit(UnitAttack::new(AttackType::Ranged, 4))
                .unit(UnitAttack::new(AttackType::Magic, 2))
                .threat(ThreatByRange::new().with(1, 10.0).with(4, 25.0)),
        );
        let layer = computed(&roster);

        assert_eq!(layer.ranged_pressure_at(GridPos::new(1, 0)), 25.0);
        assert_eq!(layer.ranged_pressure_at(GridPos::new(4, -4)), 25.0);
        assert_eq!(layer.ranged_pressure_at(GridPos::new(5, 0)), 0.0);
        assert_eq!(layer.line_of_fire(SquadId(5)).len(), 80);
        assert_eq!(layer.ranged_squads_covering(GridPos::new(3, 3)), vec![SquadId(5)]);
        // Pure ranged squad paints no melee
        assert!(layer.melee_field().is_empty());
    }

    #[test]
    fn test_ranged_default_range() {
        let mut roster = SquadRoster::new();
        roster.add_squad(
            SquadRecord::new(SquadId(5), THEM)
                .at(GridPos::new(0, 0))
                .unit(UnitAttack::new(AttackType::Magic, 0))
                .threat(ThreatByRange::new().with(3, 12.0)),
        );
        let layer = computed(&roster);
        assert_eq!(layer.ranged_pressure_at(GridPos::new(3, 0)), 12.0);
        assert_eq!(layer.ranged_pressure_at(GridPos::new(4, 0)), 0.0);
    }

    #[test]
    fn test_squad_without_position_is_skipped() {
        let mut roster = SquadRoster::new();
        let mut squad = melee_squad(1, GridPos::new(0, 0), 2, 50.0);
        squad.position = None;
        roster.add_squad(squad);

        let layer = computed(&roster);
        assert!(layer.melee_field().is_empty());
        assert_eq!(layer.melee_threat_of(SquadId(1)), 0.0);
    }

    #[test]
    fn test_recompute_drops_moved_emitters() {
        let mut roster = SquadRoster::new();
        roster.add_squad(melee_squad(1, GridPos::new(0, 0), 1, 50.0));

        let mut layer = CombatThreatLayer::new(US, CombatLayerConfig::default());
        layer.compute(&roster, (), 0);
        assert!(layer.melee_threat_at(GridPos::new(1, 1)) > 0.0);

        roster.move_squad(SquadId(1), GridPos::new(20, 20)).unwrap();
        layer.mark_dirty();
        layer.compute(&roster, (), 1);
        assert_eq!(layer.melee_threat_at(GridPos::new(1, 1)), 0.0);
        assert!(layer.melee_threat_at(GridPos::new(21, 21)) > 0.0);
        assert!(layer.is_valid(1));
    }

    #[test]
    fn test_line_of_fire_buffers_reused() {
        let mut roster = SquadRoster::new();
        for (id, x) in [(5, 0), (6, 20)] {
            roster.add_squad(
                SquadRecord::new(SquadId(id), THEM)
                    .at(GridPos::new(x, 0))
                    .unit(UnitAttack::new(AttackType::Ranged, 2))
                    .threat(ThreatByRange::new().with(2, 10.0)),
            );
        }

        let mut layer = CombatThreatLayer::new(US, CombatLayerConfig::default());
        layer.compute(&roster, (), 0);
        let buffer = layer.line_of_fire[&SquadId(5)].as_ptr();

        roster.move_squad(SquadId(5), GridPos::new(3, 3)).unwrap();
        roster.deactivate(SquadId(6)).unwrap();
        layer.mark_dirty();
        layer.compute(&roster, (), 1);

        assert_eq!(layer.line_of_fire[&SquadId(5)].as_ptr(), buffer);
        assert!(layer.line_of_fire(SquadId(5)).contains(&GridPos::new(5, 5)));
        assert!(!layer.line_of_fire(SquadId(5)).contains(&GridPos::new(1, 0)));
        assert!(!layer.line_of_fire.contains_key(&SquadId(6)));
        assert!(layer.ranged_squads_covering(GridPos::new(21, 0)).is_empty());
    }

    #[test]
    fn test_extreme_speed_does_not_overflow() {
        let mut roster = SquadRoster::new();
        roster.add_squad(melee_squad(1, GridPos::new(0, 0), i32::MAX, 50.0));

        let layer = computed(&roster);
        assert!(layer.melee_threat_at(GridPos::new(1, 0)) > 0.0);
        assert!(layer.melee_threat_at(GridPos::new(MAX_PAINT_RADIUS, 0)) > 0.0);
        assert_eq!(layer.melee_threat_at(GridPos::new(MAX_PAINT_RADIUS + 1, 0)), 0.0);
    }

    #[test]
    fn test_compute_is_idempotent() {
        let mut roster = SquadRoster::new();
        roster.add_squad(melee_squad(1, GridPos::new(3, 3), 2, 50.0));
        roster.add_squad(melee_squad(2, GridPos::new(6, 4), 1, 35.0));

        let mut layer = CombatThreatLayer::new(US, CombatLayerConfig::default());
        layer.compute(&roster, (), 0);
        let first = layer.melee_field().clone();
        layer.compute(&roster, (), 0);
        assert!(first.approx_eq(layer.melee_field(), 1e-12));
    }
}
