//! Threat engine integration tests
//!
//! End-to-end checks through the public API: worked scenarios, layer
//! ordering inside the evaluator, caching and invalidation.

use tactical_threat::core::config::{load_threat_config, PositionalLayerConfig, ThreatConfig};
use tactical_threat::spatial::GridBounds;
use tactical_threat::squad::{AttackType, SquadRecord, SquadRole, SquadRoster, ThreatByRange, UnitAttack};
use tactical_threat::threat::{CompositeThreatEvaluator, RoundCache, ThreatLayer};
use tactical_threat::{FactionId, GridPos, SquadId};

const US: FactionId = FactionId(1);
const THEM: FactionId = FactionId(2);

fn melee_enemy(id: u32, pos: GridPos, speed: i32, threat: f64) -> SquadRecord {
    SquadRecord::new(SquadId(id), THEM)
        .at(pos)
        .speed(speed)
        .unit(UnitAttack::new(AttackType::MeleeRow, 1))
        .threat(ThreatByRange::new().with(1, threat))
}

fn ranged_enemy(id: u32, pos: GridPos, range: i32, threat: f64) -> SquadRecord {
    SquadRecord::new(SquadId(id), THEM)
        .at(pos)
        .unit(UnitAttack::new(AttackType::Ranged, range))
        .threat(ThreatByRange::new().with(range, threat))
}

fn evaluator_with(config: &ThreatConfig, roster: &SquadRoster) -> CompositeThreatEvaluator {
    let mut eval = CompositeThreatEvaluator::new(US, GridBounds::new(32, 32), config);
    eval.update(roster, 1);
    eval
}

/// Enemy at (10,10), speed 3, melee range 1, 50 melee power.
/// Radius 4; at Chebyshev distance 2 the threat is 50 * (1 - 2/5) = 30.
#[test]
fn test_scenario_melee_falloff() {
    let mut roster = SquadRoster::new();
    roster.add_faction(US);
    roster.add_squad(melee_enemy(1, GridPos::new(10, 10), 3, 50.0));

    let eval = evaluator_with(&ThreatConfig::default(), &roster);
    let combat = eval.combat();

    assert!((combat.melee_threat_at(GridPos::new(12, 10)) - 30.0).abs() < 1e-9);
    // Edge of the radius is still strictly positive
    assert!((combat.melee_threat_at(GridPos::new(14, 10)) - 10.0).abs() < 1e-9);
    assert_eq!(combat.melee_threat_at(GridPos::new(15, 10)), 0.0);
}

/// Safe distance 2, max 6, nearest ally 4 away: (4 - 2) / (6 - 2) = 0.5
#[test]
fn test_scenario_isolation() {
    let config = ThreatConfig {
        positional: PositionalLayerConfig {
            isolation_safe_distance: 2,
            isolation_max_distance: 6,
            ..PositionalLayerConfig::default()
        },
        ..ThreatConfig::default()
    };
    assert!(config.validate().is_ok());

    let mut roster = SquadRoster::new();
    roster.add_squad(SquadRecord::new(SquadId(1), US).at(GridPos::new(10, 10)));

    let eval = evaluator_with(&config, &roster);
    assert!((eval.positional().isolation_risk_at(GridPos::new(14, 12)) - 0.5).abs() < 1e-9);
}

/// Six of eight neighbors below the retreat threshold: 6/8 = 0.75
#[test]
fn test_scenario_retreat_quality() {
    // Two range-1 archers diagonal to (12,10), each clipping one neighbor
    let mut roster = SquadRoster::new();
    roster.add_faction(US);
    roster.add_squad(ranged_enemy(1, GridPos::new(10, 8), 1, 50.0));
    roster.add_squad(ranged_enemy(2, GridPos::new(14, 12), 1, 50.0));

    let eval = evaluator_with(&ThreatConfig::default(), &roster);
    let center = GridPos::new(12, 10);

    let threatened: Vec<GridPos> = center
        .neighbors()
        .into_iter()
        .filter(|n| eval.combat().ranged_pressure_at(*n) >= 10.0)
        .collect();
    assert_eq!(threatened.len(), 2, "only (11,9) and (13,11) are covered");
    assert!((eval.positional().retreat_quality_at(center) - 0.75).abs() < 1e-9);
}

#[test]
fn test_positional_reflects_same_round_combat() {
    let mut roster = SquadRoster::new();
    roster.add_squad(SquadRecord::new(SquadId(1), US).at(GridPos::new(2, 2)));
    roster.add_squad(melee_enemy(10, GridPos::new(8, 8), 2, 120.0));

    let mut eval = evaluator_with(&ThreatConfig::default(), &roster);
    let before = GridPos::new(9, 8);
    assert!(eval.positional().engagement_pressure_at(before) > 0.0);

    // Enemy charges across the map between rounds
    roster.move_squad(SquadId(10), GridPos::new(25, 25)).unwrap();
    eval.mark_dirty();
    assert!(eval.update(&roster, 2));

    assert_eq!(eval.positional().combat_generation(), Some(eval.combat().generation()));
    assert_eq!(eval.positional().engagement_pressure_at(before), 0.0);
    let pressure = eval.positional().engagement_pressure_at(GridPos::new(26, 25));
    let expected = (eval.combat().melee_threat_at(GridPos::new(26, 25)) / 200.0).min(1.0);
    assert!((pressure - expected).abs() < 1e-9);
}

#[test]
fn test_update_is_idempotent() {
    let mut roster = SquadRoster::new();
    roster.add_squad(SquadRecord::new(SquadId(1), US).at(GridPos::new(4, 4)).health(0.5));
    roster.add_squad(melee_enemy(10, GridPos::new(9, 9), 2, 40.0));
    roster.add_squad(ranged_enemy(11, GridPos::new(12, 6), 4, 25.0));

    let mut eval = evaluator_with(&ThreatConfig::default(), &roster);
    let melee = eval.combat().melee_field().clone();
    let ranged = eval.combat().ranged_field().clone();
    let support = eval.support().support_field().clone();

    eval.mark_dirty();
    eval.update(&roster, 1);

    assert!(melee.approx_eq(eval.combat().melee_field(), 1e-12));
    assert!(ranged.approx_eq(eval.combat().ranged_field(), 1e-12));
    assert!(support.approx_eq(eval.support().support_field(), 1e-12));
}

#[test]
fn test_no_recompute_without_invalidation() {
    let mut roster = SquadRoster::new();
    roster.add_squad(SquadRecord::new(SquadId(1), US).at(GridPos::new(4, 4)));
    roster.add_squad(melee_enemy(10, GridPos::new(9, 9), 2, 40.0));

    let mut eval = evaluator_with(&ThreatConfig::default(), &roster);
    let generation = eval.combat().generation();

    // Moved without MarkDirty: same-round reads stay stale
    roster.move_squad(SquadId(10), GridPos::new(20, 20)).unwrap();
    assert!(!eval.update(&roster, 1));
    assert_eq!(eval.combat().generation(), generation);
    assert!(eval.combat().melee_threat_at(GridPos::new(10, 9)) > 0.0);

    // A new round always recomputes
    assert!(eval.update(&roster, 2));
    assert_eq!(eval.combat().melee_threat_at(GridPos::new(10, 9)), 0.0);
}

#[test]
fn test_dead_squads_drop_out() {
    let mut roster = SquadRoster::new();
    roster.add_squad(SquadRecord::new(SquadId(1), US).at(GridPos::new(4, 4)).health(0.2));
    roster.add_squad(melee_enemy(10, GridPos::new(9, 9), 2, 40.0));

    let mut eval = evaluator_with(&ThreatConfig::default(), &roster);
    assert_eq!(eval.support().most_damaged_ally(), Some(SquadId(1)));

    roster.deactivate(SquadId(10)).unwrap();
    roster.deactivate(SquadId(1)).unwrap();
    eval.mark_dirty();
    eval.update(&roster, 1);

    assert!(eval.combat().melee_field().is_empty());
    assert_eq!(eval.support().most_damaged_ally(), None);
    assert_eq!(eval.positional().isolation_risk_at(GridPos::new(30, 30)), 0.0);
}

#[test]
fn test_healer_moves_toward_wounded_ally() {
    let mut roster = SquadRoster::new();
    roster.add_squad(
        SquadRecord::new(SquadId(1), US)
            .at(GridPos::new(10, 10))
            .role(SquadRole::Support),
    );
    roster.add_squad(SquadRecord::new(SquadId(2), US).at(GridPos::new(13, 10)).health(0.1));

    let eval = evaluator_with(&ThreatConfig::default(), &roster);
    let here = GridPos::new(10, 10);
    let closer = GridPos::new(11, 10);
    let farther = GridPos::new(9, 10);

    assert!(eval.support().support_value_at(closer) > eval.support().support_value_at(here));
    assert_eq!(
        eval.optimal_position_for_role(&roster, SquadId(1), &[farther, here, closer]),
        closer
    );
}

#[test]
fn test_cache_contract() {
    let mut cache = RoundCache::new();
    assert!(!cache.is_valid(0));

    cache.mark_clean(4);
    assert!(cache.is_valid(4));
    assert!(!cache.is_valid(5));

    cache.mark_dirty();
    assert!(!cache.is_valid(4));
    assert!(cache.is_initialized());
}

#[test]
fn test_layers_share_viewing_faction() {
    let eval = CompositeThreatEvaluator::new(US, GridBounds::new(8, 8), &ThreatConfig::default());
    assert_eq!(eval.combat().faction(), US);
    assert_eq!(eval.support().faction(), US);
    assert_eq!(eval.positional().faction(), US);
    assert_eq!(eval.combat().name(), "combat");
}

#[test]
fn test_scenario_file_end_to_end() {
    let roster = SquadRoster::load("data/scenarios/skirmish.toml").expect("skirmish scenario should load");
    let config = load_threat_config("default").expect("default config should load");

    let mut eval = CompositeThreatEvaluator::new(US, GridBounds::new(24, 24), &config);
    assert!(eval.update(&roster, 0));

    // The archer in faction 1 is the most hurt
    assert_eq!(eval.support().most_damaged_ally(), Some(SquadId(103)));
    // Raider at (12,10) threatens the tank's front
    assert!(eval.combat().melee_threat_at(GridPos::new(9, 10)) > 0.0);
    // Enemy skirmisher's bow covers five tiles flat
    assert_eq!(eval.combat().line_of_fire(SquadId(203)).len(), 120);
}
