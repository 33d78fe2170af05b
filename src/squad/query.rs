//! Read-only squad data access consumed by the threat layers
//!
//! Every lookup is optional. A layer that gets `None` back skips the squad
//! for that pass instead of failing.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::core::types::{FactionId, GridPos, SquadId};

/// Tactical archetype used to pick role weights
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SquadRole {
    Tank,
    #[default]
    Dps,
    Support,
}

/// How a unit delivers its attack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttackType {
    MeleeRow,
    MeleeColumn,
    Ranged,
    Magic,
}

impl AttackType {
    pub fn is_melee(self) -> bool {
        matches!(self, AttackType::MeleeRow | AttackType::MeleeColumn)
    }

    pub fn is_ranged(self) -> bool {
        matches!(self, AttackType::Ranged | AttackType::Magic)
    }
}

/// Attack profile of one unit in a squad
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UnitAttack {
    pub attack_type: AttackType,
    #[serde(default)]
    pub attack_range: i32,
}

impl UnitAttack {
    pub fn new(attack_type: AttackType, attack_range: i32) -> Self {
        Self {
            attack_type,
            attack_range,
        }
    }
}

/// True if any unit matches the attack-type predicate
pub fn has_attack_type(units: &[UnitAttack], pred: impl Fn(AttackType) -> bool) -> bool {
    units.iter().any(|u| pred(u.attack_type))
}

/// Longest positive attack range among matching units, or `default`
pub fn max_range_for(units: &[UnitAttack], pred: impl Fn(AttackType) -> bool, default: i32) -> i32 {
    units
        .iter()
        .filter(|u| pred(u.attack_type) && u.attack_range > 0)
        .map(|u| u.attack_range)
        .max()
        .unwrap_or(default)
}

/// Externally computed danger of a squad at each tile range.
///
/// Range 1 is melee; the squad's longest ranged attack indexes the ranged
/// value. Missing ranges read as 0.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<(i32, f64)>", into = "Vec<(i32, f64)>")]
pub struct ThreatByRange(BTreeMap<i32, f64>);

impl ThreatByRange {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, range: i32, threat: f64) -> Self {
        self.0.insert(range, threat);
        self
    }

    pub fn insert(&mut self, range: i32, threat: f64) {
        self.0.insert(range, threat);
    }

    #[inline]
    pub fn at(&self, range: i32) -> f64 {
        self.0.get(&range).copied().unwrap_or(0.0)
    }

    #[inline]
    pub fn melee(&self) -> f64 {
        self.at(1)
    }

    /// Largest range with a recorded value
    pub fn max_range(&self) -> Option<i32> {
        self.0.keys().next_back().copied()
    }
}

impl From<Vec<(i32, f64)>> for ThreatByRange {
    fn from(pairs: Vec<(i32, f64)>) -> Self {
        Self(pairs.into_iter().collect())
    }
}

impl From<ThreatByRange> for Vec<(i32, f64)> {
    fn from(threat: ThreatByRange) -> Self {
        threat.0.into_iter().collect()
    }
}

/// Squad/faction data source.
///
/// Implemented by whatever owns entity storage; [`crate::squad::SquadRoster`]
/// is the in-memory implementation.
pub trait SquadQuery {
    /// Every faction taking part in the battle
    fn factions(&self) -> Vec<FactionId>;

    /// Squads of `faction` still in the fight
    fn active_squads(&self, faction: FactionId) -> Vec<SquadId>;

    fn squad_faction(&self, squad: SquadId) -> Option<FactionId>;

    fn position(&self, squad: SquadId) -> Option<GridPos>;

    fn movement_speed(&self, squad: SquadId) -> Option<i32>;

    fn primary_role(&self, squad: SquadId) -> Option<SquadRole>;

    fn unit_attacks(&self, squad: SquadId) -> Vec<UnitAttack>;

    /// Average health of living units, 0.0 to 1.0
    fn health_percent(&self, squad: SquadId) -> Option<f64>;

    fn threat_by_range(&self, squad: SquadId) -> Option<ThreatByRange>;
}
