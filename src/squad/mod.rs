//! Squad data consumed by the threat layers
//!
//! Power-by-range scoring, unit attributes and entity storage live outside
//! this crate; layers see them only through [`SquadQuery`].

pub mod query;
pub mod roster;

pub use query::{
    has_attack_type, max_range_for, AttackType, SquadQuery, SquadRole, ThreatByRange, UnitAttack,
};
pub use roster::{SquadRecord, SquadRoster};
