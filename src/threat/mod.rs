//! Per-faction threat layers and the evaluator that combines them
//!
//! Layers are rebuilt from live squad state once per combat round:
//! - `combat`: melee and ranged danger from enemy squads
//! - `support`: where healers are most useful
//! - `positional`: flanking, isolation, pressure and retreat (reads `combat`)
//! - `composite`: keeps the three in order and scores positions per role

pub mod base;
pub mod cache;
pub mod combat;
pub mod composite;
pub mod distance;
pub mod positional;
pub mod support;

pub use base::{LayerBase, ThreatLayer};
pub use cache::RoundCache;
pub use combat::CombatThreatLayer;
pub use composite::CompositeThreatEvaluator;
pub use distance::{DistanceTrackers, FactionSquadDistances, SquadDistanceInfo, SquadDistanceTracker};
pub use positional::{direction_bucket, PositionalRiskLayer};
pub use support::{AllySupport, SupportValueLayer};
