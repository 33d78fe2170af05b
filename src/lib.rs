//! Tactical Threat - spatial threat assessment for squad combat AI

pub mod core;
pub mod spatial;
pub mod squad;
pub mod threat;

pub use crate::core::{FactionId, GridPos, Result, Round, SquadId, ThreatConfig, ThreatError};
pub use crate::squad::{SquadQuery, SquadRole, SquadRoster};
pub use crate::threat::{CompositeThreatEvaluator, ThreatLayer};
