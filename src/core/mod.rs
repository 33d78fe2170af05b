pub mod config;
pub mod error;
pub mod types;

pub use config::{load_threat_config, RoleWeights, ThreatConfig};
pub use error::{Result, ThreatError};
pub use types::{FactionId, GridPos, Round, SquadId};
