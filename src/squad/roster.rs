//! In-memory squad roster
//!
//! Holds the per-round squad snapshot the layers read from. Iteration order
//! is insertion order, which keeps every layer pass deterministic.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::core::error::{Result, ThreatError};
use crate::core::types::{FactionId, GridPos, SquadId};
use crate::squad::query::{SquadQuery, SquadRole, ThreatByRange, UnitAttack};

fn default_health() -> f64 {
    1.0
}

fn default_active() -> bool {
    true
}

/// One squad's combat-relevant state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SquadRecord {
    pub id: SquadId,
    pub faction: FactionId,
    #[serde(default)]
    pub position: Option<GridPos>,
    #[serde(default)]
    pub movement_speed: i32,
    #[serde(default)]
    pub role: Option<SquadRole>,
    #[serde(default)]
    pub units: Vec<UnitAttack>,
    #[serde(default = "default_health")]
    pub health_percent: f64,
    #[serde(default)]
    pub threat_by_range: Option<ThreatByRange>,
    #[serde(default = "default_active")]
    pub active: bool,
}

impl SquadRecord {
    pub fn new(id: SquadId, faction: FactionId) -> Self {
        Self {
            id,
            faction,
            position: None,
            movement_speed: 0,
            role: None,
            units: Vec::new(),
            health_percent: 1.0,
            threat_by_range: None,
            active: true,
        }
    }

    pub fn at(mut self, pos: GridPos) -> Self {
        self.position = Some(pos);
        self
    }

    pub fn speed(mut self, movement_speed: i32) -> Self {
        self.movement_speed = movement_speed;
        self
    }

    pub fn role(mut self, role: SquadRole) -> Self {
        self.role = Some(role);
        self
    }

    pub fn unit(mut self, unit: UnitAttack) -> Self {
        self.units.push(unit);
        self
    }

    pub fn health(mut self, health_percent: f64) -> Self {
        self.health_percent = health_percent;
        self
    }

    pub fn threat(mut self, threat: ThreatByRange) -> Self {
        self.threat_by_range = Some(threat);
        self
    }
}

/// All factions and squads in a battle
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SquadRoster {
    #[serde(default)]
    pub factions: Vec<FactionId>,
    #[serde(default)]
    pub squads: Vec<SquadRecord>,
}

impl SquadRoster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let mut roster: SquadRoster = toml::from_str(contents)?;
        // Factions only mentioned by their squads still count
        for faction in roster.squads.iter().map(|s| s.faction).collect::<Vec<_>>() {
            roster.add_faction(faction);
        }
        Ok(roster)
    }

    /// Load a scenario roster from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&contents)
    }

    pub fn add_faction(&mut self, faction: FactionId) {
        if !self.factions.contains(&faction) {
            self.factions.push(faction);
        }
    }

    /// Add or replace a squad
    pub fn add_squad(&mut self, record: SquadRecord) {
        self.add_faction(record.faction);
        match self.squads.iter_mut().find(|s| s.id == record.id) {
            Some(existing) => *existing = record,
            None => self.squads.push(record),
        }
    }

    pub fn get(&self, id: SquadId) -> Option<&SquadRecord> {
        self.squads.iter().find(|s| s.id == id)
    }

    fn get_mut(&mut self, id: SquadId) -> Result<&mut SquadRecord> {
        self.squads
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(ThreatError::SquadNotFound(id))
    }

    pub fn move_squad(&mut self, id: SquadId, pos: GridPos) -> Result<()> {
        self.get_mut(id)?.position = Some(pos);
        Ok(())
    }

    pub fn set_health(&mut self, id: SquadId, health_percent: f64) -> Result<()> {
        self.get_mut(id)?.health_percent = health_percent.clamp(0.0, 1.0);
        Ok(())
    }

    /// Take a destroyed or withdrawn squad out of the fight
    pub fn deactivate(&mut self, id: SquadId) -> Result<()> {
        self.get_mut(id)?.active = false;
        Ok(())
    }

    fn active_record(&self, id: SquadId) -> Option<&SquadRecord> {
        self.get(id).filter(|s| s.active)
    }
}

impl SquadQuery for SquadRoster {
    fn factions(&self) -> Vec<FactionId> {
        self.factions.clone()
    }

    fn active_squads(&self, faction: FactionId) -> Vec<SquadId> {
        self.squads
            .iter()
            .filter(|s| s.faction == faction && s.active)
            .map(|s| s.id)
            .collect()
    }

    fn squad_faction(&self, squad: SquadId) -> Option<FactionId> {
        self.get(squad).map(|s| s.faction)
    }

    fn position(&self, squad: SquadId) -> Option<GridPos> {
        self.active_record(squad).and_then(|s| s.position)
    }

    fn movement_speed(&self, squad: SquadId) -> Option<i32> {
        self.active_record(squad).map(|s| s.movement_speed)
    }

    fn primary_role(&self, squad: SquadId) -> Option<SquadRole> {
        self.get(squad).and_then(|s| s.role)
    }

    fn unit_attacks(&self, squad: SquadId) -> Vec<UnitAttack> {
        self.active_record(squad).map(|s| s.units.clone()).unwrap_or_default()
    }

    fn health_percent(&self, squad: SquadId) -> Option<f64> {
        self.active_record(squad).map(|s| s.health_percent)
    }

    fn threat_by_range(&self, squad: SquadId) -> Option<ThreatByRange> {
        self.active_record(squad).and_then(|s| s.threat_by_range.clone())
    }
}
