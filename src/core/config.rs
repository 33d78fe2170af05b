//! Threat engine configuration with documented constants
//!
//! All tuning values are collected here. Sections deserialize from TOML with
//! `#[serde(default)]`, so a file only needs to name what it overrides.
//! Loaded once and handed to the layers by value; nothing here is global.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::core::error::{Result, ThreatError};
use crate::squad::SquadRole;

/// Melee/ranged painting parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatLayerConfig {
    /// Attack range assumed for melee units that report none
    pub default_melee_range: i32,
    /// Attack range assumed for ranged/magic units that report none
    pub default_ranged_range: i32,
}

impl Default for CombatLayerConfig {
    fn default() -> Self {
        Self {
            default_melee_range: 1,
            default_ranged_range: 3,
        }
    }
}

/// How the four positional sub-risks are blended into total positional risk
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PositionalRiskWeights {
    pub flanking: f64,
    pub isolation: f64,
    pub pressure: f64,
    /// Applied to `1 - retreat_quality`
    pub retreat: f64,
}

impl Default for PositionalRiskWeights {
    fn default() -> Self {
        Self {
            flanking: 0.4,
            isolation: 0.3,
            pressure: 0.2,
            retreat: 0.1,
        }
    }
}

/// Positional risk parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PositionalLayerConfig {
    /// Added to an enemy's movement speed to get its flanking reach
    pub flanking_range_bonus: i32,
    /// Distance to the nearest ally at or below which isolation risk is zero
    pub isolation_safe_distance: i32,
    /// Distance to the nearest ally at which isolation risk saturates at 1.0
    pub isolation_max_distance: i32,
    /// Melee + ranged sum that maps to engagement pressure 1.0
    pub engagement_pressure_max: f64,
    /// A neighbor is a retreat route when both its melee and ranged
    /// threat are strictly below this
    pub retreat_safe_threshold: f64,
    pub weights: PositionalRiskWeights,
}

impl Default for PositionalLayerConfig {
    fn default() -> Self {
        Self {
            flanking_range_bonus: 3,
            isolation_safe_distance: 3,
            isolation_max_distance: 7,
            engagement_pressure_max: 200.0,
            retreat_safe_threshold: 10.0,
            weights: PositionalRiskWeights::default(),
        }
    }
}

/// Support value parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SupportLayerConfig {
    /// Radius over which heal priority is painted (linear falloff)
    pub heal_radius: i32,
    /// Radius counted by the ally-proximity map
    pub proximity_radius: i32,
    /// Enemies within this many tiles raise an ally's buff priority
    pub buff_engagement_range: i32,
}

impl Default for SupportLayerConfig {
    fn default() -> Self {
        Self {
            heal_radius: 3,
            proximity_radius: 2,
            buff_engagement_range: 4,
        }
    }
}

/// Signed per-layer weights for one role.
///
/// Positive weights make a layer repel (higher score = worse position),
/// negative weights make it attract.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoleWeights {
    pub melee_weight: f64,
    pub ranged_weight: f64,
    pub support_weight: f64,
    pub positional_weight: f64,
}

/// Role weight table
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoleWeightTable {
    pub tank: RoleWeights,
    pub dps: RoleWeights,
    pub support: RoleWeights,
}

impl Default for RoleWeightTable {
    fn default() -> Self {
        Self {
            // Tanks want to stand where the melee is
            tank: RoleWeights {
                melee_weight: -0.5,
                ranged_weight: 0.5,
                support_weight: 0.2,
                positional_weight: 0.5,
            },
            dps: RoleWeights {
                melee_weight: 0.3,
                ranged_weight: 0.5,
                support_weight: 0.0,
                positional_weight: 0.5,
            },
            // Healers are drawn to wounded allies and kept out of melee
            support: RoleWeights {
                melee_weight: 0.8,
                ranged_weight: 0.5,
                support_weight: -1.0,
                positional_weight: 0.5,
            },
        }
    }
}

impl RoleWeightTable {
    pub fn weights_for(&self, role: SquadRole) -> RoleWeights {
        match role {
            SquadRole::Tank => self.tank,
            SquadRole::Dps => self.dps,
            SquadRole::Support => self.support,
        }
    }

    fn iter(&self) -> [(SquadRole, &RoleWeights); 3] {
        [
            (SquadRole::Tank, &self.tank),
            (SquadRole::Dps, &self.dps),
            (SquadRole::Support, &self.support),
        ]
    }
}

/// AI difficulty knob
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DifficultyConfig {
    /// 1.0 is the baseline. Higher widens flanking awareness, tightens the
    /// isolation threshold, and raises the shared ranged/positional weights.
    pub ai_competence: f64,
}

impl Default for DifficultyConfig {
    fn default() -> Self {
        Self { ai_competence: 1.0 }
    }
}

/// Offsets and scales derived from `ai_competence`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DifficultyAdjustments {
    pub flanking_range_bonus_offset: i32,
    pub isolation_threshold_offset: i32,
    pub retreat_safe_threshold_offset: i32,
    pub shared_ranged_weight_scale: f64,
    pub shared_positional_weight_scale: f64,
}

impl DifficultyConfig {
    pub fn adjustments(&self) -> DifficultyAdjustments {
        let delta = self.ai_competence - 1.0;
        DifficultyAdjustments {
            flanking_range_bonus_offset: (delta * 5.0).round() as i32,
            isolation_threshold_offset: -((delta * 3.0).round() as i32),
            retreat_safe_threshold_offset: (delta * 7.0).round() as i32,
            shared_ranged_weight_scale: self.ai_competence,
            shared_positional_weight_scale: self.ai_competence,
        }
    }
}

/// Complete threat engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ThreatConfig {
    /// Name of this config (set from filename)
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub combat: CombatLayerConfig,
    #[serde(default)]
    pub positional: PositionalLayerConfig,
    #[serde(default)]
    pub support: SupportLayerConfig,
    #[serde(default)]
    pub roles: RoleWeightTable,
    #[serde(default)]
    pub difficulty: DifficultyConfig,
}

impl ThreatConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from a TOML document
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: ThreatConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// The config with difficulty adjustments folded in.
    ///
    /// Layers only ever see the effective config; at competence 1.0 this is
    /// an exact copy.
    pub fn effective(&self) -> ThreatConfig {
        let adj = self.difficulty.adjustments();
        let mut out = self.clone();

        out.positional.flanking_range_bonus =
            (self.positional.flanking_range_bonus + adj.flanking_range_bonus_offset).max(0);

        // Keep the gradient non-empty when the threshold moves
        let safe = (self.positional.isolation_safe_distance + adj.isolation_threshold_offset).max(0);
        out.positional.isolation_safe_distance = safe;
        out.positional.isolation_max_distance = self.positional.isolation_max_distance.max(safe + 1);

        out.positional.retreat_safe_threshold =
            (self.positional.retreat_safe_threshold + adj.retreat_safe_threshold_offset as f64).max(0.0);

        for weights in [&mut out.roles.tank, &mut out.roles.dps, &mut out.roles.support] {
            weights.ranged_weight *= adj.shared_ranged_weight_scale;
            weights.positional_weight *= adj.shared_positional_weight_scale;
        }

        out
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        for (role, w) in self.roles.iter() {
            let in_range = |v: f64| (-1.0..=1.0).contains(&v);
            if !(in_range(w.melee_weight)
                && in_range(w.ranged_weight)
                && in_range(w.support_weight)
                && in_range(w.positional_weight))
            {
                return Err(ThreatError::InvalidConfig(format!(
                    "role weights must be within [-1.0, 1.0] for {:?}",
                    role
                )));
            }
        }

        let p = &self.positional;
        if p.flanking_range_bonus <= 0 || p.isolation_safe_distance <= 0 || p.retreat_safe_threshold <= 0.0 {
            return Err(ThreatError::InvalidConfig(
                "flanking bonus, isolation threshold and retreat threshold must be positive".into(),
            ));
        }
        if p.isolation_max_distance <= p.isolation_safe_distance {
            return Err(ThreatError::InvalidConfig(format!(
                "isolation_max_distance ({}) must exceed isolation_safe_distance ({})",
                p.isolation_max_distance, p.isolation_safe_distance
            )));
        }
        if p.engagement_pressure_max <= 0.0 {
            return Err(ThreatError::InvalidConfig("engagement_pressure_max must be positive".into()));
        }

        let s = &self.support;
        if s.heal_radius <= 0 || s.proximity_radius < 0 || s.buff_engagement_range <= 0 {
            return Err(ThreatError::InvalidConfig("support layer radii must be positive".into()));
        }

        if self.combat.default_melee_range <= 0 || self.combat.default_ranged_range <= 0 {
            return Err(ThreatError::InvalidConfig("default attack ranges must be positive".into()));
        }

        if self.difficulty.ai_competence <= 0.0 {
            return Err(ThreatError::InvalidConfig("ai_competence must be positive".into()));
        }

        Ok(())
    }
}

/// Load a threat config from TOML
///
/// Loads from `data/ai_threat/{name}.toml`
pub fn load_threat_config(name: &str) -> Result<ThreatConfig> {
    let path = config_path(name);
    let contents = fs::read_to_string(&path)?;

    let mut config = ThreatConfig::from_toml_str(&contents)?;
    config.name = name.to_string();

    tracing::debug!("Loaded threat config {:?} from {:?}", name, path);
    Ok(config)
}

fn config_path(name: &str) -> PathBuf {
    PathBuf::from("data/ai_threat").join(format!("{}.toml", name))
}
