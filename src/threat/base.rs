//! Shared layer state and the layer interface

use crate::core::types::{FactionId, Round};
use crate::squad::SquadQuery;
use crate::threat::cache::RoundCache;

/// State every layer carries: the viewing faction and its round cache
#[derive(Debug, Clone)]
pub struct LayerBase {
    pub faction: FactionId,
    pub cache: RoundCache,
}

impl LayerBase {
    pub fn new(faction: FactionId) -> Self {
        Self {
            faction,
            cache: RoundCache::new(),
        }
    }

    /// Every faction other than the viewing one.
    ///
    /// There is no alliance model: anyone who is not us is hostile.
    pub fn enemy_factions(&self, squads: &dyn SquadQuery) -> Vec<FactionId> {
        squads
            .factions()
            .into_iter()
            .filter(|&f| f != self.faction)
            .collect()
    }
}

/// A per-faction spatial layer recomputed once per combat round.
///
/// `Input` is whatever other layer output this layer reads while computing;
/// layers with no upstream dependency use `()`.
pub trait ThreatLayer {
    type Input<'a>;

    fn name(&self) -> &'static str;

    fn base(&self) -> &LayerBase;

    fn base_mut(&mut self) -> &mut LayerBase;

    /// Clear and repaint from current squad state, then mark clean for `round`
    fn compute(&mut self, squads: &dyn SquadQuery, input: Self::Input<'_>, round: Round);

    fn faction(&self) -> FactionId {
        self.base().faction
    }

    fn is_valid(&self, round: Round) -> bool {
        self.base().cache.is_valid(round)
    }

    fn mark_dirty(&mut self) {
        self.base_mut().cache.mark_dirty();
    }
}
