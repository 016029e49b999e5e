//! Status effect ledger - per-unit active effects, stacks, durations
//!
//! One ledger entry per unit per effect id. Reapplication resets duration;
//! stackable effects accumulate stacks up to their cap. Entries expire at
//! turn-end decrements or are cleared wholesale on death.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::core::types::UnitId;
use crate::data::effects::{EffectCatalog, EffectDefinition, EffectDuration};

/// An effect bound to a unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveEffect {
    pub effect_id: String,
    pub remaining: EffectDuration,
    pub stacks: u32,
}

/// Per-unit mapping from effect id to remaining duration and stack count.
///
/// Entries are kept in application order so per-turn damage is applied
/// deterministically.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatusLedger {
    entries: HashMap<UnitId, Vec<ActiveEffect>>,
}

impl StatusLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply an effect (or another stack of it) to a unit.
    ///
    /// Returns the stack count after application. Duration always resets to
    /// the definition's base.
    pub fn apply(&mut self, unit_id: UnitId, def: &EffectDefinition) -> u32 {
        let effects = self.entries.entry(unit_id).or_default();

        if let Some(existing) = effects.iter_mut().find(|e| e.effect_id == def.id) {
            if def.stackable {
                existing.stacks = (existing.stacks + 1).min(def.max_stacks);
            } else {
                // Single-threaded mutation discipline keeps non-stacking
                // effects at exactly one instance
                debug_assert_eq!(existing.stacks, 1);
            }
            existing.remaining = def.base_duration;
            existing.stacks
        } else {
            effects.push(ActiveEffect {
                effect_id: def.id.clone(),
                remaining: def.base_duration,
                stacks: 1,
            });
            1
        }
    }

    /// Active effects on a unit, application order
    pub fn active(&self, unit_id: UnitId) -> &[ActiveEffect] {
        self.entries.get(&unit_id).map_or(&[], Vec::as_slice)
    }

    pub fn get(&self, unit_id: UnitId, effect_id: &str) -> Option<&ActiveEffect> {
        self.active(unit_id).iter().find(|e| e.effect_id == effect_id)
    }

    /// Decrement finite durations at the unit's turn-end.
    ///
    /// Returns the ids of effects that expired and were removed. Infinite
    /// durations are never decremented.
    pub fn tick_turn_end(&mut self, unit_id: UnitId) -> Vec<String> {
        let Some(effects) = self.entries.get_mut(&unit_id) else {
            return Vec::new();
        };

        let mut expired = Vec::new();
        effects.retain_mut(|effect| match effect.remaining {
            EffectDuration::Infinite => true,
            EffectDuration::Turns(n) => {
                let left = n.saturating_sub(1);
                if left == 0 {
                    expired.push(effect.effect_id.clone());
                    false
                } else {
                    effect.remaining = EffectDuration::Turns(left);
                    true
                }
            }
        });
        expired
    }

    /// Remove one effect explicitly (e.g. a cleanse)
    pub fn remove(&mut self, unit_id: UnitId, effect_id: &str) -> bool {
        let Some(effects) = self.entries.get_mut(&unit_id) else {
            return false;
        };
        let before = effects.len();
        effects.retain(|e| e.effect_id != effect_id);
        effects.len() != before
    }

    /// Drop the unit's entire ledger (on death). Returns the removed ids.
    pub fn clear_unit(&mut self, unit_id: UnitId) -> Vec<String> {
        self.entries
            .remove(&unit_id)
            .map(|effects| effects.into_iter().map(|e| e.effect_id).collect())
            .unwrap_or_default()
    }

    /// First active effect that forbids acting, if any
    pub fn disabling_effect(&self, unit_id: UnitId, catalog: &EffectCatalog) -> Option<String> {
        self.active(unit_id)
            .iter()
            .find(|e| {
                catalog
                    .get(&e.effect_id)
                    .is_some_and(|def| def.disables_action)
            })
            .map(|e| e.effect_id.clone())
    }

    /// Per-turn fixed damage owed by active effects, stack-scaled,
    /// in application order
    pub fn per_turn_damage(&self, unit_id: UnitId, catalog: &EffectCatalog) -> Vec<(String, i32)> {
        self.active(unit_id)
            .iter()
            .filter_map(|e| {
                let def = catalog.get(&e.effect_id)?;
                let per_stack = def.per_turn_damage?;
                Some((e.effect_id.clone(), per_stack * e.stacks as i32))
            })
            .collect()
    }
}
