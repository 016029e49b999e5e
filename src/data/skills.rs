//! Skill definitions - immutable, data-driven, shared across units

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::core::error::Result;
use crate::dice::DiceFormula;

/// Skill category, drives which selection pass considers the skill
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillCategory {
    Active,
    Passive,
    Buff,
    Debuff,
    Reaction,
}

/// What a skill does when it activates.
///
/// The skill catalogue is static, so behavior is a closed enum dispatched
/// through a match rather than a name-to-function lookup. A definition with
/// no behavior is considered malformed at execution time and degrades to a
/// no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillBehavior {
    /// Roll the formula and deal damage to the chosen enemy
    Strike,
    /// Strike, then apply the attached status effect to the target
    StrikeAndAfflict,
    /// Apply the attached status effect to the acting unit
    BuffSelf,
    /// Apply the attached status effect to the chosen enemy
    AfflictTarget,
    /// Reaction: counter-attack the unit that just dealt damage
    Retaliate,
    /// Reaction: apply the attached effect to the target of an own attack
    OnHitAfflict,
}

/// Flat damage reduction granted by a passive skill, optionally gated on
/// the holder's health fraction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PassiveReduction {
    /// Fraction of incoming damage removed (additive with other sources)
    pub amount: f32,
    /// Only active while `current_hp / max_hp` is below this value
    pub when_hp_below: Option<f32>,
}

/// Immutable skill definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillDefinition {
    pub id: String,
    pub name: String,
    pub category: SkillCategory,
    /// Damage roll, for skills that deal damage
    pub formula: Option<DiceFormula>,
    /// Status effect applied by this skill, if any
    #[serde(default)]
    pub effect_id: Option<String>,
    /// Multiplier on the slot base probability (defaults to 1.0)
    #[serde(default)]
    pub probability_override: Option<f32>,
    /// Tags the owning unit must carry for the skill to be equipable
    #[serde(default)]
    pub required_tags: Vec<String>,
    /// Execution behavior; absent means the skill cannot activate
    #[serde(default)]
    pub behavior: Option<SkillBehavior>,
    /// Passive damage reduction, for passive-category skills
    #[serde(default)]
    pub passive_reduction: Option<PassiveReduction>,
}

impl SkillDefinition {
    /// Effective activation probability for a given slot base
    pub fn effective_probability(&self, slot_base: f32) -> f32 {
        slot_base * self.probability_override.unwrap_or(1.0)
    }
}

/// Catalog of all skill definitions, keyed by id
#[derive(Debug, Clone, Default)]
pub struct SkillCatalog {
    skills: HashMap<String, SkillDefinition>,
}

impl SkillCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Built-in skill set
    pub fn with_defaults() -> Self {
        let mut catalog = Self::new();

        catalog.add(SkillDefinition {
            id: "power_strike".into(),
            name: "Power Strike".into(),
            category: SkillCategory::Active,
            formula: Some(DiceFormula::new(2, 8, 2)),
            effect_id: None,
            probability_override: None,
            required_tags: vec![],
            behavior: Some(SkillBehavior::Strike),
            passive_reduction: None,
        });

        catalog.add(SkillDefinition {
            id: "venom_blade".into(),
            name: "Venom Blade".into(),
            category: SkillCategory::Active,
            formula: Some(DiceFormula::new(1, 6, 1)),
            effect_id: Some("poison".into()),
            probability_override: None,
            required_tags: vec![],
            behavior: Some(SkillBehavior::StrikeAndAfflict),
            passive_reduction: None,
        });

        catalog.add(SkillDefinition {
            id: "war_cry".into(),
            name: "War Cry".into(),
            category: SkillCategory::Buff,
            formula: None,
            effect_id: Some("battle_fury".into()),
            probability_override: None,
            required_tags: vec![],
            behavior: Some(SkillBehavior::BuffSelf),
            passive_reduction: None,
        });

        catalog.add(SkillDefinition {
            id: "crippling_hex".into(),
            name: "Crippling Hex".into(),
            category: SkillCategory::Debuff,
            formula: None,
            effect_id: Some("stun".into()),
            probability_override: Some(0.5),
            required_tags: vec!["caster".into()],
            behavior: Some(SkillBehavior::AfflictTarget),
            passive_reduction: None,
        });

        catalog.add(SkillDefinition {
            id: "riposte".into(),
            name: "Riposte".into(),
            category: SkillCategory::Reaction,
            formula: Some(DiceFormula::new(1, 6, 0)),
            effect_id: None,
            probability_override: None,
            required_tags: vec![],
            behavior: Some(SkillBehavior::Retaliate),
            passive_reduction: None,
        });

        catalog.add(SkillDefinition {
            id: "serrated_edge".into(),
            name: "Serrated Edge".into(),
            category: SkillCategory::Reaction,
            formula: None,
            effect_id: Some("bleed".into()),
            probability_override: None,
            required_tags: vec![],
            behavior: Some(SkillBehavior::OnHitAfflict),
            passive_reduction: None,
        });

        catalog.add(SkillDefinition {
            id: "last_stand".into(),
            name: "Last Stand".into(),
            category: SkillCategory::Passive,
            formula: None,
            effect_id: None,
            probability_override: None,
            required_tags: vec![],
            behavior: None,
            passive_reduction: Some(PassiveReduction {
                amount: 0.25,
                when_hp_below: Some(0.5),
            }),
        });

        catalog
    }

    /// Load a catalog from a JSON array of definitions
    pub fn from_json(json: &str) -> Result<Self> {
        let defs: Vec<SkillDefinition> = serde_json::from_str(json)?;
        let mut catalog = Self::new();
        for def in defs {
            catalog.add(def);
        }
        Ok(catalog)
    }

    pub fn add(&mut self, def: SkillDefinition) {
        self.skills.insert(def.id.clone(), def);
    }

    pub fn get(&self, id: &str) -> Option<&SkillDefinition> {
        self.skills.get(id)
    }

    pub fn len(&self) -> usize {
        self.skills.len()
    }

    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }
}
