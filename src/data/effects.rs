//! Status effect definitions

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::core::error::Result;

/// How long an effect lasts once applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectDuration {
    /// Decremented at the owner's turn-end; expires at zero
    Turns(u32),
    /// Never decremented; cleared only explicitly or on death
    Infinite,
}

/// Immutable status effect definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectDefinition {
    pub id: String,
    pub name: String,
    pub base_duration: EffectDuration,
    /// Whether repeated applications accumulate stacks
    #[serde(default)]
    pub stackable: bool,
    /// Stack cap for stackable effects (ignored otherwise)
    #[serde(default = "default_max_stacks")]
    pub max_stacks: u32,
    /// Multiplicative attack modifier while active (per stack)
    #[serde(default)]
    pub attack_modifier: Option<f32>,
    /// Additive incoming-damage reduction while active
    #[serde(default)]
    pub damage_reduction: Option<f32>,
    /// Fixed damage applied at the owner's turn-start, per stack;
    /// bypasses defense and mitigation
    #[serde(default)]
    pub per_turn_damage: Option<i32>,
    /// Whether the owner's turn is skipped while this effect is active
    #[serde(default)]
    pub disables_action: bool,
}

fn default_max_stacks() -> u32 {
    1
}

/// Catalog of all effect definitions, keyed by id
#[derive(Debug, Clone, Default)]
pub struct EffectCatalog {
    effects: HashMap<String, EffectDefinition>,
}

impl EffectCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Built-in effect set
    pub fn with_defaults() -> Self {
        let mut catalog = Self::new();

        catalog.add(EffectDefinition {
            id: "poison".into(),
            name: "Poison".into(),
            base_duration: EffectDuration::Turns(3),
            stackable: true,
            max_stacks: 5,
            attack_modifier: None,
            damage_reduction: None,
            per_turn_damage: Some(2),
            disables_action: false,
        });

        catalog.add(EffectDefinition {
            id: "bleed".into(),
            name: "Bleed".into(),
            base_duration: EffectDuration::Turns(2),
            stackable: true,
            max_stacks: 3,
            attack_modifier: None,
            damage_reduction: None,
            per_turn_damage: Some(1),
            disables_action: false,
        });

        catalog.add(EffectDefinition {
            id: "battle_fury".into(),
            name: "Battle Fury".into(),
            base_duration: EffectDuration::Turns(3),
            stackable: false,
            max_stacks: 1,
            attack_modifier: Some(1.5),
            damage_reduction: None,
            per_turn_damage: None,
            disables_action: false,
        });

        catalog.add(EffectDefinition {
            id: "stun".into(),
            name: "Stun".into(),
            base_duration: EffectDuration::Turns(1),
            stackable: false,
            max_stacks: 1,
            attack_modifier: None,
            damage_reduction: None,
            per_turn_damage: None,
            disables_action: true,
        });

        catalog.add(EffectDefinition {
            id: "stone_skin".into(),
            name: "Stone Skin".into(),
            base_duration: EffectDuration::Infinite,
            stackable: false,
            max_stacks: 1,
            attack_modifier: None,
            damage_reduction: Some(0.2),
            per_turn_damage: None,
            disables_action: false,
        });

        catalog
    }

    /// Load a catalog from a JSON array of definitions
    pub fn from_json(json: &str) -> Result<Self> {
        let defs: Vec<EffectDefinition> = serde_json::from_str(json)?;
        let mut catalog = Self::new();
        for def in defs {
            catalog.add(def);
        }
        Ok(catalog)
    }

    pub fn add(&mut self, def: EffectDefinition) {
        self.effects.insert(def.id.clone(), def);
    }

    pub fn get(&self, id: &str) -> Option<&EffectDefinition> {
        self.effects.get(id)
    }
}
