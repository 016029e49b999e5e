//! Unit class definitions - stat templates units are built from

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::battle::unit::{Unit, UnitStats};
use crate::core::error::Result;
use crate::core::types::Allegiance;

/// A unit class: base stats, default loadout, tags
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassDefinition {
    pub id: String,
    pub name: String,
    pub stats: UnitStats,
    #[serde(default)]
    pub skill_slots: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub barrier: i32,
}

impl ClassDefinition {
    /// Instantiate a combatant of this class
    pub fn spawn(&self, name: impl Into<String>, allegiance: Allegiance) -> Unit {
        Unit::new(name, allegiance, self.stats)
            .with_skills(self.skill_slots.clone())
            .with_tags(self.tags.clone())
            .with_barrier(self.barrier)
    }
}

/// Catalog of unit classes, keyed by id
#[derive(Debug, Clone, Default)]
pub struct ClassCatalog {
    classes: HashMap<String, ClassDefinition>,
}

impl ClassCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Built-in class set
    pub fn with_defaults() -> Self {
        let mut catalog = Self::new();

        catalog.add(ClassDefinition {
            id: "soldier".into(),
            name: "Soldier".into(),
            stats: UnitStats {
                max_hp: 40,
                attack: 7,
                defense: 4,
                speed: 5,
                strength: 7,
                agility: 5,
                intellect: 3,
                willpower: 5,
                vitality: 7,
                luck: 4,
                weight: 14,
                attack_range: 1,
                move_range: 3,
            },
            skill_slots: vec!["power_strike".into(), "riposte".into()],
            tags: vec!["melee".into()],
            barrier: 0,
        });

        catalog.add(ClassDefinition {
            id: "ranger".into(),
            name: "Ranger".into(),
            stats: UnitStats {
                max_hp: 28,
                attack: 6,
                defense: 2,
                speed: 8,
                strength: 4,
                agility: 8,
                intellect: 5,
                willpower: 4,
                vitality: 4,
                luck: 6,
                weight: 9,
                attack_range: 4,
                move_range: 4,
            },
            skill_slots: vec!["venom_blade".into(), "serrated_edge".into()],
            tags: vec!["ranged".into()],
            barrier: 0,
        });

        catalog.add(ClassDefinition {
            id: "warden".into(),
            name: "Warden".into(),
            stats: UnitStats {
                max_hp: 50,
                attack: 5,
                defense: 6,
                speed: 3,
                strength: 8,
                agility: 2,
                intellect: 3,
                willpower: 7,
                vitality: 9,
                luck: 3,
                weight: 20,
                attack_range: 1,
                move_range: 2,
            },
            skill_slots: vec!["war_cry".into(), "power_strike".into(), "last_stand".into()],
            tags: vec!["melee".into(), "heavy".into()],
            barrier: 10,
        });

        catalog.add(ClassDefinition {
            id: "hexer".into(),
            name: "Hexer".into(),
            stats: UnitStats {
                max_hp: 24,
                attack: 4,
                defense: 1,
                speed: 6,
                strength: 2,
                agility: 5,
                intellect: 9,
                willpower: 8,
                vitality: 3,
                luck: 7,
                weight: 8,
                attack_range: 3,
                move_range: 3,
            },
            skill_slots: vec!["crippling_hex".into(), "venom_blade".into()],
            tags: vec!["caster".into()],
            barrier: 6,
        });

        catalog
    }

    /// Load a catalog from a JSON array of definitions
    pub fn from_json(json: &str) -> Result<Self> {
        let defs: Vec<ClassDefinition> = serde_json::from_str(json)?;
        let mut catalog = Self::new();
        for def in defs {
            catalog.add(def);
        }
        Ok(catalog)
    }

    pub fn add(&mut self, def: ClassDefinition) {
        self.classes.insert(def.id.clone(), def);
    }

    pub fn get(&self, id: &str) -> Option<&ClassDefinition> {
        self.classes.get(id)
    }
}
