//! Combat units and their stats

use serde::{Deserialize, Serialize};

use crate::core::types::{Allegiance, GridPos, UnitId};

/// Base stats for a unit.
///
/// `attack`/`defense`/`speed` drive combat math directly; the six attribute
/// stats feed class balance and eligibility rules; `weight` matters for
/// knockback-style effects at the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UnitStats {
    pub max_hp: i32,
    pub attack: i32,
    pub defense: i32,
    pub speed: i32,

    // Attribute stats
    pub strength: i32,
    pub agility: i32,
    pub intellect: i32,
    pub willpower: i32,
    pub vitality: i32,
    pub luck: i32,

    pub weight: i32,
    pub attack_range: u32,
    pub move_range: u32,
}

impl Default for UnitStats {
    fn default() -> Self {
        Self {
            max_hp: 30,
            attack: 5,
            defense: 2,
            speed: 5,
            strength: 5,
            agility: 5,
            intellect: 5,
            willpower: 5,
            vitality: 5,
            luck: 5,
            weight: 10,
            attack_range: 1,
            move_range: 3,
        }
    }
}

/// A combatant, owned by the turn engine's roster for one battle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Unit {
    pub id: UnitId,
    pub name: String,
    pub allegiance: Allegiance,
    pub position: GridPos,
    pub stats: UnitStats,

    pub current_hp: i32,
    pub current_barrier: i32,
    pub max_barrier: i32,

    /// Equipped skill ids, slot order significant
    pub skill_slots: Vec<String>,
    /// Tags used for skill eligibility checks
    pub tags: Vec<String>,
}

impl Unit {
    pub fn new(name: impl Into<String>, allegiance: Allegiance, stats: UnitStats) -> Self {
        Self {
            id: UnitId::new(),
            name: name.into(),
            allegiance,
            position: GridPos::default(),
            current_hp: stats.max_hp,
            current_barrier: 0,
            max_barrier: 0,
            stats,
            skill_slots: Vec::new(),
            tags: Vec::new(),
        }
    }

    pub fn at(mut self, position: GridPos) -> Self {
        self.position = position;
        self
    }

    pub fn with_skills(mut self, skills: Vec<String>) -> Self {
        self.skill_slots = skills;
        self
    }

    pub fn with_barrier(mut self, barrier: i32) -> Self {
        self.current_barrier = barrier;
        self.max_barrier = barrier;
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn is_alive(&self) -> bool {
        self.current_hp > 0
    }

    /// Fraction of max health remaining
    pub fn hp_fraction(&self) -> f32 {
        if self.stats.max_hp <= 0 {
            return 0.0;
        }
        self.current_hp as f32 / self.stats.max_hp as f32
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Is the target within this unit's attack range?
    pub fn in_attack_range(&self, target_pos: &GridPos) -> bool {
        self.position.distance(target_pos) <= self.stats.attack_range
    }
}
