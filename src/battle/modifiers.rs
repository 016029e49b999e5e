//! Modifier pipeline - composes stat adjustments from passives and effects
//!
//! Stateless computations over the status ledger and the acting unit's
//! passive skills. Every value carries a structured trace so a battle log
//! can explain exactly where a number came from; traces are observational
//! and never feed back into control flow.

use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

use crate::battle::status::StatusLedger;
use crate::battle::unit::Unit;
use crate::data::effects::EffectCatalog;
use crate::data::skills::{SkillCatalog, SkillCategory};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModifierOp {
    Add,
    Mul,
}

/// One contributing modifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceStep {
    pub source: String,
    pub op: ModifierOp,
    pub value: f32,
}

/// Structured explanation of a computed value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModifierTrace {
    pub base: f32,
    pub steps: Vec<TraceStep>,
    pub formula: String,
    pub result: f32,
}

impl ModifierTrace {
    fn build(base: f32, steps: Vec<TraceStep>) -> Self {
        let mut result = base;
        let mut formula = format!("{:.2}", base);
        for step in &steps {
            match step.op {
                ModifierOp::Add => {
                    result += step.value;
                    let _ = write!(formula, " + {:.2} [{}]", step.value, step.source);
                }
                ModifierOp::Mul => {
                    result *= step.value;
                    let _ = write!(formula, " × {:.2} [{}]", step.value, step.source);
                }
            }
        }
        let _ = write!(formula, " = {:.2}", result);
        Self {
            base,
            steps,
            formula,
            result,
        }
    }
}

/// Attack multiplier from active multiplicative effects.
///
/// Base 1.0; each stack of an effect with an attack modifier multiplies in
/// once.
pub fn attack_multiplier(
    unit: &Unit,
    ledger: &StatusLedger,
    effects: &EffectCatalog,
) -> ModifierTrace {
    let mut steps = Vec::new();
    for active in ledger.active(unit.id) {
        let Some(def) = effects.get(&active.effect_id) else {
            continue;
        };
        if let Some(modifier) = def.attack_modifier {
            for _ in 0..active.stacks {
                steps.push(TraceStep {
                    source: def.id.clone(),
                    op: ModifierOp::Mul,
                    value: modifier,
                });
            }
        }
    }

    let trace = ModifierTrace::build(1.0, steps);
    tracing::debug!(unit = %unit.name, formula = %trace.formula, "attack multiplier");
    trace
}

/// Fractional incoming-damage reduction.
///
/// Base 0.0; conditional passive reductions from the unit's passive skills
/// plus flat reductions from active effects, all additive.
pub fn damage_reduction(
    unit: &Unit,
    ledger: &StatusLedger,
    skills: &SkillCatalog,
    effects: &EffectCatalog,
) -> ModifierTrace {
    let mut steps = Vec::new();

    for skill_id in &unit.skill_slots {
        let Some(skill) = skills.get(skill_id) else {
            continue;
        };
        if skill.category != SkillCategory::Passive {
            continue;
        }
        if let Some(passive) = skill.passive_reduction {
            let applies = match passive.when_hp_below {
                Some(threshold) => unit.hp_fraction() < threshold,
                None => true,
            };
            if applies {
                steps.push(TraceStep {
                    source: skill.id.clone(),
                    op: ModifierOp::Add,
                    value: passive.amount,
                });
            }
        }
    }

    for active in ledger.active(unit.id) {
        let Some(def) = effects.get(&active.effect_id) else {
            continue;
        };
        if let Some(reduction) = def.damage_reduction {
            steps.push(TraceStep {
                source: def.id.clone(),
                op: ModifierOp::Add,
                value: reduction,
            });
        }
    }

    let trace = ModifierTrace::build(0.0, steps);
    tracing::debug!(unit = %unit.name, formula = %trace.formula, "damage reduction");
    trace
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::unit::UnitStats;
    use crate::core::types::Allegiance;

    fn fixtures() -> (StatusLedger, SkillCatalog, EffectCatalog) {
        (
            StatusLedger::new(),
            SkillCatalog::with_defaults(),
            EffectCatalog::with_defaults(),
        )
    }

    #[test]
    fn test_attack_multiplier_base_is_one() {
        let (ledger, _, effects) = fixtures();
        let unit = Unit::new("u", Allegiance::Ally, UnitStats::default());
        let trace = attack_multiplier(&unit, &ledger, &effects);
        assert_eq!(trace.result, 1.0);
        assert!(trace.steps.is_empty());
    }

    #[test]
    fn test_attack_multiplier_from_fury() {
        let (mut ledger, _, effects) = fixtures();
        let unit = Unit::new("u", Allegiance::Ally, UnitStats::default());
        ledger.apply(unit.id, effects.get("battle_fury").unwrap());

        let trace = attack_multiplier(&unit, &ledger, &effects);
        assert!((trace.result - 1.5).abs() < f32::EPSILON);
        assert_eq!(trace.steps.len(), 1);
        assert!(trace.formula.contains("battle_fury"));
    }

    #[test]
    fn test_passive_reduction_gated_on_hp() {
        let (ledger, skills, effects) = fixtures();
        let mut unit = Unit::new("u", Allegiance::Ally, UnitStats::default())
            .with_skills(vec!["last_stand".into()]);

        // Full health: condition not met
        let trace = damage_reduction(&unit, &ledger, &skills, &effects);
        assert_eq!(trace.result, 0.0);

        // Below half: 25% reduction kicks in
        unit.current_hp = unit.stats.max_hp / 3;
        let trace = damage_reduction(&unit, &ledger, &skills, &effects);
        assert!((trace.result - 0.25).abs() < f32::EPSILON);
    }

    #[test]
    fn test_reductions_are_additive() {
        let (mut ledger, skills, effects) = fixtures();
        let mut unit = Unit::new("u", Allegiance::Ally, UnitStats::default())
            .with_skills(vec!["last_stand".into()]);
        unit.current_hp = 1;
        ledger.apply(unit.id, effects.get("stone_skin").unwrap());

        let trace = damage_reduction(&unit, &ledger, &skills, &effects);
        assert!((trace.result - 0.45).abs() < f32::EPSILON);
        assert_eq!(trace.steps.len(), 2);
    }

    #[test]
    fn test_trace_formula_shape() {
        let (mut ledger, _, effects) = fixtures();
        let unit = Unit::new("u", Allegiance::Ally, UnitStats::default());
        ledger.apply(unit.id, effects.get("battle_fury").unwrap());

        let trace = attack_multiplier(&unit, &ledger, &effects);
        assert_eq!(trace.formula, "1.00 × 1.50 [battle_fury] = 1.50");
    }
}
