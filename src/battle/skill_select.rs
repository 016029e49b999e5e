//! Skill selection - fixed-odds slot model
//!
//! Two independent passes per unit turn: buffs first (at most one per
//! turn), then active/debuff skills among the remaining slots. Both passes
//! draw from the same uniform source and resolve ties by slot order.

use crate::battle::unit::Unit;
use crate::core::config::BattleConfig;
use crate::dice::RollSource;
use crate::data::skills::{SkillCatalog, SkillCategory};

/// A selected skill and the slot it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkillChoice {
    pub slot: usize,
    pub skill_id: String,
}

fn tags_satisfied(unit: &Unit, required: &[String]) -> bool {
    required.iter().all(|tag| unit.has_tag(tag))
}

/// Buff pass: first buff-category skill whose slot roll succeeds.
///
/// Buffs roll against the raw slot base; the per-skill probability
/// override only weights the active/debuff pass.
pub fn select_buff(
    unit: &Unit,
    config: &BattleConfig,
    catalog: &SkillCatalog,
    rolls: &mut dyn RollSource,
) -> Option<SkillChoice> {
    for (slot, skill_id) in unit.skill_slots.iter().enumerate() {
        let Some(skill) = catalog.get(skill_id) else {
            tracing::warn!(unit = %unit.name, skill = %skill_id, "unknown skill in slot, skipping");
            continue;
        };
        if skill.category != SkillCategory::Buff || !tags_satisfied(unit, &skill.required_tags) {
            continue;
        }
        if rolls.check(config.slot_probability(slot)) {
            return Some(SkillChoice {
                slot,
                skill_id: skill_id.clone(),
            });
        }
    }
    None
}

/// Active/debuff pass over the remaining (non-buff) slots.
///
/// A skill is eligible only if it declares a behavior; effective probability
/// is the slot base times the skill's override. First success wins.
pub fn select_active(
    unit: &Unit,
    config: &BattleConfig,
    catalog: &SkillCatalog,
    rolls: &mut dyn RollSource,
    used_buff_slot: Option<usize>,
) -> Option<SkillChoice> {
    for (slot, skill_id) in unit.skill_slots.iter().enumerate() {
        if Some(slot) == used_buff_slot {
            continue;
        }
        let Some(skill) = catalog.get(skill_id) else {
            continue; // already warned in the buff pass
        };
        if !matches!(skill.category, SkillCategory::Active | SkillCategory::Debuff) {
            continue;
        }
        if skill.behavior.is_none() || !tags_satisfied(unit, &skill.required_tags) {
            continue;
        }
        let chance = skill.effective_probability(config.slot_probability(slot));
        if rolls.check(chance) {
            return Some(SkillChoice {
                slot,
                skill_id: skill_id.clone(),
            });
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::unit::UnitStats;
    use crate::core::types::Allegiance;
    use crate::data::skills::{SkillBehavior, SkillDefinition};
    use crate::dice::FixedRolls;

    fn unit_with(skills: Vec<&str>) -> Unit {
        Unit::new("u", Allegiance::Ally, UnitStats::default())
            .with_skills(skills.into_iter().map(String::from).collect())
            .with_tags(vec!["caster".into()])
    }

    #[test]
    fn test_first_slot_wins_at_fixed_roll() {
        // 0.35 < slot 0 base 0.4: first slot activates, later never evaluated
        let unit = unit_with(vec!["power_strike", "venom_blade"]);
        let config = BattleConfig::default();
        let catalog = SkillCatalog::with_defaults();
        let mut rolls = FixedRolls { unit: 0.35, roll: 0 };

        let choice = select_active(&unit, &config, &catalog, &mut rolls, None).unwrap();
        assert_eq!(choice.slot, 0);
        assert_eq!(choice.skill_id, "power_strike");
    }

    #[test]
    fn test_no_activation_when_roll_too_high() {
        let unit = unit_with(vec!["power_strike", "venom_blade"]);
        let config = BattleConfig::default();
        let catalog = SkillCatalog::with_defaults();
        let mut rolls = FixedRolls { unit: 0.95, roll: 0 };

        assert!(select_active(&unit, &config, &catalog, &mut rolls, None).is_none());
    }

    #[test]
    fn test_buff_pass_only_considers_buffs() {
        let unit = unit_with(vec!["power_strike", "war_cry"]);
        let config = BattleConfig::default();
        let catalog = SkillCatalog::with_defaults();
        let mut rolls = FixedRolls { unit: 0.0, roll: 0 };

        let choice = select_buff(&unit, &config, &catalog, &mut rolls).unwrap();
        assert_eq!(choice.skill_id, "war_cry");
        assert_eq!(choice.slot, 1);
    }

    #[test]
    fn test_buff_pass_ignores_probability_override() {
        // Override 0.5 would shrink slot 0's base 0.4 to 0.2, but buffs
        // roll against the raw slot base: 0.35 < 0.4 still activates.
        let mut catalog = SkillCatalog::with_defaults();
        catalog.add(SkillDefinition {
            id: "focused_cry".into(),
            name: "Focused Cry".into(),
            category: SkillCategory::Buff,
            formula: None,
            effect_id: Some("battle_fury".into()),
            probability_override: Some(0.5),
            required_tags: vec![],
            behavior: Some(SkillBehavior::BuffSelf),
            passive_reduction: None,
        });
        let unit = unit_with(vec!["focused_cry"]);
        let config = BattleConfig::default();
        let mut rolls = FixedRolls { unit: 0.35, roll: 0 };

        let choice = select_buff(&unit, &config, &catalog, &mut rolls).unwrap();
        assert_eq!(choice.skill_id, "focused_cry");
    }

    #[test]
    fn test_active_pass_skips_used_buff_slot() {
        let unit = unit_with(vec!["war_cry", "power_strike"]);
        let config = BattleConfig::default();
        let catalog = SkillCatalog::with_defaults();
        let mut rolls = FixedRolls { unit: 0.0, roll: 0 };

        let choice = select_active(&unit, &config, &catalog, &mut rolls, Some(0)).unwrap();
        assert_eq!(choice.skill_id, "power_strike");
    }

    #[test]
    fn test_probability_override_applies() {
        // crippling_hex overrides to 0.5x: slot 0 base 0.4 becomes 0.2
        let unit = unit_with(vec!["crippling_hex"]);
        let config = BattleConfig::default();
        let catalog = SkillCatalog::with_defaults();

        let mut low = FixedRolls { unit: 0.19, roll: 0 };
        assert!(select_active(&unit, &config, &catalog, &mut low, None).is_some());

        let mut high = FixedRolls { unit: 0.25, roll: 0 };
        assert!(select_active(&unit, &config, &catalog, &mut high, None).is_none());
    }

    #[test]
    fn test_required_tags_gate_eligibility() {
        let mut unit = unit_with(vec!["crippling_hex"]);
        unit.tags.clear();
        let config = BattleConfig::default();
        let catalog = SkillCatalog::with_defaults();
        let mut rolls = FixedRolls { unit: 0.0, roll: 0 };

        assert!(select_active(&unit, &config, &catalog, &mut rolls, None).is_none());
    }

    #[test]
    fn test_reactions_and_passives_not_proactively_selected() {
        let unit = unit_with(vec!["riposte", "last_stand"]);
        let config = BattleConfig::default();
        let catalog = SkillCatalog::with_defaults();
        let mut rolls = FixedRolls { unit: 0.0, roll: 0 };

        assert!(select_active(&unit, &config, &catalog, &mut rolls, None).is_none());
        assert!(select_buff(&unit, &config, &catalog, &mut rolls).is_none());
    }

    #[test]
    fn test_unknown_skill_id_skipped() {
        let unit = unit_with(vec!["no_such_skill", "power_strike"]);
        let config = BattleConfig::default();
        let catalog = SkillCatalog::with_defaults();
        let mut rolls = FixedRolls { unit: 0.0, roll: 0 };

        let choice = select_active(&unit, &config, &catalog, &mut rolls, None).unwrap();
        assert_eq!(choice.skill_id, "power_strike");
    }
}
