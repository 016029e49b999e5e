//! Reaction watchers - event-driven counter-attacks and on-hit debuffs
//!
//! Landed damage and attack attempts enqueue triggers instead of acting
//! immediately, so watchers never re-enter the turn machine mid-action.
//! The engine drains the queue between actions. Triggers carry a depth so
//! a counter-attack (depth 1) never spawns further reactions.

use std::collections::VecDeque;

use crate::battle::roster::Roster;
use crate::battle::unit::Unit;
use crate::core::types::UnitId;
use crate::data::skills::{SkillBehavior, SkillCatalog, SkillCategory, SkillDefinition};

/// Maximum reaction chain depth; damage at this depth triggers nothing
pub const MAX_REACTION_DEPTH: u8 = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReactionTrigger {
    /// Damage landed on a defender; it may retaliate
    DamageLanded {
        attacker_id: UnitId,
        defender_id: UnitId,
        depth: u8,
    },
    /// An attack was attempted; the attacker may apply an on-hit debuff
    AttackAttempted {
        attacker_id: UnitId,
        target_id: UnitId,
        depth: u8,
    },
}

/// FIFO of pending reaction triggers
#[derive(Debug, Clone, Default)]
pub struct ReactionQueue {
    pending: VecDeque<ReactionTrigger>,
}

impl ReactionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&mut self, trigger: ReactionTrigger) {
        self.pending.push_back(trigger);
    }

    pub fn pop(&mut self) -> Option<ReactionTrigger> {
        self.pending.pop_front()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

/// First equipped skill matching a reaction behavior, with its slot
pub fn find_reaction_skill<'a>(
    unit: &Unit,
    catalog: &'a SkillCatalog,
    behavior: SkillBehavior,
) -> Option<(usize, &'a SkillDefinition)> {
    unit.skill_slots.iter().enumerate().find_map(|(slot, id)| {
        let skill = catalog.get(id)?;
        if skill.category == SkillCategory::Reaction && skill.behavior == Some(behavior) {
            Some((slot, skill))
        } else {
            None
        }
    })
}

/// Audit watcher for decided-vs-executed mismatches.
///
/// The AI's decision and its execution are separated by damage resolution,
/// so a chosen target can die in between. That is a degenerate turn, not a
/// fault; this watcher reports it as a warning.
#[derive(Debug, Clone, Default)]
pub struct RuleCheck {
    decided: Option<(UnitId, UnitId)>,
}

impl RuleCheck {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_decision(&mut self, actor: UnitId, target: UnitId) {
        self.decided = Some((actor, target));
    }

    /// Check the pending decision against the roster; returns true when the
    /// decided target is still valid.
    pub fn verify_before_execution(&mut self, roster: &Roster) -> bool {
        let Some((actor, target)) = self.decided.take() else {
            return true;
        };
        if roster.is_alive(target) {
            true
        } else {
            tracing::warn!(
                ?actor,
                ?target,
                "decided target died before execution; action degraded to no-op"
            );
            false
        }
    }
}
