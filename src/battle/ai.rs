//! Behavior tree AI - composite nodes over leaf actions and conditions
//!
//! Nodes are a closed enum walked by one interpreter; leaves call back into
//! the hosting engine through the `NodeHost` trait. Sibling nodes pass data
//! through the blackboard, never through node state.

use serde::{Deserialize, Serialize};

use crate::battle::skill_select::SkillChoice;
use crate::core::error::Result;
use crate::core::types::UnitId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeStatus {
    Success,
    Failure,
    Running,
}

/// Leaf actions (side-effecting)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionLeaf {
    /// Run the two-pass skill selection; writes `skill_to_use`/`skill_target`
    DecideSkill,
    /// Execute the selected skill
    UseSkill,
    /// Pick a basic-attack target; writes `target`
    FindTarget,
    /// Path toward an attackable tile next to `target`
    MoveToTarget,
    /// Basic attack against `target`
    AttackTarget,
}

/// Leaf conditions (read-only checks)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionLeaf {
    /// Is `target` within the actor's attack range?
    IsInRange,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BehaviorNode {
    /// Logical OR: first non-Failure child result wins
    Selector(Vec<BehaviorNode>),
    /// Logical AND: first non-Success child result wins
    Sequence(Vec<BehaviorNode>),
    Action(ActionLeaf),
    Condition(ConditionLeaf),
}

/// Shared mutable context for one decision cycle
#[derive(Debug, Clone, Default)]
pub struct Blackboard {
    pub target: Option<UnitId>,
    pub skill_to_use: Option<SkillChoice>,
    pub skill_target: Option<UnitId>,
}

/// Engine-side implementation of the leaves
pub trait NodeHost {
    fn action(&mut self, actor: UnitId, leaf: ActionLeaf, bb: &mut Blackboard)
        -> Result<NodeStatus>;
    fn condition(
        &mut self,
        actor: UnitId,
        leaf: ConditionLeaf,
        bb: &mut Blackboard,
    ) -> Result<NodeStatus>;
}

/// Evaluate a tree for one acting unit
pub fn evaluate(
    node: &BehaviorNode,
    host: &mut dyn NodeHost,
    actor: UnitId,
    bb: &mut Blackboard,
) -> Result<NodeStatus> {
    match node {
        BehaviorNode::Selector(children) => {
            for child in children {
                let status = evaluate(child, host, actor, bb)?;
                if status != NodeStatus::Failure {
                    return Ok(status);
                }
            }
            Ok(NodeStatus::Failure)
        }
        BehaviorNode::Sequence(children) => {
            for child in children {
                let status = evaluate(child, host, actor, bb)?;
                if status != NodeStatus::Success {
                    return Ok(status);
                }
            }
            Ok(NodeStatus::Success)
        }
        BehaviorNode::Action(leaf) => host.action(actor, *leaf, bb),
        BehaviorNode::Condition(leaf) => host.condition(actor, *leaf, bb),
    }
}

/// The standard per-unit decision tree: try a skill first, otherwise
/// find-move-attack.
pub fn default_tree() -> BehaviorNode {
    BehaviorNode::Selector(vec![
        BehaviorNode::Sequence(vec![
            BehaviorNode::Action(ActionLeaf::DecideSkill),
            BehaviorNode::Action(ActionLeaf::UseSkill),
        ]),
        BehaviorNode::Sequence(vec![
            BehaviorNode::Action(ActionLeaf::FindTarget),
            BehaviorNode::Selector(vec![
                BehaviorNode::Condition(ConditionLeaf::IsInRange),
                BehaviorNode::Action(ActionLeaf::MoveToTarget),
            ]),
            BehaviorNode::Action(ActionLeaf::AttackTarget),
        ]),
    ])
}
