//! Battle system - turn-based tactical combat on a small grid
//!
//! Units act in speed order; each acting unit rolls for skills, otherwise
//! finds, approaches and attacks a target. Damage resolves through an
//! off-thread channel, status effects live in a central ledger, and every
//! observable change goes out as a typed event.

pub mod ai;
pub mod damage;
pub mod events;
pub mod modifiers;
pub mod pathfinding;
pub mod reactions;
pub mod roster;
pub mod skill_select;
pub mod status;
pub mod targeting;
pub mod turn;
pub mod unit;

// Re-exports for convenient access
pub use ai::{ActionLeaf, BehaviorNode, Blackboard, ConditionLeaf, NodeHost, NodeStatus};
pub use damage::{DamageChannel, DamageRequest, DamageResult};
pub use events::{BattleEvent, BattleOutcome, EventBus};
pub use modifiers::{attack_multiplier, damage_reduction, ModifierOp, ModifierTrace, TraceStep};
pub use pathfinding::{find_path, GridBounds};
pub use reactions::{ReactionQueue, ReactionTrigger, RuleCheck, MAX_REACTION_DEPTH};
pub use roster::Roster;
pub use skill_select::{select_active, select_buff, SkillChoice};
pub use status::{ActiveEffect, StatusLedger};
pub use targeting::{attackable_positions, find_best_target, TargetCriterion};
pub use turn::{TurnEngine, TurnPhase};
pub use unit::{Unit, UnitStats};
