//! Notification bus - typed battle events, publish-only from the core
//!
//! Subscribers are called synchronously in registration order; each event
//! is also appended to an internal log for diagnostics and post-battle
//! summaries. The core never reads subscriber state back.

use serde::{Deserialize, Serialize};

use crate::core::types::{Turn, UnitId};

/// Why a battle ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BattleOutcome {
    /// All enemies fell
    Victory,
    /// All allies fell
    Defeat,
    /// Turn cap reached with both sides standing
    Draw,
}

/// The fixed catalogue of battle notifications
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BattleEvent {
    BattleStarted {
        allies: usize,
        enemies: usize,
    },
    TurnStarted {
        turn: Turn,
    },
    UnitTurnStarted {
        unit_id: UnitId,
    },
    UnitTurnEnded {
        unit_id: UnitId,
    },
    UnitTurnSkipped {
        unit_id: UnitId,
        effect_id: String,
    },
    AttackAttempted {
        attacker_id: UnitId,
        target_id: UnitId,
        skill_id: Option<String>,
    },
    DamageCalculated {
        target_id: UnitId,
        hp_damage_dealt: i32,
        barrier_damage_dealt: i32,
        new_hp: i32,
        new_barrier: i32,
    },
    StatusEffectApplied {
        unit_id: UnitId,
        effect_id: String,
        stacks: u32,
    },
    StatusEffectRemoved {
        unit_id: UnitId,
        effect_id: String,
    },
    SkillExecuted {
        unit_id: UnitId,
        skill_id: String,
    },
    UnitDied {
        unit_id: UnitId,
    },
    BattleEnded {
        outcome: BattleOutcome,
        turn: Turn,
    },
}

type Subscriber = Box<dyn FnMut(&BattleEvent)>;

/// Synchronous dispatch list plus internal event log
#[derive(Default)]
pub struct EventBus {
    subscribers: Vec<Subscriber>,
    log: Vec<BattleEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscriber. Subscribers run in registration order.
    pub fn subscribe(&mut self, subscriber: impl FnMut(&BattleEvent) + 'static) {
        self.subscribers.push(Box::new(subscriber));
    }

    pub fn publish(&mut self, event: BattleEvent) {
        for subscriber in &mut self.subscribers {
            subscriber(&event);
        }
        self.log.push(event);
    }

    /// Everything published so far, in order
    pub fn log(&self) -> &[BattleEvent] {
        &self.log
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscribers.len())
            .field("log", &self.log.len())
            .finish()
    }
}
