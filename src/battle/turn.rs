//! Turn state machine - the authoritative battle timeline
//!
//! `StartTurn → ProcessUnitTurn → EndTurn → (StartTurn | BattleEnd)`.
//! The engine owns the roster, the status ledger and the event bus; all
//! mutation happens on this thread of control in response to resolved
//! results. The only concurrency is the damage channel, and the engine
//! always waits for each result before issuing the next request against
//! the same target.

use std::collections::HashMap;

use crate::battle::ai::{
    self, ActionLeaf, BehaviorNode, Blackboard, ConditionLeaf, NodeHost, NodeStatus,
};
use crate::battle::damage::{DamageChannel, DamageRequest, DamageResult};
use crate::battle::events::{BattleEvent, BattleOutcome, EventBus};
use crate::battle::modifiers;
use crate::battle::pathfinding::{find_path, GridBounds};
use crate::battle::reactions::{
    find_reaction_skill, ReactionQueue, ReactionTrigger, RuleCheck, MAX_REACTION_DEPTH,
};
use crate::battle::roster::Roster;
use crate::battle::skill_select::{select_active, select_buff};
use crate::battle::status::StatusLedger;
use crate::battle::targeting::{attackable_positions, find_best_target, TargetCriterion};
use crate::battle::unit::{Unit, UnitStats};
use crate::core::config::BattleConfig;
use crate::core::error::{Result, TacticsError};
use crate::core::types::{Turn, UnitId};
use crate::data::effects::EffectCatalog;
use crate::data::skills::{SkillBehavior, SkillCatalog, SkillDefinition};
use crate::dice::{DiceFormula, RollSource};

/// Damage formula for a basic (non-skill) attack
const BASIC_ATTACK_FORMULA: DiceFormula = DiceFormula {
    count: 1,
    sides: 6,
    bonus: 0,
};

/// Phases of the turn state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnPhase {
    StartTurn,
    ProcessUnitTurn,
    EndTurn,
    BattleEnd,
}

/// The turn engine: orchestrates one battle from start to finish
pub struct TurnEngine {
    roster: Roster,
    ledger: StatusLedger,
    bus: EventBus,
    config: BattleConfig,
    bounds: GridBounds,
    skills: SkillCatalog,
    effects: EffectCatalog,
    dice: Box<dyn RollSource>,
    channel: DamageChannel,

    trees: HashMap<UnitId, BehaviorNode>,
    reactions: ReactionQueue,
    rule_check: RuleCheck,

    turn: Turn,
    phase: TurnPhase,
    turn_order: Vec<UnitId>,
    outcome: Option<BattleOutcome>,
    started: bool,
}

impl TurnEngine {
    pub fn new(
        config: BattleConfig,
        bounds: GridBounds,
        skills: SkillCatalog,
        effects: EffectCatalog,
        dice: Box<dyn RollSource>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            roster: Roster::new(),
            ledger: StatusLedger::new(),
            bus: EventBus::new(),
            config,
            bounds,
            skills,
            effects,
            dice,
            channel: DamageChannel::spawn()?,
            trees: HashMap::new(),
            reactions: ReactionQueue::new(),
            rule_check: RuleCheck::new(),
            turn: 0,
            phase: TurnPhase::StartTurn,
            turn_order: Vec::new(),
            outcome: None,
            started: false,
        })
    }

    pub fn add_unit(&mut self, unit: Unit) -> UnitId {
        self.roster.add(unit)
    }

    /// Register an external observer on the notification bus
    pub fn subscribe(&mut self, subscriber: impl FnMut(&BattleEvent) + 'static) {
        self.bus.subscribe(subscriber);
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn ledger(&self) -> &StatusLedger {
        &self.ledger
    }

    pub fn events(&self) -> &[BattleEvent] {
        self.bus.log()
    }

    pub fn turn(&self) -> Turn {
        self.turn
    }

    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    pub fn outcome(&self) -> Option<BattleOutcome> {
        self.outcome
    }

    /// Run the battle to completion
    pub fn run(&mut self) -> Result<BattleOutcome> {
        loop {
            if self.step()? == TurnPhase::BattleEnd {
                return Ok(self.outcome.unwrap_or(BattleOutcome::Draw));
            }
        }
    }

    /// Execute the current phase and return the phase that follows
    pub fn step(&mut self) -> Result<TurnPhase> {
        if !self.started {
            self.started = true;
            self.bus.publish(BattleEvent::BattleStarted {
                allies: self
                    .roster
                    .living_count(crate::core::types::Allegiance::Ally),
                enemies: self
                    .roster
                    .living_count(crate::core::types::Allegiance::Enemy),
            });
        }

        match self.phase {
            TurnPhase::StartTurn => self.start_turn(),
            TurnPhase::ProcessUnitTurn => self.process_unit_turns()?,
            TurnPhase::EndTurn => self.end_turn(),
            TurnPhase::BattleEnd => {}
        }
        Ok(self.phase)
    }

    fn start_turn(&mut self) {
        // Terminal condition is checked before anything else
        if let Some(outcome) = self.check_battle_end() {
            self.finish(outcome);
            return;
        }
        if self.turn >= self.config.max_turns {
            tracing::info!(turn = self.turn, "turn cap reached, calling the battle a draw");
            self.finish(BattleOutcome::Draw);
            return;
        }

        self.turn += 1;
        self.turn_order = self.calculate_turn_order();
        self.bus.publish(BattleEvent::TurnStarted { turn: self.turn });
        self.phase = TurnPhase::ProcessUnitTurn;
    }

    /// Turn order snapshot for this round: living units, speed descending.
    ///
    /// The sort is stable, so equal speeds keep roster order and the result
    /// is identical on every recomputation without stat changes.
    pub fn calculate_turn_order(&self) -> Vec<UnitId> {
        let mut living: Vec<(UnitId, i32)> = self
            .roster
            .living()
            .map(|u| (u.id, u.stats.speed))
            .collect();
        living.sort_by_key(|(_, speed)| std::cmp::Reverse(*speed));
        living.into_iter().map(|(id, _)| id).collect()
    }

    fn process_unit_turns(&mut self) -> Result<()> {
        let order = std::mem::take(&mut self.turn_order);

        for unit_id in order {
            // Died since the snapshot was taken
            if !self.roster.is_alive(unit_id) {
                continue;
            }

            self.bus
                .publish(BattleEvent::UnitTurnStarted { unit_id });

            self.apply_turn_start_effects(unit_id)?;

            if self.roster.is_alive(unit_id) {
                if let Some(effect_id) = self.ledger.disabling_effect(unit_id, &self.effects) {
                    self.pacing_delay(self.config.disable_skip_delay_ms);
                    tracing::debug!(?unit_id, effect = %effect_id, "unit turn skipped");
                    self.bus.publish(BattleEvent::UnitTurnSkipped {
                        unit_id,
                        effect_id,
                    });
                } else {
                    match self.run_ai(unit_id) {
                        Ok(()) => {}
                        // Channel faults break the consistency guarantee
                        Err(e @ TacticsError::ChannelClosed(_)) => return Err(e),
                        Err(e) => {
                            tracing::warn!(?unit_id, error = %e, "AI turn degraded to no-op");
                        }
                    }
                }
            }

            self.bus.publish(BattleEvent::UnitTurnEnded { unit_id });
            self.expire_turn_end_effects(unit_id);
            self.drain_reactions()?;
        }

        self.phase = TurnPhase::EndTurn;
        Ok(())
    }

    fn end_turn(&mut self) {
        // Dead units leave the roster only between rounds, never while a
        // round's snapshot is live
        for unit_id in self.roster.prune_dead() {
            self.trees.remove(&unit_id);
        }
        self.phase = TurnPhase::StartTurn;
    }

    fn finish(&mut self, outcome: BattleOutcome) {
        self.outcome = Some(outcome);
        self.phase = TurnPhase::BattleEnd;
        self.bus.publish(BattleEvent::BattleEnded {
            outcome,
            turn: self.turn,
        });
    }

    fn check_battle_end(&self) -> Option<BattleOutcome> {
        use crate::core::types::Allegiance;
        let allies = self.roster.living_count(Allegiance::Ally);
        let enemies = self.roster.living_count(Allegiance::Enemy);
        if allies == 0 {
            Some(BattleOutcome::Defeat)
        } else if enemies == 0 {
            Some(BattleOutcome::Victory)
        } else {
            None
        }
    }

    fn pacing_delay(&self, ms: u64) {
        // Sequencing only; zero (the headless default) skips the wait
        if ms > 0 {
            std::thread::sleep(std::time::Duration::from_millis(ms));
        }
    }

    // === STATUS EFFECTS ===

    /// Per-turn fixed damage from active effects, via the damage channel
    /// with a pseudo-attacker and the fixed-damage flag.
    fn apply_turn_start_effects(&mut self, unit_id: UnitId) -> Result<()> {
        for (effect_id, amount) in self.ledger.per_turn_damage(unit_id, &self.effects) {
            if !self.roster.is_alive(unit_id) {
                break;
            }
            let Some(target) = self.roster.get(unit_id).cloned() else {
                break;
            };
            tracing::debug!(?unit_id, effect = %effect_id, amount, "status effect tick");

            let request = DamageRequest {
                target_unit_id: unit_id,
                // Status effect source: a stat-less pseudo-attacker
                attacker_stats: UnitStats::default(),
                target_stats: target.stats,
                current_target_hp: target.current_hp,
                current_target_barrier: target.current_barrier,
                max_barrier: target.max_barrier,
                fixed_damage: true,
                pre_calculated_damage_roll: amount as f32,
                damage_reduction: 0.0,
            };
            let result = self.channel.resolve(request)?;
            self.apply_damage_result(&result);
        }
        Ok(())
    }

    fn expire_turn_end_effects(&mut self, unit_id: UnitId) {
        for effect_id in self.ledger.tick_turn_end(unit_id) {
            self.bus.publish(BattleEvent::StatusEffectRemoved {
                unit_id,
                effect_id,
            });
        }
    }

    fn apply_effect(&mut self, unit_id: UnitId, effect_id: &str) {
        let Some(def) = self.effects.get(effect_id).cloned() else {
            // Data error: degrade to no-op
            tracing::warn!(?unit_id, effect = %effect_id, "unknown status effect, skipping");
            return;
        };
        if !self.roster.is_alive(unit_id) {
            return;
        }
        let stacks = self.ledger.apply(unit_id, &def);
        self.bus.publish(BattleEvent::StatusEffectApplied {
            unit_id,
            effect_id: def.id,
            stacks,
        });
    }

    // === DAMAGE ===

    /// Apply a resolved damage result to the authoritative roster.
    ///
    /// The only place unit health changes; always runs on the turn thread.
    fn apply_damage_result(&mut self, result: &DamageResult) {
        let Some(unit) = self.roster.get_mut(result.target_unit_id) else {
            return;
        };
        unit.current_hp = result.new_hp;
        unit.current_barrier = result.new_barrier;

        self.bus.publish(BattleEvent::DamageCalculated {
            target_id: result.target_unit_id,
            hp_damage_dealt: result.hp_damage_dealt,
            barrier_damage_dealt: result.barrier_damage_dealt,
            new_hp: result.new_hp,
            new_barrier: result.new_barrier,
        });

        if result.new_hp == 0 {
            self.handle_death(result.target_unit_id);
        }
    }

    /// Death is event-driven: the ledger clears immediately, the behavior
    /// tree is discarded, and the corpse leaves the roster at round end.
    fn handle_death(&mut self, unit_id: UnitId) {
        self.bus.publish(BattleEvent::UnitDied { unit_id });
        for effect_id in self.ledger.clear_unit(unit_id) {
            self.bus.publish(BattleEvent::StatusEffectRemoved {
                unit_id,
                effect_id,
            });
        }
        self.trees.remove(&unit_id);
    }

    /// Execute one attack: notification, roll, modifier pipeline, channel
    /// round-trip, result application, reaction enqueue.
    fn perform_attack(
        &mut self,
        attacker_id: UnitId,
        target_id: UnitId,
        skill: Option<&SkillDefinition>,
        depth: u8,
    ) -> Result<DamageResult> {
        let attacker = self
            .roster
            .get(attacker_id)
            .cloned()
            .ok_or(TacticsError::UnitNotFound(attacker_id))?;
        let target = self
            .roster
            .get(target_id)
            .cloned()
            .ok_or(TacticsError::UnitNotFound(target_id))?;

        self.bus.publish(BattleEvent::AttackAttempted {
            attacker_id,
            target_id,
            skill_id: skill.map(|s| s.id.clone()),
        });
        if depth < MAX_REACTION_DEPTH {
            self.reactions.enqueue(ReactionTrigger::AttackAttempted {
                attacker_id,
                target_id,
                depth,
            });
        }

        let formula = skill
            .and_then(|s| s.formula)
            .unwrap_or(BASIC_ATTACK_FORMULA);
        let roll = self.dice.roll(&formula);
        let multiplier = modifiers::attack_multiplier(&attacker, &self.ledger, &self.effects);
        let raw = (roll + attacker.stats.attack).max(0) as f32 * multiplier.result;

        let reduction =
            modifiers::damage_reduction(&target, &self.ledger, &self.skills, &self.effects);

        self.pacing_delay(self.config.action_beat_delay_ms);

        let request = DamageRequest {
            target_unit_id: target_id,
            attacker_stats: attacker.stats,
            target_stats: target.stats,
            current_target_hp: target.current_hp,
            current_target_barrier: target.current_barrier,
            max_barrier: target.max_barrier,
            fixed_damage: false,
            pre_calculated_damage_roll: raw,
            damage_reduction: reduction.result,
        };
        let result = self.channel.resolve(request)?;
        self.apply_damage_result(&result);

        let landed = result.hp_damage_dealt + result.barrier_damage_dealt > 0;
        if landed && depth < MAX_REACTION_DEPTH && self.roster.is_alive(target_id) {
            self.reactions.enqueue(ReactionTrigger::DamageLanded {
                attacker_id,
                defender_id: target_id,
                depth,
            });
        }

        Ok(result)
    }

    // === REACTIONS ===

    fn drain_reactions(&mut self) -> Result<()> {
        while let Some(trigger) = self.reactions.pop() {
            match trigger {
                ReactionTrigger::DamageLanded {
                    attacker_id,
                    defender_id,
                    depth,
                } => self.try_retaliate(defender_id, attacker_id, depth)?,
                ReactionTrigger::AttackAttempted {
                    attacker_id,
                    target_id,
                    depth: _,
                } => self.try_on_hit_debuff(attacker_id, target_id),
            }
        }
        Ok(())
    }

    fn try_retaliate(&mut self, defender_id: UnitId, attacker_id: UnitId, depth: u8) -> Result<()> {
        if !self.roster.is_alive(defender_id) || !self.roster.is_alive(attacker_id) {
            return Ok(());
        }
        let Some(defender) = self.roster.get(defender_id).cloned() else {
            return Ok(());
        };
        let Some((slot, skill)) =
            find_reaction_skill(&defender, &self.skills, SkillBehavior::Retaliate)
        else {
            return Ok(());
        };
        let skill = skill.clone();
        let chance = skill.effective_probability(self.config.slot_probability(slot));
        if self.dice.check(chance) {
            tracing::debug!(?defender_id, skill = %skill.id, "retaliation triggered");
            self.bus.publish(BattleEvent::SkillExecuted {
                unit_id: defender_id,
                skill_id: skill.id.clone(),
            });
            self.perform_attack(defender_id, attacker_id, Some(&skill), depth + 1)?;
        }
        Ok(())
    }

    fn try_on_hit_debuff(&mut self, attacker_id: UnitId, target_id: UnitId) {
        if !self.roster.is_alive(attacker_id) || !self.roster.is_alive(target_id) {
            return;
        }
        let Some(attacker) = self.roster.get(attacker_id).cloned() else {
            return;
        };
        let Some((slot, skill)) =
            find_reaction_skill(&attacker, &self.skills, SkillBehavior::OnHitAfflict)
        else {
            return;
        };
        let skill = skill.clone();
        let Some(effect_id) = skill.effect_id.clone() else {
            tracing::warn!(skill = %skill.id, "on-hit skill has no effect, skipping");
            return;
        };
        let chance = skill.effective_probability(self.config.slot_probability(slot));
        if self.dice.check(chance) {
            tracing::debug!(?attacker_id, skill = %skill.id, "on-hit debuff triggered");
            self.bus.publish(BattleEvent::SkillExecuted {
                unit_id: attacker_id,
                skill_id: skill.id,
            });
            self.apply_effect(target_id, &effect_id);
        }
    }

    // === AI ===

    fn run_ai(&mut self, unit_id: UnitId) -> Result<()> {
        let tree = self
            .trees
            .entry(unit_id)
            .or_insert_with(ai::default_tree)
            .clone();
        let mut bb = Blackboard::default();

        match ai::evaluate(&tree, self, unit_id, &mut bb)? {
            NodeStatus::Success => Ok(()),
            // No action resolved: a valid no-op turn
            status => {
                tracing::debug!(?unit_id, ?status, "no action this turn");
                Ok(())
            }
        }
    }

    fn execute_skill(
        &mut self,
        actor_id: UnitId,
        skill: &SkillDefinition,
        target_id: Option<UnitId>,
    ) -> Result<()> {
        self.bus.publish(BattleEvent::SkillExecuted {
            unit_id: actor_id,
            skill_id: skill.id.clone(),
        });

        match skill.behavior {
            Some(SkillBehavior::Strike) => {
                if let Some(target_id) = target_id {
                    self.perform_attack(actor_id, target_id, Some(skill), 0)?;
                }
            }
            Some(SkillBehavior::StrikeAndAfflict) => {
                if let Some(target_id) = target_id {
                    self.perform_attack(actor_id, target_id, Some(skill), 0)?;
                    if let Some(effect_id) = &skill.effect_id {
                        self.apply_effect(target_id, effect_id);
                    }
                }
            }
            Some(SkillBehavior::AfflictTarget) => {
                if let (Some(target_id), Some(effect_id)) = (target_id, &skill.effect_id) {
                    self.apply_effect(target_id, effect_id);
                }
            }
            Some(SkillBehavior::BuffSelf) => {
                if let Some(effect_id) = &skill.effect_id {
                    self.apply_effect(actor_id, effect_id);
                }
            }
            // Reaction behaviors only fire through the watcher path
            Some(SkillBehavior::Retaliate) | Some(SkillBehavior::OnHitAfflict) | None => {
                tracing::warn!(skill = %skill.id, "skill has no usable behavior, no-op");
            }
        }
        Ok(())
    }
}

impl NodeHost for TurnEngine {
    fn action(
        &mut self,
        actor: UnitId,
        leaf: ActionLeaf,
        bb: &mut Blackboard,
    ) -> Result<NodeStatus> {
        let Some(unit) = self.roster.get(actor).cloned() else {
            return Ok(NodeStatus::Failure);
        };

        match leaf {
            ActionLeaf::DecideSkill => {
                // Buff pass: at most one buff per turn, applied immediately.
                // A buff alone does not consume the turn, so selection
                // continues into the active pass either way.
                let buff = select_buff(&unit, &self.config, &self.skills, self.dice.as_mut());
                if let Some(choice) = &buff {
                    if let Some(skill) = self.skills.get(&choice.skill_id).cloned() {
                        self.execute_skill(actor, &skill, None)?;
                    }
                }

                let choice = select_active(
                    &unit,
                    &self.config,
                    &self.skills,
                    self.dice.as_mut(),
                    buff.map(|b| b.slot),
                );
                let Some(choice) = choice else {
                    return Ok(NodeStatus::Failure);
                };

                let Some(opposing) = unit.allegiance.opposing() else {
                    return Ok(NodeStatus::Failure);
                };
                let target = find_best_target(
                    &self.roster,
                    opposing,
                    TargetCriterion::LowestHp,
                    &unit,
                );
                let Some(target) = target else {
                    return Ok(NodeStatus::Failure);
                };

                self.rule_check.record_decision(actor, target);
                bb.skill_to_use = Some(choice);
                bb.skill_target = Some(target);
                Ok(NodeStatus::Success)
            }

            ActionLeaf::UseSkill => {
                let Some(choice) = bb.skill_to_use.take() else {
                    return Ok(NodeStatus::Failure);
                };
                // Decided target may have died during an earlier resolution
                if !self.rule_check.verify_before_execution(&self.roster) {
                    return Ok(NodeStatus::Success);
                }
                let Some(skill) = self.skills.get(&choice.skill_id).cloned() else {
                    tracing::warn!(skill = %choice.skill_id, "skill vanished from catalog, no-op");
                    return Ok(NodeStatus::Success);
                };
                if skill.behavior.is_none() {
                    // Malformed definition degrades to a no-op turn
                    tracing::warn!(skill = %skill.id, "skill has no behavior, no-op");
                    return Ok(NodeStatus::Success);
                }
                self.execute_skill(actor, &skill, bb.skill_target)?;
                Ok(NodeStatus::Success)
            }

            ActionLeaf::FindTarget => {
                let Some(opposing) = unit.allegiance.opposing() else {
                    return Ok(NodeStatus::Failure);
                };
                match find_best_target(&self.roster, opposing, TargetCriterion::Closest, &unit) {
                    Some(target) => {
                        bb.target = Some(target);
                        Ok(NodeStatus::Success)
                    }
                    None => Ok(NodeStatus::Failure),
                }
            }

            ActionLeaf::MoveToTarget => {
                let Some(target_id) = bb.target else {
                    return Ok(NodeStatus::Failure);
                };
                let Some(target) = self.roster.get(target_id).cloned() else {
                    return Ok(NodeStatus::Failure);
                };

                let mut candidates = attackable_positions(
                    self.bounds,
                    &self.roster,
                    target.position,
                    unit.stats.attack_range,
                );
                candidates.sort_by_key(|pos| unit.position.distance(pos));

                for goal in candidates {
                    let Some(path) = find_path(self.bounds, &self.roster, unit.position, goal)
                    else {
                        continue;
                    };
                    let steps = (unit.stats.move_range as usize).min(path.len() - 1);
                    let new_pos = path[steps];
                    if let Some(mover) = self.roster.get_mut(actor) {
                        tracing::debug!(?actor, from = ?unit.position, to = ?new_pos, "unit moved");
                        mover.position = new_pos;
                    }
                    self.pacing_delay(self.config.action_beat_delay_ms);
                    return Ok(NodeStatus::Success);
                }
                Ok(NodeStatus::Failure)
            }

            ActionLeaf::AttackTarget => {
                let Some(target_id) = bb.target else {
                    return Ok(NodeStatus::Failure);
                };
                let Some(target) = self.roster.get(target_id).cloned() else {
                    return Ok(NodeStatus::Failure);
                };
                if !target.is_alive() || !unit.in_attack_range(&target.position) {
                    return Ok(NodeStatus::Failure);
                }
                // Re-read own position: MoveToTarget may have run this cycle
                let Some(attacker) = self.roster.get(actor).cloned() else {
                    return Ok(NodeStatus::Failure);
                };
                if !attacker.in_attack_range(&target.position) {
                    return Ok(NodeStatus::Failure);
                }
                self.perform_attack(actor, target_id, None, 0)?;
                Ok(NodeStatus::Success)
            }
        }
    }

    fn condition(
        &mut self,
        actor: UnitId,
        leaf: ConditionLeaf,
        bb: &mut Blackboard,
    ) -> Result<NodeStatus> {
        match leaf {
            ConditionLeaf::IsInRange => {
                let (Some(unit), Some(target_id)) = (self.roster.get(actor), bb.target) else {
                    return Ok(NodeStatus::Failure);
                };
                let Some(target) = self.roster.get(target_id) else {
                    return Ok(NodeStatus::Failure);
                };
                if unit.in_attack_range(&target.position) {
                    Ok(NodeStatus::Success)
                } else {
                    Ok(NodeStatus::Failure)
                }
            }
        }
    }
}
