//! Targeting service - best-target selection and attackable tiles

use crate::battle::pathfinding::GridBounds;
use crate::battle::roster::Roster;
use crate::battle::unit::Unit;
use crate::core::types::{Allegiance, GridPos, UnitId};

/// How to pick among valid targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetCriterion {
    /// Minimum current health, ties broken by roster order
    LowestHp,
    /// Minimum Manhattan distance from the actor, ties broken by roster order
    Closest,
}

/// Pick the best living target of the given allegiance.
///
/// Ties go to the earlier roster entry because the scan is in roster order
/// and only strictly better candidates replace the current pick.
pub fn find_best_target(
    roster: &Roster,
    allegiance: Allegiance,
    criterion: TargetCriterion,
    actor: &Unit,
) -> Option<UnitId> {
    let mut best: Option<(&Unit, i64)> = None;

    for candidate in roster.living_of(allegiance) {
        if candidate.id == actor.id {
            continue;
        }
        let score = match criterion {
            TargetCriterion::LowestHp => candidate.current_hp as i64,
            TargetCriterion::Closest => actor.position.distance(&candidate.position) as i64,
        };
        match best {
            Some((_, best_score)) if score >= best_score => {}
            _ => best = Some((candidate, score)),
        }
    }

    best.map(|(unit, _)| unit.id)
}

/// All unoccupied tiles within `range` of the target, excluding the
/// target's own tile.
pub fn attackable_positions(
    bounds: GridBounds,
    roster: &Roster,
    target_pos: GridPos,
    range: u32,
) -> Vec<GridPos> {
    let r = range as i32;
    let mut positions = Vec::new();
    for dx in -r..=r {
        for dy in -r..=r {
            if dx.unsigned_abs() + dy.unsigned_abs() > range {
                continue;
            }
            let pos = GridPos::new(target_pos.x + dx, target_pos.y + dy);
            if pos == target_pos || !bounds.contains(pos) || roster.is_occupied(pos) {
                continue;
            }
            positions.push(pos);
        }
    }
    positions
}
