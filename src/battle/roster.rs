//! Unit roster - the single owned collection of combatants
//!
//! Collaborators never receive a mutable handle to the whole roster; they go
//! through the narrow accessors here and mutations happen on the turn
//! engine's thread of control only.

use serde::{Deserialize, Serialize};

use crate::battle::unit::Unit;
use crate::core::types::{Allegiance, GridPos, UnitId};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Roster {
    units: Vec<Unit>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, unit: Unit) -> UnitId {
        let id = unit.id;
        self.units.push(unit);
        id
    }

    pub fn get(&self, id: UnitId) -> Option<&Unit> {
        self.units.iter().find(|u| u.id == id)
    }

    pub fn get_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        self.units.iter_mut().find(|u| u.id == id)
    }

    pub fn is_alive(&self, id: UnitId) -> bool {
        self.get(id).is_some_and(|u| u.is_alive())
    }

    /// Living units, roster order
    pub fn living(&self) -> impl Iterator<Item = &Unit> {
        self.units.iter().filter(|u| u.is_alive())
    }

    /// Living units of one side, roster order
    pub fn living_of(&self, allegiance: Allegiance) -> impl Iterator<Item = &Unit> {
        self.living().filter(move |u| u.allegiance == allegiance)
    }

    pub fn living_count(&self, allegiance: Allegiance) -> usize {
        self.living_of(allegiance).count()
    }

    /// Is any living unit standing on this tile?
    pub fn is_occupied(&self, pos: GridPos) -> bool {
        self.living().any(|u| u.position == pos)
    }

    /// Remove dead units; returns the ids pruned.
    ///
    /// Called only between rounds so a round's turn-order snapshot stays
    /// resolvable against the roster it was taken from.
    pub fn prune_dead(&mut self) -> Vec<UnitId> {
        let dead: Vec<UnitId> = self
            .units
            .iter()
            .filter(|u| !u.is_alive())
            .map(|u| u.id)
            .collect();
        self.units.retain(|u| u.is_alive());
        dead
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}
