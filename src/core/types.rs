//! Core type definitions used throughout the combat core

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for combat units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnitId(pub Uuid);

impl UnitId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for UnitId {
    fn default() -> Self {
        Self::new()
    }
}

/// Turn counter (one turn = one full round of unit activations)
pub type Turn = u32;

/// Which side a unit fights for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Allegiance {
    Ally,
    Enemy,
    Neutral,
}

impl Allegiance {
    /// The side this allegiance targets in combat.
    ///
    /// Neutral units oppose no one and are never auto-targeted.
    pub fn opposing(&self) -> Option<Allegiance> {
        match self {
            Allegiance::Ally => Some(Allegiance::Enemy),
            Allegiance::Enemy => Some(Allegiance::Ally),
            Allegiance::Neutral => None,
        }
    }
}

/// Integer grid coordinate
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridPos {
    pub x: i32,
    pub y: i32,
}

impl GridPos {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Manhattan distance (four-directional movement metric)
    pub fn distance(&self, other: &Self) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// The four orthogonal neighbors
    pub fn neighbors(&self) -> [GridPos; 4] {
        [
            GridPos::new(self.x + 1, self.y),
            GridPos::new(self.x - 1, self.y),
            GridPos::new(self.x, self.y + 1),
            GridPos::new(self.x, self.y - 1),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_id_equality() {
        let a = UnitId::new();
        let b = a;
        assert_eq!(a, b);
        assert_ne!(a, UnitId::new());
    }

    #[test]
    fn test_manhattan_distance() {
        let a = GridPos::new(0, 0);
        let b = GridPos::new(3, -4);
        assert_eq!(a.distance(&b), 7);
        assert_eq!(b.distance(&a), 7);
        assert_eq!(a.distance(&a), 0);
    }

    #[test]
    fn test_neighbors_are_adjacent() {
        let p = GridPos::new(5, 5);
        for n in p.neighbors() {
            assert_eq!(p.distance(&n), 1);
        }
    }

    #[test]
    fn test_opposing_allegiance() {
        assert_eq!(Allegiance::Ally.opposing(), Some(Allegiance::Enemy));
        assert_eq!(Allegiance::Enemy.opposing(), Some(Allegiance::Ally));
        assert_eq!(Allegiance::Neutral.opposing(), None);
    }
}
