//! A* pathfinding on the battle grid
//!
//! Four-directional movement, Manhattan heuristic. Tiles occupied by living
//! units are blocked, except the goal tile itself (so a path can be planned
//! up to an occupied destination and trimmed by the caller).

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use crate::battle::roster::Roster;
use crate::core::types::GridPos;

/// Rectangular battlefield bounds, tiles `(0..width, 0..height)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridBounds {
    pub width: i32,
    pub height: i32,
}

impl GridBounds {
    pub fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    pub fn contains(&self, pos: GridPos) -> bool {
        pos.x >= 0 && pos.x < self.width && pos.y >= 0 && pos.y < self.height
    }
}

/// Node in the A* open set
#[derive(Debug, Clone)]
struct PathNode {
    pos: GridPos,
    f_cost: u32, // g_cost + heuristic
}

impl PartialEq for PathNode {
    fn eq(&self, other: &Self) -> bool {
        self.pos == other.pos
    }
}

impl Eq for PathNode {}

impl Ord for PathNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse order for min-heap
        other.f_cost.cmp(&self.f_cost)
    }
}

impl PartialOrd for PathNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Find a path using A*.
///
/// Returns None if no path exists. The returned path includes both
/// endpoints.
pub fn find_path(
    bounds: GridBounds,
    roster: &Roster,
    start: GridPos,
    goal: GridPos,
) -> Option<Vec<GridPos>> {
    if start == goal {
        return Some(vec![start]);
    }

    let mut open_set = BinaryHeap::new();
    let mut came_from: HashMap<GridPos, GridPos> = HashMap::new();
    let mut g_scores: HashMap<GridPos, u32> = HashMap::new();

    g_scores.insert(start, 0);
    open_set.push(PathNode {
        pos: start,
        f_cost: start.distance(&goal),
    });

    while let Some(current) = open_set.pop() {
        if current.pos == goal {
            return Some(reconstruct_path(&came_from, current.pos));
        }

        let current_g = *g_scores.get(&current.pos).unwrap_or(&u32::MAX);

        for neighbor in current.pos.neighbors() {
            if !bounds.contains(neighbor) {
                continue;
            }
            // Occupied tiles block movement, except the goal itself
            if neighbor != goal && roster.is_occupied(neighbor) {
                continue;
            }

            let tentative_g = current_g + 1;
            let neighbor_g = *g_scores.get(&neighbor).unwrap_or(&u32::MAX);

            if tentative_g < neighbor_g {
                came_from.insert(neighbor, current.pos);
                g_scores.insert(neighbor, tentative_g);
                open_set.push(PathNode {
                    pos: neighbor,
                    f_cost: tentative_g + neighbor.distance(&goal),
                });
            }
        }
    }

    None // No path found
}

/// Reconstruct path from came_from map
fn reconstruct_path(came_from: &HashMap<GridPos, GridPos>, mut current: GridPos) -> Vec<GridPos> {
    let mut path = vec![current];
    while let Some(&prev) = came_from.get(&current) {
        path.push(prev);
        current = prev;
    }
    path.reverse();
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::unit::{Unit, UnitStats};
    use crate::core::types::Allegiance;

    fn blocker(pos: GridPos) -> Unit {
        Unit::new("wall", Allegiance::Neutral, UnitStats::default()).at(pos)
    }

    #[test]
    fn test_pathfind_straight_line() {
        let roster = Roster::new();
        let bounds = GridBounds::new(10, 10);
        let path = find_path(bounds, &roster, GridPos::new(0, 0), GridPos::new(5, 0)).unwrap();

        assert_eq!(path.first(), Some(&GridPos::new(0, 0)));
        assert_eq!(path.last(), Some(&GridPos::new(5, 0)));
        assert_eq!(path.len(), 6);
    }

    #[test]
    fn test_pathfind_around_occupied_tiles() {
        let mut roster = Roster::new();
        roster.add(blocker(GridPos::new(2, 0)));
        roster.add(blocker(GridPos::new(2, 1)));

        let bounds = GridBounds::new(10, 10);
        let path = find_path(bounds, &roster, GridPos::new(0, 0), GridPos::new(5, 0)).unwrap();

        assert!(!path.contains(&GridPos::new(2, 0)));
        assert!(!path.contains(&GridPos::new(2, 1)));
        assert_eq!(path.last(), Some(&GridPos::new(5, 0)));
    }

    #[test]
    fn test_goal_tile_not_blocked_by_occupant() {
        let mut roster = Roster::new();
        let goal = GridPos::new(3, 3);
        roster.add(blocker(goal));

        let bounds = GridBounds::new(10, 10);
        let path = find_path(bounds, &roster, GridPos::new(0, 3), goal);
        assert!(path.is_some());
        assert_eq!(path.unwrap().last(), Some(&goal));
    }

    #[test]
    fn test_pathfind_no_path() {
        let mut roster = Roster::new();
        // Wall off the right half of a narrow map
        for y in 0..5 {
            roster.add(blocker(GridPos::new(3, y)));
        }

        let bounds = GridBounds::new(7, 5);
        let path = find_path(bounds, &roster, GridPos::new(0, 2), GridPos::new(6, 2));
        assert!(path.is_none());
    }

    #[test]
    fn test_pathfind_same_start_goal() {
        let roster = Roster::new();
        let bounds = GridBounds::new(10, 10);
        let start = GridPos::new(4, 4);
        let path = find_path(bounds, &roster, start, start).unwrap();
        assert_eq!(path, vec![start]);
    }

    #[test]
    fn test_path_stays_in_bounds() {
        let roster = Roster::new();
        let bounds = GridBounds::new(6, 1);
        let path = find_path(bounds, &roster, GridPos::new(0, 0), GridPos::new(5, 0)).unwrap();
        for step in &path {
            assert!(bounds.contains(*step));
        }
    }
}
