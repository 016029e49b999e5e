//! Seeded dice source - the single randomness authority for a battle
//!
//! All combat randomness flows through one `DiceRoller` seeded at battle
//! start, so a fixed seed replays the same battle. Probability checks and
//! damage rolls share the generator.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::core::error::TacticsError;

/// Dice notation: `NdS+B` (e.g. "2d6+3", "1d8", "3d4-1")
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DiceFormula {
    pub count: u32,
    pub sides: u32,
    pub bonus: i32,
}

impl DiceFormula {
    pub fn new(count: u32, sides: u32, bonus: i32) -> Self {
        Self { count, sides, bonus }
    }

    /// Smallest possible roll
    pub fn min_roll(&self) -> i32 {
        self.count as i32 + self.bonus
    }

    /// Largest possible roll
    pub fn max_roll(&self) -> i32 {
        (self.count * self.sides) as i32 + self.bonus
    }
}

impl fmt::Display for DiceFormula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.bonus {
            0 => write!(f, "{}d{}", self.count, self.sides),
            b if b > 0 => write!(f, "{}d{}+{}", self.count, self.sides, b),
            b => write!(f, "{}d{}{}", self.count, self.sides, b),
        }
    }
}

impl FromStr for DiceFormula {
    type Err = TacticsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || TacticsError::InvalidDiceFormula(s.to_string());
        let s = s.trim();

        let (count_str, rest) = s.split_once(['d', 'D']).ok_or_else(invalid)?;
        let count: u32 = if count_str.is_empty() {
            1
        } else {
            count_str.parse().map_err(|_| invalid())?
        };

        let (sides_str, bonus) = if let Some((sides, bonus)) = rest.split_once('+') {
            (sides, bonus.parse::<i32>().map_err(|_| invalid())?)
        } else if let Some((sides, bonus)) = rest.split_once('-') {
            (sides, -bonus.parse::<i32>().map_err(|_| invalid())?)
        } else {
            (rest, 0)
        };
        let sides: u32 = sides_str.parse().map_err(|_| invalid())?;

        if count == 0 || sides == 0 {
            return Err(invalid());
        }
        Ok(Self { count, sides, bonus })
    }
}

impl TryFrom<String> for DiceFormula {
    type Error = TacticsError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<DiceFormula> for String {
    fn from(f: DiceFormula) -> String {
        f.to_string()
    }
}

/// Seam for everything that consumes randomness.
///
/// Skill selection and damage rolls take `&mut dyn RollSource` so tests can
/// substitute a fixed stream.
pub trait RollSource {
    /// Uniform draw in `[0, 1)`
    fn next_unit(&mut self) -> f32;

    /// Roll a dice formula
    fn roll(&mut self, formula: &DiceFormula) -> i32;

    /// Probability check: true with probability `chance`
    fn check(&mut self, chance: f32) -> bool {
        self.next_unit() < chance
    }
}

/// Production dice source backed by a seeded ChaCha8 generator
#[derive(Debug, Clone)]
pub struct DiceRoller {
    rng: ChaCha8Rng,
}

impl DiceRoller {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl RollSource for DiceRoller {
    fn next_unit(&mut self) -> f32 {
        self.rng.gen::<f32>()
    }

    fn roll(&mut self, formula: &DiceFormula) -> i32 {
        let mut total = formula.bonus;
        for _ in 0..formula.count {
            total += self.rng.gen_range(1..=formula.sides) as i32;
        }
        total
    }
}

/// Fixed-stream roll source for deterministic tests
#[derive(Debug, Clone)]
pub struct FixedRolls {
    /// Value returned by every `next_unit` call
    pub unit: f32,
    /// Value returned by every `roll` call
    pub roll: i32,
}

impl RollSource for FixedRolls {
    fn next_unit(&mut self) -> f32 {
        self.unit
    }

    fn roll(&mut self, _formula: &DiceFormula) -> i32 {
        self.roll
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_notation() {
        let f: DiceFormula = "2d6+3".parse().unwrap();
        assert_eq!(f, DiceFormula::new(2, 6, 3));
    }

    #[test]
    fn test_parse_without_bonus() {
        let f: DiceFormula = "1d8".parse().unwrap();
        assert_eq!(f, DiceFormula::new(1, 8, 0));
    }

    #[test]
    fn test_parse_negative_bonus() {
        let f: DiceFormula = "3d4-1".parse().unwrap();
        assert_eq!(f, DiceFormula::new(3, 4, -1));
    }

    #[test]
    fn test_parse_implicit_count() {
        let f: DiceFormula = "d20".parse().unwrap();
        assert_eq!(f, DiceFormula::new(1, 20, 0));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("".parse::<DiceFormula>().is_err());
        assert!("2x6".parse::<DiceFormula>().is_err());
        assert!("0d6".parse::<DiceFormula>().is_err());
        assert!("2d0".parse::<DiceFormula>().is_err());
        assert!("2d6+x".parse::<DiceFormula>().is_err());
    }

    #[test]
    fn test_display_round_trip() {
        for s in ["2d6+3", "1d8", "3d4-1"] {
            let f: DiceFormula = s.parse().unwrap();
            assert_eq!(f.to_string(), s);
        }
    }

    #[test]
    fn test_roll_within_bounds() {
        let mut roller = DiceRoller::from_seed(42);
        let f = DiceFormula::new(2, 6, 3);
        for _ in 0..200 {
            let r = roller.roll(&f);
            assert!(r >= f.min_roll() && r <= f.max_roll());
        }
    }

    #[test]
    fn test_same_seed_same_sequence() {
        let mut a = DiceRoller::from_seed(7);
        let mut b = DiceRoller::from_seed(7);
        let f = DiceFormula::new(3, 10, 0);
        for _ in 0..50 {
            assert_eq!(a.roll(&f), b.roll(&f));
            assert_eq!(a.next_unit(), b.next_unit());
        }
    }

    #[test]
    fn test_fixed_rolls_check() {
        let mut fixed = FixedRolls { unit: 0.35, roll: 5 };
        assert!(fixed.check(0.4));
        assert!(!fixed.check(0.3));
        assert!(!fixed.check(0.35));
    }
}
