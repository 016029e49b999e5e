//! Battle configuration with documented constants
//!
//! All tuning values are collected here with explanations of their purpose.
//! Values can be overridden from a TOML file; the defaults match the
//! documented game balance.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::core::error::{Result, TacticsError};

/// Configuration for one battle
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BattleConfig {
    // === SKILL SELECTION ===
    /// Base activation probability per skill slot, in slot order.
    ///
    /// Slot 0 fires 40% of the time, slot 1 30%, slot 2 20%. Slots beyond
    /// the table fall back to `extra_slot_probability`.
    pub slot_probabilities: Vec<f32>,

    /// Activation probability for slots past the end of the table.
    pub extra_slot_probability: f32,

    // === PACING ===
    /// Delay before skipping a unit disabled by a status effect (ms).
    ///
    /// Purely presentational pacing so observers can register the skip;
    /// zero disables the wait entirely (the default for headless runs).
    pub disable_skip_delay_ms: u64,

    /// Delay between a unit's action beats (ms). Zero disables.
    pub action_beat_delay_ms: u64,

    // === SAFETY LIMITS ===
    /// Hard cap on turns before the battle is called a draw.
    ///
    /// Two units that cannot reach or damage each other would otherwise
    /// loop forever.
    pub max_turns: u32,
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self {
            slot_probabilities: vec![0.4, 0.3, 0.2],
            extra_slot_probability: 0.1,
            disable_skip_delay_ms: 0,
            action_beat_delay_ms: 0,
            max_turns: 200,
        }
    }
}

impl BattleConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Base probability for a given slot index
    pub fn slot_probability(&self, slot: usize) -> f32 {
        self.slot_probabilities
            .get(slot)
            .copied()
            .unwrap_or(self.extra_slot_probability)
    }

    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: BattleConfig = toml::from_str(&content)
            .map_err(|e| TacticsError::ConfigError(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        for (i, p) in self.slot_probabilities.iter().enumerate() {
            if !(0.0..=1.0).contains(p) {
                return Err(TacticsError::ConfigError(format!(
                    "slot_probabilities[{}] = {} is not in [0, 1]",
                    i, p
                )));
            }
        }
        if !(0.0..=1.0).contains(&self.extra_slot_probability) {
            return Err(TacticsError::ConfigError(format!(
                "extra_slot_probability = {} is not in [0, 1]",
                self.extra_slot_probability
            )));
        }
        if self.max_turns == 0 {
            return Err(TacticsError::ConfigError(
                "max_turns must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
