//! Ember Tactics - turn-based squad combat core

pub mod battle;
pub mod core;
pub mod data;
pub mod dice;
