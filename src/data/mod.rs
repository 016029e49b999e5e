//! Static definition catalogs - skills, status effects, unit classes
//!
//! Catalogs are read-only after battle start. Each ships with built-in
//! defaults and can also be loaded from JSON.

pub mod classes;
pub mod effects;
pub mod skills;

pub use classes::{ClassCatalog, ClassDefinition};
pub use effects::{EffectCatalog, EffectDefinition, EffectDuration};
pub use skills::{PassiveReduction, SkillBehavior, SkillCatalog, SkillCategory, SkillDefinition};
