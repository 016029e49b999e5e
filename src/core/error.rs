use thiserror::Error;

#[derive(Error, Debug)]
pub enum TacticsError {
    #[error("Unit not found: {0:?}")]
    UnitNotFound(crate::core::types::UnitId),

    #[error("Skill not found: {0}")]
    SkillNotFound(String),

    #[error("Status effect not found: {0}")]
    EffectNotFound(String),

    #[error("Class not found: {0}")]
    ClassNotFound(String),

    #[error("Invalid action: {0}")]
    InvalidAction(String),

    #[error("Invalid dice formula: {0}")]
    InvalidDiceFormula(String),

    #[error("Damage channel closed: {0}")]
    ChannelClosed(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TacticsError>;
