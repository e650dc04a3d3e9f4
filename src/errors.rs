use thiserror::Error;

use crate::discovery::TypeKey;
use crate::version::Version;

pub type ConfigMigrateResult<T> = Result<T, ConfigMigrateError>;

#[derive(Error, Debug)]
pub enum ConfigMigrateError {
    #[error("Invalid Rule: {origin} declares identical versions {from} -> {to}")]
    InvalidRule {
        origin: String,
        from: Version,
        to: Version,
    },

    #[error("Ambiguous Rule: {from} -> {to} declared by both {first} and {second}")]
    AmbiguousRule {
        from: Version,
        to: Version,
        first: String,
        second: String,
    },

    #[error("Unknown Configuration Type: {0}")]
    UnknownType(TypeKey),

    #[error("No Migration Path: {current} -> {target}")]
    NoPath { current: Version, target: Version },

    #[error("Downgrade Not Supported: stored {current} is newer than {target}")]
    Downgrade { current: Version, target: Version },

    #[error("Invalid Version: {0}")]
    InvalidVersion(String),

    #[error("Invalid Location: {0}")]
    InvalidLocation(String),

    #[error("Serialization Error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Encoding Error: {0}")]
    Encoding(#[from] bincode::error::EncodeError),

    #[error("Decoding Error: {0}")]
    Decoding(#[from] bincode::error::DecodeError),

    #[cfg(feature = "sled")]
    #[error("Sled Error: {0}")]
    Sled(#[from] sled::Error),

    #[error("Storage Error: {0}")]
    Storage(String),
}
