//! Serialized configuration payloads.

use derive_more::{Deref, From, Into};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::ConfigMigrateResult;
use crate::version::Version;

/// A configuration document as it travels between storage and transforms.
///
/// Payloads are plain JSON; typed configuration structs go in and out through
/// [`Payload::from_value`] and [`Payload::to_value`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, From, Into, Deref)]
#[serde(transparent)]
pub struct Payload(Value);

impl Payload {
    /// Serialize a typed configuration into a payload.
    pub fn from_value<T: Serialize>(value: &T) -> ConfigMigrateResult<Self> {
        Ok(Self(serde_json::to_value(value)?))
    }

    /// Deserialize the payload into a typed configuration.
    pub fn to_value<T: DeserializeOwned>(&self) -> ConfigMigrateResult<T> {
        Ok(T::deserialize(&self.0)?)
    }

    /// Parse raw JSON text.
    pub fn parse(text: &str) -> ConfigMigrateResult<Self> {
        Ok(Self(serde_json::from_str(text)?))
    }

    pub fn from_slice(bytes: &[u8]) -> ConfigMigrateResult<Self> {
        Ok(Self(serde_json::from_slice(bytes)?))
    }

    /// Compact JSON text of the payload.
    pub fn to_json(&self) -> String {
        self.0.to_string()
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_inner(self) -> Value {
        self.0
    }
}

/// A payload together with the version it was written at.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredConfiguration {
    pub version: Version,
    pub payload: Payload,
}

impl StoredConfiguration {
    pub fn new(version: Version, payload: Payload) -> Self {
        Self { version, payload }
    }
}
