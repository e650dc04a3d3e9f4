//! On-disk framing for stored configurations.
//!
//! Every payload written by this crate carries its version so the engine can
//! tell which shape it is looking at without deserializing it.
//!
//! # Wire Format
//!
//! ```text
//! +--------+--------+------------------------------------------+
//! | Magic1 | Magic2 | bincode(Envelope { version, json body }) |
//! | 'C'    | 'V'    |                                          |
//! +--------+--------+------------------------------------------+
//! ```
//!
//! Data without the magic prefix is treated as legacy unversioned JSON and
//! decodes at [`Version::ZERO`]. A JSON document can never start with `C`, so
//! the two forms cannot be confused.
//!
//! # Example
//!
//! ```
//! use config_migrate::codec::{decode, encode, is_versioned};
//! use config_migrate::payload::{Payload, StoredConfiguration};
//! use config_migrate::version::Version;
//!
//! let stored = StoredConfiguration::new(Version::new(2, 1), Payload::parse(r#"{"theme":"dark"}"#).unwrap());
//! let bytes = encode(&stored).unwrap();
//! assert!(is_versioned(&bytes));
//! assert_eq!(decode(&bytes).unwrap(), stored);
//!
//! let legacy = decode(br#"{"theme":"light"}"#).unwrap();
//! assert!(legacy.version.is_zero());
//! ```

use crate::errors::ConfigMigrateResult;
use crate::payload::{Payload, StoredConfiguration};
use crate::version::Version;

/// Magic bytes for the versioned format: "CV" (Configuration Versioned).
pub const MAGIC: [u8; 2] = [b'C', b'V'];

#[derive(bincode::Encode, bincode::Decode)]
struct Envelope {
    version: Version,
    body: String,
}

/// Check if bytes start with the versioned frame magic.
pub fn is_versioned(data: &[u8]) -> bool {
    data.len() > MAGIC.len() && data[..MAGIC.len()] == MAGIC
}

/// Frame a stored configuration in the current wire format.
pub fn encode(stored: &StoredConfiguration) -> ConfigMigrateResult<Vec<u8>> {
    let envelope = Envelope {
        version: stored.version,
        body: stored.payload.to_json(),
    };

    let mut output = MAGIC.to_vec();
    output.extend(bincode::encode_to_vec(&envelope, bincode::config::standard())?);
    Ok(output)
}

/// Decode either a framed configuration or a legacy unversioned JSON document.
pub fn decode(data: &[u8]) -> ConfigMigrateResult<StoredConfiguration> {
    if !is_versioned(data) {
        return Ok(StoredConfiguration::new(
            Version::ZERO,
            Payload::from_slice(data)?,
        ));
    }

    let (envelope, _): (Envelope, usize) =
        bincode::decode_from_slice(&data[MAGIC.len()..], bincode::config::standard())?;
    Ok(StoredConfiguration::new(
        envelope.version,
        Payload::parse(&envelope.body)?,
    ))
}
