//! Two-part configuration versions.
//!
//! A [`Version`] is the `major.minor` number a configuration type declares and
//! that storage records alongside every persisted payload. Ordering is
//! lexicographic over `(major, minor)`, which the derived `Ord` provides
//! because of the field order.
//!
//! # Example
//!
//! ```
//! use config_migrate::version::Version;
//!
//! let stored: Version = "1.4".parse().unwrap();
//! assert!(stored < Version::new(2, 0));
//! assert_eq!(stored.to_string(), "1.4");
//! assert_eq!("3".parse::<Version>().unwrap(), Version::new(3, 0));
//! assert!(Version::ZERO.is_zero());
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::ConfigMigrateError;

/// Immutable `major.minor` version of a configuration shape.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Default,
    bincode::Encode,
    bincode::Decode,
)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
}

impl Version {
    /// Sentinel for "nothing has ever been persisted".
    pub const ZERO: Version = Version::new(0, 0);

    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl FromStr for Version {
    type Err = ConfigMigrateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let invalid = || ConfigMigrateError::InvalidVersion(s.to_string());

        let (major, minor) = match trimmed.split_once('.') {
            Some((major, minor)) => (major, minor),
            None => (trimmed, "0"),
        };

        let major = major.parse::<u32>().map_err(|_| invalid())?;
        let minor = minor.parse::<u32>().map_err(|_| invalid())?;
        Ok(Version::new(major, minor))
    }
}

impl From<(u32, u32)> for Version {
    fn from((major, minor): (u32, u32)) -> Self {
        Version::new(major, minor)
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
