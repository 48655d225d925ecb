//! The persisted client config record and its byte codec.
//!
//! The record is stored as a JSON object with exactly three string fields:
//!
//! ```json
//! {"access_key": "AKIA...", "secret_key": "...", "endpoint": ""}
//! ```

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Storage key the record lives under.
pub const CONFIG_KEY: &str = "config/client";

/// One of the record's fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    AccessKey,
    SecretKey,
    Endpoint,
}

impl Field {
    /// Every field, in storage order.
    pub const ALL: [Field; 3] = [Field::AccessKey, Field::SecretKey, Field::Endpoint];

    /// Wire/storage name of the field.
    pub fn name(self) -> &'static str {
        match self {
            Field::AccessKey => "access_key",
            Field::SecretKey => "secret_key",
            Field::Endpoint => "endpoint",
        }
    }

    /// Value applied when a record is created without this field.
    pub fn default_value(self) -> &'static str {
        ""
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.name() == name)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Credentials used to build API clients.
///
/// Any field may be empty. An empty endpoint means "use the default
/// endpoint for the region".
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigRecord {
    pub access_key: String,
    pub secret_key: String,
    pub endpoint: String,
}

impl ConfigRecord {
    pub fn new(
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
        endpoint: impl Into<String>,
    ) -> Self {
        Self {
            access_key: access_key.into(),
            secret_key: secret_key.into(),
            endpoint: endpoint.into(),
        }
    }

    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::AccessKey => &self.access_key,
            Field::SecretKey => &self.secret_key,
            Field::Endpoint => &self.endpoint,
        }
    }

    pub(crate) fn get_mut(&mut self, field: Field) -> &mut String {
        match field {
            Field::AccessKey => &mut self.access_key,
            Field::SecretKey => &mut self.secret_key,
            Field::Endpoint => &mut self.endpoint,
        }
    }

    /// Field name -> value mapping, as returned to readers.
    pub fn to_map(&self) -> BTreeMap<&'static str, String> {
        Field::ALL
            .into_iter()
            .map(|field| (field.name(), self.get(field).to_string()))
            .collect()
    }
}

impl fmt::Debug for ConfigRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let secret = if self.secret_key.is_empty() {
            ""
        } else {
            "[REDACTED]"
        };
        f.debug_struct("ConfigRecord")
            .field("access_key", &self.access_key)
            .field("secret_key", &secret)
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

/// Serialize a record for storage.
pub fn encode(record: &ConfigRecord) -> Result<Vec<u8>> {
    serde_json::to_vec(record).map_err(ConfigError::Encode)
}

/// Parse stored bytes back into a record.
///
/// All three fields must be present and be strings; anything else is a
/// [`ConfigError::Decode`]. Unrecognized extra keys are ignored.
pub fn decode(bytes: &[u8]) -> Result<ConfigRecord> {
    serde_json::from_slice(bytes).map_err(ConfigError::Decode)
}
