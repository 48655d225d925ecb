//! Point-of-use resolution of the stored record into client credentials.
//!
//! The manager accepts partial credentials so they can be supplied across
//! several writes. Whoever builds a client checks completeness here.

use secrecy::SecretString;

use crate::error::{ConfigError, Result};
use crate::record::ConfigRecord;

/// Static access/secret key pair.
#[derive(Debug)]
pub struct StaticKeys {
    pub access_key: String,
    pub secret_key: SecretString,
}

/// What a client builder should use.
#[derive(Debug, Default)]
pub struct ClientCredentials {
    /// `None` means fall back to the ambient credential chain
    /// (environment, instance profile, ...).
    pub static_keys: Option<StaticKeys>,
    /// `None` means use the default endpoint for the region.
    pub endpoint: Option<String>,
}

impl ClientCredentials {
    /// Check that the record's keys are either both set or both empty.
    pub fn resolve(record: &ConfigRecord) -> Result<Self> {
        let static_keys = match (record.access_key.is_empty(), record.secret_key.is_empty()) {
            (false, false) => Some(StaticKeys {
                access_key: record.access_key.clone(),
                secret_key: SecretString::from(record.secret_key.clone()),
            }),
            (true, true) => None,
            (true, false) => {
                return Err(ConfigError::IncompleteCredentials {
                    missing: "access_key",
                    present: "secret_key",
                })
            }
            (false, true) => {
                return Err(ConfigError::IncompleteCredentials {
                    missing: "secret_key",
                    present: "access_key",
                })
            }
        };

        let endpoint = (!record.endpoint.is_empty()).then(|| record.endpoint.clone());

        Ok(Self {
            static_keys,
            endpoint,
        })
    }
}
