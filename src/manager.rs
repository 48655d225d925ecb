//! Lock-guarded read-modify-write over the client config record.
//!
//! One [`ConfigManager`] exists per backend instance. It owns the storage
//! handle behind a reader-writer lock, so the record can only be reached
//! through a lock guard:
//!
//! - [`ConfigManager::read`] and [`ConfigManager::exists`] take the lock shared.
//! - [`ConfigManager::upsert`] and [`ConfigManager::delete`] take it exclusively
//!   for the whole load-modify-persist sequence.
//!
//! The client cache is flushed only after the write has returned and the
//! lock has been released.

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

use tracing::{debug, info};

use crate::cache::ClientCache;
use crate::credentials::ClientCredentials;
use crate::error::{ConfigError, Result};
use crate::record::{self, ConfigRecord, Field, CONFIG_KEY};
use crate::request::{Operation, UpsertRequest};
use crate::storage::Storage;

/// Whether the backend currently has a client config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigState {
    Unconfigured,
    Configured(ConfigRecord),
}

impl ConfigState {
    pub fn is_configured(&self) -> bool {
        matches!(self, ConfigState::Configured(_))
    }

    pub fn record(&self) -> Option<&ConfigRecord> {
        match self {
            ConfigState::Configured(record) => Some(record),
            ConfigState::Unconfigured => None,
        }
    }

    pub fn into_record(self) -> Option<ConfigRecord> {
        match self {
            ConfigState::Configured(record) => Some(record),
            ConfigState::Unconfigured => None,
        }
    }

    /// Field name -> value mapping, or `None` when not configured.
    pub fn to_map(&self) -> Option<BTreeMap<&'static str, String>> {
        self.record().map(ConfigRecord::to_map)
    }
}

/// Result of a [`ConfigManager::upsert`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpsertOutcome {
    /// No record existed before this call.
    pub created: bool,
    /// Fields whose value was explicitly supplied and differed.
    pub changed: Vec<Field>,
}

impl UpsertOutcome {
    /// Whether cached clients were flushed by this write.
    ///
    /// Creating the record always counts, even if every supplied value
    /// matched the empty defaults.
    pub fn invalidated_clients(&self) -> bool {
        self.created || !self.changed.is_empty()
    }
}

/// Owner of the client config record.
///
/// The lock serializes access to storage but guards no in-memory state, so a
/// poisoned lock is taken over rather than reported: a panic mid-upsert leaves
/// storage holding either the old or the new record.
pub struct ConfigManager<S, C> {
    storage: RwLock<S>,
    cache: C,
}

impl<S: Storage, C: ClientCache> ConfigManager<S, C> {
    pub fn new(storage: S, cache: C) -> Self {
        Self {
            storage: RwLock::new(storage),
            cache,
        }
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }

    /// Load the record from a storage handle whose lock the caller already holds.
    fn load_locked(storage: &S) -> Result<ConfigState> {
        let bytes = storage.get(CONFIG_KEY).map_err(ConfigError::Storage)?;
        match bytes {
            Some(bytes) => Ok(ConfigState::Configured(record::decode(&bytes)?)),
            None => Ok(ConfigState::Unconfigured),
        }
    }

    /// Current config, read under the shared lock.
    pub fn read(&self) -> Result<ConfigState> {
        let storage = self.storage.read().unwrap_or_else(PoisonError::into_inner);
        let state = Self::load_locked(&storage)?;
        debug!(configured = state.is_configured(), "Loaded client config");
        Ok(state)
    }

    /// Whether a record exists. Lets the routing layer classify a write as
    /// create or update; [`Self::upsert`] does not rely on that classification.
    pub fn exists(&self) -> Result<bool> {
        Ok(self.read()?.is_configured())
    }

    /// Create the record or merge the supplied fields into it.
    ///
    /// On create, unsupplied fields take their default (empty). On update,
    /// unsupplied fields are left alone. The record is rewritten even when
    /// nothing changed. Credential strings are not validated here; see
    /// [`ClientCredentials::resolve`] for the point-of-use check.
    pub fn upsert(&self, request: &UpsertRequest) -> Result<UpsertOutcome> {
        let outcome = {
            let storage = self.storage.write().unwrap_or_else(PoisonError::into_inner);

            let (created, mut record) = match Self::load_locked(&storage)? {
                ConfigState::Unconfigured => (true, ConfigRecord::default()),
                ConfigState::Configured(record) => (false, record),
            };

            if created != (request.operation == Operation::Create) {
                debug!(
                    hinted = ?request.operation,
                    created,
                    "Client config existence changed since routing check"
                );
            }

            let mut changed = Vec::new();
            for field in Field::ALL {
                let slot = record.get_mut(field);
                match request.get(field) {
                    Some(value) => {
                        if slot.as_str() != value {
                            *slot = value.to_string();
                            changed.push(field);
                        }
                    }
                    None if created => *slot = field.default_value().to_string(),
                    None => {}
                }
            }

            let bytes = record::encode(&record)?;
            storage
                .put(CONFIG_KEY, &bytes)
                .map_err(ConfigError::Storage)?;

            UpsertOutcome { created, changed }
        };

        if outcome.created {
            info!(fields = ?outcome.changed, "Created client config");
        } else if !outcome.changed.is_empty() {
            info!(fields = ?outcome.changed, "Updated client config");
        }

        if outcome.invalidated_clients() {
            self.cache.flush();
        }

        Ok(outcome)
    }

    /// Remove the record. Cached clients are flushed whether or not a record
    /// existed.
    pub fn delete(&self) -> Result<()> {
        {
            let storage = self.storage.write().unwrap_or_else(PoisonError::into_inner);
            storage.delete(CONFIG_KEY).map_err(ConfigError::Storage)?;
        }

        info!("Deleted client config");
        self.cache.flush();
        Ok(())
    }

    /// Read the record and resolve it into credentials for building a client.
    pub fn client_credentials(&self) -> Result<ClientCredentials> {
        match self.read()? {
            ConfigState::Configured(record) => ClientCredentials::resolve(&record),
            ConfigState::Unconfigured => Ok(ClientCredentials::default()),
        }
    }
}
