//! Credential configuration for cloud API clients.
//!
//! A [`ConfigManager`] owns a single [`ConfigRecord`] (access key, secret
//! key, endpoint) persisted through a [`Storage`] adapter. Writes that change
//! a credential flush the [`ClientCache`] so clients are rebuilt from the new
//! values.

pub mod cache;
pub mod credentials;
pub mod error;
pub mod manager;
pub mod record;
pub mod request;
pub mod settings;
pub mod storage;

pub use cache::{ClientCache, ClientPool, NoClientCache};
pub use credentials::{ClientCredentials, StaticKeys};
pub use error::{ConfigError, Result};
pub use manager::{ConfigManager, ConfigState, UpsertOutcome};
pub use record::{ConfigRecord, Field, CONFIG_KEY};
pub use request::{Operation, UpsertRequest};
pub use storage::{JsonFileStorage, MemoryStorage, Storage};
