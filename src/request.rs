//! Upsert requests as handed over by the routing layer.

use crate::error::{ConfigError, Result};
use crate::record::Field;

/// What the routing layer believed the write was.
///
/// Only a hint: the manager re-derives create vs update under its lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Operation {
    Create,
    #[default]
    Update,
}

/// A write to the client config.
///
/// `None` means the field was not supplied; `Some("")` explicitly sets it
/// to empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpsertRequest {
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    pub endpoint: Option<String>,
    pub operation: Operation,
}

impl UpsertRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_access_key(mut self, value: impl Into<String>) -> Self {
        self.access_key = Some(value.into());
        self
    }

    pub fn with_secret_key(mut self, value: impl Into<String>) -> Self {
        self.secret_key = Some(value.into());
        self
    }

    pub fn with_endpoint(mut self, value: impl Into<String>) -> Self {
        self.endpoint = Some(value.into());
        self
    }

    pub fn with_operation(mut self, operation: Operation) -> Self {
        self.operation = operation;
        self
    }

    /// Build a request from raw key/value pairs.
    ///
    /// Fields not mentioned stay unsupplied. Unknown keys are rejected.
    pub fn from_pairs<I, K, V>(operation: Operation, pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut request = Self::new().with_operation(operation);
        for (key, value) in pairs {
            let key = key.as_ref();
            let field =
                Field::from_name(key).ok_or_else(|| ConfigError::UnknownField(key.to_string()))?;
            *request.slot_mut(field) = Some(value.into());
        }
        Ok(request)
    }

    /// The supplied value for `field`, if any.
    pub fn get(&self, field: Field) -> Option<&str> {
        match field {
            Field::AccessKey => self.access_key.as_deref(),
            Field::SecretKey => self.secret_key.as_deref(),
            Field::Endpoint => self.endpoint.as_deref(),
        }
    }

    fn slot_mut(&mut self, field: Field) -> &mut Option<String> {
        match field {
            Field::AccessKey => &mut self.access_key,
            Field::SecretKey => &mut self.secret_key,
            Field::Endpoint => &mut self.endpoint,
        }
    }
}
