//! Cache of constructed API clients and the hook used to invalidate it.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Holder of API clients built from the current credentials.
///
/// `flush` must be synchronous and idempotent: afterwards no client built
/// from earlier credentials may be handed out again.
pub trait ClientCache: Send + Sync {
    fn flush(&self);
}

impl<C: ClientCache + ?Sized> ClientCache for Arc<C> {
    fn flush(&self) {
        (**self).flush()
    }
}

/// A cache that holds nothing. For embedders that don't cache clients.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoClientCache;

impl ClientCache for NoClientCache {
    fn flush(&self) {}
}

/// Clients keyed by region, built lazily and dropped on flush.
pub struct ClientPool<T> {
    clients: Mutex<HashMap<String, Arc<T>>>,
}

impl<T> ClientPool<T> {
    pub fn new() -> Self {
        Self {
            clients: Mutex::new(HashMap::new()),
        }
    }

    /// Return the cached client for `region`, building it with `build` if absent.
    ///
    /// The pool lock is held while building so concurrent callers for the
    /// same region share one client, and a concurrent flush can't slip in
    /// between the build and the insert.
    pub fn get_or_try_insert_with<E>(
        &self,
        region: &str,
        build: impl FnOnce() -> Result<T, E>,
    ) -> Result<Arc<T>, E> {
        let mut clients = self.clients.lock().expect("client pool lock poisoned");
        if let Some(client) = clients.get(region) {
            return Ok(Arc::clone(client));
        }

        let client = Arc::new(build()?);
        tracing::debug!(region, "Built API client");
        clients.insert(region.to_string(), Arc::clone(&client));
        Ok(client)
    }

    pub fn get(&self, region: &str) -> Option<Arc<T>> {
        let clients = self.clients.lock().expect("client pool lock poisoned");
        clients.get(region).cloned()
    }

    pub fn len(&self) -> usize {
        self.clients.lock().expect("client pool lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Default for ClientPool<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send + Sync> ClientCache for ClientPool<T> {
    fn flush(&self) {
        let mut clients = self.clients.lock().expect("client pool lock poisoned");
        let dropped = clients.len();
        clients.clear();
        tracing::info!(dropped, "Flushed cached API clients");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct FakeClient {
        endpoint: String,
    }

    #[test]
    fn reuses_client_per_region() -> anyhow::Result<()> {
        let pool = ClientPool::new();
        let mut builds = 0;

        let first = pool.get_or_try_insert_with("us-east-1", || {
            builds += 1;
            Ok::<_, anyhow::Error>(FakeClient {
                endpoint: "a".to_string(),
            })
        })?;
        let second = pool.get_or_try_insert_with("us-east-1", || {
            builds += 1;
            Ok::<_, anyhow::Error>(FakeClient {
                endpoint: "b".to_string(),
            })
        })?;

        assert_eq!(builds, 1);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.endpoint, "a");
        Ok(())
    }

    #[test]
    fn failed_build_caches_nothing() {
        let pool: ClientPool<FakeClient> = ClientPool::new();
        let result = pool.get_or_try_insert_with("eu-west-1", || Err("no credentials"));
        assert_eq!(result.unwrap_err(), "no credentials");
        assert!(pool.is_empty());
    }

    #[test]
    fn flush_drops_every_region_and_is_idempotent() -> anyhow::Result<()> {
        let pool = ClientPool::new();
        for region in ["us-east-1", "us-west-2"] {
            pool.get_or_try_insert_with(region, || {
                Ok::<_, anyhow::Error>(FakeClient {
                    endpoint: String::new(),
                })
            })?;
        }
        assert_eq!(pool.len(), 2);

        pool.flush();
        assert!(pool.is_empty());
        assert!(pool.get("us-east-1").is_none());

        pool.flush();
        assert!(pool.is_empty());
        Ok(())
    }
}
