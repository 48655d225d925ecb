#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::Result;
use clientconf::{ClientCache, ConfigManager, MemoryStorage, Storage};

/// Counts flushes.
#[derive(Debug, Default)]
pub struct CountingCache {
    flushes: AtomicUsize,
}

impl CountingCache {
    pub fn flushes(&self) -> usize {
        self.flushes.load(Ordering::SeqCst)
    }
}

impl ClientCache for CountingCache {
    fn flush(&self) {
        self.flushes.fetch_add(1, Ordering::SeqCst);
    }
}

pub type TestManager = ConfigManager<Arc<MemoryStorage>, Arc<CountingCache>>;

pub fn memory_manager() -> (TestManager, Arc<MemoryStorage>, Arc<CountingCache>) {
    let storage = Arc::new(MemoryStorage::new());
    let cache = Arc::new(CountingCache::default());
    let manager = ConfigManager::new(Arc::clone(&storage), Arc::clone(&cache));
    (manager, storage, cache)
}

/// Memory storage whose operations can be made to fail on demand.
#[derive(Debug, Default)]
pub struct FlakyStorage {
    inner: MemoryStorage,
    fail_get: AtomicBool,
    fail_put: AtomicBool,
    fail_delete: AtomicBool,
    panic_put: AtomicBool,
}

impl FlakyStorage {
    pub fn fail_get(&self, fail: bool) {
        self.fail_get.store(fail, Ordering::SeqCst);
    }

    pub fn fail_put(&self, fail: bool) {
        self.fail_put.store(fail, Ordering::SeqCst);
    }

    pub fn fail_delete(&self, fail: bool) {
        self.fail_delete.store(fail, Ordering::SeqCst);
    }

    pub fn panic_put(&self, panic: bool) {
        self.panic_put.store(panic, Ordering::SeqCst);
    }
}

impl Storage for FlakyStorage {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        if self.fail_get.load(Ordering::SeqCst) {
            anyhow::bail!("get failed");
        }
        self.inner.get(key)
    }

    fn put(&self, key: &str, value: &[u8]) -> Result<()> {
        if self.panic_put.load(Ordering::SeqCst) {
            panic!("storage put panicked");
        }
        if self.fail_put.load(Ordering::SeqCst) {
            anyhow::bail!("put failed");
        }
        self.inner.put(key, value)
    }

    fn delete(&self, key: &str) -> Result<()> {
        if self.fail_delete.load(Ordering::SeqCst) {
            anyhow::bail!("delete failed");
        }
        self.inner.delete(key)
    }
}

/// Memory storage whose `get` waits until `expected` callers are inside it
/// at once, or a deadline passes. Once open, the gate stays open. Records the
/// most concurrent callers seen.
#[derive(Debug)]
pub struct GateStorage {
    inner: MemoryStorage,
    expected: usize,
    inside: AtomicUsize,
    opened: AtomicBool,
    max_inside: Mutex<usize>,
}

impl GateStorage {
    pub fn new(expected: usize) -> Self {
        Self {
            inner: MemoryStorage::new(),
            expected,
            inside: AtomicUsize::new(0),
            opened: AtomicBool::new(false),
            max_inside: Mutex::new(0),
        }
    }

    pub fn max_inside(&self) -> usize {
        *self.max_inside.lock().expect("gate lock poisoned")
    }

    pub fn opened(&self) -> bool {
        self.opened.load(Ordering::SeqCst)
    }

    fn observe(&self) {
        let now = self.inside.load(Ordering::SeqCst);
        let mut max = self.max_inside.lock().expect("gate lock poisoned");
        *max = (*max).max(now);
    }
}

impl Storage for GateStorage {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.inside.fetch_add(1, Ordering::SeqCst);
        self.observe();

        let deadline = Instant::now() + Duration::from_secs(5);
        while !self.opened.load(Ordering::SeqCst) && Instant::now() < deadline {
            if self.inside.load(Ordering::SeqCst) >= self.expected {
                self.opened.store(true, Ordering::SeqCst);
                break;
            }
            std::thread::sleep(Duration::from_millis(1));
        }
        self.observe();

        let result = self.inner.get(key);
        self.inside.fetch_sub(1, Ordering::SeqCst);
        result
    }

    fn put(&self, key: &str, value: &[u8]) -> Result<()> {
        self.inner.put(key, value)
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.inner.delete(key)
    }
}
