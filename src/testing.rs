//! In-memory stand-ins for Postgres and Redis used by unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::auth::jwt::SessionIssuer;
use crate::auth::password::CredentialHasher;
use crate::auth::service::AuthService;
use crate::cache::{CacheClient, CacheError, UserCache};
use crate::config::{HashConfig, JwtConfig, SESSION_TTL, USER_CACHE_TTL};
use crate::users::{StoreError, User, UserDirectory, UserStore};

pub const TEST_SECRET: &str = "test-secret";

#[derive(Default)]
pub struct MemoryStore {
    rows: Mutex<HashMap<String, User>>,
    next_id: AtomicI64,
    down: AtomicBool,
    delay_ms: AtomicU64,
    pub find_calls: AtomicUsize,
}

impl MemoryStore {
    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    /// Makes every store call sleep first, simulating a slow database.
    pub fn set_delay(&self, delay: Duration) {
        self.delay_ms.store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn find_count(&self) -> usize {
        self.find_calls.load(Ordering::SeqCst)
    }

    /// Places a row directly, bypassing `insert`.
    pub fn seed(&self, email: &str, password_hash: &str) -> i64 {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.rows.lock().unwrap().insert(
            email.to_string(),
            User {
                id,
                email: email.to_string(),
                password_hash: password_hash.to_string(),
            },
        );
        id
    }

    async fn stall(&self) {
        let ms = self.delay_ms.load(Ordering::SeqCst);
        if ms > 0 {
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }
    }

    fn check_up(&self) -> Result<(), StoreError> {
        if self.down.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert(&self, email: &str, password_hash: &str) -> Result<i64, StoreError> {
        tokio::task::yield_now().await;
        self.stall().await;
        self.check_up()?;
        let mut rows = self.rows.lock().unwrap();
        if rows.contains_key(email) {
            return Err(StoreError::DuplicateUser);
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        rows.insert(
            email.to_string(),
            User {
                id,
                email: email.to_string(),
                password_hash: password_hash.to_string(),
            },
        );
        Ok(id)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        self.find_calls.fetch_add(1, Ordering::SeqCst);
        self.stall().await;
        self.check_up()?;
        Ok(self.rows.lock().unwrap().get(email).cloned())
    }
}

#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, (Vec<u8>, Duration)>>,
    down: AtomicBool,
    pub set_calls: AtomicUsize,
}

impl MemoryCache {
    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    pub fn raw(&self, key: &str) -> Option<Vec<u8>> {
        self.entries.lock().unwrap().get(key).map(|(v, _)| v.clone())
    }

    pub fn ttl_of(&self, key: &str) -> Option<Duration> {
        self.entries.lock().unwrap().get(key).map(|(_, ttl)| *ttl)
    }

    pub fn insert_raw(&self, key: &str, value: Vec<u8>) {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), (value, USER_CACHE_TTL));
    }

    fn check_up(&self) -> Result<(), CacheError> {
        if self.down.load(Ordering::SeqCst) {
            let err = redis::RedisError::from((redis::ErrorKind::IoError, "connection refused"));
            return Err(err.into());
        }
        Ok(())
    }
}

#[async_trait]
impl CacheClient for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        self.check_up()?;
        Ok(self.raw(key))
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError> {
        self.set_calls.fetch_add(1, Ordering::SeqCst);
        self.check_up()?;
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), (value, ttl));
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.check_up()?;
        self.entries.lock().unwrap().remove(key);
        Ok(())
    }
}

/// Argon2 parameters small enough for debug-build tests.
pub fn cheap_hash_config() -> HashConfig {
    HashConfig {
        memory_kib: 1024,
        iterations: 1,
        parallelism: 1,
    }
}

pub fn jwt_config() -> JwtConfig {
    JwtConfig {
        secret: TEST_SECRET.into(),
        ttl: SESSION_TTL,
    }
}

pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub cache: Arc<MemoryCache>,
    pub service: Arc<AuthService>,
}

pub fn harness() -> Harness {
    let store = Arc::new(MemoryStore::default());
    let cache = Arc::new(MemoryCache::default());
    let directory = UserDirectory::new(
        store.clone(),
        UserCache::new(cache.clone(), USER_CACHE_TTL),
    );
    let hasher = CredentialHasher::new(&cheap_hash_config()).expect("valid argon2 params");
    let issuer = SessionIssuer::new(&jwt_config());
    let service = Arc::new(AuthService::new(hasher, directory, issuer));
    Harness {
        store,
        cache,
        service,
    }
}
