//! In-process share request store.
//!
//! Keeps announced requests in a `HashMap` keyed by workspace, user and
//! level, with optional TTL expiry so a request can be repeated later.
//! A request that is still being sent is held as a pending entry, so a
//! concurrent duplicate is turned away before it reaches the feeds service.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crate::error::Result;
use crate::model::share::{ShareLevel, ShareRequestRecord};
use crate::storage::{Reservation, ShareRequestStore};

type RequestKey = (i64, String, ShareLevel);

pub struct InMemoryShareRequestStore {
    entries: Mutex<HashMap<RequestKey, StoreEntry>>,
    ttl: Option<Duration>,
    max_entries: usize,
}

struct StoreEntry {
    /// `None` while the notification is in flight.
    record: Option<ShareRequestRecord>,
    inserted_at: Instant,
}

impl StoreEntry {
    fn is_live(&self, ttl: Option<Duration>, now: Instant) -> bool {
        ttl.is_none_or(|ttl| now.duration_since(self.inserted_at) < ttl)
    }
}

impl InMemoryShareRequestStore {
    /// Store that keeps requests until capacity forces eviction.
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl: None,
            max_entries,
        }
    }

    /// Requests older than `ttl` are forgotten and may be made again.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<RequestKey, StoreEntry>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Insert `entry` under `key`, evicting expired and then oldest entries
    /// when the store is full.
    fn insert(&self, entries: &mut HashMap<RequestKey, StoreEntry>, key: RequestKey, entry: StoreEntry) {
        if entries.len() >= self.max_entries && !entries.contains_key(&key) {
            let now = Instant::now();
            let ttl = self.ttl;
            entries.retain(|_, e| e.is_live(ttl, now));
        }

        // Still full: drop the oldest request
        if entries.len() >= self.max_entries
            && !entries.contains_key(&key)
            && let Some(oldest) = entries
                .iter()
                .min_by_key(|(_, e)| e.inserted_at)
                .map(|(k, _)| k.clone())
        {
            entries.remove(&oldest);
        }

        if self.max_entries == 0 {
            return;
        }
        entries.insert(key, entry);
    }
}

#[async_trait::async_trait]
impl ShareRequestStore for InMemoryShareRequestStore {
    async fn find(
        &self,
        ws_id: i64,
        user: &str,
        level: ShareLevel,
    ) -> Result<Option<ShareRequestRecord>> {
        let mut entries = self.lock();
        let key = (ws_id, user.to_string(), level);
        if let Some(entry) = entries.get(&key) {
            if entry.is_live(self.ttl, Instant::now()) {
                return Ok(entry.record.clone());
            }
            entries.remove(&key);
        }
        Ok(None)
    }

    async fn reserve(&self, ws_id: i64, user: &str, level: ShareLevel) -> Result<Reservation> {
        let mut entries = self.lock();
        let key = (ws_id, user.to_string(), level);
        if let Some(entry) = entries.get(&key)
            && entry.is_live(self.ttl, Instant::now())
        {
            return Ok(Reservation::AlreadyRequested(entry.record.clone()));
        }

        self.insert(
            &mut entries,
            key,
            StoreEntry {
                record: None,
                inserted_at: Instant::now(),
            },
        );
        Ok(Reservation::Reserved)
    }

    async fn save(&self, record: &ShareRequestRecord) -> Result<()> {
        let mut entries = self.lock();
        let key = (record.ws_id, record.user.clone(), record.share_level);
        self.insert(
            &mut entries,
            key,
            StoreEntry {
                record: Some(record.clone()),
                inserted_at: Instant::now(),
            },
        );
        Ok(())
    }

    async fn release(&self, ws_id: i64, user: &str, level: ShareLevel) -> Result<()> {
        let mut entries = self.lock();
        let key = (ws_id, user.to_string(), level);
        if entries.get(&key).is_some_and(|e| e.record.is_none()) {
            entries.remove(&key);
        }
        Ok(())
    }
}
