//! Time-boxed caching for the rendered home feed.
//!
//! Entries live for a fixed TTL and are never invalidated by writes: a new
//! post doesn't show up on a cached page until the entry expires. Each page
//! number of the feed is cached separately.

use std::collections::HashMap;
use std::fmt::{self, Debug};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};

/// Source of the current time, so expiry can be tested deterministically.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// The wall clock.
#[derive(Debug)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> ManualClock {
        ManualClock {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.now.lock().expect("clock lock poisoned") += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().expect("clock lock poisoned")
    }
}

struct Entry {
    rendered: String,
    expires: DateTime<Utc>,
}

/// A cache of rendered feed pages, keyed by requested page number.
pub struct ListingCache {
    ttl: Duration,
    clock: Arc<dyn Clock>,
    entries: Mutex<HashMap<u32, Entry>>,
}

impl ListingCache {
    pub fn new(ttl: std::time::Duration) -> ListingCache {
        ListingCache::with_clock(ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl: std::time::Duration, clock: Arc<dyn Clock>) -> ListingCache {
        ListingCache {
            ttl: Duration::from_std(ttl).unwrap_or(Duration::MAX),
            clock,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Get the cached rendering for a page, if it hasn't expired.
    ///
    /// An entry within its TTL is returned as-is, however stale; expired
    /// entries are dropped.
    pub fn get(&self, page: u32) -> Option<String> {
        let mut entries = self.entries.lock().expect("cache lock poisoned");

        match entries.get(&page) {
            Some(entry) if self.clock.now() < entry.expires => {
                log::trace!("Cache hit for feed page {}", page);
                Some(entry.rendered.clone())
            }
            Some(_) => {
                entries.remove(&page);
                None
            }
            None => None,
        }
    }

    /// Cache the rendering of a page for the next TTL window.
    pub fn put(&self, page: u32, rendered: String) {
        let entry = Entry {
            rendered,
            expires: self.clock.now() + self.ttl,
        };

        self.entries
            .lock()
            .expect("cache lock poisoned")
            .insert(page, entry);
    }

    /// Drop every cached page.
    pub fn clear(&self) {
        self.entries
            .lock()
            .expect("cache lock poisoned")
            .clear();
    }
}

impl Debug for ListingCache {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        let entries = self.entries.lock().expect("cache lock poisoned");

        write!(
            fmt,
            "<#ListingCache ttl={}s entries={}>",
            self.ttl.num_seconds(),
            entries.len()
        )
    }
}
