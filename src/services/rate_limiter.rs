//! Per-client sliding-window limiter for the subscribe endpoint.
//!
//! State lives in the limiter itself, so it only bounds traffic reaching
//! this process.

use std::collections::{HashMap, VecDeque};
use std::hash::Hash;
use std::net::IpAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use thiserror::Error;

pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    start: Instant,
    offset: Mutex<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut offset = self.offset.lock().unwrap_or_else(|e| e.into_inner());
        *offset += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        let offset = self.offset.lock().unwrap_or_else(|e| e.into_inner());
        self.start + *offset
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Too many requests, retry in {retry_after:?}")]
pub struct RateLimited {
    pub retry_after: Duration,
}

pub struct RateLimiter<K = IpAddr> {
    limit: usize,
    per: Duration,
    clock: Arc<dyn Clock>,
    hits: Mutex<HashMap<K, VecDeque<Instant>>>,
}

impl<K: Eq + Hash + Clone> RateLimiter<K> {
    pub fn new(limit: usize, per: Duration) -> Self {
        Self::with_clock(limit, per, Arc::new(SystemClock))
    }

    pub fn with_clock(limit: usize, per: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            limit,
            per,
            clock,
            hits: Mutex::new(HashMap::new()),
        }
    }

    /// Record a request from `key`, or refuse it if `limit` requests were
    /// already seen within the last `per`.
    pub fn check(&self, key: &K) -> Result<(), RateLimited> {
        let now = self.clock.now();
        let mut hits = self.hits.lock().unwrap_or_else(|e| e.into_inner());

        // Forget clients whose window has fully drained
        hits.retain(|_, times| {
            prune(times, now, self.per);
            !times.is_empty()
        });

        let times = hits.entry(key.clone()).or_default();
        if times.len() >= self.limit {
            let retry_after = times
                .front()
                .map(|oldest| self.per.saturating_sub(now.duration_since(*oldest)))
                .unwrap_or(self.per);
            return Err(RateLimited { retry_after });
        }

        times.push_back(now);
        Ok(())
    }

    pub fn tracked_clients(&self) -> usize {
        self.hits.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

fn prune(times: &mut VecDeque<Instant>, now: Instant, per: Duration) {
    while let Some(oldest) = times.front() {
        if now.duration_since(*oldest) >= per {
            times.pop_front();
        } else {
            break;
        }
    }
}
