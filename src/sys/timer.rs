//! Named, coalescing deferred operations.
//!
//! The host event loop is single threaded; anything that must happen "later"
//! is recorded here under a key. Scheduling a key that is already pending
//! replaces the earlier request, so a burst of notifications collapses into
//! one trailing run.

use std::hash::Hash;
use std::time::{Duration, Instant};

use crate::common::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delay {
    /// Run once pending events have been handled.
    Idle,
    After(Duration),
}

impl Delay {
    pub fn millis(ms: u64) -> Delay {
        if ms == 0 { Delay::Idle } else { Delay::After(Duration::from_millis(ms)) }
    }

    fn deadline(self, now: Instant) -> Instant {
        match self {
            Delay::Idle => now,
            Delay::After(d) => now + d,
        }
    }
}

#[derive(Debug)]
struct Pending {
    deadline: Instant,
    seq: u64,
}

#[derive(Debug)]
pub struct DeferredQueue<K> {
    pending: HashMap<K, Pending>,
    seq: u64,
}

impl<K> Default for DeferredQueue<K> {
    fn default() -> Self {
        Self {
            pending: HashMap::default(),
            seq: 0,
        }
    }
}

impl<K: Eq + Hash + Clone> DeferredQueue<K> {
    pub fn new() -> Self { Self::default() }

    /// Schedules `key`, superseding any earlier request for the same key.
    pub fn schedule(&mut self, key: K, delay: Delay, now: Instant) {
        self.seq += 1;
        self.pending.insert(key, Pending {
            deadline: delay.deadline(now),
            seq: self.seq,
        });
    }

    /// Schedules `key` unless it is already pending.
    pub fn schedule_once(&mut self, key: K, delay: Delay, now: Instant) -> bool {
        if self.pending.contains_key(&key) {
            return false;
        }
        self.schedule(key, delay, now);
        true
    }

    pub fn cancel(&mut self, key: &K) -> bool { self.pending.remove(key).is_some() }

    pub fn cancel_where(&mut self, mut pred: impl FnMut(&K) -> bool) {
        self.pending.retain(|k, _| !pred(k));
    }

    pub fn cancel_all(&mut self) { self.pending.clear(); }

    pub fn is_pending(&self, key: &K) -> bool { self.pending.contains_key(key) }

    pub fn is_empty(&self) -> bool { self.pending.is_empty() }

    pub fn len(&self) -> usize { self.pending.len() }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.values().map(|p| p.deadline).min()
    }

    /// Removes and returns every key due at `now`, earliest deadline first and
    /// in scheduling order among equal deadlines.
    pub fn take_due(&mut self, now: Instant) -> Vec<K> {
        let mut due: Vec<(Instant, u64, K)> = self
            .pending
            .iter()
            .filter(|(_, p)| p.deadline <= now)
            .map(|(k, p)| (p.deadline, p.seq, k.clone()))
            .collect();
        due.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)));
        for (_, _, key) in &due {
            self.pending.remove(key);
        }
        due.into_iter().map(|(_, _, k)| k).collect()
    }
}
