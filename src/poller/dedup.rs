//! Recently dispatched action ids

use std::collections::{HashSet, VecDeque};
use std::time::{Duration, Instant};

/// Maximum remembered ids
const DEDUP_MAX_ENTRIES: usize = 2000;

/// Action id deduplication window
///
/// Remembers ids dispatched within the window so an action whose delete
/// failed is not replayed when the server hands it out again. Ids are kept
/// in dispatch order, so expiry and overflow both pop from the front.
#[derive(Debug)]
pub struct SeenActions {
    order: VecDeque<(i64, Instant)>,
    ids: HashSet<i64>,
    ttl: Duration,
    max_entries: usize,
}

impl SeenActions {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            order: VecDeque::new(),
            ids: HashSet::new(),
            ttl,
            max_entries: DEDUP_MAX_ENTRIES,
        }
    }

    /// Check if `id` was seen within the window.
    ///
    /// Returns `true` if this is a duplicate.
    /// Returns `false` on first sight and records the id.
    pub fn is_duplicate(&mut self, id: i64) -> bool {
        self.check_at(id, Instant::now())
    }

    fn check_at(&mut self, id: i64, now: Instant) -> bool {
        self.expire(now);

        if self.ids.contains(&id) {
            return true;
        }

        if self.order.len() >= self.max_entries {
            self.pop_oldest();
        }
        self.order.push_back((id, now));
        self.ids.insert(id);
        false
    }

    fn expire(&mut self, now: Instant) {
        while self
            .order
            .front()
            .is_some_and(|(_, at)| now.duration_since(*at) >= self.ttl)
        {
            self.pop_oldest();
        }
    }

    fn pop_oldest(&mut self) {
        if let Some((id, _)) = self.order.pop_front() {
            self.ids.remove(&id);
        }
    }
}
