// Request id generation
//
// Injected into the client so request correlation stays deterministic under
// test while production clients keep clock-derived ids.

use std::sync::atomic::{AtomicI64, Ordering};

use super::protocol::RequestId;

/// Source of JSON-RPC request ids
pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> RequestId;
}

/// Counter starting at 1
#[derive(Debug)]
pub struct SequentialIds {
    next: AtomicI64,
}

impl SequentialIds {
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    pub fn starting_at(first: i64) -> Self {
        Self {
            next: AtomicI64::new(first),
        }
    }
}

impl Default for SequentialIds {
    fn default() -> Self {
        Self::new()
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&self) -> RequestId {
        RequestId::Number(self.next.fetch_add(1, Ordering::SeqCst))
    }
}

/// Millisecond wall-clock ids, bumped so that they never repeat or go
/// backwards within one generator
#[derive(Debug, Default)]
pub struct ClockIds {
    last: AtomicI64,
}

impl ClockIds {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdGenerator for ClockIds {
    fn next_id(&self) -> RequestId {
        let now = chrono::Utc::now().timestamp_millis();
        let mut prev = self.last.load(Ordering::SeqCst);
        loop {
            let candidate = now.max(prev + 1);
            match self
                .last
                .compare_exchange(prev, candidate, Ordering::SeqCst, Ordering::SeqCst)
            {
                Ok(_) => return RequestId::Number(candidate),
                Err(actual) => prev = actual,
            }
        }
    }
}

/// Random v4 UUID strings
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidIds;

impl IdGenerator for UuidIds {
    fn next_id(&self) -> RequestId {
        RequestId::String(uuid::Uuid::new_v4().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequential_ids_count_up() {
        let ids = SequentialIds::new();
        assert_eq!(ids.next_id(), RequestId::Number(1));
        assert_eq!(ids.next_id(), RequestId::Number(2));
        assert_eq!(ids.next_id(), RequestId::Number(3));
    }

    #[test]
    fn test_clock_ids_strictly_increase() {
        let ids = ClockIds::new();
        let mut last = 0;
        for _ in 0..1000 {
            match ids.next_id() {
                RequestId::Number(n) => {
                    assert!(n > last);
                    last = n;
                }
                other => panic!("expected numeric id, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_uuid_ids_are_unique_strings() {
        let ids = UuidIds;
        let a = ids.next_id();
        let b = ids.next_id();
        assert_ne!(a, b);
        assert!(matches!(a, RequestId::String(ref s) if s.len() == 36));
    }
}
