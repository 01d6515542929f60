//! Atomic decision counters
//!
//! Three monotonically increasing counters track evaluation volume: checks
//! performed, blocks issued, allows issued. Increments happen on the
//! evaluation hot path from unbounded concurrent callers, so each counter is
//! a single atomic add - no read-modify-write pair, no lost updates.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::engine::Verdict;

/// The three decision counters.
pub struct CounterSet {
    checks: AtomicU64,
    blocks: AtomicU64,
    allows: AtomicU64,
}

/// A point-in-time copy of the counters, readable by the control plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterSnapshot {
    pub checks: u64,
    pub blocks: u64,
    pub allows: u64,
}

impl CounterSet {
    pub fn new() -> Self {
        Self {
            checks: AtomicU64::new(0),
            blocks: AtomicU64::new(0),
            allows: AtomicU64::new(0),
        }
    }

    /// Record one evaluated decision: bumps `checks` and the counter
    /// matching the verdict.
    pub fn record(&self, verdict: Verdict) {
        self.checks.fetch_add(1, Ordering::Relaxed);
        match verdict {
            Verdict::Allow => self.allows.fetch_add(1, Ordering::Relaxed),
            Verdict::Block => self.blocks.fetch_add(1, Ordering::Relaxed),
        };
    }

    /// Read all three counters.
    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            checks: self.checks.load(Ordering::Relaxed),
            blocks: self.blocks.load(Ordering::Relaxed),
            allows: self.allows.load(Ordering::Relaxed),
        }
    }

    /// Administrative reset. Enforcement keeps running; only the counts
    /// start over.
    pub fn reset(&self) {
        self.checks.store(0, Ordering::Relaxed);
        self.blocks.store(0, Ordering::Relaxed);
        self.allows.store(0, Ordering::Relaxed);
    }
}

impl Default for CounterSet {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_record_and_snapshot() {
        let counters = CounterSet::new();
        counters.record(Verdict::Allow);
        counters.record(Verdict::Block);
        counters.record(Verdict::Block);

        let snap = counters.snapshot();
        assert_eq!(snap.checks, 3);
        assert_eq!(snap.allows, 1);
        assert_eq!(snap.blocks, 2);
    }

    #[test]
    fn test_reset() {
        let counters = CounterSet::new();
        counters.record(Verdict::Block);
        counters.reset();
        assert_eq!(
            counters.snapshot(),
            CounterSnapshot {
                checks: 0,
                blocks: 0,
                allows: 0
            }
        );
    }

    #[test]
    fn test_conservation_under_concurrency() {
        let counters = Arc::new(CounterSet::new());
        let mut handles = Vec::new();
        for t in 0..8 {
            let counters = Arc::clone(&counters);
            handles.push(std::thread::spawn(move || {
                for i in 0..10_000 {
                    let verdict = if (t + i) % 3 == 0 {
                        Verdict::Allow
                    } else {
                        Verdict::Block
                    };
                    counters.record(verdict);
                }
            }));
        }
        for h in handles {
            h.join().unwrap();
        }

        let snap = counters.snapshot();
        assert_eq!(snap.checks, 80_000);
        assert_eq!(snap.checks, snap.blocks + snap.allows);
    }
}
