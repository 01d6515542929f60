//! Traffic-rate burst sensor
//!
//! Counts packets over a fixed one-second window and classifies the rate
//! into four severity levels, publishing an event per anomalous window to
//! its own bounded channel. This sensor shares the "kernel-side counter,
//! userspace consumer" shape with the decision engine but nothing else: no
//! shared state, no control protocol. The kernel-side twin lives in
//! `ebpf-programs/src/xdp_burst.rs`.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Deserialize;
use tokio::sync::mpsc;

use crate::audit::monotonic_ns;

/// Window length for rate calculation.
pub const BURST_WINDOW_NS: u64 = 1_000_000_000;

/// Severity ladder for a traffic burst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum BurstSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl BurstSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            BurstSeverity::Low => "low",
            BurstSeverity::Medium => "medium",
            BurstSeverity::High => "high",
            BurstSeverity::Critical => "critical",
        }
    }
}

/// One classified window.
#[derive(Debug, Clone, Copy)]
pub struct BurstEvent {
    pub timestamp_ns: u64,
    pub pps: u64,
    pub severity: BurstSeverity,
}

/// Packets-per-second thresholds for each severity level.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct BurstThresholds {
    pub low: u64,
    pub medium: u64,
    pub high: u64,
    pub critical: u64,
}

impl Default for BurstThresholds {
    fn default() -> Self {
        Self {
            low: 1_000,
            medium: 10_000,
            high: 50_000,
            critical: 100_000,
        }
    }
}

impl BurstThresholds {
    /// Classify a rate; `None` below the lowest threshold.
    pub fn classify(&self, pps: u64) -> Option<BurstSeverity> {
        if pps >= self.critical {
            Some(BurstSeverity::Critical)
        } else if pps >= self.high {
            Some(BurstSeverity::High)
        } else if pps >= self.medium {
            Some(BurstSeverity::Medium)
        } else if pps >= self.low {
            Some(BurstSeverity::Low)
        } else {
            None
        }
    }
}

/// The burst sensor: an atomic packet counter rolled over once per window.
pub struct BurstSensor {
    thresholds: BurstThresholds,
    packets: AtomicU64,
    window_start_ns: AtomicU64,
    tx: mpsc::Sender<BurstEvent>,
}

impl BurstSensor {
    /// Create the sensor and the receiver its events are delivered on.
    pub fn new(
        thresholds: BurstThresholds,
        queue_depth: usize,
    ) -> (Self, mpsc::Receiver<BurstEvent>) {
        let (tx, rx) = mpsc::channel(queue_depth.max(1));
        (
            Self {
                thresholds,
                packets: AtomicU64::new(0),
                window_start_ns: AtomicU64::new(monotonic_ns()),
                tx,
            },
            rx,
        )
    }

    /// Count one packet. Safe from any number of concurrent callers; the
    /// window rollover is claimed by exactly one of them.
    pub fn record_packet(&self) {
        self.packets.fetch_add(1, Ordering::Relaxed);
        self.advance(monotonic_ns());
    }

    fn advance(&self, now_ns: u64) {
        let start = self.window_start_ns.load(Ordering::Acquire);
        let elapsed = now_ns.saturating_sub(start);
        if elapsed < BURST_WINDOW_NS {
            return;
        }

        // One caller wins the rollover; the rest keep counting
        if self
            .window_start_ns
            .compare_exchange(start, now_ns, Ordering::AcqRel, Ordering::Relaxed)
            .is_err()
        {
            return;
        }

        let count = self.packets.swap(0, Ordering::AcqRel);
        let pps = count.saturating_mul(1_000_000_000) / elapsed;

        if let Some(severity) = self.thresholds.classify(pps) {
            // Best-effort, same as the audit channel: never block the caller
            let _ = self.tx.try_send(BurstEvent {
                timestamp_ns: now_ns,
                pps,
                severity,
            });
        }
    }
}
