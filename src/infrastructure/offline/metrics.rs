use crate::domain::entities::offline::{SyncHalt, SyncReport};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{LazyLock, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SyncRunStatus {
    Drained,
    Halted,
    Offline,
}

impl SyncRunStatus {
    pub fn from_report(report: &SyncReport) -> Self {
        match &report.halt {
            None => SyncRunStatus::Drained,
            Some(SyncHalt::Offline) => SyncRunStatus::Offline,
            Some(SyncHalt::RemoteFailure { .. }) => SyncRunStatus::Halted,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SyncMetricsSnapshot {
    pub total_runs: u64,
    pub total_synced: u64,
    pub total_quarantined: u64,
    pub total_dropped: u64,
    pub total_halted: u64,
    pub consecutive_halted: u64,
    pub last_drained_ms: Option<u64>,
    pub last_halted_ms: Option<u64>,
    pub last_status: Option<SyncRunStatus>,
    pub last_trigger: Option<String>,
    pub last_remaining: Option<u64>,
    pub last_error: Option<String>,
    pub last_duration_ms: Option<u64>,
}

#[derive(Default, Clone)]
struct LastRunMetadata {
    status: Option<SyncRunStatus>,
    trigger: Option<String>,
    remaining: Option<u64>,
    error: Option<String>,
    duration_ms: Option<u64>,
}

struct SyncRunMetrics {
    runs: AtomicU64,
    synced: AtomicU64,
    quarantined: AtomicU64,
    dropped: AtomicU64,
    halted: AtomicU64,
    consecutive_halted: AtomicU64,
    last_drained_ms: AtomicU64,
    last_halted_ms: AtomicU64,
    metadata: Mutex<LastRunMetadata>,
}

impl SyncRunMetrics {
    fn new() -> Self {
        Self {
            runs: AtomicU64::new(0),
            synced: AtomicU64::new(0),
            quarantined: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
            halted: AtomicU64::new(0),
            consecutive_halted: AtomicU64::new(0),
            last_drained_ms: AtomicU64::new(0),
            last_halted_ms: AtomicU64::new(0),
            metadata: Mutex::new(LastRunMetadata::default()),
        }
    }

    fn record(&self, report: &SyncReport) {
        let status = SyncRunStatus::from_report(report);
        self.runs.fetch_add(1, Ordering::Relaxed);
        self.synced
            .fetch_add(u64::from(report.synced), Ordering::Relaxed);
        self.quarantined
            .fetch_add(u64::from(report.quarantined), Ordering::Relaxed);
        self.dropped
            .fetch_add(u64::from(report.dropped), Ordering::Relaxed);

        match status {
            SyncRunStatus::Drained => {
                self.last_drained_ms
                    .store(current_unix_ms(), Ordering::Relaxed);
                self.consecutive_halted.store(0, Ordering::Relaxed);
            }
            SyncRunStatus::Halted => {
                self.halted.fetch_add(1, Ordering::Relaxed);
                self.last_halted_ms
                    .store(current_unix_ms(), Ordering::Relaxed);
                self.consecutive_halted.fetch_add(1, Ordering::Relaxed);
            }
            SyncRunStatus::Offline => {}
        }

        if let Ok(mut guard) = self.metadata.lock() {
            guard.status = Some(status);
            guard.trigger = Some(report.trigger.to_string());
            guard.remaining = Some(report.remaining as u64);
            guard.error = match &report.halt {
                Some(SyncHalt::RemoteFailure { message, .. }) => Some(message.clone()),
                _ => None,
            };
            guard.duration_ms =
                Some(report.finished_at.saturating_sub(report.started_at).max(0) as u64);
        }
    }

    fn snapshot(&self) -> SyncMetricsSnapshot {
        let metadata = self
            .metadata
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_else(|_| LastRunMetadata::default());

        SyncMetricsSnapshot {
            total_runs: self.runs.load(Ordering::Relaxed),
            total_synced: self.synced.load(Ordering::Relaxed),
            total_quarantined: self.quarantined.load(Ordering::Relaxed),
            total_dropped: self.dropped.load(Ordering::Relaxed),
            total_halted: self.halted.load(Ordering::Relaxed),
            consecutive_halted: self.consecutive_halted.load(Ordering::Relaxed),
            last_drained_ms: to_option(self.last_drained_ms.load(Ordering::Relaxed)),
            last_halted_ms: to_option(self.last_halted_ms.load(Ordering::Relaxed)),
            last_status: metadata.status,
            last_trigger: metadata.trigger,
            last_remaining: metadata.remaining,
            last_error: metadata.error,
            last_duration_ms: metadata.duration_ms,
        }
    }
}

fn to_option(value: u64) -> Option<u64> {
    if value == 0 { None } else { Some(value) }
}

fn current_unix_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_millis() as u64)
        .unwrap_or(0)
}

static SYNC_RUN_METRICS: LazyLock<SyncRunMetrics> = LazyLock::new(SyncRunMetrics::new);

pub fn record_run(report: &SyncReport) -> SyncMetricsSnapshot {
    SYNC_RUN_METRICS.record(report);
    SYNC_RUN_METRICS.snapshot()
}

pub fn snapshot() -> SyncMetricsSnapshot {
    SYNC_RUN_METRICS.snapshot()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::offline::SyncTrigger;

    fn report(synced: u32, remaining: usize, halt: Option<SyncHalt>) -> SyncReport {
        SyncReport {
            trigger: SyncTrigger::SessionEstablished,
            synced,
            quarantined: 0,
            dropped: 0,
            remaining,
            halt,
            started_at: 1_000,
            finished_at: 1_800,
        }
    }

    #[test]
    fn record_drained_and_halted_runs() {
        let metrics = SyncRunMetrics::new();

        metrics.record(&report(2, 0, None));
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.total_runs, 1);
        assert_eq!(snapshot.total_synced, 2);
        assert_eq!(snapshot.last_status, Some(SyncRunStatus::Drained));
        assert_eq!(snapshot.last_duration_ms, Some(800));
        assert!(snapshot.last_drained_ms.is_some());

        metrics.record(&report(
            0,
            2,
            Some(SyncHalt::RemoteFailure {
                mutation_id: "1".into(),
                message: "Network error: offline".into(),
            }),
        ));
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.total_runs, 2);
        assert_eq!(snapshot.total_halted, 1);
        assert_eq!(snapshot.consecutive_halted, 1);
        assert_eq!(snapshot.last_status, Some(SyncRunStatus::Halted));
        assert_eq!(snapshot.last_remaining, Some(2));
        assert_eq!(snapshot.last_error.as_deref(), Some("Network error: offline"));
    }

    #[test]
    fn offline_runs_do_not_reset_halt_streak() {
        let metrics = SyncRunMetrics::new();
        metrics.record(&report(
            0,
            1,
            Some(SyncHalt::RemoteFailure {
                mutation_id: "1".into(),
                message: "boom".into(),
            }),
        ));
        metrics.record(&report(0, 1, Some(SyncHalt::Offline)));

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.consecutive_halted, 1);
        assert_eq!(snapshot.last_status, Some(SyncRunStatus::Offline));
    }
}
