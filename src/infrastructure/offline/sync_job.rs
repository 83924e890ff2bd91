use super::metrics;
use crate::application::ports::connectivity::ConnectivityProbe;
use crate::application::ports::offline_store::MutationQueue;
use crate::application::services::mutation_dispatcher::MutationDispatcher;
use crate::domain::entities::offline::{QueuedMutation, SyncHalt, SyncReport, SyncTrigger};
use crate::shared::config::PoisonPolicy;
use crate::shared::error::AppError;
use chrono::Utc;
use std::sync::{Arc, PoisonError};
use tokio::sync::Mutex;

/// `run` の結果。実行中のランがあれば後続ランとして合流する
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncRunOutcome {
    Coalesced,
    Completed(Vec<SyncReport>),
}

impl SyncRunOutcome {
    pub fn last_report(&self) -> Option<&SyncReport> {
        match self {
            SyncRunOutcome::Coalesced => None,
            SyncRunOutcome::Completed(reports) => reports.last(),
        }
    }
}

pub struct QueueSyncJob {
    queue: Arc<dyn MutationQueue>,
    dead_letters: Arc<dyn MutationQueue>,
    dispatcher: Arc<MutationDispatcher>,
    connectivity: Arc<dyn ConnectivityProbe>,
    poison_policy: PoisonPolicy,
    gate: Mutex<()>,
    pending: std::sync::Mutex<Option<SyncTrigger>>,
}

impl QueueSyncJob {
    pub fn new(
        queue: Arc<dyn MutationQueue>,
        dead_letters: Arc<dyn MutationQueue>,
        dispatcher: Arc<MutationDispatcher>,
        connectivity: Arc<dyn ConnectivityProbe>,
        poison_policy: PoisonPolicy,
    ) -> Arc<Self> {
        Arc::new(Self {
            queue,
            dead_letters,
            dispatcher,
            connectivity,
            poison_policy,
            gate: Mutex::new(()),
            pending: std::sync::Mutex::new(None),
        })
    }

    pub fn queue(&self) -> &Arc<dyn MutationQueue> {
        &self.queue
    }

    pub fn dead_letters(&self) -> &Arc<dyn MutationQueue> {
        &self.dead_letters
    }

    /// バックグラウンドでランを起動する（結果はログとメトリクスのみ）
    pub fn trigger(self: &Arc<Self>, trigger: SyncTrigger) {
        let job = Arc::clone(self);
        tokio::spawn(async move {
            if let Err(err) = job.run(trigger).await {
                tracing::error!(
                    target: "offline::sync",
                    trigger = %trigger,
                    error = %err,
                    "offline queue sync failed"
                );
            }
        });
    }

    /// 同時に走るランは最大1つ。実行中に来たトリガーは1回の後続ランにまとめる
    pub async fn run(&self, trigger: SyncTrigger) -> Result<SyncRunOutcome, AppError> {
        self.set_pending(trigger);
        let mut reports = Vec::new();

        loop {
            let Ok(guard) = self.gate.try_lock() else {
                if reports.is_empty() {
                    tracing::debug!(
                        target: "offline::sync",
                        trigger = %trigger,
                        "sync already running; trigger coalesced"
                    );
                    return Ok(SyncRunOutcome::Coalesced);
                }
                break;
            };

            while let Some(next) = self.take_pending() {
                reports.push(self.run_once(next).await?);
            }
            drop(guard);

            // ロック解放直前に積まれたトリガーを取りこぼさない
            if !self.has_pending() {
                break;
            }
        }

        Ok(SyncRunOutcome::Completed(reports))
    }

    /// キューを先頭から1件ずつ送信する
    pub async fn run_once(&self, trigger: SyncTrigger) -> Result<SyncReport, AppError> {
        let started_at = Utc::now().timestamp_millis();
        let mut report = SyncReport {
            trigger,
            synced: 0,
            quarantined: 0,
            dropped: 0,
            remaining: 0,
            halt: None,
            started_at,
            finished_at: started_at,
        };

        if !self.connectivity.is_connected() {
            report.remaining = self.queue.len().await?;
            report.halt = Some(SyncHalt::Offline);
            return Ok(self.finish(report));
        }

        while let Some(head) = self.queue.head().await? {
            match self.dispatcher.dispatch(&head).await {
                Ok(()) => {
                    self.remove_head(&head).await?;
                    report.synced += 1;
                }
                Err(err) if err.is_poison() => {
                    match self.poison_policy {
                        PoisonPolicy::Quarantine => {
                            self.quarantine(&head).await?;
                            report.quarantined += 1;
                        }
                        PoisonPolicy::Drop => {
                            report.dropped += 1;
                        }
                    }
                    tracing::warn!(
                        target: "offline::sync",
                        mutation_id = %head.id,
                        kind = %head.mutation_type,
                        policy = ?self.poison_policy,
                        error = %err,
                        "queued write can never succeed; removed from queue"
                    );
                    self.remove_head(&head).await?;
                }
                Err(err) => {
                    tracing::warn!(
                        target: "offline::sync",
                        mutation_id = %head.id,
                        kind = %head.mutation_type,
                        error = %err,
                        "remote write failed; sync halted"
                    );
                    report.halt = Some(SyncHalt::RemoteFailure {
                        mutation_id: head.id.to_string(),
                        message: err.to_string(),
                    });
                    break;
                }
            }
        }

        report.remaining = self.queue.len().await?;
        Ok(self.finish(report))
    }

    async fn quarantine(&self, item: &QueuedMutation) -> Result<(), AppError> {
        // dead letter 追加後に dequeue 前で落ちた場合の再実行
        let already = self
            .dead_letters
            .peek()
            .await?
            .iter()
            .any(|letter| letter.id == item.id);
        if !already {
            self.dead_letters.enqueue(item.clone()).await?;
        }
        Ok(())
    }

    // 送信中にキューが差し替わった場合は他の項目を消さない
    async fn remove_head(&self, expected: &QueuedMutation) -> Result<(), AppError> {
        if self.queue.dequeue_if(&expected.id).await?.is_none() {
            tracing::warn!(
                target: "offline::sync",
                mutation_id = %expected.id,
                "queue changed during dispatch; head left in place"
            );
        }
        Ok(())
    }

    fn finish(&self, mut report: SyncReport) -> SyncReport {
        report.finished_at = Utc::now().timestamp_millis();
        let snapshot = metrics::record_run(&report);
        tracing::info!(
            target: "offline::sync",
            trigger = %report.trigger,
            synced = report.synced,
            quarantined = report.quarantined,
            dropped = report.dropped,
            remaining = report.remaining,
            halted = report.halt.is_some(),
            total_runs = snapshot.total_runs,
            "offline queue sync finished"
        );
        report
    }

    fn set_pending(&self, trigger: SyncTrigger) {
        *self.pending.lock().unwrap_or_else(PoisonError::into_inner) = Some(trigger);
    }

    fn take_pending(&self) -> Option<SyncTrigger> {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    fn has_pending(&self) -> bool {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}
