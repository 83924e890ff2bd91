use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncTrigger {
    SessionEstablished,
    ConnectivityRegained,
    Manual,
}

impl SyncTrigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncTrigger::SessionEstablished => "session_established",
            SyncTrigger::ConnectivityRegained => "connectivity_regained",
            SyncTrigger::Manual => "manual",
        }
    }
}

impl fmt::Display for SyncTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 同期ランが止まった理由
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "reason")]
pub enum SyncHalt {
    Offline,
    RemoteFailure { mutation_id: String, message: String },
}

/// 1回の同期ラン（drain）の結果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub trigger: SyncTrigger,
    pub synced: u32,
    pub quarantined: u32,
    pub dropped: u32,
    pub remaining: usize,
    pub halt: Option<SyncHalt>,
    pub started_at: i64,
    pub finished_at: i64,
}

impl SyncReport {
    pub fn is_drained(&self) -> bool {
        self.halt.is_none() && self.remaining == 0
    }
}
