use async_trait::async_trait;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: String,
}

impl Session {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }
}

/// 現在の認証セッションを返す外部コラボレーター
#[async_trait]
pub trait SessionProvider: Send + Sync {
    async fn current_session(&self) -> Option<Session>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Established { user_id: String, banned: bool },
    Cleared,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityEvent {
    Regained,
    Lost,
}

/// 同期トリガーとして購読するライフサイクルイベント
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    Session(SessionEvent),
    Connectivity(ConnectivityEvent),
}

impl LifecycleEvent {
    pub fn session_established(user_id: impl Into<String>) -> Self {
        Self::Session(SessionEvent::Established {
            user_id: user_id.into(),
            banned: false,
        })
    }

    pub fn session_cleared() -> Self {
        Self::Session(SessionEvent::Cleared)
    }
}
