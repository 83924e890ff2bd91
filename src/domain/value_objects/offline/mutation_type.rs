use serde::{Deserialize, Serialize};
use std::fmt;

/// 永続化されたままのミューテーション種別（例: `like_post`）。
///
/// 旧バージョンが書き込んだ未知の種別も保持できるよう、文字列のまま扱う。
/// 既知の種別への解釈は [`MutationKind::parse`] で行う。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MutationType(String);

/// 保存済みレコードが読めなかったときの種別。どの [`MutationKind`] にも一致しない。
pub const UNREADABLE_RECORD_TYPE: &str = "unreadable_record";

impl MutationType {
    pub fn new(value: String) -> Result<Self, String> {
        Self::validate(&value)?;
        Ok(Self(value))
    }

    pub fn unreadable() -> Self {
        Self(UNREADABLE_RECORD_TYPE.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn kind(&self) -> Option<MutationKind> {
        MutationKind::parse(&self.0)
    }

    fn validate(value: &str) -> Result<(), String> {
        if value.trim().is_empty() {
            return Err("Mutation type cannot be empty".to_string());
        }
        Ok(())
    }
}

impl fmt::Display for MutationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<MutationKind> for MutationType {
    fn from(kind: MutationKind) -> Self {
        Self(kind.as_str().to_string())
    }
}

impl TryFrom<String> for MutationType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<MutationType> for String {
    fn from(kind: MutationType) -> Self {
        kind.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationKind {
    CreatePost,
    AddComment,
    LikePost,
    UnlikePost,
    SavePost,
    UnsavePost,
    SubscribeCommunity,
    UnsubscribeCommunity,
    CreateCommunity,
}

impl MutationKind {
    pub const ALL: [MutationKind; 9] = [
        MutationKind::CreatePost,
        MutationKind::AddComment,
        MutationKind::LikePost,
        MutationKind::UnlikePost,
        MutationKind::SavePost,
        MutationKind::UnsavePost,
        MutationKind::SubscribeCommunity,
        MutationKind::UnsubscribeCommunity,
        MutationKind::CreateCommunity,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MutationKind::CreatePost => "create_post",
            MutationKind::AddComment => "add_comment",
            MutationKind::LikePost => "like_post",
            MutationKind::UnlikePost => "unlike_post",
            MutationKind::SavePost => "save_post",
            MutationKind::UnsavePost => "unsave_post",
            MutationKind::SubscribeCommunity => "subscribe_community",
            MutationKind::UnsubscribeCommunity => "unsubscribe_community",
            MutationKind::CreateCommunity => "create_community",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == value)
    }

    /// 再送しても結果が変わらない種別かどうか
    pub fn is_idempotent(&self) -> bool {
        !matches!(
            self,
            MutationKind::CreatePost | MutationKind::AddComment | MutationKind::CreateCommunity
        )
    }
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
