use serde::{Deserialize, Serialize};

/// Club record with its per-club policy settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Club {
    pub id: i64,
    pub name: String,
    /// Days before a match when nomination votes lock.
    #[serde(default)]
    pub vote_lock_days: i64,
    /// Hours before a training when attendance changes lock.
    #[serde(default)]
    pub training_lock_hours: i64,
}
