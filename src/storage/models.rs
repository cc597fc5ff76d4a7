use chrono::{DateTime, Utc};

use crate::common::Notification;

/// Last known notification view, as written by the sync actor.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedSnapshot {
    pub notifications: Vec<Notification>,
    pub unread_count: u64,
    pub saved_at: DateTime<Utc>,
}
