use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension, Result as SqlResult, params};
use std::path::Path;

use super::database::Database;
use super::ensure_parent_dir;
use super::models::CachedSnapshot;
use crate::common::{Notification, NotificationSnapshot};

/// Snapshot cache of the notification list (last known view between runs)
pub struct NotificationCache {
    db: Database,
}

impl NotificationCache {
    /// Open (or create) the cache at a path
    pub fn with_path<P: AsRef<Path>>(path: P) -> SqlResult<Self> {
        if let Err(err) = ensure_parent_dir(path.as_ref()) {
            log::warn!(
                "Unable to create cache directory for {}: {err}",
                path.as_ref().display()
            );
        }
        Self::init(Database::new(path)?)
    }

    pub fn in_memory() -> SqlResult<Self> {
        Self::init(Database::in_memory()?)
    }

    fn init(db: Database) -> SqlResult<Self> {
        let cache = Self { db };
        cache.init_schema()?;
        Ok(cache)
    }

    fn init_schema(&self) -> SqlResult<()> {
        let conn = self.db.connection();

        // Thứ tự hiển thị giữ bằng cột position (0 = mới nhất)
        conn.execute(
            "CREATE TABLE IF NOT EXISTS notifications (
                position INTEGER PRIMARY KEY,
                notification_id TEXT NOT NULL,
                body TEXT NOT NULL
            )",
            [],
        )?;

        // Single row
        conn.execute(
            "CREATE TABLE IF NOT EXISTS sync_meta (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                unread_count INTEGER NOT NULL,
                saved_at TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_notifications_id ON notifications(notification_id)",
            [],
        )?;

        Ok(())
    }

    /// Replace the stored view with `snapshot`
    pub fn save_snapshot(&mut self, snapshot: &NotificationSnapshot) -> SqlResult<()> {
        let tx = self.db.connection_mut().transaction()?;
        tx.execute("DELETE FROM notifications", [])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO notifications (position, notification_id, body) VALUES (?1, ?2, ?3)",
            )?;
            for (position, notification) in snapshot.notifications.iter().enumerate() {
                let body = serde_json::to_string(notification)
                    .map_err(|err| rusqlite::Error::ToSqlConversionFailure(Box::new(err)))?;
                stmt.execute(params![
                    position as i64,
                    notification.notification_id.as_str(),
                    body
                ])?;
            }
        }
        tx.execute(
            "INSERT OR REPLACE INTO sync_meta (id, unread_count, saved_at) VALUES (1, ?1, ?2)",
            params![snapshot.unread_count as i64, Utc::now()],
        )?;
        tx.commit()
    }

    /// Load the stored view, if one was ever saved
    pub fn load_snapshot(&self) -> SqlResult<Option<CachedSnapshot>> {
        let conn = self.db.connection();
        let meta = conn
            .query_row(
                "SELECT unread_count, saved_at FROM sync_meta WHERE id = 1",
                [],
                |row| Ok((row.get::<_, i64>(0)?, row.get::<_, DateTime<Utc>>(1)?)),
            )
            .optional()?;

        let Some((unread_count, saved_at)) = meta else {
            return Ok(None);
        };

        let mut stmt = conn.prepare("SELECT body FROM notifications ORDER BY position ASC")?;
        let bodies = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<SqlResult<Vec<_>>>()?;

        // Bản ghi hỏng (ví dụ schema backend đổi) bị bỏ qua thay vì làm hỏng cả cache
        let notifications = bodies
            .iter()
            .filter_map(|body| match serde_json::from_str::<Notification>(body) {
                Ok(notification) => Some(notification),
                Err(err) => {
                    log::warn!("Dropping unreadable cached notification: {err}");
                    None
                }
            })
            .collect();

        Ok(Some(CachedSnapshot {
            notifications,
            unread_count: unread_count.max(0) as u64,
            saved_at,
        }))
    }

    /// Number of cached notifications
    pub fn count(&self) -> SqlResult<usize> {
        let conn = self.db.connection();
        let count: i64 =
            conn.query_row("SELECT COUNT(*) FROM notifications", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    pub fn clear(&self) -> SqlResult<()> {
        let conn = self.db.connection();
        conn.execute("DELETE FROM notifications", [])?;
        conn.execute("DELETE FROM sync_meta", [])?;
        Ok(())
    }
}
