use crate::Database;
use crate::models::MessageRow;
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension};

const MESSAGE_COLUMNS: &str = "id, identity_hash, content, status, created_at, approved_at";

impl Database {
    // -- Messages --

    /// Insert a new message in the `pending` state. `created_at` is set by
    /// the store; `approved_at` starts null.
    pub fn insert_message(&self, id: &str, identity_hash: &str, content: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO messages (id, identity_hash, content, status) VALUES (?1, ?2, ?3, 'pending')",
                rusqlite::params![id, identity_hash, content],
            )?;
            Ok(())
        })
    }

    pub fn get_message(&self, id: &str) -> Result<Option<MessageRow>> {
        self.with_conn(|conn| query_message(conn, id))
    }

    /// All messages, newest first. Dashboard view — every status included.
    pub fn list_messages(&self) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {MESSAGE_COLUMNS} FROM messages ORDER BY created_at DESC, rowid DESC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([], row_to_message)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Approved messages only, most recently approved first. Public feed.
    pub fn list_approved(&self, limit: u32) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {MESSAGE_COLUMNS} FROM messages
                 WHERE status = 'approved'
                 ORDER BY approved_at DESC, rowid DESC
                 LIMIT ?1"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([limit], row_to_message)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Atomically set status and approved_at together, then return the
    /// updated row. `None` means no such message. Setting the current status
    /// again simply rewrites the row — a no-op success.
    pub fn update_status(
        &self,
        id: &str,
        status: &str,
        approved_at: Option<&str>,
    ) -> Result<Option<MessageRow>> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE messages SET status = ?2, approved_at = ?3 WHERE id = ?1",
                rusqlite::params![id, status, approved_at],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            query_message(conn, id)
        })
    }

    // -- Rate limiting --

    /// Sliding-window check-and-record. Prunes events older than the window,
    /// counts the remainder for this key, and records the new event only if
    /// the caller is still under `max`. One locked connection scope, so the
    /// count and the insert cannot interleave with another request's.
    pub fn rate_allow(&self, client_key: &str, now: i64, window_secs: i64, max: u32) -> Result<bool> {
        self.with_conn(|conn| {
            let cutoff = now - window_secs;
            conn.execute(
                "DELETE FROM rate_events WHERE client_key = ?1 AND at <= ?2",
                rusqlite::params![client_key, cutoff],
            )?;

            let count: u32 = conn.query_row(
                "SELECT COUNT(*) FROM rate_events WHERE client_key = ?1",
                [client_key],
                |row| row.get(0),
            )?;

            if count >= max {
                return Ok(false);
            }

            conn.execute(
                "INSERT INTO rate_events (client_key, at) VALUES (?1, ?2)",
                rusqlite::params![client_key, now],
            )?;
            Ok(true)
        })
    }
}

fn query_message(conn: &Connection, id: &str) -> Result<Option<MessageRow>> {
    let sql = format!("SELECT {MESSAGE_COLUMNS} FROM messages WHERE id = ?1");
    let mut stmt = conn.prepare(&sql)?;
    let row = stmt.query_row([id], row_to_message).optional()?;
    Ok(row)
}

fn row_to_message(row: &rusqlite::Row<'_>) -> rusqlite::Result<MessageRow> {
    Ok(MessageRow {
        id: row.get(0)?,
        identity_hash: row.get(1)?,
        content: row.get(2)?,
        status: row.get(3)?,
        created_at: row.get(4)?,
        approved_at: row.get(5)?,
    })
}
