use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS messages (
            id              TEXT PRIMARY KEY,
            identity_hash   TEXT NOT NULL,
            content         TEXT NOT NULL,
            status          TEXT NOT NULL DEFAULT 'pending'
                            CHECK (status IN ('pending', 'approved', 'hidden')),
            created_at      TEXT NOT NULL DEFAULT (datetime('now')),
            approved_at     TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_messages_status
            ON messages(status, created_at);

        -- Sliding-window rate limiting: one row per accepted submission,
        -- pruned as the window rolls over.
        CREATE TABLE IF NOT EXISTS rate_events (
            client_key  TEXT NOT NULL,
            at          INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_rate_events_key
            ON rate_events(client_key, at);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
