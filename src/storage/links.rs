//! Account links: which Telegram chat belongs to which web session user.

use rusqlite::{Connection, OptionalExtension};
use serde::Serialize;

/// A web session user linked to a Telegram chat
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountLink {
    /// Stable id of the authenticated web user (unique key)
    pub session_user_id: String,
    /// Telegram chat id, kept in string form
    pub chat_id: String,
    /// Telegram username at the time of linking, if known
    pub chat_username: Option<String>,
    /// RFC 3339 timestamp of the last write
    pub linked_at: String,
}

/// Inserts or replaces the link for `session_user_id`. Last writer wins.
pub fn upsert_link(
    conn: &Connection,
    session_user_id: &str,
    chat_id: &str,
    chat_username: Option<&str>,
) -> rusqlite::Result<()> {
    let linked_at = chrono::Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO account_links (session_user_id, chat_id, chat_username, linked_at)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(session_user_id) DO UPDATE SET
             chat_id = excluded.chat_id,
             chat_username = excluded.chat_username,
             linked_at = excluded.linked_at",
        rusqlite::params![session_user_id, chat_id, chat_username, linked_at],
    )?;
    Ok(())
}

/// Returns `Ok(None)` when the user has never linked a chat.
pub fn get_link(conn: &Connection, session_user_id: &str) -> rusqlite::Result<Option<AccountLink>> {
    conn.query_row(
        "SELECT session_user_id, chat_id, chat_username, linked_at
         FROM account_links WHERE session_user_id = ?1",
        rusqlite::params![session_user_id],
        |row| {
            Ok(AccountLink {
                session_user_id: row.get(0)?,
                chat_id: row.get(1)?,
                chat_username: row.get(2)?,
                linked_at: row.get(3)?,
            })
        },
    )
    .optional()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::migrations::run_migrations;
    use pretty_assertions::assert_eq;

    fn setup() -> Connection {
        let mut conn = Connection::open_in_memory().unwrap();
        run_migrations(&mut conn).unwrap();
        conn
    }

    #[test]
    fn test_get_link_not_found_is_none() {
        let conn = setup();
        assert_eq!(get_link(&conn, "nobody").unwrap(), None);
    }

    #[test]
    fn test_upsert_then_get() {
        let conn = setup();
        upsert_link(&conn, "user-42", "998877", Some("bo")).unwrap();

        let link = get_link(&conn, "user-42").unwrap().unwrap();
        assert_eq!(link.session_user_id, "user-42");
        assert_eq!(link.chat_id, "998877");
        assert_eq!(link.chat_username.as_deref(), Some("bo"));
    }

    #[test]
    fn test_upsert_last_writer_wins() {
        let conn = setup();
        upsert_link(&conn, "user-42", "998877", Some("bo")).unwrap();
        upsert_link(&conn, "user-42", "000111", None).unwrap();

        let link = get_link(&conn, "user-42").unwrap().unwrap();
        assert_eq!(link.chat_id, "000111");
        assert_eq!(link.chat_username, None);

        let rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM account_links", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 1);
    }
}
