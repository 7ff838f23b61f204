//! Conversation persistence, SQLite backed.
//!
//! Storage: `<home>/db.sqlite` (configurable).
//!
//! Two tables: `conversations` and `messages`.  Rows are append-only at
//! runtime; the only destructive operation is [`SqliteStore::reset`],
//! which backs the `db reset` maintenance command.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ChatError;

/// Author of a single turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    User,
    Ai,
}

impl MessageType {
    pub fn as_str(self) -> &'static str {
        match self {
            MessageType::User => "user",
            MessageType::Ai => "ai",
        }
    }

    /// Anything other than `"user"` is treated as an AI turn.
    fn from_column(raw: Option<&str>) -> Self {
        match raw {
            Some("user") => MessageType::User,
            _ => MessageType::Ai,
        }
    }
}

/// One prior turn as handed to the agent and returned to the UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(rename = "type")]
    pub kind: MessageType,
    pub text: String,
}

impl HistoryEntry {
    pub fn new(kind: MessageType, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}

/// Durable owner of conversations and messages.
///
/// Each operation touches a single row; callers sequence them.
#[async_trait]
pub trait ChatStore: Send + Sync {
    /// Insert a new conversation and return its generated id (always > 0).
    async fn create_conversation(&self) -> Result<i64, ChatError>;

    /// Append one message to `conversation_id`.
    ///
    /// The id is not checked against `conversations` here; the foreign
    /// key constraint is the only enforcement.
    async fn append_message(
        &self,
        conversation_id: i64,
        kind: MessageType,
        text: &str,
    ) -> Result<(), ChatError>;

    /// All messages of `conversation_id` in insertion order.
    async fn load_history(&self, conversation_id: i64) -> Result<Vec<HistoryEntry>, ChatError>;
}

/// Reject ids the database should never hand back.
pub(crate) fn checked_conversation_id(raw: i64) -> Result<i64, ChatError> {
    if raw <= 0 {
        return Err(ChatError::Persistence(format!(
            "failed to obtain a valid conversation id from database (got {raw})"
        )));
    }
    Ok(raw)
}

/// SQLite implementation of [`ChatStore`].
///
/// The connection is shared behind a mutex and every query runs on the
/// blocking pool.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open (or create) the database at `db_path` and ensure the schema.
    pub fn open(db_path: &Path) -> anyhow::Result<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(db_path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        Self::from_connection(conn)
    }

    /// Private in-memory database.
    pub fn open_in_memory() -> anyhow::Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> anyhow::Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        migrate(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `f` against the connection on the blocking pool.
    async fn run<T, F>(&self, op: &'static str, f: F) -> Result<T, ChatError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, ChatError> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn
                .lock()
                .map_err(|_| ChatError::Persistence(format!("{op}: database lock poisoned")))?;
            f(&guard)
        })
        .await
        .map_err(|e| ChatError::Persistence(format!("{op}: blocking task failed: {e}")))?
    }

    /// Delete every message and conversation.  Maintenance only.
    pub async fn reset(&self) -> Result<(usize, usize), ChatError> {
        self.run("reset", |conn| {
            let messages = conn.execute("DELETE FROM messages", [])?;
            let conversations = conn.execute("DELETE FROM conversations", [])?;
            Ok((messages, conversations))
        })
        .await
    }

    /// Total number of conversations.
    pub async fn conversation_count(&self) -> Result<usize, ChatError> {
        self.run("conversation_count", |conn| {
            let n: i64 = conn.query_row("SELECT COUNT(*) FROM conversations", [], |r| r.get(0))?;
            Ok(n as usize)
        })
        .await
    }

    /// Number of messages stored for `conversation_id`.
    pub async fn message_count(&self, conversation_id: i64) -> Result<usize, ChatError> {
        self.run("message_count", move |conn| {
            let n: i64 = conn.query_row(
                "SELECT COUNT(*) FROM messages WHERE conversation_id = ?1",
                params![conversation_id],
                |r| r.get(0),
            )?;
            Ok(n as usize)
        })
        .await
    }

    /// Creation timestamp of a conversation, if it exists.
    pub async fn conversation_created_at(
        &self,
        conversation_id: i64,
    ) -> Result<Option<String>, ChatError> {
        self.run("conversation_created_at", move |conn| {
            let ts = conn
                .query_row(
                    "SELECT created_at FROM conversations WHERE id = ?1",
                    params![conversation_id],
                    |r| r.get::<_, Option<String>>(0),
                )
                .optional()?;
            Ok(ts.flatten())
        })
        .await
    }
}

fn migrate(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS conversations (
            id         INTEGER PRIMARY KEY AUTOINCREMENT,
            created_at TEXT
        );
        CREATE TABLE IF NOT EXISTS messages (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            conversation_id INTEGER,
            type            TEXT,
            text            TEXT,
            created_at      TEXT,
            FOREIGN KEY (conversation_id) REFERENCES conversations(id)
        );
        CREATE INDEX IF NOT EXISTS messages_conversation_idx
            ON messages(conversation_id, id);",
    )
}

#[async_trait]
impl ChatStore for SqliteStore {
    async fn create_conversation(&self) -> Result<i64, ChatError> {
        let id = self
            .run("create_conversation", |conn| {
                let ts = chrono::Utc::now().to_rfc3339();
                conn.execute(
                    "INSERT INTO conversations (created_at) VALUES (?1)",
                    params![ts],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await?;
        let id = checked_conversation_id(id)?;
        debug!(conversation_id = id, "conversation created");
        Ok(id)
    }

    async fn append_message(
        &self,
        conversation_id: i64,
        kind: MessageType,
        text: &str,
    ) -> Result<(), ChatError> {
        let text = text.to_string();
        self.run("append_message", move |conn| {
            let ts = chrono::Utc::now().to_rfc3339();
            conn.execute(
                "INSERT INTO messages (conversation_id, type, text, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![conversation_id, kind.as_str(), text, ts],
            )?;
            Ok(())
        })
        .await?;
        debug!(conversation_id, kind = kind.as_str(), "message appended");
        Ok(())
    }

    async fn load_history(&self, conversation_id: i64) -> Result<Vec<HistoryEntry>, ChatError> {
        self.run("load_history", move |conn| {
            let mut stmt = conn.prepare(
                "SELECT type, text FROM messages WHERE conversation_id = ?1 ORDER BY id ASC",
            )?;
            let rows = stmt.query_map(params![conversation_id], |row| {
                let kind: Option<String> = row.get(0)?;
                let text: Option<String> = row.get(1)?;
                Ok(HistoryEntry {
                    kind: MessageType::from_column(kind.as_deref()),
                    text: text.unwrap_or_default(),
                })
            })?;
            let mut history = Vec::new();
            for row in rows {
                history.push(row?);
            }
            Ok(history)
        })
        .await
    }
}

// ── Tests ───────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> (tempfile::TempDir, SqliteStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::open(&dir.path().join("db.sqlite")).unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn conversation_ids_are_positive_and_increasing() {
        let (_dir, store) = temp_store();
        let a = store.create_conversation().await.unwrap();
        let b = store.create_conversation().await.unwrap();
        assert!(a > 0);
        assert!(b > a);
        assert_eq!(store.conversation_count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn created_at_is_recorded() {
        let (_dir, store) = temp_store();
        let id = store.create_conversation().await.unwrap();
        let ts = store.conversation_created_at(id).await.unwrap().unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(&ts).is_ok());
        assert!(store.conversation_created_at(id + 100).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn history_preserves_append_order() {
        let (_dir, store) = temp_store();
        let id = store.create_conversation().await.unwrap();
        let turns = [
            (MessageType::User, "hi"),
            (MessageType::Ai, "hello"),
            (MessageType::User, "find me a job"),
            (MessageType::User, "a remote one"),
            (MessageType::Ai, "here are three"),
        ];
        for (kind, text) in turns {
            store.append_message(id, kind, text).await.unwrap();
        }
        let history = store.load_history(id).await.unwrap();
        let got: Vec<(MessageType, &str)> =
            history.iter().map(|h| (h.kind, h.text.as_str())).collect();
        assert_eq!(got, turns.to_vec());
    }

    #[tokio::test]
    async fn history_is_scoped_to_conversation() {
        let (_dir, store) = temp_store();
        let a = store.create_conversation().await.unwrap();
        let b = store.create_conversation().await.unwrap();
        store.append_message(a, MessageType::User, "for a").await.unwrap();
        store.append_message(b, MessageType::User, "for b").await.unwrap();

        let history = store.load_history(a).await.unwrap();
        assert_eq!(history, vec![HistoryEntry::new(MessageType::User, "for a")]);
        assert_eq!(store.message_count(b).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn empty_history_for_unknown_conversation() {
        let (_dir, store) = temp_store();
        assert!(store.load_history(42).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn dangling_conversation_id_is_rejected() {
        let (_dir, store) = temp_store();
        let err = store
            .append_message(999, MessageType::User, "orphan")
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::Persistence(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn text_is_stored_verbatim() {
        let (_dir, store) = temp_store();
        let id = store.create_conversation().await.unwrap();
        let raw = "<script>alert('x')</script>\n\u{1F600} \"quoted\" ''";
        store.append_message(id, MessageType::Ai, raw).await.unwrap();
        assert_eq!(store.load_history(id).await.unwrap()[0].text, raw);
    }

    #[tokio::test]
    async fn reset_wipes_everything() {
        let (_dir, store) = temp_store();
        let id = store.create_conversation().await.unwrap();
        store.append_message(id, MessageType::User, "x").await.unwrap();
        store.append_message(id, MessageType::Ai, "y").await.unwrap();

        let (messages, conversations) = store.reset().await.unwrap();
        assert_eq!((messages, conversations), (2, 1));
        assert_eq!(store.conversation_count().await.unwrap(), 0);
        assert!(store.load_history(id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn reopen_keeps_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/db.sqlite");
        let id = {
            let store = SqliteStore::open(&path).unwrap();
            let id = store.create_conversation().await.unwrap();
            store.append_message(id, MessageType::User, "persist me").await.unwrap();
            id
        };
        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(store.load_history(id).await.unwrap()[0].text, "persist me");
    }

    #[test]
    fn non_positive_ids_are_persistence_errors() {
        assert!(matches!(checked_conversation_id(0), Err(ChatError::Persistence(_))));
        assert!(matches!(checked_conversation_id(-3), Err(ChatError::Persistence(_))));
        assert_eq!(checked_conversation_id(7).unwrap(), 7);
    }

    #[test]
    fn history_entry_wire_shape() {
        let entry = HistoryEntry::new(MessageType::Ai, "hey");
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json, serde_json::json!({ "type": "ai", "text": "hey" }));
    }

    #[test]
    fn unknown_type_column_reads_as_ai() {
        assert_eq!(MessageType::from_column(Some("user")), MessageType::User);
        assert_eq!(MessageType::from_column(Some("assistant")), MessageType::Ai);
        assert_eq!(MessageType::from_column(None), MessageType::Ai);
    }
}
