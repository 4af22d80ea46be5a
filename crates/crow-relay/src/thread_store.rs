//! Durable mapping of conversation contexts to remote threads, plus a transcript log.

use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use crow_assistants::MessageRole;
use rusqlite::{params, Connection, OptionalExtension};
use thiserror::Error;

/// Errors returned by thread store implementations.
#[derive(Debug, Error)]
pub enum ThreadStoreError {
    #[error("thread store lock is poisoned")]
    Poisoned,
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type ThreadStoreResult<T> = Result<T, ThreadStoreError>;

#[derive(Debug, Clone, PartialEq, Eq)]
/// One message exchanged through the relay, as recorded in the transcript log.
pub struct MessageRecord {
    pub thread_id: String,
    pub role: MessageRole,
    pub message_id: String,
    pub content: String,
}

#[async_trait]
/// Persistence seam for context → thread mappings.
pub trait ThreadStore: Send + Sync {
    async fn load_thread(&self, context_id: &str) -> ThreadStoreResult<Option<String>>;

    /// Upserts the mapping for `context_id`.
    async fn save_thread(&self, context_id: &str, thread_id: &str) -> ThreadStoreResult<()>;

    async fn record_message(&self, record: &MessageRecord) -> ThreadStoreResult<()>;
}

/// Transcript records kept by [`InMemoryThreadStore`] before the oldest are dropped.
pub const DEFAULT_TRANSCRIPT_CAPACITY: usize = 256;

/// Process-lifetime store; mappings vanish on restart.
///
/// The transcript is a ring buffer of the most recent records. A capacity of
/// zero disables transcript recording.
#[derive(Debug)]
pub struct InMemoryThreadStore {
    threads: Mutex<HashMap<String, String>>,
    messages: Mutex<VecDeque<MessageRecord>>,
    transcript_capacity: usize,
}

impl Default for InMemoryThreadStore {
    fn default() -> Self {
        Self::with_transcript_capacity(DEFAULT_TRANSCRIPT_CAPACITY)
    }
}

impl InMemoryThreadStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_transcript_capacity(transcript_capacity: usize) -> Self {
        Self {
            threads: Mutex::new(HashMap::new()),
            messages: Mutex::new(VecDeque::with_capacity(transcript_capacity.min(1024))),
            transcript_capacity,
        }
    }

    pub fn transcript_capacity(&self) -> usize {
        self.transcript_capacity
    }

    /// Retained transcript, oldest first.
    pub fn messages(&self) -> Vec<MessageRecord> {
        self.messages
            .lock()
            .map(|messages| messages.iter().cloned().collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ThreadStore for InMemoryThreadStore {
    async fn load_thread(&self, context_id: &str) -> ThreadStoreResult<Option<String>> {
        let threads = self.threads.lock().map_err(|_| ThreadStoreError::Poisoned)?;
        Ok(threads.get(context_id).cloned())
    }

    async fn save_thread(&self, context_id: &str, thread_id: &str) -> ThreadStoreResult<()> {
        let mut threads = self.threads.lock().map_err(|_| ThreadStoreError::Poisoned)?;
        threads.insert(context_id.to_string(), thread_id.to_string());
        Ok(())
    }

    async fn record_message(&self, record: &MessageRecord) -> ThreadStoreResult<()> {
        if self.transcript_capacity == 0 {
            return Ok(());
        }
        let mut messages = self
            .messages
            .lock()
            .map_err(|_| ThreadStoreError::Poisoned)?;
        while messages.len() >= self.transcript_capacity {
            messages.pop_front();
        }
        messages.push_back(record.clone());
        Ok(())
    }
}

/// SQLite-backed store that survives restarts.
#[derive(Debug)]
pub struct SqliteThreadStore {
    db_path: PathBuf,
}

impl SqliteThreadStore {
    /// Opens (or creates) the database at `path` and ensures the schema exists.
    pub fn new(path: impl AsRef<Path>) -> ThreadStoreResult<Self> {
        let db_path = path.as_ref().to_path_buf();
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let store = Self { db_path };
        let connection = store.open_connection()?;
        store.initialize_schema(&connection)?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }

    fn open_connection(&self) -> ThreadStoreResult<Connection> {
        let connection = Connection::open(&self.db_path)?;
        connection.busy_timeout(Duration::from_secs(5))?;
        connection.execute_batch(
            r#"
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            "#,
        )?;
        Ok(connection)
    }

    fn initialize_schema(&self, connection: &Connection) -> ThreadStoreResult<()> {
        connection.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS threads (
                context_id TEXT PRIMARY KEY,
                thread_id TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS messages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                thread_id TEXT NOT NULL,
                role TEXT NOT NULL,
                message_id TEXT NOT NULL,
                content TEXT NOT NULL,
                recorded_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_messages_thread ON messages (thread_id, id);
            "#,
        )?;
        Ok(())
    }

    /// Transcript of `thread_id` in insertion order.
    pub fn messages_for_thread(&self, thread_id: &str) -> ThreadStoreResult<Vec<MessageRecord>> {
        let connection = self.open_connection()?;
        let mut statement = connection.prepare(
            "SELECT thread_id, role, message_id, content FROM messages WHERE thread_id = ?1 ORDER BY id",
        )?;
        let rows = statement.query_map(params![thread_id], |row| {
            let role: String = row.get(1)?;
            Ok(MessageRecord {
                thread_id: row.get(0)?,
                role: if role == MessageRole::Assistant.as_str() {
                    MessageRole::Assistant
                } else {
                    MessageRole::User
                },
                message_id: row.get(2)?,
                content: row.get(3)?,
            })
        })?;
        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }
}

#[async_trait]
impl ThreadStore for SqliteThreadStore {
    async fn load_thread(&self, context_id: &str) -> ThreadStoreResult<Option<String>> {
        let connection = self.open_connection()?;
        let thread_id = connection
            .query_row(
                "SELECT thread_id FROM threads WHERE context_id = ?1",
                params![context_id],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(thread_id)
    }

    async fn save_thread(&self, context_id: &str, thread_id: &str) -> ThreadStoreResult<()> {
        let connection = self.open_connection()?;
        connection.execute(
            "INSERT INTO threads (context_id, thread_id) VALUES (?1, ?2)
             ON CONFLICT (context_id) DO UPDATE SET thread_id = excluded.thread_id",
            params![context_id, thread_id],
        )?;
        Ok(())
    }

    async fn record_message(&self, record: &MessageRecord) -> ThreadStoreResult<()> {
        let connection = self.open_connection()?;
        connection.execute(
            "INSERT INTO messages (thread_id, role, message_id, content, recorded_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                record.thread_id,
                record.role.as_str(),
                record.message_id,
                record.content,
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }
}
