//! Conversation and Thought stores (SQLite).
//!
//! One connection per call, schema created on open. Emotions and scores are kept as JSON text so
//! the row layout stays readable from the sqlite3 shell.

use chrono::{DateTime, Utc};
use mindease_core::EmotionResult;
use rusqlite::{params, Connection, OpenFlags, Row};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("encode emotions: {0}")]
    Json(#[from] serde_json::Error),
    #[error("store task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

#[derive(Clone)]
pub struct MindStore {
    db_path: PathBuf,
}

/// A chat exchange about to be written.
#[derive(Debug, Clone)]
pub struct NewConversation {
    pub session_id: String,
    pub user_message: String,
    pub bot_response: String,
    pub emotions: EmotionResult,
    pub timestamp: DateTime<Utc>,
}

/// A journal entry about to be written.
#[derive(Debug, Clone)]
pub struct NewThought {
    pub session_id: String,
    pub content: String,
    pub emotions: EmotionResult,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConversationRow {
    pub id: i64,
    pub session_id: String,
    pub user_message: String,
    pub bot_response: String,
    pub emotions: Vec<String>,
    pub emotion_scores: BTreeMap<String, f64>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ThoughtRow {
    pub id: i64,
    pub session_id: String,
    pub content: String,
    pub emotions: Vec<String>,
    pub emotion_scores: BTreeMap<String, f64>,
    pub timestamp: DateTime<Utc>,
}

fn labels_json(result: &EmotionResult) -> Result<String, serde_json::Error> {
    serde_json::to_string(&result.emotions)
}

fn scores_json(result: &EmotionResult) -> Result<String, serde_json::Error> {
    serde_json::to_string(&result.scores)
}

/// Stored JSON that no longer parses reads back as an empty collection.
fn decode_or_default<T: serde::de::DeserializeOwned + Default>(raw: Option<String>) -> T {
    raw.and_then(|s| serde_json::from_str(&s).ok())
        .unwrap_or_default()
}

fn conversation_from_row(row: &Row<'_>) -> rusqlite::Result<ConversationRow> {
    Ok(ConversationRow {
        id: row.get(0)?,
        session_id: row.get(1)?,
        user_message: row.get(2)?,
        bot_response: row.get(3)?,
        emotions: decode_or_default(row.get(4)?),
        emotion_scores: decode_or_default(row.get(5)?),
        timestamp: row.get(6)?,
    })
}

fn thought_from_row(row: &Row<'_>) -> rusqlite::Result<ThoughtRow> {
    Ok(ThoughtRow {
        id: row.get(0)?,
        session_id: row.get(1)?,
        content: row.get(2)?,
        emotions: decode_or_default(row.get(3)?),
        emotion_scores: decode_or_default(row.get(4)?),
        timestamp: row.get(5)?,
    })
}

impl MindStore {
    pub fn new(db_path: PathBuf) -> Result<Self, StoreError> {
        let this = Self { db_path };
        this.init()?;
        Ok(this)
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }

    fn open(&self) -> Result<Connection, rusqlite::Error> {
        Connection::open_with_flags(
            &self.db_path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE,
        )
    }

    fn init(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.db_path.parent() {
            if !parent.as_os_str().is_empty() {
                if let Err(e) = std::fs::create_dir_all(parent) {
                    tracing::warn!(
                        target: "mindease::store",
                        path = %parent.display(),
                        error = %e,
                        "could not create database directory"
                    );
                }
            }
        }
        let conn = self.open()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS conversations (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                session_id TEXT NOT NULL,
                user_message TEXT NOT NULL,
                bot_response TEXT NOT NULL,
                emotions TEXT NULL,
                emotion_scores TEXT NULL,
                timestamp TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_conversations_session_id ON conversations(session_id);
            CREATE INDEX IF NOT EXISTS idx_conversations_timestamp ON conversations(timestamp);

            CREATE TABLE IF NOT EXISTS thoughts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                session_id TEXT NOT NULL,
                content TEXT NOT NULL,
                emotions TEXT NULL,
                emotion_scores TEXT NULL,
                timestamp TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_thoughts_session_id ON thoughts(session_id);
            CREATE INDEX IF NOT EXISTS idx_thoughts_timestamp ON thoughts(timestamp);
            "#,
        )?;
        tracing::info!(target: "mindease::store", path = %self.db_path.display(), "store ready");
        Ok(())
    }

    /// Run a blocking store call on the blocking pool.
    pub async fn blocking<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&MindStore) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let store = self.clone();
        tokio::task::spawn_blocking(move || f(&store)).await?
    }

    pub fn insert_conversation(
        &self,
        new: &NewConversation,
    ) -> Result<ConversationRow, StoreError> {
        let emotions = labels_json(&new.emotions)?;
        let scores = scores_json(&new.emotions)?;
        let conn = self.open()?;
        conn.execute(
            r#"
            INSERT INTO conversations
                (session_id, user_message, bot_response, emotions, emotion_scores, timestamp)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                new.session_id,
                new.user_message,
                new.bot_response,
                emotions,
                scores,
                new.timestamp
            ],
        )?;
        let id = conn.last_insert_rowid();
        tracing::debug!(target: "mindease::store", id, "conversation stored");

        Ok(ConversationRow {
            id,
            session_id: new.session_id.clone(),
            user_message: new.user_message.clone(),
            bot_response: new.bot_response.clone(),
            emotions: new.emotions.emotions.iter().map(|e| e.to_string()).collect(),
            emotion_scores: new
                .emotions
                .scores
                .iter()
                .map(|(e, s)| (e.to_string(), *s))
                .collect(),
            timestamp: new.timestamp,
        })
    }

    /// Newest first, at most `limit` rows.
    pub fn recent_conversations(
        &self,
        session_id: &str,
        limit: usize,
    ) -> Result<Vec<ConversationRow>, StoreError> {
        let conn = self.open()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, session_id, user_message, bot_response, emotions, emotion_scores, timestamp
            FROM conversations
            WHERE session_id = ?1
            ORDER BY timestamp DESC, id DESC
            LIMIT ?2
            "#,
        )?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = stmt.query_map(params![session_id, limit], conversation_from_row)?;
        let mut out = Vec::new();
        for r in rows {
            out.push(r?);
        }
        Ok(out)
    }

    pub fn insert_thought(&self, new: &NewThought) -> Result<ThoughtRow, StoreError> {
        let emotions = labels_json(&new.emotions)?;
        let scores = scores_json(&new.emotions)?;
        let conn = self.open()?;
        conn.execute(
            r#"
            INSERT INTO thoughts (session_id, content, emotions, emotion_scores, timestamp)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![new.session_id, new.content, emotions, scores, new.timestamp],
        )?;
        let id = conn.last_insert_rowid();
        tracing::debug!(target: "mindease::store", id, "thought stored");

        Ok(ThoughtRow {
            id,
            session_id: new.session_id.clone(),
            content: new.content.clone(),
            emotions: new.emotions.emotions.iter().map(|e| e.to_string()).collect(),
            emotion_scores: new
                .emotions
                .scores
                .iter()
                .map(|(e, s)| (e.to_string(), *s))
                .collect(),
            timestamp: new.timestamp,
        })
    }

    /// Every thought of the session, newest first.
    pub fn thoughts_for_session(&self, session_id: &str) -> Result<Vec<ThoughtRow>, StoreError> {
        let conn = self.open()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, session_id, content, emotions, emotion_scores, timestamp
            FROM thoughts
            WHERE session_id = ?1
            ORDER BY timestamp DESC, id DESC
            "#,
        )?;
        let rows = stmt.query_map(params![session_id], thought_from_row)?;
        let mut out = Vec::new();
        for r in rows {
            out.push(r?);
        }
        Ok(out)
    }
}
