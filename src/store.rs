use crate::{
    chat::ChatMessage,
    entity::Author,
    error::{Error, Result as IngestResult},
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{sqlite::SqliteConnectOptions, ConnectOptions, Row, SqlitePool};
use std::path::Path;

/// Destination for extracted chat messages.
///
/// Implementations must reject a second insert with an already stored id
/// with [`Error::Duplicate`] instead of overwriting it.
#[async_trait]
pub trait MessageSink: Send + Sync {
    async fn insert(&self, video_id: &str, msg: &ChatMessage) -> IngestResult<()>;
}

#[derive(Clone, Debug)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Open the chat database at `db_path`, creating the file and any
    /// missing parent directories.
    pub async fn new(db_path: impl AsRef<Path>) -> Result<Self> {
        let db_path = db_path.as_ref();

        if let Some(dir) = db_path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .log_statements(tracing::log::LevelFilter::Trace);

        let pool = SqlitePool::connect_with(options)
            .await
            .with_context(|| format!("Failed to open chat database {}", db_path.display()))?;

        Ok(Self { pool })
    }

    /// Initialize the database schema.
    pub async fn init(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS chat_messages (
                id TEXT PRIMARY KEY NOT NULL,
                videoId TEXT NOT NULL,
                authorName TEXT NOT NULL,
                authorChannelId TEXT NOT NULL,
                text TEXT NOT NULL,
                timestamp INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_chat_messages_video_timestamp ON chat_messages(videoId, timestamp);
            "#,
        )
        .execute(&self.pool)
        .await
        .context("Failed to initialize database schema")?;

        Ok(())
    }

    /// Look up a single stored message by id.
    pub async fn get_message(&self, id: &str) -> Result<Option<ChatMessage>> {
        let row = sqlx::query(
            r#"
            SELECT id, videoId, authorName, authorChannelId, text, timestamp
            FROM chat_messages
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch message")?;

        row.map(|row| message_from_row(&row)).transpose()
    }

    /// Retrieve the latest messages of one stream.
    /// Returns messages ordered by timestamp ascending (oldest to newest).
    pub async fn history(&self, video_id: &str, limit: i64) -> Result<Vec<ChatMessage>> {
        let rows = sqlx::query(
            r#"
            SELECT id, videoId, authorName, authorChannelId, text, timestamp
            FROM chat_messages
            WHERE videoId = ?
            ORDER BY timestamp DESC
            LIMIT ?
            "#,
        )
        .bind(video_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch chat history")?;

        let mut messages = rows
            .iter()
            .map(message_from_row)
            .collect::<Result<Vec<_>>>()?;

        // Return in chronological order (oldest -> newest)
        messages.reverse();

        Ok(messages)
    }

    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM chat_messages")
            .fetch_one(&self.pool)
            .await
            .context("Failed to count messages")?;
        Ok(count)
    }
}

#[async_trait]
impl MessageSink for Store {
    /// Save a chat message. The author photo URL is not persisted.
    async fn insert(&self, video_id: &str, msg: &ChatMessage) -> IngestResult<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO chat_messages (id, videoId, authorName, authorChannelId, text, timestamp)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&msg.id)
        .bind(video_id)
        .bind(&msg.author.name)
        .bind(&msg.author.channel_id)
        .bind(&msg.text)
        .bind(msg.timestamp_ms)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(Error::Duplicate {
                id: msg.id.clone(),
            }),
            Err(e) => Err(Error::Storage(e)),
        }
    }
}

fn message_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<ChatMessage> {
    Ok(ChatMessage {
        id: row.try_get("id")?,
        video_id: row.try_get("videoId")?,
        author: Author::new(
            row.try_get::<String, _>("authorName")?,
            row.try_get::<String, _>("authorChannelId")?,
        ),
        text: row.try_get("text")?,
        timestamp_ms: row.try_get("timestamp")?,
    })
}
