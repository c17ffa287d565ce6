//! Conversation memory persistence.
//!
//! # Responsibility
//! - Store learned preference signals, keyword frequencies and interaction
//!   records.
//!
//! # Invariants
//! - Preference updates are read-modify-write inside one transaction and
//!   follow `PreferenceSignal::observe`.
//! - Interaction records carry a UUID assigned before insert.

use crate::model::preference::{KeywordMemory, PreferenceSignal};
use crate::model::task::TaskId;
use crate::repo::{RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One stored assistant interaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionRecord {
    pub id: Uuid,
    pub input_text: String,
    pub intent: String,
    pub outcome: String,
    pub task_id: Option<TaskId>,
}

impl InteractionRecord {
    pub fn new(
        input_text: impl Into<String>,
        intent: impl Into<String>,
        outcome: impl Into<String>,
        task_id: Option<TaskId>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            input_text: input_text.into(),
            intent: intent.into(),
            outcome: outcome.into(),
            task_id,
        }
    }
}

/// Repository interface for conversation memory.
pub trait MemoryStore {
    fn load_preferences(&self) -> RepoResult<Vec<PreferenceSignal>>;
    fn get_preference(&self, key: &str) -> RepoResult<Option<PreferenceSignal>>;
    /// Folds one observation into the stored signal and returns the result.
    fn observe_preference(&self, key: &str, value: &str) -> RepoResult<PreferenceSignal>;
    fn record_keyword(&self, keyword: &str, category: &str, context: &str) -> RepoResult<()>;
    /// Most frequent keywords, optionally restricted to one category.
    fn top_keywords(&self, category: Option<&str>, limit: u32) -> RepoResult<Vec<KeywordMemory>>;
    fn record_interaction(&self, record: &InteractionRecord) -> RepoResult<()>;
    /// Newest first.
    fn recent_interactions(&self, limit: u32) -> RepoResult<Vec<InteractionRecord>>;
}

/// SQLite-backed memory store.
pub struct SqliteMemoryStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteMemoryStore<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl MemoryStore for SqliteMemoryStore<'_> {
    fn load_preferences(&self) -> RepoResult<Vec<PreferenceSignal>> {
        let mut stmt = self.conn.prepare(
            "SELECT key, value, confidence, observations
             FROM user_preferences
             ORDER BY key ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut signals = Vec::new();

        while let Some(row) = rows.next()? {
            signals.push(parse_preference_row(row)?);
        }

        Ok(signals)
    }

    fn get_preference(&self, key: &str) -> RepoResult<Option<PreferenceSignal>> {
        let mut stmt = self.conn.prepare(
            "SELECT key, value, confidence, observations
             FROM user_preferences
             WHERE key = ?1;",
        )?;
        let mut rows = stmt.query([key])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_preference_row(row)?));
        }

        Ok(None)
    }

    fn observe_preference(&self, key: &str, value: &str) -> RepoResult<PreferenceSignal> {
        let tx = self.conn.unchecked_transaction()?;
        let current = tx
            .query_row(
                "SELECT key, value, confidence, observations
                 FROM user_preferences
                 WHERE key = ?1;",
                [key],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, f64>(2)?,
                        row.get::<_, i64>(3)?,
                    ))
                },
            )
            .optional()?;

        let next = match current {
            Some((key, stored_value, confidence, observations)) => {
                signal_from_parts(key, stored_value, confidence, observations)?.observe(value)
            }
            None => PreferenceSignal::first(key, value),
        };

        tx.execute(
            "INSERT INTO user_preferences (key, value, confidence, observations)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                confidence = excluded.confidence,
                observations = excluded.observations,
                updated_at = strftime('%Y-%m-%d %H:%M:%S', 'now', 'localtime');",
            params![
                next.key.as_str(),
                next.value.as_str(),
                next.confidence,
                i64::from(next.observations),
            ],
        )?;
        tx.commit()?;

        Ok(next)
    }

    fn record_keyword(&self, keyword: &str, category: &str, context: &str) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO keyword_memory (keyword, category, frequency, last_context)
             VALUES (?1, ?2, 1, ?3)
             ON CONFLICT(keyword, category) DO UPDATE SET
                frequency = frequency + 1,
                last_context = excluded.last_context,
                updated_at = strftime('%Y-%m-%d %H:%M:%S', 'now', 'localtime');",
            params![keyword, category, context],
        )?;
        Ok(())
    }

    fn top_keywords(&self, category: Option<&str>, limit: u32) -> RepoResult<Vec<KeywordMemory>> {
        let mut stmt = self.conn.prepare(
            "SELECT keyword, category, frequency, last_context
             FROM keyword_memory
             WHERE (?1 IS NULL OR category = ?1)
             ORDER BY frequency DESC, keyword ASC
             LIMIT ?2;",
        )?;
        let mut rows = stmt.query(params![category, limit])?;
        let mut keywords = Vec::new();

        while let Some(row) = rows.next()? {
            let frequency: i64 = row.get(2)?;
            keywords.push(KeywordMemory {
                keyword: row.get(0)?,
                category: row.get(1)?,
                frequency: u32::try_from(frequency).map_err(|_| {
                    RepoError::InvalidData(format!(
                        "invalid frequency `{frequency}` in keyword_memory.frequency"
                    ))
                })?,
                last_context: row.get(3)?,
            });
        }

        Ok(keywords)
    }

    fn record_interaction(&self, record: &InteractionRecord) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO conversation_records (id, input_text, intent, outcome, task_id)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                record.id.to_string(),
                record.input_text.as_str(),
                record.intent.as_str(),
                record.outcome.as_str(),
                record.task_id,
            ],
        )?;
        Ok(())
    }

    fn recent_interactions(&self, limit: u32) -> RepoResult<Vec<InteractionRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, input_text, intent, outcome, task_id
             FROM conversation_records
             ORDER BY created_at DESC, rowid DESC
             LIMIT ?1;",
        )?;
        let mut rows = stmt.query([limit])?;
        let mut records = Vec::new();

        while let Some(row) = rows.next()? {
            let id_text: String = row.get(0)?;
            let id = Uuid::parse_str(&id_text).map_err(|_| {
                RepoError::InvalidData(format!(
                    "invalid uuid value `{id_text}` in conversation_records.id"
                ))
            })?;
            records.push(InteractionRecord {
                id,
                input_text: row.get(1)?,
                intent: row.get(2)?,
                outcome: row.get(3)?,
                task_id: row.get(4)?,
            });
        }

        Ok(records)
    }
}

fn parse_preference_row(row: &Row<'_>) -> RepoResult<PreferenceSignal> {
    signal_from_parts(row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)
}

fn signal_from_parts(
    key: String,
    value: String,
    confidence: f64,
    observations: i64,
) -> RepoResult<PreferenceSignal> {
    if !(0.0..=1.0).contains(&confidence) {
        return Err(RepoError::InvalidData(format!(
            "invalid confidence `{confidence}` for preference `{key}`"
        )));
    }
    let observations = u32::try_from(observations)
        .ok()
        .filter(|count| *count > 0)
        .ok_or_else(|| {
            RepoError::InvalidData(format!(
                "invalid observation count `{observations}` for preference `{key}`"
            ))
        })?;

    Ok(PreferenceSignal {
        key,
        value,
        confidence,
        observations,
    })
}
