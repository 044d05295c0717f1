use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, error, info};
use scylla::batch::Batch;
use scylla::frame::response::result::{CqlValue, Row};
use scylla::frame::value::CqlTimestamp;
use scylla::transport::errors::{NewSessionError, QueryError};
use scylla::{QueryResult, Session, SessionBuilder};
use uuid::Uuid;

use crate::models::{now_millis, Chirp, Page, User};
use crate::store::{ChirpStore, StoreError, StoreResult};

const SCHEMA: &str = include_str!("../schema.cql");

/// Partition key of `chirpy.chirp_timeline`; all chirps share it.
const TIMELINE_BUCKET: i32 = 0;

/// Undo an email claim whose user row was never written.
const RELEASE_EMAIL: &str = "DELETE FROM chirpy.users_by_email WHERE email = ? IF user_id = ?";

pub async fn create_session(nodes: &[String]) -> Result<Session, NewSessionError> {
    let mut builder = SessionBuilder::new();
    for node in nodes {
        builder = builder.known_node(node);
    }
    builder.build().await
}

/// Split `schema.cql` into executable statements, dropping `--` comments.
fn schema_statements() -> Vec<String> {
    let uncommented: String = SCHEMA
        .lines()
        .filter(|line| !line.trim_start().starts_with("--"))
        .collect::<Vec<_>>()
        .join("\n");
    uncommented
        .split(';')
        .map(str::trim)
        .filter(|statement| !statement.is_empty())
        .map(str::to_string)
        .collect()
}

pub async fn ensure_schema(session: &Session) -> Result<(), QueryError> {
    for statement in schema_statements() {
        debug!("Applying schema statement: {}", statement);
        session.query(statement, ()).await?;
    }
    info!("Schema is up to date");
    Ok(())
}

impl From<QueryError> for StoreError {
    fn from(err: QueryError) -> Self {
        StoreError::Backend(err.to_string())
    }
}

pub struct ScyllaStore {
    session: Arc<Session>,
}

impl ScyllaStore {
    pub fn new(session: Arc<Session>) -> Self {
        Self { session }
    }
}

fn to_cql(ts: DateTime<Utc>) -> CqlTimestamp {
    CqlTimestamp(ts.timestamp_millis())
}

fn column_uuid(value: Option<CqlValue>) -> Option<Uuid> {
    match value {
        Some(CqlValue::Uuid(id)) => Some(id),
        _ => None,
    }
}

fn column_text(value: Option<CqlValue>) -> Option<String> {
    match value {
        Some(CqlValue::Text(text)) => Some(text),
        _ => None,
    }
}

fn column_timestamp(value: Option<CqlValue>) -> Option<DateTime<Utc>> {
    match value {
        Some(CqlValue::Timestamp(ts)) => DateTime::<Utc>::from_timestamp_millis(ts.0),
        _ => None,
    }
}

/// Expects columns `chirp_id, user_id, body, created_at, updated_at`.
fn decode_chirp(row: Row) -> Option<Chirp> {
    let mut columns = row.columns.into_iter();
    Some(Chirp {
        id: column_uuid(columns.next().flatten())?,
        user_id: column_uuid(columns.next().flatten())?,
        body: column_text(columns.next().flatten())?,
        created_at: column_timestamp(columns.next().flatten())?,
        updated_at: column_timestamp(columns.next().flatten())?,
    })
}

fn decode_chirps(result: QueryResult) -> StoreResult<Vec<Chirp>> {
    result
        .rows
        .unwrap_or_default()
        .into_iter()
        .map(|row| {
            decode_chirp(row).ok_or_else(|| StoreError::Backend("malformed chirp row".to_string()))
        })
        .collect()
}

/// Both chirp rows in one logged batch, bound as `(chirps, chirp_timeline)`.
fn chirp_batch() -> Batch {
    let mut batch = Batch::default();
    batch.append_statement(
        "INSERT INTO chirpy.chirps (chirp_id, user_id, body, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
    );
    batch.append_statement(
        "INSERT INTO chirpy.chirp_timeline (bucket, created_at, chirp_id, user_id, body, updated_at) VALUES (?, ?, ?, ?, ?, ?)",
    );
    batch
}

/// Read the `[applied]` flag of a lightweight transaction.
fn lwt_applied(result: &QueryResult) -> bool {
    result
        .rows
        .as_ref()
        .and_then(|rows| rows.first())
        .and_then(|row| row.columns.first())
        .map_or(false, |applied| matches!(applied, Some(CqlValue::Boolean(true))))
}

#[async_trait]
impl ChirpStore for ScyllaStore {
    async fn create_user(&self, email: &str) -> StoreResult<User> {
        let user_id = Uuid::new_v4();
        let now = now_millis();

        let claim = self
            .session
            .query(
                "INSERT INTO chirpy.users_by_email (email, user_id) VALUES (?, ?) IF NOT EXISTS",
                (email, user_id),
            )
            .await?;
        if !lwt_applied(&claim) {
            return Err(StoreError::DuplicateEmail(email.to_string()));
        }

        let insert = self
            .session
            .query(
                "INSERT INTO chirpy.users (user_id, email, created_at, updated_at) VALUES (?, ?, ?, ?)",
                (user_id, email, to_cql(now), to_cql(now)),
            )
            .await;
        if let Err(err) = insert {
            if let Err(release) = self.session.query(RELEASE_EMAIL, (email, user_id)).await {
                error!("Could not release email claim for {email}: {release}");
            }
            return Err(err.into());
        }

        Ok(User {
            id: user_id,
            email: email.to_string(),
            created_at: now,
            updated_at: now,
        })
    }

    async fn create_chirp(&self, body: &str, user_id: Uuid) -> StoreResult<Chirp> {
        let owner = self
            .session
            .query("SELECT user_id FROM chirpy.users WHERE user_id = ?", (user_id,))
            .await?;
        if owner.rows.map_or(true, |rows| rows.is_empty()) {
            return Err(StoreError::UnknownUser(user_id));
        }

        let chirp_id = Uuid::new_v4();
        let now = now_millis();
        let ts = to_cql(now);

        self.session
            .batch(
                &chirp_batch(),
                (
                    (chirp_id, user_id, body, ts, ts),
                    (TIMELINE_BUCKET, ts, chirp_id, user_id, body, ts),
                ),
            )
            .await?;

        Ok(Chirp {
            id: chirp_id,
            body: body.to_string(),
            user_id,
            created_at: now,
            updated_at: now,
        })
    }

    async fn list_chirps(&self, page: Page) -> StoreResult<Vec<Chirp>> {
        // CQL has no OFFSET, so read through the end of the window and skip.
        let window = page.offset.saturating_add(page.limit);
        let fetch = i32::try_from(window).unwrap_or(i32::MAX);

        let result = self
            .session
            .query(
                "SELECT chirp_id, user_id, body, created_at, updated_at FROM chirpy.chirp_timeline WHERE bucket = ? LIMIT ?",
                (TIMELINE_BUCKET, fetch),
            )
            .await?;

        Ok(decode_chirps(result)?
            .into_iter()
            .skip(page.offset as usize)
            .collect())
    }

    async fn get_chirp(&self, id: Uuid) -> StoreResult<Chirp> {
        let result = self
            .session
            .query(
                "SELECT chirp_id, user_id, body, created_at, updated_at FROM chirpy.chirps WHERE chirp_id = ?",
                (id,),
            )
            .await?;

        decode_chirps(result)?
            .into_iter()
            .next()
            .ok_or(StoreError::NotFound)
    }

    async fn reset(&self) -> StoreResult<()> {
        for table in ["chirp_timeline", "chirps", "users_by_email", "users"] {
            self.session
                .query(format!("TRUNCATE chirpy.{table}"), ())
                .await?;
        }
        info!("Truncated chirpy tables");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scylla::batch::BatchType;

    #[test]
    fn schema_splits_into_statements_without_comments() {
        let statements = schema_statements();
        assert_eq!(statements.len(), 5);
        assert!(statements[0].starts_with("CREATE KEYSPACE IF NOT EXISTS chirpy"));
        assert!(statements.iter().all(|s| !s.contains("--")));
    }

    #[test]
    fn decodes_complete_chirp_rows() {
        let id = Uuid::new_v4();
        let user_id = Uuid::new_v4();
        let row = Row {
            columns: vec![
                Some(CqlValue::Uuid(id)),
                Some(CqlValue::Uuid(user_id)),
                Some(CqlValue::Text("hello".to_string())),
                Some(CqlValue::Timestamp(CqlTimestamp(1_700_000_000_000))),
                Some(CqlValue::Timestamp(CqlTimestamp(1_700_000_000_500))),
            ],
        };

        let chirp = decode_chirp(row).expect("decodes");
        assert_eq!(chirp.id, id);
        assert_eq!(chirp.user_id, user_id);
        assert_eq!(chirp.body, "hello");
        assert_eq!(chirp.created_at.timestamp_millis(), 1_700_000_000_000);
        assert_eq!(chirp.updated_at.timestamp_millis(), 1_700_000_000_500);
    }

    #[test]
    fn chirp_rows_are_written_in_one_logged_batch() {
        let batch = chirp_batch();
        assert_eq!(batch.get_type(), BatchType::Logged);
        assert_eq!(batch.statements.len(), 2);
    }

    #[test]
    fn email_release_is_conditional_on_the_claimant() {
        assert!(RELEASE_EMAIL.starts_with("DELETE FROM chirpy.users_by_email"));
        assert!(RELEASE_EMAIL.ends_with("IF user_id = ?"));
    }

    #[test]
    fn rejects_rows_with_missing_columns() {
        let row = Row {
            columns: vec![Some(CqlValue::Uuid(Uuid::new_v4())), None],
        };
        assert!(decode_chirp(row).is_none());
    }
}
