//! Durable home of sessions, challenges, VTXOs, balances and invoices.
//!
//! Every write spanning multiple entities runs in a single SQLite
//! transaction; invariants that can be expressed as check constraints live
//! in the schema (see `migrations/`). Compound operations that pair a state
//! transition with its compensating writes (failing a session releases its
//! reservations, committing marks them spent) are defined here so callers
//! cannot get the pairing wrong.

use relay_core::now_unix;
use relay_core::Error;
use relay_core::ErrorKind;
use relay_core::SessionResult;
use relay_core::SessionState;
use relay_core::SigningSession;
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::sqlite::SqliteRow;
use sqlx::Pool;
use sqlx::Row;
use sqlx::Sqlite;
use std::path::Path;
use std::str::FromStr;

mod challenges;
mod invoices;
mod vtxos;

/// The gateway's durable store.
#[derive(Debug, Clone)]
pub struct SessionStore {
    pool: Pool<Sqlite>,
}

impl SessionStore {
    /// Open (or create) the store at the given path and run migrations.
    pub async fn new<P: AsRef<Path>>(db_path: P) -> Result<Self, Error> {
        let db_path = db_path.as_ref();

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::ad_hoc(format!("failed to create database directory: {e}")))?;
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| Error::ad_hoc(format!("failed to open database: {e}")))?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| Error::ad_hoc(format!("failed to run migrations: {e}")))?;

        Ok(Self { pool })
    }

    /// An in-memory store, one connection so every query sees the same
    /// database. Used by tests.
    pub async fn new_in_memory() -> Result<Self, Error> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| Error::ad_hoc(format!("invalid sqlite options: {e}")))?
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| Error::ad_hoc(format!("failed to open in-memory database: {e}")))?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| Error::ad_hoc(format!("failed to run migrations: {e}")))?;

        Ok(Self { pool })
    }

    pub(crate) fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    // --- Sessions ---

    /// Insert a freshly initiated session.
    pub async fn create_session(&self, session: &SigningSession) -> Result<(), Error> {
        let intent = serde_json::to_string(&session.intent)
            .map_err(|e| Error::ad_hoc(format!("failed to serialize intent: {e}")))?;

        sqlx::query(
            "INSERT INTO sessions \
             (session_id, action_id, user_pubkey, session_type, state, intent, context, \
              challenge_id, result, created_at, updated_at, expires_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, NULL, NULL, ?, ?, ?)",
        )
        .bind(&session.session_id)
        .bind(&session.intent.action_id)
        .bind(&session.user_pubkey)
        .bind(session.session_type.as_str())
        .bind(session.state.as_str())
        .bind(&intent)
        .bind(&session.context)
        .bind(session.created_at)
        .bind(session.updated_at)
        .bind(session.expires_at)
        .execute(&self.pool)
        .await
        .map_err(store_err)?;

        Ok(())
    }

    pub async fn get_session(&self, session_id: &str) -> Result<Option<SigningSession>, Error> {
        let row = sqlx::query("SELECT * FROM sessions WHERE session_id = ?")
            .bind(session_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_err)?;

        row.map(|r| row_to_session(&r)).transpose()
    }

    /// Intent replay lookup: the same `action_id` never creates two
    /// sessions.
    pub async fn get_session_by_action_id(
        &self,
        action_id: &str,
    ) -> Result<Option<SigningSession>, Error> {
        let row = sqlx::query("SELECT * FROM sessions WHERE action_id = ?")
            .bind(action_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_err)?;

        row.map(|r| row_to_session(&r)).transpose()
    }

    /// Conditional state transition. Returns `false` when the session was
    /// not in `expected_from`; this is how concurrent drivers lose races
    /// without corrupting state.
    pub async fn update_session_state(
        &self,
        session_id: &str,
        expected_from: SessionState,
        to: SessionState,
    ) -> Result<bool, Error> {
        let result = sqlx::query(
            "UPDATE sessions SET state = ?, updated_at = ? WHERE session_id = ? AND state = ?",
        )
        .bind(to.as_str())
        .bind(now_unix())
        .bind(session_id)
        .bind(expected_from.as_str())
        .execute(&self.pool)
        .await
        .map_err(store_err)?;

        Ok(result.rows_affected() == 1)
    }

    /// Number of sessions still in a live state, for admission control.
    pub async fn count_active_sessions(&self) -> Result<i64, Error> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sessions \
             WHERE state NOT IN ('completed', 'failed', 'expired')",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(store_err)?;

        Ok(count)
    }

    /// All sessions still in a live state, for the shutdown path.
    pub async fn list_live_sessions(&self) -> Result<Vec<SigningSession>, Error> {
        let rows = sqlx::query(
            "SELECT * FROM sessions \
             WHERE state NOT IN ('completed', 'failed', 'expired')",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;

        rows.iter().map(row_to_session).collect()
    }

    /// Live sessions whose deadline has passed, for the sweeper.
    pub async fn list_expired_sessions(&self, now: i64) -> Result<Vec<SigningSession>, Error> {
        let rows = sqlx::query(
            "SELECT * FROM sessions \
             WHERE state NOT IN ('completed', 'failed', 'expired') AND expires_at < ?",
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;

        rows.iter().map(row_to_session).collect()
    }
}

pub(crate) fn row_to_session(row: &SqliteRow) -> Result<SigningSession, Error> {
    let intent_json: String = row.try_get("intent").map_err(store_err)?;
    let intent = serde_json::from_str(&intent_json)
        .map_err(|e| Error::ad_hoc(format!("corrupt intent column: {e}")))?;

    let state_raw: String = row.try_get("state").map_err(store_err)?;
    let state = SessionState::parse(&state_raw)
        .ok_or_else(|| Error::ad_hoc(format!("corrupt session state: {state_raw}")))?;

    let session_type_raw: String = row.try_get("session_type").map_err(store_err)?;
    let session_type = relay_core::SessionType::parse(&session_type_raw)?;

    let result: Option<String> = row.try_get("result").map_err(store_err)?;
    let result: Option<SessionResult> = result
        .map(|raw| {
            serde_json::from_str(&raw)
                .map_err(|e| Error::ad_hoc(format!("corrupt result column: {e}")))
        })
        .transpose()?;

    Ok(SigningSession {
        session_id: row.try_get("session_id").map_err(store_err)?,
        user_pubkey: row.try_get("user_pubkey").map_err(store_err)?,
        session_type,
        state,
        intent,
        context: row.try_get("context").map_err(store_err)?,
        created_at: row.try_get("created_at").map_err(store_err)?,
        updated_at: row.try_get("updated_at").map_err(store_err)?,
        expires_at: row.try_get("expires_at").map_err(store_err)?,
        challenge_id: row.try_get("challenge_id").map_err(store_err)?,
        result,
    })
}

pub(crate) fn store_err(e: sqlx::Error) -> Error {
    match &e {
        sqlx::Error::Database(db) => match db.kind() {
            sqlx::error::ErrorKind::CheckViolation => {
                Error::new(ErrorKind::StoreConflict, format!("check violation: {db}"))
            }
            sqlx::error::ErrorKind::UniqueViolation => {
                Error::new(ErrorKind::StoreConflict, format!("unique violation: {db}"))
            }
            _ => Error::ad_hoc(format!("database error: {db}")),
        },
        _ => Error::ad_hoc(format!("database error: {e}")),
    }
}

pub(crate) fn result_json(result: &SessionResult) -> Result<String, Error> {
    serde_json::to_string(result)
        .map_err(|e| Error::ad_hoc(format!("failed to serialize session result: {e}")))
}
