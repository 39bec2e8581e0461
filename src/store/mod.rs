//! SQLite-backed persistence for users, bookings, reviews, progress and
//! prompt logs

mod bookings;
mod progress;
mod prompts;
mod reviews;
mod users;

#[cfg(test)]
pub(crate) use users::tests::account;

use anyhow::{Context, Result as AnyResult};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::Connection;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::models::booking::{Acceptance, BookingStatus, TransitionError};
use crate::models::ValidationError;
use crate::types::{Role, UserStatus, Vehicle};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("User already exists")]
    DuplicateEmail,

    #[error("An admin user already exists")]
    AdminExists,

    #[error("Cannot delete the only admin user")]
    LastAdmin,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Unknown {0}")]
    UnknownReference(&'static str),

    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Shared handle to the marketplace database
#[derive(Clone)]
pub struct Store {
    conn: Arc<Mutex<Connection>>,
}

impl Store {
    /// Open (or create) the database at `path`
    pub async fn open<P: AsRef<Path>>(path: P) -> AnyResult<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .context("Failed to create database directory")?;
        }

        let conn = Connection::open(&path)
            .with_context(|| format!("Failed to open database at {}", path.display()))?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        Self::from_connection(conn)
    }

    /// Throwaway database, used by tests and `--database :memory:`
    pub fn open_in_memory() -> AnyResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> AnyResult<Self> {
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Self::init_schema(&conn).context("Failed to initialize database schema")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
        conn.execute_batch(r#"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT UNIQUE NOT NULL,
                password TEXT NOT NULL,
                role TEXT NOT NULL CHECK(role IN ('learner', 'instructor', 'admin')),
                location TEXT,
                vehicle TEXT,
                price INTEGER,
                bio TEXT,
                image TEXT,
                languages TEXT,
                transmission TEXT,
                experience INTEGER,
                licence_number TEXT,
                address TEXT,
                transmission_preference TEXT,
                status TEXT NOT NULL DEFAULT 'active' CHECK(status IN ('active', 'inactive'))
            );

            CREATE TABLE IF NOT EXISTS reviews (
                id TEXT PRIMARY KEY,
                booking_id TEXT,
                instructor_id TEXT NOT NULL,
                learner_id TEXT NOT NULL,
                rating INTEGER NOT NULL CHECK(rating BETWEEN 1 AND 5),
                comment TEXT,
                created_at TEXT NOT NULL,
                FOREIGN KEY (instructor_id) REFERENCES users(id) ON DELETE CASCADE,
                FOREIGN KEY (learner_id) REFERENCES users(id) ON DELETE CASCADE
            );

            CREATE TABLE IF NOT EXISTS progress (
                id TEXT PRIMARY KEY,
                learner_id TEXT NOT NULL,
                skill TEXT NOT NULL,
                percentage INTEGER NOT NULL DEFAULT 0,
                UNIQUE (learner_id, skill),
                FOREIGN KEY (learner_id) REFERENCES users(id) ON DELETE CASCADE
            );

            CREATE TABLE IF NOT EXISTS bookings (
                id TEXT PRIMARY KEY,
                learner_id TEXT NOT NULL,
                instructor_id TEXT NOT NULL,
                date TEXT NOT NULL,
                status TEXT NOT NULL,
                package_id TEXT,
                accepted INTEGER NOT NULL DEFAULT 0,
                FOREIGN KEY (learner_id) REFERENCES users(id) ON DELETE CASCADE,
                FOREIGN KEY (instructor_id) REFERENCES users(id) ON DELETE CASCADE
            );

            CREATE TABLE IF NOT EXISTS prompts (
                id TEXT PRIMARY KEY,
                user_id TEXT,
                command TEXT NOT NULL,
                response TEXT NOT NULL,
                created_at TEXT NOT NULL,
                FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE SET NULL
            );

            CREATE INDEX IF NOT EXISTS idx_users_role ON users(role);
            CREATE INDEX IF NOT EXISTS idx_bookings_learner ON bookings(learner_id);
            CREATE INDEX IF NOT EXISTS idx_bookings_instructor ON bookings(instructor_id);
            CREATE INDEX IF NOT EXISTS idx_reviews_instructor ON reviews(instructor_id);
        "#)
    }
}

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn has_role(conn: &Connection, id: &str, role: Role) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM users WHERE id = ?1 AND role = ?2)",
        rusqlite::params![id, role],
        |row| row.get(0),
    )
}

/// Enums stored as their text form
macro_rules! text_column {
    ($($ty:ty),*) => {$(
        impl ToSql for $ty {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(self.as_str().into())
            }
        }

        impl FromSql for $ty {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                value
                    .as_str()?
                    .parse()
                    .map_err(|e: <$ty as std::str::FromStr>::Err| FromSqlError::Other(e.into()))
            }
        }
    )*};
}

text_column!(Role, UserStatus, Vehicle, BookingStatus);

impl ToSql for Acceptance {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(i64::from(*self).into())
    }
}

impl FromSql for Acceptance {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        Acceptance::try_from(value.as_i64()?).map_err(|e| FromSqlError::Other(e.into()))
    }
}
