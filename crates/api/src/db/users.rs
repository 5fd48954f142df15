//! User repository for database operations.
//!
//! This module provides database access for users, their credentials and
//! their purchase history.

use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};
use tracing::instrument;

use corona_core::{Email, Role, UserId};

use super::RepositoryError;
use crate::models::{HistoryEntry, User};
use crate::services::auth::Credential;

const USER_COLUMNS: &str = "id, name, email, about, role, history, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: UserId,
    name: String,
    email: Email,
    about: Option<String>,
    role: Role,
    history: Json<Vec<HistoryEntry>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            email: row.email,
            about: row.about,
            role: row.role,
            history: row.history.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct UserWithCredentialRow {
    #[sqlx(flatten)]
    user: UserRow,
    salt: String,
    hashed_password: String,
}

/// Fields of a profile update. `None` keeps the stored value.
#[derive(Debug, Default)]
pub struct ProfileUpdate<'a> {
    pub name: Option<&'a str>,
    pub about: Option<&'a str>,
    pub credential: Option<&'a Credential>,
}

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Create a user with a salted credential.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    #[instrument(skip(self, credential))]
    pub async fn create(
        &self,
        name: &str,
        email: &Email,
        credential: &Credential,
        role: Role,
    ) -> Result<User, RepositoryError> {
        let sql = format!(
            r#"
            INSERT INTO shop."user" (name, email, salt, hashed_password, role)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {USER_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(name)
            .bind(email)
            .bind(&credential.salt)
            .bind(&credential.hashed_password)
            .bind(role)
            .fetch_one(self.pool)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(ref db_err) = e
                    && db_err.is_unique_violation()
                {
                    return RepositoryError::Conflict("Email is taken".to_owned());
                }
                RepositoryError::Database(e)
            })?;

        Ok(row.into())
    }

    /// Get a user by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let sql = format!(r#"SELECT {USER_COLUMNS} FROM shop."user" WHERE id = $1"#);
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        Ok(row.map(Into::into))
    }

    /// Get a user and their stored credential by email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn get_credentials_by_email(
        &self,
        email: &Email,
    ) -> Result<Option<(User, Credential)>, RepositoryError> {
        let sql = format!(
            r#"SELECT {USER_COLUMNS}, salt, hashed_password FROM shop."user" WHERE email = $1"#
        );
        let row = sqlx::query_as::<_, UserWithCredentialRow>(&sql)
            .bind(email)
            .fetch_optional(self.pool)
            .await?;

        Ok(row.map(|r| {
            (
                r.user.into(),
                Credential {
                    salt: r.salt,
                    hashed_password: r.hashed_password,
                },
            )
        }))
    }

    /// Apply a profile update.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    #[instrument(skip(self, update))]
    pub async fn update_profile(
        &self,
        id: UserId,
        update: &ProfileUpdate<'_>,
    ) -> Result<User, RepositoryError> {
        let sql = format!(
            r#"
            UPDATE shop."user"
            SET name = COALESCE($2, name),
                about = COALESCE($3, about),
                salt = COALESCE($4, salt),
                hashed_password = COALESCE($5, hashed_password),
                updated_at = now()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .bind(update.name)
            .bind(update.about)
            .bind(update.credential.map(|c| c.salt.as_str()))
            .bind(update.credential.map(|c| c.hashed_password.as_str()))
            .fetch_optional(self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        Ok(row.into())
    }
}

/// Append entries to a user's purchase history.
///
/// Takes a connection so it can join the checkout transaction.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if the user doesn't exist.
/// Returns `RepositoryError::Database` for other database errors.
#[instrument(skip(conn, entries), fields(entries = entries.len()))]
pub async fn append_history(
    conn: &mut PgConnection,
    user_id: UserId,
    entries: &[HistoryEntry],
) -> Result<(), RepositoryError> {
    let result = sqlx::query(
        r#"
        UPDATE shop."user"
        SET history = history || $2::jsonb, updated_at = now()
        WHERE id = $1
        "#,
    )
    .bind(user_id)
    .bind(Json(entries))
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(RepositoryError::NotFound);
    }

    Ok(())
}
