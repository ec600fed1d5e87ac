use sqlx::{Executor, Postgres};

use super::query::{Query, SqlParam};
use crate::{
    error::{LedgerError, LedgerResult},
    models::{NewUser, User, UserUpdate},
};

pub async fn get_user<'c, E>(executor: E, id: i32) -> LedgerResult<Option<User>>
where
    E: Executor<'c, Database = Postgres>,
{
    Query::new("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(executor)
        .await
}

pub async fn get_user_by_username<'c, E>(executor: E, username: &str) -> LedgerResult<Option<User>>
where
    E: Executor<'c, Database = Postgres>,
{
    Query::new("SELECT * FROM users WHERE username = $1")
        .bind(username)
        .fetch_optional(executor)
        .await
}

/// Registers a user. The display name falls back to the username.
pub async fn create_user<'c, E>(executor: E, new_user: &NewUser) -> LedgerResult<User>
where
    E: Executor<'c, Database = Postgres>,
{
    let username = new_user.username.trim();
    if username.is_empty() {
        return Err(LedgerError::InvalidInput("username must not be empty".to_string()));
    }
    if new_user.password_hash.is_empty() {
        return Err(LedgerError::InvalidInput("password hash must not be empty".to_string()));
    }

    let display_name = new_user
        .display_name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(username);

    Query::new(
        "INSERT INTO users (username, email, password_hash, display_name)
         VALUES ($1, $2, $3, $4)
         RETURNING *",
    )
    .bind(username)
    .bind(new_user.email.trim())
    .bind(SqlParam::secret(new_user.password_hash.as_str()))
    .bind(display_name)
    .fetch_one(executor)
    .await
}

pub async fn update_user<'c, E>(executor: E, id: i32, update: &UserUpdate) -> LedgerResult<User>
where
    E: Executor<'c, Database = Postgres>,
{
    Query::new(
        "UPDATE users
         SET email = COALESCE($1, email),
             display_name = COALESCE($2, display_name),
             avatar_url = COALESCE($3, avatar_url),
             updated_at = NOW()
         WHERE id = $4
         RETURNING *",
    )
    .bind(update.email.clone())
    .bind(update.display_name.clone())
    .bind(update.avatar_url.clone())
    .bind(id)
    .fetch_optional(executor)
    .await?
    .ok_or_else(|| LedgerError::NotFound(format!("user {}", id)))
}
