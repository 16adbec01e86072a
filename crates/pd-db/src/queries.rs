use crate::models::*;
use crate::pool::{map_insert_error, DbError};
use pd_core::security::input;
use std::pin::Pin;

use sqlx::{Executor, MySql};
use tokio_stream::{Stream, StreamExt};
use tracing::debug;

// ============================================================
// Personal data (personal data database)
// ============================================================

const PERSONAL_DATA_QUERY: &str =
    "SELECT name, email, phone, ssn, password, ip, last_login, user_agent FROM users";

/// Boxed stream of rows, as returned by [`stream_personal_data`].
pub type PersonalDataStream<'e> =
    Pin<Box<dyn Stream<Item = Result<PersonalDataRow, DbError>> + Send + 'e>>;

/// Fetch every row of the personal data `users` table.
///
/// Buffers the whole table; prefer [`stream_personal_data`] for large tables.
pub async fn fetch_personal_data<'e, E>(executor: E) -> Result<Vec<PersonalDataRow>, DbError>
where
    E: Executor<'e, Database = MySql>,
{
    let rows = sqlx::query_as::<_, PersonalDataRow>(PERSONAL_DATA_QUERY)
        .fetch_all(executor)
        .await?;

    debug!("Fetched {} personal data rows", rows.len());
    Ok(rows)
}

/// Stream the rows of the personal data `users` table as the server sends them.
pub fn stream_personal_data<'e, 'c: 'e, E>(executor: E) -> PersonalDataStream<'e>
where
    E: 'e + Executor<'c, Database = MySql>,
{
    Box::pin(
        sqlx::query_as::<_, PersonalDataRow>(PERSONAL_DATA_QUERY)
            .fetch(executor)
            .map(|row| row.map_err(DbError::from)),
    )
}

// ============================================================
// Users (authentication database)
// ============================================================

/// Check the columns of a new user against the table constraints.
pub fn validate_new_user(email: &str, hashed_password: &str) -> Result<(), DbError> {
    input::validate_max_len(email, MAX_COLUMN_LEN)?;
    input::validate_email(email)?;
    input::validate_max_len(hashed_password, MAX_COLUMN_LEN)?;
    Ok(())
}

/// `users.id` is an INT column, so ids are `i32` like [`User::id`].
fn user_id_from_insert(id: u64) -> Result<i32, DbError> {
    i32::try_from(id).map_err(|_| DbError::IdOutOfRange(id))
}

pub async fn insert_user<'e, E>(
    executor: E,
    email: &str,
    hashed_password: &str,
) -> Result<i32, DbError>
where
    E: Executor<'e, Database = MySql>,
{
    validate_new_user(email, hashed_password)?;

    let result = sqlx::query("INSERT INTO users (email, hashed_password) VALUES (?, ?)")
        .bind(email)
        .bind(hashed_password)
        .execute(executor)
        .await
        .map_err(|e| map_insert_error(e, || format!("User already exists: {}", email)))?;

    let id = user_id_from_insert(result.last_insert_id())?;
    debug!("Created user id: {}", id);
    Ok(id)
}

pub async fn find_user_by_email<'e, E>(executor: E, email: &str) -> Result<User, DbError>
where
    E: Executor<'e, Database = MySql>,
{
    sqlx::query_as::<_, User>(
        "SELECT id, email, hashed_password, session_id, reset_token FROM users WHERE email = ?",
    )
    .bind(email)
    .fetch_optional(executor)
    .await?
    .ok_or_else(|| DbError::NotFound(format!("User: {}", email)))
}

/// Set or clear (`None`) the session id of a user.
pub async fn update_user_session<'e, E>(
    executor: E,
    id: i32,
    session_id: Option<&str>,
) -> Result<(), DbError>
where
    E: Executor<'e, Database = MySql>,
{
    if let Some(session_id) = session_id {
        input::validate_max_len(session_id, MAX_COLUMN_LEN)?;
    }

    let result = sqlx::query("UPDATE users SET session_id = ? WHERE id = ?")
        .bind(session_id)
        .bind(id)
        .execute(executor)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound(format!("User with id {}", id)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pd_core::security::input::ValidationError;

    #[test]
    fn test_validate_new_user_accepts_bcrypt_hash() {
        let hash = "$2b$12$eUDdeuBtrD41c8dXvzh95ehsWYCCAi4VH1JbESzgbgZT.eMMzi.G2";
        assert!(validate_new_user("bob@example.com", hash).is_ok());
    }

    #[test]
    fn test_validate_new_user_rejects_bad_email() {
        assert!(matches!(
            validate_new_user("not an email", "hash"),
            Err(DbError::Validation(ValidationError::InvalidEmail(_)))
        ));
    }

    #[test]
    fn test_validate_new_user_enforces_column_length() {
        let long_hash = "x".repeat(MAX_COLUMN_LEN + 1);
        assert!(matches!(
            validate_new_user("bob@example.com", &long_hash),
            Err(DbError::Validation(ValidationError::TooLong { max: 250, .. }))
        ));
    }

    #[test]
    fn test_user_id_from_insert() {
        assert_eq!(user_id_from_insert(42).unwrap(), 42);
        assert_eq!(user_id_from_insert(i32::MAX as u64).unwrap(), i32::MAX);

        let too_big = i32::MAX as u64 + 1;
        assert!(matches!(
            user_id_from_insert(too_big),
            Err(DbError::IdOutOfRange(id)) if id == too_big
        ));
    }
}
