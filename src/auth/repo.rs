use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::repo_types::User;
use crate::error::AuthError;

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505"))
}

impl User {
    /// Find a user by login identifier, matching either email or phone.
    pub async fn find_by_identifier(
        db: &PgPool,
        identifier: &str,
    ) -> Result<Option<User>, AuthError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, phone, username, password_hash, created_at
            FROM users
            WHERE email = $1 OR phone = $1
            "#,
        )
        .bind(identifier)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Existence probe used by signup and the OTP variant.
    pub async fn find_by_email_or_phone(
        db: &PgPool,
        email: &str,
        phone: &str,
    ) -> Result<Option<User>, AuthError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, phone, username, password_hash, created_at
            FROM users
            WHERE email = $1 OR phone = $2
            "#,
        )
        .bind(email)
        .bind(phone)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> Result<Option<User>, AuthError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, phone, username, password_hash, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Insert a new user with a hashed password.
    ///
    /// The unique constraints on email and phone arbitrate concurrent
    /// signups; a violation surfaces as the same conflict the pre-check
    /// reports.
    pub async fn create(
        db: &PgPool,
        email: &str,
        phone: &str,
        password_hash: &str,
    ) -> Result<User, AuthError> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, phone, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, email, phone, username, password_hash, created_at
            "#,
        )
        .bind(email)
        .bind(phone)
        .bind(password_hash)
        .fetch_one(db)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AuthError::Conflict
            } else {
                AuthError::Store(e)
            }
        })
    }

    /// Set the username once; a row already holding one is left untouched.
    pub async fn claim_username(
        db: &PgPool,
        user_id: Uuid,
        username: &str,
    ) -> Result<User, AuthError> {
        let updated = sqlx::query_as::<_, User>(
            r#"
            UPDATE users SET username = $2
            WHERE id = $1 AND username IS NULL
            RETURNING id, email, phone, username, password_hash, created_at
            "#,
        )
        .bind(user_id)
        .bind(username)
        .fetch_optional(db)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AuthError::Conflict
            } else {
                AuthError::Store(e)
            }
        })?;

        match updated {
            Some(user) => Ok(user),
            // No row matched: either the username is already set or the
            // user vanished; tell the two apart for the right status.
            None => match Self::find_by_id(db, user_id).await? {
                Some(_) => Err(AuthError::Conflict),
                None => Err(AuthError::Unauthenticated),
            },
        }
    }
}
