//! User repository for database operations

use chrono::{DateTime, Utc};
use common::error::{DatabaseError, DatabaseResult};
use sqlx::{PgPool, Row, postgres::PgRow};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use crate::models::{NewUser, Role, User};

/// Credential store
///
/// Usernames are unique; `create` fails with [`DatabaseError::Conflict`]
/// when the username is taken.
pub trait UserRepository: Send + Sync {
    fn create(&self, new_user: NewUser) -> impl Future<Output = DatabaseResult<User>> + Send;

    fn find_by_username(
        &self,
        username: &str,
    ) -> impl Future<Output = DatabaseResult<Option<User>>> + Send;

    fn find_by_id(&self, id: Uuid) -> impl Future<Output = DatabaseResult<Option<User>>> + Send;

    /// Stamp the last-login time
    fn record_login(
        &self,
        id: Uuid,
        at: DateTime<Utc>,
    ) -> impl Future<Output = DatabaseResult<()>> + Send;

    /// Replace the stored hash; false when the user does not exist
    fn update_password(
        &self,
        id: Uuid,
        password_hash: &str,
    ) -> impl Future<Output = DatabaseResult<bool>> + Send;

    /// All users, newest first
    fn list(&self) -> impl Future<Output = DatabaseResult<Vec<User>>> + Send;

    fn count(&self) -> impl Future<Output = DatabaseResult<u64>> + Send;
}

const USER_COLUMNS: &str = "id, username, password_hash, role, is_active, email, full_name, \
                            last_login, created_at, updated_at";

/// PostgreSQL user repository
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    /// Create a new user repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn user_from_row(row: &PgRow) -> Result<User, sqlx::Error> {
    let role: String = row.try_get("role")?;
    let role = role
        .parse::<Role>()
        .map_err(|e| sqlx::Error::Decode(e.into()))?;

    Ok(User {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        password_hash: row.try_get("password_hash")?,
        role,
        is_active: row.try_get("is_active")?,
        email: row.try_get("email")?,
        full_name: row.try_get("full_name")?,
        last_login: row.try_get("last_login")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

impl UserRepository for PgUserRepository {
    async fn create(&self, new_user: NewUser) -> DatabaseResult<User> {
        info!("Creating new user: {}", new_user.username);

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO users (id, username, password_hash, role, email, full_name)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&new_user.username)
        .bind(&new_user.password_hash)
        .bind(new_user.role.as_str())
        .bind(&new_user.email)
        .bind(&new_user.full_name)
        .fetch_one(&self.pool)
        .await
        .map_err(DatabaseError::from_query)?;

        user_from_row(&row).map_err(DatabaseError::from_query)
    }

    async fn find_by_username(&self, username: &str) -> DatabaseResult<Option<User>> {
        let row = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from_query)?;

        row.as_ref()
            .map(user_from_row)
            .transpose()
            .map_err(DatabaseError::from_query)
    }

    async fn find_by_id(&self, id: Uuid) -> DatabaseResult<Option<User>> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(DatabaseError::from_query)?;

        row.as_ref()
            .map(user_from_row)
            .transpose()
            .map_err(DatabaseError::from_query)
    }

    async fn record_login(&self, id: Uuid, at: DateTime<Utc>) -> DatabaseResult<()> {
        sqlx::query("UPDATE users SET last_login = $2, updated_at = $2 WHERE id = $1")
            .bind(id)
            .bind(at)
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::from_query)?;
        Ok(())
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> DatabaseResult<bool> {
        let result =
            sqlx::query("UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .bind(password_hash)
                .execute(&self.pool)
                .await
                .map_err(DatabaseError::from_query)?;

        Ok(result.rows_affected() > 0)
    }

    async fn list(&self) -> DatabaseResult<Vec<User>> {
        let rows = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::from_query)?;

        rows.iter()
            .map(user_from_row)
            .collect::<Result<_, _>>()
            .map_err(DatabaseError::from_query)
    }

    async fn count(&self) -> DatabaseResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await
            .map_err(DatabaseError::from_query)?;
        Ok(u64::try_from(count).unwrap_or_default())
    }
}

/// In-process user repository
///
/// Backs the `memory` storage mode and the test suites.
#[derive(Clone, Default)]
pub struct MemoryUserRepository {
    users: Arc<RwLock<HashMap<Uuid, User>>>,
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl UserRepository for MemoryUserRepository {
    async fn create(&self, new_user: NewUser) -> DatabaseResult<User> {
        let mut users = self.users.write().await;

        if users.values().any(|u| u.username == new_user.username) {
            return Err(DatabaseError::Conflict(format!(
                "username {} already exists",
                new_user.username
            )));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            username: new_user.username,
            password_hash: new_user.password_hash,
            role: new_user.role,
            is_active: true,
            email: new_user.email,
            full_name: new_user.full_name,
            last_login: None,
            created_at: now,
            updated_at: now,
        };
        users.insert(user.id, user.clone());

        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> DatabaseResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.username == username).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> DatabaseResult<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn record_login(&self, id: Uuid, at: DateTime<Utc>) -> DatabaseResult<()> {
        if let Some(user) = self.users.write().await.get_mut(&id) {
            user.last_login = Some(at);
            user.updated_at = at;
        }
        Ok(())
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> DatabaseResult<bool> {
        match self.users.write().await.get_mut(&id) {
            Some(user) => {
                user.password_hash = password_hash.to_string();
                user.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list(&self) -> DatabaseResult<Vec<User>> {
        let mut users: Vec<User> = self.users.read().await.values().cloned().collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(users)
    }

    async fn count(&self) -> DatabaseResult<u64> {
        Ok(self.users.read().await.len() as u64)
    }
}
