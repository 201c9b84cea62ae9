// User Database Operations
// Account CRUD; emails are always normalized before storage or comparison

use crate::auth::passwords::{hash_password, verify_password};
use crate::auth::rbac::Role;
use crate::config::Settings;
use crate::database::now_ts;
use crate::errors::{HubError, HubResult};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

const MIN_PASSWORD_LEN: usize = 8;

/// User record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: i64,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Partial account edit; only supplied fields are changed.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub email: Option<String>,
    pub role: Option<Role>,
    pub active: Option<bool>,
}

type UserRow = (i64, String, String, String, i64, i64, i64);

fn row_to_record(row: UserRow) -> HubResult<UserRecord> {
    Ok(UserRecord {
        id: row.0,
        email: row.1,
        password_hash: row.2,
        role: Role::from_str(&row.3)
            .map_err(|_| HubError::database_error(&format!("Unknown role stored for user {}", row.0)))?,
        active: row.4 != 0,
        created_at: row.5,
        updated_at: row.6,
    })
}

/// Lower-cased, trimmed form used for storage and every lookup, so casing or
/// stray whitespace can never create duplicate accounts.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

const SELECT_USER: &str = "SELECT id, email, password_hash, role, active, created_at, updated_at FROM users";

/// Database operations for users
pub struct UserOps;

impl UserOps {
    /// Create a new account. The password is hashed before storage.
    pub async fn create_user(
        pool: &sqlx::SqlitePool,
        email: &str,
        password: &str,
        role: Role,
        active: bool,
    ) -> HubResult<i64> {
        let email = normalize_email(email);
        if email.is_empty() {
            return Err(HubError::validation("Email must not be empty"));
        }
        if password.len() < MIN_PASSWORD_LEN {
            return Err(HubError::validation("Password must have at least 8 characters"));
        }

        let now = now_ts();
        let result = sqlx::query(
            r#"
            INSERT INTO users (email, password_hash, role, active, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
        "#,
        )
        .bind(&email)
        .bind(hash_password(password))
        .bind(role.as_str())
        .bind(if active { 1i64 } else { 0 })
        .bind(now)
        .bind(now)
        .execute(pool)
        .await
        .map_err(|e| HubError::database_error(&format!("Failed to create user: {}", e)))?;

        Ok(result.last_insert_rowid())
    }

    /// Lookup by email, normalized the same way `create_user` stores it.
    pub async fn get_user_by_email(
        pool: &sqlx::SqlitePool,
        email: &str,
    ) -> HubResult<Option<UserRecord>> {
        let row: Option<UserRow> = sqlx::query_as(&format!("{} WHERE email = ?", SELECT_USER))
            .bind(normalize_email(email))
            .fetch_optional(pool)
            .await
            .map_err(|e| HubError::database_error(&format!("Failed to get user: {}", e)))?;

        row.map(row_to_record).transpose()
    }

    pub async fn get_user(pool: &sqlx::SqlitePool, user_id: i64) -> HubResult<Option<UserRecord>> {
        let row: Option<UserRow> = sqlx::query_as(&format!("{} WHERE id = ?", SELECT_USER))
            .bind(user_id)
            .fetch_optional(pool)
            .await
            .map_err(|e| HubError::database_error(&format!("Failed to get user: {}", e)))?;

        row.map(row_to_record).transpose()
    }

    /// All accounts, newest first.
    pub async fn list_users(pool: &sqlx::SqlitePool) -> HubResult<Vec<UserRecord>> {
        let rows: Vec<UserRow> =
            sqlx::query_as(&format!("{} ORDER BY created_at DESC, id DESC", SELECT_USER))
                .fetch_all(pool)
                .await
                .map_err(|e| HubError::database_error(&format!("Failed to list users: {}", e)))?;

        rows.into_iter().map(row_to_record).collect()
    }

    /// Partial update; only supplied fields are touched. A no-field update is
    /// a no-op and does not bump updated_at.
    pub async fn update_user(
        pool: &sqlx::SqlitePool,
        user_id: i64,
        update: &UserUpdate,
    ) -> HubResult<()> {
        let mut sets: Vec<&str> = Vec::new();
        if update.email.is_some() {
            sets.push("email = ?");
        }
        if update.role.is_some() {
            sets.push("role = ?");
        }
        if update.active.is_some() {
            sets.push("active = ?");
        }
        if sets.is_empty() {
            return Ok(());
        }
        sets.push("updated_at = ?");

        let sql = format!("UPDATE users SET {} WHERE id = ?", sets.join(", "));
        let mut query = sqlx::query(&sql);
        if let Some(email) = &update.email {
            let email = normalize_email(email);
            if email.is_empty() {
                return Err(HubError::validation("Email must not be empty"));
            }
            query = query.bind(email);
        }
        if let Some(role) = update.role {
            query = query.bind(role.as_str());
        }
        if let Some(active) = update.active {
            query = query.bind(if active { 1i64 } else { 0 });
        }

        query
            .bind(now_ts())
            .bind(user_id)
            .execute(pool)
            .await
            .map_err(|e| HubError::database_error(&format!("Failed to update user: {}", e)))?;

        Ok(())
    }

    /// Re-hash and store a new password.
    pub async fn set_password(
        pool: &sqlx::SqlitePool,
        user_id: i64,
        new_password: &str,
    ) -> HubResult<()> {
        if new_password.len() < MIN_PASSWORD_LEN {
            return Err(HubError::validation("Password must have at least 8 characters"));
        }

        sqlx::query("UPDATE users SET password_hash = ?, updated_at = ? WHERE id = ?")
            .bind(hash_password(new_password))
            .bind(now_ts())
            .bind(user_id)
            .execute(pool)
            .await
            .map_err(|e| HubError::database_error(&format!("Failed to set password: {}", e)))?;

        Ok(())
    }

    /// Admin self-edit rule: an administrator may not deactivate their own
    /// account nor remove their own ADMIN role. Rejected edits mutate nothing.
    pub async fn apply_admin_edit(
        pool: &sqlx::SqlitePool,
        acting_user_id: i64,
        target_user_id: i64,
        update: &UserUpdate,
    ) -> HubResult<()> {
        if acting_user_id == target_user_id {
            if update.active == Some(false) {
                return Err(HubError::validation("You cannot deactivate yourself"));
            }
            if matches!(update.role, Some(role) if role != Role::Admin) {
                return Err(HubError::validation("You cannot remove your own ADMIN role"));
            }
        }
        Self::update_user(pool, target_user_id, update).await
    }

    /// Normalized lookup + password verify + active check. Absent account,
    /// wrong password and deactivated account are indistinguishable.
    pub async fn verify_login(
        pool: &sqlx::SqlitePool,
        email: &str,
        password: &str,
    ) -> HubResult<Option<UserRecord>> {
        let user = Self::get_user_by_email(pool, email).await?;
        Ok(user.filter(|u| u.active && verify_password(password, &u.password_hash)))
    }

    /// Boot-time seeding: create the configured ADMIN account iff absent.
    /// Returns the new id when a row was created.
    pub async fn ensure_admin(
        pool: &sqlx::SqlitePool,
        settings: &Settings,
    ) -> HubResult<Option<i64>> {
        let email = normalize_email(&settings.admin_email);
        if email.is_empty() || settings.admin_password.is_empty() {
            return Ok(None);
        }
        if Self::get_user_by_email(pool, &email).await?.is_some() {
            return Ok(None);
        }

        let id = Self::create_user(pool, &email, &settings.admin_password, Role::Admin, true).await?;
        tracing::info!(email = %email, "Seeded bootstrap admin account");
        Ok(Some(id))
    }
}
