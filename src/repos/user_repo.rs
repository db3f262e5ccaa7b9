/*
 * Responsibility
 * - users / user_roles テーブルの読み取り (SQLx)
 * - (name, provider, scheme) でユーザーを 1 件引き、ロール名をまとめて返す
 *
 * Schema
 *   users      (id BIGINT PK, name TEXT, provider TEXT, scheme TEXT,
 *               UNIQUE (name, provider, scheme))
 *   user_roles (user_id BIGINT REFERENCES users(id), name TEXT)
 */
use async_trait::async_trait;
use serde::Serialize;
use sqlx::{FromRow, PgPool};

use crate::repos::{UsersStore, error::RepoError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: u64,
    pub name: String,
    pub provider: String,
    pub scheme: String,
    /// Role names as stored; unknown names are kept and ignored by the evaluator.
    pub roles: Vec<String>,
}

/// Lookup key: a user is identified by who they are at which provider, via which scheme.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UserQuery {
    pub name: String,
    pub provider: String,
    pub scheme: String,
}

#[derive(Debug, FromRow)]
struct UserRow {
    id: i64,
    name: String,
    provider: String,
    scheme: String,
    roles: Vec<String>,
}

impl TryFrom<UserRow> for User {
    type Error = RepoError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: u64::try_from(row.id).map_err(|_| RepoError::InvalidRow("users.id"))?,
            name: row.name,
            provider: row.provider,
            scheme: row.scheme,
            roles: row.roles,
        })
    }
}

#[derive(Clone, Debug)]
pub struct PgUsersStore {
    db: PgPool,
}

impl PgUsersStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UsersStore for PgUsersStore {
    async fn get(&self, query: UserQuery) -> Result<Option<User>, RepoError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT
                u.id,
                u.name,
                u.provider,
                u.scheme,
                COALESCE(
                    array_agg(r.name) FILTER (WHERE r.name IS NOT NULL),
                    '{}'
                ) AS roles
            FROM users u
            LEFT JOIN user_roles r ON r.user_id = u.id
            WHERE u.name = $1 AND u.provider = $2 AND u.scheme = $3
            GROUP BY u.id
            "#,
        )
        .bind(&query.name)
        .bind(&query.provider)
        .bind(&query.scheme)
        .fetch_optional(&self.db)
        .await?;

        row.map(User::try_from).transpose()
    }
}
