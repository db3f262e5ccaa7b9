/*
 * Responsibility
 * - organizations テーブルの読み取り (SQLx)
 * - ゲートは存在確認にだけ使う
 *
 * Schema
 *   organizations (id BIGINT PK, name TEXT, default_role TEXT)
 */
use async_trait::async_trait;
use serde::Serialize;
use sqlx::{FromRow, PgPool};

use crate::repos::{OrganizationsStore, error::RepoError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Organization {
    pub id: u64,
    pub name: String,
    pub default_role: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OrganizationQuery {
    pub id: u64,
}

#[derive(Debug, FromRow)]
struct OrganizationRow {
    id: i64,
    name: String,
    default_role: String,
}

impl TryFrom<OrganizationRow> for Organization {
    type Error = RepoError;

    fn try_from(row: OrganizationRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: u64::try_from(row.id).map_err(|_| RepoError::InvalidRow("organizations.id"))?,
            name: row.name,
            default_role: row.default_role,
        })
    }
}

#[derive(Clone, Debug)]
pub struct PgOrganizationsStore {
    db: PgPool,
}

impl PgOrganizationsStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl OrganizationsStore for PgOrganizationsStore {
    async fn get(&self, query: OrganizationQuery) -> Result<Option<Organization>, RepoError> {
        // BIGINT cannot hold ids above i64::MAX, so such an organization cannot exist.
        let Ok(id) = i64::try_from(query.id) else {
            return Ok(None);
        };

        let row = sqlx::query_as::<_, OrganizationRow>(
            r#"
            SELECT id, name, default_role
            FROM organizations
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        row.map(Organization::try_from).transpose()
    }
}
