use chrono::Utc;
use contracts::domain::a004_import_job::{ImportJob, ImportJobStatus};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use sea_orm::entity::prelude::*;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, Set};

use crate::shared::data::db::get_connection;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "a004_import_job")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub tenant_id: String,
    pub status: String,
    pub progress_percent: Option<i32>,
    pub total_rows: Option<i32>,
    pub inserted_count: Option<i32>,
    pub updated_count: Option<i32>,
    pub rejected_count: Option<i32>,
    pub error: Option<String>,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for ImportJob {
    fn from(m: Model) -> Self {
        ImportJob {
            id: Uuid::parse_str(&m.id).unwrap_or_else(|_| Uuid::new_v4()),
            tenant_id: m.tenant_id,
            status: ImportJobStatus::parse(&m.status).unwrap_or(ImportJobStatus::Queued),
            progress_percent: m.progress_percent,
            total_rows: m.total_rows,
            inserted_count: m.inserted_count,
            updated_count: m.updated_count,
            rejected_count: m.rejected_count,
            error: m.error,
            created_at: m.created_at.unwrap_or_else(Utc::now),
            updated_at: m.updated_at.unwrap_or_else(Utc::now),
        }
    }
}

fn conn() -> &'static DatabaseConnection {
    get_connection()
}

/// Строка задачи должна быть durable ДО того, как вызывающий получит job id
pub async fn insert(job: &ImportJob) -> anyhow::Result<()> {
    let active = ActiveModel {
        id: Set(job.id.to_string()),
        tenant_id: Set(job.tenant_id.clone()),
        status: Set(job.status.as_str().to_string()),
        progress_percent: Set(job.progress_percent),
        total_rows: Set(job.total_rows),
        inserted_count: Set(job.inserted_count),
        updated_count: Set(job.updated_count),
        rejected_count: Set(job.rejected_count),
        error: Set(job.error.clone()),
        created_at: Set(Some(job.created_at)),
        updated_at: Set(Some(job.updated_at)),
    };
    active.insert(conn()).await?;
    Ok(())
}

pub async fn get_by_id(tenant_id: &str, id: Uuid) -> anyhow::Result<Option<ImportJob>> {
    let result = Entity::find_by_id(id.to_string())
        .filter(Column::TenantId.eq(tenant_id))
        .one(conn())
        .await?;
    Ok(result.map(Into::into))
}

pub async fn mark_running(
    tenant_id: &str,
    id: Uuid,
    progress_percent: i32,
) -> anyhow::Result<()> {
    use sea_orm::sea_query::Expr;
    Entity::update_many()
        .col_expr(
            Column::Status,
            Expr::value(ImportJobStatus::Running.as_str()),
        )
        .col_expr(Column::ProgressPercent, Expr::value(progress_percent))
        .col_expr(Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(Column::Id.eq(id.to_string()))
        .filter(Column::TenantId.eq(tenant_id))
        .exec(conn())
        .await?;
    Ok(())
}

pub async fn mark_succeeded(
    tenant_id: &str,
    id: Uuid,
    total_rows: i32,
    inserted_count: i32,
    updated_count: i32,
    rejected_count: i32,
) -> anyhow::Result<()> {
    use sea_orm::sea_query::Expr;
    Entity::update_many()
        .col_expr(
            Column::Status,
            Expr::value(ImportJobStatus::Succeeded.as_str()),
        )
        .col_expr(Column::ProgressPercent, Expr::value(100))
        .col_expr(Column::TotalRows, Expr::value(total_rows))
        .col_expr(Column::InsertedCount, Expr::value(inserted_count))
        .col_expr(Column::UpdatedCount, Expr::value(updated_count))
        .col_expr(Column::RejectedCount, Expr::value(rejected_count))
        .col_expr(Column::Error, Expr::value(Option::<String>::None))
        .col_expr(Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(Column::Id.eq(id.to_string()))
        .filter(Column::TenantId.eq(tenant_id))
        .exec(conn())
        .await?;
    Ok(())
}

/// Счетчики не трогаются — остаются последними известными
pub async fn mark_failed(tenant_id: &str, id: Uuid, error: &str) -> anyhow::Result<()> {
    use sea_orm::sea_query::Expr;
    Entity::update_many()
        .col_expr(
            Column::Status,
            Expr::value(ImportJobStatus::Failed.as_str()),
        )
        .col_expr(Column::ProgressPercent, Expr::value(100))
        .col_expr(Column::Error, Expr::value(error))
        .col_expr(Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(Column::Id.eq(id.to_string()))
        .filter(Column::TenantId.eq(tenant_id))
        .exec(conn())
        .await?;
    Ok(())
}
