use contracts::domain::a006_import_audit::ImportAudit;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use sea_orm::entity::prelude::*;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};

use crate::shared::data::db::get_connection;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "a006_import_audit")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub tenant_id: String,
    pub import_job_id: String,
    pub total_rows: i32,
    pub inserted_count: i32,
    pub updated_count: i32,
    pub rejected_count: i32,
    pub received_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for ImportAudit {
    fn from(m: Model) -> Self {
        ImportAudit {
            id: Uuid::parse_str(&m.id).unwrap_or_else(|_| Uuid::new_v4()),
            tenant_id: m.tenant_id,
            import_job_id: Uuid::parse_str(&m.import_job_id).unwrap_or_else(|_| Uuid::new_v4()),
            total_rows: m.total_rows,
            inserted_count: m.inserted_count,
            updated_count: m.updated_count,
            rejected_count: m.rejected_count,
            received_at: m.received_at,
        }
    }
}

fn conn() -> &'static DatabaseConnection {
    get_connection()
}

/// Append-only: каждая доставка события дает новую строку
pub async fn insert(audit: &ImportAudit) -> anyhow::Result<()> {
    let active = ActiveModel {
        id: Set(audit.id.to_string()),
        tenant_id: Set(audit.tenant_id.clone()),
        import_job_id: Set(audit.import_job_id.to_string()),
        total_rows: Set(audit.total_rows),
        inserted_count: Set(audit.inserted_count),
        updated_count: Set(audit.updated_count),
        rejected_count: Set(audit.rejected_count),
        received_at: Set(audit.received_at),
    };
    active.insert(conn()).await?;
    Ok(())
}

pub async fn list_by_tenant(tenant_id: &str) -> anyhow::Result<Vec<ImportAudit>> {
    let items = Entity::find()
        .filter(Column::TenantId.eq(tenant_id))
        .order_by_desc(Column::ReceivedAt)
        .all(conn())
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(items)
}

/// Используется в тестах и при ручной сверке идемпотентности консьюмера
pub async fn list_by_job(tenant_id: &str, import_job_id: Uuid) -> anyhow::Result<Vec<ImportAudit>> {
    let items = Entity::find()
        .filter(Column::TenantId.eq(tenant_id))
        .filter(Column::ImportJobId.eq(import_job_id.to_string()))
        .all(conn())
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(items)
}
