use chrono::{DateTime, Utc};
use contracts::domain::a005_execution_lock::ExecutionLease;
use serde::{Deserialize, Serialize};

use sea_orm::entity::prelude::*;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, Set};

use crate::shared::data::db::get_connection;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "a005_execution_lock")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub tenant_id: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub lock_name: String,
    pub acquired_at: chrono::DateTime<chrono::Utc>,
    pub expires_at: chrono::DateTime<chrono::Utc>,
    pub acquired_by: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for ExecutionLease {
    fn from(m: Model) -> Self {
        ExecutionLease {
            tenant_id: m.tenant_id,
            lock_name: m.lock_name,
            acquired_at: m.acquired_at,
            expires_at: m.expires_at,
            acquired_by: m.acquired_by,
        }
    }
}

fn conn() -> &'static DatabaseConnection {
    get_connection()
}

pub async fn find(tenant_id: &str, lock_name: &str) -> anyhow::Result<Option<ExecutionLease>> {
    let result = Entity::find()
        .filter(Column::TenantId.eq(tenant_id))
        .filter(Column::LockName.eq(lock_name))
        .one(conn())
        .await?;
    Ok(result.map(Into::into))
}

/// Вставка новой аренды. Нарушение первичного ключа (конкурентный захват)
/// трактуется как проигранный захват, не как ошибка.
pub async fn try_insert(lease: &ExecutionLease) -> anyhow::Result<bool> {
    let active = ActiveModel {
        tenant_id: Set(lease.tenant_id.clone()),
        lock_name: Set(lease.lock_name.clone()),
        acquired_at: Set(lease.acquired_at),
        expires_at: Set(lease.expires_at),
        acquired_by: Set(lease.acquired_by.clone()),
    };
    match active.insert(conn()).await {
        Ok(_) => Ok(true),
        Err(e) => {
            tracing::debug!(
                "Lease insert lost Tenant={} Lock={}: {}",
                lease.tenant_id,
                lease.lock_name,
                e
            );
            Ok(false)
        }
    }
}

/// Атомарное переиспользование просроченной аренды: UPDATE срабатывает,
/// только если expires_at все еще в прошлом.
pub async fn refresh_if_expired(
    tenant_id: &str,
    lock_name: &str,
    now: DateTime<Utc>,
    new_expires_at: DateTime<Utc>,
) -> anyhow::Result<bool> {
    use sea_orm::sea_query::Expr;
    let result = Entity::update_many()
        .col_expr(Column::AcquiredAt, Expr::value(now))
        .col_expr(Column::ExpiresAt, Expr::value(new_expires_at))
        .filter(Column::TenantId.eq(tenant_id))
        .filter(Column::LockName.eq(lock_name))
        .filter(Column::ExpiresAt.lt(now))
        .exec(conn())
        .await?;
    Ok(result.rows_affected > 0)
}

/// Удаление аренды; отсутствие строки — no-op
pub async fn delete(tenant_id: &str, lock_name: &str) -> anyhow::Result<()> {
    Entity::delete_many()
        .filter(Column::TenantId.eq(tenant_id))
        .filter(Column::LockName.eq(lock_name))
        .exec(conn())
        .await?;
    Ok(())
}
