use chrono::Utc;
use contracts::domain::a002_supplier::Supplier;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use sea_orm::entity::prelude::*;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set};

use crate::shared::data::db::get_connection;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "a002_supplier")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub tenant_id: String,
    pub name: String,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Supplier {
    fn from(m: Model) -> Self {
        Supplier {
            id: Uuid::parse_str(&m.id).unwrap_or_else(|_| Uuid::new_v4()),
            tenant_id: m.tenant_id,
            name: m.name,
            created_at: m.created_at.unwrap_or_else(Utc::now),
            updated_at: m.updated_at.unwrap_or_else(Utc::now),
        }
    }
}

fn conn() -> &'static DatabaseConnection {
    get_connection()
}

pub async fn list_all(tenant_id: &str) -> anyhow::Result<Vec<Supplier>> {
    let items = Entity::find()
        .filter(Column::TenantId.eq(tenant_id))
        .order_by_asc(Column::Name)
        .all(conn())
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(items)
}

pub async fn get_by_id(tenant_id: &str, id: Uuid) -> anyhow::Result<Option<Supplier>> {
    let result = Entity::find_by_id(id.to_string())
        .filter(Column::TenantId.eq(tenant_id))
        .one(conn())
        .await?;
    Ok(result.map(Into::into))
}

/// Выборка по множеству имен (сравнение без учета регистра — COLLATE NOCASE)
pub async fn find_by_names<C: ConnectionTrait>(
    db: &C,
    tenant_id: &str,
    names: &[String],
) -> anyhow::Result<Vec<Supplier>> {
    if names.is_empty() {
        return Ok(Vec::new());
    }
    let items = Entity::find()
        .filter(Column::TenantId.eq(tenant_id))
        .filter(Column::Name.is_in(names.iter().cloned()))
        .all(db)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(items)
}

/// Идентификаторы поставщиков, чье имя содержит подстроку (для поиска по списку)
pub async fn search_ids(tenant_id: &str, term: &str) -> anyhow::Result<Vec<String>> {
    let ids = Entity::find()
        .filter(Column::TenantId.eq(tenant_id))
        .filter(Column::Name.contains(term))
        .all(conn())
        .await?
        .into_iter()
        .map(|m| m.id)
        .collect();
    Ok(ids)
}

pub async fn find_by_ids(tenant_id: &str, ids: &[String]) -> anyhow::Result<Vec<Supplier>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let items = Entity::find()
        .filter(Column::TenantId.eq(tenant_id))
        .filter(Column::Id.is_in(ids.iter().cloned()))
        .all(conn())
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(items)
}

pub async fn insert<C: ConnectionTrait>(db: &C, supplier: &Supplier) -> anyhow::Result<()> {
    let active = ActiveModel {
        id: Set(supplier.id.to_string()),
        tenant_id: Set(supplier.tenant_id.clone()),
        name: Set(supplier.name.clone()),
        created_at: Set(Some(supplier.created_at)),
        updated_at: Set(Some(supplier.updated_at)),
    };
    active.insert(db).await?;
    Ok(())
}
