use chrono::Utc;
use contracts::domain::a003_waybill::{Waybill, WaybillQuery, WaybillStatus, WaybillUpdateRequest};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use sea_orm::entity::prelude::*;
use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    Set,
};

use crate::shared::data::db::get_connection;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "a003_waybill")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub tenant_id: String,
    pub waybill_number: String,
    pub project_id: String,
    pub supplier_id: String,
    pub waybill_date: chrono::NaiveDate,
    pub delivery_date: chrono::NaiveDate,
    pub product_code: String,
    pub quantity: f64,
    pub unit_price: f64,
    pub total_amount: f64,
    pub status: String,
    pub row_version: String,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Waybill {
    fn from(m: Model) -> Self {
        Waybill {
            id: Uuid::parse_str(&m.id).unwrap_or_else(|_| Uuid::new_v4()),
            tenant_id: m.tenant_id,
            waybill_number: m.waybill_number,
            project_id: Uuid::parse_str(&m.project_id).unwrap_or_else(|_| Uuid::new_v4()),
            supplier_id: Uuid::parse_str(&m.supplier_id).unwrap_or_else(|_| Uuid::new_v4()),
            waybill_date: m.waybill_date,
            delivery_date: m.delivery_date,
            product_code: m.product_code,
            quantity: m.quantity,
            unit_price: m.unit_price,
            total_amount: m.total_amount,
            status: WaybillStatus::parse(&m.status).unwrap_or(WaybillStatus::Pending),
            row_version: m.row_version,
            created_at: m.created_at.unwrap_or_else(Utc::now),
            updated_at: m.updated_at.unwrap_or_else(Utc::now),
        }
    }
}

fn conn() -> &'static DatabaseConnection {
    get_connection()
}

pub async fn get_by_id(tenant_id: &str, id: Uuid) -> anyhow::Result<Option<Waybill>> {
    let result = Entity::find_by_id(id.to_string())
        .filter(Column::TenantId.eq(tenant_id))
        .one(conn())
        .await?;
    Ok(result.map(Into::into))
}

/// Выборка по множеству номеров накладных (COLLATE NOCASE на колонке)
pub async fn find_by_numbers<C: ConnectionTrait>(
    db: &C,
    tenant_id: &str,
    numbers: &[String],
) -> anyhow::Result<Vec<Waybill>> {
    if numbers.is_empty() {
        return Ok(Vec::new());
    }
    let items = Entity::find()
        .filter(Column::TenantId.eq(tenant_id))
        .filter(Column::WaybillNumber.is_in(numbers.iter().cloned()))
        .all(db)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(items)
}

pub async fn list_by_project(tenant_id: &str, project_id: Uuid) -> anyhow::Result<Vec<Waybill>> {
    let items = Entity::find()
        .filter(Column::TenantId.eq(tenant_id))
        .filter(Column::ProjectId.eq(project_id.to_string()))
        .order_by_desc(Column::DeliveryDate)
        .all(conn())
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(items)
}

/// Список с фильтрами и пагинацией.
///
/// `search_ids` — заранее найденные id проектов и поставщиков, чьи имена
/// содержат строку поиска; накладная проходит, если совпал любой из двух.
pub async fn list(
    tenant_id: &str,
    q: &WaybillQuery,
    search_ids: Option<(Vec<String>, Vec<String>)>,
    page: u64,
    page_size: u64,
) -> anyhow::Result<(Vec<Waybill>, u64)> {
    let mut select = Entity::find().filter(Column::TenantId.eq(tenant_id));

    if let Some(status) = q.status {
        select = select.filter(Column::Status.eq(status.as_str()));
    }
    if let Some(from) = q.waybill_date_from {
        select = select.filter(Column::WaybillDate.gte(from));
    }
    if let Some(to) = q.waybill_date_to {
        select = select.filter(Column::WaybillDate.lte(to));
    }
    if let Some(from) = q.delivery_date_from {
        select = select.filter(Column::DeliveryDate.gte(from));
    }
    if let Some(to) = q.delivery_date_to {
        select = select.filter(Column::DeliveryDate.lte(to));
    }
    if let Some(project_id) = q.project_id {
        select = select.filter(Column::ProjectId.eq(project_id.to_string()));
    }
    if let Some(supplier_id) = q.supplier_id {
        select = select.filter(Column::SupplierId.eq(supplier_id.to_string()));
    }
    if let Some(product_code) = q.product_code.as_deref() {
        let product_code = product_code.trim();
        if !product_code.is_empty() {
            select = select.filter(Column::ProductCode.eq(product_code));
        }
    }
    if let Some((project_ids, supplier_ids)) = search_ids {
        select = select.filter(
            Condition::any()
                .add(Column::ProjectId.is_in(project_ids))
                .add(Column::SupplierId.is_in(supplier_ids)),
        );
    }

    let select = select
        .order_by_desc(Column::DeliveryDate)
        .order_by_desc(Column::WaybillDate);

    let paginator = select.paginate(conn(), page_size);
    let total = paginator.num_items().await?;
    let items = paginator
        .fetch_page(page - 1)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok((items, total as u64))
}

pub async fn insert<C: ConnectionTrait>(db: &C, w: &Waybill) -> anyhow::Result<()> {
    let active = ActiveModel {
        id: Set(w.id.to_string()),
        tenant_id: Set(w.tenant_id.clone()),
        waybill_number: Set(w.waybill_number.clone()),
        project_id: Set(w.project_id.to_string()),
        supplier_id: Set(w.supplier_id.to_string()),
        waybill_date: Set(w.waybill_date),
        delivery_date: Set(w.delivery_date),
        product_code: Set(w.product_code.clone()),
        quantity: Set(w.quantity),
        unit_price: Set(w.unit_price),
        total_amount: Set(w.total_amount),
        status: Set(w.status.as_str().to_string()),
        row_version: Set(w.row_version.clone()),
        created_at: Set(Some(w.created_at)),
        updated_at: Set(Some(w.updated_at)),
    };
    active.insert(db).await?;
    Ok(())
}

/// Перезапись изменяемых полей при повторном импорте того же номера.
/// Номер и tenant не трогаются; row_version заменяется.
pub async fn update_from_import<C: ConnectionTrait>(db: &C, w: &Waybill) -> anyhow::Result<()> {
    let active = ActiveModel {
        id: Set(w.id.to_string()),
        project_id: Set(w.project_id.to_string()),
        supplier_id: Set(w.supplier_id.to_string()),
        waybill_date: Set(w.waybill_date),
        delivery_date: Set(w.delivery_date),
        product_code: Set(w.product_code.clone()),
        quantity: Set(w.quantity),
        unit_price: Set(w.unit_price),
        total_amount: Set(w.total_amount),
        status: Set(w.status.as_str().to_string()),
        row_version: Set(w.row_version.clone()),
        updated_at: Set(Some(Utc::now())),
        ..Default::default()
    };
    active.update(db).await?;
    Ok(())
}

/// Условная запись: compare-and-swap по row_version.
///
/// UPDATE ... WHERE id = ? AND tenant_id = ? AND row_version = ?;
/// ноль затронутых строк — проигранный конфликт конкурентности.
pub async fn conditional_update(
    tenant_id: &str,
    id: Uuid,
    expected_row_version: &str,
    req: &WaybillUpdateRequest,
    new_row_version: &str,
) -> anyhow::Result<bool> {
    use sea_orm::sea_query::Expr;

    let result = Entity::update_many()
        .col_expr(Column::DeliveryDate, Expr::value(req.delivery_date))
        .col_expr(Column::ProductCode, Expr::value(req.product_code.trim()))
        .col_expr(Column::Quantity, Expr::value(req.quantity))
        .col_expr(Column::UnitPrice, Expr::value(req.unit_price))
        .col_expr(Column::TotalAmount, Expr::value(req.total_amount))
        .col_expr(Column::Status, Expr::value(req.status.as_str()))
        .col_expr(Column::RowVersion, Expr::value(new_row_version))
        .col_expr(Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(Column::Id.eq(id.to_string()))
        .filter(Column::TenantId.eq(tenant_id))
        .filter(Column::RowVersion.eq(expected_row_version))
        .exec(conn())
        .await?;
    Ok(result.rows_affected > 0)
}
