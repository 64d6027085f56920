use anyhow::Result;
use sea_orm::{FromQueryResult, Statement};

use crate::shared::data::db::get_connection;

/// Raw aggregation result from SQL query
#[derive(Debug, Clone, FromQueryResult)]
pub struct StatusAggregation {
    pub status: String,
    pub total_quantity: f64,
    pub total_amount: f64,
}

pub async fn get_status_totals(tenant_id: &str) -> Result<Vec<StatusAggregation>> {
    let db = get_connection();

    let sql = r#"
        SELECT
            w.status,
            COALESCE(SUM(w.quantity), 0) AS total_quantity,
            COALESCE(SUM(w.total_amount), 0) AS total_amount
        FROM a003_waybill w
        WHERE w.tenant_id = ?
        GROUP BY w.status
        ORDER BY w.status
    "#;

    let stmt = Statement::from_sql_and_values(
        sea_orm::DatabaseBackend::Sqlite,
        sql,
        [tenant_id.into()],
    );
    Ok(StatusAggregation::find_by_statement(stmt).all(db).await?)
}

#[derive(Debug, Clone, FromQueryResult)]
pub struct MonthlyAggregation {
    pub year: i32,
    pub month: i32,
    pub total_quantity: f64,
    pub total_amount: f64,
}

/// Итоги по месяцам даты доставки
pub async fn get_monthly_totals(tenant_id: &str) -> Result<Vec<MonthlyAggregation>> {
    let db = get_connection();

    let sql = r#"
        SELECT
            CAST(strftime('%Y', w.delivery_date) AS INTEGER) AS year,
            CAST(strftime('%m', w.delivery_date) AS INTEGER) AS month,
            COALESCE(SUM(w.quantity), 0) AS total_quantity,
            COALESCE(SUM(w.total_amount), 0) AS total_amount
        FROM a003_waybill w
        WHERE w.tenant_id = ?
        GROUP BY year, month
        ORDER BY year, month
    "#;

    let stmt = Statement::from_sql_and_values(
        sea_orm::DatabaseBackend::Sqlite,
        sql,
        [tenant_id.into()],
    );
    Ok(MonthlyAggregation::find_by_statement(stmt).all(db).await?)
}

#[derive(Debug, Clone, FromQueryResult)]
pub struct SupplierAggregation {
    pub supplier_id: String,
    pub supplier_name: String,
    pub total_quantity: f64,
}

pub async fn get_top_suppliers_by_quantity(
    tenant_id: &str,
    limit: u32,
) -> Result<Vec<SupplierAggregation>> {
    let db = get_connection();

    let sql = r#"
        SELECT
            w.supplier_id,
            s.name AS supplier_name,
            COALESCE(SUM(w.quantity), 0) AS total_quantity
        FROM a003_waybill w
        JOIN a002_supplier s ON w.supplier_id = s.id
        WHERE w.tenant_id = ?
        GROUP BY w.supplier_id, s.name
        ORDER BY total_quantity DESC
        LIMIT ?
    "#;

    let stmt = Statement::from_sql_and_values(
        sea_orm::DatabaseBackend::Sqlite,
        sql,
        [tenant_id.into(), limit.into()],
    );
    Ok(SupplierAggregation::find_by_statement(stmt).all(db).await?)
}

#[derive(Debug, Clone, FromQueryResult)]
pub struct ProjectAggregation {
    pub project_id: String,
    pub project_name: String,
    pub total_quantity: f64,
    pub total_amount: f64,
}

pub async fn get_project_totals(tenant_id: &str) -> Result<Vec<ProjectAggregation>> {
    let db = get_connection();

    let sql = r#"
        SELECT
            w.project_id,
            p.name AS project_name,
            COALESCE(SUM(w.quantity), 0) AS total_quantity,
            COALESCE(SUM(w.total_amount), 0) AS total_amount
        FROM a003_waybill w
        JOIN a001_project p ON w.project_id = p.id
        WHERE w.tenant_id = ?
        GROUP BY w.project_id, p.name
        ORDER BY total_amount DESC
    "#;

    let stmt = Statement::from_sql_and_values(
        sea_orm::DatabaseBackend::Sqlite,
        sql,
        [tenant_id.into()],
    );
    Ok(ProjectAggregation::find_by_statement(stmt).all(db).await?)
}

#[derive(Debug, Clone, FromQueryResult)]
pub struct SupplierStatusAggregation {
    pub status: String,
    pub total_quantity: f64,
    pub total_amount: f64,
}

/// Разбивка одного поставщика по статусам; пустой результат — поставщик без накладных
pub async fn get_supplier_breakdown(
    tenant_id: &str,
    supplier_id: &str,
) -> Result<Vec<SupplierStatusAggregation>> {
    let db = get_connection();

    let sql = r#"
        SELECT
            w.status,
            COALESCE(SUM(w.quantity), 0) AS total_quantity,
            COALESCE(SUM(w.total_amount), 0) AS total_amount
        FROM a003_waybill w
        WHERE w.tenant_id = ? AND w.supplier_id = ?
        GROUP BY w.status
        ORDER BY w.status
    "#;

    let stmt = Statement::from_sql_and_values(
        sea_orm::DatabaseBackend::Sqlite,
        sql,
        [tenant_id.into(), supplier_id.into()],
    );
    Ok(SupplierStatusAggregation::find_by_statement(stmt)
        .all(db)
        .await?)
}
