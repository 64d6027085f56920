use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::a003_waybill::WaybillStatus;

/// Сводный дашборд по накладным тенанта
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaybillSummaryDto {
    pub status_totals: Vec<StatusTotals>,
    pub monthly_totals: Vec<MonthlyTotals>,
    pub top_suppliers_by_quantity: Vec<TopSupplier>,
    pub project_totals: Vec<ProjectTotals>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusTotals {
    pub status: WaybillStatus,
    pub total_quantity: f64,
    pub total_amount: f64,
}

/// Итоги по месяцу даты доставки
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyTotals {
    pub year: i32,
    pub month: u32,
    pub total_quantity: f64,
    pub total_amount: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopSupplier {
    pub supplier_id: Uuid,
    pub supplier_name: String,
    pub total_quantity: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectTotals {
    pub project_id: Uuid,
    pub project_name: String,
    pub total_quantity: f64,
    pub total_amount: f64,
}

/// Сводка по одному поставщику
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplierSummaryDto {
    pub supplier_id: Uuid,
    pub total_quantity: f64,
    pub total_amount: f64,
    pub breakdown_by_status: Vec<StatusTotals>,
}
