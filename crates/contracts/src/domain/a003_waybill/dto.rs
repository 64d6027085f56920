use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::aggregate::WaybillStatus;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaybillListItemDto {
    pub id: Uuid,
    pub waybill_number: String,
    pub project_id: Uuid,
    pub project_name: String,
    pub supplier_id: Uuid,
    pub supplier_name: String,
    pub waybill_date: NaiveDate,
    pub delivery_date: NaiveDate,
    pub product_code: String,
    pub quantity: f64,
    pub unit_price: f64,
    pub total_amount: f64,
    pub status: WaybillStatus,
    /// Токен конкурентности для round-trip в PUT
    pub row_version_base64: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaybillDetailDto {
    pub id: Uuid,
    pub waybill_number: String,
    pub project_id: Uuid,
    pub project_name: String,
    pub supplier_id: Uuid,
    pub supplier_name: String,
    pub waybill_date: NaiveDate,
    pub delivery_date: NaiveDate,
    pub product_code: String,
    pub quantity: f64,
    pub unit_price: f64,
    pub total_amount: f64,
    pub status: WaybillStatus,
    pub row_version_base64: String,
}

/// Payload обновления накладной (оптимистичная блокировка)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaybillUpdateRequest {
    #[serde(default)]
    pub row_version_base64: String,
    pub delivery_date: NaiveDate,
    pub product_code: String,
    pub quantity: f64,
    pub unit_price: f64,
    pub total_amount: f64,
    pub status: WaybillStatus,
}

/// Фильтры списка накладных + пагинация
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaybillQuery {
    #[serde(default)]
    pub page: u64,
    #[serde(default)]
    pub page_size: u64,
    pub status: Option<WaybillStatus>,
    pub waybill_date_from: Option<NaiveDate>,
    pub waybill_date_to: Option<NaiveDate>,
    pub delivery_date_from: Option<NaiveDate>,
    pub delivery_date_to: Option<NaiveDate>,
    pub project_id: Option<Uuid>,
    pub supplier_id: Option<Uuid>,
    pub product_code: Option<String>,
    /// Поиск по имени проекта или поставщика (substring)
    pub search: Option<String>,
}
