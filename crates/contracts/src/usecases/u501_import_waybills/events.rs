use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Событие о завершенном прогоне импорта.
///
/// Публикуется ровно один раз на успешный прогон; консьюмеры обязаны быть
/// идемпотентными к повторной доставке.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaybillsImportedEvent {
    pub tenant_id: String,
    pub import_job_id: Uuid,
    pub total_rows: i32,
    pub inserted_count: i32,
    pub updated_count: i32,
    pub rejected_count: i32,
    pub occurred_at: DateTime<Utc>,
}
