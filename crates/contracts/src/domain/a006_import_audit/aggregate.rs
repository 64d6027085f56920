use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Аудит-факт о завершенном импорте (append-only, пишется консьюмером)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportAudit {
    pub id: Uuid,
    pub tenant_id: String,
    pub import_job_id: Uuid,
    pub total_rows: i32,
    pub inserted_count: i32,
    pub updated_count: i32,
    pub rejected_count: i32,
    pub received_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportAuditDto {
    pub id: Uuid,
    pub import_job_id: Uuid,
    pub total_rows: i32,
    pub inserted_count: i32,
    pub updated_count: i32,
    pub rejected_count: i32,
    pub received_at: DateTime<Utc>,
}

impl From<ImportAudit> for ImportAuditDto {
    fn from(a: ImportAudit) -> Self {
        Self {
            id: a.id,
            import_job_id: a.import_job_id,
            total_rows: a.total_rows,
            inserted_count: a.inserted_count,
            updated_count: a.updated_count,
            rejected_count: a.rejected_count,
            received_at: a.received_at,
        }
    }
}
