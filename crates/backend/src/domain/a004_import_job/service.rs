use chrono::Utc;
use contracts::domain::a004_import_job::{ImportJob, ImportJobDto, ImportJobStatus};
use uuid::Uuid;

use super::repository;

/// Создает строку задачи в статусе QUEUED и возвращает ее.
/// Вставка происходит до постановки в очередь — опрос по id работает сразу.
pub async fn create_queued(tenant_id: &str) -> anyhow::Result<ImportJob> {
    let now = Utc::now();
    let job = ImportJob {
        id: Uuid::new_v4(),
        tenant_id: tenant_id.to_string(),
        status: ImportJobStatus::Queued,
        progress_percent: Some(0),
        total_rows: None,
        inserted_count: None,
        updated_count: None,
        rejected_count: None,
        error: None,
        created_at: now,
        updated_at: now,
    };
    repository::insert(&job).await?;
    tracing::info!("Import job created JobId={} Tenant={}", job.id, tenant_id);
    Ok(job)
}

pub async fn get_by_id(tenant_id: &str, id: Uuid) -> anyhow::Result<Option<ImportJobDto>> {
    Ok(repository::get_by_id(tenant_id, id)
        .await?
        .map(ImportJobDto::from))
}
