use chrono::Utc;
use contracts::domain::a006_import_audit::ImportAudit;
use contracts::usecases::u501_import_waybills::WaybillsImportedEvent;
use tokio::sync::broadcast;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::domain::a006_import_audit::repository;

/// Консьюмер аудита: пишет append-only строку на каждое событие импорта.
///
/// Подписка создается вызывающим ДО старта HTTP-сервера, чтобы первый же
/// импорт имел живого подписчика.
pub async fn run_loop(mut receiver: broadcast::Receiver<WaybillsImportedEvent>) {
    info!("Import audit consumer started");
    loop {
        match receiver.recv().await {
            Ok(event) => {
                if let Err(e) = persist(&event).await {
                    // Доставка at-least-once: потерянный аудит-факт виден в
                    // логе, переотправки на этом уровне нет
                    error!(
                        "Failed to persist import audit Tenant={} JobId={}: {:#}",
                        event.tenant_id, event.import_job_id, e
                    );
                }
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!("Import audit consumer lagged, {} event(s) skipped", skipped);
            }
            Err(broadcast::error::RecvError::Closed) => {
                info!("Import event topic closed, audit consumer stopping");
                return;
            }
        }
    }
}

async fn persist(event: &WaybillsImportedEvent) -> anyhow::Result<()> {
    info!(
        "Import audit consume Tenant={} JobId={}",
        event.tenant_id, event.import_job_id
    );
    repository::insert(&ImportAudit {
        id: Uuid::new_v4(),
        tenant_id: event.tenant_id.clone(),
        import_job_id: event.import_job_id,
        total_rows: event.total_rows,
        inserted_count: event.inserted_count,
        updated_count: event.updated_count,
        rejected_count: event.rejected_count,
        received_at: Utc::now(),
    })
    .await
}
