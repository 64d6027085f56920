use chrono::{Duration, Utc};
use contracts::domain::a005_execution_lock::ExecutionLease;

use super::repository;

/// Попытка захватить аренду (tenant, name) на duration.
///
/// Это lease, а не строгий мьютекс: держатель, переживший duration без
/// release, автоматически теряет защиту. Вызывающий обязан выбирать duration
/// с запасом относительно худшего времени защищаемой операции.
pub async fn try_acquire(
    tenant_id: &str,
    lock_name: &str,
    duration: Duration,
) -> anyhow::Result<bool> {
    let now = Utc::now();
    let expires_at = now + duration;

    let existing = repository::find(tenant_id, lock_name).await?;

    match existing {
        None => {
            let lease = ExecutionLease {
                tenant_id: tenant_id.to_string(),
                lock_name: lock_name.to_string(),
                acquired_at: now,
                expires_at,
                acquired_by: None,
            };
            let acquired = repository::try_insert(&lease).await?;
            if acquired {
                tracing::info!("Lease acquired Tenant={} Lock={}", tenant_id, lock_name);
            }
            Ok(acquired)
        }
        Some(lease) if lease.is_expired(now) => {
            // Условный UPDATE: из двух гонящихся за просроченной арендой
            // выигрывает ровно один
            let refreshed =
                repository::refresh_if_expired(tenant_id, lock_name, now, expires_at).await?;
            if refreshed {
                tracing::info!(
                    "Expired lease reacquired Tenant={} Lock={}",
                    tenant_id,
                    lock_name
                );
            }
            Ok(refreshed)
        }
        Some(_) => Ok(false),
    }
}

/// Снятие аренды; отсутствие аренды — молчаливый no-op (идемпотентно)
pub async fn release(tenant_id: &str, lock_name: &str) -> anyhow::Result<()> {
    repository::delete(tenant_id, lock_name).await?;
    tracing::info!("Lease released Tenant={} Lock={}", tenant_id, lock_name);
    Ok(())
}
