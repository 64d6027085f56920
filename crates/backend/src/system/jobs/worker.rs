use tracing::{error, info, warn};

use super::queue::{self, ImportJobWorkItem};
use crate::domain::a004_import_job::repository as jobs;
use crate::shared::cache;
use crate::usecases::u501_import_waybills;

/// Прогресс сразу после взятия в работу (до выполнения движка)
const RUNNING_PROGRESS: i32 = 10;

/// Единственный консьюмер очереди импорта: строго FIFO, один элемент
/// полностью до следующего. Инвариант "не больше одного импорта в полете"
/// держится тем, что receiver существует в одном экземпляре.
pub async fn run_loop() {
    let mut receiver = match queue::take_receiver() {
        Some(rx) => rx,
        None => {
            error!("Import job worker receiver already taken, refusing to start a second worker");
            return;
        }
    };

    info!("Import job worker started");
    while let Some(item) = receiver.recv().await {
        process_item(item).await;
    }
    info!("Import job queue closed, worker stopping");
}

async fn process_item(item: ImportJobWorkItem) {
    let job_id = item.job_id;
    let tenant_id = item.tenant_id.clone();

    let job = match jobs::get_by_id(&tenant_id, job_id).await {
        Ok(Some(job)) => job,
        Ok(None) => {
            warn!("Import job row missing JobId={} Tenant={}", job_id, tenant_id);
            return;
        }
        Err(e) => {
            error!(
                "Failed to load import job JobId={} Tenant={}: {:#}",
                job_id, tenant_id, e
            );
            return;
        }
    };
    if job.status.is_terminal() {
        warn!(
            "Import job already terminal JobId={} Tenant={} Status={}",
            job_id,
            tenant_id,
            job.status.as_str()
        );
        return;
    }

    if let Err(e) = jobs::mark_running(&tenant_id, job_id, RUNNING_PROGRESS).await {
        error!(
            "Failed to mark import job running JobId={} Tenant={}: {:#}",
            job_id, tenant_id, e
        );
        return;
    }
    info!("Import job started JobId={} Tenant={}", job_id, tenant_id);

    match u501_import_waybills::run(&tenant_id, &item.csv_data, job_id).await {
        Ok(result) => {
            let written = with_one_retry(|| {
                jobs::mark_succeeded(
                    &tenant_id,
                    job_id,
                    result.total_rows,
                    result.inserted_count,
                    result.updated_count,
                    result.rejected_count,
                )
            })
            .await;

            match written {
                Ok(()) => {
                    cache::increment_version(&tenant_id, "import-async");
                    info!(
                        "Import job succeeded JobId={} Tenant={} Total={} Inserted={} Updated={} Rejected={}",
                        job_id,
                        tenant_id,
                        result.total_rows,
                        result.inserted_count,
                        result.updated_count,
                        result.rejected_count
                    );
                }
                Err(e) => {
                    // Задача остается в RUNNING — известный операционный
                    // разрыв, фиксируем его громко, а не молча
                    error!(
                        "Failed to record SUCCEEDED state, job stuck in RUNNING JobId={} Tenant={}: {:#}",
                        job_id, tenant_id, e
                    );
                }
            }
        }
        Err(run_error) => {
            error!(
                "Import job failed JobId={} Tenant={}: {:#}",
                job_id, tenant_id, run_error
            );
            let message = run_error.to_string();
            if let Err(e) =
                with_one_retry(|| jobs::mark_failed(&tenant_id, job_id, &message)).await
            {
                error!(
                    "Failed to record FAILED state, job stuck in RUNNING JobId={} Tenant={}: {:#}",
                    job_id, tenant_id, e
                );
            }
        }
    }
}

/// Терминальная запись ретраится один раз (стор мог быть временно недоступен)
async fn with_one_retry<F, Fut>(op: F) -> anyhow::Result<()>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = anyhow::Result<()>>,
{
    if let Err(first) = op().await {
        warn!("Terminal job state write failed, retrying once: {:#}", first);
        return op().await;
    }
    Ok(())
}
