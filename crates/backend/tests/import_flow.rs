//! End-to-end прогон импорта: пайплайн фоновых задач (оба терминальных
//! статуса), сверка, ленивые справочники, дубликаты и аудит-консьюмер.
//!
//! Один последовательный сценарий на файл: состояние (БД, очередь, топик)
//! в процессе одно.

use std::time::Duration;

use backend::domain::{a001_project, a002_supplier, a003_waybill, a004_import_job, a006_import_audit};
use backend::shared::data::db;
use backend::shared::events;
use backend::system::audit;
use backend::system::jobs::{queue, worker};
use backend::usecases::u501_import_waybills;
use contracts::domain::a003_waybill::{WaybillQuery, WaybillStatus};
use contracts::domain::a004_import_job::ImportJobStatus;
use uuid::Uuid;

const TENANT: &str = "acme";

const SAMPLE_CSV: &str = "\
waybill_number,project,supplier,waybill_date,delivery_date,product,qty,price,total,status
WB-1,ProjA,SupX,2024-01-01,2024-01-02,P1,2,10,20,PENDING
";

fn fresh_db(name: &str) -> String {
    let path = format!("target/test-db/{}.db", name);
    for suffix in ["", "-wal", "-shm"] {
        let _ = std::fs::remove_file(format!("{}{}", path, suffix));
    }
    path
}

async fn wait_for_job(tenant: &str, id: Uuid, wanted: ImportJobStatus) -> contracts::domain::a004_import_job::ImportJobDto {
    for _ in 0..100 {
        if let Some(job) = a004_import_job::service::get_by_id(tenant, id).await.unwrap() {
            if job.status == wanted {
                return job;
            }
            assert!(
                !job.status.is_terminal(),
                "job reached unexpected terminal state {:?}",
                job.status
            );
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("job {} did not reach {:?} in time", id, wanted);
}

#[tokio::test]
async fn import_pipeline_and_reconciliation() {
    let path = fresh_db("import_flow");
    db::initialize_database(Some(&path)).await.unwrap();

    tokio::spawn(worker::run_loop());

    // --- Асинхронный путь без подписчика топика: публикация после коммита
    // проваливается, воркер фиксирует FAILED с текстом причины
    let failed_job = a004_import_job::service::create_queued(TENANT).await.unwrap();
    queue::enqueue(queue::ImportJobWorkItem {
        job_id: failed_job.id,
        tenant_id: TENANT.to_string(),
        csv_data: SAMPLE_CSV.as_bytes().to_vec(),
    })
    .unwrap();

    let job = wait_for_job(TENANT, failed_job.id, ImportJobStatus::Failed).await;
    assert_eq!(job.progress_percent, Some(100));
    assert!(
        job.error.as_deref().unwrap_or("").contains("publish"),
        "error must mention the publish failure, got {:?}",
        job.error
    );

    // Строки при этом легли (коммит был до публикации) — повторный импорт
    // ниже даст update, не insert
    let audit_rx = events::subscribe();
    tokio::spawn(audit::run_loop(audit_rx));

    // --- Успешный фоновый прогон
    let ok_job = a004_import_job::service::create_queued(TENANT).await.unwrap();
    queue::enqueue(queue::ImportJobWorkItem {
        job_id: ok_job.id,
        tenant_id: TENANT.to_string(),
        csv_data: SAMPLE_CSV.as_bytes().to_vec(),
    })
    .unwrap();

    let job = wait_for_job(TENANT, ok_job.id, ImportJobStatus::Succeeded).await;
    assert_eq!(job.progress_percent, Some(100));
    assert_eq!(job.total_rows, Some(1));
    assert_eq!(job.inserted_count, Some(0));
    assert_eq!(job.updated_count, Some(1));
    assert_eq!(job.rejected_count, Some(0));
    assert_eq!(job.error, None);

    // Справочники созданы лениво и ровно по одному разу
    let projects = a001_project::service::list_all(TENANT).await.unwrap();
    assert_eq!(projects.len(), 1);
    assert_eq!(projects[0].name, "ProjA");
    let suppliers = a002_supplier::service::list_all(TENANT).await.unwrap();
    assert_eq!(suppliers.len(), 1);
    assert_eq!(suppliers[0].name, "SupX");

    // Аудит-консьюмер дописывает строку по событию
    let mut audits = Vec::new();
    for _ in 0..100 {
        audits = a006_import_audit::repository::list_by_job(TENANT, ok_job.id)
            .await
            .unwrap();
        if !audits.is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    assert_eq!(audits.len(), 1);
    assert_eq!(audits[0].total_rows, 1);
    assert_eq!(audits[0].updated_count, 1);

    // --- Синхронный повторный импорт с измененными полями: update, а не
    // второй insert; (tenant, number) остается уникальным
    let changed = "\
waybill_number,project,supplier,waybill_date,delivery_date,product,qty,price,total,status
WB-1,ProjA,SupX,2024-01-01,2024-01-05,P2,3,10,30,DELIVERED
";
    let result = u501_import_waybills::run(TENANT, changed.as_bytes(), Uuid::new_v4())
        .await
        .unwrap();
    assert_eq!(result.total_rows, 1);
    assert_eq!(result.inserted_count, 0);
    assert_eq!(result.updated_count, 1);

    let page = a003_waybill::service::list(TENANT, &WaybillQuery::default())
        .await
        .unwrap();
    assert_eq!(page.total_count, 1);
    let item = &page.items[0];
    assert_eq!(item.waybill_number, "WB-1");
    assert_eq!(item.product_code, "P2");
    assert_eq!(item.quantity, 3.0);
    assert_eq!(item.status, WaybillStatus::Delivered);

    // --- Дубль номера внутри файла: последняя строка побеждает, одна запись
    let duplicates = "\
waybill_number,project,supplier,waybill_date,delivery_date,product,qty,price,total,status
WB-2,ProjA,SupX,2024-02-01,2024-02-02,P1,1,5,5,PENDING
WB-2,ProjB,SupX,2024-02-01,2024-02-03,P9,4,5,20,PENDING
";
    let result = u501_import_waybills::run(TENANT, duplicates.as_bytes(), Uuid::new_v4())
        .await
        .unwrap();
    assert_eq!(result.total_rows, 2);
    assert_eq!(result.inserted_count, 1);
    assert_eq!(result.updated_count, 1);

    let mut q = WaybillQuery::default();
    q.search = Some("ProjB".to_string());
    let page = a003_waybill::service::list(TENANT, &q).await.unwrap();
    assert_eq!(page.total_count, 1);
    assert_eq!(page.items[0].waybill_number, "WB-2");
    assert_eq!(page.items[0].product_code, "P9");
    assert_eq!(page.items[0].quantity, 4.0);

    // Номера сверяются без учета регистра: wb-2 == WB-2 → update
    let case_variant = "\
waybill_number,project,supplier,waybill_date,delivery_date,product,qty,price,total,status
wb-2,ProjB,SupX,2024-02-01,2024-02-04,P9,4,5,20,PENDING
";
    let result = u501_import_waybills::run(TENANT, case_variant.as_bytes(), Uuid::new_v4())
        .await
        .unwrap();
    assert_eq!(result.inserted_count, 0);
    assert_eq!(result.updated_count, 1);

    // --- Смешанный файл: отклоненные строки с полными списками кодов,
    // предупреждение о расхождении цены не блокирует персист
    let mixed = "\
waybill_number,project,supplier,waybill_date,delivery_date,product,qty,price,total,status
,ProjA,SupX,2024-03-01,2024-03-02,P1,2,10,20,SHIPPED
WB-3,ProjA,SupX,2024-03-01,2024-03-02,P1,2,10,25,PENDING
WB-4,ProjA,SupX,2024-03-05,2024-03-01,P1,99,10,990,PENDING
";
    let result = u501_import_waybills::run(TENANT, mixed.as_bytes(), Uuid::new_v4())
        .await
        .unwrap();
    assert_eq!(result.total_rows, 3);
    assert_eq!(result.rejected_count, 2);
    assert_eq!(result.inserted_count, 1);

    let first_reject = &result.rejected_rows[0];
    assert_eq!(first_reject.row_number, 2);
    assert_eq!(
        first_reject.errors,
        vec!["WAYBILL_NUMBER_REQUIRED", "INVALID_STATUS"]
    );
    let second_reject = &result.rejected_rows[1];
    assert_eq!(second_reject.row_number, 4);
    assert_eq!(
        second_reject.errors,
        vec!["DELIVERY_BEFORE_WAYBILL", "QUANTITY_OUT_OF_RANGE"]
    );

    assert_eq!(result.warnings.len(), 1);
    assert_eq!(result.warnings[0].row_number, 3);
    assert_eq!(result.warnings[0].warnings, vec!["PRICE_DISCREPANCY"]);

    // Строка с предупреждением персистится с заявленным total
    let mut q = WaybillQuery::default();
    q.search = Some("ProjA".into());
    let page = a003_waybill::service::list(TENANT, &q).await.unwrap();
    let wb3 = page
        .items
        .iter()
        .find(|i| i.waybill_number == "WB-3")
        .expect("WB-3 must be persisted");
    assert_eq!(wb3.total_amount, 25.0);

    // Пустой вход без заголовка: пустой результат
    let empty = u501_import_waybills::run(TENANT, b"", Uuid::new_v4())
        .await
        .unwrap();
    assert_eq!(empty.total_rows, 0);
    assert_eq!(empty.rejected_count, 0);
}
