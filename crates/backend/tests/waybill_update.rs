//! Оптимистичные обновления, машина статусов, аренда и изоляция тенантов.

use std::time::Duration;

use backend::domain::{a003_waybill, a004_import_job, a005_execution_lock};
use backend::shared::cache;
use backend::shared::data::db;
use backend::shared::events;
use backend::system::audit;
use backend::usecases::u501_import_waybills;
use contracts::domain::a003_waybill::{WaybillQuery, WaybillStatus, WaybillUpdateRequest};
use uuid::Uuid;

const TENANT_A: &str = "tenant-a";
const TENANT_B: &str = "tenant-b";

const CSV_A: &str = "\
waybill_number,project,supplier,waybill_date,delivery_date,product,qty,price,total,status
WB-100,Shared Project,Shared Supplier,2024-01-01,2024-01-02,P1,2,10,20,PENDING
";

// Тот же номер и те же имена справочников — у другого тенанта
const CSV_B: &str = "\
waybill_number,project,supplier,waybill_date,delivery_date,product,qty,price,total,status
WB-100,Shared Project,Shared Supplier,2024-01-01,2024-01-03,P1,5,2,10,PENDING
";

fn fresh_db(name: &str) -> String {
    let path = format!("target/test-db/{}.db", name);
    for suffix in ["", "-wal", "-shm"] {
        let _ = std::fs::remove_file(format!("{}{}", path, suffix));
    }
    path
}

fn update_request(
    detail: &contracts::domain::a003_waybill::WaybillDetailDto,
    status: WaybillStatus,
) -> WaybillUpdateRequest {
    WaybillUpdateRequest {
        row_version_base64: detail.row_version_base64.clone(),
        delivery_date: detail.delivery_date,
        product_code: detail.product_code.clone(),
        quantity: detail.quantity,
        unit_price: detail.unit_price,
        total_amount: detail.total_amount,
        status,
    }
}

#[tokio::test]
async fn optimistic_updates_leases_and_tenant_isolation() {
    let path = fresh_db("waybill_update");
    db::initialize_database(Some(&path)).await.unwrap();

    let audit_rx = events::subscribe();
    tokio::spawn(audit::run_loop(audit_rx));

    // Сид: по одному файлу на каждого тенанта
    u501_import_waybills::run(TENANT_A, CSV_A.as_bytes(), Uuid::new_v4())
        .await
        .unwrap();
    u501_import_waybills::run(TENANT_B, CSV_B.as_bytes(), Uuid::new_v4())
        .await
        .unwrap();

    // --- Изоляция тенантов: одинаковые номера и имена, но списки не
    // пересекаются
    let page_a = a003_waybill::service::list(TENANT_A, &WaybillQuery::default())
        .await
        .unwrap();
    assert_eq!(page_a.total_count, 1);
    assert_eq!(page_a.items[0].quantity, 2.0);
    let page_b = a003_waybill::service::list(TENANT_B, &WaybillQuery::default())
        .await
        .unwrap();
    assert_eq!(page_b.total_count, 1);
    assert_eq!(page_b.items[0].quantity, 5.0);
    assert_eq!(page_a.items[0].waybill_number, page_b.items[0].waybill_number);
    assert_ne!(page_a.items[0].id, page_b.items[0].id);

    let id_a = page_a.items[0].id;

    // Чужой тенант не видит запись даже по точному id
    assert!(a003_waybill::service::get_detail(TENANT_B, id_a)
        .await
        .unwrap()
        .is_none());

    let detail = a003_waybill::service::get_detail(TENANT_A, id_a)
        .await
        .unwrap()
        .expect("record must exist for its own tenant");
    let token_t1 = detail.row_version_base64.clone();

    // --- Валидации до записи
    let mut bad = update_request(&detail, WaybillStatus::Pending);
    bad.row_version_base64 = String::new();
    assert!(matches!(
        a003_waybill::service::update(TENANT_A, id_a, &bad).await,
        Err(a003_waybill::service::UpdateWaybillError::Validation("ROW_VERSION_MISSING"))
    ));

    let mut bad = update_request(&detail, WaybillStatus::Pending);
    bad.row_version_base64 = "@@@".into();
    assert!(matches!(
        a003_waybill::service::update(TENANT_A, id_a, &bad).await,
        Err(a003_waybill::service::UpdateWaybillError::Validation("ROW_VERSION_INVALID"))
    ));

    let mut bad = update_request(&detail, WaybillStatus::Pending);
    bad.quantity = 100.0;
    bad.total_amount = 1000.0;
    assert!(matches!(
        a003_waybill::service::update(TENANT_A, id_a, &bad).await,
        Err(a003_waybill::service::UpdateWaybillError::Validation("QUANTITY_OUT_OF_RANGE"))
    ));

    let mut bad = update_request(&detail, WaybillStatus::Pending);
    bad.delivery_date = detail.waybill_date.pred_opt().unwrap();
    assert!(matches!(
        a003_waybill::service::update(TENANT_A, id_a, &bad).await,
        Err(a003_waybill::service::UpdateWaybillError::Validation(
            "DELIVERY_DATE_BEFORE_WAYBILL"
        ))
    ));

    let mut bad = update_request(&detail, WaybillStatus::Pending);
    bad.total_amount = detail.quantity * detail.unit_price + 0.5;
    assert!(matches!(
        a003_waybill::service::update(TENANT_A, id_a, &bad).await,
        Err(a003_waybill::service::UpdateWaybillError::Validation("TOTAL_MISMATCH"))
    ));

    // PENDING → DISPUTED запрещен
    assert!(matches!(
        a003_waybill::service::update(
            TENANT_A,
            id_a,
            &update_request(&detail, WaybillStatus::Disputed)
        )
        .await,
        Err(a003_waybill::service::UpdateWaybillError::Validation(
            "INVALID_STATUS_TRANSITION"
        ))
    ));

    // Несуществующий id → NotFound
    assert!(matches!(
        a003_waybill::service::update(
            TENANT_A,
            Uuid::new_v4(),
            &update_request(&detail, WaybillStatus::Pending)
        )
        .await,
        Err(a003_waybill::service::UpdateWaybillError::NotFound)
    ));

    // --- Успешное обновление: новый токен, версия кэша тенанта выросла
    let version_before = cache::get_version(TENANT_A);
    let updated = a003_waybill::service::update(
        TENANT_A,
        id_a,
        &update_request(&detail, WaybillStatus::Delivered),
    )
    .await
    .expect("update with fresh token must succeed");
    assert_eq!(updated.status, WaybillStatus::Delivered);
    assert_ne!(updated.row_version_base64, token_t1);
    assert_eq!(cache::get_version(TENANT_A), version_before + 1);

    // Повтор со старым токеном — конфликт, запись не применяется
    let mut stale = update_request(&updated, WaybillStatus::Disputed);
    stale.row_version_base64 = token_t1;
    assert!(matches!(
        a003_waybill::service::update(TENANT_A, id_a, &stale).await,
        Err(a003_waybill::service::UpdateWaybillError::Conflict)
    ));
    let still = a003_waybill::service::get_detail(TENANT_A, id_a)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(still.status, WaybillStatus::Delivered);

    // DELIVERED → DISPUTED разрешен; DISPUTED терминален
    let disputed = a003_waybill::service::update(
        TENANT_A,
        id_a,
        &update_request(&still, WaybillStatus::Disputed),
    )
    .await
    .unwrap();
    assert_eq!(disputed.status, WaybillStatus::Disputed);
    assert!(matches!(
        a003_waybill::service::update(
            TENANT_A,
            id_a,
            &update_request(&disputed, WaybillStatus::Pending)
        )
        .await,
        Err(a003_waybill::service::UpdateWaybillError::Validation(
            "INVALID_STATUS_TRANSITION"
        ))
    ));

    // --- Опрос задач скоупится тенантом
    let job = a004_import_job::service::create_queued(TENANT_A).await.unwrap();
    assert!(a004_import_job::service::get_by_id(TENANT_A, job.id)
        .await
        .unwrap()
        .is_some());
    assert!(a004_import_job::service::get_by_id(TENANT_B, job.id)
        .await
        .unwrap()
        .is_none());

    // --- Аренда: второй захват проигрывает, чужой тенант независим,
    // просроченная аренда переиспользуется
    assert!(
        a005_execution_lock::service::try_acquire(TENANT_A, "X", chrono::Duration::minutes(10))
            .await
            .unwrap()
    );
    assert!(
        !a005_execution_lock::service::try_acquire(TENANT_A, "X", chrono::Duration::minutes(10))
            .await
            .unwrap()
    );
    assert!(
        a005_execution_lock::service::try_acquire(TENANT_B, "X", chrono::Duration::minutes(10))
            .await
            .unwrap()
    );

    a005_execution_lock::service::release(TENANT_A, "X").await.unwrap();
    // Повторный release — no-op
    a005_execution_lock::service::release(TENANT_A, "X").await.unwrap();

    // Короткая аренда истекает и снова доступна
    assert!(a005_execution_lock::service::try_acquire(
        TENANT_A,
        "SHORT",
        chrono::Duration::milliseconds(200)
    )
    .await
    .unwrap());
    assert!(!a005_execution_lock::service::try_acquire(
        TENANT_A,
        "SHORT",
        chrono::Duration::minutes(10)
    )
    .await
    .unwrap());
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(a005_execution_lock::service::try_acquire(
        TENANT_A,
        "SHORT",
        chrono::Duration::minutes(10)
    )
    .await
    .unwrap());
}
