use std::time::Duration;

use axum::extract::{Multipart, Path, Query, RawQuery};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use contracts::domain::a003_waybill::{WaybillQuery, WaybillUpdateRequest};

use crate::domain::a003_waybill::service::{self, UpdateWaybillError};
use crate::domain::a004_import_job;
use crate::domain::a005_execution_lock;
use crate::shared::cache;
use crate::shared::config;
use crate::system::jobs::queue::{self, ImportJobWorkItem};
use crate::system::tenant::Tenant;
use crate::usecases::u501_import_waybills;

fn cache_ttl() -> Duration {
    Duration::from_secs(config::active().cache.default_ttl_seconds)
}

/// GET /api/waybills — список с фильтрами, read-through кэш поверх версии
pub async fn list(
    Tenant(tenant_id): Tenant,
    RawQuery(raw_query): RawQuery,
    Query(query): Query<WaybillQuery>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    let version = cache::get_version(&tenant_id);
    let cache_key = cache::response_key(
        "waybills",
        &tenant_id,
        version,
        raw_query.as_deref().unwrap_or(""),
    );
    if let Some(cached) = cache::response_get(&cache_key) {
        tracing::info!("Waybills cache HIT Tenant={} Key={}", tenant_id, cache_key);
        return Ok(Json(cached));
    }
    tracing::info!("Waybills cache MISS Tenant={} Key={}", tenant_id, cache_key);

    let result = service::list(&tenant_id, &query).await.map_err(|e| {
        tracing::error!("Failed to list waybills: {:#}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    let value = serde_json::to_value(&result).map_err(|e| {
        tracing::error!("Failed to serialize waybill list: {:#}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    cache::response_put(cache_key, value.clone(), cache_ttl());
    Ok(Json(value))
}

/// GET /api/waybills/:id
pub async fn get_by_id(
    Tenant(tenant_id): Tenant,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    let detail = service::get_detail(&tenant_id, id)
        .await
        .map_err(|e| {
            tracing::error!("Failed to get waybill by id: {:#}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(serde_json::json!(detail)))
}

/// PUT /api/waybills/:id — оптимистичное обновление.
/// 400 — валидация (с кодом), 404 — нет записи, 409 — конфликт токена.
pub async fn update(
    Tenant(tenant_id): Tenant,
    Path(id): Path<Uuid>,
    Json(body): Json<WaybillUpdateRequest>,
) -> Response {
    tracing::info!("Waybill update attempt Id={} Tenant={}", id, tenant_id);
    match service::update(&tenant_id, id, &body).await {
        Ok(detail) => Json(serde_json::json!(detail)).into_response(),
        Err(UpdateWaybillError::Validation(code)) => (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": code })),
        )
            .into_response(),
        Err(UpdateWaybillError::NotFound) => StatusCode::NOT_FOUND.into_response(),
        Err(UpdateWaybillError::Conflict) => (
            StatusCode::CONFLICT,
            Json(serde_json::json!({
                "error": "Waybill was modified by another user. Please reload."
            })),
        )
            .into_response(),
        Err(UpdateWaybillError::Internal(e)) => {
            tracing::error!("Failed to update waybill: {:#}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ImportParams {
    #[serde(rename = "async", default)]
    pub is_async: bool,
}

/// POST /api/waybills/import — multipart-поле "file".
/// Синхронно: 200 с итогом сверки. С ?async=true: 202 с jobId, задача
/// durable до ответа.
pub async fn import(
    Tenant(tenant_id): Tenant,
    Query(params): Query<ImportParams>,
    mut multipart: Multipart,
) -> Response {
    let mut csv_data: Option<Vec<u8>> = None;
    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() == Some("file") {
            match field.bytes().await {
                Ok(bytes) => csv_data = Some(bytes.to_vec()),
                Err(e) => {
                    tracing::warn!("Failed to read uploaded file: {}", e);
                }
            }
            break;
        }
    }

    let csv_data = match csv_data {
        Some(data) if !data.is_empty() => data,
        _ => {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({ "error": "File is required." })),
            )
                .into_response();
        }
    };

    if params.is_async {
        let job = match a004_import_job::service::create_queued(&tenant_id).await {
            Ok(job) => job,
            Err(e) => {
                tracing::error!("Failed to create import job: {:#}", e);
                return StatusCode::INTERNAL_SERVER_ERROR.into_response();
            }
        };
        if let Err(e) = queue::enqueue(ImportJobWorkItem {
            job_id: job.id,
            tenant_id: tenant_id.clone(),
            csv_data,
        }) {
            tracing::error!("Failed to enqueue import job {}: {:#}", job.id, e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
        return (
            StatusCode::ACCEPTED,
            Json(serde_json::json!({ "jobId": job.id })),
        )
            .into_response();
    }

    tracing::info!("CSV import started Tenant={} Mode=Sync", tenant_id);
    match u501_import_waybills::run(&tenant_id, &csv_data, Uuid::new_v4()).await {
        Ok(result) => {
            cache::increment_version(&tenant_id, "import-sync");
            Json(serde_json::json!(result)).into_response()
        }
        Err(e) => {
            tracing::error!("CSV import failed Tenant={}: {:#}", tenant_id, e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

const MONTHLY_REPORT_LOCK: &str = "MONTHLY_REPORT";
const MONTHLY_REPORT_LEASE_MINUTES: i64 = 10;
const MONTHLY_REPORT_WORK_SECONDS: u64 = 15;

/// POST /api/waybills/generate-monthly-report — долгая операция под арендой;
/// 409, если уже выполняется для тенанта
pub async fn generate_monthly_report(Tenant(tenant_id): Tenant) -> Response {
    let acquired = match a005_execution_lock::service::try_acquire(
        &tenant_id,
        MONTHLY_REPORT_LOCK,
        chrono::Duration::minutes(MONTHLY_REPORT_LEASE_MINUTES),
    )
    .await
    {
        Ok(acquired) => acquired,
        Err(e) => {
            tracing::error!("Failed to acquire report lease: {:#}", e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };
    if !acquired {
        return (
            StatusCode::CONFLICT,
            Json(serde_json::json!({ "error": "Report generation is already running" })),
        )
            .into_response();
    }

    // Заглушка долгой генерации; аренда снимается в любом случае
    tokio::time::sleep(Duration::from_secs(MONTHLY_REPORT_WORK_SECONDS)).await;

    if let Err(e) = a005_execution_lock::service::release(&tenant_id, MONTHLY_REPORT_LOCK).await {
        tracing::error!("Failed to release report lease: {:#}", e);
    }

    Json(serde_json::json!({
        "tenantId": tenant_id,
        "generatedAtUtc": chrono::Utc::now(),
        "durationSeconds": MONTHLY_REPORT_WORK_SECONDS,
    }))
    .into_response()
}
