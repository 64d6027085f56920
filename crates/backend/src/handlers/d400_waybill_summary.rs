use std::time::Duration;

use axum::extract::RawQuery;
use axum::http::StatusCode;
use axum::Json;

use crate::dashboards::d400_waybill_summary::service;
use crate::shared::cache;
use crate::shared::config;
use crate::system::tenant::Tenant;

/// GET /api/waybills/summary — сводка тенанта, инвалидация через версию кэша
pub async fn get_summary(
    Tenant(tenant_id): Tenant,
    RawQuery(raw_query): RawQuery,
) -> Result<Json<serde_json::Value>, StatusCode> {
    let version = cache::get_version(&tenant_id);
    let cache_key = cache::response_key(
        "summary",
        &tenant_id,
        version,
        raw_query.as_deref().unwrap_or(""),
    );
    if let Some(cached) = cache::response_get(&cache_key) {
        tracing::info!("Summary cache HIT Tenant={} Key={}", tenant_id, cache_key);
        return Ok(Json(cached));
    }
    tracing::info!("Summary cache MISS Tenant={} Key={}", tenant_id, cache_key);

    let summary = service::get_summary(&tenant_id).await.map_err(|e| {
        tracing::error!("Failed to build waybill summary: {:#}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    let value = serde_json::to_value(&summary).map_err(|e| {
        tracing::error!("Failed to serialize waybill summary: {:#}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    let ttl = Duration::from_secs(config::active().cache.default_ttl_seconds);
    cache::response_put(cache_key, value.clone(), ttl);
    Ok(Json(value))
}
