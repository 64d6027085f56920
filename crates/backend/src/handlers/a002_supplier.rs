use axum::extract::Path;
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

use crate::dashboards::d400_waybill_summary;
use crate::domain::a002_supplier;
use crate::system::tenant::Tenant;

/// GET /api/suppliers
pub async fn list_all(
    Tenant(tenant_id): Tenant,
) -> Result<Json<serde_json::Value>, StatusCode> {
    let items = a002_supplier::service::list_all(&tenant_id).await.map_err(|e| {
        tracing::error!("Failed to list suppliers: {:#}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    Ok(Json(serde_json::json!(items)))
}

/// GET /api/suppliers/:id/summary
pub async fn summary(
    Tenant(tenant_id): Tenant,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    let summary = d400_waybill_summary::service::get_supplier_summary(&tenant_id, id)
        .await
        .map_err(|e| {
            tracing::error!("Failed to get supplier summary: {:#}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(serde_json::json!(summary)))
}
