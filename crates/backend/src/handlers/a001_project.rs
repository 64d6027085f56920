use axum::extract::Path;
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

use crate::domain::{a001_project, a003_waybill};
use crate::system::tenant::Tenant;

/// GET /api/projects
pub async fn list_all(
    Tenant(tenant_id): Tenant,
) -> Result<Json<serde_json::Value>, StatusCode> {
    let items = a001_project::service::list_all(&tenant_id).await.map_err(|e| {
        tracing::error!("Failed to list projects: {:#}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    Ok(Json(serde_json::json!(items)))
}

/// GET /api/projects/:id/waybills
pub async fn waybills_by_project(
    Tenant(tenant_id): Tenant,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    let project = a001_project::service::get_by_id(&tenant_id, id)
        .await
        .map_err(|e| {
            tracing::error!("Failed to get project: {:#}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;
    if project.is_none() {
        return Err(StatusCode::NOT_FOUND);
    }

    let items = a003_waybill::service::list_by_project(&tenant_id, id)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list project waybills: {:#}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;
    Ok(Json(serde_json::json!(items)))
}
