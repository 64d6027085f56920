use axum::extract::Path;
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

use crate::domain::a004_import_job;
use crate::system::tenant::Tenant;

/// GET /api/import-jobs/:id — снапшот задачи для опроса; чужой тенант
/// получает 404, как и несуществующий id
pub async fn get_by_id(
    Tenant(tenant_id): Tenant,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    let job = a004_import_job::service::get_by_id(&tenant_id, id)
        .await
        .map_err(|e| {
            tracing::error!("Failed to get import job: {:#}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(serde_json::json!(job)))
}
