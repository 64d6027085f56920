use axum::http::StatusCode;
use axum::Json;
use contracts::domain::a006_import_audit::ImportAuditDto;

use crate::domain::a006_import_audit;
use crate::system::tenant::Tenant;

/// GET /api/import-audits — аудит-факты импортов тенанта (новые сверху)
pub async fn list_all(
    Tenant(tenant_id): Tenant,
) -> Result<Json<serde_json::Value>, StatusCode> {
    let items: Vec<ImportAuditDto> = a006_import_audit::repository::list_by_tenant(&tenant_id)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list import audits: {:#}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .into_iter()
        .map(ImportAuditDto::from)
        .collect();
    Ok(Json(serde_json::json!(items)))
}
