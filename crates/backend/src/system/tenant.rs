use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    Json,
};

pub const TENANT_HEADER: &str = "X-Tenant-ID";

/// Extractor тенанта из заголовка X-Tenant-ID.
///
/// Usage in handlers: `async fn handler(Tenant(tenant_id): Tenant) -> Response`.
/// Запрос без тенанта отклоняется до того, как управление дойдет до ядра;
/// все операции ниже неявно скоупятся этим значением.
pub struct Tenant(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for Tenant
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<serde_json::Value>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(TENANT_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .unwrap_or_default();

        if value.is_empty() {
            return Err((
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({
                    "error": format!("{} header is required.", TENANT_HEADER)
                })),
            ));
        }

        Ok(Tenant(value.to_string()))
    }
}
