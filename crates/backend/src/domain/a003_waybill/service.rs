use std::collections::HashMap;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use contracts::domain::a003_waybill::{
    Waybill, WaybillDetailDto, WaybillListItemDto, WaybillQuery, WaybillUpdateRequest,
};
use contracts::shared::PagedResult;
use thiserror::Error;
use uuid::Uuid;

use super::repository;
use crate::domain::{a001_project, a002_supplier};
use crate::shared::cache;

/// Ошибки обновления накладной; хендлер мапит их в 400/404/409.
/// Конфликт конкурентности отличен от ошибок валидации: это сигнал
/// "перечитай и повтори", ретраев на этом уровне нет.
#[derive(Debug, Error)]
pub enum UpdateWaybillError {
    #[error("{0}")]
    Validation(&'static str),
    #[error("waybill not found")]
    NotFound,
    #[error("waybill was modified by another user")]
    Conflict,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Токен конкурентности хранится как непрозрачная строка, наружу уходит
/// в base64 (round-trip через PUT)
pub fn encode_row_version(row_version: &str) -> String {
    BASE64.encode(row_version.as_bytes())
}

pub fn decode_row_version(encoded: &str) -> Option<String> {
    let bytes = BASE64.decode(encoded.trim()).ok()?;
    String::from_utf8(bytes).ok()
}

pub async fn get_detail(
    tenant_id: &str,
    id: Uuid,
) -> anyhow::Result<Option<WaybillDetailDto>> {
    let waybill = match repository::get_by_id(tenant_id, id).await? {
        Some(w) => w,
        None => return Ok(None),
    };
    let project = a001_project::repository::get_by_id(tenant_id, waybill.project_id).await?;
    let supplier = a002_supplier::repository::get_by_id(tenant_id, waybill.supplier_id).await?;
    Ok(Some(to_detail_dto(
        &waybill,
        project.map(|p| p.name).unwrap_or_default(),
        supplier.map(|s| s.name).unwrap_or_default(),
    )))
}

pub async fn list(
    tenant_id: &str,
    q: &WaybillQuery,
) -> anyhow::Result<PagedResult<WaybillListItemDto>> {
    let (page, page_size) = PagedResult::<WaybillListItemDto>::normalize(q.page, q.page_size);

    let search_ids = match q.search.as_deref().map(str::trim) {
        Some(term) if !term.is_empty() => Some((
            a001_project::repository::search_ids(tenant_id, term).await?,
            a002_supplier::repository::search_ids(tenant_id, term).await?,
        )),
        _ => None,
    };

    let (waybills, total_count) =
        repository::list(tenant_id, q, search_ids, page, page_size).await?;

    // Имена проектов/поставщиков добираются пачкой по странице
    let project_ids: Vec<String> = waybills
        .iter()
        .map(|w| w.project_id.to_string())
        .collect::<std::collections::HashSet<_>>()
        .into_iter()
        .collect();
    let supplier_ids: Vec<String> = waybills
        .iter()
        .map(|w| w.supplier_id.to_string())
        .collect::<std::collections::HashSet<_>>()
        .into_iter()
        .collect();

    let project_names: HashMap<Uuid, String> =
        a001_project::repository::find_by_ids(tenant_id, &project_ids)
            .await?
            .into_iter()
            .map(|p| (p.id, p.name))
            .collect();
    let supplier_names: HashMap<Uuid, String> =
        a002_supplier::repository::find_by_ids(tenant_id, &supplier_ids)
            .await?
            .into_iter()
            .map(|s| (s.id, s.name))
            .collect();

    let items = waybills
        .into_iter()
        .map(|w| WaybillListItemDto {
            id: w.id,
            waybill_number: w.waybill_number.clone(),
            project_id: w.project_id,
            project_name: project_names.get(&w.project_id).cloned().unwrap_or_default(),
            supplier_id: w.supplier_id,
            supplier_name: supplier_names
                .get(&w.supplier_id)
                .cloned()
                .unwrap_or_default(),
            waybill_date: w.waybill_date,
            delivery_date: w.delivery_date,
            product_code: w.product_code.clone(),
            quantity: w.quantity,
            unit_price: w.unit_price,
            total_amount: w.total_amount,
            status: w.status,
            row_version_base64: encode_row_version(&w.row_version),
        })
        .collect();

    Ok(PagedResult {
        items,
        total_count,
        page,
        page_size,
    })
}

/// Накладные одного проекта (без пагинации, для карточки проекта)
pub async fn list_by_project(
    tenant_id: &str,
    project_id: Uuid,
) -> anyhow::Result<Vec<WaybillListItemDto>> {
    let waybills = repository::list_by_project(tenant_id, project_id).await?;

    let project_name = a001_project::repository::get_by_id(tenant_id, project_id)
        .await?
        .map(|p| p.name)
        .unwrap_or_default();
    let supplier_ids: Vec<String> = waybills
        .iter()
        .map(|w| w.supplier_id.to_string())
        .collect::<std::collections::HashSet<_>>()
        .into_iter()
        .collect();
    let supplier_names: HashMap<Uuid, String> =
        a002_supplier::repository::find_by_ids(tenant_id, &supplier_ids)
            .await?
            .into_iter()
            .map(|s| (s.id, s.name))
            .collect();

    Ok(waybills
        .into_iter()
        .map(|w| WaybillListItemDto {
            id: w.id,
            waybill_number: w.waybill_number.clone(),
            project_id: w.project_id,
            project_name: project_name.clone(),
            supplier_id: w.supplier_id,
            supplier_name: supplier_names
                .get(&w.supplier_id)
                .cloned()
                .unwrap_or_default(),
            waybill_date: w.waybill_date,
            delivery_date: w.delivery_date,
            product_code: w.product_code.clone(),
            quantity: w.quantity,
            unit_price: w.unit_price,
            total_amount: w.total_amount,
            status: w.status,
            row_version_base64: encode_row_version(&w.row_version),
        })
        .collect())
}

/// Обновление накладной с оптимистичной блокировкой.
///
/// Валидации не трогают стор; единственная запись — условный UPDATE по
/// (id, tenant, row_version), меняющий токен атомарно с полями.
pub async fn update(
    tenant_id: &str,
    id: Uuid,
    req: &WaybillUpdateRequest,
) -> Result<WaybillDetailDto, UpdateWaybillError> {
    if req.row_version_base64.trim().is_empty() {
        tracing::warn!(
            "Waybill update validation failed Id={} Tenant={} Reason=RowVersionMissing",
            id,
            tenant_id
        );
        return Err(UpdateWaybillError::Validation("ROW_VERSION_MISSING"));
    }

    let expected_row_version = match decode_row_version(&req.row_version_base64) {
        Some(v) => v,
        None => {
            tracing::warn!(
                "Waybill update validation failed Id={} Tenant={} Reason=RowVersionInvalid",
                id,
                tenant_id
            );
            return Err(UpdateWaybillError::Validation("ROW_VERSION_INVALID"));
        }
    };

    let waybill = repository::get_by_id(tenant_id, id)
        .await?
        .ok_or(UpdateWaybillError::NotFound)?;

    if !Waybill::quantity_in_range(req.quantity) {
        tracing::warn!(
            "Waybill update validation failed Id={} Tenant={} Reason=QuantityOutOfRange",
            id,
            tenant_id
        );
        return Err(UpdateWaybillError::Validation("QUANTITY_OUT_OF_RANGE"));
    }

    if req.delivery_date < waybill.waybill_date {
        tracing::warn!(
            "Waybill update validation failed Id={} Tenant={} Reason=DeliveryDateBeforeWaybill",
            id,
            tenant_id
        );
        return Err(UpdateWaybillError::Validation("DELIVERY_DATE_BEFORE_WAYBILL"));
    }

    if !Waybill::total_matches(req.quantity, req.unit_price, req.total_amount) {
        tracing::warn!(
            "Waybill update validation failed Id={} Tenant={} Reason=TotalMismatch",
            id,
            tenant_id
        );
        return Err(UpdateWaybillError::Validation("TOTAL_MISMATCH"));
    }

    if !waybill.status.can_transition_to(req.status) {
        tracing::warn!(
            "Invalid status transition Id={} Tenant={} From={} To={}",
            id,
            tenant_id,
            waybill.status.as_str(),
            req.status.as_str()
        );
        return Err(UpdateWaybillError::Validation("INVALID_STATUS_TRANSITION"));
    }

    let new_row_version = Uuid::new_v4().to_string();
    let written = repository::conditional_update(
        tenant_id,
        id,
        &expected_row_version,
        req,
        &new_row_version,
    )
    .await?;

    if !written {
        tracing::warn!(
            "Waybill update concurrency conflict Id={} Tenant={}",
            id,
            tenant_id
        );
        return Err(UpdateWaybillError::Conflict);
    }

    cache::increment_version(tenant_id, "waybill-update");
    tracing::info!("Waybill updated Id={} Tenant={}", id, tenant_id);

    get_detail(tenant_id, id)
        .await?
        .ok_or(UpdateWaybillError::NotFound)
}

fn to_detail_dto(w: &Waybill, project_name: String, supplier_name: String) -> WaybillDetailDto {
    WaybillDetailDto {
        id: w.id,
        waybill_number: w.waybill_number.clone(),
        project_id: w.project_id,
        project_name,
        supplier_id: w.supplier_id,
        supplier_name,
        waybill_date: w.waybill_date,
        delivery_date: w.delivery_date,
        product_code: w.product_code.clone(),
        quantity: w.quantity,
        unit_price: w.unit_price,
        total_amount: w.total_amount,
        status: w.status,
        row_version_base64: encode_row_version(&w.row_version),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_version_round_trips_through_base64() {
        let token = Uuid::new_v4().to_string();
        let encoded = encode_row_version(&token);
        assert_eq!(decode_row_version(&encoded), Some(token));
    }

    #[test]
    fn garbage_row_version_fails_to_decode() {
        assert_eq!(decode_row_version("@@@not-base64@@@"), None);
    }

    #[test]
    fn decode_trims_surrounding_whitespace() {
        let encoded = format!("  {}  ", encode_row_version("abc"));
        assert_eq!(decode_row_version(&encoded), Some("abc".to_string()));
    }
}
