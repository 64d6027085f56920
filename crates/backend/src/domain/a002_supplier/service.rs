use super::repository;
use contracts::domain::a002_supplier::{Supplier, SupplierDto};
use uuid::Uuid;

pub async fn list_all(tenant_id: &str) -> anyhow::Result<Vec<SupplierDto>> {
    let items = repository::list_all(tenant_id).await?;
    Ok(items.into_iter().map(SupplierDto::from).collect())
}

pub async fn get_by_id(tenant_id: &str, id: Uuid) -> anyhow::Result<Option<Supplier>> {
    repository::get_by_id(tenant_id, id).await
}
