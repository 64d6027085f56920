use super::repository;
use contracts::domain::a001_project::{Project, ProjectDto};
use uuid::Uuid;

pub async fn list_all(tenant_id: &str) -> anyhow::Result<Vec<ProjectDto>> {
    let items = repository::list_all(tenant_id).await?;
    Ok(items.into_iter().map(ProjectDto::from).collect())
}

pub async fn get_by_id(tenant_id: &str, id: Uuid) -> anyhow::Result<Option<Project>> {
    repository::get_by_id(tenant_id, id).await
}
