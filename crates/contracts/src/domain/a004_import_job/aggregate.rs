use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Жизненный цикл фоновой задачи импорта.
///
/// QUEUED → RUNNING → SUCCEEDED | FAILED, назад переходов нет.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ImportJobStatus {
    Queued,
    Running,
    Succeeded,
    Failed,
}

impl ImportJobStatus {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "QUEUED" => Some(Self::Queued),
            "RUNNING" => Some(Self::Running),
            "SUCCEEDED" => Some(Self::Succeeded),
            "FAILED" => Some(Self::Failed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "QUEUED",
            Self::Running => "RUNNING",
            Self::Succeeded => "SUCCEEDED",
            Self::Failed => "FAILED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

/// Фоновая задача импорта; мутируется только воркером после создания
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportJob {
    pub id: Uuid,
    pub tenant_id: String,
    pub status: ImportJobStatus,
    pub progress_percent: Option<i32>,
    pub total_rows: Option<i32>,
    pub inserted_count: Option<i32>,
    pub updated_count: Option<i32>,
    pub rejected_count: Option<i32>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportJobDto {
    pub id: Uuid,
    pub status: ImportJobStatus,
    pub progress_percent: Option<i32>,
    pub total_rows: Option<i32>,
    pub inserted_count: Option<i32>,
    pub updated_count: Option<i32>,
    pub rejected_count: Option<i32>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ImportJob> for ImportJobDto {
    fn from(j: ImportJob) -> Self {
        Self {
            id: j.id,
            status: j.status,
            progress_percent: j.progress_percent,
            total_rows: j.total_rows,
            inserted_count: j.inserted_count,
            updated_count: j.updated_count,
            rejected_count: j.rejected_count,
            error: j.error,
            created_at: j.created_at,
            updated_at: j.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_parse() {
        for s in [
            ImportJobStatus::Queued,
            ImportJobStatus::Running,
            ImportJobStatus::Succeeded,
            ImportJobStatus::Failed,
        ] {
            assert_eq!(ImportJobStatus::parse(s.as_str()), Some(s));
        }
    }

    #[test]
    fn only_succeeded_and_failed_are_terminal() {
        assert!(!ImportJobStatus::Queued.is_terminal());
        assert!(!ImportJobStatus::Running.is_terminal());
        assert!(ImportJobStatus::Succeeded.is_terminal());
        assert!(ImportJobStatus::Failed.is_terminal());
    }
}
