use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Аренда (lease) для взаимного исключения долгих операций.
///
/// Ключ: (tenant_id, lock_name). Живой считается запись с expires_at в
/// будущем; просроченная аренда переиспользуется при следующем захвате.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionLease {
    pub tenant_id: String,
    pub lock_name: String,
    pub acquired_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub acquired_by: Option<String>,
}

impl ExecutionLease {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }
}
