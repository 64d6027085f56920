use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Status
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum WaybillStatus {
    Pending,
    Delivered,
    Cancelled,
    Disputed,
}

impl WaybillStatus {
    /// Разбор статуса без учета регистра ("pending" == "PENDING")
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Some(Self::Pending),
            "DELIVERED" => Some(Self::Delivered),
            "CANCELLED" => Some(Self::Cancelled),
            "DISPUTED" => Some(Self::Disputed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Delivered => "DELIVERED",
            Self::Cancelled => "CANCELLED",
            Self::Disputed => "DISPUTED",
        }
    }

    /// Допустимые переходы статуса накладной.
    ///
    /// Переход в тот же статус всегда разрешен (no-op). CANCELLED и DISPUTED
    /// терминальные.
    pub fn can_transition_to(self, to: Self) -> bool {
        if self == to {
            return true;
        }

        match self {
            Self::Pending => matches!(to, Self::Delivered | Self::Cancelled),
            Self::Delivered => matches!(to, Self::Disputed),
            Self::Cancelled => false,
            Self::Disputed => false,
        }
    }
}

// ============================================================================
// Aggregate
// ============================================================================

/// Накладная. Идентичность: tenant_id + waybill_number (уникальны в паре).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Waybill {
    pub id: Uuid,
    pub tenant_id: String,
    pub waybill_number: String,
    pub project_id: Uuid,
    pub supplier_id: Uuid,
    pub waybill_date: NaiveDate,
    pub delivery_date: NaiveDate,
    pub product_code: String,
    pub quantity: f64,
    pub unit_price: f64,
    pub total_amount: f64,
    pub status: WaybillStatus,
    /// Токен оптимистичной блокировки, меняется при каждой записи
    pub row_version: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Waybill {
    pub const QUANTITY_MIN: f64 = 0.5;
    pub const QUANTITY_MAX: f64 = 50.0;
    pub const PRICE_TOLERANCE: f64 = 0.01;

    pub fn quantity_in_range(quantity: f64) -> bool {
        (Self::QUANTITY_MIN..=Self::QUANTITY_MAX).contains(&quantity)
    }

    pub fn total_matches(quantity: f64, unit_price: f64, total_amount: f64) -> bool {
        (quantity * unit_price - total_amount).abs() <= Self::PRICE_TOLERANCE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_to_delivered_is_allowed() {
        assert!(WaybillStatus::Pending.can_transition_to(WaybillStatus::Delivered));
    }

    #[test]
    fn pending_to_cancelled_is_allowed() {
        assert!(WaybillStatus::Pending.can_transition_to(WaybillStatus::Cancelled));
    }

    #[test]
    fn pending_to_disputed_is_rejected() {
        assert!(!WaybillStatus::Pending.can_transition_to(WaybillStatus::Disputed));
    }

    #[test]
    fn delivered_to_disputed_is_allowed() {
        assert!(WaybillStatus::Delivered.can_transition_to(WaybillStatus::Disputed));
    }

    #[test]
    fn delivered_to_pending_is_rejected() {
        assert!(!WaybillStatus::Delivered.can_transition_to(WaybillStatus::Pending));
    }

    #[test]
    fn cancelled_is_terminal() {
        assert!(!WaybillStatus::Cancelled.can_transition_to(WaybillStatus::Delivered));
        assert!(!WaybillStatus::Cancelled.can_transition_to(WaybillStatus::Pending));
        assert!(!WaybillStatus::Cancelled.can_transition_to(WaybillStatus::Disputed));
    }

    #[test]
    fn disputed_is_terminal_except_self() {
        assert!(WaybillStatus::Disputed.can_transition_to(WaybillStatus::Disputed));
        assert!(!WaybillStatus::Disputed.can_transition_to(WaybillStatus::Delivered));
    }

    #[test]
    fn same_status_is_noop_transition() {
        for s in [
            WaybillStatus::Pending,
            WaybillStatus::Delivered,
            WaybillStatus::Cancelled,
            WaybillStatus::Disputed,
        ] {
            assert!(s.can_transition_to(s));
        }
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(WaybillStatus::parse("pending"), Some(WaybillStatus::Pending));
        assert_eq!(
            WaybillStatus::parse("  Delivered "),
            Some(WaybillStatus::Delivered)
        );
        assert_eq!(WaybillStatus::parse("UNKNOWN"), None);
        assert_eq!(WaybillStatus::parse(""), None);
    }
}
