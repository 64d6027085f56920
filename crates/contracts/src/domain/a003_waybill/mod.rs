pub mod aggregate;
pub mod dto;

pub use aggregate::{Waybill, WaybillStatus};
pub use dto::{WaybillDetailDto, WaybillListItemDto, WaybillQuery, WaybillUpdateRequest};
