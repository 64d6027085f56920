pub mod dto;

pub use dto::{
    MonthlyTotals, ProjectTotals, StatusTotals, SupplierSummaryDto, TopSupplier, WaybillSummaryDto,
};
