use anyhow::Result;
use contracts::dashboards::d400_waybill_summary::{
    MonthlyTotals, ProjectTotals, StatusTotals, SupplierSummaryDto, TopSupplier, WaybillSummaryDto,
};
use contracts::domain::a003_waybill::WaybillStatus;
use uuid::Uuid;

use super::repository;

const TOP_SUPPLIERS_LIMIT: u32 = 5;

/// Сводный дашборд тенанта (кэшируется хендлером через версию кэша)
pub async fn get_summary(tenant_id: &str) -> Result<WaybillSummaryDto> {
    let status_totals = repository::get_status_totals(tenant_id)
        .await?
        .into_iter()
        .filter_map(|a| {
            WaybillStatus::parse(&a.status).map(|status| StatusTotals {
                status,
                total_quantity: a.total_quantity,
                total_amount: a.total_amount,
            })
        })
        .collect();

    let monthly_totals = repository::get_monthly_totals(tenant_id)
        .await?
        .into_iter()
        .map(|a| MonthlyTotals {
            year: a.year,
            month: a.month as u32,
            total_quantity: a.total_quantity,
            total_amount: a.total_amount,
        })
        .collect();

    let top_suppliers_by_quantity =
        repository::get_top_suppliers_by_quantity(tenant_id, TOP_SUPPLIERS_LIMIT)
            .await?
            .into_iter()
            .filter_map(|a| {
                Uuid::parse_str(&a.supplier_id).ok().map(|id| TopSupplier {
                    supplier_id: id,
                    supplier_name: a.supplier_name,
                    total_quantity: a.total_quantity,
                })
            })
            .collect();

    let project_totals = repository::get_project_totals(tenant_id)
        .await?
        .into_iter()
        .filter_map(|a| {
            Uuid::parse_str(&a.project_id).ok().map(|id| ProjectTotals {
                project_id: id,
                project_name: a.project_name,
                total_quantity: a.total_quantity,
                total_amount: a.total_amount,
            })
        })
        .collect();

    Ok(WaybillSummaryDto {
        status_totals,
        monthly_totals,
        top_suppliers_by_quantity,
        project_totals,
    })
}

/// Сводка по одному поставщику; None — накладных у поставщика нет
pub async fn get_supplier_summary(
    tenant_id: &str,
    supplier_id: Uuid,
) -> Result<Option<SupplierSummaryDto>> {
    let breakdown = repository::get_supplier_breakdown(tenant_id, &supplier_id.to_string()).await?;
    if breakdown.is_empty() {
        return Ok(None);
    }

    let mut total_quantity = 0.0;
    let mut total_amount = 0.0;
    let breakdown_by_status: Vec<StatusTotals> = breakdown
        .into_iter()
        .filter_map(|a| {
            total_quantity += a.total_quantity;
            total_amount += a.total_amount;
            WaybillStatus::parse(&a.status).map(|status| StatusTotals {
                status,
                total_quantity: a.total_quantity,
                total_amount: a.total_amount,
            })
        })
        .collect();

    Ok(Some(SupplierSummaryDto {
        supplier_id,
        total_quantity,
        total_amount,
        breakdown_by_status,
    }))
}
