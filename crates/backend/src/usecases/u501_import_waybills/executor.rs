//! Сверка CSV с хранилищем: построчная валидация, разрешение справочников,
//! upsert накладных одной транзакцией и публикация итогового события.

use std::collections::{HashMap, HashSet};

use chrono::{NaiveDate, Utc};
use contracts::domain::a001_project::Project;
use contracts::domain::a002_supplier::Supplier;
use contracts::domain::a003_waybill::{Waybill, WaybillStatus};
use contracts::usecases::u501_import_waybills::{
    ImportResult, RejectedRow, WarningRow, WaybillsImportedEvent,
};
use sea_orm::TransactionTrait;
use uuid::Uuid;

use super::csv_rows::{self, RawRow, RowRead};
use crate::domain::{a001_project, a002_supplier, a003_waybill};
use crate::shared::data::db::get_connection;
use crate::shared::events;

/// Провалидированная строка, готовая к upsert
#[derive(Debug)]
struct ParsedRow {
    waybill_number: String,
    project_name: String,
    supplier_name: String,
    waybill_date: NaiveDate,
    delivery_date: NaiveDate,
    product_code: String,
    quantity: f64,
    unit_price: f64,
    total_amount: f64,
    status: WaybillStatus,
}

/// Запуск сверки для тенанта. `import_job_id` — корреляционный id прогона
/// (на синхронном пути генерируется на месте).
///
/// Строчные ошибки никогда не валят прогон — они данные результата.
/// Ошибки инфраструктуры и неудача публикации события — жесткий отказ.
pub async fn run(
    tenant_id: &str,
    csv_data: &[u8],
    import_job_id: Uuid,
) -> anyhow::Result<ImportResult> {
    if tenant_id.trim().is_empty() {
        anyhow::bail!("TenantId is not set for the current request");
    }

    let mut result = ImportResult::default();

    let rows = match csv_rows::read_rows(csv_data) {
        Some(rows) => rows,
        // Пустой вход без заголовка: пустой результат, события нет
        None => return Ok(result),
    };

    let mut valid_rows: Vec<ParsedRow> = Vec::new();
    let mut seen_numbers: HashSet<String> = HashSet::new();

    for row in rows {
        result.total_rows += 1;
        let raw = match row {
            RowRead::Row(raw) => raw,
            RowRead::Malformed { line } => {
                result.rejected_count += 1;
                result.rejected_rows.push(RejectedRow {
                    row_number: line,
                    errors: vec!["INVALID_ROW".to_string()],
                });
                continue;
            }
        };

        let row_number = raw.line;
        match validate_row(tenant_id, &raw) {
            Err(errors) => {
                tracing::warn!(
                    "Import validation failed Tenant={} Row={} Errors={}",
                    tenant_id,
                    row_number,
                    errors.join(",")
                );
                result.rejected_count += 1;
                result.rejected_rows.push(RejectedRow {
                    row_number,
                    errors: errors.into_iter().map(String::from).collect(),
                });
            }
            Ok((parsed, warnings)) => {
                if !warnings.is_empty() {
                    if warnings.contains(&"PRICE_DISCREPANCY") {
                        tracing::warn!(
                            "Price discrepancy Tenant={} Row={}",
                            tenant_id,
                            row_number
                        );
                    }
                    result.warnings.push(WarningRow {
                        row_number,
                        warnings: warnings.into_iter().map(String::from).collect(),
                    });
                }

                if !seen_numbers.insert(parsed.waybill_number.to_lowercase()) {
                    // Дубль внутри файла не отклоняется: поздняя строка победит
                    tracing::warn!(
                        "Duplicate waybill number in CSV Tenant={} Row={} WaybillNumber={}",
                        tenant_id,
                        row_number,
                        parsed.waybill_number
                    );
                }
                valid_rows.push(parsed);
            }
        }
    }

    if !valid_rows.is_empty() {
        reconcile(tenant_id, &valid_rows, &mut result).await?;
    }

    // Событие — часть контракта операции; его провал не считается успехом
    events::publish_waybills_imported(WaybillsImportedEvent {
        tenant_id: tenant_id.to_string(),
        import_job_id,
        total_rows: result.total_rows,
        inserted_count: result.inserted_count,
        updated_count: result.updated_count,
        rejected_count: result.rejected_count,
        occurred_at: Utc::now(),
    })?;

    tracing::info!(
        "CSV import completed Tenant={} Total={} Inserted={} Updated={} Rejected={}",
        tenant_id,
        result.total_rows,
        result.inserted_count,
        result.updated_count,
        result.rejected_count
    );
    Ok(result)
}

/// Пакетная сверка: три запроса по множествам ключей, затем
/// resolve-or-create и upsert в порядке файла, всё в одной транзакции.
async fn reconcile(
    tenant_id: &str,
    valid_rows: &[ParsedRow],
    result: &mut ImportResult,
) -> anyhow::Result<()> {
    let project_names = distinct_ci(valid_rows.iter().map(|r| r.project_name.as_str()));
    let supplier_names = distinct_ci(valid_rows.iter().map(|r| r.supplier_name.as_str()));
    let waybill_numbers = distinct_ci(valid_rows.iter().map(|r| r.waybill_number.as_str()));

    let txn = get_connection().begin().await?;

    let mut project_lookup: HashMap<String, Project> =
        a001_project::repository::find_by_names(&txn, tenant_id, &project_names)
            .await?
            .into_iter()
            .map(|p| (p.name.to_lowercase(), p))
            .collect();
    let mut supplier_lookup: HashMap<String, Supplier> =
        a002_supplier::repository::find_by_names(&txn, tenant_id, &supplier_names)
            .await?
            .into_iter()
            .map(|s| (s.name.to_lowercase(), s))
            .collect();
    let mut waybill_lookup: HashMap<String, Waybill> =
        a003_waybill::repository::find_by_numbers(&txn, tenant_id, &waybill_numbers)
            .await?
            .into_iter()
            .map(|w| (w.waybill_number.to_lowercase(), w))
            .collect();

    for row in valid_rows {
        let project_key = row.project_name.to_lowercase();
        let project_id = match project_lookup.get(&project_key) {
            Some(p) => p.id,
            None => {
                let project =
                    Project::new_for_insert(tenant_id.to_string(), row.project_name.clone());
                a001_project::repository::insert(&txn, &project).await?;
                let id = project.id;
                // Созданное сразу видно последующим строкам пакета
                project_lookup.insert(project_key, project);
                id
            }
        };

        let supplier_key = row.supplier_name.to_lowercase();
        let supplier_id = match supplier_lookup.get(&supplier_key) {
            Some(s) => s.id,
            None => {
                let supplier =
                    Supplier::new_for_insert(tenant_id.to_string(), row.supplier_name.clone());
                a002_supplier::repository::insert(&txn, &supplier).await?;
                let id = supplier.id;
                supplier_lookup.insert(supplier_key, supplier);
                id
            }
        };

        let number_key = row.waybill_number.to_lowercase();
        match waybill_lookup.get(&number_key) {
            Some(existing) => {
                tracing::warn!(
                    "Duplicate waybill detected in DB Tenant={} WaybillNumber={}",
                    tenant_id,
                    row.waybill_number
                );
                let updated = Waybill {
                    id: existing.id,
                    tenant_id: existing.tenant_id.clone(),
                    waybill_number: existing.waybill_number.clone(),
                    project_id,
                    supplier_id,
                    waybill_date: row.waybill_date,
                    delivery_date: row.delivery_date,
                    product_code: row.product_code.clone(),
                    quantity: row.quantity,
                    unit_price: row.unit_price,
                    total_amount: row.total_amount,
                    status: row.status,
                    row_version: Uuid::new_v4().to_string(),
                    created_at: existing.created_at,
                    updated_at: Utc::now(),
                };
                a003_waybill::repository::update_from_import(&txn, &updated).await?;
                waybill_lookup.insert(number_key, updated);
                result.updated_count += 1;
            }
            None => {
                let now = Utc::now();
                let waybill = Waybill {
                    id: Uuid::new_v4(),
                    tenant_id: tenant_id.to_string(),
                    waybill_number: row.waybill_number.clone(),
                    project_id,
                    supplier_id,
                    waybill_date: row.waybill_date,
                    delivery_date: row.delivery_date,
                    product_code: row.product_code.clone(),
                    quantity: row.quantity,
                    unit_price: row.unit_price,
                    total_amount: row.total_amount,
                    status: row.status,
                    row_version: Uuid::new_v4().to_string(),
                    created_at: now,
                    updated_at: now,
                };
                a003_waybill::repository::insert(&txn, &waybill).await?;
                waybill_lookup.insert(number_key, waybill);
                result.inserted_count += 1;
            }
        }
    }

    txn.commit().await?;
    Ok(())
}

fn distinct_ci<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for v in values {
        if seen.insert(v.to_lowercase()) {
            out.push(v.to_string());
        }
    }
    out
}

/// Валидация одной строки. Коды ошибок копятся все применимые, без
/// остановки на первой; предупреждения не блокируют персист.
fn validate_row(
    request_tenant: &str,
    raw: &RawRow,
) -> Result<(ParsedRow, Vec<&'static str>), Vec<&'static str>> {
    let mut errors: Vec<&'static str> = Vec::new();
    let mut warnings: Vec<&'static str> = Vec::new();

    if let Some(row_tenant) = raw.tenant_id.as_deref().map(str::trim) {
        if !row_tenant.is_empty() && !row_tenant.eq_ignore_ascii_case(request_tenant) {
            errors.push("TENANT_MISMATCH");
        }
    }

    let waybill_number = required(&raw.waybill_number, "WAYBILL_NUMBER_REQUIRED", &mut errors);
    let project_name = required(&raw.project_name, "PROJECT_NAME_REQUIRED", &mut errors);
    let supplier_name = required(&raw.supplier_name, "SUPPLIER_NAME_REQUIRED", &mut errors);
    let product_code = required(&raw.product_code, "PRODUCT_CODE_REQUIRED", &mut errors);

    let waybill_date = parse_date(raw.waybill_date.as_deref());
    if waybill_date.is_none() {
        errors.push("INVALID_WAYBILL_DATE");
    }
    let delivery_date = parse_date(raw.delivery_date.as_deref());
    if delivery_date.is_none() {
        errors.push("INVALID_DELIVERY_DATE");
    }
    if let (Some(wd), Some(dd)) = (waybill_date, delivery_date) {
        if dd < wd {
            errors.push("DELIVERY_BEFORE_WAYBILL");
        }
    }

    let quantity = parse_number(raw.quantity.as_deref());
    match quantity {
        None => errors.push("INVALID_QUANTITY"),
        Some(q) if !Waybill::quantity_in_range(q) => errors.push("QUANTITY_OUT_OF_RANGE"),
        Some(_) => {}
    }

    let unit_price = parse_number(raw.unit_price.as_deref());
    if unit_price.is_none() {
        errors.push("INVALID_UNIT_PRICE");
    }

    let total_amount = parse_number(raw.total_amount.as_deref());
    if total_amount.is_none() {
        errors.push("INVALID_TOTAL_AMOUNT");
    }

    let status = raw
        .status
        .as_deref()
        .and_then(WaybillStatus::parse);
    if status.is_none() {
        errors.push("INVALID_STATUS");
    }

    if let (Some(q), Some(p), Some(t)) = (quantity, unit_price, total_amount) {
        // Строка персистится с заявленным total; расхождение — предупреждение
        if !Waybill::total_matches(q, p, t) {
            warnings.push("PRICE_DISCREPANCY");
        }
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok((
        ParsedRow {
            waybill_number: waybill_number.unwrap_or_default(),
            project_name: project_name.unwrap_or_default(),
            supplier_name: supplier_name.unwrap_or_default(),
            waybill_date: waybill_date.unwrap_or_default(),
            delivery_date: delivery_date.unwrap_or_default(),
            product_code: product_code.unwrap_or_default(),
            quantity: quantity.unwrap_or_default(),
            unit_price: unit_price.unwrap_or_default(),
            total_amount: total_amount.unwrap_or_default(),
            status: status.unwrap_or(WaybillStatus::Pending),
        },
        warnings,
    ))
}

fn required(
    value: &Option<String>,
    code: &'static str,
    errors: &mut Vec<&'static str>,
) -> Option<String> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Some(v.to_string()),
        _ => {
            errors.push(code);
            None
        }
    }
}

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%d.%m.%Y", "%d/%m/%Y"];
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];

fn parse_date(value: Option<&str>) -> Option<NaiveDate> {
    let value = value?.trim();
    if value.is_empty() {
        return None;
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(value, fmt) {
            return Some(d);
        }
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(value, fmt) {
            return Some(dt.date());
        }
    }
    None
}

fn parse_number(value: Option<&str>) -> Option<f64> {
    let value = value?.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(n) = value.parse::<f64>() {
        return Some(n);
    }
    // Запятая как десятичный разделитель ("1,5")
    if value.contains(',') && !value.contains('.') {
        if let Ok(n) = value.replace(',', ".").parse::<f64>() {
            return Some(n);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(overrides: impl FnOnce(&mut RawRow)) -> RawRow {
        let mut row = RawRow {
            line: 2,
            tenant_id: None,
            waybill_number: Some("WB-1".into()),
            project_name: Some("ProjA".into()),
            supplier_name: Some("SupX".into()),
            waybill_date: Some("2024-01-01".into()),
            delivery_date: Some("2024-01-02".into()),
            product_code: Some("P1".into()),
            quantity: Some("2".into()),
            unit_price: Some("10".into()),
            total_amount: Some("20".into()),
            status: Some("PENDING".into()),
        };
        overrides(&mut row);
        row
    }

    #[test]
    fn clean_row_passes_without_warnings() {
        let (parsed, warnings) = validate_row("t1", &raw(|_| {})).expect("row must validate");
        assert!(warnings.is_empty());
        assert_eq!(parsed.waybill_number, "WB-1");
        assert_eq!(parsed.status, WaybillStatus::Pending);
        assert_eq!(parsed.quantity, 2.0);
    }

    #[test]
    fn errors_accumulate_across_checks() {
        let row = raw(|r| {
            r.waybill_number = None;
            r.status = Some("SHIPPED".into());
        });
        let errors = validate_row("t1", &row).unwrap_err();
        assert_eq!(errors, vec!["WAYBILL_NUMBER_REQUIRED", "INVALID_STATUS"]);
    }

    #[test]
    fn every_missing_required_field_gets_its_code() {
        let row = raw(|r| {
            r.waybill_number = Some("   ".into());
            r.project_name = None;
            r.supplier_name = Some("".into());
            r.product_code = None;
        });
        let errors = validate_row("t1", &row).unwrap_err();
        assert_eq!(
            errors,
            vec![
                "WAYBILL_NUMBER_REQUIRED",
                "PROJECT_NAME_REQUIRED",
                "SUPPLIER_NAME_REQUIRED",
                "PRODUCT_CODE_REQUIRED"
            ]
        );
    }

    #[test]
    fn tenant_mismatch_is_case_insensitive() {
        let same = raw(|r| r.tenant_id = Some("T1".into()));
        assert!(validate_row("t1", &same).is_ok());

        let other = raw(|r| r.tenant_id = Some("t2".into()));
        let errors = validate_row("t1", &other).unwrap_err();
        assert_eq!(errors, vec!["TENANT_MISMATCH"]);
    }

    #[test]
    fn delivery_before_waybill_is_rejected() {
        let row = raw(|r| {
            r.waybill_date = Some("2024-01-05".into());
            r.delivery_date = Some("2024-01-02".into());
        });
        let errors = validate_row("t1", &row).unwrap_err();
        assert_eq!(errors, vec!["DELIVERY_BEFORE_WAYBILL"]);
    }

    #[test]
    fn quantity_bounds_are_inclusive() {
        for q in ["0.5", "50"] {
            let row = raw(|r| {
                r.quantity = Some(q.into());
                // total пересчитан, чтобы не ловить warning
                r.total_amount = Some(format!("{}", q.parse::<f64>().unwrap() * 10.0));
            });
            assert!(validate_row("t1", &row).is_ok(), "quantity {} must pass", q);
        }
        for q in ["0.4", "50.01", "-1"] {
            let row = raw(|r| r.quantity = Some(q.into()));
            let errors = validate_row("t1", &row).unwrap_err();
            assert!(
                errors.contains(&"QUANTITY_OUT_OF_RANGE"),
                "quantity {} must fail",
                q
            );
        }
    }

    #[test]
    fn unparsable_numbers_are_coded() {
        let row = raw(|r| {
            r.quantity = Some("abc".into());
            r.unit_price = Some("".into());
            r.total_amount = Some("x".into());
        });
        let errors = validate_row("t1", &row).unwrap_err();
        assert_eq!(
            errors,
            vec!["INVALID_QUANTITY", "INVALID_UNIT_PRICE", "INVALID_TOTAL_AMOUNT"]
        );
    }

    #[test]
    fn price_discrepancy_is_a_warning_within_tolerance() {
        // ровно на границе допуска — без предупреждения
        let on_edge = raw(|r| r.total_amount = Some("20.01".into()));
        let (_, warnings) = validate_row("t1", &on_edge).unwrap();
        assert!(warnings.is_empty());

        // за границей — предупреждение, но строка валидна
        let past_edge = raw(|r| r.total_amount = Some("20.02".into()));
        let (parsed, warnings) = validate_row("t1", &past_edge).unwrap();
        assert_eq!(warnings, vec!["PRICE_DISCREPANCY"]);
        // персистится заявленный total, не вычисленный
        assert_eq!(parsed.total_amount, 20.02);
    }

    #[test]
    fn date_formats_are_flexible() {
        assert!(parse_date(Some("2024-01-31")).is_some());
        assert!(parse_date(Some("01/31/2024")).is_some());
        assert!(parse_date(Some("31.01.2024")).is_some());
        assert!(parse_date(Some("2024-01-31T10:20:30")).is_some());
        assert!(parse_date(Some("not-a-date")).is_none());
        assert!(parse_date(Some("")).is_none());
    }

    #[test]
    fn comma_decimal_separator_is_accepted() {
        assert_eq!(parse_number(Some("1,5")), Some(1.5));
        assert_eq!(parse_number(Some("1.5")), Some(1.5));
        assert_eq!(parse_number(Some("1,000.5")), None); // смешанный формат не принимаем
    }

    #[test]
    fn status_parse_is_case_insensitive() {
        let row = raw(|r| r.status = Some("delivered".into()));
        let (parsed, _) = validate_row("t1", &row).unwrap();
        assert_eq!(parsed.status, WaybillStatus::Delivered);
    }
}
