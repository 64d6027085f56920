//! Чтение CSV: гибкое сопоставление заголовков и извлечение сырых строк.
//!
//! Порядок колонок не важен; заголовок сравнивается после trim+lowercase со
//! списком принятых алиасов. Лишние колонки игнорируются.

use csv::ReaderBuilder;

const TENANT_ID_ALIASES: &[&str] = &["tenant_id", "tenantid", "tenant"];
const WAYBILL_NUMBER_ALIASES: &[&str] = &[
    "waybill_number",
    "waybillnumber",
    "waybill_id",
    "waybillid",
    "waybill",
];
const PROJECT_NAME_ALIASES: &[&str] = &["project_name", "projectname", "project"];
const SUPPLIER_NAME_ALIASES: &[&str] = &["supplier_name", "suppliername", "supplier"];
const WAYBILL_DATE_ALIASES: &[&str] = &["waybill_date", "waybilldate", "waybill date"];
const DELIVERY_DATE_ALIASES: &[&str] = &["delivery_date", "deliverydate", "delivery date"];
const PRODUCT_CODE_ALIASES: &[&str] = &["product_code", "productcode", "product"];
const QUANTITY_ALIASES: &[&str] = &["quantity", "qty"];
const UNIT_PRICE_ALIASES: &[&str] = &["unit_price", "unitprice", "price"];
const TOTAL_AMOUNT_ALIASES: &[&str] = &["total_amount", "totalamount", "total"];
const STATUS_ALIASES: &[&str] = &["status", "waybill_status"];

/// Индексы распознанных колонок в файле
#[derive(Debug, Default)]
pub struct HeaderMap {
    tenant_id: Option<usize>,
    waybill_number: Option<usize>,
    project_name: Option<usize>,
    supplier_name: Option<usize>,
    waybill_date: Option<usize>,
    delivery_date: Option<usize>,
    product_code: Option<usize>,
    quantity: Option<usize>,
    unit_price: Option<usize>,
    total_amount: Option<usize>,
    status: Option<usize>,
}

impl HeaderMap {
    pub fn from_headers(headers: &csv::StringRecord) -> Self {
        let mut map = Self::default();
        for (idx, raw) in headers.iter().enumerate() {
            let normalized = raw.trim().to_lowercase();
            let slot = if TENANT_ID_ALIASES.contains(&normalized.as_str()) {
                &mut map.tenant_id
            } else if WAYBILL_NUMBER_ALIASES.contains(&normalized.as_str()) {
                &mut map.waybill_number
            } else if PROJECT_NAME_ALIASES.contains(&normalized.as_str()) {
                &mut map.project_name
            } else if SUPPLIER_NAME_ALIASES.contains(&normalized.as_str()) {
                &mut map.supplier_name
            } else if WAYBILL_DATE_ALIASES.contains(&normalized.as_str()) {
                &mut map.waybill_date
            } else if DELIVERY_DATE_ALIASES.contains(&normalized.as_str()) {
                &mut map.delivery_date
            } else if PRODUCT_CODE_ALIASES.contains(&normalized.as_str()) {
                &mut map.product_code
            } else if QUANTITY_ALIASES.contains(&normalized.as_str()) {
                &mut map.quantity
            } else if UNIT_PRICE_ALIASES.contains(&normalized.as_str()) {
                &mut map.unit_price
            } else if TOTAL_AMOUNT_ALIASES.contains(&normalized.as_str()) {
                &mut map.total_amount
            } else if STATUS_ALIASES.contains(&normalized.as_str()) {
                &mut map.status
            } else {
                // Нераспознанная колонка — пропускаем
                continue;
            };
            // Первый алиас в файле выигрывает
            if slot.is_none() {
                *slot = Some(idx);
            }
        }
        map
    }

    fn field(&self, record: &csv::StringRecord, idx: Option<usize>) -> Option<String> {
        idx.and_then(|i| record.get(i)).map(|s| s.to_string())
    }

    pub fn extract(&self, line: i32, record: &csv::StringRecord) -> RawRow {
        RawRow {
            line,
            tenant_id: self.field(record, self.tenant_id),
            waybill_number: self.field(record, self.waybill_number),
            project_name: self.field(record, self.project_name),
            supplier_name: self.field(record, self.supplier_name),
            waybill_date: self.field(record, self.waybill_date),
            delivery_date: self.field(record, self.delivery_date),
            product_code: self.field(record, self.product_code),
            quantity: self.field(record, self.quantity),
            unit_price: self.field(record, self.unit_price),
            total_amount: self.field(record, self.total_amount),
            status: self.field(record, self.status),
        }
    }
}

/// Сырая строка файла до валидации. `line` — физический номер строки
/// (заголовок — строка 1, первая строка данных — 2).
#[derive(Debug, Clone)]
pub struct RawRow {
    pub line: i32,
    pub tenant_id: Option<String>,
    pub waybill_number: Option<String>,
    pub project_name: Option<String>,
    pub supplier_name: Option<String>,
    pub waybill_date: Option<String>,
    pub delivery_date: Option<String>,
    pub product_code: Option<String>,
    pub quantity: Option<String>,
    pub unit_price: Option<String>,
    pub total_amount: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug)]
pub enum RowRead {
    Row(RawRow),
    /// Строка не разобралась (кривая структура/кодировка)
    Malformed { line: i32 },
}

/// Читает весь файл. `None` — пустой вход без заголовка.
pub fn read_rows(data: &[u8]) -> Option<Vec<RowRead>> {
    let mut reader = ReaderBuilder::new().has_headers(true).from_reader(data);

    let headers = match reader.headers() {
        Ok(h) if !h.is_empty() && !(h.len() == 1 && h[0].trim().is_empty()) => h.clone(),
        _ => return None,
    };
    let map = HeaderMap::from_headers(&headers);

    let mut rows = Vec::new();
    for (i, result) in reader.records().enumerate() {
        // fallback: заголовок на строке 1, данные начинаются со строки 2
        let fallback_line = i as i32 + 2;
        match result {
            Ok(record) => {
                let line = record
                    .position()
                    .map(|p| p.line() as i32)
                    .unwrap_or(fallback_line);
                rows.push(RowRead::Row(map.extract(line, &record)));
            }
            Err(e) => {
                let line = e
                    .position()
                    .map(|p| p.line() as i32)
                    .unwrap_or(fallback_line);
                rows.push(RowRead::Malformed { line });
            }
        }
    }
    Some(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(csv: &str) -> Vec<RowRead> {
        read_rows(csv.as_bytes()).expect("header expected")
    }

    #[test]
    fn canonical_headers_are_mapped() {
        let parsed = rows(
            "waybill_number,project_name,supplier_name,waybill_date,delivery_date,product_code,quantity,unit_price,total_amount,status\n\
             WB-1,ProjA,SupX,2024-01-01,2024-01-02,P1,2,10,20,PENDING\n",
        );
        assert_eq!(parsed.len(), 1);
        match &parsed[0] {
            RowRead::Row(r) => {
                assert_eq!(r.line, 2);
                assert_eq!(r.waybill_number.as_deref(), Some("WB-1"));
                assert_eq!(r.project_name.as_deref(), Some("ProjA"));
                assert_eq!(r.quantity.as_deref(), Some("2"));
                assert_eq!(r.status.as_deref(), Some("PENDING"));
                assert_eq!(r.tenant_id, None);
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn alias_headers_and_order_are_accepted() {
        let parsed = rows(
            "status,total,price,qty,product,deliveryDate,waybillDate,supplier,project,waybillId\n\
             PENDING,20,10,2,P1,2024-01-02,2024-01-01,SupX,ProjA,WB-9\n",
        );
        match &parsed[0] {
            RowRead::Row(r) => {
                assert_eq!(r.waybill_number.as_deref(), Some("WB-9"));
                assert_eq!(r.supplier_name.as_deref(), Some("SupX"));
                assert_eq!(r.unit_price.as_deref(), Some("10"));
                assert_eq!(r.total_amount.as_deref(), Some("20"));
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn unknown_columns_are_ignored() {
        let parsed = rows("waybill,foo,bar\nWB-1,x,y\n");
        match &parsed[0] {
            RowRead::Row(r) => {
                assert_eq!(r.waybill_number.as_deref(), Some("WB-1"));
                assert_eq!(r.project_name, None);
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn short_line_is_malformed_not_fatal() {
        let parsed = rows("waybill,project,supplier\nWB-1\nWB-2,P,S\n");
        assert_eq!(parsed.len(), 2);
        assert!(matches!(parsed[0], RowRead::Malformed { line: 2 }));
        assert!(matches!(parsed[1], RowRead::Row(_)));
    }

    #[test]
    fn empty_input_yields_none() {
        assert!(read_rows(b"").is_none());
    }
}
