use serde::{Deserialize, Serialize};

/// Итог одного прогона сверки CSV.
///
/// Не персистится как сущность; на асинхронном пути счетчики зеркалируются
/// в задачу импорта.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportResult {
    pub total_rows: i32,
    pub inserted_count: i32,
    pub updated_count: i32,
    pub rejected_count: i32,
    pub rejected_rows: Vec<RejectedRow>,
    pub warnings: Vec<WarningRow>,
}

/// Отклоненная строка: номер строки файла + полный список кодов ошибок
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectedRow {
    pub row_number: i32,
    pub errors: Vec<String>,
}

/// Принятая строка с предупреждениями (строка все равно персистится)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WarningRow {
    pub row_number: i32,
    pub warnings: Vec<String>,
}
