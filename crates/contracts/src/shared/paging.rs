use serde::{Deserialize, Serialize};

/// Страница результата списочного запроса
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagedResult<T> {
    pub items: Vec<T>,
    pub total_count: u64,
    pub page: u64,
    pub page_size: u64,
}

impl<T> PagedResult<T> {
    pub const DEFAULT_PAGE_SIZE: u64 = 20;
    pub const MAX_PAGE_SIZE: u64 = 200;

    /// Нормализация параметров пагинации: page с 1, page_size в [1, 200]
    pub fn normalize(page: u64, page_size: u64) -> (u64, u64) {
        let page = if page == 0 { 1 } else { page };
        let page_size = if page_size == 0 {
            Self::DEFAULT_PAGE_SIZE
        } else {
            page_size.min(Self::MAX_PAGE_SIZE)
        };
        (page, page_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_defaults_zero_inputs() {
        assert_eq!(PagedResult::<()>::normalize(0, 0), (1, 20));
    }

    #[test]
    fn normalize_caps_page_size() {
        assert_eq!(PagedResult::<()>::normalize(3, 1000), (3, 200));
    }
}
