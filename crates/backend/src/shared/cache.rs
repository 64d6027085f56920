use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

/// Скользящее окно неактивности, после которого счетчик версии сбрасывается.
/// Сброс безопасен: версия — только соль кэш-ключа, закэшированные записи
/// просто становятся недостижимыми.
const VERSION_IDLE_LIFETIME: Duration = Duration::from_secs(6 * 60 * 60);

struct VersionEntry {
    version: u64,
    touched: Instant,
}

struct CacheEntry {
    value: serde_json::Value,
    expires_at: Instant,
}

static VERSIONS: Lazy<RwLock<HashMap<String, VersionEntry>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

static RESPONSES: Lazy<RwLock<HashMap<String, CacheEntry>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// Текущая версия кэша тенанта; 1 при первом обращении или после простоя
pub fn get_version(tenant_id: &str) -> u64 {
    {
        let versions = VERSIONS.read().unwrap();
        if let Some(entry) = versions.get(tenant_id) {
            if entry.touched.elapsed() < VERSION_IDLE_LIFETIME {
                return entry.version;
            }
        }
    }

    let mut versions = VERSIONS.write().unwrap();
    let entry = versions
        .entry(tenant_id.to_string())
        .and_modify(|e| {
            if e.touched.elapsed() >= VERSION_IDLE_LIFETIME {
                e.version = 1;
            }
            e.touched = Instant::now();
        })
        .or_insert(VersionEntry {
            version: 1,
            touched: Instant::now(),
        });
    entry.version
}

/// Инкремент версии после коммита записи (не раньше!)
pub fn increment_version(tenant_id: &str, reason: &str) {
    let mut versions = VERSIONS.write().unwrap();
    let entry = versions
        .entry(tenant_id.to_string())
        .and_modify(|e| {
            if e.touched.elapsed() >= VERSION_IDLE_LIFETIME {
                e.version = 1;
            }
        })
        .or_insert(VersionEntry {
            version: 1,
            touched: Instant::now(),
        });
    entry.version += 1;
    entry.touched = Instant::now();
    tracing::info!(
        "Summary cache invalidated Tenant={} Reason={} Version={}",
        tenant_id,
        reason,
        entry.version
    );
}

/// Ключ кэша ответа: endpoint + tenant + версия + параметры запроса
pub fn response_key(endpoint: &str, tenant_id: &str, version: u64, query: &str) -> String {
    format!("{}:{}:{}:{}", endpoint, tenant_id, version, query)
}

pub fn response_get(key: &str) -> Option<serde_json::Value> {
    let responses = RESPONSES.read().unwrap();
    responses.get(key).and_then(|entry| {
        if entry.expires_at > Instant::now() {
            Some(entry.value.clone())
        } else {
            None
        }
    })
}

pub fn response_put(key: String, value: serde_json::Value, ttl: Duration) {
    let mut responses = RESPONSES.write().unwrap();
    // Просроченные записи выметаются попутно, отдельного фонового прюнера нет
    let now = Instant::now();
    responses.retain(|_, entry| entry.expires_at > now);
    responses.insert(
        key,
        CacheEntry {
            value,
            expires_at: now + ttl,
        },
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_starts_at_one_and_increments() {
        let tenant = "cache-test-tenant-a";
        assert_eq!(get_version(tenant), 1);
        increment_version(tenant, "test");
        assert_eq!(get_version(tenant), 2);
        increment_version(tenant, "test");
        assert_eq!(get_version(tenant), 3);
    }

    #[test]
    fn tenants_have_independent_versions() {
        let a = "cache-test-tenant-b";
        let b = "cache-test-tenant-c";
        increment_version(a, "test");
        assert_eq!(get_version(b), 1);
    }

    #[test]
    fn response_cache_expires_by_ttl() {
        let key = "waybills:t1:1:page=1".to_string();
        response_put(key.clone(), serde_json::json!({"x": 1}), Duration::ZERO);
        assert!(response_get(&key).is_none());

        response_put(key.clone(), serde_json::json!({"x": 2}), Duration::from_secs(60));
        assert_eq!(response_get(&key), Some(serde_json::json!({"x": 2})));
    }

    #[test]
    fn version_change_produces_distinct_keys() {
        let k1 = response_key("waybills", "t1", 1, "page=1");
        let k2 = response_key("waybills", "t1", 2, "page=1");
        assert_ne!(k1, k2);
    }
}
