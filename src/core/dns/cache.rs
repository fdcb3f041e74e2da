use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Instant,
};

use once_cell::sync::OnceCell;

use super::addr::AddrEntry;

/// 缓存条目：单个代表性地址与写入时刻。
#[derive(Debug, Clone)]
struct CacheEntry {
    entry: AddrEntry,
    resolved_at: Instant,
}

/// 解析缓存：主机名（区分大小写的精确匹配）到最近一次成功连接所用
/// 地址的映射，每个主机名至多一条。所有读写由同一把互斥锁保护；
/// 读取在持锁期间克隆返回，调用方拿到的永远是独立副本。
#[derive(Debug, Default)]
pub struct DnsCache {
    inner: Mutex<HashMap<String, CacheEntry>>,
}

/// 只读统计信息，供测试与可观测性场景使用。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// 当前条目数。
    pub entries: usize,
    /// 以给定 TTL 衡量已过期的条目数。
    pub expired: usize,
}

impl DnsCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// 查询主机名对应的缓存地址。
    ///
    /// `clear_requested` 置位时无条件清除条目并返回缺失。命中时要求
    /// `ttl_micros < 0`（不按时间过期）或条目年龄不超过 `ttl_micros`；
    /// 过期条目被顺手移除。返回的是持锁期间克隆出的副本。
    pub fn lookup(&self, host: &str, ttl_micros: i64, clear_requested: bool) -> Option<AddrEntry> {
        let mut guard = match self.inner.lock() {
            Ok(g) => g,
            Err(_) => {
                tracing::error!(target = "dns", "resolution cache mutex poisoned on lookup");
                return None;
            }
        };

        if clear_requested {
            guard.remove(host);
            return None;
        }

        let stale = match guard.get(host) {
            Some(cached) => {
                if ttl_micros < 0
                    || cached.resolved_at.elapsed().as_micros() <= ttl_micros as u128
                {
                    return Some(cached.entry.clone());
                }
                true
            }
            None => false,
        };
        if stale {
            guard.remove(host);
            tracing::debug!(target = "dns", host, "stale resolution cache entry dropped");
        }
        None
    }

    /// 写入或覆盖主机名的缓存条目，记录当前时刻。空主机名为空操作。
    pub fn store(&self, host: &str, entry: &AddrEntry) {
        if host.is_empty() {
            return;
        }
        let mut guard = match self.inner.lock() {
            Ok(g) => g,
            Err(_) => {
                tracing::error!(target = "dns", "resolution cache mutex poisoned on store");
                return;
            }
        };
        guard.insert(
            host.to_string(),
            CacheEntry {
                entry: entry.clone(),
                resolved_at: Instant::now(),
            },
        );
    }

    /// 移除主机名的缓存条目；条目不存在时为空操作。
    pub fn invalidate(&self, host: &str) {
        if let Ok(mut guard) = self.inner.lock() {
            guard.remove(host);
        }
    }

    /// 清空全部条目。
    pub fn clear(&self) {
        if let Ok(mut guard) = self.inner.lock() {
            guard.clear();
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().map(|g| g.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 以给定 TTL 衡量的统计信息。
    pub fn stats(&self, ttl_micros: i64) -> CacheStats {
        let guard = match self.inner.lock() {
            Ok(g) => g,
            Err(_) => {
                return CacheStats {
                    entries: 0,
                    expired: 0,
                }
            }
        };
        let expired = if ttl_micros < 0 {
            0
        } else {
            guard
                .values()
                .filter(|c| c.resolved_at.elapsed().as_micros() > ttl_micros as u128)
                .count()
        };
        CacheStats {
            entries: guard.len(),
            expired,
        }
    }
}

// ==== 进程级共享实例 ==== //

fn storage() -> &'static Mutex<Option<Arc<DnsCache>>> {
    static STORAGE: OnceCell<Mutex<Option<Arc<DnsCache>>>> = OnceCell::new();
    STORAGE.get_or_init(|| Mutex::new(None))
}

/// 获取进程级共享的解析缓存；首次调用时创建。
pub fn obtain_global_cache() -> Arc<DnsCache> {
    let mut guard = storage().lock().expect("global dns cache mutex poisoned");
    if let Some(existing) = guard.as_ref() {
        return Arc::clone(existing);
    }
    let cache = Arc::new(DnsCache::new());
    *guard = Some(Arc::clone(&cache));
    cache
}

/// 覆盖进程级共享实例，供测试或应用启动时注入。
pub fn set_global_cache(cache: Arc<DnsCache>) {
    let mut guard = storage().lock().expect("global dns cache mutex poisoned");
    *guard = Some(cache);
}

#[cfg(test)]
pub(crate) fn test_reset_global_cache() {
    if let Ok(mut guard) = storage().lock() {
        *guard = None;
    }
}
