//! 服务缓存
//!
//! 缓存本身不加锁，由 [`ServiceLocator`](crate::ServiceLocator) 的读写锁保护。
//! 命中时只持有读锁，访问时间通过条目内部的互斥量更新。

use di_abstractions::ServiceInstance;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// 访问标记，先比较时间，时间相同再比较序号
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct AccessStamp {
    at: Instant,
    sequence: u64,
}

/// 缓存条目
#[derive(Debug)]
pub(crate) struct CacheEntry {
    service: ServiceInstance,
    created_at: Instant,
    last_access: Mutex<AccessStamp>,
}

impl CacheEntry {
    pub(crate) fn service(&self) -> ServiceInstance {
        self.service.clone()
    }

    fn is_expired(&self, now: Instant, ttl: Duration) -> bool {
        !ttl.is_zero() && now.saturating_duration_since(self.created_at) > ttl
    }

    fn touch(&self, stamp: AccessStamp) {
        *self.last_access.lock() = stamp;
    }

    fn last_access(&self) -> AccessStamp {
        *self.last_access.lock()
    }
}

/// 查找结果
pub(crate) enum Lookup {
    Hit(ServiceInstance),
    Expired,
    Miss,
}

/// 插入结果
#[derive(Debug)]
pub(crate) struct Stored {
    /// 最终缓存中的实例
    pub service: ServiceInstance,
    /// 是否由本次调用写入
    pub inserted: bool,
    /// 为腾出空间淘汰的条目数
    pub evicted: usize,
}

/// 以服务键为索引的缓存表
#[derive(Debug, Default)]
pub(crate) struct ServiceCache {
    entries: HashMap<String, CacheEntry>,
    sequence: AtomicU64,
}

impl ServiceCache {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn stamp(&self, at: Instant) -> AccessStamp {
        AccessStamp {
            at,
            sequence: self.sequence.fetch_add(1, Ordering::Relaxed),
        }
    }

    /// 创建新条目，创建时间即首次访问时间
    pub(crate) fn entry(&self, service: ServiceInstance, now: Instant) -> CacheEntry {
        CacheEntry {
            service,
            created_at: now,
            last_access: Mutex::new(self.stamp(now)),
        }
    }

    /// 只需读锁的查找，命中时刷新访问时间
    pub(crate) fn lookup(&self, key: &str, now: Instant, ttl: Duration) -> Lookup {
        match self.entries.get(key) {
            None => Lookup::Miss,
            Some(entry) if entry.is_expired(now, ttl) => Lookup::Expired,
            Some(entry) => {
                entry.touch(self.stamp(now));
                Lookup::Hit(entry.service())
            }
        }
    }

    /// 条目存在且未过期
    pub(crate) fn is_fresh(&self, key: &str, now: Instant, ttl: Duration) -> bool {
        self.entries
            .get(key)
            .is_some_and(|entry| !entry.is_expired(now, ttl))
    }

    /// 仅在条目仍然过期时删除，返回是否删除
    pub(crate) fn remove_expired(&mut self, key: &str, now: Instant, ttl: Duration) -> bool {
        let expired = self
            .entries
            .get(key)
            .is_some_and(|entry| entry.is_expired(now, ttl));
        if expired {
            self.entries.remove(key);
        }
        expired
    }

    /// 写入新解析的实例
    ///
    /// 已有未过期条目时保留已有条目（先写入者获胜）。
    pub(crate) fn insert_if_absent(
        &mut self,
        key: &str,
        service: ServiceInstance,
        now: Instant,
        ttl: Duration,
        max_size: usize,
    ) -> Stored {
        if let Some(existing) = self.entries.get(key) {
            if !existing.is_expired(now, ttl) {
                return Stored {
                    service: existing.service(),
                    inserted: false,
                    evicted: 0,
                };
            }
        }

        let entry = self.entry(service.clone(), now);
        let (_, evicted) = self.put(key, entry, max_size);
        Stored {
            service,
            inserted: true,
            evicted,
        }
    }

    /// 写入条目并返回被替换的旧条目
    ///
    /// 键不存在且达到容量上限时，先按 LRU 淘汰。替换已有键不会触发淘汰。
    pub(crate) fn put(
        &mut self,
        key: &str,
        entry: CacheEntry,
        max_size: usize,
    ) -> (Option<CacheEntry>, usize) {
        let mut evicted = 0;
        if max_size > 0 && !self.entries.contains_key(key) {
            evicted = self.evict_to(max_size - 1);
        }
        (self.entries.insert(key.to_string(), entry), evicted)
    }

    /// 直接写入条目并返回被替换的旧条目，不触发淘汰
    ///
    /// 替身安装与恢复使用，恢复后缓存与替换前完全一致。
    pub(crate) fn replace(&mut self, key: &str, entry: CacheEntry) -> Option<CacheEntry> {
        self.entries.insert(key.to_string(), entry)
    }

    /// 按 LRU 淘汰直到条目数不超过 `limit`，返回淘汰数量
    pub(crate) fn evict_to(&mut self, limit: usize) -> usize {
        let excess = self.entries.len().saturating_sub(limit);
        if excess == 0 {
            return 0;
        }

        let mut candidates: Vec<(AccessStamp, String)> = self
            .entries
            .iter()
            .map(|(key, entry)| (entry.last_access(), key.clone()))
            .collect();
        candidates.sort_unstable();

        for (_, key) in candidates.into_iter().take(excess) {
            self.entries.remove(&key);
        }
        excess
    }

    pub(crate) fn remove(&mut self, key: &str) -> Option<CacheEntry> {
        self.entries.remove(key)
    }

    pub(crate) fn clear(&mut self) -> usize {
        let count = self.entries.len();
        self.entries.clear();
        count
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// 未过期条目的键，按字典序排列
    pub(crate) fn fresh_keys(&self, now: Instant, ttl: Duration) -> Vec<String> {
        let mut keys: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| !entry.is_expired(now, ttl))
            .map(|(key, _)| key.clone())
            .collect();
        keys.sort();
        keys
    }
}
