//! 门面缓存统计

use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// 统计快照
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FacadeStats {
    /// 缓存命中次数
    pub cache_hits: u64,
    /// 缓存未命中次数
    pub cache_misses: u64,
    /// 从容器成功解析的次数
    pub resolutions: u64,
    /// 错误总数（包含类型断言失败）
    pub errors: u64,
    /// 类型断言失败次数
    pub type_assertion_failures: u64,
    /// 因容量限制被淘汰的条目数
    pub cache_evictions: u64,
    /// 读取快照时的缓存条目数
    pub cache_size: usize,
}

impl FacadeStats {
    /// 缓存命中率，尚无查找时为 0
    pub fn hit_rate(&self) -> f64 {
        let lookups = self.cache_hits + self.cache_misses;
        if lookups == 0 {
            return 0.0;
        }
        self.cache_hits as f64 / lookups as f64
    }
}

/// 原子计数器集合，独立于缓存锁更新
#[derive(Debug)]
pub(crate) struct FacadeMetrics {
    enabled: AtomicBool,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    resolutions: AtomicU64,
    errors: AtomicU64,
    type_assertion_failures: AtomicU64,
    cache_evictions: AtomicU64,
}

impl FacadeMetrics {
    pub(crate) fn new(enabled: bool) -> Self {
        Self {
            enabled: AtomicBool::new(enabled),
            cache_hits: AtomicU64::new(0),
            cache_misses: AtomicU64::new(0),
            resolutions: AtomicU64::new(0),
            errors: AtomicU64::new(0),
            type_assertion_failures: AtomicU64::new(0),
            cache_evictions: AtomicU64::new(0),
        }
    }

    pub(crate) fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    fn add(&self, counter: &AtomicU64, value: u64) {
        if value > 0 && self.enabled.load(Ordering::Relaxed) {
            counter.fetch_add(value, Ordering::Relaxed);
        }
    }

    pub(crate) fn record_hit(&self) {
        self.add(&self.cache_hits, 1);
    }

    pub(crate) fn record_miss(&self) {
        self.add(&self.cache_misses, 1);
    }

    pub(crate) fn record_resolution(&self) {
        self.add(&self.resolutions, 1);
    }

    pub(crate) fn record_error(&self) {
        self.add(&self.errors, 1);
    }

    pub(crate) fn record_type_assertion_failure(&self) {
        self.add(&self.type_assertion_failures, 1);
        self.add(&self.errors, 1);
    }

    pub(crate) fn record_evictions(&self, count: usize) {
        self.add(&self.cache_evictions, count as u64);
    }

    pub(crate) fn reset(&self) {
        for counter in [
            &self.cache_hits,
            &self.cache_misses,
            &self.resolutions,
            &self.errors,
            &self.type_assertion_failures,
            &self.cache_evictions,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }

    pub(crate) fn snapshot(&self, cache_size: usize) -> FacadeStats {
        FacadeStats {
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            resolutions: self.resolutions.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            type_assertion_failures: self.type_assertion_failures.load(Ordering::Relaxed),
            cache_evictions: self.cache_evictions.load(Ordering::Relaxed),
            cache_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_rate_handles_empty_and_mixed_lookups() {
        assert_eq!(FacadeStats::default().hit_rate(), 0.0);

        let stats = FacadeStats {
            cache_hits: 3,
            cache_misses: 1,
            ..FacadeStats::default()
        };
        assert!((stats.hit_rate() - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn disabled_metrics_ignore_updates() {
        let metrics = FacadeMetrics::new(false);
        metrics.record_hit();
        metrics.record_type_assertion_failure();
        assert_eq!(metrics.snapshot(0), FacadeStats::default());

        metrics.set_enabled(true);
        metrics.record_type_assertion_failure();
        let stats = metrics.snapshot(4);
        assert_eq!(stats.type_assertion_failures, 1);
        assert_eq!(stats.errors, 1);
        assert_eq!(stats.cache_size, 4);
    }
}
