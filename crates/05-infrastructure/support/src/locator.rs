//! 服务定位器（门面缓存）
//!
//! 包装依赖注入容器，为门面提供带缓存的强类型解析：
//!
//! - 缓存优先，未命中时调用 [`Container::make`] 并缓存结果
//! - 可选 TTL（惰性检查，从创建时刻计算）和容量上限（LRU 淘汰）
//! - 原子统计计数器
//! - 测试用的服务替换与恢复
//!
//! 进程内通过 [`ServiceLocator::global`] 共享唯一实例，
//! 测试可以用 [`ServiceLocator::new`] 或 [`ServiceLocator::with_clock`] 创建隔离实例。

use crate::cache::{CacheEntry, Lookup, ServiceCache};
use crate::clock::{Clock, SystemClock};
use crate::options::FacadeOptions;
use crate::stats::{FacadeMetrics, FacadeStats};
use di_abstractions::{Container, ServiceInstance};
use infrastructure_common::{FacadeError, FacadeResult};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::any::type_name;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

static GLOBAL_LOCATOR: Lazy<ServiceLocator> = Lazy::new(ServiceLocator::new);

/// 锁保护的定位器状态
struct LocatorState {
    container: Option<Arc<dyn Container>>,
    /// 每次替换容器时递增，防止旧容器的解析结果写入新缓存
    generation: u64,
    options: FacadeOptions,
    cache: ServiceCache,
}

/// 服务定位器
pub struct ServiceLocator {
    state: RwLock<LocatorState>,
    metrics: FacadeMetrics,
    clock: Arc<dyn Clock>,
}

impl ServiceLocator {
    /// 创建使用系统时钟和默认选项的定位器
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// 使用指定时钟创建定位器
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        let options = FacadeOptions::default();
        Self {
            metrics: FacadeMetrics::new(options.metrics_enabled),
            state: RwLock::new(LocatorState {
                container: None,
                generation: 0,
                options,
                cache: ServiceCache::new(),
            }),
            clock,
        }
    }

    /// 进程级共享的定位器
    pub fn global() -> &'static ServiceLocator {
        &GLOBAL_LOCATOR
    }

    /// 解析服务，失败时终止调用方
    ///
    /// 适用于假定服务一定存在的调用点。需要处理错误时使用 [`try_resolve`](Self::try_resolve)。
    ///
    /// # Panics
    ///
    /// 容器未设置、容器解析失败或类型不匹配时 panic。
    pub fn resolve<T>(&self, key: &str) -> Arc<T>
    where
        T: Send + Sync + 'static,
    {
        match self.try_resolve::<T>(key) {
            Ok(service) => service,
            Err(err) => {
                error!(
                    service_key = err.service_key(),
                    operation = err.operation(),
                    "门面解析失败: {}",
                    err
                );
                panic!("{}", err);
            }
        }
    }

    /// 解析服务并返回结构化错误
    pub fn try_resolve<T>(&self, key: &str) -> FacadeResult<Arc<T>>
    where
        T: Send + Sync + 'static,
    {
        let service = self.make(key)?;
        self.downcast(key, service)
    }

    /// 解析未经类型转换的服务实例
    pub fn make(&self, key: &str) -> FacadeResult<ServiceInstance> {
        self.lookup(key, "resolve")
    }

    /// 支持取消的解析
    ///
    /// 只在开始前检查取消状态，已经开始的容器调用不会被中断。
    pub fn resolve_with_cancellation<T>(
        &self,
        token: &CancellationToken,
        key: &str,
    ) -> FacadeResult<Arc<T>>
    where
        T: Send + Sync + 'static,
    {
        const OPERATION: &str = "resolve_with_context";

        if token.is_cancelled() {
            self.metrics.record_error();
            return Err(FacadeError::Cancelled {
                key: key.to_string(),
                operation: OPERATION,
            });
        }

        let service = self.lookup(key, OPERATION)?;
        self.downcast(key, service)
    }

    fn downcast<T>(&self, key: &str, service: ServiceInstance) -> FacadeResult<Arc<T>>
    where
        T: Send + Sync + 'static,
    {
        service.downcast::<T>().map_err(|_| {
            self.metrics.record_type_assertion_failure();
            FacadeError::TypeMismatch {
                key: key.to_string(),
                expected: type_name::<T>(),
            }
        })
    }

    fn lookup(&self, key: &str, operation: &'static str) -> FacadeResult<ServiceInstance> {
        let now = self.clock.now();

        let (container, generation, options) = {
            let state = self.state.read();
            let Some(container) = state.container.clone() else {
                drop(state);
                self.metrics.record_error();
                return Err(FacadeError::ContainerMissing {
                    key: key.to_string(),
                    operation,
                });
            };

            let mut expired = false;
            if state.options.cache_enabled {
                match state.cache.lookup(key, now, state.options.cache_ttl) {
                    Lookup::Hit(service) => {
                        self.metrics.record_hit();
                        if state.options.debug {
                            debug!(service_key = key, "门面缓存命中");
                        }
                        return Ok(service);
                    }
                    Lookup::Expired => expired = true,
                    Lookup::Miss => {}
                }
            }

            let generation = state.generation;
            let options = state.options.clone();
            drop(state);

            if expired {
                let removed = self
                    .state
                    .write()
                    .cache
                    .remove_expired(key, now, options.cache_ttl);
                if removed && options.debug {
                    debug!(service_key = key, "缓存条目已过期");
                }
            }
            (container, generation, options)
        };

        self.metrics.record_miss();
        if options.debug {
            debug!(service_key = key, "门面缓存未命中，从容器解析");
        }

        let service = container.make(key).map_err(|source| {
            self.metrics.record_error();
            FacadeError::ResolutionFailed {
                key: key.to_string(),
                operation,
                source,
            }
        })?;
        self.metrics.record_resolution();

        if !options.cache_enabled {
            return Ok(service);
        }
        Ok(self.store(key, service, generation))
    }

    fn store(&self, key: &str, service: ServiceInstance, generation: u64) -> ServiceInstance {
        let now = self.clock.now();
        let mut state = self.state.write();

        // 容器已被替换或缓存已关闭
        if state.generation != generation || !state.options.cache_enabled {
            return service;
        }

        let ttl = state.options.cache_ttl;
        let max_size = state.options.max_cache_size;
        let stored = state.cache.insert_if_absent(key, service, now, ttl, max_size);
        let debug_enabled = state.options.debug;
        drop(state);

        self.metrics.record_evictions(stored.evicted);
        if !stored.inserted {
            warn!(service_key = key, "并发解析产生重复实例，保留先写入的缓存条目");
        } else if debug_enabled && stored.evicted > 0 {
            debug!(service_key = key, evicted = stored.evicted, "缓存已满，按 LRU 淘汰");
        }
        stored.service
    }

    /// 原子地替换配置
    ///
    /// 关闭缓存会立即清空缓存；缩小容量上限会按 LRU 淘汰多出的条目；
    /// 关闭统计会把所有计数器归零。
    pub fn configure(&self, options: FacadeOptions) {
        let mut state = self.state.write();
        self.metrics.set_enabled(options.metrics_enabled);

        if !options.cache_enabled {
            let cleared = state.cache.clear();
            debug!(cleared, "缓存已关闭，清空缓存");
        } else if options.is_bounded() {
            let evicted = state.cache.evict_to(options.max_cache_size);
            self.metrics.record_evictions(evicted);
        }

        if !options.metrics_enabled {
            self.metrics.reset();
        }

        info!(
            cache_enabled = options.cache_enabled,
            max_cache_size = options.max_cache_size,
            cache_ttl_ms = u64::try_from(options.cache_ttl.as_millis()).unwrap_or(u64::MAX),
            metrics_enabled = options.metrics_enabled,
            "门面配置已更新"
        );
        state.options = options;
    }

    /// 当前配置的副本
    pub fn options(&self) -> FacadeOptions {
        self.state.read().options.clone()
    }

    /// 替换容器并清空全部缓存
    pub fn set_container(&self, container: Arc<dyn Container>) {
        let mut state = self.state.write();
        state.container = Some(container);
        state.generation += 1;
        let cleared = state.cache.clear();
        info!(cleared, "门面容器已替换，缓存已清空");
    }

    /// 当前容器
    pub fn container(&self) -> Option<Arc<dyn Container>> {
        self.state.read().container.clone()
    }

    /// 用替身服务替换缓存条目，返回恢复守卫
    ///
    /// 替身直接写入缓存，不受容量上限约束也不触发淘汰。守卫调用
    /// [`SwapGuard::restore`] 或被丢弃时恢复之前的缓存状态。
    pub fn swap_service<T>(&self, key: &str, mock: Arc<T>) -> SwapGuard<'_>
    where
        T: Send + Sync + 'static,
    {
        let now = self.clock.now();
        let mut state = self.state.write();
        let entry = state.cache.entry(mock, now);
        let previous = state.cache.replace(key, entry);
        let generation = state.generation;
        drop(state);

        debug!(service_key = key, replaced = previous.is_some(), "服务已替换为替身");

        SwapGuard {
            locator: self,
            key: key.to_string(),
            previous,
            generation,
            pending: true,
        }
    }

    /// 清空全部缓存
    pub fn clear_cache(&self) {
        let cleared = self.state.write().cache.clear();
        debug!(cleared, "门面缓存已清空");
    }

    /// 移除指定服务的缓存，返回是否存在
    pub fn clear_cache_for(&self, key: &str) -> bool {
        self.state.write().cache.remove(key).is_some()
    }

    /// 统计快照，缓存大小实时读取
    pub fn stats(&self) -> FacadeStats {
        let cache_size = self.state.read().cache.len();
        self.metrics.snapshot(cache_size)
    }

    /// 计数器归零
    pub fn reset_stats(&self) {
        self.metrics.reset();
    }

    /// 服务是否已缓存且未过期
    pub fn is_service_cached(&self, key: &str) -> bool {
        let now = self.clock.now();
        let state = self.state.read();
        state.cache.is_fresh(key, now, state.options.cache_ttl)
    }

    /// 已缓存且未过期的服务键，按字典序排列
    pub fn cached_services(&self) -> Vec<String> {
        let now = self.clock.now();
        let state = self.state.read();
        state.cache.fresh_keys(now, state.options.cache_ttl)
    }

    fn restore(&self, key: &str, previous: Option<CacheEntry>, generation: u64) {
        let mut state = self.state.write();
        state.cache.remove(key);

        // 容器替换前的条目不再恢复
        if let Some(entry) = previous.filter(|_| state.generation == generation) {
            state.cache.replace(key, entry);
        }
        debug!(service_key = key, "替身服务已恢复");
    }
}

impl Default for ServiceLocator {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ServiceLocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("ServiceLocator")
            .field("has_container", &state.container.is_some())
            .field("generation", &state.generation)
            .field("options", &state.options)
            .field("cache_size", &state.cache.len())
            .field("clock", &self.clock)
            .finish()
    }
}

/// 服务替换守卫
///
/// 恢复之前被替换的缓存条目；原本没有缓存时移除替身。
#[must_use = "守卫被丢弃时会立即恢复原服务"]
pub struct SwapGuard<'a> {
    locator: &'a ServiceLocator,
    key: String,
    previous: Option<CacheEntry>,
    generation: u64,
    pending: bool,
}

impl SwapGuard<'_> {
    /// 被替换的服务键
    pub fn key(&self) -> &str {
        &self.key
    }

    /// 替换前是否存在缓存条目
    pub fn had_previous(&self) -> bool {
        self.previous.is_some()
    }

    /// 立即恢复
    pub fn restore(mut self) {
        self.restore_now();
    }

    fn restore_now(&mut self) {
        if std::mem::take(&mut self.pending) {
            self.locator
                .restore(&self.key, self.previous.take(), self.generation);
        }
    }
}

impl Drop for SwapGuard<'_> {
    fn drop(&mut self) {
        self.restore_now();
    }
}

impl std::fmt::Debug for SwapGuard<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SwapGuard")
            .field("key", &self.key)
            .field("had_previous", &self.previous.is_some())
            .field("pending", &self.pending)
            .finish()
    }
}
