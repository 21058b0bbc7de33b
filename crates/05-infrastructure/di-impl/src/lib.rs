//! # 依赖注入具体实现
//!
//! 提供线程安全的服务容器实现，支持瞬时绑定、惰性单例和预构建实例

use dashmap::DashMap;
use di_abstractions::{Container, ServiceFactory, ServiceInstance};
use infrastructure_common::DependencyError;
use std::cell::RefCell;
use tracing::{debug, info, warn};

/// 服务绑定信息
#[derive(Clone)]
enum Binding {
    /// 每次解析都调用工厂
    Transient(ServiceFactory),
    /// 首次解析时创建并保留
    Singleton {
        factory: ServiceFactory,
        resolved: Option<ServiceInstance>,
    },
    /// 预构建的实例
    Instance(ServiceInstance),
}

impl Binding {
    fn is_shared(&self) -> bool {
        !matches!(self, Self::Transient(_))
    }
}

impl std::fmt::Debug for Binding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transient(_) => f.write_str("Transient(<factory>)"),
            Self::Singleton { resolved, .. } => f
                .debug_struct("Singleton")
                .field("resolved", &resolved.is_some())
                .finish(),
            Self::Instance(_) => f.write_str("Instance(<instance>)"),
        }
    }
}

thread_local! {
    /// 当前线程的解析链，用于检测循环依赖
    static RESOLUTION_CHAIN: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
}

/// 解析链守卫，离开作用域时弹出当前服务键
struct ResolutionGuard;

impl ResolutionGuard {
    fn enter(key: &str) -> Result<Self, DependencyError> {
        RESOLUTION_CHAIN.with(|chain| {
            let mut chain = chain.borrow_mut();
            if chain.iter().any(|k| k == key) {
                return Err(DependencyError::CircularDependency {
                    dependency_chain: format!("{} -> {}", chain.join(" -> "), key),
                });
            }
            chain.push(key.to_string());
            Ok(Self)
        })
    }
}

impl Drop for ResolutionGuard {
    fn drop(&mut self) {
        RESOLUTION_CHAIN.with(|chain| {
            chain.borrow_mut().pop();
        });
    }
}

/// 具体的服务容器实现
///
/// 工厂在不持有任何锁的情况下执行，因此工厂内部可以继续解析其他服务。
#[derive(Debug, Default)]
pub struct ServiceContainer {
    /// 服务绑定信息
    bindings: DashMap<String, Binding>,
}

impl ServiceContainer {
    /// 创建新的容器
    pub fn new() -> Self {
        Self {
            bindings: DashMap::new(),
        }
    }

    /// 已绑定的服务数量
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// 容器是否为空
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// 检查服务是否以共享方式绑定（单例或实例）
    pub fn is_shared(&self, key: &str) -> bool {
        self.bindings
            .get(key)
            .is_some_and(|binding| binding.is_shared())
    }

    /// 清空所有绑定
    pub fn flush(&self) {
        let count = self.bindings.len();
        self.bindings.clear();
        info!("清空容器，移除了 {} 个绑定", count);
    }

    fn register(&self, key: &str, binding: Binding) -> Result<(), DependencyError> {
        if key.is_empty() {
            return Err(DependencyError::RegistrationError {
                key: key.to_string(),
                message: "服务键不能为空".to_string(),
            });
        }

        debug!("注册服务: {} ({:?})", key, binding);
        if self.bindings.insert(key.to_string(), binding).is_some() {
            warn!("服务 {} 已存在，原有绑定被替换", key);
        }
        Ok(())
    }

    fn build(&self, key: &str, factory: &ServiceFactory) -> Result<ServiceInstance, DependencyError> {
        let _guard = ResolutionGuard::enter(key)?;
        factory(self)
    }

    fn resolve_singleton(
        &self,
        key: &str,
        factory: &ServiceFactory,
    ) -> Result<ServiceInstance, DependencyError> {
        let instance = self.build(key, factory)?;

        // 并发创建时保留第一个写入的实例
        if let Some(mut binding) = self.bindings.get_mut(key) {
            if let Binding::Singleton { resolved, .. } = binding.value_mut() {
                if let Some(existing) = resolved {
                    return Ok(existing.clone());
                }
                *resolved = Some(instance.clone());
            }
        }

        Ok(instance)
    }
}

impl Container for ServiceContainer {
    fn bind(&self, key: &str, factory: ServiceFactory) -> Result<(), DependencyError> {
        self.register(key, Binding::Transient(factory))
    }

    fn singleton(&self, key: &str, factory: ServiceFactory) -> Result<(), DependencyError> {
        self.register(
            key,
            Binding::Singleton {
                factory,
                resolved: None,
            },
        )
    }

    fn instance(&self, key: &str, instance: ServiceInstance) -> Result<(), DependencyError> {
        self.register(key, Binding::Instance(instance))
    }

    fn make(&self, key: &str) -> Result<ServiceInstance, DependencyError> {
        // 克隆绑定后立即释放分片锁
        let binding = self
            .bindings
            .get(key)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| DependencyError::ServiceNotBound {
                key: key.to_string(),
            })?;

        match binding {
            Binding::Instance(instance)
            | Binding::Singleton {
                resolved: Some(instance),
                ..
            } => Ok(instance),
            Binding::Singleton {
                factory,
                resolved: None,
            } => self.resolve_singleton(key, &factory),
            Binding::Transient(factory) => self.build(key, &factory),
        }
    }

    fn is_bound(&self, key: &str) -> bool {
        self.bindings.contains_key(key)
    }

    fn forget(&self, key: &str) -> bool {
        self.bindings.remove(key).is_some()
    }

    fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .bindings
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        keys.sort();
        keys
    }
}
