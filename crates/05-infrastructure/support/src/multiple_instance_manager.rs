//! 多实例管理器
//!
//! 管理同一驱动族下多个独立配置的命名实例（例如多个数据库连接）。
//! 实例在首次访问时按配置创建并按名称缓存。
//!
//! 创建策略按优先级：
//!
//! 1. 通过 [`MultipleInstanceManager::extend`] 注册的自定义创建函数
//! 2. [`InstanceSource::create_methods`] 声明的约定命名创建方法，
//!    依次查找 `create_{小写驱动名}_{小写驱动键}` 与 `create_{蛇形驱动名}_{蛇形驱动键}`
//! 3. 都不存在时返回 [`ManagerError::DriverNotSupported`]

use crate::casing::snake;
use config_abstractions::ConfigRepository;
use di_abstractions::Container;
use infrastructure_common::{BoxError, DriverConfig, ManagerError, ManagerResult};
use parking_lot::RwLock;
use serde_json::Value;
use std::any::type_name;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// 默认的驱动配置键
pub const DEFAULT_DRIVER_KEY: &str = "driver";

/// 约定命名的创建方法
pub type CreateMethod<M> =
    fn(&M, &DriverConfig) -> Result<Arc<<M as InstanceSource>::Instance>, BoxError>;

/// 自定义创建函数
pub type InstanceCreator<T> =
    Arc<dyn Fn(&dyn Container, &DriverConfig) -> Result<Arc<T>, BoxError> + Send + Sync>;

/// 具体管理器提供的实例来源
///
/// 负责默认实例名、每个实例的配置以及约定命名的创建方法表。
pub trait InstanceSource: Send + Sync + Sized + 'static {
    /// 管理的实例类型，可以是 trait 对象
    type Instance: ?Sized + Send + Sync + 'static;

    /// 默认实例名
    fn default_instance(&self) -> String;

    /// 修改默认实例名
    fn set_default_instance(&self, name: &str);

    /// 获取实例配置，未定义时返回 `None`
    fn instance_config(&self, name: &str) -> Option<DriverConfig>;

    /// 约定命名的创建方法表，在管理器创建时读取一次
    fn create_methods() -> Vec<(&'static str, CreateMethod<Self>)> {
        Vec::new()
    }
}

/// 从配置仓库读取 `{prefix}.{name}` 配置节作为实例配置
pub fn instance_config_from(
    repository: &dyn ConfigRepository,
    prefix: &str,
    name: &str,
) -> Option<DriverConfig> {
    let key = if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", prefix, name)
    };
    repository.section(&key).ok()
}

/// 多实例管理器
pub struct MultipleInstanceManager<M: InstanceSource> {
    source: M,
    container: RwLock<Arc<dyn Container>>,
    instances: RwLock<HashMap<String, Arc<M::Instance>>>,
    custom_creators: RwLock<HashMap<String, InstanceCreator<M::Instance>>>,
    driver_key: RwLock<String>,
    create_methods: HashMap<String, CreateMethod<M>>,
}

impl<M: InstanceSource> MultipleInstanceManager<M> {
    /// 创建管理器
    pub fn new(container: Arc<dyn Container>, source: M) -> Self {
        let create_methods: HashMap<String, CreateMethod<M>> = M::create_methods()
            .into_iter()
            .map(|(name, method)| (name.to_string(), method))
            .collect();

        debug!(
            manager = type_name::<M>(),
            methods = create_methods.len(),
            "多实例管理器已创建"
        );

        Self {
            source,
            container: RwLock::new(container),
            instances: RwLock::new(HashMap::new()),
            custom_creators: RwLock::new(HashMap::new()),
            driver_key: RwLock::new(DEFAULT_DRIVER_KEY.to_string()),
            create_methods,
        }
    }

    /// 具体管理器
    pub fn source(&self) -> &M {
        &self.source
    }

    /// 获取实例，`None` 或空名称使用默认实例
    ///
    /// 先在读锁下查找缓存；未命中时不持锁创建，写入前在写锁下复查，
    /// 已有实例时丢弃新建实例（先写入者获胜）。
    pub fn instance(&self, name: Option<&str>) -> ManagerResult<Arc<M::Instance>> {
        let name = self.instance_name(name)?;

        if let Some(instance) = self.instances.read().get(&name) {
            return Ok(instance.clone());
        }

        let created = self.resolve(&name)?;

        let mut instances = self.instances.write();
        if let Some(existing) = instances.get(&name) {
            warn!(instance = %name, "并发创建了重复实例，保留先写入的实例");
            return Ok(existing.clone());
        }
        instances.insert(name.clone(), created.clone());
        debug!(instance = %name, "实例已缓存");
        Ok(created)
    }

    /// 获取实例，失败时 panic
    ///
    /// # Panics
    ///
    /// 实例未定义、驱动配置无效或创建失败时 panic。
    pub fn must_instance(&self, name: Option<&str>) -> Arc<M::Instance> {
        match self.instance(name) {
            Ok(instance) => instance,
            Err(err) => {
                error!(manager = type_name::<M>(), "实例获取失败: {}", err);
                panic!("{}", err);
            }
        }
    }

    fn instance_name(&self, name: Option<&str>) -> ManagerResult<String> {
        let name = match name {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => self.source.default_instance(),
        };
        if name.is_empty() {
            return Err(ManagerError::EmptyName {
                manager: type_name::<M>(),
            });
        }
        Ok(name)
    }

    fn resolve(&self, name: &str) -> ManagerResult<Arc<M::Instance>> {
        let config =
            self.source
                .instance_config(name)
                .ok_or_else(|| ManagerError::InstanceNotDefined {
                    name: name.to_string(),
                })?;

        let driver_key = self.driver_key();
        let driver = match config.get(&driver_key) {
            None => {
                return Err(ManagerError::DriverNotSpecified {
                    name: name.to_string(),
                    driver_key,
                })
            }
            Some(Value::String(driver)) => driver.clone(),
            Some(_) => {
                return Err(ManagerError::InvalidDriver {
                    name: name.to_string(),
                    driver_key,
                })
            }
        };

        let creation_failed = |source: BoxError| ManagerError::CreationFailed {
            name: name.to_string(),
            driver_key: driver_key.clone(),
            driver: driver.clone(),
            source,
        };

        let creator = self.custom_creators.read().get(&driver).cloned();
        if let Some(creator) = creator {
            debug!(instance = name, driver = %driver, "使用自定义创建函数");
            let container = self.container();
            return creator(container.as_ref(), &config).map_err(creation_failed);
        }

        for method_name in creation_method_names(&driver, &driver_key) {
            if let Some(method) = self.create_methods.get(&method_name) {
                debug!(instance = name, method = %method_name, "使用约定创建方法");
                return method(&self.source, &config).map_err(creation_failed);
            }
        }

        Err(ManagerError::DriverNotSupported { driver_key, driver })
    }

    /// 移除缓存的实例，空切片移除默认实例
    pub fn forget_instance(&self, names: &[&str]) -> &Self {
        let mut instances = self.instances.write();
        if names.is_empty() {
            let default = self.source.default_instance();
            instances.remove(&default);
        } else {
            for name in names {
                instances.remove(*name);
            }
        }
        self
    }

    /// 移除指定实例，`None` 或空名称移除默认实例
    pub fn purge(&self, name: Option<&str>) {
        let name = match name {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => self.source.default_instance(),
        };
        if self.instances.write().remove(&name).is_some() {
            debug!(instance = %name, "实例已清除");
        }
    }

    /// 为驱动注册自定义创建函数，优先于约定创建方法
    pub fn extend<F>(&self, driver: &str, creator: F) -> &Self
    where
        F: Fn(&dyn Container, &DriverConfig) -> Result<Arc<M::Instance>, BoxError>
            + Send
            + Sync
            + 'static,
    {
        self.custom_creators
            .write()
            .insert(driver.to_string(), Arc::new(creator));
        info!(manager = type_name::<M>(), driver, "已注册自定义驱动创建函数");
        self
    }

    /// 修改驱动配置键
    pub fn set_driver_key(&self, key: &str) -> &Self {
        *self.driver_key.write() = key.to_string();
        self
    }

    /// 当前驱动配置键
    pub fn driver_key(&self) -> String {
        self.driver_key.read().clone()
    }

    /// 已缓存实例的快照
    pub fn instances(&self) -> HashMap<String, Arc<M::Instance>> {
        self.instances.read().clone()
    }

    /// 当前容器
    pub fn container(&self) -> Arc<dyn Container> {
        self.container.read().clone()
    }

    /// 替换容器，已缓存的实例保持不变
    pub fn set_container(&self, container: Arc<dyn Container>) -> &Self {
        *self.container.write() = container;
        self
    }
}

/// 约定创建方法的候选名称，按查找顺序排列
pub fn creation_method_names(driver: &str, driver_key: &str) -> Vec<String> {
    let lower = format!(
        "create_{}_{}",
        driver.to_lowercase(),
        driver_key.to_lowercase()
    );
    let snaked = format!("create_{}_{}", snake(driver), snake(driver_key));

    if lower == snaked {
        vec![lower]
    } else {
        vec![lower, snaked]
    }
}

impl<M: InstanceSource + std::fmt::Debug> std::fmt::Debug for MultipleInstanceManager<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut instances: Vec<String> = self.instances.read().keys().cloned().collect();
        instances.sort();
        let mut creators: Vec<String> = self.custom_creators.read().keys().cloned().collect();
        creators.sort();

        f.debug_struct("MultipleInstanceManager")
            .field("source", &self.source)
            .field("driver_key", &*self.driver_key.read())
            .field("instances", &instances)
            .field("custom_creators", &creators)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidate_names_follow_declared_order() {
        assert_eq!(
            creation_method_names("sqlite", "driver"),
            vec!["create_sqlite_driver"]
        );
        assert_eq!(
            creation_method_names("MySQL", "driver"),
            vec!["create_mysql_driver", "create_my_sql_driver"]
        );
        assert_eq!(
            creation_method_names("redis-cluster", "store"),
            vec!["create_redis-cluster_store", "create_redis_cluster_store"]
        );
    }
}
