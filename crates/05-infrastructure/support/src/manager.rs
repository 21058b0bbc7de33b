//! 单驱动管理器
//!
//! 每个驱动名对应一个缓存实例。创建时优先使用自定义创建函数，
//! 其次查找 `create_{蛇形驱动名}_driver` 创建方法。

use crate::casing::snake;
use di_abstractions::Container;
use infrastructure_common::{BoxError, ManagerError, ManagerResult};
use parking_lot::RwLock;
use std::any::type_name;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// 驱动创建方法
pub type DriverMethod<D> = fn(&D) -> Result<Arc<<D as DriverSource>::Driver>, BoxError>;

/// 自定义驱动创建函数
pub type DriverCreator<T> = Arc<dyn Fn(&dyn Container) -> Result<Arc<T>, BoxError> + Send + Sync>;

/// 具体管理器提供的驱动来源
pub trait DriverSource: Send + Sync + Sized + 'static {
    /// 驱动类型
    type Driver: ?Sized + Send + Sync + 'static;

    /// 默认驱动名
    fn default_driver(&self) -> String;

    /// 驱动创建方法表
    fn driver_methods() -> Vec<(&'static str, DriverMethod<Self>)> {
        Vec::new()
    }
}

/// 单驱动管理器
pub struct Manager<D: DriverSource> {
    source: D,
    container: RwLock<Arc<dyn Container>>,
    drivers: RwLock<HashMap<String, Arc<D::Driver>>>,
    custom_creators: RwLock<HashMap<String, DriverCreator<D::Driver>>>,
    methods: HashMap<String, DriverMethod<D>>,
}

impl<D: DriverSource> Manager<D> {
    /// 创建管理器
    pub fn new(container: Arc<dyn Container>, source: D) -> Self {
        Self {
            source,
            container: RwLock::new(container),
            drivers: RwLock::new(HashMap::new()),
            custom_creators: RwLock::new(HashMap::new()),
            methods: D::driver_methods()
                .into_iter()
                .map(|(name, method)| (name.to_string(), method))
                .collect(),
        }
    }

    /// 具体管理器
    pub fn source(&self) -> &D {
        &self.source
    }

    /// 获取驱动实例，`None` 或空名称使用默认驱动
    pub fn driver(&self, name: Option<&str>) -> ManagerResult<Arc<D::Driver>> {
        let name = match name {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => self.source.default_driver(),
        };
        if name.is_empty() {
            return Err(ManagerError::EmptyName {
                manager: type_name::<D>(),
            });
        }

        if let Some(driver) = self.drivers.read().get(&name) {
            return Ok(driver.clone());
        }

        let created = self.create_driver(&name)?;
        let driver = self
            .drivers
            .write()
            .entry(name)
            .or_insert(created)
            .clone();
        Ok(driver)
    }

    fn create_driver(&self, name: &str) -> ManagerResult<Arc<D::Driver>> {
        let creation_failed = |source: BoxError| ManagerError::CreationFailed {
            name: name.to_string(),
            driver_key: "driver".to_string(),
            driver: name.to_string(),
            source,
        };

        let creator = self.custom_creators.read().get(name).cloned();
        if let Some(creator) = creator {
            let container = self.container();
            return creator(container.as_ref()).map_err(creation_failed);
        }

        let method_name = format!("create_{}_driver", snake(name));
        if let Some(method) = self.methods.get(&method_name) {
            debug!(driver = name, method = %method_name, "使用驱动创建方法");
            return method(&self.source).map_err(creation_failed);
        }

        Err(ManagerError::DriverNotSupported {
            driver_key: "driver".to_string(),
            driver: name.to_string(),
        })
    }

    /// 注册自定义驱动创建函数
    pub fn extend<F>(&self, driver: &str, creator: F) -> &Self
    where
        F: Fn(&dyn Container) -> Result<Arc<D::Driver>, BoxError> + Send + Sync + 'static,
    {
        self.custom_creators
            .write()
            .insert(driver.to_string(), Arc::new(creator));
        info!(manager = type_name::<D>(), driver, "已注册自定义驱动");
        self
    }

    /// 已创建驱动的快照
    pub fn drivers(&self) -> HashMap<String, Arc<D::Driver>> {
        self.drivers.read().clone()
    }

    /// 清除全部已创建的驱动
    pub fn forget_drivers(&self) -> &Self {
        self.drivers.write().clear();
        self
    }

    /// 当前容器
    pub fn container(&self) -> Arc<dyn Container> {
        self.container.read().clone()
    }

    /// 替换容器
    pub fn set_container(&self, container: Arc<dyn Container>) -> &Self {
        *self.container.write() = container;
        self
    }
}

impl<D: DriverSource + std::fmt::Debug> std::fmt::Debug for Manager<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut drivers: Vec<String> = self.drivers.read().keys().cloned().collect();
        drivers.sort();
        f.debug_struct("Manager")
            .field("source", &self.source)
            .field("drivers", &drivers)
            .finish()
    }
}
