//! 依赖注入容器抽象接口
//!
//! 提供以字符串键注册和解析服务的核心抽象

use infrastructure_common::DependencyError;
use std::any::Any;
use std::sync::Arc;

/// 容器中保存的类型擦除服务实例
pub type ServiceInstance = Arc<dyn Any + Send + Sync>;

/// 服务工厂函数类型
///
/// 工厂接收容器本身，可以在创建过程中解析其他依赖。
pub type ServiceFactory =
    Arc<dyn Fn(&dyn Container) -> Result<ServiceInstance, DependencyError> + Send + Sync>;

/// 依赖注入容器 trait
///
/// 以服务键为索引的注册表。门面缓存和驱动管理器只通过这个接口调用容器，
/// 从不修改它。
pub trait Container: Send + Sync {
    /// 绑定瞬时服务，每次解析都调用工厂
    fn bind(&self, key: &str, factory: ServiceFactory) -> Result<(), DependencyError>;

    /// 绑定单例服务，首次解析时创建并保留
    fn singleton(&self, key: &str, factory: ServiceFactory) -> Result<(), DependencyError>;

    /// 注册已经构建好的实例
    fn instance(&self, key: &str, instance: ServiceInstance) -> Result<(), DependencyError>;

    /// 解析服务
    fn make(&self, key: &str) -> Result<ServiceInstance, DependencyError>;

    /// 检查服务是否已绑定
    fn is_bound(&self, key: &str) -> bool;

    /// 移除绑定，返回绑定是否存在
    fn forget(&self, key: &str) -> bool;

    /// 获取所有已绑定的服务键
    fn keys(&self) -> Vec<String>;
}

/// 容器的强类型辅助方法
///
/// 为所有 [`Container`] 自动实现，避免调用方手动进行类型擦除。
pub trait ContainerExt: Container {
    /// 使用强类型工厂绑定瞬时服务
    fn bind_fn<T, F>(&self, key: &str, factory: F) -> Result<(), DependencyError>
    where
        T: Send + Sync + 'static,
        F: Fn(&dyn Container) -> Result<T, DependencyError> + Send + Sync + 'static,
    {
        self.bind(key, erase(factory))
    }

    /// 使用强类型工厂绑定单例服务
    fn singleton_fn<T, F>(&self, key: &str, factory: F) -> Result<(), DependencyError>
    where
        T: Send + Sync + 'static,
        F: Fn(&dyn Container) -> Result<T, DependencyError> + Send + Sync + 'static,
    {
        self.singleton(key, erase(factory))
    }

    /// 注册强类型实例
    fn instance_of<T>(&self, key: &str, value: T) -> Result<(), DependencyError>
    where
        T: Send + Sync + 'static,
    {
        self.instance(key, Arc::new(value))
    }

    /// 解析并向下转换为具体类型
    fn make_as<T>(&self, key: &str) -> Result<Arc<T>, DependencyError>
    where
        T: Send + Sync + 'static,
    {
        self.make(key)?
            .downcast::<T>()
            .map_err(|_| DependencyError::creation_failed(
                key,
                format!("类型转换失败，期望 {}", std::any::type_name::<T>()),
            ))
    }
}

impl<C: Container + ?Sized> ContainerExt for C {}

fn erase<T, F>(factory: F) -> ServiceFactory
where
    T: Send + Sync + 'static,
    F: Fn(&dyn Container) -> Result<T, DependencyError> + Send + Sync + 'static,
{
    Arc::new(move |container: &dyn Container| {
        factory(container).map(|value| Arc::new(value) as ServiceInstance)
    })
}
