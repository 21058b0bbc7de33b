//! # Infrastructure Support
//!
//! 依赖解析核心：
//!
//! - [`ServiceLocator`] - 门面缓存，带 TTL、LRU 淘汰和统计的强类型服务解析
//! - [`Facade`] - 门面 trait，只声明服务键和类型
//! - [`MultipleInstanceManager`] - 按配置创建并缓存命名实例
//! - [`Manager`] - 每个驱动名一个实例的单驱动管理器

pub mod casing;
pub mod clock;
pub mod facade;
pub mod locator;
pub mod manager;
pub mod multiple_instance_manager;
pub mod options;
pub mod stats;

mod cache;

pub use clock::{Clock, ManualClock, SystemClock};
pub use facade::Facade;
pub use locator::{ServiceLocator, SwapGuard};
pub use manager::{DriverCreator, DriverMethod, DriverSource, Manager};
pub use multiple_instance_manager::{
    creation_method_names, instance_config_from, CreateMethod, InstanceCreator, InstanceSource,
    MultipleInstanceManager, DEFAULT_DRIVER_KEY,
};
pub use options::FacadeOptions;
pub use stats::FacadeStats;

#[cfg(test)]
mod tests;
