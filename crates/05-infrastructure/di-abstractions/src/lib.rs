//! # Dependency Injection Abstractions
//!
//! 依赖注入抽象层，定义服务注册和解析的核心接口。
//!
//! ## 核心接口
//!
//! - [`Container`] - 以字符串键索引的服务容器
//! - [`ContainerExt`] - 强类型的注册与解析辅助方法
//! - [`ServiceFactory`] - 服务工厂函数类型

pub mod container;

pub use container::*;
