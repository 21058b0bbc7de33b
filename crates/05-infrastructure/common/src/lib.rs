//! # Infrastructure Common
//!
//! 这个 crate 提供了 Lorn ADSP 平台基础设施层共享的错误类型和配置节。
//!
//! ## 核心类型
//!
//! - [`FacadeError`] - 门面解析错误
//! - [`ManagerError`] - 驱动管理器错误
//! - [`DependencyError`] - 容器解析错误
//! - [`ConfigError`] - 配置错误
//! - [`ConfigSection`] / [`DriverConfig`] - 以字符串为键的配置节

pub mod configuration;
pub mod errors;

pub use configuration::*;
pub use errors::*;
