//! # Configuration Abstractions
//!
//! 配置管理抽象层，定义配置读取的核心接口。
//!
//! ## 核心接口
//!
//! - [`ConfigRepository`] - 以点分路径访问的配置仓库
//! - [`ConfigRepositoryExt`] - 强类型的配置读取辅助方法

pub mod repository;

pub use repository::*;
