//! # Configuration Implementation
//!
//! 配置管理的具体实现，提供内存配置仓库和多源配置加载。
//!
//! ## 主要组件
//!
//! - [`MemoryConfigRepository`] - 内存配置仓库
//! - [`ConfigLoader`] - TOML / JSON / 环境变量配置加载器

pub mod loader;
pub mod repository;

pub use loader::*;
pub use repository::*;

#[cfg(test)]
mod tests;
