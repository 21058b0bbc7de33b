//! 错误类型定义

use thiserror::Error;

/// 装箱的通用错误类型，用于承载调用方提供的创建函数返回的任意错误
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// 配置错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置文件不存在: {path}")]
    FileNotFound { path: String },

    #[error("配置文件读取失败: {source}")]
    FileReadError {
        #[from]
        source: std::io::Error,
    },

    #[error("配置解析失败: {source}")]
    ParseError { source: BoxError },

    #[error("配置序列化失败: {source}")]
    SerializationError {
        #[from]
        source: serde_json::Error,
    },

    #[error("配置键不存在: {key}")]
    KeyNotFound { key: String },

    #[error("配置类型转换失败: {message}")]
    TypeConversionError { message: String },

    #[error("配置加载失败: {message}")]
    LoadError { message: String },
}

/// 依赖注入错误类型
#[derive(Error, Debug)]
pub enum DependencyError {
    #[error("服务未绑定: {key}")]
    ServiceNotBound { key: String },

    #[error("服务创建失败: {key}, 原因: {source}")]
    ServiceCreationFailed {
        key: String,
        #[source]
        source: BoxError,
    },

    #[error("循环依赖检测到: {dependency_chain}")]
    CircularDependency { dependency_chain: String },

    #[error("服务注册失败: {key}, 原因: {message}")]
    RegistrationError { key: String, message: String },
}

impl DependencyError {
    /// 创建服务创建失败错误
    pub fn creation_failed(key: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::ServiceCreationFailed {
            key: key.into(),
            source: source.into(),
        }
    }
}

/// 门面解析错误类型
///
/// 每个变体都携带服务键和失败的操作名称；底层原因可以通过
/// [`std::error::Error::source`] 逐级展开。
#[derive(Error, Debug)]
pub enum FacadeError {
    #[error("门面 {operation} 失败，服务 '{key}': 尚未设置容器，请先调用 set_container()")]
    ContainerMissing {
        key: String,
        operation: &'static str,
    },

    #[error("门面 {operation} 失败，服务 '{key}': {source}")]
    ResolutionFailed {
        key: String,
        operation: &'static str,
        #[source]
        source: DependencyError,
    },

    #[error("门面 type_assertion 失败，服务 '{key}': 期望类型 {expected}")]
    TypeMismatch { key: String, expected: &'static str },

    #[error("门面 {operation} 已取消，服务 '{key}'")]
    Cancelled {
        key: String,
        operation: &'static str,
    },
}

impl FacadeError {
    /// 获取出错的服务键
    pub fn service_key(&self) -> &str {
        match self {
            Self::ContainerMissing { key, .. }
            | Self::ResolutionFailed { key, .. }
            | Self::TypeMismatch { key, .. }
            | Self::Cancelled { key, .. } => key,
        }
    }

    /// 获取出错时正在执行的操作
    pub fn operation(&self) -> &'static str {
        match self {
            Self::ContainerMissing { operation, .. }
            | Self::ResolutionFailed { operation, .. }
            | Self::Cancelled { operation, .. } => operation,
            Self::TypeMismatch { .. } => "type_assertion",
        }
    }

    /// 是否属于配置类错误（容器缺失）
    pub fn is_configuration_error(&self) -> bool {
        matches!(self, Self::ContainerMissing { .. })
    }

    /// 是否为类型不匹配
    pub fn is_type_mismatch(&self) -> bool {
        matches!(self, Self::TypeMismatch { .. })
    }
}

/// 驱动管理器错误类型
#[derive(Error, Debug)]
pub enum ManagerError {
    #[error("无法为 [{manager}] 解析空名称")]
    EmptyName { manager: &'static str },

    #[error("实例 [{name}] 未定义")]
    InstanceNotDefined { name: String },

    #[error("实例 [{name}] 未指定 {driver_key}")]
    DriverNotSpecified { name: String, driver_key: String },

    #[error("实例 [{name}] 的 {driver_key} 必须是字符串")]
    InvalidDriver { name: String, driver_key: String },

    #[error("实例 {driver_key} [{driver}] 不受支持")]
    DriverNotSupported { driver_key: String, driver: String },

    #[error("实例 [{name}] 创建失败 ({driver_key} = {driver}): {source}")]
    CreationFailed {
        name: String,
        driver_key: String,
        driver: String,
        #[source]
        source: BoxError,
    },
}

impl ManagerError {
    /// 是否属于配置类错误
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::EmptyName { .. }
                | Self::InstanceNotDefined { .. }
                | Self::DriverNotSpecified { .. }
                | Self::InvalidDriver { .. }
        )
    }
}

/// 基础设施错误类型
#[derive(Error, Debug)]
pub enum InfrastructureError {
    #[error("配置错误: {source}")]
    ConfigError {
        #[from]
        source: ConfigError,
    },

    #[error("依赖注入错误: {source}")]
    DependencyError {
        #[from]
        source: DependencyError,
    },

    #[error("门面错误: {source}")]
    FacadeError {
        #[from]
        source: FacadeError,
    },

    #[error("管理器错误: {source}")]
    ManagerError {
        #[from]
        source: ManagerError,
    },
}

/// 结果类型别名
pub type ConfigResult<T> = Result<T, ConfigError>;
pub type DependencyResult<T> = Result<T, DependencyError>;
pub type FacadeResult<T> = Result<T, FacadeError>;
pub type ManagerResult<T> = Result<T, ManagerError>;
pub type InfrastructureResult<T> = Result<T, InfrastructureError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn facade_error_exposes_key_operation_and_cause() {
        let err = FacadeError::ResolutionFailed {
            key: "log".to_string(),
            operation: "resolve",
            source: DependencyError::ServiceNotBound {
                key: "log".to_string(),
            },
        };

        assert_eq!(err.service_key(), "log");
        assert_eq!(err.operation(), "resolve");
        let cause = err.source().expect("应该存在底层原因");
        assert!(cause.downcast_ref::<DependencyError>().is_some());
    }

    #[test]
    fn type_mismatch_reports_type_assertion_operation() {
        let err = FacadeError::TypeMismatch {
            key: "cache".to_string(),
            expected: "alloc::string::String",
        };

        assert!(err.is_type_mismatch());
        assert!(!err.is_configuration_error());
        assert_eq!(err.operation(), "type_assertion");
    }

    #[test]
    fn unsupported_driver_message_names_key_and_value() {
        let err = ManagerError::DriverNotSupported {
            driver_key: "driver".to_string(),
            driver: "oracle".to_string(),
        };

        let message = err.to_string();
        assert!(message.contains("driver"));
        assert!(message.contains("oracle"));
        assert!(!err.is_configuration_error());
    }
}
