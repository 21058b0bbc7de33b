//! 配置仓库抽象接口

use infrastructure_common::{ConfigError, ConfigSection};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// 配置仓库 trait
///
/// 以点分路径（如 `database.connections.mysql`）读取和写入配置值。
pub trait ConfigRepository: Send + Sync {
    /// 获取配置值
    fn get(&self, key: &str) -> Option<Value>;

    /// 设置配置值，中间路径不存在时自动创建
    fn set(&self, key: &str, value: Value) -> Result<(), ConfigError>;

    /// 获取完整的配置树
    fn all(&self) -> Value;

    /// 获取仓库名称
    fn name(&self) -> &str;

    /// 检查配置键是否存在
    fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// 获取配置节
    fn section(&self, key: &str) -> Result<ConfigSection, ConfigError> {
        match self.get(key) {
            Some(Value::Object(object)) => Ok(ConfigSection::from_object(object)),
            Some(_) => Err(ConfigError::TypeConversionError {
                message: format!("配置节 {} 不是对象类型", key),
            }),
            None => Err(ConfigError::KeyNotFound {
                key: key.to_string(),
            }),
        }
    }

    /// 获取字符串配置值
    fn get_string(&self, key: &str) -> Option<String> {
        self.get(key)
            .and_then(|value| value.as_str().map(str::to_string))
    }
}

/// 配置仓库的强类型辅助方法
pub trait ConfigRepositoryExt: ConfigRepository {
    /// 获取并反序列化配置值
    fn get_as<T>(&self, key: &str) -> Result<T, ConfigError>
    where
        T: DeserializeOwned,
    {
        let value = self.get(key).ok_or_else(|| ConfigError::KeyNotFound {
            key: key.to_string(),
        })?;
        serde_json::from_value(value).map_err(|e| ConfigError::TypeConversionError {
            message: format!("配置 {} 类型转换失败: {}", key, e),
        })
    }

    /// 获取配置值，不存在或类型不符时返回默认值
    fn get_or<T>(&self, key: &str, default: T) -> T
    where
        T: DeserializeOwned,
    {
        self.get_as(key).unwrap_or(default)
    }
}

impl<R: ConfigRepository + ?Sized> ConfigRepositoryExt for R {}
