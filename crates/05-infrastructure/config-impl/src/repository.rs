//! 内存配置仓库实现

use config_abstractions::ConfigRepository;
use infrastructure_common::ConfigError;
use parking_lot::RwLock;
use serde_json::{Map, Value};
use tracing::debug;

/// 内存配置仓库
///
/// 以 JSON 树保存全部配置，读多写少，使用读写锁保护。
#[derive(Debug)]
pub struct MemoryConfigRepository {
    name: String,
    root: RwLock<Value>,
}

impl MemoryConfigRepository {
    /// 创建空的配置仓库
    pub fn new() -> Self {
        Self::from_value(Value::Object(Map::new()))
    }

    /// 从 JSON 值创建配置仓库，非对象值会被包装为空对象
    pub fn from_value(value: Value) -> Self {
        let root = match value {
            Value::Object(_) => value,
            _ => Value::Object(Map::new()),
        };
        Self {
            name: "MemoryConfigRepository".to_string(),
            root: RwLock::new(root),
        }
    }

    /// 设置仓库名称
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// 将另一棵配置树深度合并进来，后者覆盖同名键
    pub fn merge(&self, other: Value) {
        let mut root = self.root.write();
        merge_values(&mut root, other);
    }

    /// 获取所有叶子配置键（点分路径）
    pub fn keys(&self) -> Vec<String> {
        let mut keys = Vec::new();
        if let Value::Object(object) = &*self.root.read() {
            collect_keys(object, "", &mut keys);
        }
        keys.sort();
        keys
    }
}

impl Default for MemoryConfigRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigRepository for MemoryConfigRepository {
    fn get(&self, key: &str) -> Option<Value> {
        let root = self.root.read();
        if key.is_empty() {
            return Some(root.clone());
        }

        let mut current = &*root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current.clone())
    }

    fn set(&self, key: &str, value: Value) -> Result<(), ConfigError> {
        if key.is_empty() {
            return Err(ConfigError::KeyNotFound {
                key: key.to_string(),
            });
        }

        debug!("设置配置: {}", key);
        let mut root = self.root.write();
        let mut parts = key.split('.').peekable();
        let mut current = &mut *root;

        while let Some(part) = parts.next() {
            let object = current
                .as_object_mut()
                .ok_or_else(|| ConfigError::TypeConversionError {
                    message: format!("配置路径 {} 中的 {} 不是对象类型", key, part),
                })?;

            if parts.peek().is_none() {
                object.insert(part.to_string(), value);
                return Ok(());
            }

            current = object
                .entry(part.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
        }

        Ok(())
    }

    fn all(&self) -> Value {
        self.root.read().clone()
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// 深度合并两棵 JSON 树
pub(crate) fn merge_values(target: &mut Value, source: Value) {
    match (target, source) {
        (Value::Object(target), Value::Object(source)) => {
            for (key, value) in source {
                match target.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        target.insert(key, value);
                    }
                }
            }
        }
        (target, source) => *target = source,
    }
}

/// 递归收集所有叶子键
fn collect_keys(object: &Map<String, Value>, prefix: &str, keys: &mut Vec<String>) {
    for (key, value) in object {
        let full_key = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };

        match value {
            Value::Object(nested) if !nested.is_empty() => collect_keys(nested, &full_key, keys),
            _ => keys.push(full_key),
        }
    }
}
