//! 配置加载器
//!
//! 按添加顺序合并多个配置源，后添加的源覆盖先添加的源。

use crate::repository::{merge_values, MemoryConfigRepository};
use infrastructure_common::ConfigError;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// 配置源
#[derive(Debug, Clone)]
enum ConfigSource {
    TomlString(String),
    JsonString(String),
    File { path: PathBuf, required: bool },
    Environment { prefix: String, separator: String },
    Value(Value),
}

/// 配置加载器
///
/// 使用建造者模式收集配置源，最后构建出 [`MemoryConfigRepository`]。
#[derive(Debug, Default)]
pub struct ConfigLoader {
    sources: Vec<ConfigSource>,
}

impl ConfigLoader {
    /// 创建新的配置加载器
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
        }
    }

    /// 添加 TOML 字符串
    #[must_use]
    pub fn add_toml_str(mut self, content: impl Into<String>) -> Self {
        self.sources.push(ConfigSource::TomlString(content.into()));
        self
    }

    /// 添加 JSON 字符串
    #[must_use]
    pub fn add_json_str(mut self, content: impl Into<String>) -> Self {
        self.sources.push(ConfigSource::JsonString(content.into()));
        self
    }

    /// 添加配置文件，按扩展名识别 TOML 或 JSON
    #[must_use]
    pub fn add_file<P: AsRef<Path>>(mut self, path: P, required: bool) -> Self {
        self.sources.push(ConfigSource::File {
            path: path.as_ref().to_path_buf(),
            required,
        });
        self
    }

    /// 添加环境变量配置源，`separator` 用于分隔嵌套键
    #[must_use]
    pub fn add_env(mut self, prefix: impl Into<String>, separator: impl Into<String>) -> Self {
        self.sources.push(ConfigSource::Environment {
            prefix: prefix.into(),
            separator: separator.into(),
        });
        self
    }

    /// 添加现成的 JSON 值
    #[must_use]
    pub fn add_value(mut self, value: Value) -> Self {
        self.sources.push(ConfigSource::Value(value));
        self
    }

    /// 加载所有配置源并构建仓库
    pub fn build(self) -> Result<MemoryConfigRepository, ConfigError> {
        let mut root = Value::Object(Map::new());
        let source_count = self.sources.len();

        for source in self.sources {
            if let Some(value) = load_source(source)? {
                merge_values(&mut root, value);
            }
        }

        info!("配置加载完成，共 {} 个配置源", source_count);
        Ok(MemoryConfigRepository::from_value(root))
    }
}

fn load_source(source: ConfigSource) -> Result<Option<Value>, ConfigError> {
    match source {
        ConfigSource::TomlString(content) => parse_toml(&content).map(Some),
        ConfigSource::JsonString(content) => Ok(Some(serde_json::from_str(&content)?)),
        ConfigSource::Value(value) => Ok(Some(value)),
        ConfigSource::File { path, required } => load_file(&path, required),
        ConfigSource::Environment { prefix, separator } => load_env(&prefix, &separator).map(Some),
    }
}

fn load_file(path: &Path, required: bool) -> Result<Option<Value>, ConfigError> {
    if !path.exists() {
        if required {
            return Err(ConfigError::FileNotFound {
                path: path.display().to_string(),
            });
        }
        debug!("可选配置文件不存在，跳过: {}", path.display());
        return Ok(None);
    }

    debug!("加载配置文件: {}", path.display());
    let content = std::fs::read_to_string(path)?;

    match path.extension().and_then(|ext| ext.to_str()) {
        Some("toml") => parse_toml(&content).map(Some),
        Some("json") => Ok(Some(serde_json::from_str(&content)?)),
        other => Err(ConfigError::LoadError {
            message: format!(
                "不支持的配置文件格式: {} ({})",
                path.display(),
                other.unwrap_or("无扩展名")
            ),
        }),
    }
}

fn load_env(prefix: &str, separator: &str) -> Result<Value, ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::Environment::with_prefix(prefix).separator(separator))
        .build()
        .map_err(|e| ConfigError::LoadError {
            message: format!("环境变量加载失败: {}", e),
        })?;

    settings
        .try_deserialize::<Value>()
        .map_err(|e| ConfigError::ParseError {
            source: Box::new(e),
        })
}

fn parse_toml(content: &str) -> Result<Value, ConfigError> {
    let table: toml::Table = toml::from_str(content).map_err(|e| ConfigError::ParseError {
        source: Box::new(e),
    })?;
    Ok(toml_to_json(&toml::Value::Table(table)))
}

/// 将 TOML 值转换为 JSON 值
fn toml_to_json(value: &toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::String(s.clone()),
        toml::Value::Integer(i) => Value::Number(serde_json::Number::from(*i)),
        toml::Value::Float(f) => serde_json::Number::from_f64(*f).map_or(Value::Null, Value::Number),
        toml::Value::Boolean(b) => Value::Bool(*b),
        toml::Value::Array(arr) => Value::Array(arr.iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => Value::Object(
            table
                .iter()
                .map(|(k, v)| (k.clone(), toml_to_json(v)))
                .collect(),
        ),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
    }
}
