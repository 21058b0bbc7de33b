//! 门面缓存配置选项

use infrastructure_common::{ConfigError, ConfigSection};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 门面缓存配置
///
/// 可以直接从配置节反序列化，配置文件中的 TTL 以毫秒表示（`cache_ttl_ms`）。
///
/// ```toml
/// [facade]
/// cache_enabled = true
/// max_cache_size = 500
/// cache_ttl_ms = 30000
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FacadeOptions {
    /// 是否启用缓存
    pub cache_enabled: bool,
    /// 最大缓存条目数，0 表示不限制
    pub max_cache_size: usize,
    /// 缓存存活时间，从创建时刻起计算，0 表示永不过期
    #[serde(rename = "cache_ttl_ms", with = "duration_millis")]
    pub cache_ttl: Duration,
    /// 是否输出缓存命中/未命中等调试日志
    pub debug: bool,
    /// 是否收集统计信息
    pub metrics_enabled: bool,
}

impl Default for FacadeOptions {
    fn default() -> Self {
        Self {
            cache_enabled: true,
            max_cache_size: 1000,
            cache_ttl: Duration::ZERO,
            debug: false,
            metrics_enabled: true,
        }
    }
}

impl FacadeOptions {
    /// 从配置节加载，缺失的字段使用默认值
    pub fn from_section(section: &ConfigSection) -> Result<Self, ConfigError> {
        section.bind()
    }

    /// 设置是否启用缓存
    #[must_use]
    pub fn with_cache_enabled(mut self, enabled: bool) -> Self {
        self.cache_enabled = enabled;
        self
    }

    /// 设置最大缓存条目数
    #[must_use]
    pub fn with_max_cache_size(mut self, size: usize) -> Self {
        self.max_cache_size = size;
        self
    }

    /// 设置缓存存活时间
    #[must_use]
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// 设置调试日志开关
    #[must_use]
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// 设置统计开关
    #[must_use]
    pub fn with_metrics_enabled(mut self, enabled: bool) -> Self {
        self.metrics_enabled = enabled;
        self
    }

    /// 是否设置了缓存条目上限
    pub fn is_bounded(&self) -> bool {
        self.max_cache_size > 0
    }

    /// 是否设置了 TTL
    pub fn has_ttl(&self) -> bool {
        !self.cache_ttl.is_zero()
    }
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_match_documented_values() {
        let options = FacadeOptions::default();
        assert!(options.cache_enabled);
        assert_eq!(options.max_cache_size, 1000);
        assert!(!options.has_ttl());
        assert!(!options.debug);
        assert!(options.metrics_enabled);
    }

    #[test]
    fn section_fills_missing_fields_with_defaults() {
        let section = ConfigSection::new()
            .with("max_cache_size", 2)
            .with("cache_ttl_ms", 1500);

        let options = FacadeOptions::from_section(&section).unwrap();
        assert_eq!(options.max_cache_size, 2);
        assert_eq!(options.cache_ttl, Duration::from_millis(1500));
        assert!(options.cache_enabled);
    }

    #[test]
    fn ttl_serializes_as_milliseconds() {
        let options = FacadeOptions::default().with_cache_ttl(Duration::from_secs(3));
        let value = serde_json::to_value(&options).unwrap();
        assert_eq!(value["cache_ttl_ms"], json!(3000));
    }

    #[test]
    fn invalid_section_is_reported() {
        let section = ConfigSection::new().with("max_cache_size", "many");
        assert!(FacadeOptions::from_section(&section).is_err());
    }
}
