//! 配置加载器测试

use crate::ConfigLoader;
use config_abstractions::{ConfigRepository, ConfigRepositoryExt};
use infrastructure_common::ConfigError;
use serde::Deserialize;
use serde_json::json;
use std::io::Write;

/// 测试 TOML 字符串加载与嵌套键读取
#[test]
fn test_load_toml_string() {
    let repo = ConfigLoader::new()
        .add_toml_str(
            r#"
            [database]
            default = "mysql"

            [database.connections.mysql]
            driver = "mysql"
            port = 3306
            "#,
        )
        .build()
        .unwrap();

    assert_eq!(repo.get_string("database.default").as_deref(), Some("mysql"));
    assert_eq!(repo.get_as::<u16>("database.connections.mysql.port").unwrap(), 3306);
}

/// 测试后添加的配置源覆盖先添加的配置源
#[test]
fn test_later_sources_override_earlier() {
    let repo = ConfigLoader::new()
        .add_toml_str("[facade]\ncache_enabled = true\ncache_size_limit = 100")
        .add_json_str(r#"{ "facade": { "cache_size_limit": 10 } }"#)
        .build()
        .unwrap();

    assert_eq!(repo.get("facade.cache_enabled"), Some(json!(true)));
    assert_eq!(repo.get("facade.cache_size_limit"), Some(json!(10)));
}

/// 测试从临时文件加载并绑定到结构体
#[test]
fn test_load_files_and_bind() {
    #[derive(Debug, Deserialize)]
    struct Connection {
        driver: String,
        path: String,
    }

    let mut toml_file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(toml_file, "[connections.main]\ndriver = \"sqlite\"\npath = \"main.db\"").unwrap();

    let mut json_file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
    writeln!(json_file, r#"{{ "connections": {{ "main": {{ "path": "override.db" }} }} }}"#).unwrap();

    let repo = ConfigLoader::new()
        .add_file(toml_file.path(), true)
        .add_file(json_file.path(), true)
        .build()
        .unwrap();

    let connection: Connection = repo.section("connections.main").unwrap().bind().unwrap();
    assert_eq!(connection.driver, "sqlite");
    assert_eq!(connection.path, "override.db");
}

/// 测试必需文件缺失与可选文件缺失的不同处理
#[test]
fn test_missing_files() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("absent.toml");

    let result = ConfigLoader::new().add_file(&missing, true).build();
    assert!(matches!(result, Err(ConfigError::FileNotFound { .. })));

    let repo = ConfigLoader::new().add_file(&missing, false).build().unwrap();
    assert!(repo.keys().is_empty());
}

/// 测试不支持的文件格式
#[test]
fn test_unsupported_file_format() {
    let file = tempfile::Builder::new().suffix(".ini").tempfile().unwrap();
    let result = ConfigLoader::new().add_file(file.path(), true).build();
    assert!(matches!(result, Err(ConfigError::LoadError { .. })));
}

/// 测试非法 TOML 内容
#[test]
fn test_invalid_toml_reports_parse_error() {
    let result = ConfigLoader::new().add_toml_str("[facade\ncache = ").build();
    assert!(matches!(result, Err(ConfigError::ParseError { .. })));
}

/// 测试环境变量配置源
#[test]
fn test_environment_source() {
    std::env::set_var("LOADERTEST__FACADE__METRICS_ENABLED", "false");

    let repo = ConfigLoader::new()
        .add_toml_str("[facade]\nmetrics_enabled = true\ncache_enabled = true")
        .add_env("LOADERTEST", "__")
        .build()
        .unwrap();

    std::env::remove_var("LOADERTEST__FACADE__METRICS_ENABLED");

    assert_eq!(repo.get("facade.metrics_enabled"), Some(json!("false")));
    assert_eq!(repo.get("facade.cache_enabled"), Some(json!(true)));
}
