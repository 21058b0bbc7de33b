//! # 示例应用程序
//!
//! 演示门面缓存与多实例驱动管理器：
//!
//! 1. 从 TOML 文件和环境变量加载配置
//! 2. 构建服务容器并注册服务
//! 3. 通过门面解析服务，观察缓存统计
//! 4. 通过连接管理器创建命名数据库连接

use anyhow::Context;
use clap::Parser;
use config_abstractions::ConfigRepository;
use config_impl::{ConfigLoader, MemoryConfigRepository};
use di_abstractions::{Container, ContainerExt};
use di_impl::ServiceContainer;
use infrastructure_common::{BoxError, DriverConfig};
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;
use support::{
    instance_config_from, CreateMethod, Facade, FacadeOptions, InstanceSource,
    MultipleInstanceManager, ServiceLocator,
};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// 内置的默认配置
const DEFAULT_CONFIG: &str = r#"
[app]
name = "lorn-adsp-demo"

[facade]
cache_enabled = true
max_cache_size = 16
cache_ttl_ms = 0
debug = true

[database]
default = "primary"

[database.connections.primary]
driver = "sqlite"
path = "data/primary.db"

[database.connections.reporting]
driver = "postgres"
host = "localhost"
port = 5432
"#;

/// 命令行参数
#[derive(Parser, Debug)]
#[command(name = "example-app")]
#[command(about = "Lorn ADSP 门面缓存与驱动管理器示例")]
struct Args {
    /// 配置文件路径，文件不存在时只使用内置配置
    #[arg(short, long, default_value = "config/app.toml")]
    config: String,

    /// 日志级别
    #[arg(long, default_value = "info")]
    log_level: String,

    /// 以 JSON 格式输出统计信息
    #[arg(long)]
    json: bool,
}

/// 应用名称服务
#[derive(Debug)]
struct AppInfo {
    name: String,
}

struct App;

impl Facade for App {
    type Service = AppInfo;
    const KEY: &'static str = "app";
}

/// 数据库连接
#[derive(Debug, Serialize)]
struct Connection {
    driver: String,
    dsn: String,
}

/// 连接管理器，连接配置位于 `database.connections.<name>`
struct DatabaseManager {
    config: Arc<MemoryConfigRepository>,
    default: RwLock<String>,
}

impl DatabaseManager {
    fn new(config: Arc<MemoryConfigRepository>) -> Self {
        let default = config
            .get_string("database.default")
            .unwrap_or_else(|| "primary".to_string());
        Self {
            config,
            default: RwLock::new(default),
        }
    }

    fn create_sqlite_driver(&self, config: &DriverConfig) -> Result<Arc<Connection>, BoxError> {
        let path = config.get_str("path").ok_or("sqlite 连接缺少 path 配置")?;
        Ok(Arc::new(Connection {
            driver: "sqlite".to_string(),
            dsn: format!("sqlite://{}", path),
        }))
    }

    fn create_postgres_driver(&self, config: &DriverConfig) -> Result<Arc<Connection>, BoxError> {
        let host = config.get_str("host").ok_or("postgres 连接缺少 host 配置")?;
        let port = config.get("port").and_then(|v| v.as_u64()).unwrap_or(5432);
        Ok(Arc::new(Connection {
            driver: "postgres".to_string(),
            dsn: format!("postgres://{}:{}", host, port),
        }))
    }
}

impl InstanceSource for DatabaseManager {
    type Instance = Connection;

    fn default_instance(&self) -> String {
        self.default.read().clone()
    }

    fn set_default_instance(&self, name: &str) {
        *self.default.write() = name.to_string();
    }

    fn instance_config(&self, name: &str) -> Option<DriverConfig> {
        instance_config_from(&*self.config, "database.connections", name)
    }

    fn create_methods() -> Vec<(&'static str, CreateMethod<Self>)> {
        vec![
            ("create_sqlite_driver", Self::create_sqlite_driver as CreateMethod<Self>),
            ("create_postgres_driver", Self::create_postgres_driver as CreateMethod<Self>),
        ]
    }
}

struct Db;

impl Facade for Db {
    type Service = MultipleInstanceManager<DatabaseManager>;
    const KEY: &'static str = "db";
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level)),
        )
        .init();

    info!("启动 Lorn ADSP 示例应用");

    let config = Arc::new(load_config(&args)?);
    let container = build_container(config.clone())?;

    let locator = ServiceLocator::global();
    let options = match config.section("facade") {
        Ok(section) => FacadeOptions::from_section(&section).context("facade 配置无效")?,
        Err(_) => FacadeOptions::default(),
    };
    locator.configure(options);
    locator.set_container(container);

    demonstrate_facades().await?;
    demonstrate_connections()?;

    let stats = locator.stats();
    if args.json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        info!(
            hits = stats.cache_hits,
            misses = stats.cache_misses,
            size = stats.cache_size,
            "门面缓存命中率 {:.1}%",
            stats.hit_rate() * 100.0
        );
    }

    info!("示例应用运行完成");
    Ok(())
}

/// 加载配置：内置默认值、配置文件、`ADSP__` 前缀的环境变量
fn load_config(args: &Args) -> anyhow::Result<MemoryConfigRepository> {
    let repository = ConfigLoader::new()
        .add_toml_str(DEFAULT_CONFIG)
        .add_file(&args.config, false)
        .add_env("ADSP", "__")
        .build()
        .with_context(|| format!("加载配置失败: {}", args.config))?;

    info!("配置已加载: {} 个配置项", repository.keys().len());
    Ok(repository)
}

/// 构建服务容器
fn build_container(config: Arc<MemoryConfigRepository>) -> anyhow::Result<Arc<dyn Container>> {
    let container = Arc::new(ServiceContainer::new());

    let app_name = config
        .get_string("app.name")
        .unwrap_or_else(|| "lorn-adsp".to_string());
    container.singleton_fn("app", move |_| {
        Ok(AppInfo {
            name: app_name.clone(),
        })
    })?;

    let manager_container: Arc<dyn Container> = container.clone();
    container.singleton_fn("db", move |_| {
        Ok(MultipleInstanceManager::new(
            manager_container.clone(),
            DatabaseManager::new(config.clone()),
        ))
    })?;

    Ok(container)
}

/// 演示门面解析与并发访问
async fn demonstrate_facades() -> anyhow::Result<()> {
    let app = App::resolve();
    info!("应用名称: {}", app.name);

    let tasks: Vec<_> = (0..4)
        .map(|worker| {
            tokio::spawn(async move {
                let app = App::try_resolve()?;
                info!(worker, "工作任务解析到应用: {}", app.name);
                Ok::<_, infrastructure_common::FacadeError>(())
            })
        })
        .collect();
    for task in tasks {
        task.await??;
    }

    let token = CancellationToken::new();
    token.cancel();
    if let Err(err) = ServiceLocator::global().resolve_with_cancellation::<AppInfo>(&token, App::KEY) {
        warn!("已取消的解析请求: {}", err);
    }

    {
        let _guard = App::swap(AppInfo {
            name: "mocked".to_string(),
        });
        info!("替身生效: {}", App::resolve().name);
    }
    info!("替身已恢复: {}", App::resolve().name);
    Ok(())
}

/// 演示命名连接
fn demonstrate_connections() -> anyhow::Result<()> {
    let db = Db::resolve();

    let primary = db.instance(None)?;
    let reporting = db.instance(Some("reporting"))?;
    info!("默认连接: {}", serde_json::to_string(&*primary)?);
    info!("报表连接: {} ({})", reporting.dsn, reporting.driver);

    db.extend("memory", |_, _| {
        Ok(Arc::new(Connection {
            driver: "memory".to_string(),
            dsn: "memory://".to_string(),
        }))
    });
    if let Err(err) = db.instance(Some("cache")) {
        warn!("未配置的连接: {}", err);
    }

    let mut names: Vec<String> = db.instances().into_keys().collect();
    names.sort();
    info!("已创建连接: {}", names.join(", "));
    Ok(())
}
