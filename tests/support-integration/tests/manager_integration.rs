//! 配置驱动的多实例管理器集成测试

use config_abstractions::ConfigRepository;
use config_impl::{ConfigLoader, MemoryConfigRepository};
use di_abstractions::{Container, ContainerExt};
use di_impl::ServiceContainer;
use infrastructure_common::{BoxError, DriverConfig, ManagerError};
use parking_lot::RwLock;
use std::io::Write;
use std::sync::Arc;
use support::{
    instance_config_from, CreateMethod, FacadeOptions, InstanceSource, MultipleInstanceManager,
    ServiceLocator,
};

const CONFIG: &str = r#"
[facade]
max_cache_size = 2
cache_ttl_ms = 60000

[database]
default = "primary"

[database.connections.primary]
driver = "sqlite"
path = "primary.db"

[database.connections.reporting]
driver = "postgres"
host = "reports.internal"
port = 5432

[database.connections.archive]
driver = "cold-storage"
bucket = "archive"
"#;

trait Connection: Send + Sync {
    fn describe(&self) -> String;
}

struct SqliteConnection {
    path: String,
}

impl Connection for SqliteConnection {
    fn describe(&self) -> String {
        format!("sqlite://{}", self.path)
    }
}

struct PostgresConnection {
    host: String,
    port: u64,
}

impl Connection for PostgresConnection {
    fn describe(&self) -> String {
        format!("postgres://{}:{}", self.host, self.port)
    }
}

/// 读取 `database.*` 配置的连接管理器
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

    fn create_sqlite_driver(&self, config: &DriverConfig) -> Result<Arc<dyn Connection>, BoxError> {
        let path = config.get_str("path").ok_or("sqlite 连接缺少 path")?;
        Ok(Arc::new(SqliteConnection {
            path: path.to_string(),
        }))
    }

    fn create_postgres_driver(&self, config: &DriverConfig) -> Result<Arc<dyn Connection>, BoxError> {
        let host = config.get_str("host").ok_or("postgres 连接缺少 host")?;
        let port = config
            .get("port")
            .and_then(|port| port.as_u64())
            .unwrap_or(5432);
        Ok(Arc::new(PostgresConnection {
            host: host.to_string(),
            port,
        }))
    }
}

impl InstanceSource for DatabaseManager {
    type Instance = dyn Connection;

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

fn load_config() -> Arc<MemoryConfigRepository> {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    file.write_all(CONFIG.as_bytes()).unwrap();

    let repository = ConfigLoader::new()
        .add_file(file.path(), true)
        .build()
        .unwrap();
    Arc::new(repository)
}

fn database_manager() -> MultipleInstanceManager<DatabaseManager> {
    let config = load_config();
    let container = Arc::new(ServiceContainer::new());
    MultipleInstanceManager::new(container, DatabaseManager::new(config))
}

/// 测试从配置文件创建多个命名连接
#[test]
fn test_connections_from_config_file() {
    let manager = database_manager();

    let primary = manager.instance(None).unwrap();
    let reporting = manager.instance(Some("reporting")).unwrap();

    assert_eq!(primary.describe(), "sqlite://primary.db");
    assert_eq!(reporting.describe(), "postgres://reports.internal:5432");
    assert_eq!(manager.instances().len(), 2);
}

/// 测试扩展驱动与不支持的驱动
#[test]
fn test_extension_for_custom_driver() {
    let manager = database_manager();

    let err = manager.instance(Some("archive")).err().unwrap();
    assert!(matches!(err, ManagerError::DriverNotSupported { ref driver, .. } if driver == "cold-storage"));

    manager.extend("cold-storage", |_, config| {
        let bucket = config.get_str("bucket").unwrap_or("default");
        Ok(Arc::new(SqliteConnection {
            path: format!("{}.cold", bucket),
        }) as Arc<dyn Connection>)
    });

    let archive = manager.instance(Some("archive")).unwrap();
    assert_eq!(archive.describe(), "sqlite://archive.cold");
}

/// 测试管理器注册到容器后经由定位器解析
#[test]
fn test_manager_resolved_through_locator() {
    let config = load_config();
    let container = Arc::new(ServiceContainer::new());
    let manager_container: Arc<dyn Container> = container.clone();
    let manager_config = config.clone();
    container
        .singleton_fn("db", move |_| {
            Ok(MultipleInstanceManager::new(
                manager_container.clone(),
                DatabaseManager::new(manager_config.clone()),
            ))
        })
        .unwrap();

    let locator = ServiceLocator::new();
    let options = FacadeOptions::from_section(&config.section("facade").unwrap()).unwrap();
    assert_eq!(options.max_cache_size, 2);
    locator.configure(options);
    locator.set_container(container);

    let db = locator.resolve::<MultipleInstanceManager<DatabaseManager>>("db");
    assert_eq!(db.instance(None).unwrap().describe(), "sqlite://primary.db");

    let again = locator.resolve::<MultipleInstanceManager<DatabaseManager>>("db");
    assert!(Arc::ptr_eq(&db, &again));
    assert_eq!(again.instances().len(), 1);
}
