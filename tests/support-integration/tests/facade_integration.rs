//! 门面与服务定位器的跨 crate 集成测试

use di_abstractions::{Container, ContainerExt};
use di_impl::ServiceContainer;
use infrastructure_common::{FacadeError, InfrastructureError};
use once_cell::sync::Lazy;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use support::{Facade, FacadeOptions, ServiceLocator};
use tokio_util::sync::CancellationToken;

/// 测试专用的定位器，避免与进程级定位器互相影响
static TEST_LOCATOR: Lazy<ServiceLocator> = Lazy::new(|| {
    let locator = ServiceLocator::new();
    locator.set_container(build_container());
    locator
});

static GREETINGS: AtomicUsize = AtomicUsize::new(0);

#[derive(Debug)]
struct Greeter {
    greeting: String,
}

impl Greeter {
    fn greet(&self, name: &str) -> String {
        format!("{}, {}!", self.greeting, name)
    }
}

#[derive(Debug)]
struct Clock {
    zone: String,
}

fn build_container() -> Arc<dyn Container> {
    let container = ServiceContainer::new();
    container
        .bind_fn("greeter", |_| {
            GREETINGS.fetch_add(1, Ordering::SeqCst);
            Ok(Greeter {
                greeting: "Hello".to_string(),
            })
        })
        .unwrap();
    container
        .instance_of("clock", Clock {
            zone: "UTC".to_string(),
        })
        .unwrap();
    container.instance_of("app.name", String::from("adsp")).unwrap();
    Arc::new(container)
}

struct GreeterFacade;

impl Facade for GreeterFacade {
    type Service = Greeter;
    const KEY: &'static str = "greeter";

    fn locator() -> &'static ServiceLocator {
        &TEST_LOCATOR
    }
}

struct ClockFacade;

impl Facade for ClockFacade {
    type Service = Clock;
    const KEY: &'static str = "clock";

    fn locator() -> &'static ServiceLocator {
        &TEST_LOCATOR
    }
}

/// 声明了错误类型的门面
struct MisdeclaredFacade;

impl Facade for MisdeclaredFacade {
    type Service = Clock;
    const KEY: &'static str = "app.name";

    fn locator() -> &'static ServiceLocator {
        &TEST_LOCATOR
    }
}

/// 测试门面解析只创建一次服务
#[test]
fn test_facade_resolves_once() {
    let first = GreeterFacade::resolve();
    let second = GreeterFacade::resolve();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(first.greet("world"), "Hello, world!");
    assert!(GreeterFacade::is_resolved());
    assert_eq!(GREETINGS.load(Ordering::SeqCst), 1);
}

/// 测试门面替身的安装与恢复
#[test]
fn test_facade_swap_for_tests() {
    let real = ClockFacade::resolve();
    assert_eq!(real.zone, "UTC");

    {
        let _guard = ClockFacade::swap(Clock {
            zone: "Asia/Shanghai".to_string(),
        });
        assert_eq!(ClockFacade::resolve().zone, "Asia/Shanghai");
    }

    assert!(Arc::ptr_eq(&real, &ClockFacade::resolve()));
    assert!(ClockFacade::forget_resolved());
    assert!(!ClockFacade::is_resolved());
}

/// 测试类型声明错误的门面返回类型不匹配错误
#[test]
fn test_misdeclared_facade_reports_type_mismatch() {
    let err = MisdeclaredFacade::try_resolve().unwrap_err();
    assert!(err.is_type_mismatch());
    assert_eq!(err.service_key(), "app.name");

    let wrapped: InfrastructureError = err.into();
    assert!(wrapped.to_string().contains("app.name"));
}

/// 测试进程级定位器是唯一实例
#[test]
fn test_global_locator_is_shared() {
    let locator = ServiceLocator::global();
    assert!(std::ptr::eq(locator, ServiceLocator::global()));

    let container = ServiceContainer::new();
    container.instance_of("global.only", 7_u32).unwrap();
    locator.set_container(Arc::new(container));

    assert_eq!(*locator.resolve::<u32>("global.only"), 7);
    assert!(locator.cached_services().contains(&"global.only".to_string()));
}

/// 测试运行时重新配置后的行为
#[test]
fn test_runtime_reconfiguration() -> anyhow::Result<()> {
    let locator = ServiceLocator::new();
    let container = ServiceContainer::new();
    for key in ["a", "b", "c", "d"] {
        container.instance_of(key, key.to_string())?;
    }
    locator.set_container(Arc::new(container));

    for key in ["a", "b", "c", "d"] {
        locator.try_resolve::<String>(key)?;
    }
    assert_eq!(locator.stats().cache_size, 4);

    locator.configure(locator.options().with_max_cache_size(2));
    assert_eq!(locator.cached_services(), vec!["c", "d"]);

    let stats = locator.stats();
    assert_eq!(stats.cache_evictions, 2);
    assert_eq!(stats.cache_misses, 4);
    Ok(())
}

/// 测试取消后的解析
#[tokio::test]
async fn test_cancellation_with_shared_locator() {
    let token = CancellationToken::new();
    let name = TEST_LOCATOR
        .resolve_with_cancellation::<String>(&token, "app.name")
        .unwrap();
    assert_eq!(name.as_str(), "adsp");

    token.cancel();
    let err = TEST_LOCATOR
        .resolve_with_cancellation::<String>(&token, "app.name")
        .unwrap_err();
    assert!(matches!(err, FacadeError::Cancelled { .. }));
}

/// 测试禁用缓存后每次都从容器解析
#[test]
fn test_disabled_cache_always_hits_container() {
    let locator = ServiceLocator::new();
    let container = ServiceContainer::new();
    let built = Arc::new(AtomicUsize::new(0));
    let counter = built.clone();
    container
        .bind_fn("report", move |_| Ok(counter.fetch_add(1, Ordering::SeqCst)))
        .unwrap();
    locator.set_container(Arc::new(container));
    locator.configure(FacadeOptions::default().with_cache_enabled(false));

    for _ in 0..3 {
        locator.resolve::<usize>("report");
    }
    assert_eq!(built.load(Ordering::SeqCst), 3);
    assert_eq!(locator.stats().cache_hits, 0);
    assert_eq!(locator.stats().resolutions, 3);
}
