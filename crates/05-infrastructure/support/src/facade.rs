//! 门面 trait
//!
//! 门面只声明服务键和服务类型，解析、缓存和错误处理全部委托给 [`ServiceLocator`]。
//!
//! ```no_run
//! use support::Facade;
//!
//! struct AppName;
//!
//! impl Facade for AppName {
//!     type Service = String;
//!     const KEY: &'static str = "app.name";
//! }
//!
//! let name = AppName::resolve();
//! println!("{}", name);
//! ```

use crate::locator::{ServiceLocator, SwapGuard};
use infrastructure_common::FacadeResult;
use std::sync::Arc;

/// 门面
pub trait Facade {
    /// 解析出的服务类型
    type Service: Send + Sync + 'static;

    /// 容器中的服务键
    const KEY: &'static str;

    /// 门面使用的定位器，默认为进程级定位器
    fn locator() -> &'static ServiceLocator {
        ServiceLocator::global()
    }

    /// 解析服务，失败时 panic
    fn resolve() -> Arc<Self::Service> {
        Self::locator().resolve(Self::KEY)
    }

    /// 解析服务并返回错误
    fn try_resolve() -> FacadeResult<Arc<Self::Service>> {
        Self::locator().try_resolve(Self::KEY)
    }

    /// 替换为替身服务
    fn swap(mock: Self::Service) -> SwapGuard<'static> {
        Self::locator().swap_service(Self::KEY, Arc::new(mock))
    }

    /// 清除已解析的缓存实例
    fn forget_resolved() -> bool {
        Self::locator().clear_cache_for(Self::KEY)
    }

    /// 服务是否已缓存
    fn is_resolved() -> bool {
        Self::locator().is_service_cached(Self::KEY)
    }
}
