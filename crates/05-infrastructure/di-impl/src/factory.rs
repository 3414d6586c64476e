//! 工厂函数
//!
//! 工厂接收容器本身作为参数，可以从同一个容器解析自己的依赖

use crate::container::Container;
use di_abstractions::BoxError;
use std::any::Any;
use std::sync::Arc;

/// 工厂函数的返回类型
pub type FactoryResult<T> = Result<T, BoxError>;

/// 类型擦除后的实例
pub(crate) type Instance = Arc<dyn Any + Send + Sync>;

/// 类型擦除后的工厂
pub(crate) type ErasedFactory = Arc<dyn Fn(&Container) -> FactoryResult<Instance> + Send + Sync>;

/// 为 `T` 构造值的工厂函数
///
/// 对所有 `Fn(&Container) -> FactoryResult<T>` 闭包自动实现。
pub trait FactoryFunction<T>: Fn(&Container) -> FactoryResult<T> + Send + Sync + 'static {}

impl<T, F> FactoryFunction<T> for F where F: Fn(&Container) -> FactoryResult<T> + Send + Sync + 'static {}

/// 擦除工厂的返回类型
pub(crate) fn erase<T, F>(factory: F) -> ErasedFactory
where
    T: Send + Sync + 'static,
    F: FactoryFunction<T>,
{
    Arc::new(move |container: &Container| {
        let value = factory(container)?;
        Ok(Arc::new(value) as Instance)
    })
}
