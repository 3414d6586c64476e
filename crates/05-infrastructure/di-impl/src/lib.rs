//! # 依赖注入具体实现
//!
//! 提供绑定/作用域式的依赖注入容器和容器构建器
//!
//! - [`Container`] - 绑定注册与解析
//! - [`ContainerBuilder`] - 启动阶段集中声明绑定
//! - [`FactoryFunction`] - 接收容器本身的工厂函数
//!
//! 容器不做循环依赖检测。同一线程上单例工厂重入解析自身时不会等待
//! 自己的缓存槽，而是直接再次调用工厂，无终止条件的自依赖会耗尽栈空间；
//! 工厂作用域的自依赖同样会无限递归。

pub mod builder;
pub mod container;
pub mod factory;

pub use builder::ContainerBuilder;
pub use container::Container;
pub use factory::{FactoryFunction, FactoryResult};

pub use di_abstractions::{
    Binding, BoxError, ContainerConfig, ContainerError, ContainerResult, RebindPolicy, Scope,
};
