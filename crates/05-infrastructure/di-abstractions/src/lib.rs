//! # Dependency Injection Abstractions
//!
//! 依赖注入抽象层，定义容器使用的绑定标识、作用域、错误和配置类型。
//!
//! ## 核心类型
//!
//! - [`Binding`] - 类型化的绑定标识
//! - [`Scope`] - 绑定的缓存策略
//! - [`ContainerError`] - 容器错误
//! - [`ContainerConfig`] - 容器配置

pub mod binding;
pub mod container;
pub mod errors;
pub mod lifecycle;

pub use binding::*;
pub use container::*;
pub use errors::*;
pub use lifecycle::*;
