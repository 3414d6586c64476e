//! 容器构建器
//!
//! 收集绑定后一次性构建容器，适合在启动阶段集中声明所有注册

use crate::container::Container;
use crate::factory::FactoryFunction;
use di_abstractions::{Binding, ContainerConfig, Scope};
use tracing::info;

type Registration = Box<dyn FnOnce(&Container) + Send>;

/// 容器构建器实现
#[derive(Default)]
pub struct ContainerBuilder {
    config: ContainerConfig,
    registrations: Vec<Registration>,
}

impl ContainerBuilder {
    /// 创建新的构建器
    pub fn new() -> Self {
        Self::default()
    }

    /// 配置容器
    pub fn with_config(mut self, config: ContainerConfig) -> Self {
        self.config = config;
        self
    }

    /// 添加绑定，构建时按添加顺序调用 [`Container::bind`]
    pub fn bind<T, F>(mut self, binding: Binding<T>, factory: F, scope: Scope) -> Self
    where
        T: Send + Sync + 'static,
        F: FactoryFunction<T>,
    {
        self.registrations
            .push(Box::new(move |container: &Container| {
                container.bind(&binding, factory, scope);
            }));
        self
    }

    /// 添加工厂作用域绑定
    pub fn factory<T, F>(self, binding: Binding<T>, factory: F) -> Self
    where
        T: Send + Sync + 'static,
        F: FactoryFunction<T>,
    {
        self.bind(binding, factory, Scope::Factory)
    }

    /// 添加单例作用域绑定
    pub fn singleton<T, F>(self, binding: Binding<T>, factory: F) -> Self
    where
        T: Send + Sync + 'static,
        F: FactoryFunction<T>,
    {
        self.bind(binding, factory, Scope::Singleton)
    }

    /// 添加默认绑定，仅在此前未绑定时生效
    pub fn bind_once<T, F>(mut self, binding: Binding<T>, factory: F, scope: Scope) -> Self
    where
        T: Send + Sync + 'static,
        F: FactoryFunction<T>,
    {
        self.registrations.push(Box::new(move |container: &Container| {
            container.bind_once(&binding, factory, scope);
        }));
        self
    }

    /// 构建容器
    pub fn build(self) -> Container {
        let container = Container::with_config(self.config);

        let registration_count = self.registrations.len();
        for register in self.registrations {
            register(&container);
        }

        info!(
            "构建容器完成，处理 {} 个注册，实际绑定 {} 个",
            registration_count,
            container.len()
        );
        container
    }
}
