//! 依赖注入容器
//!
//! 维护两张表：绑定配置表（绑定 -> 工厂 + 作用域）与已解析单例缓存。
//! 两张表由同一把读写锁保护，调用用户工厂期间不持有任何锁，
//! 因此工厂可以重入容器解析自己的依赖。

use crate::factory::{self, ErasedFactory, FactoryFunction, Instance};
use di_abstractions::{
    Binding, BindingInfo, BindingKey, ContainerConfig, ContainerError, ContainerResult,
    ContainerStats, RebindPolicy, Scope,
};
use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// 单个绑定的注册信息
#[derive(Clone)]
struct BindingConfig {
    name: &'static str,
    factory: ErasedFactory,
    scope: Scope,
}

/// 单例缓存槽，值存在即视为已解析
type ResolvedSlot = Arc<OnceCell<Instance>>;

#[derive(Default)]
struct Registry {
    configs: HashMap<BindingKey, BindingConfig>,
    resolved: HashMap<BindingKey, ResolvedSlot>,
}

impl Registry {
    fn is_resolved(&self, key: &BindingKey) -> bool {
        self.resolved.get(key).is_some_and(|slot| slot.get().is_some())
    }

    fn resolved_count(&self) -> usize {
        self.resolved.values().filter(|slot| slot.get().is_some()).count()
    }
}

/// 内部统计计数器
#[derive(Default)]
struct InnerStats {
    resolutions: AtomicU64,
    cache_hits: AtomicU64,
    factory_invocations: AtomicU64,
}

/// 依赖注入容器
///
/// ```
/// use di_abstractions::{Binding, Scope};
/// use di_impl::Container;
///
/// struct Config { base_url: String }
/// struct HttpClient { base_url: String }
///
/// let container = Container::new();
/// container.bind_singleton(&Binding::<HttpClient>::of(), |c| {
///     let config = c.get(&Binding::<Config>::of())?;
///     Ok(HttpClient { base_url: config.base_url.clone() })
/// });
/// container.bind(
///     &Binding::<Config>::of(),
///     |_| Ok(Config { base_url: "https://ads.example".into() }),
///     Scope::Singleton,
/// );
///
/// let client = container.get(&Binding::<HttpClient>::of()).unwrap();
/// assert_eq!(client.base_url, "https://ads.example");
/// ```
pub struct Container {
    registry: RwLock<Registry>,
    config: ContainerConfig,
    stats: InnerStats,
}

impl Container {
    /// 创建使用默认配置的容器
    pub fn new() -> Self {
        Self::with_config(ContainerConfig::default())
    }

    /// 使用指定配置创建容器
    pub fn with_config(config: ContainerConfig) -> Self {
        Self {
            registry: RwLock::new(Registry::default()),
            config,
            stats: InnerStats::default(),
        }
    }

    /// 容器配置
    pub fn config(&self) -> &ContainerConfig {
        &self.config
    }

    /// 以指定作用域绑定工厂，覆盖已有的配置
    ///
    /// 在默认的 [`RebindPolicy::KeepResolved`] 下不会清除已缓存的单例值，
    /// 之后的 `get` 仍返回旧值，直到 `reset_singleton`、`unbind` 或 `swap`。
    pub fn bind<T, F>(&self, binding: &Binding<T>, factory: F, scope: Scope)
    where
        T: Send + Sync + 'static,
        F: FactoryFunction<T>,
    {
        let config = BindingConfig {
            name: binding.name(),
            factory: factory::erase(factory),
            scope,
        };
        let mut registry = self.registry.write();
        self.insert(&mut registry, binding.key(), config);
    }

    /// 以工厂作用域绑定，每次解析都会调用工厂
    pub fn bind_factory<T, F>(&self, binding: &Binding<T>, factory: F)
    where
        T: Send + Sync + 'static,
        F: FactoryFunction<T>,
    {
        self.bind(binding, factory, Scope::Factory);
    }

    /// 以单例作用域绑定
    pub fn bind_singleton<T, F>(&self, binding: &Binding<T>, factory: F)
    where
        T: Send + Sync + 'static,
        F: FactoryFunction<T>,
    {
        self.bind(binding, factory, Scope::Singleton);
    }

    /// 仅在尚未绑定时绑定，返回是否实际注册
    pub fn bind_once<T, F>(&self, binding: &Binding<T>, factory: F, scope: Scope) -> bool
    where
        T: Send + Sync + 'static,
        F: FactoryFunction<T>,
    {
        let key = binding.key();
        let mut registry = self.registry.write();
        if registry.configs.contains_key(&key) {
            trace!("跳过重复绑定: {}", binding.short_name());
            return false;
        }

        let config = BindingConfig {
            name: binding.name(),
            factory: factory::erase(factory),
            scope,
        };
        self.insert(&mut registry, key, config);
        true
    }

    /// 解析绑定
    pub fn get<T>(&self, binding: &Binding<T>) -> ContainerResult<Arc<T>>
    where
        T: Send + Sync + 'static,
    {
        self.stats.resolutions.fetch_add(1, Ordering::Relaxed);
        let key = binding.key();

        loop {
            let (config, slot) = {
                let registry = self.registry.read();
                let config = registry
                    .configs
                    .get(&key)
                    .cloned()
                    .ok_or_else(|| ContainerError::not_bound(binding.name()))?;
                (config, registry.resolved.get(&key).cloned())
            };

            // 缓存优先于作用域判断，重新绑定后保留的旧单例也会在这里返回
            if let Some(instance) = slot.as_ref().and_then(|slot| slot.get()) {
                trace!("单例缓存命中: {}", binding.short_name());
                self.stats.cache_hits.fetch_add(1, Ordering::Relaxed);
                return downcast(binding, instance.clone());
            }

            if !config.scope.is_cached() {
                return downcast(binding, self.invoke(&config)?);
            }

            // 读锁释放后绑定可能已被替换或移除，旧配置不能再创建缓存槽
            let Some(slot) = self.singleton_slot(key, &config) else {
                trace!("绑定已变更，重新解析: {}", binding.short_name());
                continue;
            };

            let instance = match InitGuard::enter(self, key) {
                Some(_guard) => slot.get_or_try_init(|| self.invoke(&config))?.clone(),
                None => {
                    // 同一线程重入自身的初始化，按未缓存的方式调用工厂
                    trace!("单例初始化重入: {}", binding.short_name());
                    self.invoke(&config)?
                }
            };
            return downcast(binding, instance);
        }
    }

    /// 是否存在绑定配置，与单例是否已解析无关
    pub fn is_bound<T>(&self, binding: &Binding<T>) -> bool {
        self.registry.read().configs.contains_key(&binding.key())
    }

    /// 单例值是否已缓存
    pub fn is_resolved<T>(&self, binding: &Binding<T>) -> bool {
        self.registry.read().is_resolved(&binding.key())
    }

    /// 绑定的作用域
    pub fn scope_of<T>(&self, binding: &Binding<T>) -> Option<Scope> {
        self.registry
            .read()
            .configs
            .get(&binding.key())
            .map(|config| config.scope)
    }

    /// 同时移除绑定配置和已缓存的值，未绑定时什么都不做
    pub fn unbind<T>(&self, binding: &Binding<T>) {
        let key = binding.key();
        let mut registry = self.registry.write();
        if registry.configs.remove(&key).is_some() {
            registry.resolved.remove(&key);
            debug!("解绑: {}", binding.short_name());
        }
    }

    /// 替换已有绑定的工厂，保留原作用域并清除已缓存的值
    pub fn swap<T, F>(&self, binding: &Binding<T>, factory: F) -> ContainerResult<()>
    where
        T: Send + Sync + 'static,
        F: FactoryFunction<T>,
    {
        let key = binding.key();
        let mut registry = self.registry.write();
        let scope = registry
            .configs
            .remove(&key)
            .map(|config| config.scope)
            .ok_or_else(|| ContainerError::not_bound(binding.name()))?;
        registry.resolved.remove(&key);

        registry.configs.insert(
            key,
            BindingConfig {
                name: binding.name(),
                factory: factory::erase(factory),
                scope,
            },
        );
        debug!("替换绑定: {} ({})", binding.short_name(), scope);
        Ok(())
    }

    /// 只清除已缓存的单例值，保留绑定配置
    pub fn reset_singleton<T>(&self, binding: &Binding<T>) {
        if self.registry.write().resolved.remove(&binding.key()).is_some() {
            debug!("重置单例: {}", binding.short_name());
        }
    }

    /// 已注册绑定数量
    pub fn len(&self) -> usize {
        self.registry.read().configs.len()
    }

    /// 是否没有任何绑定
    pub fn is_empty(&self) -> bool {
        self.registry.read().configs.is_empty()
    }

    /// 移除所有绑定和缓存
    pub fn clear(&self) {
        let mut registry = self.registry.write();
        let count = registry.configs.len();
        registry.configs.clear();
        registry.resolved.clear();
        debug!("清空容器，移除 {} 个绑定", count);
    }

    /// 所有已注册绑定的描述，按名称排序
    pub fn bindings(&self) -> Vec<BindingInfo> {
        let registry = self.registry.read();
        let mut infos: Vec<BindingInfo> = registry
            .configs
            .iter()
            .map(|(key, config)| BindingInfo {
                name: config.name,
                scope: config.scope,
                resolved: registry.is_resolved(key),
            })
            .collect();
        infos.sort_by(|a, b| a.name.cmp(b.name));
        infos
    }

    /// 容器统计信息
    pub fn stats(&self) -> ContainerStats {
        let registry = self.registry.read();
        ContainerStats {
            bound: registry.configs.len(),
            resolved_singletons: registry.resolved_count(),
            resolutions: self.stats.resolutions.load(Ordering::Relaxed),
            cache_hits: self.stats.cache_hits.load(Ordering::Relaxed),
            factory_invocations: self.stats.factory_invocations.load(Ordering::Relaxed),
        }
    }

    fn insert(&self, registry: &mut Registry, key: BindingKey, config: BindingConfig) {
        debug!("绑定: {} ({})", config.name, config.scope);
        if registry.configs.insert(key, config).is_some() {
            self.apply_rebind_policy(registry, key);
        }
    }

    /// 覆盖已有绑定后对单例缓存的处理
    fn apply_rebind_policy(&self, registry: &mut Registry, key: BindingKey) {
        if !registry.is_resolved(&key) {
            // 尚未完成的初始化属于旧工厂
            registry.resolved.remove(&key);
            return;
        }
        match self.config.rebind_policy {
            RebindPolicy::KeepResolved => {
                if let Some(config) = registry.configs.get(&key) {
                    warn!("重新绑定 {} 时保留了已解析的单例值", config.name);
                }
            }
            RebindPolicy::ResetResolved => {
                registry.resolved.remove(&key);
            }
        }
    }

    /// 取得单例缓存槽，仅当当前配置仍是 `expected` 时创建
    fn singleton_slot(&self, key: BindingKey, expected: &BindingConfig) -> Option<ResolvedSlot> {
        let mut registry = self.registry.write();
        let current = registry.configs.get(&key)?;
        if !Arc::ptr_eq(&current.factory, &expected.factory) || !current.scope.is_cached() {
            return None;
        }
        let slot = registry
            .resolved
            .entry(key)
            .or_insert_with(|| Arc::new(OnceCell::new()));
        Some(slot.clone())
    }

    fn invoke(&self, config: &BindingConfig) -> ContainerResult<Instance> {
        trace!("调用工厂: {} ({})", config.name, config.scope);
        self.stats.factory_invocations.fetch_add(1, Ordering::Relaxed);

        (config.factory)(self).map_err(|err| match err.downcast::<ContainerError>() {
            Ok(inner) => *inner,
            Err(source) => ContainerError::factory_failed(config.name, source),
        })
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registry = self.registry.read();
        f.debug_struct("Container")
            .field("config", &self.config)
            .field("bound", &registry.configs.len())
            .field("resolved", &registry.resolved_count())
            .finish()
    }
}

thread_local! {
    /// 当前线程正在初始化的单例，按容器地址区分
    static INITIALIZING: RefCell<Vec<(usize, BindingKey)>> = const { RefCell::new(Vec::new()) };
}

/// 单例初始化标记，离开作用域时移除
struct InitGuard {
    entry: (usize, BindingKey),
}

impl InitGuard {
    /// 当前线程已在初始化同一单例时返回 `None`
    fn enter(container: &Container, key: BindingKey) -> Option<Self> {
        let entry = (container as *const Container as usize, key);
        INITIALIZING.with(|initializing| {
            let mut initializing = initializing.borrow_mut();
            if initializing.contains(&entry) {
                return None;
            }
            initializing.push(entry);
            Some(Self { entry })
        })
    }
}

impl Drop for InitGuard {
    fn drop(&mut self) {
        INITIALIZING.with(|initializing| {
            let mut initializing = initializing.borrow_mut();
            if let Some(pos) = initializing.iter().rposition(|entry| *entry == self.entry) {
                initializing.remove(pos);
            }
        });
    }
}

fn downcast<T>(binding: &Binding<T>, instance: Instance) -> ContainerResult<Arc<T>>
where
    T: Send + Sync + 'static,
{
    instance
        .downcast::<T>()
        .map_err(|_| ContainerError::TypeMismatch {
            binding: binding.name().to_string(),
            expected: std::any::type_name::<T>(),
        })
}
