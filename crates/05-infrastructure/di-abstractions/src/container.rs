//! 容器配置与统计信息
//!
//! 容器实现共享的配置和只读视图类型

use crate::errors::{ConfigError, ConfigResult};
use crate::lifecycle::Scope;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 重新绑定已解析单例时的处理策略
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RebindPolicy {
    /// 保留已缓存的单例值，新工厂在重置或解绑前不会生效
    #[default]
    KeepResolved,
    /// 重新绑定时同时清除缓存的单例值
    ResetResolved,
}

/// 容器配置
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ContainerConfig {
    /// 重新绑定策略
    pub rebind_policy: RebindPolicy,
}

impl ContainerConfig {
    /// 从 TOML 文本解析配置
    ///
    /// ```
    /// use di_abstractions::{ContainerConfig, RebindPolicy};
    ///
    /// let config = ContainerConfig::from_toml_str("rebind_policy = \"reset_resolved\"").unwrap();
    /// assert_eq!(config.rebind_policy, RebindPolicy::ResetResolved);
    /// ```
    pub fn from_toml_str(source: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(source)?)
    }

    /// 从 TOML 文件加载配置
    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!("加载容器配置: {}", path.display());
        Self::from_toml_str(&source)
    }

    /// 设置重新绑定策略
    pub fn with_rebind_policy(mut self, policy: RebindPolicy) -> Self {
        self.rebind_policy = policy;
        self
    }
}

/// 已注册绑定的描述
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingInfo {
    /// 绑定名称
    pub name: &'static str,
    /// 作用域
    pub scope: Scope,
    /// 是否已缓存单例值
    pub resolved: bool,
}

/// 容器统计信息
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContainerStats {
    /// 已注册绑定数量
    pub bound: usize,
    /// 已缓存的单例数量
    pub resolved_singletons: usize,
    /// 解析总次数（含失败）
    pub resolutions: u64,
    /// 单例缓存命中次数
    pub cache_hits: u64,
    /// 工厂调用次数
    pub factory_invocations: u64,
}

impl ContainerStats {
    /// 缓存命中率（小数形式）
    pub fn hit_rate(&self) -> f64 {
        if self.resolutions == 0 {
            0.0
        } else {
            self.cache_hits as f64 / self.resolutions as f64
        }
    }
}
