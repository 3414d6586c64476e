//! 绑定生命周期（作用域）

use serde::{Deserialize, Serialize};
use std::fmt;

/// 绑定的缓存策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    /// 工厂模式 - 每次解析都调用工厂，从不缓存
    Factory,
    /// 单例模式 - 首次解析后缓存，直到重置或解绑
    Singleton,
}

impl Scope {
    /// 是否缓存解析结果
    pub fn is_cached(self) -> bool {
        matches!(self, Self::Singleton)
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Factory => f.write_str("Factory"),
            Self::Singleton => f.write_str("Singleton"),
        }
    }
}
