//! 错误类型定义

use std::path::PathBuf;
use thiserror::Error;

/// 工厂函数可以返回的任意错误
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// 依赖注入容器错误类型
#[derive(Error, Debug)]
pub enum ContainerError {
    #[error("绑定未注册: {binding}，是否忘记在容器中绑定它？")]
    NotBound { binding: String },

    #[error("工厂创建失败: {binding}, 原因: {source}")]
    FactoryFailed {
        binding: String,
        #[source]
        source: BoxError,
    },

    #[error("类型转换失败: {binding}, 期望类型 {expected}")]
    TypeMismatch {
        binding: String,
        expected: &'static str,
    },
}

impl ContainerError {
    /// 创建绑定未注册错误
    pub fn not_bound(binding: impl Into<String>) -> Self {
        Self::NotBound {
            binding: binding.into(),
        }
    }

    /// 创建工厂失败错误
    pub fn factory_failed(binding: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::FactoryFailed {
            binding: binding.into(),
            source: source.into(),
        }
    }

    /// 出错的绑定名称
    pub fn binding(&self) -> &str {
        match self {
            Self::NotBound { binding }
            | Self::FactoryFailed { binding, .. }
            | Self::TypeMismatch { binding, .. } => binding,
        }
    }

    /// 是否为绑定未注册错误
    pub fn is_not_bound(&self) -> bool {
        matches!(self, Self::NotBound { .. })
    }
}

/// 配置错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置文件读取失败: {path}, 原因: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("配置解析失败: {source}")]
    Parse {
        #[from]
        source: toml::de::Error,
    },
}

/// 结果类型别名
pub type ContainerResult<T> = Result<T, ContainerError>;
pub type ConfigResult<T> = Result<T, ConfigError>;
