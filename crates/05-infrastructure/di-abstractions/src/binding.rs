//! 绑定标识定义
//!
//! 绑定是容器中的查找键，携带其解析出的值类型

use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// 类型擦除后的绑定键
///
/// 由值类型的 `TypeId` 与可选标签组成，同一类型可以通过不同标签绑定多次
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BindingKey {
    type_id: TypeId,
    tag: Option<&'static str>,
}

/// 类型化的绑定标识
///
/// `Binding<T>` 解析出 `Arc<T>`。相等性和哈希只取决于 [`BindingKey`]，
/// 名称只用于错误信息和日志。
///
/// ```
/// use di_abstractions::Binding;
///
/// struct HttpClient;
///
/// let a = Binding::<HttpClient>::of();
/// let b = Binding::<HttpClient>::of();
/// assert_eq!(a, b);
/// assert_ne!(a, Binding::<HttpClient>::named("internal"));
/// ```
pub struct Binding<T> {
    key: BindingKey,
    name: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T: 'static> Binding<T> {
    /// 以类型本身作为标识
    pub fn of() -> Self {
        Self {
            key: BindingKey {
                type_id: TypeId::of::<T>(),
                tag: None,
            },
            name: std::any::type_name::<T>(),
            _marker: PhantomData,
        }
    }

    /// 以类型加标签作为标识
    pub fn named(tag: &'static str) -> Self {
        Self {
            key: BindingKey {
                type_id: TypeId::of::<T>(),
                tag: Some(tag),
            },
            name: tag,
            _marker: PhantomData,
        }
    }
}

impl<T> Binding<T> {
    /// 类型擦除后的键
    pub fn key(&self) -> BindingKey {
        self.key
    }

    /// 可读名称：标签，或完整类型名
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// 去掉模块路径的简短名称
    pub fn short_name(&self) -> &'static str {
        if self.key.tag.is_some() {
            return self.name;
        }
        // 泛型参数中也含有 `::`，只截取尖括号之前的部分
        let head = self.name.split('<').next().unwrap_or(self.name);
        match head.rfind("::") {
            Some(pos) => &self.name[pos + 2..],
            None => self.name,
        }
    }
}

impl<T> Clone for Binding<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Binding<T> {}

impl<T> PartialEq for Binding<T> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl<T> Eq for Binding<T> {}

impl<T> Hash for Binding<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl<T> fmt::Debug for Binding<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("name", &self.name)
            .field("tag", &self.key.tag)
            .finish()
    }
}

impl<T> fmt::Display for Binding<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}
