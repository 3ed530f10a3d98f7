//! 文档来源
//!
//! 解析器只通过 [`DocumentSource`] 读取原始字节；标识的格式和相对路径的处理
//! 都由具体来源决定。

mod directory;

pub use directory::DirectorySource;

use std::collections::HashMap;

use crate::document::{to_pretty_json, MorphDocument};
use crate::Result;

/// 文档来源
pub trait DocumentSource {
    /// 读取标识对应的原始字节，不存在时返回 `Ok(None)`
    fn fetch(&self, identifier: &str) -> Result<Option<Vec<u8>>>;
}

impl<S: DocumentSource + ?Sized> DocumentSource for &S {
    fn fetch(&self, identifier: &str) -> Result<Option<Vec<u8>>> {
        (**self).fetch(identifier)
    }
}

/// 内存文档来源
#[derive(Clone, Debug, Default)]
pub struct MemorySource {
    documents: HashMap<String, Vec<u8>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// 写入原始字节
    pub fn insert(&mut self, identifier: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.documents.insert(identifier.into(), bytes.into());
    }

    /// 写入文档（序列化为存档格式）
    pub fn insert_document(&mut self, identifier: impl Into<String>, document: &MorphDocument) -> Result<()> {
        let text = to_pretty_json(document)?;
        self.insert(identifier, text);
        Ok(())
    }

    /// 链式写入文档
    pub fn with_document(mut self, identifier: impl Into<String>, document: &MorphDocument) -> Result<Self> {
        self.insert_document(identifier, document)?;
        Ok(self)
    }

    pub fn remove(&mut self, identifier: &str) -> Option<Vec<u8>> {
        self.documents.remove(identifier)
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.documents.contains_key(identifier)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl DocumentSource for MemorySource {
    fn fetch(&self, identifier: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.documents.get(identifier).cloned())
    }
}
