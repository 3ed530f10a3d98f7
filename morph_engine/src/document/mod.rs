//! Morph 文档
//!
//! 一个文档 = 名称 + 可选原型引用 + 有序的 Morph 记录。

mod file;

pub use file::{load_document, parse_document, write_document};
pub(crate) use file::to_pretty_json;

use serde::{Deserialize, Serialize};

use crate::morph::MorphRecord;

/// 保存模式
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SaveMode {
    /// 不引用原型，独立包含全部数据
    Absolute,
    /// 原型指向当前文档自身的存档标识
    Derivative,
    /// 原型指向当前原型链的根原型
    Sibling,
}

impl std::str::FromStr for SaveMode {
    type Err = crate::MorphError;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "absolute" => Ok(SaveMode::Absolute),
            "derivative" => Ok(SaveMode::Derivative),
            "sibling" => Ok(SaveMode::Sibling),
            other => Err(crate::MorphError::Format(format!("Unknown save mode: {}", other))),
        }
    }
}

/// Morph 文档
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MorphDocument {
    #[serde(default, alias = "Name", deserialize_with = "crate::morph::nullable")]
    pub name: String,

    /// 原型文档标识，空字符串表示无原型
    #[serde(default, alias = "Prototype", deserialize_with = "crate::morph::nullable")]
    pub prototype: String,

    #[serde(default, alias = "Morphs", deserialize_with = "crate::morph::nullable")]
    pub morphs: Vec<MorphRecord>,
}

impl MorphDocument {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            prototype: String::new(),
            morphs: Vec::new(),
        }
    }

    /// 设置原型
    pub fn with_prototype(mut self, prototype: impl Into<String>) -> Self {
        self.prototype = prototype.into();
        self
    }

    /// 追加记录
    pub fn with_morph(mut self, morph: MorphRecord) -> Self {
        self.morphs.push(morph);
        self
    }

    /// 是否声明了原型
    pub fn has_prototype(&self) -> bool {
        !self.prototype.is_empty()
    }

    /// 通过内部名查找记录
    pub fn find_morph(&self, key: &str) -> Option<&MorphRecord> {
        self.morphs.iter().find(|m| m.key == key)
    }

    pub fn morph_count(&self) -> usize {
        self.morphs.len()
    }
}

/// 原型链解析结果
///
/// `document` 已完全展开且不带原型；`chain` 记录解析经过的文档标识，
/// 叶子在前、根原型在后。解析降级为空时 `chain` 只含解析起点。
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResolvedDocument {
    pub document: MorphDocument,
    pub chain: Vec<String>,
}

impl ResolvedDocument {
    /// 降级用的空结果，保留解析起点以便派生保存
    pub fn degraded(identifier: &str) -> Self {
        Self {
            document: MorphDocument::default(),
            chain: vec![identifier.to_string()],
        }
    }

    /// 解析起点（文档自身的存档标识）
    pub fn source_id(&self) -> Option<&str> {
        self.chain.first().map(String::as_str)
    }

    /// 根原型标识；文档本身无原型时为 None
    pub fn root_prototype(&self) -> Option<&str> {
        if self.chain.len() > 1 {
            self.chain.last().map(String::as_str)
        } else {
            None
        }
    }

    /// 直接父原型标识
    pub fn parent_prototype(&self) -> Option<&str> {
        self.chain.get(1).map(String::as_str)
    }

    /// 指定保存模式下写出的原型引用
    pub fn prototype_for(&self, mode: SaveMode) -> String {
        let prototype = match mode {
            SaveMode::Absolute => None,
            SaveMode::Derivative => self.source_id(),
            SaveMode::Sibling => self.root_prototype(),
        };
        prototype.unwrap_or_default().to_string()
    }

    pub fn is_empty(&self) -> bool {
        self.document.morphs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolved(chain: &[&str]) -> ResolvedDocument {
        ResolvedDocument {
            document: MorphDocument::new("head"),
            chain: chain.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_prototype_for_modes() {
        let r = resolved(&["heads/alice", "heads/base_female", "heads/base"]);
        assert_eq!(r.prototype_for(SaveMode::Absolute), "");
        assert_eq!(r.prototype_for(SaveMode::Derivative), "heads/alice");
        assert_eq!(r.prototype_for(SaveMode::Sibling), "heads/base");
        assert_eq!(r.parent_prototype(), Some("heads/base_female"));
    }

    #[test]
    fn test_sibling_of_self_contained_document() {
        let r = resolved(&["heads/base"]);
        assert_eq!(r.prototype_for(SaveMode::Sibling), "");
        assert_eq!(r.prototype_for(SaveMode::Derivative), "heads/base");
    }

    #[test]
    fn test_save_mode_from_str() {
        assert_eq!("Sibling".parse::<SaveMode>().unwrap(), SaveMode::Sibling);
        assert!("relative".parse::<SaveMode>().is_err());
    }
}
