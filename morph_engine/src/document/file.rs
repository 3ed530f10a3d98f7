//! Morph 文档文件解析与写出
//!
//! 存档格式为缩进 JSON：
//!
//! ```text
//! {
//!   "name": "...",
//!   "prototype": "...",
//!   "morphs": [ { "Name", "NameInternal", "Category", "HasNegativeValues", "Value" } ]
//! }
//! ```

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::{MorphError, Result};

use super::{MorphDocument, ResolvedDocument, SaveMode};

/// 解析 Morph 文档
///
/// 结构不合法（非 JSON 对象、字段类型错误、缺少内部名、内部名重复）时返回
/// [`MorphError::Format`]；缺失的可选字段按空值处理。
pub fn parse_document(bytes: &[u8]) -> Result<MorphDocument> {
    let value: serde_json::Value = serde_json::from_slice(bytes)
        .map_err(|e| MorphError::Format(format!("Invalid JSON: {}", e)))?;

    // 数组形式也能反序列化为结构体，这里只接受对象
    if !value.is_object() {
        return Err(MorphError::Format("Document root must be an object".to_string()));
    }

    let document: MorphDocument = serde_json::from_value(value)
        .map_err(|e| MorphError::Format(format!("Invalid document: {}", e)))?;

    validate_keys(&document)?;
    Ok(document)
}

/// 从文件加载 Morph 文档
pub fn load_document<P: AsRef<Path>>(path: P) -> Result<MorphDocument> {
    let bytes = fs::read(path).map_err(MorphError::Io)?;
    parse_document(&bytes)
}

/// 按保存模式写出已解析的文档
///
/// 三种模式都会写出完整的记录集，只有原型引用不同。
pub fn write_document(resolved: &ResolvedDocument, mode: SaveMode) -> Result<String> {
    let document = MorphDocument {
        name: resolved.document.name.clone(),
        prototype: resolved.prototype_for(mode),
        morphs: resolved.document.morphs.clone(),
    };
    to_pretty_json(&document)
}

/// 文档写为缩进 JSON，字段顺序固定
pub(crate) fn to_pretty_json(document: &MorphDocument) -> Result<String> {
    serde_json::to_string_pretty(document)
        .map_err(|e| MorphError::Format(format!("Failed to write document: {}", e)))
}

/// 校验内部名非空且唯一
fn validate_keys(document: &MorphDocument) -> Result<()> {
    let mut seen = HashSet::with_capacity(document.morphs.len());
    for (index, morph) in document.morphs.iter().enumerate() {
        if morph.key.is_empty() {
            return Err(MorphError::Format(format!(
                "Morph #{} has an empty NameInternal",
                index
            )));
        }
        if !seen.insert(morph.key.as_str()) {
            return Err(MorphError::Format(format!(
                "Duplicate NameInternal: {}",
                morph.key
            )));
        }
    }
    Ok(())
}
