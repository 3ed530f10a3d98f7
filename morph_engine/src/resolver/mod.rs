//! 原型链解析
//!
//! 从叶子文档出发沿 `prototype` 逐层读取，直到遇到没有原型的根文档，
//! 然后从根开始逐层向下合并：
//! - 记录顺序始终沿用根文档的声明顺序
//! - 子层按内部名匹配父层记录，匹配到的记录除内部名外全部由子层覆盖
//! - 子层没有声明的记录原样继承
//!
//! 链上任意一层缺失时整条链降级为空结果（严格模式下返回错误）；
//! 同一标识在链上出现两次视为循环引用。

mod config;

pub use config::{get_config, reset_config, set_config, ResolverConfig};

use std::collections::{HashMap, HashSet};

use crate::document::{parse_document, to_pretty_json, write_document};
use crate::document::{MorphDocument, ResolvedDocument, SaveMode};
use crate::morph::MorphRecord;
use crate::source::DocumentSource;
use crate::{MorphError, Result};

/// 原型链上的一层：标识 + 解析出的原始文档
type ChainLevel = (String, MorphDocument);

/// 原型链解析器
pub struct Resolver<S> {
    source: S,
    config: ResolverConfig,
}

impl<S: DocumentSource> Resolver<S> {
    /// 使用全局配置创建解析器
    pub fn new(source: S) -> Self {
        Self::with_config(source, get_config())
    }

    pub fn with_config(source: S, config: ResolverConfig) -> Self {
        Self { source, config }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// 解析标识对应的文档，返回完全展开的结果
    pub fn resolve(&self, identifier: &str) -> Result<ResolvedDocument> {
        let levels = match self.load_chain(identifier)? {
            Some(levels) => levels,
            None => return Ok(ResolvedDocument::degraded(identifier)),
        };

        let chain: Vec<String> = levels.iter().map(|(id, _)| id.clone()).collect();

        // 从根开始向叶子合并
        let mut levels = levels.into_iter().rev();
        let mut document = match levels.next() {
            Some((_, root)) => root,
            None => return Ok(ResolvedDocument::degraded(identifier)),
        };
        for (id, child) in levels {
            if self.config.debug_log {
                log::debug!("合并原型层: {} ({} 个 Morph)", id, child.morphs.len());
            }
            document = merge_level(document, &child, self.config.include_unmatched_child_records);
        }
        document.prototype.clear();

        log::info!(
            "原型链解析完成: {} ({} 层, {} 个 Morph)",
            identifier,
            chain.len(),
            document.morphs.len()
        );

        Ok(ResolvedDocument { document, chain })
    }

    /// 按保存模式写出，派生/兄弟模式只保留与目标原型不同的记录
    ///
    /// 与 [`write_document`] 不同，这里会重新解析目标原型来计算差异。
    /// 目标原型无法解析（缺失或文档本身无原型）时写出完整记录集。
    pub fn write_delta(&self, resolved: &ResolvedDocument, mode: SaveMode) -> Result<String> {
        let base_id = match mode {
            SaveMode::Absolute => None,
            SaveMode::Derivative => resolved.source_id(),
            SaveMode::Sibling => resolved.root_prototype(),
        };
        let base_id = match base_id {
            Some(id) => id,
            None => return write_document(resolved, mode),
        };

        let base = self.resolve(base_id)?;
        if base.is_empty() {
            log::warn!("差异保存的目标原型为空，改为写出完整记录: {}", base_id);
            return write_document(resolved, mode);
        }

        let morphs: Vec<MorphRecord> = resolved
            .document
            .morphs
            .iter()
            .filter(|m| match base.document.find_morph(&m.key) {
                Some(original) => m.differs_from(original),
                None => true,
            })
            .cloned()
            .collect();

        to_pretty_json(&MorphDocument {
            name: resolved.document.name.clone(),
            prototype: base_id.to_string(),
            morphs,
        })
    }

    /// 读取整条原型链（叶子在前）
    ///
    /// 链上任意一层缺失时返回 `Ok(None)`（严格模式下返回 NotFound）。
    fn load_chain(&self, identifier: &str) -> Result<Option<Vec<ChainLevel>>> {
        let mut visited: HashSet<String> = HashSet::new();
        let mut levels: Vec<ChainLevel> = Vec::new();
        let mut current = identifier.to_string();

        loop {
            if visited.contains(&current) {
                let mut cycle: Vec<String> = levels.into_iter().map(|(id, _)| id).collect();
                cycle.push(current);
                return Err(MorphError::Cycle(cycle));
            }
            let bytes = match self.source.fetch(&current)? {
                Some(bytes) => bytes,
                None => return self.missing(identifier, &current),
            };
            let document = parse_document(&bytes)?;

            if self.config.debug_log {
                log::debug!(
                    "读取原型层: {} -> {:?} ({} 个 Morph)",
                    current,
                    document.prototype,
                    document.morphs.len()
                );
            }

            let parent = document.prototype.clone();
            visited.insert(current.clone());
            levels.push((current, document));

            if parent.is_empty() {
                return Ok(Some(levels));
            }
            current = parent;
        }
    }

    /// 文档缺失时的处理
    fn missing(&self, identifier: &str, missing: &str) -> Result<Option<Vec<ChainLevel>>> {
        if self.config.strict_mode {
            return Err(MorphError::NotFound(missing.to_string()));
        }
        if identifier == missing {
            log::warn!("找不到 Morph 文档，解析结果为空: {}", identifier);
        } else {
            log::warn!(
                "找不到原型文档 {}，{} 的解析结果为空",
                missing,
                identifier
            );
        }
        Ok(None)
    }
}

/// 将子层合并到已展开的父层上
fn merge_level(parent: MorphDocument, child: &MorphDocument, include_unmatched: bool) -> MorphDocument {
    let child_index: HashMap<&str, &MorphRecord> =
        child.morphs.iter().map(|m| (m.key.as_str(), m)).collect();

    let mut morphs: Vec<MorphRecord> = Vec::with_capacity(parent.morphs.len());
    for inherited in &parent.morphs {
        match child_index.get(inherited.key.as_str()) {
            Some(own) => morphs.push(own.overlay_onto(inherited)),
            None => morphs.push(inherited.clone()),
        }
    }

    let parent_keys: HashSet<&str> = parent.morphs.iter().map(|m| m.key.as_str()).collect();
    let mut unmatched = child
        .morphs
        .iter()
        .filter(|m| !parent_keys.contains(m.key.as_str()))
        .peekable();
    if include_unmatched {
        morphs.extend(unmatched.cloned());
    } else if unmatched.peek().is_some() {
        log::debug!("丢弃 {} 个原型中不存在的 Morph", unmatched.count());
    }

    let name = if child.name.is_empty() {
        parent.name
    } else {
        child.name.clone()
    };

    MorphDocument {
        name,
        prototype: String::new(),
        morphs,
    }
}
