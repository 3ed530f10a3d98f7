//! Morph Engine - 角色 Morph 原型链解析与序列化
//!
//! 提供：
//! - Morph 文档的解析与写出（JSON 存档格式）
//! - 原型链解析（逐层继承、按内部名覆盖）
//! - 文档来源抽象（内存 / 目录）
//! - 宿主侧 Morph 管理与 BlendShape 应用

pub mod document;
pub mod morph;
pub mod resolver;
pub mod source;

pub use document::{MorphDocument, ResolvedDocument, SaveMode};
pub use morph::{apply_morph, BlendShapeTarget, MorphManager, MorphRecord};
pub use resolver::{Resolver, ResolverConfig};
pub use source::{DirectorySource, DocumentSource, MemorySource};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MorphError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Morph document format error: {0}")]
    Format(String),

    #[error("Morph document not found: {0}")]
    NotFound(String),

    #[error("Prototype cycle detected: {}", .0.join(" -> "))]
    Cycle(Vec<String>),

    #[error("Morph index out of range: {0}")]
    InvalidIndex(usize),
}

pub type Result<T> = std::result::Result<T, MorphError>;
