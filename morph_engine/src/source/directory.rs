//! 目录文档来源
//!
//! 标识是相对根目录、不带扩展名的路径，`heads/base` 对应 `<root>/heads/base.json`。

use std::fs;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use crate::{MorphError, Result};

use super::DocumentSource;

/// 默认文档扩展名
pub const DEFAULT_EXTENSION: &str = "json";

/// 目录文档来源
#[derive(Clone, Debug)]
pub struct DirectorySource {
    root: PathBuf,
    extension: String,
}

impl DirectorySource {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            extension: DEFAULT_EXTENSION.to_string(),
        }
    }

    /// 修改文档扩展名（不含点）
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// 标识对应的文件路径
    ///
    /// 只接受相对路径的普通段，`..` 和绝对路径不允许跳出根目录。
    pub fn path_for(&self, identifier: &str) -> Result<PathBuf> {
        let relative = Path::new(identifier);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if identifier.is_empty() || escapes {
            return Err(MorphError::Format(format!(
                "Invalid document identifier: {}",
                identifier
            )));
        }

        let mut path = self.root.join(relative);
        if !self.extension.is_empty() {
            let file_name = match path.file_name() {
                Some(name) => format!("{}.{}", name.to_string_lossy(), self.extension),
                None => {
                    return Err(MorphError::Format(format!(
                        "Invalid document identifier: {}",
                        identifier
                    )))
                }
            };
            path.set_file_name(file_name);
        }
        Ok(path)
    }

    /// 写入文档文本，自动创建中间目录
    pub fn store(&self, identifier: &str, contents: &str) -> Result<PathBuf> {
        let path = self.path_for(identifier)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, contents)?;
        Ok(path)
    }
}

impl DocumentSource for DirectorySource {
    fn fetch(&self, identifier: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path_for(identifier)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(MorphError::Io(e)),
        }
    }
}
