//! 原型链解析配置
//!
//! 所有参数扁平化，`Resolver::new` 读取全局配置的快照。

use once_cell::sync::Lazy;
use std::sync::RwLock;

/// 解析配置（扁平化，不嵌套）
#[derive(Debug, Clone, PartialEq)]
pub struct ResolverConfig {
    // ========== 缺失处理 ==========
    /// 严格模式，默认 false
    /// false：链上任意文档缺失时解析结果降级为空
    /// true：缺失直接返回 NotFound 错误
    pub strict_mode: bool,

    // ========== 合并策略 ==========
    /// 子文档中原型没有的记录是否追加到结果末尾，默认 false（丢弃）
    pub include_unmatched_child_records: bool,

    // ========== 调试 ==========
    /// 是否输出每一层的调试日志，默认 false
    pub debug_log: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            strict_mode: false,
            include_unmatched_child_records: false,
            debug_log: false,
        }
    }
}

/// 全局配置实例
static RESOLVER_CONFIG: Lazy<RwLock<ResolverConfig>> =
    Lazy::new(|| RwLock::new(ResolverConfig::default()));

/// 获取当前配置（只读）
pub fn get_config() -> ResolverConfig {
    match RESOLVER_CONFIG.read() {
        Ok(config) => config.clone(),
        Err(poisoned) => poisoned.into_inner().clone(),
    }
}

/// 手动设置配置
pub fn set_config(config: ResolverConfig) {
    match RESOLVER_CONFIG.write() {
        Ok(mut guard) => *guard = config,
        Err(poisoned) => *poisoned.into_inner() = config,
    }
}

/// 重置为默认配置
pub fn reset_config() {
    set_config(ResolverConfig::default());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ResolverConfig::default();
        assert!(!config.strict_mode);
        assert!(!config.include_unmatched_child_records);
        assert!(!config.debug_log);
    }
}
