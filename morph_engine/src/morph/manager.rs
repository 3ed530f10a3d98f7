//! Morph 管理器
//!
//! 宿主持有的已解析 Morph 集合：修改数值、随机化、应用到渲染层、保存。

use std::collections::HashMap;

use rand::Rng;

use crate::document::{write_document, MorphDocument, ResolvedDocument, SaveMode};
use crate::resolver::Resolver;
use crate::source::DocumentSource;
use crate::{MorphError, Result};

use super::{apply_morph, BlendShapeTarget, MorphRecord};

/// 随机化时跳过的内部名前缀
pub const RANDOMIZE_SKIP_PREFIX: &str = "hairline";

/// Morph 管理器
#[derive(Clone, Debug, Default)]
pub struct MorphManager {
    name: String,
    morphs: Vec<MorphRecord>,
    key_to_index: HashMap<String, usize>,
    /// 解析经过的原型链，叶子（即文档自身的存档标识）在前
    chain: Vec<String>,
    modified: bool,
}

impl MorphManager {
    /// 新建空 Morph 集合
    pub fn new() -> Self {
        Self::default()
    }

    /// 从解析结果创建，超出范围的值在载入时钳制
    pub fn from_resolved(resolved: ResolvedDocument) -> Self {
        let ResolvedDocument { document, chain } = resolved;
        let morphs: Vec<MorphRecord> = document.morphs.iter().map(|m| m.with_value(m.value)).collect();
        let key_to_index = morphs
            .iter()
            .enumerate()
            .map(|(i, m)| (m.key.clone(), i))
            .collect();
        Self {
            name: document.name,
            morphs,
            key_to_index,
            chain,
            modified: false,
        }
    }

    /// 解析标识对应的文档并载入
    pub fn load<S: DocumentSource>(resolver: &Resolver<S>, identifier: &str) -> Result<Self> {
        let resolved = resolver.resolve(identifier)?;
        if resolved.is_empty() {
            log::warn!("Morph 集合为空: {}", identifier);
        }
        Ok(Self::from_resolved(resolved))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.modified = true;
    }

    /// 存档标识
    pub fn data_path(&self) -> Option<&str> {
        self.chain.first().map(String::as_str)
    }

    /// 通过内部名查找 Morph
    pub fn find_morph_by_key(&self, key: &str) -> Option<usize> {
        self.key_to_index.get(key).copied()
    }

    /// 获取 Morph 数量
    pub fn morph_count(&self) -> usize {
        self.morphs.len()
    }

    /// 获取 Morph
    pub fn get_morph(&self, index: usize) -> Option<&MorphRecord> {
        self.morphs.get(index)
    }

    /// 获取 Morph 值
    pub fn get_value(&self, index: usize) -> Option<f64> {
        self.morphs.get(index).map(|m| m.value)
    }

    pub fn records(&self) -> &[MorphRecord] {
        &self.morphs
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// 设置 Morph 值，超出范围时钳制，返回实际写入的值
    pub fn set_value(&mut self, index: usize, value: f64) -> Result<f64> {
        let updated = self
            .morphs
            .get(index)
            .ok_or(MorphError::InvalidIndex(index))?
            .with_value(value);
        let effective = updated.value;
        self.morphs[index] = updated;
        self.modified = true;
        Ok(effective)
    }

    /// 设置 Morph 值并立即应用到渲染目标
    pub fn set_value_and_apply(
        &mut self,
        index: usize,
        value: f64,
        target: &mut dyn BlendShapeTarget,
    ) -> Result<f64> {
        let effective = self.set_value(index, value)?;
        let morph = &self.morphs[index];
        apply_morph(target, &morph.key, morph.signed, effective);
        Ok(effective)
    }

    /// 随机化所有 Morph（发际线相关的除外）
    pub fn randomize<R: Rng>(&mut self, rng: &mut R) {
        for index in 0..self.morphs.len() {
            let morph = &self.morphs[index];
            if morph.key.starts_with(RANDOMIZE_SKIP_PREFIX) {
                continue;
            }
            let value = rng.random_range(morph.min_value()..=1.0);
            self.morphs[index] = morph.with_value(value);
        }
        self.modified = true;
    }

    /// 应用所有 Morph 到渲染目标
    pub fn apply_all(&self, target: &mut dyn BlendShapeTarget) {
        for morph in &self.morphs {
            apply_morph(target, &morph.key, morph.signed, morph.value);
        }
    }

    /// 当前数据的快照，可直接交给 [`write_document`]
    pub fn snapshot(&self) -> ResolvedDocument {
        ResolvedDocument {
            document: MorphDocument {
                name: self.name.clone(),
                prototype: String::new(),
                morphs: self.morphs.clone(),
            },
            chain: self.chain.clone(),
        }
    }

    /// 按保存模式写出并清除修改标记
    pub fn write(&mut self, mode: SaveMode) -> Result<String> {
        let text = write_document(&self.snapshot(), mode)?;
        self.modified = false;
        Ok(text)
    }

    /// 按保存模式写出差异文档并清除修改标记
    pub fn write_delta<S: DocumentSource>(&mut self, resolver: &Resolver<S>, mode: SaveMode) -> Result<String> {
        let text = resolver.write_delta(&self.snapshot(), mode)?;
        self.modified = false;
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::document::parse_document;
    use crate::morph::test_support::RecordingTarget;
    use crate::resolver::ResolverConfig;
    use crate::source::MemorySource;

    fn sample_resolver() -> Resolver<MemorySource> {
        let base = MorphDocument::new("Base")
            .with_morph(MorphRecord::new("jaw", false, 0.2))
            .with_morph(MorphRecord::new("brow", true, -0.5))
            .with_morph(MorphRecord::new("hairline_height", false, 0.3));
        let alice = MorphDocument::new("Alice")
            .with_prototype("heads/base")
            .with_morph(MorphRecord::new("jaw", false, 0.6));
        let source = MemorySource::new()
            .with_document("heads/base", &base)
            .unwrap()
            .with_document("heads/alice", &alice)
            .unwrap();
        Resolver::with_config(source, ResolverConfig::default())
    }

    #[test]
    fn test_load_and_lookup() {
        let manager = MorphManager::load(&sample_resolver(), "heads/alice").unwrap();
        assert_eq!(manager.name(), "Alice");
        assert_eq!(manager.morph_count(), 3);
        assert_eq!(manager.data_path(), Some("heads/alice"));

        let jaw = manager.find_morph_by_key("jaw").unwrap();
        assert_eq!(manager.get_value(jaw), Some(0.6));
        assert!(manager.find_morph_by_key("missing").is_none());
        assert!(!manager.is_modified());
    }

    #[test]
    fn test_set_value_clamps_and_marks_modified() {
        let mut manager = MorphManager::load(&sample_resolver(), "heads/alice").unwrap();
        let jaw = manager.find_morph_by_key("jaw").unwrap();

        assert_eq!(manager.set_value(jaw, 1.5).unwrap(), 1.0);
        assert_eq!(manager.get_value(jaw), Some(1.0));
        assert!(manager.is_modified());

        let brow = manager.find_morph_by_key("brow").unwrap();
        assert_eq!(manager.set_value(brow, -3.0).unwrap(), -1.0);

        assert!(matches!(manager.set_value(99, 0.5), Err(MorphError::InvalidIndex(99))));
    }

    #[test]
    fn test_set_value_and_apply() {
        let mut manager = MorphManager::load(&sample_resolver(), "heads/alice").unwrap();
        let mut target = RecordingTarget::with_channels(&["brow_pos", "brow_neg"]);
        let brow = manager.find_morph_by_key("brow").unwrap();

        manager.set_value_and_apply(brow, 0.4, &mut target).unwrap();
        assert_eq!(target.weights["brow_pos"], 40.0);
    }

    #[test]
    fn test_randomize_respects_ranges_and_skips_hairline() {
        let mut manager = MorphManager::load(&sample_resolver(), "heads/alice").unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        manager.randomize(&mut rng);

        let hairline = manager.find_morph_by_key("hairline_height").unwrap();
        assert_eq!(manager.get_value(hairline), Some(0.3));

        for morph in manager.records() {
            assert!(morph.value >= morph.min_value() && morph.value <= 1.0);
        }
        assert!(manager.is_modified());
    }

    #[test]
    fn test_apply_all() {
        let manager = MorphManager::load(&sample_resolver(), "heads/alice").unwrap();
        let mut target = RecordingTarget::with_channels(&["jaw", "brow_neg", "hairline_height"]);
        manager.apply_all(&mut target);

        assert!((target.weights["jaw"] - 60.0).abs() < 1e-4);
        assert!((target.weights["brow_neg"] - 50.0).abs() < 1e-4);
        assert!((target.weights["hairline_height"] - 30.0).abs() < 1e-4);
    }

    #[test]
    fn test_edits_do_not_leak_into_resolution() {
        let resolver = sample_resolver();
        let mut manager = MorphManager::load(&resolver, "heads/alice").unwrap();
        manager.set_value(0, 0.0).unwrap();

        let fresh = resolver.resolve("heads/alice").unwrap();
        assert_eq!(fresh.document.morphs[0].value, 0.6);
    }

    #[test]
    fn test_write_modes() {
        let mut manager = MorphManager::load(&sample_resolver(), "heads/alice").unwrap();
        manager.set_value(0, 0.75).unwrap();

        let derivative = parse_document(manager.write(SaveMode::Derivative).unwrap().as_bytes()).unwrap();
        assert_eq!(derivative.prototype, "heads/alice");
        assert_eq!(derivative.morphs.len(), 3);
        assert!(!manager.is_modified());

        let sibling = parse_document(manager.write(SaveMode::Sibling).unwrap().as_bytes()).unwrap();
        assert_eq!(sibling.prototype, "heads/base");

        let absolute = parse_document(manager.write(SaveMode::Absolute).unwrap().as_bytes()).unwrap();
        assert_eq!(absolute.prototype, "");
        assert_eq!(absolute.morphs[0].value, 0.75);
    }

    #[test]
    fn test_write_delta() {
        let resolver = sample_resolver();
        let mut manager = MorphManager::load(&resolver, "heads/alice").unwrap();
        manager.set_value(0, 0.75).unwrap();

        let delta = parse_document(manager.write_delta(&resolver, SaveMode::Derivative).unwrap().as_bytes())
            .unwrap();
        assert_eq!(delta.morphs.len(), 1);
        assert_eq!(delta.morphs[0].key, "jaw");
    }

    #[test]
    fn test_missing_document_loads_empty_but_keeps_path() {
        let manager = MorphManager::load(&sample_resolver(), "heads/nobody").unwrap();
        assert_eq!(manager.morph_count(), 0);
        assert_eq!(manager.data_path(), Some("heads/nobody"));
    }

    #[test]
    fn test_out_of_range_values_are_clamped_on_load() {
        let source = MemorySource::new().with_document(
            "heads/wild",
            &MorphDocument::new("Wild")
                .with_morph(MorphRecord::new("jaw", false, 5.0))
                .with_morph(MorphRecord::new("brow", true, -2.5))
                .with_morph(MorphRecord::new("lip", false, -0.5)),
        )
        .unwrap();
        let mut manager =
            MorphManager::load(&Resolver::with_config(source, ResolverConfig::default()), "heads/wild")
                .unwrap();

        assert_eq!(manager.get_value(0), Some(1.0));
        assert_eq!(manager.get_value(1), Some(-1.0));
        assert_eq!(manager.get_value(2), Some(0.0));

        let written = parse_document(manager.write(SaveMode::Absolute).unwrap().as_bytes()).unwrap();
        let values: Vec<f64> = written.morphs.iter().map(|m| m.value).collect();
        assert_eq!(values, vec![1.0, -1.0, 0.0]);
    }

    #[test]
    fn test_new_is_empty() {
        let mut manager = MorphManager::new();
        assert_eq!(manager.morph_count(), 0);
        manager.set_name("Fresh");
        let doc = parse_document(manager.write(SaveMode::Absolute).unwrap().as_bytes()).unwrap();
        assert_eq!(doc.name, "Fresh");
        assert!(doc.morphs.is_empty());
    }
}
