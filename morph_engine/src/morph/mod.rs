//! Morph 变形系统
//!
//! 记录本身只是纯数据；写入渲染层由宿主实现的 [`BlendShapeTarget`] 完成。

mod morph;
mod manager;

pub use morph::MorphRecord;
pub(crate) use morph::nullable;
pub use manager::MorphManager;

/// 正向通道后缀（带符号 Morph）
pub const POSITIVE_SUFFIX: &str = "_pos";
/// 负向通道后缀（带符号 Morph）
pub const NEGATIVE_SUFFIX: &str = "_neg";
/// Morph 值到 BlendShape 权重的缩放
pub const BLEND_SHAPE_SCALE: f32 = 100.0;

/// BlendShape 写入目标（由宿主的渲染层实现）
pub trait BlendShapeTarget {
    /// 设置指定名称通道的权重，通道不存在时返回 false
    fn set_blend_shape_weight(&mut self, shape_name: &str, weight: f32) -> bool;
}

/// 计算 Morph 值对应的 BlendShape 通道名
///
/// 无符号 Morph 直接使用内部名；带符号 Morph 根据值的正负拆分为
/// `_pos` / `_neg` 两个通道，0 归入负向通道。
pub fn channel_name(key: &str, signed: bool, value: f64) -> String {
    if !signed {
        return key.to_string();
    }
    if value > 0.0 {
        format!("{}{}", key, POSITIVE_SUFFIX)
    } else {
        format!("{}{}", key, NEGATIVE_SUFFIX)
    }
}

/// 将单个 Morph 值应用到渲染目标
///
/// 返回钳制后的实际值。
pub fn apply_morph(target: &mut dyn BlendShapeTarget, key: &str, signed: bool, value: f64) -> f64 {
    let min = if signed { -1.0 } else { 0.0 };
    let value = if value.is_nan() { 0.0 } else { value.clamp(min, 1.0) };

    let shape = channel_name(key, signed, value);
    let weight = value.abs() as f32 * BLEND_SHAPE_SCALE;
    if !target.set_blend_shape_weight(&shape, weight) {
        log::debug!("BlendShape 通道不存在: {}", shape);
    }
    value
}
