//! Morph 记录定义

use serde::{Deserialize, Deserializer, Serialize};

/// 反序列化时将 `null` 视为默认值（旧工具会写出 `"Name": null`）
pub(crate) fn nullable<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Morph 记录
///
/// 字段名与存档格式保持一致（`Name` / `NameInternal` / ...），
/// 内部统一使用 `key` 作为跨层级匹配的身份标识。
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MorphRecord {
    /// 显示名称，可为空
    #[serde(rename = "Name", default, deserialize_with = "nullable")]
    pub display_name: String,

    /// 内部名称，同一文档内唯一
    #[serde(rename = "NameInternal")]
    pub key: String,

    #[serde(rename = "Category", default, deserialize_with = "nullable")]
    pub category: String,

    /// 是否允许负值（[-1, 1]），否则为 [0, 1]
    #[serde(rename = "HasNegativeValues", default, deserialize_with = "nullable")]
    pub signed: bool,

    #[serde(rename = "Value", default, deserialize_with = "nullable")]
    pub value: f64,
}

impl MorphRecord {
    pub fn new(key: impl Into<String>, signed: bool, value: f64) -> Self {
        Self {
            display_name: String::new(),
            key: key.into(),
            category: String::new(),
            signed,
            value,
        }
    }

    /// 设置显示名称
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = name.into();
        self
    }

    /// 设置分类
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// 取值下限
    pub fn min_value(&self) -> f64 {
        if self.signed {
            -1.0
        } else {
            0.0
        }
    }

    /// 将任意值钳制到该记录的合法范围
    pub fn clamp(&self, value: f64) -> f64 {
        // NaN 视为 0
        if value.is_nan() {
            return 0.0f64.max(self.min_value());
        }
        value.clamp(self.min_value(), 1.0)
    }

    /// 返回替换了值的新记录（值已钳制）
    pub fn with_value(&self, value: f64) -> Self {
        Self {
            value: self.clamp(value),
            ..self.clone()
        }
    }

    /// 以父记录为身份、当前记录的字段全量覆盖
    ///
    /// 显示名称为空时沿用父记录的名称。
    pub fn overlay_onto(&self, parent: &MorphRecord) -> Self {
        let display_name = if self.display_name.is_empty() {
            parent.display_name.clone()
        } else {
            self.display_name.clone()
        };
        Self {
            display_name,
            key: parent.key.clone(),
            category: self.category.clone(),
            signed: self.signed,
            value: self.value,
        }
    }

    /// 除身份外的字段是否与另一条记录不同
    pub fn differs_from(&self, other: &MorphRecord) -> bool {
        self.value != other.value
            || self.display_name != other.display_name
            || self.category != other.category
            || self.signed != other.signed
    }
}
