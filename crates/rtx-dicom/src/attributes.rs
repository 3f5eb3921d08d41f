//! 属性解析器
//!
//! 对已解析的DICOM对象提供统一的"读取可选字段，否则取默认值/备选字段"访问方式。
//! 可选字段缺失永远不会报错；只有必需字段缺失才返回 [`RtError::MissingField`]。
//! 空字符串或仅含空白的取值一律视为缺失。

use dicom::core::Tag;
use dicom::object::InMemDicomObject;
use rtx_core::{DocumentKind, Result, RtError};
use tracing::debug;

/// 类型化的可选字段访问能力
pub trait AttributeAccess {
    /// 字符串取值（去除首尾空白），多值时以 `\` 连接
    fn opt_str(&self, tag: Tag) -> Option<String>;

    /// 多值字符串
    fn opt_strs(&self, tag: Tag) -> Option<Vec<String>>;

    /// 单个浮点数（DS/FD等），多值时取第一个
    fn opt_f64(&self, tag: Tag) -> Option<f64>;

    /// 多值浮点数
    fn opt_f64s(&self, tag: Tag) -> Option<Vec<f64>>;

    /// 整数（IS/US等）
    fn opt_i64(&self, tag: Tag) -> Option<i64>;

    /// 序列条目
    fn opt_items(&self, tag: Tag) -> Option<&[InMemDicomObject]>;

    /// 字段是否存在（不论取值是否为空）
    fn has(&self, tag: Tag) -> bool;

    fn str_or(&self, tag: Tag, default: &str) -> String {
        self.opt_str(tag).unwrap_or_else(|| default.to_string())
    }

    /// 大写归一化后的标识类字符串
    fn upper_str(&self, tag: Tag) -> Option<String> {
        self.opt_str(tag).map(|s| s.to_uppercase())
    }

    /// 依次尝试多个字段，返回第一个存在的大写取值
    fn first_upper_of(&self, tags: &[Tag]) -> Option<String> {
        tags.iter().find_map(|tag| self.upper_str(*tag))
    }

    fn f64_or(&self, tag: Tag, default: f64) -> f64 {
        self.opt_f64(tag).unwrap_or(default)
    }

    /// 序列条目，缺失时为空切片
    fn items(&self, tag: Tag) -> &[InMemDicomObject] {
        self.opt_items(tag).unwrap_or(&[])
    }

    fn required_str(&self, tag: Tag, document: DocumentKind, field: &'static str) -> Result<String> {
        self.opt_str(tag)
            .ok_or_else(|| RtError::missing(document, field))
    }

    fn required_i64(&self, tag: Tag, document: DocumentKind, field: &'static str) -> Result<i64> {
        self.opt_i64(tag)
            .ok_or_else(|| RtError::missing(document, field))
    }

    /// 必需序列，缺失或为空均视为缺少必需字段
    fn required_items(
        &self,
        tag: Tag,
        document: DocumentKind,
        field: &'static str,
    ) -> Result<&[InMemDicomObject]> {
        match self.opt_items(tag) {
            Some(items) if !items.is_empty() => Ok(items),
            _ => Err(RtError::missing(document, field)),
        }
    }
}

impl AttributeAccess for InMemDicomObject {
    fn opt_str(&self, tag: Tag) -> Option<String> {
        let element = self.element(tag).ok()?;
        match element.to_str() {
            Ok(value) => {
                let value = value.trim();
                if value.is_empty() {
                    None
                } else {
                    Some(value.to_string())
                }
            }
            Err(_) => {
                debug!("标签 {:?} 不是字符串类型", tag);
                None
            }
        }
    }

    fn opt_strs(&self, tag: Tag) -> Option<Vec<String>> {
        let element = self.element(tag).ok()?;
        let values: Vec<String> = element
            .to_multi_str()
            .ok()?
            .iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if values.is_empty() {
            None
        } else {
            Some(values)
        }
    }

    fn opt_f64(&self, tag: Tag) -> Option<f64> {
        self.element(tag).ok()?.to_float64().ok()
    }

    fn opt_f64s(&self, tag: Tag) -> Option<Vec<f64>> {
        let values = self.element(tag).ok()?.to_multi_float64().ok()?;
        if values.is_empty() {
            None
        } else {
            Some(values)
        }
    }

    fn opt_i64(&self, tag: Tag) -> Option<i64> {
        let element = self.element(tag).ok()?;
        element
            .to_int::<i64>()
            .ok()
            .or_else(|| element.to_float64().ok().map(|v| v.round() as i64))
    }

    fn opt_items(&self, tag: Tag) -> Option<&[InMemDicomObject]> {
        self.element(tag).ok()?.items()
    }

    fn has(&self, tag: Tag) -> bool {
        self.element(tag).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::DatasetBuilder;
    use crate::tags;
    use dicom::core::VR;
    use dicom::dictionary_std::tags as std_tags;

    fn sample() -> InMemDicomObject {
        DatasetBuilder::new()
            .str(std_tags::PATIENT_ID, VR::LO, "MRN0001 ")
            .str(std_tags::REFERRING_PHYSICIAN_NAME, VR::PN, "smith^anne")
            .str(std_tags::PHYSICIANS_OF_RECORD, VR::PN, "  ")
            .num(tags::GANTRY_ANGLE, VR::DS, 181.5)
            .nums(std_tags::PIXEL_SPACING, VR::DS, &[2.5, 2.5])
            .int(tags::NUMBER_OF_FRACTIONS_PLANNED, VR::IS, 30)
            .strs(tags::TISSUE_HETEROGENEITY_CORRECTION, VR::CS, &["IMAGE", "ROI_OVERRIDE"])
            .seq(
                tags::FRACTION_GROUP_SEQUENCE,
                vec![DatasetBuilder::new()
                    .int(tags::NUMBER_OF_BEAMS, VR::IS, 2)
                    .build()],
            )
            .build()
    }

    #[test]
    fn test_optional_fields() {
        let obj = sample();
        assert_eq!(obj.opt_str(std_tags::PATIENT_ID).as_deref(), Some("MRN0001"));
        assert_eq!(obj.opt_f64(tags::GANTRY_ANGLE), Some(181.5));
        assert_eq!(obj.opt_f64s(std_tags::PIXEL_SPACING), Some(vec![2.5, 2.5]));
        assert_eq!(obj.opt_i64(tags::NUMBER_OF_FRACTIONS_PLANNED), Some(30));
        assert_eq!(
            obj.opt_strs(tags::TISSUE_HETEROGENEITY_CORRECTION),
            Some(vec!["IMAGE".to_string(), "ROI_OVERRIDE".to_string()])
        );
        assert_eq!(obj.items(tags::FRACTION_GROUP_SEQUENCE).len(), 1);
        assert!(obj.items(tags::BEAM_SEQUENCE).is_empty());
    }

    #[test]
    fn test_blank_value_is_absent_and_falls_back() {
        let obj = sample();
        assert!(obj.has(std_tags::PHYSICIANS_OF_RECORD));
        assert_eq!(obj.opt_str(std_tags::PHYSICIANS_OF_RECORD), None);
        assert_eq!(
            obj.first_upper_of(&[
                std_tags::PHYSICIANS_OF_RECORD,
                std_tags::REFERRING_PHYSICIAN_NAME
            ])
            .as_deref(),
            Some("SMITH^ANNE")
        );
        assert_eq!(obj.str_or(tags::PATIENT_POSITION, "UKN"), "UKN");
        assert_eq!(obj.f64_or(tags::BEAM_METERSET, 0.0), 0.0);
    }

    #[test]
    fn test_required_fields() {
        let obj = sample();
        assert!(obj
            .required_str(std_tags::PATIENT_ID, DocumentKind::Plan, "PatientID")
            .is_ok());

        let err = obj
            .required_str(std_tags::STUDY_INSTANCE_UID, DocumentKind::Plan, "StudyInstanceUID")
            .unwrap_err();
        assert!(matches!(
            err,
            RtError::MissingField {
                document: DocumentKind::Plan,
                field: "StudyInstanceUID"
            }
        ));

        assert!(obj
            .required_items(tags::BEAM_SEQUENCE, DocumentKind::Plan, "BeamSequence")
            .is_err());
    }
}
