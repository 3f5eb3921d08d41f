//! 结构剂量表
//!
//! 对每个非标记点、DVH体积大于0的结构，组合外部DVH结果、ROI分类和表面积。

use crate::collaborators::{Collaborators, RegionCategorizer};
use crate::plan_summary::physician_of;
use rtx_core::{RegionDoseRecord, Result};
use rtx_dicom::{DocumentSet, Region};
use tracing::{debug, info, warn};

const ITV_PREFIX: &str = "itv";
const ITV_TYPE: &str = "ITV";

/// 结构名称清洗：小写、去除首尾空白，`'` 替换为 `` ` ``，`_` 替换为空格
pub fn clean_name(name: &str) -> String {
    name.to_lowercase()
        .trim()
        .replace('\'', "`")
        .replace('_', " ")
}

/// 机构类别与医生类别
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionCategories {
    pub institutional: String,
    pub physician: String,
}

/// 按医生与清洗后的名称解析结构类别
pub fn categorize(
    categorizer: &dyn RegionCategorizer,
    physician: Option<&str>,
    name: &str,
) -> Result<RegionCategories> {
    let uncategorized = categorizer.uncategorized_label().to_string();

    if !categorizer.is_known_region(name) {
        return Ok(RegionCategories {
            institutional: uncategorized.clone(),
            physician: uncategorized,
        });
    }

    match physician.filter(|p| categorizer.is_known_physician(p)) {
        Some(physician) => {
            let physician_region = categorizer.physician_region(physician, name)?;
            let institutional = categorizer.institutional_region(physician, &physician_region)?;
            Ok(RegionCategories {
                institutional,
                physician: physician_region,
            })
        }
        None => {
            let institutional = if categorizer.is_institutional_region(name) {
                name.to_string()
            } else {
                uncategorized.clone()
            };
            Ok(RegionCategories {
                institutional,
                physician: uncategorized,
            })
        }
    }
}

/// 提取结构剂量表
pub fn extract_region_doses(
    documents: &DocumentSet,
    regions: &[Region],
    collaborators: &Collaborators<'_>,
) -> Result<Vec<RegionDoseRecord>> {
    let identity = documents.identity();
    let physician = physician_of(documents.structure());

    let mut records = Vec::new();
    for region in regions {
        if region.is_marker() {
            debug!("跳过标记点: {}", region.name);
            continue;
        }

        let dvh = collaborators
            .dvh
            .calculate(documents.structure(), documents.dose(), region.number)?;
        if dvh.volume <= 0.0 {
            debug!("跳过体积为 {} 的结构: {}", dvh.volume, region.name);
            continue;
        }

        let roi_name = clean_name(&region.name);
        let categories = categorize(collaborators.categorizer, physician.as_deref(), &roi_name)?;

        let roi_type = if roi_name.starts_with(ITV_PREFIX) {
            Some(ITV_TYPE.to_string())
        } else {
            region.roi_type.clone()
        };

        let surface_area = match collaborators.surface_area.surface_area(&region.planes) {
            Ok(area) => Some(area),
            Err(e) => {
                warn!(
                    "表面积计算失败: ROI {} ({}): {}",
                    region.number, region.name, e
                );
                None
            }
        };

        records.push(RegionDoseRecord {
            patient_id: identity.patient_id.clone(),
            study_instance_uid: identity.study_instance_uid.clone(),
            institutional_roi: categories.institutional,
            physician_roi: categories.physician,
            roi_name,
            roi_type,
            volume: dvh.volume,
            min_dose: dvh.min,
            mean_dose: dvh.mean,
            max_dose: dvh.max,
            dvh_str: format_counts(&dvh.counts),
            roi_coord_str: region.coord_string(),
            surface_area,
        });
    }

    info!("结构剂量表: {} 个结构", records.len());
    Ok(records)
}

/// DVH计数按两位小数逗号连接
fn format_counts(counts: &[f64]) -> String {
    counts
        .iter()
        .map(|c| format!("{:.2}", c))
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roi_map::RoiNameMap;

    const MAP: &str = r#"
        institutional_rois = ["brainstem", "spinal cord", "parotid l"]

        [physicians.SMITH.rois."spinal cord"]
        institutional = "spinal cord"
        variations = ["cord", "spinal_cord"]

        [physicians.SMITH.rois."brainstem"]
        institutional = "brainstem"
        variations = ["bs", "brain stem"]
    "#;

    #[test]
    fn test_clean_name() {
        assert_eq!(clean_name("  Spinal_Cord "), "spinal cord");
        assert_eq!(clean_name("Pt's Lung"), "pt`s lung");
    }

    #[test]
    fn test_categorize_known_physician() {
        let map = RoiNameMap::from_toml_str(MAP).unwrap();
        let categories = categorize(&map, Some("SMITH"), "cord").unwrap();
        assert_eq!(categories.physician, "spinal cord");
        assert_eq!(categories.institutional, "spinal cord");
    }

    #[test]
    fn test_categorize_unknown_physician_uses_institutional_name() {
        let map = RoiNameMap::from_toml_str(MAP).unwrap();

        let categories = categorize(&map, Some("JONES"), "brainstem").unwrap();
        assert_eq!(categories.institutional, "brainstem");
        assert_eq!(categories.physician, "uncategorized");

        let categories = categorize(&map, None, "bs").unwrap();
        assert_eq!(categories.institutional, "uncategorized");
        assert_eq!(categories.physician, "uncategorized");
    }

    #[test]
    fn test_categorize_unknown_region() {
        let map = RoiNameMap::from_toml_str(MAP).unwrap();
        let categories = categorize(&map, Some("SMITH"), "gtv nodes").unwrap();
        assert_eq!(categories.institutional, "uncategorized");
        assert_eq!(categories.physician, "uncategorized");
    }

    #[test]
    fn test_format_counts() {
        assert_eq!(format_counts(&[100.0, 99.5, 0.126]), "100.00,99.50,0.13");
        assert_eq!(format_counts(&[]), "");
    }
}
