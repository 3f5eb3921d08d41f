//! ROI名称映射
//!
//! 基于TOML文件的 [`RegionCategorizer`] 实现。文件格式：
//!
//! ```toml
//! institutional_rois = ["brainstem", "spinal cord"]
//!
//! [physicians.SMITH.rois."spinal cord"]
//! institutional = "spinal cord"
//! variations = ["cord", "spinal_cord"]
//! ```
//!
//! 医生标识按大写比较，结构名称按 [`clean_name`] 清洗后比较。

use crate::collaborators::{RegionCategorizer, UNCATEGORIZED};
use crate::region_dose::clean_name;
use rtx_core::{Result, RtError};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RoiMapFile {
    #[serde(default)]
    institutional_rois: Vec<String>,
    #[serde(default)]
    physicians: HashMap<String, PhysicianEntry>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct PhysicianEntry {
    #[serde(default)]
    rois: HashMap<String, PhysicianRoi>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PhysicianRoi {
    institutional: String,
    #[serde(default)]
    variations: Vec<String>,
}

/// 单个医生的结构命名习惯
#[derive(Debug, Clone, Default)]
struct PhysicianMap {
    /// 名称变体 -> 医生结构类别
    variations: HashMap<String, String>,
    /// 医生结构类别 -> 机构类别
    institutional: HashMap<String, String>,
}

/// ROI名称分类服务
#[derive(Debug, Clone)]
pub struct RoiNameMap {
    institutional: HashSet<String>,
    physicians: HashMap<String, PhysicianMap>,
    uncategorized: String,
}

impl Default for RoiNameMap {
    fn default() -> Self {
        Self::empty()
    }
}

impl RoiNameMap {
    /// 不含任何映射，全部结构归为未分类
    pub fn empty() -> Self {
        Self {
            institutional: HashSet::new(),
            physicians: HashMap::new(),
            uncategorized: UNCATEGORIZED.to_string(),
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: RoiMapFile = toml::from_str(content)
            .map_err(|e| RtError::Categorization(format!("ROI映射文件格式错误: {}", e)))?;
        Ok(Self::from_file(file))
    }

    /// 从TOML文件加载
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let map = Self::from_toml_str(&content)?;
        info!(
            "已加载ROI映射: {:?}，{} 位医生，{} 个机构结构",
            path,
            map.physicians.len(),
            map.institutional.len()
        );
        Ok(map)
    }

    /// 替换未分类标签
    pub fn with_uncategorized_label(mut self, label: impl Into<String>) -> Self {
        self.uncategorized = label.into();
        self
    }

    fn from_file(file: RoiMapFile) -> Self {
        let institutional = file
            .institutional_rois
            .iter()
            .map(|name| clean_name(name))
            .collect();

        let physicians = file
            .physicians
            .into_iter()
            .map(|(physician, entry)| {
                let mut map = PhysicianMap::default();
                for (roi, spec) in entry.rois {
                    let roi = clean_name(&roi);
                    map.variations.insert(roi.clone(), roi.clone());
                    for variation in &spec.variations {
                        map.variations.insert(clean_name(variation), roi.clone());
                    }
                    map.institutional.insert(roi, clean_name(&spec.institutional));
                }
                (physician.trim().to_uppercase(), map)
            })
            .collect();

        Self {
            institutional,
            physicians,
            uncategorized: UNCATEGORIZED.to_string(),
        }
    }

    fn physician(&self, physician: &str) -> Result<&PhysicianMap> {
        self.physicians
            .get(&physician.trim().to_uppercase())
            .ok_or_else(|| RtError::Categorization(format!("未知医生: {}", physician)))
    }
}

impl RegionCategorizer for RoiNameMap {
    fn is_known_region(&self, name: &str) -> bool {
        self.institutional.contains(name)
            || self
                .physicians
                .values()
                .any(|p| p.variations.contains_key(name))
    }

    fn is_known_physician(&self, physician: &str) -> bool {
        self.physicians
            .contains_key(&physician.trim().to_uppercase())
    }

    fn is_institutional_region(&self, name: &str) -> bool {
        self.institutional.contains(name)
    }

    fn physician_region(&self, physician: &str, name: &str) -> Result<String> {
        Ok(self
            .physician(physician)?
            .variations
            .get(name)
            .cloned()
            .unwrap_or_else(|| self.uncategorized.clone()))
    }

    fn institutional_region(&self, physician: &str, physician_region: &str) -> Result<String> {
        Ok(self
            .physician(physician)?
            .institutional
            .get(physician_region)
            .cloned()
            .unwrap_or_else(|| self.uncategorized.clone()))
    }

    fn uncategorized_label(&self) -> &str {
        &self.uncategorized
    }
}
