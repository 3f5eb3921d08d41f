//! 外部协作者接口
//!
//! DVH计算、ROI分类和表面积计算都由外部实现提供，引擎只通过这里的trait调用。

use rtx_core::Result;
use rtx_dicom::{ContourPlane, RtDocument};
use serde::{Deserialize, Serialize};

/// 分类失败或无映射时使用的标签
pub const UNCATEGORIZED: &str = "uncategorized";

/// 单个结构的DVH计算结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DvhResult {
    /// 体积 (cc)
    pub volume: f64,
    pub min: f64,
    pub mean: f64,
    pub max: f64,
    /// 按剂量分箱排列的计数
    pub counts: Vec<f64>,
}

/// DVH计算器
pub trait DvhCalculator {
    fn calculate(
        &self,
        structure: &RtDocument,
        dose: &RtDocument,
        roi_number: i64,
    ) -> Result<DvhResult>;
}

/// ROI名称分类服务
///
/// 名称均为清洗后的结构名称，医生标识为大写。
pub trait RegionCategorizer {
    fn is_known_region(&self, name: &str) -> bool;

    fn is_known_physician(&self, physician: &str) -> bool;

    fn is_institutional_region(&self, name: &str) -> bool;

    /// 医生个人使用的结构类别
    fn physician_region(&self, physician: &str, name: &str) -> Result<String>;

    /// 医生结构类别对应的机构类别
    fn institutional_region(&self, physician: &str, physician_region: &str) -> Result<String>;

    fn uncategorized_label(&self) -> &str {
        UNCATEGORIZED
    }
}

/// 表面积计算
pub trait SurfaceAreaCalculator {
    fn surface_area(&self, planes: &[ContourPlane]) -> Result<f64>;
}

/// 一次提取使用的全部协作者
#[derive(Clone, Copy)]
pub struct Collaborators<'a> {
    pub dvh: &'a dyn DvhCalculator,
    pub categorizer: &'a dyn RegionCategorizer,
    pub surface_area: &'a dyn SurfaceAreaCalculator,
}

impl<'a> Collaborators<'a> {
    pub fn new(
        dvh: &'a dyn DvhCalculator,
        categorizer: &'a dyn RegionCategorizer,
        surface_area: &'a dyn SurfaceAreaCalculator,
    ) -> Self {
        Self {
            dvh,
            categorizer,
            surface_area,
        }
    }
}

impl std::fmt::Debug for Collaborators<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}
