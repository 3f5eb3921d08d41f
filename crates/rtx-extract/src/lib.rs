//! # RT归一化提取模块
//!
//! 将一个患者的计划、结构集、剂量文档转换为四类归一化记录：
//! - 计划汇总：人口学信息、时间戳、分次与MU合计、治疗模式
//! - 处方：每个分次组的剂量、分次数与归一化方式
//! - 射束：三个旋转轴的几何归约与MU指标
//! - 结构剂量：DVH、ROI分类与表面积

pub mod annotations;
pub mod beams;
pub mod collaborators;
pub mod dvh_source;
pub mod engine;
pub mod geometry;
pub mod plan_summary;
pub mod prescription;
pub mod region_dose;
pub mod roi_map;

// 重新导出主要类型
pub use collaborators::{
    Collaborators, DvhCalculator, DvhResult, RegionCategorizer, SurfaceAreaCalculator,
    UNCATEGORIZED,
};
pub use dvh_source::PrecomputedDvh;
pub use engine::{extract_from_documents, extract_tables, ExtractionEngine};
pub use geometry::PlanarSurfaceArea;
pub use region_dose::clean_name;
pub use roi_map::RoiNameMap;
