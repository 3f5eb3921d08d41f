//! 结构集访问器
//!
//! 从RT Structure Set中整理出ROI列表：编号、名称、解释类型与按层面分组的轮廓。

use crate::attributes::AttributeAccess;
use crate::document::RtDocument;
use crate::tags;
use rtx_core::utils::{format_number, round_to};
use rtx_core::{Point3, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// 标记点类型，不参与剂量统计
pub const MARKER_TYPE: &str = "MARKER";

/// 单条轮廓
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contour {
    pub geometric_type: Option<String>,
    pub points: Vec<Point3>,
}

/// 同一z层面上的全部轮廓
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContourPlane {
    pub z: f64,
    pub contours: Vec<Contour>,
}

/// 勾画结构
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub number: i64,
    pub name: String,
    /// RTROIInterpretedType（大写）
    pub roi_type: Option<String>,
    /// 按z升序排列
    pub planes: Vec<ContourPlane>,
}

impl Region {
    pub fn is_marker(&self) -> bool {
        self.roi_type.as_deref() == Some(MARKER_TYPE)
    }

    /// 轮廓坐标序列化：每条轮廓为 `z,x1,y1,x2,y2,...`，轮廓间以 `:` 分隔
    pub fn coord_string(&self) -> String {
        let mut contours = Vec::new();
        for plane in &self.planes {
            for contour in &plane.contours {
                let mut fields = vec![format!("{:.2}", plane.z)];
                for point in &contour.points {
                    fields.push(format_number(round_to(point[0], 3)));
                    fields.push(format_number(round_to(point[1], 3)));
                }
                contours.push(fields.join(","));
            }
        }
        contours.join(":")
    }
}

/// 读取结构集中的全部ROI，顺序与StructureSetROISequence一致
pub fn regions(structure: &RtDocument) -> Result<Vec<Region>> {
    let roi_items =
        structure.require_items(tags::STRUCTURE_SET_ROI_SEQUENCE, "StructureSetROISequence")?;

    let mut types: HashMap<i64, String> = HashMap::new();
    for observation in structure.items(tags::RT_ROI_OBSERVATIONS_SEQUENCE) {
        if let (Some(number), Some(roi_type)) = (
            observation.opt_i64(tags::REFERENCED_ROI_NUMBER),
            observation.upper_str(tags::RT_ROI_INTERPRETED_TYPE),
        ) {
            types.entry(number).or_insert(roi_type);
        }
    }

    let mut planes: HashMap<i64, Vec<ContourPlane>> = HashMap::new();
    for roi_contour in structure.items(tags::ROI_CONTOUR_SEQUENCE) {
        let Some(number) = roi_contour.opt_i64(tags::REFERENCED_ROI_NUMBER) else {
            continue;
        };
        let contours = roi_contour.items(tags::CONTOUR_SEQUENCE).iter().filter_map(|item| {
            let data = item.opt_f64s(tags::CONTOUR_DATA)?;
            let points: Vec<Point3> = data
                .chunks_exact(3)
                .map(|c| [c[0], c[1], c[2]])
                .collect();
            if points.is_empty() {
                return None;
            }
            Some(Contour {
                geometric_type: item.upper_str(tags::CONTOUR_GEOMETRIC_TYPE),
                points,
            })
        });
        planes.insert(number, group_by_plane(contours));
    }

    let mut regions = Vec::with_capacity(roi_items.len());
    for item in roi_items {
        let Some(number) = item.opt_i64(tags::ROI_NUMBER) else {
            debug!("跳过缺少ROINumber的结构");
            continue;
        };
        regions.push(Region {
            number,
            name: item.str_or(tags::ROI_NAME, ""),
            roi_type: types.get(&number).cloned(),
            planes: planes.remove(&number).unwrap_or_default(),
        });
    }

    debug!("结构集共 {} 个ROI", regions.len());
    Ok(regions)
}

/// 以0.01mm精度的z值归组，按z升序输出
fn group_by_plane(contours: impl Iterator<Item = Contour>) -> Vec<ContourPlane> {
    let mut by_z: Vec<(i64, ContourPlane)> = Vec::new();
    for contour in contours {
        let z = contour.points[0][2];
        let key = (z * 100.0).round() as i64;
        match by_z.iter_mut().find(|(k, _)| *k == key) {
            Some((_, plane)) => plane.contours.push(contour),
            None => by_z.push((
                key,
                ContourPlane {
                    z: round_to(z, 2),
                    contours: vec![contour],
                },
            )),
        }
    }
    by_z.sort_by_key(|(key, _)| *key);
    by_z.into_iter().map(|(_, plane)| plane).collect()
}
