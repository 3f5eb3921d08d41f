//! 归一化记录模型定义
//!
//! 一次提取产出四类记录，全部携带相同的 (患者ID, 检查实例UID)。
//! 记录在构建完成后只读。

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 所有记录共享的标识键
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StudyIdentity {
    pub patient_id: String,
    pub study_instance_uid: String,
}

/// 性别枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sex {
    #[serde(rename = "M")]
    Male,
    #[serde(rename = "F")]
    Female,
    #[serde(rename = "-")]
    Unknown,
}

impl Sex {
    /// 从DICOM PatientSex取值解析，M/F以外一律视为未知
    pub fn from_code(code: Option<&str>) -> Self {
        match code.map(|c| c.trim().to_uppercase()).as_deref() {
            Some("M") => Sex::Male,
            Some("F") => Sex::Female,
            _ => Sex::Unknown,
        }
    }

    pub fn as_code(&self) -> &'static str {
        match self {
            Sex::Male => "M",
            Sex::Female => "F",
            Sex::Unknown => "-",
        }
    }
}

/// 计划汇总记录，每个计划一条
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanRecord {
    pub patient_id: String,
    pub study_instance_uid: String,
    pub birth_date: Option<NaiveDate>,
    /// 模拟定位时的整岁年龄
    pub age: Option<u32>,
    pub patient_sex: Sex,
    pub sim_study_date: Option<NaiveDate>,
    pub physician: Option<String>,
    pub tx_site: Option<String>,
    /// 处方剂量 (Gy)
    pub rx_dose: f64,
    pub fxs: u32,
    pub patient_orientation: String,
    pub plan_time_stamp: NaiveDateTime,
    pub struct_time_stamp: NaiveDateTime,
    pub dose_time_stamp: Option<NaiveDateTime>,
    pub tps_manufacturer: Option<String>,
    pub tps_software_name: Option<String>,
    pub tps_software_version: Option<String>,
    pub tx_modality: String,
    pub tx_energies: String,
    /// 后装治疗总驻留时间 HH:MM:SS
    pub tx_time: String,
    pub total_mu: f64,
    pub dose_grid_resolution: String,
    pub heterogeneity_correction: String,
}

/// 旋转方向标签
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RotationDirection {
    /// 未指示旋转
    #[serde(rename = "-")]
    None,
    #[serde(rename = "CW")]
    Clockwise,
    #[serde(rename = "CC")]
    CounterClockwise,
    #[serde(rename = "CW/CC")]
    ClockwiseThenCounter,
    #[serde(rename = "CC/CW")]
    CounterThenClockwise,
}

impl RotationDirection {
    /// 解析单个控制点上的方向代码，只接受 CW / CC
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_uppercase().as_str() {
            "CW" => Some(RotationDirection::Clockwise),
            "CC" => Some(RotationDirection::CounterClockwise),
            _ => None,
        }
    }

    pub fn is_rotational(&self) -> bool {
        !matches!(self, RotationDirection::None)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RotationDirection::None => "-",
            RotationDirection::Clockwise => "CW",
            RotationDirection::CounterClockwise => "CC",
            RotationDirection::ClockwiseThenCounter => "CW/CC",
            RotationDirection::CounterThenClockwise => "CC/CW",
        }
    }
}

impl std::fmt::Display for RotationDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 单个旋转轴（机架/准直器/治疗床）的几何归约结果
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisGeometry {
    pub start: f64,
    pub end: f64,
    pub rot_dir: RotationDirection,
    /// 相邻角度差绝对值之和
    pub range: f64,
    pub min: f64,
    pub max: f64,
}

/// 三维坐标
pub type Point3 = [f64; 3];

/// 射束记录，每个实际出束的射束一条
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeamRecord {
    pub patient_id: String,
    pub study_instance_uid: String,
    /// 从1开始连续编号
    pub beam_number: u32,
    pub beam_name: Option<String>,
    pub fx_group: u32,
    pub fxs: u32,
    pub fx_grp_beam_count: u32,
    pub beam_dose: Option<f64>,
    pub beam_mu: f64,
    pub radiation_type: Option<String>,
    pub beam_energy_min: Option<f64>,
    pub beam_energy_max: Option<f64>,
    pub beam_type: Option<String>,
    pub control_point_count: u32,
    pub gantry: AxisGeometry,
    pub collimator: AxisGeometry,
    pub couch: AxisGeometry,
    pub beam_dose_pt: Option<Point3>,
    pub isocenter: Option<Point3>,
    /// 源皮距 (cm)
    pub ssd: Option<f64>,
    pub treatment_machine: Option<String>,
    pub scan_mode: Option<String>,
    pub scan_spot_count: Option<f64>,
    pub beam_mu_per_deg: Option<f64>,
    pub beam_mu_per_cp: f64,
}

/// 处方记录，每个分次组一条
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrescriptionRecord {
    pub patient_id: String,
    pub study_instance_uid: String,
    pub plan_name: Option<String>,
    pub fx_grp_name: String,
    pub fx_grp_number: u32,
    pub fx_grp_count: u32,
    /// 单次剂量 (Gy)
    pub fx_dose: f64,
    pub fxs: u32,
    /// 总处方剂量 (Gy)
    pub rx_dose: f64,
    pub rx_percent: f64,
    pub normalization_method: String,
    pub normalization_object: String,
}

/// 结构剂量记录，每个有效勾画结构一条
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionDoseRecord {
    pub patient_id: String,
    pub study_instance_uid: String,
    pub institutional_roi: String,
    pub physician_roi: String,
    pub roi_name: String,
    pub roi_type: Option<String>,
    pub volume: f64,
    pub min_dose: f64,
    pub mean_dose: f64,
    pub max_dose: f64,
    /// 逗号分隔、两位小数的DVH计数序列
    pub dvh_str: String,
    pub roi_coord_str: String,
    pub surface_area: Option<f64>,
}

/// 一次提取运行的全部输出
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionTables {
    pub run_id: Uuid,
    pub plan: PlanRecord,
    pub prescriptions: Vec<PrescriptionRecord>,
    pub beams: Vec<BeamRecord>,
    pub regions: Vec<RegionDoseRecord>,
}

impl ExtractionTables {
    /// 检查所有记录是否共享同一标识键
    pub fn shares_identity(&self) -> bool {
        let key = (&self.plan.patient_id, &self.plan.study_instance_uid);
        self.prescriptions
            .iter()
            .all(|r| (&r.patient_id, &r.study_instance_uid) == key)
            && self
                .beams
                .iter()
                .all(|r| (&r.patient_id, &r.study_instance_uid) == key)
            && self
                .regions
                .iter()
                .all(|r| (&r.patient_id, &r.study_instance_uid) == key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sex_from_code() {
        assert_eq!(Sex::from_code(Some("m")), Sex::Male);
        assert_eq!(Sex::from_code(Some("F ")), Sex::Female);
        assert_eq!(Sex::from_code(Some("O")), Sex::Unknown);
        assert_eq!(Sex::from_code(None), Sex::Unknown);
    }

    #[test]
    fn test_rotation_direction_codes() {
        assert_eq!(
            RotationDirection::from_code("cw"),
            Some(RotationDirection::Clockwise)
        );
        assert_eq!(RotationDirection::from_code("NONE"), None);
        assert_eq!(RotationDirection::CounterThenClockwise.as_str(), "CC/CW");
        assert!(!RotationDirection::None.is_rotational());
    }

    #[test]
    fn test_rotation_direction_serializes_as_label() {
        let json = serde_json::to_string(&RotationDirection::ClockwiseThenCounter).unwrap();
        assert_eq!(json, "\"CW/CC\"");
    }
}
