//! 计划汇总提取
//!
//! 每个计划产出一条 [`PlanRecord`]：人口学信息、文档时间戳、计划系统信息、
//! 分次与MU合计、治疗模式分类，以及由结构名称恢复的治疗部位与处方。

use crate::annotations::scan_plan_annotations;
use chrono::NaiveDateTime;
use dicom::core::Tag;
use dicom::dictionary_std::tags as std_tags;
use dicom::object::InMemDicomObject;
use rtx_core::utils::{
    age_in_years, format_hms, format_number, parse_dicom_date, parse_dicom_datetime, round_to,
};
use rtx_core::{PlanRecord, Result, RotationDirection, RtError, Sex};
use rtx_dicom::{tags, AttributeAccess, DocumentSet, PlanSummary, Region, RtDocument};
use tracing::{debug, info};

const DEFAULT_ORIENTATION: &str = "UKN";
const DEFAULT_HETEROGENEITY: &str = "IMAGE";
const NO_TREATMENT_TIME: &str = "00:00:00";

/// 提取计划汇总记录
pub fn extract_plan(
    documents: &DocumentSet,
    regions: &[Region],
    summary: &PlanSummary,
) -> Result<PlanRecord> {
    let plan = documents.plan();
    let structure = documents.structure();
    let dose = documents.dose();
    let identity = documents.identity();

    let birth_date = plan
        .opt_str(std_tags::PATIENT_BIRTH_DATE)
        .and_then(|d| parse_dicom_date(&d));
    let sim_study_date = plan
        .opt_str(std_tags::STUDY_DATE)
        .and_then(|d| parse_dicom_date(&d));
    let age = match (birth_date, sim_study_date) {
        (Some(birth), Some(sim)) => age_in_years(birth, sim),
        _ => None,
    };

    let (mut fxs, total_mu) = fraction_totals(plan)?;

    let annotations = scan_plan_annotations(regions.iter().map(|r| r.name.as_str()));
    if let Some(annotated) = annotations.fractions {
        debug!("结构名称中的处方点覆盖分次数: {} -> {}", fxs, annotated);
        fxs = annotated;
    }
    let rx_dose = if annotations.rx_dose_gy == 0.0 {
        summary.rx_dose_gy()
    } else {
        annotations.rx_dose_gy
    };
    let tx_site = annotations
        .site
        .or_else(|| summary.label.clone())
        .map(|s| s.to_uppercase());

    let (tx_modality, tx_energies) = classify_modality(plan, summary.brachy);

    let record = PlanRecord {
        patient_id: identity.patient_id.clone(),
        study_instance_uid: identity.study_instance_uid.clone(),
        birth_date,
        age,
        patient_sex: Sex::from_code(plan.opt_str(std_tags::PATIENT_SEX).as_deref()),
        sim_study_date,
        physician: physician_of(plan),
        tx_site,
        rx_dose,
        fxs,
        patient_orientation: plan
            .items(tags::PATIENT_SETUP_SEQUENCE)
            .first()
            .and_then(|setup| setup.opt_str(tags::PATIENT_POSITION))
            .unwrap_or_else(|| DEFAULT_ORIENTATION.to_string()),
        plan_time_stamp: required_timestamp(
            plan,
            (tags::RT_PLAN_DATE, "RTPlanDate"),
            tags::RT_PLAN_TIME,
        )?,
        struct_time_stamp: required_timestamp(
            structure,
            (tags::STRUCTURE_SET_DATE, "StructureSetDate"),
            tags::STRUCTURE_SET_TIME,
        )?,
        dose_time_stamp: dose
            .opt_str(std_tags::INSTANCE_CREATION_DATE)
            .and_then(|date| {
                let time = dose.opt_str(std_tags::INSTANCE_CREATION_TIME);
                parse_dicom_datetime(&date, time.as_deref())
            }),
        tps_manufacturer: plan.opt_str(std_tags::MANUFACTURER),
        tps_software_name: plan.opt_str(std_tags::MANUFACTURER_MODEL_NAME),
        tps_software_version: plan
            .opt_strs(std_tags::SOFTWARE_VERSIONS)
            .and_then(|versions| versions.into_iter().next()),
        tx_modality,
        tx_energies,
        tx_time: treatment_time(plan),
        total_mu,
        dose_grid_resolution: dose_grid_resolution(dose),
        heterogeneity_correction: dose
            .opt_strs(tags::TISSUE_HETEROGENEITY_CORRECTION)
            .map(|values| values.join(","))
            .unwrap_or_else(|| DEFAULT_HETEROGENEITY.to_string()),
    };

    info!(
        "计划汇总: 部位={:?}, 处方={}Gy/{}次, 模式={}",
        record.tx_site, record.rx_dose, record.fxs, record.tx_modality
    );
    Ok(record)
}

/// 主管医生，优先PhysiciansOfRecord
pub(crate) fn physician_of(doc: &RtDocument) -> Option<String> {
    doc.first_upper_of(&[
        std_tags::PHYSICIANS_OF_RECORD,
        std_tags::REFERRING_PHYSICIAN_NAME,
    ])
}

/// 分次组合计：总分次数与总MU（每组分次数 × 组内射束MU之和）
fn fraction_totals(plan: &RtDocument) -> Result<(u32, f64)> {
    let groups = plan.require_items(tags::FRACTION_GROUP_SEQUENCE, "FractionGroupSequence")?;

    let mut fxs = 0u32;
    let mut total_mu = 0.0;
    for group in groups {
        let fractions = fraction_count(group);
        let group_mu: f64 = group
            .items(tags::REFERENCED_BEAM_SEQUENCE)
            .iter()
            .map(|beam| beam.f64_or(tags::BEAM_METERSET, 0.0))
            .sum();
        fxs += fractions;
        total_mu += fractions as f64 * group_mu;
    }
    Ok((fxs, round_to(total_mu, 1)))
}

/// 分次组的计划分次数，缺失或为负时为0
pub(crate) fn fraction_count<A: AttributeAccess + ?Sized>(group: &A) -> u32 {
    group
        .opt_i64(tags::NUMBER_OF_FRACTIONS_PLANNED)
        .map(|n| n.max(0) as u32)
        .unwrap_or(0)
}

/// 计划和结构集时间戳不可为空：日期缺失或为空值 (Type 2 空元素) 一律视为缺失字段
fn required_timestamp(
    doc: &RtDocument,
    (date_tag, date_field): (Tag, &'static str),
    time_tag: Tag,
) -> Result<NaiveDateTime> {
    let date = doc.require_str(date_tag, date_field)?;
    let time = doc.opt_str(time_tag);
    parse_dicom_datetime(&date, time.as_deref()).ok_or_else(|| RtError::InvalidValue {
        document: doc.kind(),
        field: date_field,
        value: match time {
            Some(t) => format!("{} {}", date, t),
            None => date,
        },
    })
}

/// 治疗模式与能量标签
fn classify_modality(plan: &RtDocument, brachy: bool) -> (String, String) {
    if brachy {
        let modality = plan
            .opt_str(tags::BRACHY_TREATMENT_TYPE)
            .unwrap_or_else(|| "Brachy".to_string());
        return (modality, String::new());
    }

    let mut labels = Labels::default();
    let mut energies = Labels::default();

    let ion_beams = plan.items(tags::ION_BEAM_SEQUENCE);
    if !ion_beams.is_empty() {
        for beam in ion_beams {
            let first_cp = beam.items(tags::ION_CONTROL_POINT_SEQUENCE).first();
            let delivery = arc_or_static(first_cp);
            labels.push(format!("Proton {}", delivery));
            if let Some(energy) = first_cp.and_then(|cp| cp.opt_f64(tags::NOMINAL_BEAM_ENERGY)) {
                energies.push(format!("{}MeV", energy.round()));
            }
        }
    } else {
        for beam in plan.items(tags::BEAM_SEQUENCE) {
            let first_cp = beam.items(tags::CONTROL_POINT_SEQUENCE).first();
            let (particle, unit) = match beam.upper_str(tags::RADIATION_TYPE).as_deref() {
                Some("PHOTON") => ("Photon", "MV"),
                Some("ELECTRON") => ("Electron", "MeV"),
                other => {
                    debug!("未分类的射线类型: {:?}", other);
                    continue;
                }
            };
            labels.push(format!("{} {}", particle, arc_or_static(first_cp)));
            if let Some(energy) = first_cp.and_then(|cp| cp.opt_f64(tags::NOMINAL_BEAM_ENERGY)) {
                energies.push(format!("{}{}", format_number(energy), unit));
            }
        }
    }

    (labels.join(" "), energies.join(", "))
}

/// 首个控制点带有CW/CC机架旋转方向即为弧形治疗
fn arc_or_static(first_cp: Option<&InMemDicomObject>) -> &'static str {
    let rotational = first_cp
        .and_then(|cp| cp.opt_str(tags::GANTRY_ROTATION_DIRECTION))
        .and_then(|code| RotationDirection::from_code(&code))
        .is_some();
    if rotational {
        "Arc"
    } else {
        "3D"
    }
}

/// 保持首次出现顺序的去重标签列表
#[derive(Debug, Default)]
struct Labels(Vec<String>);

impl Labels {
    fn push(&mut self, label: String) {
        if !self.0.contains(&label) {
            self.0.push(label);
        }
    }

    fn join(&self, separator: &str) -> String {
        self.0.join(separator)
    }
}

/// 后装治疗的通道总时间
fn treatment_time(plan: &RtDocument) -> String {
    if !plan.has(tags::BRACHY_TREATMENT_TYPE) {
        return NO_TREATMENT_TIME.to_string();
    }
    let seconds: f64 = plan
        .items(tags::APPLICATION_SETUP_SEQUENCE)
        .iter()
        .flat_map(|setup| setup.items(tags::CHANNEL_SEQUENCE))
        .map(|channel| channel.f64_or(tags::CHANNEL_TOTAL_TIME, 0.0))
        .sum();
    format_hms(seconds)
}

/// 剂量网格分辨率：行列像素间距，层厚非零时追加；两者都缺失时为空串
fn dose_grid_resolution(dose: &RtDocument) -> String {
    let mut parts: Vec<String> = dose
        .opt_f64s(std_tags::PIXEL_SPACING)
        .unwrap_or_default()
        .into_iter()
        .take(2)
        .map(|v| format!("{:.1}", v))
        .collect();
    if let Some(thickness) = dose.opt_f64(std_tags::SLICE_THICKNESS) {
        if thickness != 0.0 {
            parts.push(format!("{:.1}", thickness));
        }
    }
    parts.join(", ")
}
