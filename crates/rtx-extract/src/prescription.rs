//! 处方解析
//!
//! 每个分次组产出一条 [`PrescriptionRecord`]。优先使用剂量参考序列中的结构化处方，
//! 没有对应条目时再按 `rx <n>: ...` 命名约定从结构名称中解析。

use crate::annotations::parse_rx_annotation;
use crate::plan_summary::fraction_count;
use dicom::dictionary_std::tags as std_tags;
use dicom::object::InMemDicomObject;
use rtx_core::{DocumentKind, PrescriptionRecord, Result, RtError};
use rtx_dicom::{tags, AttributeAccess, DocumentSet, PlanSummary, Region, RtDocument};
use tracing::{debug, info};

const DEFAULT_METHOD: &str = "default";
const UNKNOWN_TARGET: &str = "unknown";
const COORDINATE_TARGET: &str = "COORDINATE";
const DEFAULT_PERCENT: f64 = 100.0;

/// 提取全部分次组处方
pub fn extract_prescriptions(
    documents: &DocumentSet,
    regions: &[Region],
    summary: &PlanSummary,
) -> Result<Vec<PrescriptionRecord>> {
    let plan = documents.plan();
    let identity = documents.identity();
    let groups = plan.require_items(tags::FRACTION_GROUP_SEQUENCE, "FractionGroupSequence")?;
    let dose_references = plan.items(tags::DOSE_REFERENCE_SEQUENCE);

    let mut records = Vec::with_capacity(groups.len());
    for (index, group) in groups.iter().enumerate() {
        let ordinal = index as u32 + 1;
        let mut rx = Resolved::new(ordinal, fraction_count(group));

        let structured = match dose_references.get(index) {
            Some(reference) => {
                rx.apply_dose_reference(plan, documents.structure(), reference)?;
                true
            }
            None => false,
        };

        rx.fraction_dose = group_fraction_dose(group);
        if rx.rx_dose == 0.0 {
            rx.rx_dose = summary.rx_dose_gy();
        }
        if rx.fraction_dose == 0.0 && rx.fxs > 0 {
            rx.fraction_dose = rx.rx_dose / rx.fxs as f64;
        }

        if !structured {
            rx.apply_annotation(regions);
        }

        records.push(PrescriptionRecord {
            patient_id: identity.patient_id.clone(),
            study_instance_uid: identity.study_instance_uid.clone(),
            plan_name: plan.opt_str(tags::RT_PLAN_LABEL),
            fx_grp_name: rx.group_name,
            fx_grp_number: ordinal,
            fx_grp_count: groups.len() as u32,
            fx_dose: rx.fraction_dose,
            fxs: rx.fxs,
            rx_dose: rx.rx_dose,
            rx_percent: rx.percent,
            normalization_method: rx.method,
            normalization_object: rx.target,
        });
    }

    info!("处方表: {} 个分次组", records.len());
    Ok(records)
}

/// 单个分次组正在解析中的处方
#[derive(Debug)]
struct Resolved {
    ordinal: u32,
    group_name: String,
    fraction_dose: f64,
    fxs: u32,
    rx_dose: f64,
    percent: f64,
    method: String,
    target: String,
}

impl Resolved {
    fn new(ordinal: u32, fxs: u32) -> Self {
        Self {
            ordinal,
            group_name: format!("FxGrp {}", ordinal),
            fraction_dose: 0.0,
            fxs,
            rx_dose: 0.0,
            percent: DEFAULT_PERCENT,
            method: DEFAULT_METHOD.to_string(),
            target: UNKNOWN_TARGET.to_string(),
        }
    }

    fn apply_dose_reference(
        &mut self,
        plan: &RtDocument,
        structure: &RtDocument,
        reference: &InMemDicomObject,
    ) -> Result<()> {
        self.rx_dose = reference.f64_or(tags::TARGET_PRESCRIPTION_DOSE, 0.0);
        if let Some(method) = reference.opt_str(tags::DOSE_REFERENCE_STRUCTURE_TYPE) {
            self.method = method;
        }

        self.target = match self.method.to_lowercase().as_str() {
            "coordinates" => COORDINATE_TARGET.to_string(),
            "site" => plan
                .opt_str(std_tags::MANUFACTURER_MODEL_NAME)
                .unwrap_or_else(|| UNKNOWN_TARGET.to_string()),
            _ => {
                let roi_number = reference.required_i64(
                    tags::REFERENCED_ROI_NUMBER,
                    DocumentKind::Plan,
                    "ReferencedROINumber",
                )?;
                normalization_region_name(structure, roi_number)?
            }
        };

        debug!(
            "分次组 {} 使用结构化处方: {}Gy, {} -> {}",
            self.ordinal, self.rx_dose, self.method, self.target
        );
        Ok(())
    }

    fn apply_annotation(&mut self, regions: &[Region]) {
        let Some(rx) = regions
            .iter()
            .filter_map(|region| parse_rx_annotation(&region.name))
            .find(|rx| rx.group == self.ordinal)
        else {
            return;
        };

        debug!("分次组 {} 使用结构名称中的处方: {}", self.ordinal, rx.group_name);
        self.group_name = rx.group_name;
        self.fraction_dose = rx.fraction_dose_gy;
        self.fxs = rx.fractions;
        self.rx_dose = rx.total_dose_gy;
        self.percent = rx.percent;
        if let Some(method) = rx.method {
            self.method = method;
        }
        if let Some(target) = rx.target {
            self.target = target;
        }
    }
}

/// 分次剂量：射束剂量之和，没有射束时取后装施源器剂量之和
fn group_fraction_dose(group: &InMemDicomObject) -> f64 {
    let beams = group.items(tags::REFERENCED_BEAM_SEQUENCE);
    if !beams.is_empty() {
        return beams.iter().map(|b| b.f64_or(tags::BEAM_DOSE, 0.0)).sum();
    }
    group
        .items(tags::REFERENCED_BRACHY_APPLICATION_SETUP_SEQUENCE)
        .iter()
        .map(|setup| setup.f64_or(tags::BRACHY_APPLICATION_SETUP_DOSE, 0.0))
        .sum()
}

/// 归一化结构名称：轮廓序列中被引用且在结构定义序列中有同编号条目
fn normalization_region_name(structure: &RtDocument, roi_number: i64) -> Result<String> {
    let contoured = structure
        .items(tags::ROI_CONTOUR_SEQUENCE)
        .iter()
        .any(|item| item.opt_i64(tags::REFERENCED_ROI_NUMBER) == Some(roi_number));
    if !contoured {
        return Err(RtError::NormalizationTargetNotFound { roi_number });
    }

    structure
        .items(tags::STRUCTURE_SET_ROI_SEQUENCE)
        .iter()
        .find(|item| item.opt_i64(tags::ROI_NUMBER) == Some(roi_number))
        .map(|item| item.str_or(tags::ROI_NAME, ""))
        .ok_or(RtError::NormalizationTargetNotFound { roi_number })
}
