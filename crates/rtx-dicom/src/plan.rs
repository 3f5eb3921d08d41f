//! 计划汇总访问器
//!
//! 计算计划级别的备选处方剂量 (cGy) 与后装标志。

use crate::attributes::AttributeAccess;
use crate::document::RtDocument;
use crate::tags;
use serde::{Deserialize, Serialize};

/// 计划汇总
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanSummary {
    pub label: Option<String>,
    /// 计划处方剂量 (cGy，取整)
    pub rx_dose_cgy: f64,
    pub brachy: bool,
}

impl PlanSummary {
    /// 处方剂量优先取剂量参考序列：SITE 类取最大值，VOLUME 类直接覆盖；
    /// 都没有时用第一个分次组的 BeamDose × 分次数。
    pub fn from_plan(plan: &RtDocument) -> Self {
        let mut rx_dose = 0.0;

        if plan.has(tags::FRACTION_GROUP_SEQUENCE) {
            for item in plan.items(tags::DOSE_REFERENCE_SEQUENCE) {
                let structure_type = item.upper_str(tags::DOSE_REFERENCE_STRUCTURE_TYPE);
                let Some(target) = item.opt_f64(tags::TARGET_PRESCRIPTION_DOSE) else {
                    continue;
                };
                match structure_type.as_deref() {
                    Some("SITE") => {
                        rx_dose = f64::max(rx_dose, target * 100.0);
                    }
                    Some("VOLUME") => {
                        rx_dose = target * 100.0;
                    }
                    _ => {}
                }
            }

            if rx_dose == 0.0 {
                if let Some(group) = plan.items(tags::FRACTION_GROUP_SEQUENCE).first() {
                    if let Some(fractions) = group.opt_i64(tags::NUMBER_OF_FRACTIONS_PLANNED) {
                        rx_dose = group
                            .items(tags::REFERENCED_BEAM_SEQUENCE)
                            .iter()
                            .filter_map(|beam| beam.opt_f64(tags::BEAM_DOSE))
                            .map(|dose| dose * fractions as f64 * 100.0)
                            .sum();
                    }
                }
            }
        }

        Self {
            label: plan.opt_str(tags::RT_PLAN_LABEL),
            rx_dose_cgy: rx_dose.round(),
            brachy: plan.has(tags::BRACHY_TREATMENT_TECHNIQUE)
                || plan.has(tags::BRACHY_TREATMENT_TYPE),
        }
    }

    /// 处方剂量 (Gy)
    pub fn rx_dose_gy(&self) -> f64 {
        self.rx_dose_cgy / 100.0
    }
}
