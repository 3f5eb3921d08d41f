//! 提取引擎
//!
//! 协调计划汇总、处方、射束和结构剂量四个提取器，对一个患者的文档三元组完成一次提取。

use crate::collaborators::Collaborators;
use crate::{beams, plan_summary, prescription, region_dose};
use rtx_core::{ExtractionTables, Result};
use rtx_dicom::{structures, DicomParser, DocumentSet, PlanSummary};
use tracing::{info, info_span};
use uuid::Uuid;

/// 提取引擎
///
/// 只持有协作者的共享引用，可在多个运行之间复用。
#[derive(Debug, Clone, Copy)]
pub struct ExtractionEngine<'a> {
    collaborators: Collaborators<'a>,
}

impl<'a> ExtractionEngine<'a> {
    pub fn new(collaborators: Collaborators<'a>) -> Self {
        Self { collaborators }
    }

    /// 从三个文档的字节数据提取
    pub fn extract(&self, plan: &[u8], structure: &[u8], dose: &[u8]) -> Result<ExtractionTables> {
        let documents = DicomParser::parse_set(plan, structure, dose)?;
        self.extract_documents(&documents)
    }

    /// 从已解析且校验过的文档三元组提取
    pub fn extract_documents(&self, documents: &DocumentSet) -> Result<ExtractionTables> {
        let run_id = Uuid::new_v4();
        let span = info_span!("extraction", %run_id);
        let _guard = span.enter();

        let identity = documents.identity();
        info!(
            "开始提取: 患者ID={}, 检查UID={}",
            identity.patient_id, identity.study_instance_uid
        );

        let regions = structures::regions(documents.structure())?;
        let summary = PlanSummary::from_plan(documents.plan());

        let plan = plan_summary::extract_plan(documents, &regions, &summary)?;
        let prescriptions = prescription::extract_prescriptions(documents, &regions, &summary)?;
        let beams = beams::extract_beams(documents)?;
        let regions = region_dose::extract_region_doses(documents, &regions, &self.collaborators)?;

        info!(
            "提取完成: {} 个处方, {} 个射束, {} 个结构",
            prescriptions.len(),
            beams.len(),
            regions.len()
        );

        Ok(ExtractionTables {
            run_id,
            plan,
            prescriptions,
            beams,
            regions,
        })
    }
}

/// 从三个文档的字节数据提取四张表
pub fn extract_tables(
    plan: &[u8],
    structure: &[u8],
    dose: &[u8],
    collaborators: &Collaborators<'_>,
) -> Result<ExtractionTables> {
    ExtractionEngine::new(*collaborators).extract(plan, structure, dose)
}

/// 从已解析的文档三元组提取四张表
pub fn extract_from_documents(
    documents: &DocumentSet,
    collaborators: &Collaborators<'_>,
) -> Result<ExtractionTables> {
    ExtractionEngine::new(*collaborators).extract_documents(documents)
}
