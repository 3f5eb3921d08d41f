//! 文档三元组验证模块
//!
//! 在提取开始前确认三个文档属于同一患者同一检查。
//! 身份字段缺失或不一致属于前置条件错误；Modality、UID格式、日期格式问题只记为警告。

use crate::attributes::AttributeAccess;
use crate::document::RtDocument;
use crate::tags;
use dicom::dictionary_std::tags as std_tags;
use rtx_core::utils::{is_valid_dicom_uid, parse_dicom_date};
use rtx_core::{Result, RtError, StudyIdentity};
use tracing::{debug, info, warn};

/// 文档三元组验证器
#[derive(Debug, Default)]
pub struct DocumentSetValidator;

impl DocumentSetValidator {
    pub fn new() -> Self {
        Self
    }

    /// 校验并返回共享的标识键，有错误时返回第一处
    pub fn ensure_consistent(
        &self,
        plan: &RtDocument,
        structure: &RtDocument,
        dose: &RtDocument,
    ) -> Result<StudyIdentity> {
        let result = self.validate(plan, structure, dose);
        for warning in &result.warnings {
            warn!("{}", warning);
        }
        info!("文档三元组{}", result.get_summary());

        if let Some(error) = result.errors.into_iter().next() {
            return Err(error);
        }

        let identity = Self::identity_of(plan)?;
        info!(
            "文档三元组校验通过: 患者ID={}, 检查UID={}",
            identity.patient_id, identity.study_instance_uid
        );
        Ok(identity)
    }

    /// 完整验证，收集全部错误与警告
    ///
    /// 错误按计划、结构集、剂量的顺序记录；同一文档先比较检查UID，再比较患者ID。
    pub fn validate(
        &self,
        plan: &RtDocument,
        structure: &RtDocument,
        dose: &RtDocument,
    ) -> ValidationResult {
        let mut result = ValidationResult::new();

        let expected = match Self::identity_of(plan) {
            Ok(identity) => Some(identity),
            Err(e) => {
                result.add_error(e);
                None
            }
        };
        for doc in [structure, dose] {
            match (Self::identity_of(doc), &expected) {
                (Ok(other), Some(expected)) => {
                    Self::compare_identity(doc, expected, other, &mut result)
                }
                (Ok(_), None) => {}
                (Err(e), _) => result.add_error(e),
            }
        }

        for doc in [plan, structure, dose] {
            self.validate_modality(doc, &mut result);
            self.validate_uid_format(doc, &mut result);
            self.validate_dates(doc, &mut result);
        }

        debug!(
            "文档三元组验证完成: {} 个错误, {} 个警告",
            result.error_count(),
            result.warning_count()
        );
        result
    }

    fn compare_identity(
        doc: &RtDocument,
        expected: &StudyIdentity,
        other: StudyIdentity,
        result: &mut ValidationResult,
    ) {
        if other.study_instance_uid != expected.study_instance_uid {
            result.add_error(RtError::IdentityMismatch {
                document: doc.kind(),
                field: "StudyInstanceUID",
                expected: expected.study_instance_uid.clone(),
                found: other.study_instance_uid,
            });
        }
        if other.patient_id != expected.patient_id {
            result.add_error(RtError::IdentityMismatch {
                document: doc.kind(),
                field: "PatientID",
                expected: expected.patient_id.clone(),
                found: other.patient_id,
            });
        }
    }

    fn identity_of(doc: &RtDocument) -> Result<StudyIdentity> {
        Ok(StudyIdentity {
            patient_id: doc.require_str(std_tags::PATIENT_ID, "PatientID")?,
            study_instance_uid: doc.require_str(std_tags::STUDY_INSTANCE_UID, "StudyInstanceUID")?,
        })
    }

    fn validate_modality(&self, doc: &RtDocument, result: &mut ValidationResult) {
        match doc.opt_str(std_tags::MODALITY) {
            Some(modality) if modality.eq_ignore_ascii_case(doc.kind().modality()) => {}
            Some(modality) => result.add_warning(format!(
                "{} 的Modality为 {}，期望 {}",
                doc.kind(),
                modality,
                doc.kind().modality()
            )),
            None => result.add_warning(format!("{} 缺少Modality", doc.kind())),
        }
    }

    fn validate_uid_format(&self, doc: &RtDocument, result: &mut ValidationResult) {
        if let Some(uid) = doc.opt_str(std_tags::STUDY_INSTANCE_UID) {
            if !is_valid_dicom_uid(&uid) {
                result.add_warning(format!("{} 的检查实例UID格式无效: {}", doc.kind(), uid));
            }
        }
    }

    fn validate_dates(&self, doc: &RtDocument, result: &mut ValidationResult) {
        let date_fields = [
            ("PatientBirthDate", std_tags::PATIENT_BIRTH_DATE),
            ("StudyDate", std_tags::STUDY_DATE),
            ("RTPlanDate", tags::RT_PLAN_DATE),
            ("StructureSetDate", tags::STRUCTURE_SET_DATE),
            ("InstanceCreationDate", std_tags::INSTANCE_CREATION_DATE),
        ];

        for (name, tag) in date_fields {
            if let Some(date) = doc.opt_str(tag) {
                if parse_dicom_date(&date).is_none() {
                    result.add_warning(format!("{} 的 {} 格式无效: {}", doc.kind(), name, date));
                }
            }
        }
    }
}

/// 验证结果
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// 验证错误列表，均为前置条件错误
    pub errors: Vec<RtError>,
    /// 验证警告列表
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_error(&mut self, error: RtError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: String) {
        self.warnings.push(warning);
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    /// 获取验证报告摘要
    pub fn get_summary(&self) -> String {
        if self.is_valid() {
            if self.warnings.is_empty() {
                "验证完全通过".to_string()
            } else {
                format!("验证通过，但有 {} 个警告", self.warning_count())
            }
        } else {
            format!(
                "验证失败：{} 个错误，{} 个警告",
                self.error_count(),
                self.warning_count()
            )
        }
    }
}
