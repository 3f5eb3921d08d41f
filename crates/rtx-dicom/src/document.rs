//! RT文档与文档三元组

use crate::attributes::AttributeAccess;
use crate::validator::DocumentSetValidator;
use dicom::core::Tag;
use dicom::object::InMemDicomObject;
use rtx_core::{DocumentKind, Result, StudyIdentity};

/// 已解析的单个RT文档
#[derive(Debug, Clone)]
pub struct RtDocument {
    kind: DocumentKind,
    dataset: InMemDicomObject,
}

impl RtDocument {
    pub fn new(kind: DocumentKind, dataset: InMemDicomObject) -> Self {
        Self { kind, dataset }
    }

    pub fn kind(&self) -> DocumentKind {
        self.kind
    }

    pub fn dataset(&self) -> &InMemDicomObject {
        &self.dataset
    }

    /// 本文档中的必需字符串字段
    pub fn require_str(&self, tag: Tag, field: &'static str) -> Result<String> {
        self.dataset.required_str(tag, self.kind, field)
    }

    /// 本文档中的必需整数字段
    pub fn require_i64(&self, tag: Tag, field: &'static str) -> Result<i64> {
        self.dataset.required_i64(tag, self.kind, field)
    }

    /// 本文档中的必需序列
    pub fn require_items(&self, tag: Tag, field: &'static str) -> Result<&[InMemDicomObject]> {
        self.dataset.required_items(tag, self.kind, field)
    }
}

impl AttributeAccess for RtDocument {
    fn opt_str(&self, tag: Tag) -> Option<String> {
        self.dataset.opt_str(tag)
    }

    fn opt_strs(&self, tag: Tag) -> Option<Vec<String>> {
        self.dataset.opt_strs(tag)
    }

    fn opt_f64(&self, tag: Tag) -> Option<f64> {
        self.dataset.opt_f64(tag)
    }

    fn opt_f64s(&self, tag: Tag) -> Option<Vec<f64>> {
        self.dataset.opt_f64s(tag)
    }

    fn opt_i64(&self, tag: Tag) -> Option<i64> {
        self.dataset.opt_i64(tag)
    }

    fn opt_items(&self, tag: Tag) -> Option<&[InMemDicomObject]> {
        self.dataset.opt_items(tag)
    }

    fn has(&self, tag: Tag) -> bool {
        self.dataset.has(tag)
    }
}

/// 同一患者同一检查的计划、结构集、剂量三元组
///
/// 只能通过 [`DocumentSet::new`] 构造，构造时即完成身份一致性校验。
#[derive(Debug, Clone)]
pub struct DocumentSet {
    plan: RtDocument,
    structure: RtDocument,
    dose: RtDocument,
    identity: StudyIdentity,
}

impl DocumentSet {
    pub fn new(plan: RtDocument, structure: RtDocument, dose: RtDocument) -> Result<Self> {
        let identity =
            DocumentSetValidator::new().ensure_consistent(&plan, &structure, &dose)?;
        Ok(Self {
            plan,
            structure,
            dose,
            identity,
        })
    }

    pub fn plan(&self) -> &RtDocument {
        &self.plan
    }

    pub fn structure(&self) -> &RtDocument {
        &self.structure
    }

    pub fn dose(&self) -> &RtDocument {
        &self.dose
    }

    pub fn identity(&self) -> &StudyIdentity {
        &self.identity
    }
}
