//! 错误定义模块

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 参与一次提取的三类RT文档
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentKind {
    Plan,
    StructureSet,
    Dose,
}

impl DocumentKind {
    /// 文档对应的DICOM Modality
    pub fn modality(&self) -> &'static str {
        match self {
            DocumentKind::Plan => "RTPLAN",
            DocumentKind::StructureSet => "RTSTRUCT",
            DocumentKind::Dose => "RTDOSE",
        }
    }
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentKind::Plan => write!(f, "RT Plan"),
            DocumentKind::StructureSet => write!(f, "RT Structure Set"),
            DocumentKind::Dose => write!(f, "RT Dose"),
        }
    }
}

/// 归一化引擎统一错误类型
#[derive(Error, Debug)]
pub enum RtError {
    #[error("DICOM解析错误 ({document}): {message}")]
    Parse { document: DocumentKind, message: String },

    #[error("缺少必需字段: {document} 中的 {field}")]
    MissingField {
        document: DocumentKind,
        field: &'static str,
    },

    #[error("字段值无效: {document} 中的 {field} = {value:?}")]
    InvalidValue {
        document: DocumentKind,
        field: &'static str,
        value: String,
    },

    #[error("文档标识不一致: {document} 的 {field} 为 {found:?}，期望 {expected:?}")]
    IdentityMismatch {
        document: DocumentKind,
        field: &'static str,
        expected: String,
        found: String,
    },

    #[error("未找到归一化结构: ROI编号 {roi_number} 不在结构集中")]
    NormalizationTargetNotFound { roi_number: i64 },

    #[error("DVH计算错误: {0}")]
    Dvh(String),

    #[error("ROI分类错误: {0}")]
    Categorization(String),

    #[error("几何计算错误: {0}")]
    Geometry(String),

    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("序列化错误: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl RtError {
    /// 构造缺少必需字段错误
    pub fn missing(document: DocumentKind, field: &'static str) -> Self {
        RtError::MissingField { document, field }
    }

    /// 是否属于提取前置条件错误（缺少必需字段或标识不一致）
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            RtError::MissingField { .. } | RtError::IdentityMismatch { .. }
        )
    }
}

/// 归一化引擎统一结果类型
pub type Result<T> = std::result::Result<T, RtError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_field_names_document_and_field() {
        let err = RtError::missing(DocumentKind::Plan, "PatientID");
        let message = err.to_string();
        assert!(message.contains("RT Plan"));
        assert!(message.contains("PatientID"));
        assert!(err.is_precondition());
    }

    #[test]
    fn test_geometry_error_is_not_precondition() {
        assert!(!RtError::Geometry("degenerate contour".to_string()).is_precondition());
    }
}
