//! DICOM数据解析器
//!
//! 将RT文档的字节流或文件解析为 [`RtDocument`]

use crate::document::{DocumentSet, RtDocument};
use dicom::object::{from_reader, open_file};
use rtx_core::{DocumentKind, Result, RtError};
use std::path::Path;
use tracing::{debug, error, info};

/// DICOM Part 10 文件前导区长度
const PREAMBLE_LEN: usize = 128;
const MAGIC: &[u8; 4] = b"DICM";

/// DICOM数据解析器
pub struct DicomParser;

impl DicomParser {
    /// 解析DICOM文件
    pub fn parse_file<P: AsRef<Path>>(file_path: P, kind: DocumentKind) -> Result<RtDocument> {
        let file_path = file_path.as_ref();
        info!("开始解析{}文件: {:?}", kind, file_path);

        let obj = open_file(file_path).map_err(|e| {
            error!("DICOM文件解析失败: {:?}", e);
            RtError::Parse {
                document: kind,
                message: format!("无法解析DICOM文件 {:?}: {}", file_path, e),
            }
        })?;

        debug!("成功解析{}，传输语法: {}", kind, obj.meta().transfer_syntax());
        Ok(RtDocument::new(kind, obj.into_inner()))
    }

    /// 解析DICOM字节数据，可带或不带128字节前导区
    pub fn parse_bytes(data: &[u8], kind: DocumentKind) -> Result<RtDocument> {
        info!("开始解析{}字节数据，大小: {} bytes", kind, data.len());

        let body = if data.len() >= PREAMBLE_LEN + MAGIC.len()
            && &data[PREAMBLE_LEN..PREAMBLE_LEN + MAGIC.len()] == MAGIC
        {
            &data[PREAMBLE_LEN..]
        } else {
            data
        };

        if !body.starts_with(MAGIC) {
            return Err(RtError::Parse {
                document: kind,
                message: "缺少DICM标识，不是DICOM Part 10数据".to_string(),
            });
        }

        let obj = from_reader(body).map_err(|e| {
            error!("DICOM字节数据解析失败: {:?}", e);
            RtError::Parse {
                document: kind,
                message: e.to_string(),
            }
        })?;

        Ok(RtDocument::new(kind, obj.into_inner()))
    }

    /// 解析并校验完整的文档三元组
    pub fn parse_set(plan: &[u8], structure: &[u8], dose: &[u8]) -> Result<DocumentSet> {
        DocumentSet::new(
            Self::parse_bytes(plan, DocumentKind::Plan)?,
            Self::parse_bytes(structure, DocumentKind::StructureSet)?,
            Self::parse_bytes(dose, DocumentKind::Dose)?,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::AttributeAccess;
    use crate::builder::{encode_file, DatasetBuilder};
    use dicom::core::VR;
    use dicom::dictionary_std::tags;

    #[test]
    fn test_parse_bytes_round_trips_dataset() {
        let obj = DatasetBuilder::new()
            .str(tags::PATIENT_ID, VR::LO, "MRN0001")
            .str(tags::STUDY_INSTANCE_UID, VR::UI, "1.2.3.4")
            .build();
        let bytes = encode_file(obj, "1.2.840.10008.5.1.4.1.1.481.5", "1.2.3.4.5");

        let doc = DicomParser::parse_bytes(&bytes, DocumentKind::Plan).unwrap();
        assert_eq!(doc.kind(), DocumentKind::Plan);
        assert_eq!(doc.opt_str(tags::PATIENT_ID).as_deref(), Some("MRN0001"));
    }

    #[test]
    fn test_parse_bytes_rejects_garbage() {
        let err = DicomParser::parse_bytes(b"not a dicom file", DocumentKind::Dose).unwrap_err();
        assert!(matches!(
            err,
            RtError::Parse {
                document: DocumentKind::Dose,
                ..
            }
        ));
    }
}
