//! 预先计算的DVH
//!
//! 从JSON文件读取按ROI编号索引的DVH结果：
//!
//! ```json
//! { "1": { "volume": 512.3, "min": 0.1, "mean": 12.4, "max": 71.2, "counts": [512.3, 510.0] } }
//! ```

use crate::collaborators::{DvhCalculator, DvhResult};
use rtx_core::{Result, RtError};
use rtx_dicom::RtDocument;
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

/// 按ROI编号查表的DVH来源
#[derive(Debug, Clone, Default)]
pub struct PrecomputedDvh {
    results: HashMap<i64, DvhResult>,
}

impl PrecomputedDvh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let raw: HashMap<String, DvhResult> = serde_json::from_str(content)?;
        let mut results = HashMap::with_capacity(raw.len());
        for (key, result) in raw {
            let roi_number: i64 = key
                .trim()
                .parse()
                .map_err(|_| RtError::Dvh(format!("ROI编号无效: {:?}", key)))?;
            results.insert(roi_number, result);
        }
        Ok(Self { results })
    }

    /// 从JSON文件加载
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let dvh = Self::from_json_str(&content)?;
        info!("已加载DVH数据: {:?}，{} 个结构", path, dvh.results.len());
        Ok(dvh)
    }

    pub fn insert(&mut self, roi_number: i64, result: DvhResult) {
        self.results.insert(roi_number, result);
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

impl DvhCalculator for PrecomputedDvh {
    fn calculate(
        &self,
        _structure: &RtDocument,
        _dose: &RtDocument,
        roi_number: i64,
    ) -> Result<DvhResult> {
        self.results
            .get(&roi_number)
            .cloned()
            .ok_or_else(|| RtError::Dvh(format!("ROI {} 没有DVH数据", roi_number)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rtx_core::DocumentKind;
    use rtx_dicom::builder::DatasetBuilder;

    const JSON: &str = r#"{
        "1": {"volume": 512.5, "min": 0.1, "mean": 12.4, "max": 71.2, "counts": [512.5, 510.0, 0.0]},
        " 3 ": {"volume": 0.0, "min": 0.0, "mean": 0.0, "max": 0.0, "counts": []}
    }"#;

    fn empty_doc(kind: DocumentKind) -> RtDocument {
        RtDocument::new(kind, DatasetBuilder::new().build())
    }

    #[test]
    fn test_lookup_by_roi_number() {
        let dvh = PrecomputedDvh::from_json_str(JSON).unwrap();
        assert_eq!(dvh.len(), 2);

        let structure = empty_doc(DocumentKind::StructureSet);
        let dose = empty_doc(DocumentKind::Dose);
        let result = dvh.calculate(&structure, &dose, 1).unwrap();
        assert_eq!(result.volume, 512.5);
        assert_eq!(result.counts.len(), 3);
        assert_eq!(dvh.calculate(&structure, &dose, 3).unwrap().volume, 0.0);
        assert!(matches!(
            dvh.calculate(&structure, &dose, 2),
            Err(RtError::Dvh(_))
        ));
    }

    #[test]
    fn test_invalid_keys_and_json() {
        assert!(matches!(
            PrecomputedDvh::from_json_str(r#"{"body": {"volume": 1.0, "min": 0.0, "mean": 0.0, "max": 0.0, "counts": []}}"#),
            Err(RtError::Dvh(_))
        ));
        assert!(matches!(
            PrecomputedDvh::from_json_str("[1, 2]"),
            Err(RtError::Serialization(_))
        ));
    }
}
