//! 内存DICOM数据集构造器
//!
//! 仅用于测试：数值按DICOM文本VR（DS/IS）的形式写成字符串，与真实文件解码后的形态一致。

use dicom::core::value::DataSetSequence;
use dicom::core::{DataElement, PrimitiveValue, Tag, VR};
use dicom::object::{FileMetaTableBuilder, InMemDicomObject};

/// 链式构造 `InMemDicomObject`
#[derive(Debug, Clone)]
pub struct DatasetBuilder {
    obj: InMemDicomObject,
}

impl Default for DatasetBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DatasetBuilder {
    pub fn new() -> Self {
        Self {
            obj: InMemDicomObject::new_empty(),
        }
    }

    pub fn str(mut self, tag: Tag, vr: VR, value: &str) -> Self {
        self.obj
            .put(DataElement::new(tag, vr, PrimitiveValue::from(value)));
        self
    }

    pub fn strs(mut self, tag: Tag, vr: VR, values: &[&str]) -> Self {
        let values = PrimitiveValue::Strs(values.iter().map(|s| s.to_string()).collect());
        self.obj.put(DataElement::new(tag, vr, values));
        self
    }

    pub fn num(self, tag: Tag, vr: VR, value: f64) -> Self {
        let text = value.to_string();
        self.str(tag, vr, &text)
    }

    pub fn nums(self, tag: Tag, vr: VR, values: &[f64]) -> Self {
        let texts: Vec<String> = values.iter().map(|v| v.to_string()).collect();
        let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
        self.strs(tag, vr, &refs)
    }

    pub fn int(self, tag: Tag, vr: VR, value: i64) -> Self {
        let text = value.to_string();
        self.str(tag, vr, &text)
    }

    pub fn seq(mut self, tag: Tag, items: Vec<InMemDicomObject>) -> Self {
        self.obj
            .put(DataElement::new(tag, VR::SQ, DataSetSequence::from(items)));
        self
    }

    pub fn build(self) -> InMemDicomObject {
        self.obj
    }
}

/// 将数据集编码为带文件元信息的DICOM字节流（Explicit VR Little Endian）
pub fn encode_file(obj: InMemDicomObject, sop_class_uid: &str, sop_instance_uid: &str) -> Vec<u8> {
    let file = obj
        .with_meta(
            FileMetaTableBuilder::new()
                .transfer_syntax("1.2.840.10008.1.2.1")
                .media_storage_sop_class_uid(sop_class_uid)
                .media_storage_sop_instance_uid(sop_instance_uid),
        )
        .expect("valid file meta");
    let mut bytes = Vec::new();
    file.write_all(&mut bytes).expect("encode DICOM file");
    bytes
}
