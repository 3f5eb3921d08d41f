//! # RT文档访问模块
//!
//! 解析RT Plan / RT Structure Set / RT Dose，提供统一的属性解析器、
//! 文档三元组身份校验，以及结构集与计划汇总访问器。

pub mod attributes;
pub mod document;
pub mod parser;
pub mod plan;
pub mod structures;
pub mod tags;
pub mod validator;

#[cfg(any(test, feature = "test-util"))]
pub mod builder;

pub use attributes::AttributeAccess;
pub use document::{DocumentSet, RtDocument};
pub use parser::DicomParser;
pub use plan::PlanSummary;
pub use structures::{regions, Contour, ContourPlane, Region, MARKER_TYPE};
pub use validator::{DocumentSetValidator, ValidationResult};
