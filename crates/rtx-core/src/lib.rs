//! # RTX Core
//!
//! 放疗文档归一化引擎的核心模块，提供记录模型、错误定义和通用工具。

pub mod error;
pub mod models;
pub mod utils;

pub use error::{DocumentKind, Result, RtError};
pub use models::*;
