//! # RTX 配置模块
//!
//! 提取工具的分层配置：TOML文件、环境变量与默认值

pub mod config;

pub use config::{
    CategorizationConfig, ConfigManager, ConfigValidator, DvhConfig, ExtractorConfig,
    LoggingConfig, OutputConfig, ENV_PREFIX,
};
