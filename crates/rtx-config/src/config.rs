//! 配置管理
//!
//! 可选的TOML配置文件叠加 `RTX__` 前缀的环境变量，缺省项使用各节的默认值。

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

/// 环境变量前缀，例如 `RTX__LOGGING__LEVEL=debug`
pub const ENV_PREFIX: &str = "RTX";
const ENV_SEPARATOR: &str = "__";

/// 允许的日志级别
const LOG_LEVELS: [&str; 6] = ["trace", "debug", "info", "warn", "error", "off"];

/// 配置管理器
#[derive(Debug)]
pub struct ConfigManager {
    /// 配置数据
    config: ExtractorConfig,
    /// 配置文件路径
    config_path: Option<PathBuf>,
    /// 配置验证器
    validator: ConfigValidator,
}

/// 提取工具完整配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// 日志配置
    pub logging: LoggingConfig,
    /// 结构分类配置
    pub categorization: CategorizationConfig,
    /// 输出配置
    pub output: OutputConfig,
    /// DVH来源配置
    pub dvh: DvhConfig,
}

/// 日志配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 日志级别或 env-filter 指令
    pub level: String,
    /// 终端彩色输出
    pub ansi: bool,
}

/// 结构分类配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategorizationConfig {
    /// ROI名称映射文件 (TOML)
    pub roi_map_path: Option<PathBuf>,
    /// 未分类结构的标签
    pub uncategorized_label: String,
}

/// 输出配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// 输出目录，未设置时写到标准输出
    pub directory: Option<PathBuf>,
    /// 格式化JSON
    pub pretty: bool,
}

/// DVH来源配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DvhConfig {
    /// 预先计算的DVH文件 (JSON)
    pub path: Option<PathBuf>,
}

/// 配置验证器
#[derive(Debug)]
pub struct ConfigValidator {
    /// 验证规则
    validation_rules: Vec<ValidationRule>,
}

/// 验证规则
#[derive(Debug)]
struct ValidationRule {
    /// 字段路径
    field_path: &'static str,
    /// 验证函数
    validator: fn(&ExtractorConfig) -> Result<()>,
}

impl ConfigManager {
    /// 加载并验证配置
    pub fn new(config_path: Option<&Path>) -> Result<Self> {
        let config = Self::load_config(config_path)?;
        let validator = ConfigValidator::new();
        validator.validate(&config)?;

        Ok(Self {
            config,
            config_path: config_path.map(Path::to_path_buf),
            validator,
        })
    }

    /// 从文件和环境变量加载配置
    pub fn load_config(config_path: Option<&Path>) -> Result<ExtractorConfig> {
        let mut builder = Config::builder();
        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path));
        }
        let settings = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator(ENV_SEPARATOR)
                    .separator(ENV_SEPARATOR),
            )
            .build()
            .context("Failed to build configuration")?;

        let config: ExtractorConfig = settings
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        match config_path {
            Some(path) => info!("Configuration loaded from: {}", path.display()),
            None => debug!("No configuration file, using defaults and environment"),
        }
        Ok(config)
    }

    /// 获取配置
    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    /// 更新配置
    pub fn update_config(&mut self, new_config: ExtractorConfig) -> Result<()> {
        self.validator.validate(&new_config)?;
        self.config = new_config;
        info!("Configuration updated");
        Ok(())
    }

    /// 保存配置到加载时的文件
    pub fn save_config(&self) -> Result<()> {
        let path = self
            .config_path
            .as_deref()
            .context("No configuration file to save to")?;
        self.save_to(path)
    }

    /// 保存配置到指定文件
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let config_str =
            toml::to_string_pretty(&self.config).context("Failed to serialize configuration")?;
        std::fs::write(path, config_str).context("Failed to write configuration file")?;

        info!("Configuration saved to: {}", path.display());
        Ok(())
    }

    /// 按点分路径读取配置值，例如 `output.pretty`
    pub fn get_value<T>(&self, path: &str) -> Result<T>
    where
        T: for<'de> Deserialize<'de>,
    {
        let value = self
            .extract_nested_value(path)
            .with_context(|| format!("Configuration path not found: {}", path))?;

        serde_json::from_value(value).context("Failed to deserialize configuration value")
    }

    fn extract_nested_value(&self, path: &str) -> Result<serde_json::Value> {
        let config_json =
            serde_json::to_value(&self.config).context("Failed to serialize config to JSON")?;

        let mut current = &config_json;
        for part in path.split('.') {
            match current {
                serde_json::Value::Object(map) => {
                    current = map
                        .get(part)
                        .ok_or_else(|| anyhow::anyhow!("Path segment not found: {}", part))?;
                }
                _ => return Err(anyhow::anyhow!("Invalid path at segment: {}", part)),
            }
        }

        Ok(current.clone())
    }
}

impl ConfigValidator {
    pub fn new() -> Self {
        let validation_rules = vec![
            ValidationRule {
                field_path: "logging.level",
                validator: |config| {
                    // 逗号分隔的 env-filter 指令，逐条检查级别部分
                    for directive in config.logging.level.split(',') {
                        let level = directive.rsplit('=').next().unwrap_or("").trim();
                        if !LOG_LEVELS.contains(&level.to_lowercase().as_str()) {
                            return Err(anyhow::anyhow!("Unknown log level: {:?}", level));
                        }
                    }
                    Ok(())
                },
            },
            ValidationRule {
                field_path: "categorization.uncategorized_label",
                validator: |config| {
                    if config.categorization.uncategorized_label.trim().is_empty() {
                        Err(anyhow::anyhow!("Uncategorized label cannot be empty"))
                    } else {
                        Ok(())
                    }
                },
            },
            ValidationRule {
                field_path: "categorization.roi_map_path",
                validator: |config| non_empty_path(config.categorization.roi_map_path.as_deref()),
            },
            ValidationRule {
                field_path: "output.directory",
                validator: |config| non_empty_path(config.output.directory.as_deref()),
            },
            ValidationRule {
                field_path: "dvh.path",
                validator: |config| non_empty_path(config.dvh.path.as_deref()),
            },
        ];

        Self { validation_rules }
    }

    /// 验证配置
    pub fn validate(&self, config: &ExtractorConfig) -> Result<()> {
        for rule in &self.validation_rules {
            if let Err(e) = (rule.validator)(config) {
                error!("Configuration validation failed for {}: {}", rule.field_path, e);
                return Err(e.context(format!("Invalid {}", rule.field_path)));
            }
        }

        debug!("Configuration validation passed");
        Ok(())
    }
}

impl Default for ConfigValidator {
    fn default() -> Self {
        Self::new()
    }
}

fn non_empty_path(path: Option<&Path>) -> Result<()> {
    match path {
        Some(p) if p.as_os_str().is_empty() => Err(anyhow::anyhow!("Path cannot be empty")),
        _ => Ok(()),
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            ansi: true,
        }
    }
}

impl Default for CategorizationConfig {
    fn default() -> Self {
        Self {
            roi_map_path: None,
            uncategorized_label: "uncategorized".to_string(),
        }
    }
}
