//! RT文档归一化提取命令行工具

use anyhow::{Context, Result};
use clap::Parser;
use rtx_config::{ConfigManager, ExtractorConfig};
use rtx_core::{ExtractionTables, RtError};
use rtx_extract::{extract_tables, Collaborators, PlanarSurfaceArea, PrecomputedDvh, RoiNameMap};
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// 提取工具命令行参数
#[derive(Parser, Debug)]
#[command(name = "rtx-extract")]
#[command(about = "从RT Plan / RT Structure Set / RT Dose 提取计划、处方、射束与结构剂量表")]
struct Args {
    /// RT Plan 文件
    #[arg(long)]
    plan: PathBuf,

    /// RT Structure Set 文件
    #[arg(long)]
    structure: PathBuf,

    /// RT Dose 文件
    #[arg(long)]
    dose: PathBuf,

    /// 预先计算的DVH (JSON)，缺省时取配置中的 dvh.path
    #[arg(long)]
    dvh: Option<PathBuf>,

    /// ROI名称映射 (TOML)
    #[arg(long)]
    roi_map: Option<PathBuf>,

    /// 配置文件路径
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// 日志级别，覆盖配置文件
    #[arg(short, long)]
    log_level: Option<String>,

    /// 输出文件，缺省时写到 output.directory 或标准输出
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// 格式化JSON输出
    #[arg(long)]
    pretty: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // 日志尚未初始化，配置错误只能经由返回的错误链报告
    let manager =
        ConfigManager::new(args.config.as_deref()).context("Failed to load configuration")?;
    let config = manager.config();

    // 初始化日志，标准输出留给JSON
    let level = args.log_level.as_deref().unwrap_or(&config.logging.level);
    tracing_subscriber::fmt()
        .with_env_filter(level)
        .with_ansi(config.logging.ansi)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(&args, config) {
        match e.downcast_ref::<RtError>() {
            Some(rt) if rt.is_precondition() => error!("输入文档不满足提取条件: {}", rt),
            _ => error!("提取失败: {:#}", e),
        }
        return Err(e);
    }
    Ok(())
}

fn run(args: &Args, config: &ExtractorConfig) -> Result<()> {
    let dvh_path = args
        .dvh
        .as_deref()
        .or(config.dvh.path.as_deref())
        .context("No DVH source: pass --dvh or set dvh.path")?;
    let dvh = PrecomputedDvh::load(dvh_path)
        .with_context(|| format!("Failed to load DVH data from {}", dvh_path.display()))?;

    let roi_map = match args
        .roi_map
        .as_deref()
        .or(config.categorization.roi_map_path.as_deref())
    {
        Some(path) => RoiNameMap::load(path)
            .with_context(|| format!("Failed to load ROI map from {}", path.display()))?,
        None => RoiNameMap::empty(),
    }
    .with_uncategorized_label(config.categorization.uncategorized_label.clone());
    let surface_area = PlanarSurfaceArea::new();

    let plan = read_document(&args.plan)?;
    let structure = read_document(&args.structure)?;
    let dose = read_document(&args.dose)?;

    let collaborators = Collaborators::new(&dvh, &roi_map, &surface_area);
    let tables = extract_tables(&plan, &structure, &dose, &collaborators)?;

    write_tables(
        &tables,
        args.output.as_deref(),
        config.output.directory.as_deref(),
        args.pretty || config.output.pretty,
    )?;
    Ok(())
}

fn read_document(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))
}

/// 写出四张表，返回写入的文件路径；未指定文件和目录时写到标准输出
fn write_tables(
    tables: &ExtractionTables,
    output: Option<&Path>,
    directory: Option<&Path>,
    pretty: bool,
) -> Result<Option<PathBuf>> {
    let json = if pretty {
        serde_json::to_string_pretty(tables)
    } else {
        serde_json::to_string(tables)
    }
    .context("Failed to serialize tables")?;

    let target = match (output, directory) {
        (Some(path), _) => Some(path.to_path_buf()),
        (None, Some(directory)) => {
            std::fs::create_dir_all(directory).with_context(|| {
                format!("Failed to create output directory {}", directory.display())
            })?;
            Some(directory.join(output_file_name(tables)))
        }
        (None, None) => None,
    };

    match &target {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!("已写出: {}", path.display());
        }
        None => println!("{}", json),
    }
    Ok(target)
}

/// 由 PatientID 和 StudyInstanceUID 组成输出文件名
fn output_file_name(tables: &ExtractionTables) -> String {
    format!(
        "{}_{}.json",
        file_name_component(&tables.plan.patient_id),
        file_name_component(&tables.plan.study_instance_uid)
    )
}

/// 路径分隔符、控制字符和 `..` 一律替换为 `_`，结果只能是单层文件名
fn file_name_component(value: &str) -> String {
    let cleaned: String = value
        .trim()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.replace("..", "_");
    if cleaned.is_empty() {
        "_".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rtx_core::{PlanRecord, Sex};
    use uuid::Uuid;

    fn tables_for(patient_id: &str, study_uid: &str) -> ExtractionTables {
        let stamp = NaiveDate::from_ymd_opt(2017, 3, 1)
            .unwrap()
            .and_hms_opt(10, 15, 30)
            .unwrap();
        ExtractionTables {
            run_id: Uuid::nil(),
            plan: PlanRecord {
                patient_id: patient_id.to_string(),
                study_instance_uid: study_uid.to_string(),
                birth_date: None,
                age: None,
                patient_sex: Sex::Unknown,
                sim_study_date: None,
                physician: None,
                tx_site: None,
                rx_dose: 60.0,
                fxs: 30,
                patient_orientation: "HFS".to_string(),
                plan_time_stamp: stamp,
                struct_time_stamp: stamp,
                dose_time_stamp: None,
                tps_manufacturer: None,
                tps_software_name: None,
                tps_software_version: None,
                tx_modality: "6 MV".to_string(),
                tx_energies: "6".to_string(),
                tx_time: "00:00:00".to_string(),
                total_mu: 0.0,
                dose_grid_resolution: String::new(),
                heterogeneity_correction: String::new(),
            },
            prescriptions: Vec::new(),
            beams: Vec::new(),
            regions: Vec::new(),
        }
    }

    #[test]
    fn test_file_name_component() {
        assert_eq!(file_name_component("PAT-001"), "PAT-001");
        assert_eq!(file_name_component("1.2.840.10008"), "1.2.840.10008");
        assert_eq!(file_name_component("123/45"), "123_45");
        assert_eq!(file_name_component("..\\x"), "__x");
        assert_eq!(file_name_component(".."), "_");
        assert_eq!(file_name_component("  "), "_");
    }

    #[test]
    fn test_write_tables_keeps_patient_id_with_separator_in_directory() {
        let directory = tempfile::tempdir().unwrap();
        let tables = tables_for("123/45", "1.2.3");

        let path = write_tables(&tables, None, Some(directory.path()), false)
            .unwrap()
            .unwrap();

        assert_eq!(path.parent(), Some(directory.path()));
        assert_eq!(path.file_name().unwrap(), "123_45_1.2.3.json");
        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["plan"]["patient_id"], "123/45");
    }

    #[test]
    fn test_write_tables_does_not_escape_directory() {
        let root = tempfile::tempdir().unwrap();
        let directory = root.path().join("out");
        let tables = tables_for("../../x", "1.2.3");

        let path = write_tables(&tables, None, Some(&directory), true)
            .unwrap()
            .unwrap();

        assert_eq!(path.parent(), Some(directory.as_path()));
        assert_eq!(path.file_name().unwrap(), "____x_1.2.3.json");
        assert!(path.exists());
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_write_tables_explicit_output_wins() {
        let directory = tempfile::tempdir().unwrap();
        let output = directory.path().join("tables.json");
        let tables = tables_for("PAT-001", "1.2.3");

        let path = write_tables(&tables, Some(&output), Some(directory.path()), false).unwrap();

        assert_eq!(path, Some(output.clone()));
        assert!(output.exists());
        assert_eq!(std::fs::read_dir(directory.path()).unwrap().count(), 1);
    }
}
