//! 结构名称中的机构文本约定
//!
//! 部分计划系统不在DICOM中写出处方，而是由物理师在结构集中建立特殊命名的点：
//!
//! - 治疗部位：`tx: <部位>`
//! - 计划处方：首个词以 `rx` 开头，并包含 `<剂量> cgy` 与 `x <分次数>`
//! - 分次组处方：`rx <n>: <分次组名>: <剂量>cgy x <分次数> to <百分比>% [:] <归一方法> [[:] <归一对象>]`
//!
//! 所有解析函数在不匹配时返回 `None`，调用方保留原有值或默认值。

use regex::Regex;
use std::sync::LazyLock;

static RX_GRAMMAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^rx\s*(\d+)\s*:\s*([^:]*?)\s*:\s*(\d+(?:\.\d+)?)\s*cgy\s*x\s*(\d+)\s*to\s*(\d+(?:\.\d+)?)\s*%\s*[:\s]*(.*)$",
    )
    .expect("分次组处方语法")
});

/// 小写后按空白切分；紧贴数字的 `cgy` 单独成词 (`200cgy` -> `200`, `cgy`)
pub fn tokenize(name: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    for token in name.to_lowercase().split_whitespace() {
        match token.strip_suffix("cgy") {
            Some(number) if !number.is_empty() && number.parse::<f64>().is_ok() => {
                tokens.push(number.to_string());
                tokens.push("cgy".to_string());
            }
            _ => tokens.push(token.to_string()),
        }
    }
    tokens
}

/// 计划级处方点
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DoseAnnotation {
    /// 单次剂量 (Gy)
    pub fraction_dose_gy: f64,
    pub fractions: u32,
}

impl DoseAnnotation {
    pub fn total_dose_gy(&self) -> f64 {
        self.fraction_dose_gy * self.fractions as f64
    }
}

/// 解析计划级处方点，例如 `rx: 200 cgy x 30`
pub fn parse_dose_annotation(name: &str) -> Option<DoseAnnotation> {
    let tokens = tokenize(name);
    if !tokens.first()?.starts_with("rx") {
        return None;
    }

    let cgy = tokens.iter().position(|t| t == "cgy")?;
    let dose_cgy: f64 = tokens.get(cgy.checked_sub(1)?)?.parse().ok()?;

    let x = tokens.iter().position(|t| t == "x")?;
    let fractions: u32 = tokens.get(x + 1)?.parse().ok()?;

    Some(DoseAnnotation {
        fraction_dose_gy: dose_cgy / 100.0,
        fractions,
    })
}

/// 解析治疗部位点 `tx: <部位>`，部位为空时不算匹配
pub fn parse_site_annotation(name: &str) -> Option<String> {
    let lowered = name.to_lowercase();
    let mut tokens = lowered.split_whitespace();
    if tokens.next()? != "tx:" {
        return None;
    }
    let site = tokens.collect::<Vec<_>>().join(" ");
    if site.is_empty() {
        None
    } else {
        Some(site)
    }
}

/// 按文档顺序扫描结构名称得到的计划级信息
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlanAnnotations {
    pub site: Option<String>,
    /// 全部处方点的总剂量之和 (Gy)
    pub rx_dose_gy: f64,
    /// 存在处方点时，其分次数之和替换分次组累计值
    pub fractions: Option<u32>,
}

/// 扫描结构名称，遇到治疗部位点即停止
pub fn scan_plan_annotations<'a, I>(names: I) -> PlanAnnotations
where
    I: IntoIterator<Item = &'a str>,
{
    let mut found = PlanAnnotations::default();
    for name in names {
        if let Some(rx) = parse_dose_annotation(name) {
            *found.fractions.get_or_insert(0) += rx.fractions;
            found.rx_dose_gy += rx.total_dose_gy();
        } else if let Some(site) = parse_site_annotation(name) {
            found.site = Some(site);
            break;
        }
    }
    found
}

/// 分次组处方点
#[derive(Debug, Clone, PartialEq)]
pub struct RxAnnotation {
    pub group: u32,
    pub group_name: String,
    pub fraction_dose_gy: f64,
    pub fractions: u32,
    pub total_dose_gy: f64,
    pub percent: f64,
    pub method: Option<String>,
    pub target: Option<String>,
}

/// 按固定语法解析分次组处方点，任何偏离都视为不匹配
pub fn parse_rx_annotation(name: &str) -> Option<RxAnnotation> {
    let lowered = name.trim().to_lowercase();
    let caps = RX_GRAMMAR.captures(&lowered)?;

    let group: u32 = caps[1].parse().ok()?;
    let dose_cgy: f64 = caps[3].parse().ok()?;
    let fractions: u32 = caps[4].parse().ok()?;
    let percent: f64 = caps[5].parse().ok()?;

    let rest: Vec<&str> = caps[6]
        .split(|c: char| c == ':' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .collect();
    let method = rest.first().map(|m| m.to_string());
    let target = match method.as_deref() {
        Some("plan_max") => Some("plan_max".to_string()),
        Some(_) if rest.len() > 1 => Some(rest[1..].join(" ")),
        _ => None,
    };

    let fraction_dose_gy = dose_cgy / 100.0;
    Some(RxAnnotation {
        group,
        group_name: caps[2].trim().to_string(),
        fraction_dose_gy,
        fractions,
        total_dose_gy: fraction_dose_gy * fractions as f64,
        percent,
        method,
        target,
    })
}
