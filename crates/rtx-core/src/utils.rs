//! 通用工具函数

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime};

/// 验证DICOM UID格式
pub fn is_valid_dicom_uid(uid: &str) -> bool {
    !uid.is_empty()
        && uid.len() <= 64
        && uid.chars().all(|c| c.is_ascii_digit() || c == '.')
        && !uid.starts_with('.')
        && !uid.ends_with('.')
        && !uid.contains("..")
}

/// 解析DICOM日期 (YYYYMMDD)
pub fn parse_dicom_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y%m%d").ok()
}

/// 解析DICOM时间 (HHMMSS.FFFFFF)，小数秒被丢弃，允许只给出 HH 或 HHMM
pub fn parse_dicom_time(value: &str) -> Option<NaiveTime> {
    let whole = value.trim().split('.').next().unwrap_or_default();
    if whole.is_empty() || !whole.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let padded = format!("{:0<6}", whole);
    NaiveTime::parse_from_str(&padded, "%H%M%S").ok()
}

/// 合并日期与可选时间，缺失时间按零点处理
pub fn parse_dicom_datetime(date: &str, time: Option<&str>) -> Option<NaiveDateTime> {
    let date = parse_dicom_date(date)?;
    let time = match time {
        Some(t) => parse_dicom_time(t)?,
        None => NaiveTime::from_hms_opt(0, 0, 0)?,
    };
    Some(date.and_time(time))
}

/// 按日历计算整岁年龄，结果不为正时返回 None
pub fn age_in_years(birth: NaiveDate, on: NaiveDate) -> Option<u32> {
    let mut years = on.year() - birth.year();
    if (on.month(), on.day()) < (birth.month(), birth.day()) {
        years -= 1;
    }
    if years > 0 {
        Some(years as u32)
    } else {
        None
    }
}

/// 四舍五入到指定小数位
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// 数值转短文本，整数不带小数部分 (6.0 -> "6", 6.5 -> "6.5")
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        format!("{}", value)
    }
}

/// 秒数格式化为 HH:MM:SS
pub fn format_hms(total_seconds: f64) -> String {
    let seconds = total_seconds.max(0.0).round() as u64;
    let (minutes, s) = (seconds / 60, seconds % 60);
    let (h, m) = (minutes / 60, minutes % 60);
    format!("{:02}:{:02}:{:02}", h, m, s)
}
