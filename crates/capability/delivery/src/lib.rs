//! 派生胰岛素输注量计算。
//!
//! 从输注区间推导统计模块需要的量：
//! - 速率读取（完全强制转换，绝不失败）
//! - 区间输注量 = 速率 × 时长（小时）
//! - 相对计划速率的净输注量
//! - 输注段合计与按本地小时的速率分布
//!
//! 进行中的区间按类别默认时长折算（BasalDelivery 为一个 5 分钟
//! 输注节拍），而不是按零或无穷处理。
//!
//! 统计公式本身（血糖数学）在本引擎之外，这里只产出数据。

use chrono::Timelike;
use domain::{SpanCategory, StateSpan, metadata_number};

const MS_PER_HOUR: f64 = 3_600_000.0;

/// 读取区间速率（U/hr）。
///
/// `metadata["rate"]` 可能以数值、字符串或布尔形式到达；缺失或
/// 不可解析按 0 处理。
pub fn extract_rate(span: &StateSpan) -> f64 {
    metadata_number(&span.metadata, "rate").unwrap_or(0.0)
}

/// 读取计划基础速率（U/hr），同样的完全强制转换。
pub fn extract_scheduled_rate(span: &StateSpan) -> f64 {
    metadata_number(&span.metadata, "scheduledRate").unwrap_or(0.0)
}

fn duration_hours(span: &StateSpan) -> f64 {
    span.effective_duration_ms() as f64 / MS_PER_HOUR
}

/// 区间内输注的胰岛素量（U）。
pub fn delivered_insulin(span: &StateSpan) -> f64 {
    extract_rate(span) * duration_hours(span)
}

/// 相对计划速率的净输注量（U）；临时速率低于计划时为负。
pub fn net_delivered_insulin(span: &StateSpan) -> f64 {
    (extract_rate(span) - extract_scheduled_rate(span)) * duration_hours(span)
}

/// 输注段合计（U）。
///
/// 只统计 BasalDelivery 类别，忽略非正贡献。
pub fn sum_delivered(spans: &[StateSpan]) -> f64 {
    spans
        .iter()
        .filter(|span| span.category == SpanCategory::BasalDelivery)
        .map(delivered_insulin)
        .filter(|amount| *amount > 0.0)
        .sum()
}

/// 单个小时桶的速率统计。
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HourlyRateStats {
    pub hour: u32,
    pub count: usize,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub p10: f64,
    pub p50: f64,
    pub p90: f64,
}

/// 按本地小时对输注段分桶并计算速率统计。
///
/// 本引擎不猜测时区，`utc_offset_minutes` 由调用方提供（0 即按
/// UTC 分桶）。空桶按全零上报，消费方总能按 0–23 小时索引。
pub fn hourly_rate_stats(spans: &[StateSpan], utc_offset_minutes: i32) -> [HourlyRateStats; 24] {
    let mut buckets: [Vec<f64>; 24] = std::array::from_fn(|_| Vec::new());
    for span in spans {
        if span.category != SpanCategory::BasalDelivery {
            continue;
        }
        let hour = local_hour(span.start_mills, utc_offset_minutes);
        buckets[hour as usize].push(extract_rate(span));
    }
    std::array::from_fn(|hour| {
        let rates = &mut buckets[hour];
        rates.sort_by(|a, b| a.total_cmp(b));
        bucket_stats(hour as u32, rates)
    })
}

fn bucket_stats(hour: u32, sorted: &[f64]) -> HourlyRateStats {
    if sorted.is_empty() {
        return HourlyRateStats {
            hour,
            ..Default::default()
        };
    }
    let count = sorted.len();
    HourlyRateStats {
        hour,
        count,
        mean: sorted.iter().sum::<f64>() / count as f64,
        min: sorted[0],
        max: sorted[count - 1],
        p10: percentile(sorted, 0.10),
        p50: percentile(sorted, 0.50),
        p90: percentile(sorted, 0.90),
    }
}

/// 线性插值百分位；输入须已升序。空输入返回 0。
pub fn percentile(sorted: &[f64], fraction: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let rank = fraction.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    if lower == upper {
        return sorted[lower];
    }
    let weight = rank - lower as f64;
    sorted[lower] * (1.0 - weight) + sorted[upper] * weight
}

fn local_hour(mills: i64, utc_offset_minutes: i32) -> u32 {
    let shifted = mills.saturating_add(i64::from(utc_offset_minutes) * 60_000);
    chrono::DateTime::from_timestamp_millis(shifted)
        .map(|datetime| datetime.hour())
        .unwrap_or(0)
}
