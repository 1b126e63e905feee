use crate::domain::model::{parse_number, EventTable, RadarChart, RadarPoint};

pub const MIN_RADAR_METRICS: usize = 3;

/// 數值欄位：所有非空儲存格都能解析成數字，且至少有一個非空儲存格
pub fn numeric_column_means(table: &EventTable) -> Vec<RadarPoint> {
    table
        .headers
        .iter()
        .enumerate()
        .filter_map(|(idx, header)| {
            let mut sum = 0.0;
            let mut count = 0usize;
            for row in &table.rows {
                let cell = row.get(idx).map(String::as_str).unwrap_or("");
                if cell.trim().is_empty() {
                    continue;
                }
                sum += parse_number(cell)?;
                count += 1;
            }
            (count > 0).then(|| RadarPoint {
                metric: header.clone(),
                value: sum / count as f64,
            })
        })
        .collect()
}

/// Polygon chart of per-column means; `None` below three numeric columns.
pub fn build_radar(table: &EventTable) -> Option<RadarChart> {
    let points = numeric_column_means(table);
    if points.len() < MIN_RADAR_METRICS {
        tracing::debug!(
            "Not enough numeric columns for radar chart ({} < {})",
            points.len(),
            MIN_RADAR_METRICS
        );
        return None;
    }
    Some(RadarChart { points })
}
