use crate::core::recommendations::Recommender;
use crate::domain::model::{Alert, Record, ScoredTable};

/// Indices of rows at or above the threshold, in input order.
pub fn alert_indices(scored: &ScoredTable, threshold: f64) -> Vec<usize> {
    scored
        .risk_probability
        .iter()
        .enumerate()
        .filter(|(_, p)| **p >= threshold)
        .map(|(i, _)| i)
        .collect()
}

pub fn alert_headline(record: &Record, risk: f64) -> String {
    let event_type = record
        .get_str("event_type")
        .unwrap_or_else(|| "N/A".to_string());
    let asset = record
        .get_str("asset_id")
        .or_else(|| record.get_str("src_ip"))
        .unwrap_or_default();

    format!(
        "ALERT • {} • asset={} • risk={:.2}",
        event_type, asset, risk
    )
}

pub fn build_alerts(scored: &ScoredTable, threshold: f64, recommender: &Recommender) -> Vec<Alert> {
    alert_indices(scored, threshold)
        .into_iter()
        .map(|row_index| {
            let record = scored.record(row_index);
            let risk = scored.risk_probability[row_index];
            Alert {
                row_index,
                headline: alert_headline(&record, risk),
                risk_probability: risk,
                recommendations: recommender.suggest(&record),
                record,
            }
        })
        .collect()
}
