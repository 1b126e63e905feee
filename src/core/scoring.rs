//! Heuristic risk scorer.
//!
//! Works for both security event logs (`severity`, `vuln_count`) and network
//! logs (`packet_size`): each column is normalised by its max and combined in
//! a weighted sum clamped to [0, 1].

use crate::domain::model::{format_number, parse_number, EventTable, ScoredTable};
use crate::domain::ports::RiskScorer;
use crate::utils::error::Result;
use serde::{Deserialize, Serialize};

pub const SEVERITY: &str = "severity";
pub const VULN_COUNT: &str = "vuln_count";
pub const PACKET_SIZE: &str = "packet_size";

/// A numeric column the heuristic reads, with its fill value and the
/// divisor used when the column max is zero.
#[derive(Debug, Clone, Copy)]
pub struct ScoredColumn {
    pub name: &'static str,
    pub default: f64,
    pub zero_max_fallback: f64,
}

pub const SCORED_COLUMNS: [ScoredColumn; 3] = [
    ScoredColumn {
        name: SEVERITY,
        default: 1.0,
        zero_max_fallback: 10.0,
    },
    ScoredColumn {
        name: VULN_COUNT,
        default: 0.0,
        zero_max_fallback: 1.0,
    },
    ScoredColumn {
        name: PACKET_SIZE,
        default: 0.0,
        zero_max_fallback: 1.0,
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    #[serde(default = "default_severity_weight")]
    pub severity: f64,
    #[serde(default = "default_vuln_weight")]
    pub vuln_count: f64,
    #[serde(default = "default_packet_weight")]
    pub packet_size: f64,
}

fn default_severity_weight() -> f64 {
    0.5
}

fn default_vuln_weight() -> f64 {
    0.3
}

fn default_packet_weight() -> f64 {
    0.2
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            severity: default_severity_weight(),
            vuln_count: default_vuln_weight(),
            packet_size: default_packet_weight(),
        }
    }
}

impl ScoringWeights {
    fn for_column(&self, name: &str) -> f64 {
        match name {
            SEVERITY => self.severity,
            VULN_COUNT => self.vuln_count,
            PACKET_SIZE => self.packet_size,
            _ => 0.0,
        }
    }
}

/// 將欄位轉成數值：無法解析的儲存格填入預設值，缺少的欄位整欄補上預設值。
/// 轉換後的值會寫回表格。
pub fn coerce_column(table: &mut EventTable, name: &str, default: f64) -> Vec<f64> {
    let idx = match table.column_index(name) {
        Some(idx) => idx,
        None => table.push_column(name, &format_number(default)),
    };

    table
        .rows
        .iter_mut()
        .map(|row| {
            let value = row
                .get(idx)
                .and_then(|cell| parse_number(cell))
                .unwrap_or(default);
            if let Some(cell) = row.get_mut(idx) {
                *cell = format_number(value);
            }
            value
        })
        .collect()
}

/// Column max, with `fallback` when the max is zero or the column is empty.
pub fn column_max(values: &[f64], fallback: f64) -> f64 {
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if values.is_empty() || max == 0.0 {
        fallback
    } else {
        max
    }
}

#[derive(Debug, Clone, Default)]
pub struct HeuristicScorer {
    weights: ScoringWeights,
}

impl HeuristicScorer {
    pub fn new(weights: ScoringWeights) -> Self {
        Self { weights }
    }
}

impl RiskScorer for HeuristicScorer {
    fn name(&self) -> &str {
        "heuristic"
    }

    fn score(&self, table: EventTable) -> Result<ScoredTable> {
        let mut table = table.without_score_columns();
        let mut risk = vec![0.0_f64; table.len()];

        for column in SCORED_COLUMNS {
            let values = coerce_column(&mut table, column.name, column.default);
            let max = column_max(&values, column.zero_max_fallback);
            let weight = self.weights.for_column(column.name);
            if weight == 0.0 {
                continue;
            }

            for (acc, value) in risk.iter_mut().zip(&values) {
                *acc += value / max * weight;
            }
        }

        // 極端數值會溢位成 ±inf，夾回 [0, 1]；+inf 與 -inf 相加得到的 NaN 視為 0
        for value in &mut risk {
            *value = if value.is_nan() {
                0.0
            } else {
                value.clamp(0.0, 1.0)
            };
        }

        tracing::debug!("Scored {} rows with heuristic weights {:?}", risk.len(), self.weights);

        Ok(ScoredTable {
            table,
            risk_probability: risk,
            risk_label: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(headers: &[&str], rows: &[&[&str]]) -> EventTable {
        EventTable::new(
            headers.iter().map(|h| h.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
    }

    #[test]
    fn test_missing_columns_get_defaults() {
        let scored = HeuristicScorer::default()
            .score(table(&["event_type"], &[&["malware"], &["dos"]]))
            .unwrap();

        assert_eq!(
            scored.table.headers,
            vec!["event_type", "severity", "vuln_count", "packet_size"]
        );
        assert_eq!(scored.table.rows[0], vec!["malware", "1", "0", "0"]);
        // severity 1 / max 1 * 0.5
        assert_eq!(scored.risk_probability, vec![0.5, 0.5]);
    }

    #[test]
    fn test_non_numeric_cells_use_column_default() {
        let mut t = table(
            &["severity", "vuln_count"],
            &[&["high", "x"], &["", "2"], &["4", "3.5"]],
        );
        assert_eq!(coerce_column(&mut t, SEVERITY, 1.0), vec![1.0, 1.0, 4.0]);
        assert_eq!(coerce_column(&mut t, VULN_COUNT, 0.0), vec![0.0, 2.0, 3.5]);
        assert_eq!(t.rows[0], vec!["1", "0"]);
        assert_eq!(t.rows[2], vec!["4", "3.5"]);
    }

    #[test]
    fn test_weighted_sum_matches_sample_rows() {
        let scored = HeuristicScorer::default()
            .score(table(
                &["event_type", "severity", "vuln_count"],
                &[&["malware", "7", "3"], &["ransomware", "9", "4"], &["dos", "3", "0"]],
            ))
            .unwrap();

        let expected = [
            7.0 / 9.0 * 0.5 + 3.0 / 4.0 * 0.3,
            1.0 * 0.5 + 1.0 * 0.3,
            3.0 / 9.0 * 0.5,
        ];
        for (got, want) in scored.risk_probability.iter().zip(expected) {
            assert!((got - want).abs() < 1e-12, "{} != {}", got, want);
        }
    }

    #[test]
    fn test_zero_max_uses_fallback() {
        assert_eq!(column_max(&[0.0, 0.0], 10.0), 10.0);
        assert_eq!(column_max(&[], 1.0), 1.0);
        assert_eq!(column_max(&[-2.0, -5.0], 1.0), -2.0);

        let scored = HeuristicScorer::default()
            .score(table(&["severity"], &[&["0"], &["0"]]))
            .unwrap();
        assert_eq!(scored.risk_probability, vec![0.0, 0.0]);
    }

    #[test]
    fn test_scores_are_clamped() {
        let weights = ScoringWeights {
            severity: 2.0,
            vuln_count: 1.0,
            packet_size: 1.0,
        };
        let scored = HeuristicScorer::new(weights)
            .score(table(
                &["severity", "vuln_count", "packet_size"],
                &[&["10", "5", "1500"], &["-20", "0", "0"], &["5", "1", "40"]],
            ))
            .unwrap();

        assert!(scored
            .risk_probability
            .iter()
            .all(|p| (0.0..=1.0).contains(p)));
        assert_eq!(scored.risk_probability[0], 1.0);
        assert_eq!(scored.risk_probability[1], 0.0);
    }

    #[test]
    fn test_extreme_magnitudes_stay_in_range() {
        let scored = HeuristicScorer::default()
            .score(table(&["severity"], &[&["1e-300"], &["-1e308"]]))
            .unwrap();
        assert_eq!(scored.risk_probability, vec![0.5, 0.0]);

        // 負的最大值會讓比例變成 +inf，與另一欄的 -inf 相加得到 NaN，以 0 計
        let scored = HeuristicScorer::default()
            .score(table(
                &["severity", "vuln_count"],
                &[&["-1e-300", "1e-300"], &["-1e308", "-1e308"]],
            ))
            .unwrap();
        assert!((scored.risk_probability[0] - 0.8).abs() < 1e-12);
        assert_eq!(scored.risk_probability[1], 0.0);
    }

    #[test]
    fn test_zero_weight_ignores_overflowing_column() {
        let weights = ScoringWeights {
            severity: 0.0,
            vuln_count: 0.3,
            packet_size: 0.2,
        };
        let scored = HeuristicScorer::new(weights)
            .score(table(
                &["severity", "vuln_count"],
                &[&["1e-300", "2"], &["-1e308", "4"]],
            ))
            .unwrap();
        assert!((scored.risk_probability[0] - 0.15).abs() < 1e-12);
        assert!((scored.risk_probability[1] - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_rescoring_replaces_existing_score_column() {
        let first = HeuristicScorer::default()
            .score(table(&["event_type", "severity"], &[&["malware", "7"], &["dos", "3"]]))
            .unwrap();
        let written = crate::core::csv_io::write_scored(&first).unwrap();
        let reparsed = crate::core::csv_io::parse_csv(&written).unwrap();

        let second = HeuristicScorer::default().score(reparsed).unwrap();
        let headers = second.headers();
        assert_eq!(
            headers,
            vec!["event_type", "severity", "vuln_count", "packet_size", "risk_probability"]
        );
        assert_eq!(second.risk_probability, first.risk_probability);
    }

    #[test]
    fn test_empty_table() {
        let scored = HeuristicScorer::default()
            .score(table(&["event_type"], &[]))
            .unwrap();
        assert!(scored.is_empty());
        assert!(scored.risk_probability.is_empty());
    }

    #[test]
    fn test_network_log_only_packet_size() {
        let scored = HeuristicScorer::default()
            .score(table(
                &["src_ip", "packet_size"],
                &[&["10.0.0.1", "1500"], &["10.0.0.2", "750"]],
            ))
            .unwrap();
        // severity 預設 1 → 0.5，加上 packet 比例 * 0.2
        assert!((scored.risk_probability[0] - 0.7).abs() < 1e-12);
        assert!((scored.risk_probability[1] - 0.6).abs() < 1e-12);
    }
}
